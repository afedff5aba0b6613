//! Axis force: pulls nodes toward a coordinate on a single axis, leaving
//! the other axes alone.

use serde::{Deserialize, Serialize};

use super::{ForceContext, ForceOperator, ForceSetup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionForce {
    pub axis: Axis,
    pub target: f64,
    pub strength: f64,
}

impl PositionForce {
    pub fn new(axis: Axis, target: f64, strength: f64) -> Self {
        Self {
            axis,
            target,
            strength,
        }
    }
}

impl ForceOperator for PositionForce {
    fn initialize(&mut self, _setup: &mut ForceSetup<'_>) {}

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        let axis = self.axis.index();
        if axis >= ctx.dimensions.count() {
            return;
        }
        let k = self.strength * ctx.alpha;
        for node in ctx.nodes.iter_mut() {
            let dv = (self.target - node.coord(axis)) * k;
            node.accelerate(axis, dv);
        }
    }
}
