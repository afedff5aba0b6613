//! Radial force: pulls nodes toward a circle (2D) or sphere (3D) of a given
//! radius around a center point.

use super::{ForceContext, ForceOperator, ForceSetup, length_squared};
use crate::node::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct RadialForce {
    pub center: Point,
    pub radius: f64,
    pub strength: f64,
}

impl RadialForce {
    pub fn new(center: Point, radius: f64, strength: f64) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }
}

impl Default for RadialForce {
    fn default() -> Self {
        Self::new(Point::default(), 100.0, 0.1)
    }
}

impl ForceOperator for RadialForce {
    fn initialize(&mut self, _setup: &mut ForceSetup<'_>) {}

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        let axes = ctx.dimensions.count();
        for node in ctx.nodes.iter_mut() {
            let mut offset = [0.0; 3];
            for a in 0..axes {
                offset[a] = node.coord(a) - self.center.axis(a);
            }
            if length_squared(&offset, axes) == 0.0 {
                offset[0] = 1e-6;
            }
            let r = length_squared(&offset, axes).sqrt();
            let k = (self.radius - r) * self.strength * ctx.alpha / r;
            for a in 0..axes {
                node.accelerate(a, offset[a] * k);
            }
        }
    }
}
