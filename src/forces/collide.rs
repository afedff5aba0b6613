//! Collision force: keeps circles (2D) or spheres (3D) from overlapping.
//!
//! Pairwise O(n²). Overlap is measured on predicted positions (position plus
//! velocity) and each body of an overlapping pair is pushed away by half the
//! overlap, scaled by `strength · alpha`.

use std::fmt;
use std::sync::Arc;

use super::{ForceContext, ForceOperator, ForceSetup, length_squared};
use crate::node::SimulationNode;

/// Default collision strength
pub const DEFAULT_COLLIDE_STRENGTH: f64 = 0.7;

/// How a node's collision radius is chosen
#[derive(Clone)]
pub enum CollideRadius {
    /// Same radius for every node
    Constant(f64),
    /// Each node's own `radius`
    Node,
    /// Derived from the node by a caller-supplied function
    Custom(Arc<dyn Fn(&SimulationNode) -> f64 + Send + Sync>),
}

impl CollideRadius {
    fn radius_of(&self, node: &SimulationNode) -> f64 {
        match self {
            CollideRadius::Constant(r) => *r,
            CollideRadius::Node => node.radius,
            CollideRadius::Custom(f) => f(node),
        }
    }
}

impl fmt::Debug for CollideRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollideRadius::Constant(r) => f.debug_tuple("Constant").field(r).finish(),
            CollideRadius::Node => f.write_str("Node"),
            CollideRadius::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollideForce {
    pub radius: CollideRadius,
    pub strength: f64,
    pub iterations: u32,
    radii: Vec<f64>,
}

impl CollideForce {
    pub fn new(radius: CollideRadius, strength: f64, iterations: u32) -> Self {
        Self {
            radius,
            strength,
            iterations,
            radii: Vec::new(),
        }
    }
}

impl Default for CollideForce {
    fn default() -> Self {
        Self::new(CollideRadius::Node, DEFAULT_COLLIDE_STRENGTH, 1)
    }
}

impl ForceOperator for CollideForce {
    fn initialize(&mut self, setup: &mut ForceSetup<'_>) {
        self.radii = setup
            .nodes
            .iter()
            .map(|n| self.radius.radius_of(n).max(0.0))
            .collect();
    }

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        let axes = ctx.dimensions.count();
        let k = self.strength * ctx.alpha;
        let n = ctx.nodes.len().min(self.radii.len());

        for _ in 0..self.iterations {
            for i in 0..n {
                for j in (i + 1)..n {
                    let reach = self.radii[i] + self.radii[j];
                    let mut offset = [0.0; 3];
                    for a in 0..axes {
                        offset[a] = ctx.nodes[j].predicted(a) - ctx.nodes[i].predicted(a);
                    }
                    let mut d2 = length_squared(&offset, axes);
                    if d2 >= reach * reach {
                        continue;
                    }
                    if d2 == 0.0 {
                        for v in offset.iter_mut().take(axes) {
                            *v = ctx.random.jiggle();
                        }
                        d2 = length_squared(&offset, axes);
                    }
                    let l = d2.sqrt();
                    let push = (reach - l) / l * 0.5 * k;
                    for a in 0..axes {
                        let dv = offset[a] * push;
                        ctx.nodes[i].accelerate(a, -dv);
                        ctx.nodes[j].accelerate(a, dv);
                    }
                }
            }
        }
    }
}
