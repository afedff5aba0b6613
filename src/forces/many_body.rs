//! Many-body (charge) force
//!
//! Every node pushes (negative strength) or pulls (positive strength) every
//! other node with a force that falls off with the square of the distance:
//!
//! ```text
//! Δv_i = (p_j - p_i) · strength · alpha · m_j / d²
//! ```
//!
//! With `theta == 0` all pairs are evaluated directly in O(n²). Otherwise
//! the simulation builds a [`SpatialTree`] each tick and distant clusters
//! are folded into one aggregate body, giving O(n log n).

use super::{ForceContext, ForceOperator, ForceSetup, length_squared};
use crate::random::RandomSource;
use crate::spatial::SpatialTree;

/// Default charge (negative = repulsion)
pub const DEFAULT_CHARGE: f64 = -30.0;

/// Default Barnes-Hut theta (0 = exact)
pub const DEFAULT_THETA: f64 = 0.9;

/// Default minimum distance (distance floor)
pub const DEFAULT_DISTANCE_MIN: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ManyBodyForce {
    pub strength: f64,
    /// Distances below this are floored to it, never below 1
    pub distance_min: f64,
    /// Pairs at or beyond this distance do not interact
    pub distance_max: Option<f64>,
    pub theta: f64,
}

impl ManyBodyForce {
    pub fn new(strength: f64) -> Self {
        Self {
            strength,
            ..Self::default()
        }
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_distance_min(mut self, distance_min: f64) -> Self {
        self.distance_min = distance_min;
        self
    }

    pub fn with_distance_max(mut self, distance_max: Option<f64>) -> Self {
        self.distance_max = distance_max;
        self
    }

    fn floor2(&self) -> f64 {
        let floor = self.distance_min.max(DEFAULT_DISTANCE_MIN);
        floor * floor
    }

    fn cutoff2(&self) -> f64 {
        self.distance_max.map_or(f64::INFINITY, |d| d * d)
    }

    /// Velocity delta contributed by one body (or aggregate) at `offset`
    fn contribution(
        &self,
        mut offset: [f64; 3],
        mass: f64,
        alpha: f64,
        axes: usize,
        random: &mut dyn RandomSource,
    ) -> [f64; 3] {
        let mut d2 = length_squared(&offset, axes);
        if d2 >= self.cutoff2() {
            return [0.0; 3];
        }
        if d2 == 0.0 {
            for v in offset.iter_mut().take(axes) {
                *v = random.jiggle();
            }
            d2 = length_squared(&offset, axes);
        }
        let d2 = d2.max(self.floor2());
        let w = self.strength * alpha * mass / d2;
        let mut dv = [0.0; 3];
        for a in 0..axes {
            dv[a] = offset[a] * w;
        }
        dv
    }

    fn apply_brute_force(&self, ctx: &mut ForceContext<'_>) {
        let alpha = ctx.alpha;
        let axes = ctx.dimensions.count();
        let nodes = &mut *ctx.nodes;
        let random = &mut *ctx.random;
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let mut offset = [0.0; 3];
                for a in 0..axes {
                    offset[a] = nodes[j].coord(a) - nodes[i].coord(a);
                }
                // Unit-mass delta for i; j gets the mirror image.
                let dv = self.contribution(offset, 1.0, alpha, axes, random);
                let (mi, mj) = (nodes[i].mass, nodes[j].mass);
                for a in 0..axes {
                    nodes[i].accelerate(a, dv[a] * mj);
                    nodes[j].accelerate(a, -dv[a] * mi);
                }
            }
        }
    }

    fn apply_tree(&self, ctx: &mut ForceContext<'_>, tree: &SpatialTree) {
        let alpha = ctx.alpha;
        let axes = ctx.dimensions.count();
        let nodes = &mut *ctx.nodes;
        let random = &mut *ctx.random;
        for i in 0..nodes.len() {
            let mut dv = [0.0; 3];
            tree.for_each_interaction(i, nodes, self.theta, |interaction| {
                let delta =
                    self.contribution(interaction.offset, interaction.mass, alpha, axes, random);
                for a in 0..axes {
                    dv[a] += delta[a];
                }
            });
            for a in 0..axes {
                nodes[i].accelerate(a, dv[a]);
            }
        }
    }
}

impl Default for ManyBodyForce {
    fn default() -> Self {
        Self {
            strength: DEFAULT_CHARGE,
            distance_min: DEFAULT_DISTANCE_MIN,
            distance_max: None,
            theta: DEFAULT_THETA,
        }
    }
}

impl ForceOperator for ManyBodyForce {
    fn initialize(&mut self, _setup: &mut ForceSetup<'_>) {}

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        let tree = ctx.tree;
        match tree {
            Some(tree) if self.needs_spatial_index() => self.apply_tree(ctx, tree),
            _ => self.apply_brute_force(ctx),
        }
    }

    fn needs_spatial_index(&self) -> bool {
        self.theta > 0.0
    }
}
