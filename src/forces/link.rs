//! Link force: springs pulling linked nodes toward a rest distance.
//!
//! Each spring's strength is split between its endpoints by degree, so a
//! hub moves less than the leaf it is tied to. Springs are relaxed in place
//! (Gauss-Seidel), optionally several times per tick.

use std::collections::HashMap;

use tracing::debug;

use super::{ForceContext, ForceOperator, ForceSetup, length_squared};
use crate::node::{LinkEndpoint, SimulationNode};

/// Default rest length
pub const DEFAULT_LINK_DISTANCE: f64 = 30.0;

/// Default strength multiplier (applied on top of the degree normalization)
pub const DEFAULT_LINK_STRENGTH: f64 = 1.0;

/// A link whose endpoints resolved to node indices
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spring {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    /// Share of the correction taken by the target
    bias: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkForce {
    /// Rest length for links without their own distance
    pub distance: f64,
    /// Strength multiplier for links without their own strength
    pub strength: f64,
    /// Relaxation passes per tick
    pub iterations: u32,
    springs: Vec<Spring>,
}

impl LinkForce {
    pub fn new(distance: f64, strength: f64, iterations: u32) -> Self {
        Self {
            distance,
            strength,
            iterations,
            springs: Vec::new(),
        }
    }

    /// Number of links that resolved to two distinct nodes
    pub fn resolved_len(&self) -> usize {
        self.springs.len()
    }
}

impl Default for LinkForce {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_DISTANCE, DEFAULT_LINK_STRENGTH, 1)
    }
}

fn resolve(
    endpoint: &LinkEndpoint,
    nodes: &[SimulationNode],
    by_id: &HashMap<&str, usize>,
) -> Option<usize> {
    match endpoint {
        LinkEndpoint::Index(i) => (*i < nodes.len()).then_some(*i),
        LinkEndpoint::Id(id) => by_id.get(id.as_str()).copied(),
    }
}

impl ForceOperator for LinkForce {
    fn initialize(&mut self, setup: &mut ForceSetup<'_>) {
        let nodes = setup.nodes;
        let by_id: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut resolved = Vec::with_capacity(setup.links.len());
        let mut skipped = 0usize;
        for link in setup.links {
            let source = resolve(&link.source, nodes, &by_id);
            let target = resolve(&link.target, nodes, &by_id);
            match (source, target) {
                (Some(s), Some(t)) if s != t => resolved.push((s, t, link)),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "ignoring links with unresolved or identical endpoints");
        }

        let mut degree = vec![0usize; nodes.len()];
        for &(s, t, _) in &resolved {
            degree[s] += 1;
            degree[t] += 1;
        }

        self.springs = resolved
            .into_iter()
            .map(|(source, target, link)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Spring {
                    source,
                    target,
                    distance: link.distance.unwrap_or(self.distance),
                    strength: link.strength.unwrap_or(self.strength / ds.min(dt)),
                    bias: ds / (ds + dt),
                }
            })
            .collect();
    }

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        let axes = ctx.dimensions.count();
        for _ in 0..self.iterations {
            for spring in &self.springs {
                let (s, t) = (&ctx.nodes[spring.source], &ctx.nodes[spring.target]);
                let mut offset = [0.0; 3];
                for a in 0..axes {
                    offset[a] = t.predicted(a) - s.predicted(a);
                    if offset[a] == 0.0 {
                        offset[a] = ctx.random.jiggle();
                    }
                }
                let l = length_squared(&offset, axes).sqrt();
                let k = (l - spring.distance) / l * ctx.alpha * spring.strength;
                for a in 0..axes {
                    let dv = offset[a] * k;
                    ctx.nodes[spring.target].accelerate(a, -dv * spring.bias);
                    ctx.nodes[spring.source].accelerate(a, dv * (1.0 - spring.bias));
                }
            }
        }
    }
}
