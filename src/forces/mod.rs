//! Force operators
//!
//! Every force turns the current node positions into velocity deltas,
//! scaled by the simulation's alpha. The set of forces is closed: each
//! variant of [`Force`] wraps one operator, and all of them implement
//! [`ForceOperator`].
//!
//! # Forces
//!
//! - **Center**: linear spring toward a target point
//! - **Many-Body**: pairwise inverse-square repulsion/attraction, brute force
//!   or Barnes-Hut approximated
//! - **Link**: springs toward a rest length between linked nodes
//! - **Collide**: separation of overlapping circles/spheres
//! - **Radial**: pull toward a ring/shell around a center
//! - **Position**: pull toward a coordinate on a single axis
//!
//! Fixed axes are never pushed (see [`SimulationNode::accelerate`]), but
//! fixed nodes still take part as sources of force for everyone else.

mod center;
mod collide;
mod link;
mod many_body;
mod position;
mod radial;

pub use center::CenterForce;
pub use collide::{CollideForce, CollideRadius};
pub use link::LinkForce;
pub use many_body::ManyBodyForce;
pub use position::{Axis, PositionForce};
pub use radial::RadialForce;

use crate::node::{Dimensions, SimulationLink, SimulationNode};
use crate::random::RandomSource;
use crate::spatial::SpatialTree;

/// Inputs handed to a force whenever the node set or links change
pub struct ForceSetup<'a> {
    pub nodes: &'a [SimulationNode],
    pub links: &'a [SimulationLink],
    pub dimensions: Dimensions,
    pub random: &'a mut dyn RandomSource,
}

/// Per-tick state handed to a force
pub struct ForceContext<'a> {
    /// Current simulation alpha
    pub alpha: f64,
    /// Live node array; forces mutate velocities only
    pub nodes: &'a mut [SimulationNode],
    /// Spatial index built this tick, when any force asked for one
    pub tree: Option<&'a SpatialTree>,
    pub dimensions: Dimensions,
    pub random: &'a mut dyn RandomSource,
}

/// Shared interface of all force operators
pub trait ForceOperator {
    /// Precompute per-node/per-link state. Runs whenever nodes or links change.
    fn initialize(&mut self, setup: &mut ForceSetup<'_>);

    /// Apply the force for one tick, mutating node velocities
    fn apply(&mut self, ctx: &mut ForceContext<'_>);

    /// Whether this force wants a Barnes-Hut tree built before it runs
    fn needs_spatial_index(&self) -> bool {
        false
    }
}

/// One registered force
#[derive(Debug, Clone)]
pub enum Force {
    Center(CenterForce),
    ManyBody(ManyBodyForce),
    Link(LinkForce),
    Collide(CollideForce),
    Radial(RadialForce),
    Position(PositionForce),
}

impl Force {
    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Force::Center(_) => "center",
            Force::ManyBody(_) => "many_body",
            Force::Link(_) => "link",
            Force::Collide(_) => "collide",
            Force::Radial(_) => "radial",
            Force::Position(_) => "position",
        }
    }

    fn operator(&mut self) -> &mut dyn ForceOperator {
        match self {
            Force::Center(f) => f,
            Force::ManyBody(f) => f,
            Force::Link(f) => f,
            Force::Collide(f) => f,
            Force::Radial(f) => f,
            Force::Position(f) => f,
        }
    }
}

impl ForceOperator for Force {
    fn initialize(&mut self, setup: &mut ForceSetup<'_>) {
        self.operator().initialize(setup);
    }

    fn apply(&mut self, ctx: &mut ForceContext<'_>) {
        self.operator().apply(ctx);
    }

    fn needs_spatial_index(&self) -> bool {
        match self {
            Force::ManyBody(f) => f.needs_spatial_index(),
            _ => false,
        }
    }
}

impl From<CenterForce> for Force {
    fn from(f: CenterForce) -> Self {
        Force::Center(f)
    }
}

impl From<ManyBodyForce> for Force {
    fn from(f: ManyBodyForce) -> Self {
        Force::ManyBody(f)
    }
}

impl From<LinkForce> for Force {
    fn from(f: LinkForce) -> Self {
        Force::Link(f)
    }
}

impl From<CollideForce> for Force {
    fn from(f: CollideForce) -> Self {
        Force::Collide(f)
    }
}

impl From<RadialForce> for Force {
    fn from(f: RadialForce) -> Self {
        Force::Radial(f)
    }
}

impl From<PositionForce> for Force {
    fn from(f: PositionForce) -> Self {
        Force::Position(f)
    }
}

/// Squared length of an offset over the simulated axes
pub(crate) fn length_squared(offset: &[f64; 3], axes: usize) -> f64 {
    offset[..axes].iter().map(|v| v * v).sum()
}
