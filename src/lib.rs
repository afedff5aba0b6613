//! forcelayout - force-directed graph layout in 2D and 3D.
//!
//! A [`Simulation`] owns nodes and links and advances them through discrete
//! ticks under a registry of named forces (center, many-body with a
//! Barnes-Hut tree, links, collision, radial and per-axis positioning),
//! cooling an alpha schedule until the layout settles. Forces are configured
//! from presets or partial overrides through the [`config`] module.

pub mod cli;
pub mod config;
pub mod error;
pub mod forces;
pub mod graph;
pub mod io;
pub mod node;
pub mod random;
pub mod scheduler;
pub mod simulation;
pub mod spatial;

pub use config::{ForceConfiguration, ForceConfigurationBuilder, PartialForceConfiguration, Preset};
pub use error::{LayoutError, LayoutResult};
pub use forces::{Force, ForceOperator};
pub use node::{Dimensions, LinkEndpoint, Point, SimulationLink, SimulationNode};
pub use simulation::{EventKind, FrameOutcome, Simulation, SimulationEvent};
