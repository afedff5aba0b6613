//! Node and link records for the force simulation
//!
//! Nodes carry position, velocity, optional fixed coordinates, mass and
//! radius. Links connect two nodes by id or by index and carry optional
//! per-link rest distance and strength.

use serde::{Deserialize, Serialize};

/// Default node mass (weights many-body force and center of mass)
pub const DEFAULT_MASS: f64 = 1.0;

/// Default node radius (collision and cluster size)
pub const DEFAULT_RADIUS: f64 = 5.0;

/// Number of simulated axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimensions {
    #[default]
    Two,
    Three,
}

impl Dimensions {
    /// Number of axes as a count (2 or 3)
    pub fn count(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }

    /// Whether the z axis takes part in the simulation
    pub fn is_3d(self) -> bool {
        self == Dimensions::Three
    }
}

/// A point in simulation space. `z` is ignored in 2D.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// A simulated body
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationNode {
    /// Caller-supplied identifier
    pub id: String,
    /// Position in the live node array (maintained by the simulation)
    pub index: usize,
    /// Position; non-finite coordinates mean "not placed yet"
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Velocity
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    /// Fixed coordinates. A fixed axis is snapped each tick and its velocity zeroed.
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub fz: Option<f64>,
    /// Mass (>= 0)
    pub mass: f64,
    /// Radius for collision
    pub radius: f64,
}

impl SimulationNode {
    /// Create an unplaced node with default mass and radius
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: 0,
            x: f64::NAN,
            y: f64::NAN,
            z: f64::NAN,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            fx: None,
            fy: None,
            fz: None,
            mass: DEFAULT_MASS,
            radius: DEFAULT_RADIUS,
        }
    }

    /// Place the node in the xy plane
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        if !self.z.is_finite() {
            self.z = 0.0;
        }
        self
    }

    /// Place the node in 3D space
    pub fn with_position_3d(mut self, x: f64, y: f64, z: f64) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64, vz: f64) -> Self {
        self.vx = vx;
        self.vy = vy;
        self.vz = vz;
        self
    }

    /// Pin the node in the xy plane (z stays free)
    pub fn with_fixed(mut self, fx: f64, fy: f64) -> Self {
        self.fx = Some(fx);
        self.fy = Some(fy);
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass.max(0.0);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Whether every simulated coordinate is finite
    pub fn has_position(&self, dimensions: Dimensions) -> bool {
        let planar = self.x.is_finite() && self.y.is_finite();
        if dimensions.is_3d() {
            planar && self.z.is_finite()
        } else {
            planar
        }
    }

    /// Whether any axis is pinned
    pub fn is_fixed(&self) -> bool {
        self.fx.is_some() || self.fy.is_some() || self.fz.is_some()
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y, self.z)
    }

    pub fn coord(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn velocity(&self, axis: usize) -> f64 {
        match axis {
            0 => self.vx,
            1 => self.vy,
            _ => self.vz,
        }
    }

    pub fn fixed(&self, axis: usize) -> Option<f64> {
        match axis {
            0 => self.fx,
            1 => self.fy,
            _ => self.fz,
        }
    }

    /// Position plus velocity on one axis
    pub fn predicted(&self, axis: usize) -> f64 {
        self.coord(axis) + self.velocity(axis)
    }

    /// Add to the velocity of one axis. Fixed axes are left untouched.
    pub fn accelerate(&mut self, axis: usize, dv: f64) {
        if self.fixed(axis).is_some() {
            return;
        }
        match axis {
            0 => self.vx += dv,
            1 => self.vy += dv,
            _ => self.vz += dv,
        }
    }
}

/// One end of a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEndpoint {
    /// Position in the node array
    Index(usize),
    /// Node id
    Id(String),
}

impl From<&str> for LinkEndpoint {
    fn from(id: &str) -> Self {
        LinkEndpoint::Id(id.to_string())
    }
}

impl From<String> for LinkEndpoint {
    fn from(id: String) -> Self {
        LinkEndpoint::Id(id)
    }
}

impl From<usize> for LinkEndpoint {
    fn from(index: usize) -> Self {
        LinkEndpoint::Index(index)
    }
}

/// A spring between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationLink {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
    /// Rest length; falls back to the configured link distance
    pub distance: Option<f64>,
    /// Spring strength; falls back to the degree-normalized configured strength
    pub strength: Option<f64>,
}

impl SimulationLink {
    pub fn new(source: impl Into<LinkEndpoint>, target: impl Into<LinkEndpoint>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            distance: None,
            strength: None,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }
}
