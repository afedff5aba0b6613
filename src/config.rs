//! Force configuration: presets, partial overrides, validation
//!
//! A [`ForceConfiguration`] is a nested record with one block per force
//! (enabled flag plus parameters) and a top-level velocity decay. It is
//! built from a [`Preset`], by merging a [`PartialForceConfiguration`] onto
//! a base, or with the fluent [`ForceConfigurationBuilder`], and is applied
//! to a simulation as a whole.
//!
//! Validation is advisory: [`validate`] lists out-of-range values as
//! human-readable strings for UI layers and never rejects anything.
//!
//! # Document format
//!
//! Configurations serialize with camelCase keys. A partial override in YAML:
//!
//! ```yaml
//! charge:
//!   strength: -80
//!   distanceMax: 400
//! collision:
//!   enabled: true
//!   radius: auto
//! velocityDecay: 0.5
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::forces::{
    Axis, CenterForce, CollideForce, CollideRadius, Force, LinkForce, ManyBodyForce,
    PositionForce, RadialForce,
};
use crate::io::read_document;
use crate::node::Point;

/// Registry names of the configured forces
pub const FORCE_CENTER: &str = "center";
pub const FORCE_CHARGE: &str = "charge";
pub const FORCE_LINK: &str = "link";
pub const FORCE_COLLIDE: &str = "collide";
pub const FORCE_RADIAL: &str = "radial";
pub const FORCE_X: &str = "x";
pub const FORCE_Y: &str = "y";
pub const FORCE_Z: &str = "z";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterConfig {
    pub enabled: bool,
    pub strength: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeConfig {
    pub enabled: bool,
    pub strength: f64,
    pub distance_min: f64,
    /// Absent means unbounded
    #[serde(default)]
    pub distance_max: Option<f64>,
    pub theta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConfig {
    pub enabled: bool,
    pub distance: f64,
    pub strength: f64,
    pub iterations: u32,
}

/// Collision radius: a number, or `"auto"` for each node's own radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RadiusRepr", into = "RadiusRepr")]
pub enum CollisionRadius {
    Auto,
    Fixed(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RadiusRepr {
    Number(f64),
    Keyword(String),
}

impl TryFrom<RadiusRepr> for CollisionRadius {
    type Error = String;

    fn try_from(repr: RadiusRepr) -> Result<Self, Self::Error> {
        match repr {
            RadiusRepr::Number(r) => Ok(CollisionRadius::Fixed(r)),
            RadiusRepr::Keyword(k) if k == "auto" => Ok(CollisionRadius::Auto),
            RadiusRepr::Keyword(k) => Err(format!("expected a number or \"auto\", got {k:?}")),
        }
    }
}

impl From<CollisionRadius> for RadiusRepr {
    fn from(radius: CollisionRadius) -> Self {
        match radius {
            CollisionRadius::Auto => RadiusRepr::Keyword("auto".to_string()),
            CollisionRadius::Fixed(r) => RadiusRepr::Number(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionConfig {
    pub enabled: bool,
    pub radius: CollisionRadius,
    pub strength: f64,
    pub iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadialConfig {
    pub enabled: bool,
    pub strength: f64,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub enabled: bool,
    pub strength: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionConfig {
    pub x: AxisConfig,
    pub y: AxisConfig,
    pub z: AxisConfig,
}

impl PositionConfig {
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisConfig {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

/// Full force configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceConfiguration {
    pub center: CenterConfig,
    pub charge: ChargeConfig,
    pub link: LinkConfig,
    pub collision: CollisionConfig,
    pub radial: RadialConfig,
    pub position: PositionConfig,
    /// Fraction of velocity kept after each tick
    pub velocity_decay: f64,
}

impl Default for ForceConfiguration {
    fn default() -> Self {
        Preset::Default.configuration()
    }
}

impl ForceConfiguration {
    /// Build the named force map for this configuration. Disabled blocks
    /// produce no entry at all.
    pub fn to_forces(&self) -> IndexMap<String, Force> {
        let mut forces = IndexMap::new();

        if self.center.enabled {
            let c = &self.center;
            forces.insert(
                FORCE_CENTER.to_string(),
                CenterForce::new(Point::new(c.x, c.y, c.z), c.strength).into(),
            );
        }
        if self.charge.enabled {
            let c = &self.charge;
            forces.insert(
                FORCE_CHARGE.to_string(),
                ManyBodyForce::new(c.strength)
                    .with_theta(c.theta)
                    .with_distance_min(c.distance_min)
                    .with_distance_max(c.distance_max)
                    .into(),
            );
        }
        if self.link.enabled {
            let l = &self.link;
            forces.insert(
                FORCE_LINK.to_string(),
                LinkForce::new(l.distance, l.strength, l.iterations).into(),
            );
        }
        if self.collision.enabled {
            let c = &self.collision;
            let radius = match c.radius {
                CollisionRadius::Auto => CollideRadius::Node,
                CollisionRadius::Fixed(r) => CollideRadius::Constant(r),
            };
            forces.insert(
                FORCE_COLLIDE.to_string(),
                CollideForce::new(radius, c.strength, c.iterations).into(),
            );
        }
        if self.radial.enabled {
            let r = &self.radial;
            forces.insert(
                FORCE_RADIAL.to_string(),
                RadialForce::new(Point::new(r.x, r.y, r.z), r.radius, r.strength).into(),
            );
        }
        for (name, axis) in [(FORCE_X, Axis::X), (FORCE_Y, Axis::Y), (FORCE_Z, Axis::Z)] {
            let a = self.position.axis(axis);
            if a.enabled {
                forces.insert(
                    name.to_string(),
                    PositionForce::new(axis, a.target, a.strength).into(),
                );
            }
        }

        forces
    }
}

/// Built-in configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Default,
    Dense,
    Sparse,
    Clustered,
    Radial,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Default,
        Preset::Dense,
        Preset::Sparse,
        Preset::Clustered,
        Preset::Radial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Dense => "dense",
            Preset::Sparse => "sparse",
            Preset::Clustered => "clustered",
            Preset::Radial => "radial",
        }
    }

    /// A fresh copy of the preset's configuration
    pub fn configuration(&self) -> ForceConfiguration {
        let base = ForceConfiguration {
            center: CenterConfig {
                enabled: true,
                strength: 0.05,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            charge: ChargeConfig {
                enabled: true,
                strength: -30.0,
                distance_min: 1.0,
                distance_max: None,
                theta: 0.9,
            },
            link: LinkConfig {
                enabled: true,
                distance: 30.0,
                strength: 1.0,
                iterations: 1,
            },
            collision: CollisionConfig {
                enabled: false,
                radius: CollisionRadius::Auto,
                strength: 0.7,
                iterations: 1,
            },
            radial: RadialConfig {
                enabled: false,
                strength: 0.1,
                radius: 100.0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            position: PositionConfig {
                x: AxisConfig {
                    enabled: false,
                    strength: 0.1,
                    target: 0.0,
                },
                y: AxisConfig {
                    enabled: false,
                    strength: 0.1,
                    target: 0.0,
                },
                z: AxisConfig {
                    enabled: false,
                    strength: 0.1,
                    target: 0.0,
                },
            },
            velocity_decay: 0.6,
        };

        match self {
            Preset::Default => base,
            Preset::Dense => ForceConfigurationBuilder::from(base)
                .center_strength(0.1)
                .charge_strength(-15.0)
                .distance_max(Some(200.0))
                .link_distance(20.0)
                .link_iterations(2)
                .collision(CollisionRadius::Auto, 0.9)
                .collision_iterations(2)
                .velocity_decay(0.5)
                .build(),
            Preset::Sparse => ForceConfigurationBuilder::from(base)
                .center_strength(0.02)
                .charge_strength(-120.0)
                .theta(0.8)
                .link_distance(100.0)
                .link_strength(0.5)
                .build(),
            Preset::Clustered => ForceConfigurationBuilder::from(base)
                .charge_strength(-60.0)
                .distance_max(Some(300.0))
                .link_distance(25.0)
                .link_strength(1.5)
                .link_iterations(3)
                .collision(CollisionRadius::Fixed(8.0), 0.7)
                .velocity_decay(0.55)
                .build(),
            Preset::Radial => ForceConfigurationBuilder::from(base)
                .disable_center()
                .charge_strength(-40.0)
                .link_distance(50.0)
                .link_strength(0.7)
                .collision(CollisionRadius::Auto, 0.8)
                .radial(200.0, 0.1)
                .build(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LayoutError::UnknownPreset(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialCenterConfig {
    pub enabled: Option<bool>,
    pub strength: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialChargeConfig {
    pub enabled: Option<bool>,
    pub strength: Option<f64>,
    pub distance_min: Option<f64>,
    /// `Some(None)` clears the cutoff; an explicit `null` in a document
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub distance_max: Option<Option<f64>>,
    pub theta: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialLinkConfig {
    pub enabled: Option<bool>,
    pub distance: Option<f64>,
    pub strength: Option<f64>,
    pub iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialCollisionConfig {
    pub enabled: Option<bool>,
    pub radius: Option<CollisionRadius>,
    pub strength: Option<f64>,
    pub iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialRadialConfig {
    pub enabled: Option<bool>,
    pub strength: Option<f64>,
    pub radius: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialAxisConfig {
    pub enabled: Option<bool>,
    pub strength: Option<f64>,
    pub target: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialPositionConfig {
    pub x: Option<PartialAxisConfig>,
    pub y: Option<PartialAxisConfig>,
    pub z: Option<PartialAxisConfig>,
}

/// Overrides for any subset of a [`ForceConfiguration`]'s leaves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialForceConfiguration {
    pub center: Option<PartialCenterConfig>,
    pub charge: Option<PartialChargeConfig>,
    pub link: Option<PartialLinkConfig>,
    pub collision: Option<PartialCollisionConfig>,
    pub radial: Option<PartialRadialConfig>,
    pub position: Option<PartialPositionConfig>,
    pub velocity_decay: Option<f64>,
}

impl PartialForceConfiguration {
    /// Load overrides from a JSON or YAML file
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        read_document(path)
    }
}

/// Marks a key that is present, so `null` stays distinct from omitted
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn merge_axis(target: &mut AxisConfig, partial: &PartialAxisConfig) {
    set(&mut target.enabled, partial.enabled);
    set(&mut target.strength, partial.strength);
    set(&mut target.target, partial.target);
}

/// Override `base` leaf by leaf with the values present in `partial`
pub fn merge(partial: &PartialForceConfiguration, base: &ForceConfiguration) -> ForceConfiguration {
    let mut merged = base.clone();

    if let Some(p) = &partial.center {
        let c = &mut merged.center;
        set(&mut c.enabled, p.enabled);
        set(&mut c.strength, p.strength);
        set(&mut c.x, p.x);
        set(&mut c.y, p.y);
        set(&mut c.z, p.z);
    }
    if let Some(p) = &partial.charge {
        let c = &mut merged.charge;
        set(&mut c.enabled, p.enabled);
        set(&mut c.strength, p.strength);
        set(&mut c.distance_min, p.distance_min);
        set(&mut c.distance_max, p.distance_max);
        set(&mut c.theta, p.theta);
    }
    if let Some(p) = &partial.link {
        let l = &mut merged.link;
        set(&mut l.enabled, p.enabled);
        set(&mut l.distance, p.distance);
        set(&mut l.strength, p.strength);
        set(&mut l.iterations, p.iterations);
    }
    if let Some(p) = &partial.collision {
        let c = &mut merged.collision;
        set(&mut c.enabled, p.enabled);
        set(&mut c.radius, p.radius);
        set(&mut c.strength, p.strength);
        set(&mut c.iterations, p.iterations);
    }
    if let Some(p) = &partial.radial {
        let r = &mut merged.radial;
        set(&mut r.enabled, p.enabled);
        set(&mut r.strength, p.strength);
        set(&mut r.radius, p.radius);
        set(&mut r.x, p.x);
        set(&mut r.y, p.y);
        set(&mut r.z, p.z);
    }
    if let Some(p) = &partial.position {
        for (axis, partial_axis) in [(Axis::X, &p.x), (Axis::Y, &p.y), (Axis::Z, &p.z)] {
            if let Some(pa) = partial_axis {
                merge_axis(merged.position.axis_mut(axis), pa);
            }
        }
    }
    set(&mut merged.velocity_decay, partial.velocity_decay);

    merged
}

/// [`merge`] onto the default preset
pub fn merge_onto_default(partial: &PartialForceConfiguration) -> ForceConfiguration {
    merge(partial, &ForceConfiguration::default())
}

fn check_range(violations: &mut Vec<String>, path: &str, value: f64, lo: f64, hi: f64) {
    if !(lo..=hi).contains(&value) {
        violations.push(format!("{path} must be within [{lo}, {hi}], got {value}"));
    }
}

/// List every out-of-range value. Never fails; an empty list means valid.
pub fn validate(config: &ForceConfiguration) -> Vec<String> {
    let mut violations = Vec::new();

    check_range(&mut violations, "center.strength", config.center.strength, 0.0, 1.0);

    let charge = &config.charge;
    if charge.strength > 0.0 {
        violations.push(format!(
            "charge.strength is positive ({}); nodes will attract instead of repel",
            charge.strength
        ));
    } else if charge.strength.is_nan() {
        violations.push("charge.strength must be a number, got NaN".to_string());
    }
    check_range(&mut violations, "charge.theta", charge.theta, 0.0, 2.0);
    if !(charge.distance_min >= 0.0) {
        violations.push(format!(
            "charge.distanceMin must be non-negative, got {}",
            charge.distance_min
        ));
    }
    if let Some(max) = charge.distance_max {
        if !(max >= charge.distance_min) {
            violations.push(format!(
                "charge.distanceMax must be at least distanceMin ({}), got {max}",
                charge.distance_min
            ));
        }
    }

    check_range(&mut violations, "link.distance", config.link.distance, 10.0, 500.0);
    if config.link.iterations == 0 {
        violations.push("link.iterations must be at least 1".to_string());
    }

    check_range(&mut violations, "collision.strength", config.collision.strength, 0.0, 1.0);
    if let CollisionRadius::Fixed(r) = config.collision.radius {
        if !(r >= 0.0) {
            violations.push(format!("collision.radius must be non-negative, got {r}"));
        }
    }

    check_range(&mut violations, "radial.strength", config.radial.strength, 0.0, 1.0);
    for (name, axis) in [("x", Axis::X), ("y", Axis::Y), ("z", Axis::Z)] {
        let path = format!("position.{name}.strength");
        check_range(&mut violations, &path, config.position.axis(axis).strength, 0.0, 1.0);
    }

    check_range(&mut violations, "velocityDecay", config.velocity_decay, 0.0, 1.0);

    violations
}

/// Fluent builder over a [`ForceConfiguration`]
#[derive(Debug, Clone, Default)]
pub struct ForceConfigurationBuilder {
    config: ForceConfiguration,
}

impl From<ForceConfiguration> for ForceConfigurationBuilder {
    fn from(config: ForceConfiguration) -> Self {
        Self { config }
    }
}

impl ForceConfigurationBuilder {
    /// Start from the default preset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(preset: Preset) -> Self {
        Self::from(preset.configuration())
    }

    pub fn center(mut self, x: f64, y: f64, z: f64) -> Self {
        self.config.center.enabled = true;
        self.config.center.x = x;
        self.config.center.y = y;
        self.config.center.z = z;
        self
    }

    pub fn center_strength(mut self, strength: f64) -> Self {
        self.config.center.enabled = true;
        self.config.center.strength = strength;
        self
    }

    pub fn disable_center(mut self) -> Self {
        self.config.center.enabled = false;
        self
    }

    pub fn charge_strength(mut self, strength: f64) -> Self {
        self.config.charge.enabled = true;
        self.config.charge.strength = strength;
        self
    }

    pub fn theta(mut self, theta: f64) -> Self {
        self.config.charge.theta = theta;
        self
    }

    pub fn distance_min(mut self, distance_min: f64) -> Self {
        self.config.charge.distance_min = distance_min;
        self
    }

    pub fn distance_max(mut self, distance_max: Option<f64>) -> Self {
        self.config.charge.distance_max = distance_max;
        self
    }

    pub fn disable_charge(mut self) -> Self {
        self.config.charge.enabled = false;
        self
    }

    pub fn link_distance(mut self, distance: f64) -> Self {
        self.config.link.enabled = true;
        self.config.link.distance = distance;
        self
    }

    pub fn link_strength(mut self, strength: f64) -> Self {
        self.config.link.strength = strength;
        self
    }

    pub fn link_iterations(mut self, iterations: u32) -> Self {
        self.config.link.iterations = iterations;
        self
    }

    pub fn disable_link(mut self) -> Self {
        self.config.link.enabled = false;
        self
    }

    pub fn collision(mut self, radius: CollisionRadius, strength: f64) -> Self {
        self.config.collision.enabled = true;
        self.config.collision.radius = radius;
        self.config.collision.strength = strength;
        self
    }

    pub fn collision_iterations(mut self, iterations: u32) -> Self {
        self.config.collision.iterations = iterations;
        self
    }

    pub fn disable_collision(mut self) -> Self {
        self.config.collision.enabled = false;
        self
    }

    pub fn radial(mut self, radius: f64, strength: f64) -> Self {
        self.config.radial.enabled = true;
        self.config.radial.radius = radius;
        self.config.radial.strength = strength;
        self
    }

    pub fn disable_radial(mut self) -> Self {
        self.config.radial.enabled = false;
        self
    }

    /// Pull toward `target` on one axis
    pub fn axis(mut self, axis: Axis, target: f64, strength: f64) -> Self {
        let a = self.config.position.axis_mut(axis);
        a.enabled = true;
        a.target = target;
        a.strength = strength;
        self
    }

    pub fn disable_axis(mut self, axis: Axis) -> Self {
        self.config.position.axis_mut(axis).enabled = false;
        self
    }

    pub fn velocity_decay(mut self, velocity_decay: f64) -> Self {
        self.config.velocity_decay = velocity_decay;
        self
    }

    /// Apply partial overrides on top of what has been built so far
    pub fn merge(mut self, partial: &PartialForceConfiguration) -> Self {
        self.config = merge(partial, &self.config);
        self
    }

    pub fn build(self) -> ForceConfiguration {
        self.config
    }
}
