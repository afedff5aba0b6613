//! Force simulation core
//!
//! Owns the live node and link arrays, the named force registry and the
//! alpha cooling schedule. Each tick rebuilds the spatial index when a force
//! needs it, lets every force adjust velocities, integrates positions and
//! cools alpha toward its target.
//!
//! A run started with [`Simulation::start`] is driven by the host calling
//! [`Simulation::advance_frame`] whenever its frame scheduler says so, and
//! ends (emitting [`EventKind::End`] once) when alpha falls below `alpha_min`.

use std::f64::consts::PI;
use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::config::{ForceConfiguration, Preset};
use crate::forces::{Force, ForceContext, ForceOperator, ForceSetup};
use crate::node::{Dimensions, Point, SimulationLink, SimulationNode};
use crate::random::{DEFAULT_SEED, RandomSource, seeded};
use crate::scheduler::{Clock, FrameHandle, FrameScheduler, ManualScheduler, MonotonicClock};
use crate::spatial::SpatialTree;

/// Initial alpha of a fresh simulation
pub const DEFAULT_ALPHA: f64 = 1.0;

/// A scheduled run ends once alpha drops below this
pub const DEFAULT_ALPHA_MIN: f64 = 0.001;

/// Alpha target the schedule cools toward
pub const DEFAULT_ALPHA_TARGET: f64 = 0.0;

/// Fraction of velocity kept after each tick
pub const DEFAULT_VELOCITY_DECAY: f64 = 0.6;

/// Conventional alpha for [`Simulation::reheat`] after a small change
pub const DEFAULT_REHEAT_ALPHA: f64 = 0.3;

/// Initial placement radius per √node
const PLACEMENT_SCALE: f64 = 10.0;

/// Decay that takes alpha from 1 to `alpha_min` in roughly 300 ticks
pub fn default_alpha_decay() -> f64 {
    1.0 - DEFAULT_ALPHA_MIN.powf(1.0 / 300.0)
}

/// Lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A tick completed
    Tick,
    /// A scheduled run cooled below `alpha_min` and stopped
    End,
}

/// Payload handed to listeners. Borrows the live node array.
#[derive(Debug, Clone, Copy)]
pub struct SimulationEvent<'a> {
    pub kind: EventKind,
    pub alpha: f64,
    pub nodes: &'a [SimulationNode],
}

/// Handle returned by [`Simulation::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&SimulationEvent<'_>) -> ControlFlow<()>>;

/// What [`Simulation::advance_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No run is scheduled
    Stopped,
    /// A frame is scheduled but not due yet
    Pending,
    /// One tick ran and the next frame is scheduled (unless a listener stopped the run)
    Ticked,
    /// One tick ran, alpha cooled below `alpha_min` and the run ended
    Ended,
}

/// Cumulative tick statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationMetrics {
    pub ticks: u64,
    pub total_compute: Duration,
    pub last_tick: Duration,
}

impl SimulationMetrics {
    /// Mean compute time per tick
    pub fn mean_tick(&self) -> Duration {
        match u32::try_from(self.ticks) {
            Ok(0) => Duration::ZERO,
            Ok(ticks) => self.total_compute / ticks,
            Err(_) => Duration::from_secs_f64(self.total_compute.as_secs_f64() / self.ticks as f64),
        }
    }
}

/// Force-directed layout simulation
pub struct Simulation {
    nodes: Vec<SimulationNode>,
    links: Vec<SimulationLink>,
    forces: IndexMap<String, Force>,
    tree: SpatialTree,
    dimensions: Dimensions,
    configuration: ForceConfiguration,

    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    velocity_decay: f64,

    random: Box<dyn RandomSource>,
    scheduler: Box<dyn FrameScheduler>,
    clock: Box<dyn Clock>,
    frame: Option<FrameHandle>,

    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    metrics: SimulationMetrics,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("forces", &self.forces.keys().collect::<Vec<_>>())
            .field("dimensions", &self.dimensions)
            .field("alpha", &self.alpha)
            .field("running", &self.is_running())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Dimensions::Two)
    }
}

impl Simulation {
    /// Empty simulation with the default preset, a ChaCha generator seeded
    /// with [`DEFAULT_SEED`], a [`ManualScheduler`] and a [`MonotonicClock`]
    pub fn new(dimensions: Dimensions) -> Self {
        let configuration = Preset::Default.configuration();
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            forces: configuration.to_forces(),
            tree: SpatialTree::default(),
            dimensions,
            alpha: DEFAULT_ALPHA,
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_decay: default_alpha_decay(),
            alpha_target: DEFAULT_ALPHA_TARGET,
            velocity_decay: configuration.velocity_decay,
            configuration,
            random: Box::new(seeded(DEFAULT_SEED)),
            scheduler: Box::new(ManualScheduler::new()),
            clock: Box::new(MonotonicClock::default()),
            frame: None,
            listeners: Vec::new(),
            next_listener: 0,
            metrics: SimulationMetrics::default(),
        }
    }

    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    pub fn with_scheduler(mut self, scheduler: impl FrameScheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.apply_preset(preset);
        self
    }

    pub fn with_configuration(mut self, configuration: ForceConfiguration) -> Self {
        self.apply_configuration(configuration, None);
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<SimulationNode>) -> Self {
        self.set_nodes(nodes);
        self
    }

    pub fn with_links(mut self, links: Vec<SimulationLink>) -> Self {
        self.set_links(links);
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimulationLink] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&SimulationNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Replace the node array. Unplaced nodes are scattered in a disc (ball
    /// in 3D) whose radius grows with the node count; fixed coordinates win
    /// over the scatter. Every force is re-initialized.
    pub fn set_nodes(&mut self, nodes: Vec<SimulationNode>) -> &mut Self {
        self.nodes = nodes;
        let radius = ((self.nodes.len() + 1) as f64).sqrt() * PLACEMENT_SCALE;
        let axes = self.dimensions.count();
        let mut placed = 0usize;

        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.index = index;

            let missing = (0..axes).any(|a| node.fixed(a).is_none() && !node.coord(a).is_finite());
            let scatter = if missing {
                placed += 1;
                scatter_point(self.random.as_mut(), radius, self.dimensions)
            } else {
                [0.0; 3]
            };
            for (a, &fallback) in scatter.iter().enumerate().take(axes) {
                let value = match node.fixed(a) {
                    Some(fixed) => fixed,
                    None if node.coord(a).is_finite() => node.coord(a),
                    None => fallback,
                };
                set_axis(node, a, value);
            }
            if !self.dimensions.is_3d() && !node.z.is_finite() {
                node.z = 0.0;
            }

            if !node.vx.is_finite() {
                node.vx = 0.0;
            }
            if !node.vy.is_finite() {
                node.vy = 0.0;
            }
            if !node.vz.is_finite() {
                node.vz = 0.0;
            }
        }

        debug!(nodes = self.nodes.len(), placed, radius, "replaced node array");
        self.initialize_forces();
        self
    }

    /// Replace the link array and re-initialize the forces
    pub fn set_links(&mut self, links: Vec<SimulationLink>) -> &mut Self {
        self.links = links;
        debug!(links = self.links.len(), "replaced link array");
        self.initialize_forces();
        self
    }

    /// Rebuild the force registry from a configuration. Disabled blocks are
    /// removed outright. Links are replaced when given.
    pub fn apply_configuration(
        &mut self,
        configuration: ForceConfiguration,
        links: Option<Vec<SimulationLink>>,
    ) -> &mut Self {
        if let Some(links) = links {
            self.links = links;
        }
        self.forces = configuration.to_forces();
        self.set_velocity_decay(configuration.velocity_decay);
        self.configuration = configuration;
        debug!(
            forces = ?self.forces.keys().collect::<Vec<_>>(),
            velocity_decay = self.velocity_decay,
            "applied force configuration"
        );
        self.initialize_forces();
        self
    }

    pub fn apply_preset(&mut self, preset: Preset) -> &mut Self {
        debug!(%preset, "applying preset");
        self.apply_configuration(preset.configuration(), None)
    }

    /// Last configuration applied as a whole. Forces registered one by one
    /// through [`set_force`](Self::set_force) are not reflected here.
    pub fn configuration(&self) -> &ForceConfiguration {
        &self.configuration
    }

    /// Register a force under `name`, replacing and returning any previous one
    pub fn set_force(&mut self, name: impl Into<String>, force: impl Into<Force>) -> Option<Force> {
        let mut force = force.into();
        force.initialize(&mut ForceSetup {
            nodes: &self.nodes,
            links: &self.links,
            dimensions: self.dimensions,
            random: self.random.as_mut(),
        });
        let name = name.into();
        debug!(name = %name, kind = force.kind(), "registered force");
        self.forces.insert(name, force)
    }

    pub fn remove_force(&mut self, name: &str) -> Option<Force> {
        let removed = self.forces.shift_remove(name);
        if removed.is_some() {
            debug!(name, "removed force");
        }
        removed
    }

    pub fn force(&self, name: &str) -> Option<&Force> {
        self.forces.get(name)
    }

    /// Names of the active forces in registration order
    pub fn force_names(&self) -> impl Iterator<Item = &str> {
        self.forces.keys().map(String::as_str)
    }

    fn initialize_forces(&mut self) {
        let mut setup = ForceSetup {
            nodes: &self.nodes,
            links: &self.links,
            dimensions: self.dimensions,
            random: self.random.as_mut(),
        };
        for force in self.forces.values_mut() {
            force.initialize(&mut setup);
        }
    }

    /// Run `iterations` ticks synchronously, regardless of running state
    pub fn tick(&mut self, iterations: usize) -> &mut Self {
        for _ in 0..iterations {
            // Listener breaks stop scheduled runs only, never a direct tick.
            let _ = self.step();
        }
        self
    }

    pub fn tick_once(&mut self) -> &mut Self {
        self.tick(1)
    }

    /// One tick. Breaks when a listener asked to stop.
    fn step(&mut self) -> ControlFlow<()> {
        let started = self.clock.now();

        let needs_tree = self.forces.values().any(|f| f.needs_spatial_index());
        if needs_tree {
            self.tree.rebuild(&self.nodes, self.dimensions);
        }
        let mut ctx = ForceContext {
            alpha: self.alpha,
            nodes: &mut self.nodes,
            tree: needs_tree.then_some(&self.tree),
            dimensions: self.dimensions,
            random: self.random.as_mut(),
        };
        for force in self.forces.values_mut() {
            force.apply(&mut ctx);
        }

        let axes = self.dimensions.count();
        for node in &mut self.nodes {
            for a in 0..axes {
                match node.fixed(a) {
                    Some(fixed) => {
                        set_axis(node, a, fixed);
                        set_velocity(node, a, 0.0);
                    }
                    None => {
                        let v = node.velocity(a);
                        let moved = node.coord(a) + v;
                        set_axis(node, a, moved);
                        set_velocity(node, a, v * self.velocity_decay);
                    }
                }
            }
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        let elapsed = self.clock.now().saturating_sub(started);
        self.metrics.ticks += 1;
        self.metrics.total_compute += elapsed;
        self.metrics.last_tick = elapsed;
        trace!(tick = self.metrics.ticks, alpha = self.alpha, ?elapsed, "tick");

        emit(
            &mut self.listeners,
            &SimulationEvent {
                kind: EventKind::Tick,
                alpha: self.alpha,
                nodes: &self.nodes,
            },
        )
    }

    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    /// Schedule repeating ticks. No-op while already running.
    pub fn start(&mut self) -> &mut Self {
        if self.frame.is_none() {
            self.frame = Some(self.scheduler.request_frame());
            debug!(alpha = self.alpha, "simulation started");
        }
        self
    }

    /// Cancel the pending frame
    pub fn stop(&mut self) -> &mut Self {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
            debug!(alpha = self.alpha, "simulation stopped");
        }
        self
    }

    /// Raise alpha back to 1 and start
    pub fn restart(&mut self) -> &mut Self {
        self.alpha = DEFAULT_ALPHA;
        self.start()
    }

    /// Raise alpha to at least `alpha` and start
    pub fn reheat(&mut self, alpha: f64) -> &mut Self {
        if alpha.is_nan() {
            warn!("ignoring NaN reheat alpha");
        } else {
            self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        }
        self.start()
    }

    /// Run the scheduled frame if it is due
    pub fn advance_frame(&mut self) -> FrameOutcome {
        let Some(handle) = self.frame else {
            return FrameOutcome::Stopped;
        };
        if !self.scheduler.is_due(handle) {
            return FrameOutcome::Pending;
        }
        self.frame = None;

        let flow = self.step();

        if self.alpha < self.alpha_min {
            debug!(
                alpha = self.alpha,
                ticks = self.metrics.ticks,
                "simulation cooled down"
            );
            // The run is over either way
            let _ = emit(
                &mut self.listeners,
                &SimulationEvent {
                    kind: EventKind::End,
                    alpha: self.alpha,
                    nodes: &self.nodes,
                },
            );
            return FrameOutcome::Ended;
        }

        if flow.is_break() {
            debug!(alpha = self.alpha, "listener stopped the simulation");
        } else {
            self.frame = Some(self.scheduler.request_frame());
        }
        FrameOutcome::Ticked
    }

    /// Start and drive frames until the run ends, is stopped, or
    /// `max_frames` ticks have run. Returns the number of ticks run.
    pub fn run_to_convergence(&mut self, max_frames: usize) -> usize {
        self.start();
        let mut frames = 0;
        while frames < max_frames {
            match self.advance_frame() {
                FrameOutcome::Ticked => frames += 1,
                FrameOutcome::Ended => return frames + 1,
                FrameOutcome::Stopped => return frames,
                FrameOutcome::Pending => std::thread::yield_now(),
            }
        }
        self.stop();
        frames
    }

    /// Nearest placed node to `point`, within `radius` when given
    pub fn find(&self, point: Point, radius: Option<f64>) -> Option<&SimulationNode> {
        let axes = self.dimensions.count();
        let mut best = radius.map_or(f64::INFINITY, |r| r * r);
        let mut found = None;
        for node in &self.nodes {
            if !node.has_position(self.dimensions) {
                continue;
            }
            let d2: f64 = (0..axes)
                .map(|a| (node.coord(a) - point.axis(a)).powi(2))
                .sum();
            if d2 < best {
                best = d2;
                found = Some(node);
            }
        }
        found
    }

    /// Fix a node at `point`. Returns false when no node has that id.
    pub fn pin(&mut self, id: &str, point: Point) -> bool {
        let three_d = self.dimensions.is_3d();
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.fx = Some(point.x);
        node.fy = Some(point.y);
        node.x = point.x;
        node.y = point.y;
        node.vx = 0.0;
        node.vy = 0.0;
        if three_d {
            node.fz = Some(point.z);
            node.z = point.z;
            node.vz = 0.0;
        }
        true
    }

    /// Release a pinned node. Returns false when no node has that id.
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.fx = None;
        node.fy = None;
        node.fz = None;
        true
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_min(&self) -> f64 {
        self.alpha_min
    }

    pub fn alpha_decay(&self) -> f64 {
        self.alpha_decay
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn velocity_decay(&self) -> f64 {
        self.velocity_decay
    }

    pub fn set_alpha(&mut self, alpha: f64) -> &mut Self {
        if let Some(v) = unit_interval("alpha", alpha) {
            self.alpha = v;
        }
        self
    }

    pub fn set_alpha_min(&mut self, alpha_min: f64) -> &mut Self {
        if alpha_min.is_nan() {
            warn!("ignoring NaN alpha_min");
        } else {
            self.alpha_min = alpha_min.max(0.0);
        }
        self
    }

    pub fn set_alpha_decay(&mut self, alpha_decay: f64) -> &mut Self {
        if let Some(v) = unit_interval("alpha_decay", alpha_decay) {
            self.alpha_decay = v;
        }
        self
    }

    pub fn set_alpha_target(&mut self, alpha_target: f64) -> &mut Self {
        if let Some(v) = unit_interval("alpha_target", alpha_target) {
            self.alpha_target = v;
        }
        self
    }

    pub fn set_velocity_decay(&mut self, velocity_decay: f64) -> &mut Self {
        if let Some(v) = unit_interval("velocity_decay", velocity_decay) {
            self.velocity_decay = v;
        }
        self
    }

    pub fn metrics(&self) -> SimulationMetrics {
        self.metrics
    }

    /// Register an event listener. Returning `Break` stops a scheduled run
    /// before its next frame.
    pub fn on(
        &mut self,
        listener: impl FnMut(&SimulationEvent<'_>) -> ControlFlow<()> + 'static,
    ) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns false for unknown ids.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }
}

/// Call every listener; breaks if any of them did
fn emit(listeners: &mut [(ListenerId, Listener)], event: &SimulationEvent<'_>) -> ControlFlow<()> {
    let mut flow = ControlFlow::Continue(());
    for (_, listener) in listeners.iter_mut() {
        if listener(event).is_break() {
            flow = ControlFlow::Break(());
        }
    }
    flow
}

fn unit_interval(name: &str, value: f64) -> Option<f64> {
    if value.is_nan() {
        warn!(setter = name, "ignoring NaN");
        return None;
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!(setter = name, value, clamped, "clamped to [0, 1]");
    }
    Some(clamped)
}

/// Uniform sample in the disc (2D) or ball (3D) of the given radius
fn scatter_point(random: &mut dyn RandomSource, radius: f64, dimensions: Dimensions) -> [f64; 3] {
    match dimensions {
        Dimensions::Two => {
            let r = radius * random.next_f64().sqrt();
            let theta = 2.0 * PI * random.next_f64();
            [r * theta.cos(), r * theta.sin(), 0.0]
        }
        Dimensions::Three => {
            let r = radius * random.next_f64().cbrt();
            let theta = 2.0 * PI * random.next_f64();
            let cos_phi = 2.0 * random.next_f64() - 1.0;
            let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
            [
                r * sin_phi * theta.cos(),
                r * sin_phi * theta.sin(),
                r * cos_phi,
            ]
        }
    }
}

fn set_axis(node: &mut SimulationNode, axis: usize, value: f64) {
    match axis {
        0 => node.x = value,
        1 => node.y = value,
        _ => node.z = value,
    }
}

fn set_velocity(node: &mut SimulationNode, axis: usize, value: f64) {
    match axis {
        0 => node.vx = value,
        1 => node.vy = value,
        _ => node.vz = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceConfigurationBuilder;
    use crate::forces::{LinkForce, ManyBodyForce};
    use crate::scheduler::SteppingClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn placed(id: &str, x: f64, y: f64) -> SimulationNode {
        SimulationNode::new(id).with_position(x, y)
    }

    fn bare() -> Simulation {
        let mut sim = Simulation::new(Dimensions::Two);
        for name in sim.force_names().map(str::to_string).collect::<Vec<_>>() {
            sim.remove_force(&name);
        }
        sim
    }

    #[test]
    fn default_schedule() {
        let sim = Simulation::default();
        assert_eq!(sim.alpha(), 1.0);
        assert_eq!(sim.alpha_min(), 0.001);
        assert_eq!(sim.alpha_target(), 0.0);
        assert_eq!(sim.velocity_decay(), 0.6);
        assert!((sim.alpha_decay() - 0.022_762_7).abs() < 1e-6);
        assert!(!sim.is_running());
    }

    #[test]
    fn unplaced_nodes_are_scattered_within_radius() {
        let nodes = (0..24).map(|i| SimulationNode::new(format!("n{i}"))).collect();
        let sim = Simulation::default().with_nodes(nodes);
        let limit = 25f64.sqrt() * 10.0;

        for (i, node) in sim.nodes().iter().enumerate() {
            assert_eq!(node.index, i);
            assert!(node.has_position(Dimensions::Two));
            assert!((node.x * node.x + node.y * node.y).sqrt() <= limit);
        }
    }

    #[test]
    fn ball_placement_in_3d() {
        let nodes = (0..15).map(|i| SimulationNode::new(format!("n{i}"))).collect();
        let sim = Simulation::new(Dimensions::Three).with_nodes(nodes);
        let limit = 16f64.sqrt() * 10.0;

        assert!(sim.nodes().iter().any(|n| n.z != 0.0));
        for node in sim.nodes() {
            assert!(node.has_position(Dimensions::Three));
            let r = (node.x.powi(2) + node.y.powi(2) + node.z.powi(2)).sqrt();
            assert!(r <= limit);
        }
    }

    #[test]
    fn placement_is_seeded() {
        let make = |seed| {
            let nodes = (0..5).map(|i| SimulationNode::new(format!("n{i}"))).collect();
            Simulation::default()
                .with_random(seeded(seed))
                .with_nodes(nodes)
                .nodes()
                .to_vec()
        };
        assert_eq!(make(7), make(7));
        assert_ne!(make(7), make(8));
    }

    #[test]
    fn prior_state_and_fixed_coordinates_are_kept() {
        let mut fixed = SimulationNode::new("fixed");
        fixed.fx = Some(3.0);
        let moving = placed("moving", 1.0, 2.0).with_velocity(f64::NAN, 0.5, 0.0);

        let sim = Simulation::default().with_nodes(vec![fixed, moving]);

        assert_eq!(sim.nodes()[0].x, 3.0);
        assert!(sim.nodes()[0].y.is_finite());
        assert_eq!((sim.nodes()[1].x, sim.nodes()[1].y), (1.0, 2.0));
        assert_eq!((sim.nodes()[1].vx, sim.nodes()[1].vy), (0.0, 0.5));
    }

    #[test]
    fn integration_keeps_decayed_velocity() {
        let mut sim = bare().with_nodes(vec![placed("a", 0.0, 0.0).with_velocity(10.0, 0.0, 0.0)]);
        sim.tick_once();

        let node = &sim.nodes()[0];
        assert_eq!(node.x, 10.0);
        assert!((node.vx - 6.0).abs() < 1e-12);
    }

    #[test]
    fn alpha_decreases_toward_target() {
        let mut sim = Simulation::default().with_nodes(vec![placed("a", 0.0, 0.0)]);
        let mut previous = sim.alpha();
        for _ in 0..50 {
            sim.tick_once();
            assert!(sim.alpha() < previous);
            previous = sim.alpha();
        }

        sim.set_alpha_target(0.5).set_alpha(0.2);
        sim.tick_once();
        assert!(sim.alpha() > 0.2 && sim.alpha() < 0.5);
    }

    #[test]
    fn tick_n_matches_sequential_ticks() {
        let graph = || {
            let nodes = (0..12).map(|i| SimulationNode::new(format!("n{i}"))).collect();
            let links = (1..12)
                .map(|i| SimulationLink::new(format!("n{}", i / 2), format!("n{i}")))
                .collect();
            Simulation::default().with_nodes(nodes).with_links(links)
        };
        let mut batched = graph();
        let mut stepped = graph();

        batched.tick(25);
        for _ in 0..25 {
            stepped.tick_once();
        }

        assert_eq!(batched.nodes(), stepped.nodes());
        assert_eq!(batched.alpha(), stepped.alpha());
    }

    #[test]
    fn fixed_node_stays_put_under_repulsion() {
        let mut fixed = placed("fixed", 0.0, 0.0);
        fixed.fx = Some(0.0);
        fixed.fy = Some(0.0);
        let mut sim = bare().with_nodes(vec![fixed, placed("free", 10.0, 0.0)]);
        sim.set_force("charge", ManyBodyForce::new(-100.0));

        sim.tick_once();

        let (f, free) = (&sim.nodes()[0], &sim.nodes()[1]);
        assert_eq!((f.x, f.y, f.vx, f.vy), (0.0, 0.0, 0.0, 0.0));
        assert!(free.x > 10.0);
    }

    #[test]
    fn linked_pair_settles_at_rest_length() {
        let mut sim = bare().with_nodes(vec![placed("a", 0.0, 0.0), placed("b", 200.0, 0.0)]);
        sim.set_links(vec![SimulationLink::new("a", "b").with_distance(100.0)]);
        sim.set_force("link", LinkForce::default());

        sim.tick(50);

        let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
        let distance = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        assert!((distance - 100.0).abs() < 1.0, "distance {distance}");
    }

    #[test]
    fn dangling_link_is_harmless() {
        let mut sim = Simulation::default()
            .with_nodes(vec![placed("a", 0.0, 0.0), placed("b", 30.0, 0.0)])
            .with_links(vec![SimulationLink::new("a", "ghost")]);
        sim.tick(10);
        assert_eq!(sim.nodes().len(), 2);
        assert!(sim.nodes().iter().all(|n| n.has_position(Dimensions::Two)));
    }

    #[test]
    fn disabled_forces_are_removed() {
        let mut sim = Simulation::default();
        let config = ForceConfigurationBuilder::new()
            .disable_charge()
            .disable_link()
            .build();
        sim.apply_configuration(config.clone(), None);

        assert_eq!(sim.force_names().collect::<Vec<_>>(), vec!["center"]);
        assert!(sim.force("charge").is_none());
        assert_eq!(sim.configuration(), &config);
    }

    #[test]
    fn preset_sets_velocity_decay() {
        let mut sim = Simulation::default();
        sim.apply_preset(Preset::Dense);
        assert_eq!(sim.velocity_decay(), 0.5);
        assert!(sim.force("collide").is_some());
    }

    #[test]
    fn scheduled_run_ends_once() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&events);
        let mut sim = Simulation::default().with_nodes(vec![placed("a", 0.0, 0.0)]);
        sim.on(move |event| {
            seen.borrow_mut().push(event.kind);
            ControlFlow::Continue(())
        });

        let frames = sim.run_to_convergence(10_000);

        let events = events.borrow();
        let ends = events.iter().filter(|k| **k == EventKind::End).count();
        assert_eq!(ends, 1);
        assert_eq!(events.last(), Some(&EventKind::End));
        assert_eq!(events.len(), frames + 1);
        assert!((295..=305).contains(&frames), "frames {frames}");
        assert!(sim.alpha() < sim.alpha_min());
        assert!(!sim.is_running());
        assert_eq!(sim.advance_frame(), FrameOutcome::Stopped);
    }

    #[test]
    fn listener_can_stop_the_run() {
        let mut sim = Simulation::default().with_nodes(vec![placed("a", 0.0, 0.0)]);
        let mut ticks = 0;
        sim.on(move |_| {
            ticks += 1;
            if ticks == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(sim.run_to_convergence(100), 3);
        assert!(!sim.is_running());
        assert_eq!(sim.metrics().ticks, 3);
    }

    #[test]
    fn direct_ticks_run_past_a_listener_break() {
        let mut sim = Simulation::default().with_nodes(vec![placed("a", 0.0, 0.0)]);
        sim.on(|_| ControlFlow::Break(()));

        sim.tick(5);
        assert_eq!(sim.metrics().ticks, 5);
        assert!(!sim.is_running());
    }

    #[test]
    fn off_unregisters() {
        let count = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&count);
        let mut sim = Simulation::default();
        let id = sim.on(move |_| {
            *seen.borrow_mut() += 1;
            ControlFlow::Continue(())
        });
        sim.tick(2);
        assert!(sim.off(id));
        assert!(!sim.off(id));
        sim.tick(2);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn start_is_idempotent_and_stop_cancels() {
        let mut sim = Simulation::default();
        sim.start().start();
        assert!(sim.is_running());
        assert_eq!(sim.advance_frame(), FrameOutcome::Ticked);
        assert_eq!(sim.metrics().ticks, 1);

        sim.stop();
        assert_eq!(sim.advance_frame(), FrameOutcome::Stopped);
        assert_eq!(sim.metrics().ticks, 1);
    }

    #[test]
    fn restart_and_reheat() {
        let mut sim = Simulation::default();
        sim.run_to_convergence(10_000);

        sim.reheat(DEFAULT_REHEAT_ALPHA);
        assert_eq!(sim.alpha(), 0.3);
        assert!(sim.is_running());

        sim.set_alpha(0.5).reheat(0.1);
        assert_eq!(sim.alpha(), 0.5);

        sim.stop().restart();
        assert_eq!(sim.alpha(), 1.0);
        assert!(sim.is_running());
    }

    #[test]
    fn setters_clamp_and_ignore_nan() {
        let mut sim = Simulation::default();
        sim.set_alpha(2.0)
            .set_alpha_decay(-1.0)
            .set_velocity_decay(f64::NAN)
            .set_alpha_min(-0.5);
        assert_eq!(sim.alpha(), 1.0);
        assert_eq!(sim.alpha_decay(), 0.0);
        assert_eq!(sim.velocity_decay(), 0.6);
        assert_eq!(sim.alpha_min(), 0.0);

        sim.set_alpha_min(5.0);
        assert_eq!(sim.alpha_min(), 5.0);
    }

    #[test]
    fn find_nearest_within_radius() {
        let sim = Simulation::default().with_nodes(vec![
            placed("a", 0.0, 0.0),
            placed("b", 10.0, 0.0),
            placed("c", 0.0, 50.0),
        ]);

        assert_eq!(sim.find(Point::new_2d(8.0, 1.0), None).map(|n| n.id.as_str()), Some("b"));
        assert_eq!(sim.find(Point::new_2d(0.0, 30.0), Some(5.0)), None);
        assert_eq!(
            sim.find(Point::new_2d(0.0, 30.0), Some(25.0)).map(|n| n.id.as_str()),
            Some("c")
        );
    }

    #[test]
    fn pin_and_unpin() {
        let mut sim = Simulation::default().with_nodes(vec![placed("a", 0.0, 0.0), placed("b", 5.0, 0.0)]);
        assert!(sim.pin("a", Point::new_2d(40.0, -20.0)));
        assert!(!sim.pin("ghost", Point::default()));

        sim.tick(5);
        let a = sim.node("a").unwrap();
        assert_eq!((a.x, a.y), (40.0, -20.0));

        assert!(sim.unpin("a"));
        sim.tick(5);
        assert!(!sim.node("a").unwrap().is_fixed());
        assert_ne!(sim.node("a").unwrap().position(), Point::new_2d(40.0, -20.0));
    }

    #[test]
    fn metrics_accumulate() {
        let mut sim = Simulation::default().with_clock(SteppingClock::new(Duration::from_millis(1)));
        sim.tick(4);

        let metrics = sim.metrics();
        assert_eq!(metrics.ticks, 4);
        assert_eq!(metrics.total_compute, Duration::from_millis(4));
        assert_eq!(metrics.mean_tick(), Duration::from_millis(1));
        assert_eq!(SimulationMetrics::default().mean_tick(), Duration::ZERO);
    }

    #[test]
    fn set_force_replaces_and_remove_force_drops() {
        let mut sim = Simulation::default();
        let previous = sim.set_force("charge", ManyBodyForce::new(-5.0));
        assert!(matches!(previous, Some(Force::ManyBody(_))));
        assert!(sim.remove_force("charge").is_some());
        assert!(sim.remove_force("charge").is_none());
        assert_eq!(sim.force_names().collect::<Vec<_>>(), vec!["center", "link"]);
    }
}
