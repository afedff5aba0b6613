//! Graph documents read and written by the CLI
//!
//! Input: `{"nodes": [{"id", "x"?, "y"?, "z"?, "fx"?, "fy"?, "fz"?, "mass"?,
//! "radius"?}], "links": [{"source", "target", "distance"?, "strength"?}]}`.
//! Link endpoints are node ids (strings) or node indices (numbers).
//!
//! Output: `{"alpha", "ticks", "nodes": [{"id", "x", "y", "z"?}]}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LayoutResult;
use crate::io::read_document;
use crate::node::{Dimensions, LinkEndpoint, SimulationLink, SimulationNode};
use crate::simulation::Simulation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNodeSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl From<&GraphNodeSpec> for SimulationNode {
    fn from(spec: &GraphNodeSpec) -> Self {
        let mut node = SimulationNode::new(spec.id.clone());
        node.x = spec.x.unwrap_or(f64::NAN);
        node.y = spec.y.unwrap_or(f64::NAN);
        node.z = spec.z.unwrap_or(f64::NAN);
        node.fx = spec.fx;
        node.fy = spec.fy;
        node.fz = spec.fz;
        if let Some(mass) = spec.mass {
            node = node.with_mass(mass);
        }
        if let Some(radius) = spec.radius {
            node = node.with_radius(radius);
        }
        node
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLinkSpec {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

impl From<&GraphLinkSpec> for SimulationLink {
    fn from(spec: &GraphLinkSpec) -> Self {
        SimulationLink {
            source: spec.source.clone(),
            target: spec.target.clone(),
            distance: spec.distance,
            strength: spec.strength,
        }
    }
}

/// Graph topology with optional prior positions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNodeSpec>,
    #[serde(default)]
    pub links: Vec<GraphLinkSpec>,
}

impl GraphDocument {
    /// Load a graph from a JSON or YAML file
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        read_document(path)
    }

    pub fn simulation_nodes(&self) -> Vec<SimulationNode> {
        self.nodes.iter().map(SimulationNode::from).collect()
    }

    pub fn simulation_links(&self) -> Vec<SimulationLink> {
        self.links.iter().map(SimulationLink::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

/// Final layout written by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOutput {
    pub alpha: f64,
    pub ticks: u64,
    pub nodes: Vec<NodePosition>,
}

impl From<&Simulation> for LayoutOutput {
    fn from(simulation: &Simulation) -> Self {
        let three_d = simulation.dimensions() == Dimensions::Three;
        LayoutOutput {
            alpha: simulation.alpha(),
            ticks: simulation.metrics().ticks,
            nodes: simulation
                .nodes()
                .iter()
                .map(|n| NodePosition {
                    id: n.id.clone(),
                    x: n.x,
                    y: n.y,
                    z: three_d.then_some(n.z),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{
        "nodes": [
            {"id": "hub", "fx": 0, "fy": 0},
            {"id": "a", "x": 10, "y": 5, "mass": 2},
            {"id": "b", "radius": 12}
        ],
        "links": [
            {"source": "hub", "target": "a", "distance": 40},
            {"source": 0, "target": 2, "strength": 0.5}
        ]
    }"#;

    #[test]
    fn parses_nodes_and_links() {
        let graph: GraphDocument = serde_json::from_str(GRAPH).unwrap();
        let nodes = graph.simulation_nodes();
        let links = graph.simulation_links();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].fx, Some(0.0));
        assert!(!nodes[0].has_position(Dimensions::Two));
        assert_eq!((nodes[1].x, nodes[1].y, nodes[1].mass), (10.0, 5.0, 2.0));
        assert_eq!(nodes[2].radius, 12.0);

        assert_eq!(links[0].source, LinkEndpoint::Id("hub".to_string()));
        assert_eq!(links[0].distance, Some(40.0));
        assert_eq!(links[1].target, LinkEndpoint::Index(2));
        assert_eq!(links[1].strength, Some(0.5));
    }

    #[test]
    fn links_are_optional() {
        let graph: GraphDocument = serde_yaml::from_str("nodes:\n  - id: solo\n").unwrap();
        assert!(graph.links.is_empty());
    }

    #[test]
    fn output_omits_z_in_2d() {
        let graph: GraphDocument = serde_json::from_str(GRAPH).unwrap();
        let mut sim = Simulation::default()
            .with_nodes(graph.simulation_nodes())
            .with_links(graph.simulation_links());
        sim.tick(3);

        let output = LayoutOutput::from(&sim);
        assert_eq!(output.ticks, 3);
        assert_eq!(output.nodes[0].x, 0.0);

        let json = serde_json::to_value(&output).unwrap();
        assert!(json["nodes"][1].get("z").is_none());
    }

    #[test]
    fn output_keeps_z_in_3d() {
        let graph: GraphDocument = serde_json::from_str(GRAPH).unwrap();
        let sim = Simulation::new(Dimensions::Three).with_nodes(graph.simulation_nodes());
        let output = LayoutOutput::from(&sim);
        assert!(output.nodes.iter().all(|n| n.z.is_some()));
    }
}
