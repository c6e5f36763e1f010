//! Directed graph view of a topology.
//!
//! Vertices are node names, edges point from the node declaring a
//! requirement to the node it references (`CP1 -> VL1`, `CP1 -> VDU1`).
//! Uses petgraph for traversal and ordering.

use std::collections::HashMap;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

use crate::node::RequirementKind;
use crate::topology::Topology;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Requirement links form a cycle through node '{0}'")]
    Cycle(String),
}

/// Requirement graph built from a [`Topology`]
#[derive(Debug)]
pub struct TopologyGraph {
    graph: DiGraph<String, RequirementKind>,
    node_map: HashMap<String, NodeIndex>,
}

impl TopologyGraph {
    /// Builds the graph; nodes are added in source order
    pub fn from_topology(topology: &Topology) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for node in topology.nodes() {
            let idx = graph.add_node(node.name.clone());
            node_map.insert(node.name.clone(), idx);
        }

        for edge in topology.edges() {
            let source = node_map[edge.source];
            let target = node_map[edge.target];
            graph.add_edge(source, target, edge.kind.clone());
        }

        Self { graph, node_map }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes referenced by `name`'s requirements
    pub fn neighbors(&self, name: &str) -> Vec<String> {
        self.adjacent(name, Direction::Outgoing)
    }

    /// Nodes whose requirements reference `name`
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.adjacent(name, Direction::Incoming)
    }

    fn adjacent(&self, name: &str, direction: Direction) -> Vec<String> {
        let idx = match self.node_map.get(name) {
            Some(idx) => *idx,
            None => return vec![],
        };

        // petgraph walks the adjacency list newest-first
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|i| self.graph.node_weight(i).cloned())
            .collect();
        names.reverse();
        names
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Node names ordered so every requirement target precedes its source
    pub fn deployment_order(&self) -> Result<Vec<String>, GraphError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let name = self
                .graph
                .node_weight(cycle.node_id())
                .cloned()
                .unwrap_or_default();
            GraphError::Cycle(name)
        })?;

        Ok(order
            .into_iter()
            .rev()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse;

    const TEMPLATE: &str = r#"
tosca_definitions_version: tosca_simple_profile_for_nfv_1_0_0
topology_template:
  node_templates:
    VDU1:
      type: tosca.nodes.nfv.VDU.Tacker
    CP1:
      type: tosca.nodes.nfv.CP.Tacker
      requirements:
        - virtualLink:
            node: VL1
        - virtualBinding:
            node: VDU1
    CP2:
      type: tosca.nodes.nfv.CP.Tacker
      requirements:
        - virtualLink:
            node: VL1
        - virtualBinding:
            node: VDU1
    VL1:
      type: tosca.nodes.nfv.VL
"#;

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_graph_shape() {
        let topology = parse(TEMPLATE).unwrap();
        let graph = TopologyGraph::from_topology(&topology);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.neighbors("CP1"), vec!["VL1", "VDU1"]);
        assert_eq!(graph.dependents("VDU1"), vec!["CP1", "CP2"]);
        assert!(graph.neighbors("nope").is_empty());
        assert!(graph.is_acyclic());
    }

    #[test]
    fn test_deployment_order_puts_targets_first() {
        let topology = parse(TEMPLATE).unwrap();
        let order = TopologyGraph::from_topology(&topology)
            .deployment_order()
            .unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, "VL1") < position(&order, "CP1"));
        assert!(position(&order, "VDU1") < position(&order, "CP1"));
        assert!(position(&order, "VDU1") < position(&order, "CP2"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let yaml = r#"
topology_template:
  node_templates:
    A:
      type: tosca.nodes.nfv.VDU
      requirements:
        - dependency: B
    B:
      type: tosca.nodes.nfv.CP
      requirements:
        - virtualBinding: A
"#;
        let topology = parse(yaml).unwrap();
        let graph = TopologyGraph::from_topology(&topology);
        assert!(!graph.is_acyclic());
        assert!(matches!(graph.deployment_order(), Err(GraphError::Cycle(_))));
    }
}
