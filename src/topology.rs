//! The loaded topology: nodes in source order plus policies and header data.
//!
//! A [`Topology`] is only ever produced by the loader and is immutable
//! afterwards; every accessor hands out shared references.

use std::collections::HashMap;

use serde::Serialize;

use crate::node::{Node, NodeKind, RequirementKind};
use crate::value::{PropertyMap, PropertyValue};

/// Descriptive fields from the top of the template
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateHeader {
    pub definitions_version: Option<String>,
    pub description: Option<String>,
    pub template_name: Option<String>,
}

/// An entry of `topology_template.policies`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    pub name: String,
    pub policy_type: String,
    pub properties: PropertyMap,
    pub targets: Vec<String>,
}

/// A resolved requirement link from `source` to `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: &'a RequirementKind,
    /// Position of the requirement in the source node's list
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    header: TemplateHeader,
    nodes: Vec<Node>,
    policies: Vec<Policy>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Topology {
    pub(crate) fn new(header: TemplateHeader, nodes: Vec<Node>, policies: Vec<Policy>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name.clone(), i))
            .collect();
        Self {
            header,
            nodes,
            policies,
            index,
        }
    }

    pub fn header(&self) -> &TemplateHeader {
        &self.header
    }

    /// Nodes in the order they appear in `node_templates`
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.name == name)
    }

    /// Requirement links whose target is defined, in source order
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        self.nodes.iter().flat_map(move |node| {
            node.requirements
                .iter()
                .filter(move |req| self.contains(&req.target))
                .map(move |req| Edge {
                    source: &node.name,
                    target: &req.target,
                    kind: &req.kind,
                    index: req.index,
                })
        })
    }

    /// The node a connection point binds to through `virtualBinding`
    pub fn binding_of(&self, cp: &str) -> Option<&Node> {
        self.targets_of(cp, &RequirementKind::VirtualBinding)
            .into_iter()
            .next()
    }

    /// The virtual links a connection point attaches to
    pub fn links_of(&self, cp: &str) -> Vec<&Node> {
        self.targets_of(cp, &RequirementKind::VirtualLink)
    }

    /// Connection points bound to `vdu`, in source order
    pub fn connection_points_of(&self, vdu: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| {
                n.requirements_of_kind(&RequirementKind::VirtualBinding)
                    .any(|r| r.target == vdu)
            })
            .collect()
    }

    /// Nodes carrying a `monitoring_policy` property, with the raw policy
    pub fn monitoring_policies(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.nodes.iter().filter_map(|n| {
            n.property("monitoring_policy")
                .map(|policy| (n.name.as_str(), policy))
        })
    }

    fn targets_of(&self, source: &str, kind: &RequirementKind) -> Vec<&Node> {
        self.node(source)
            .map(|n| {
                n.requirements_of_kind(kind)
                    .filter_map(|r| self.node(&r.target))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeType, Requirement};

    fn node(name: &str, type_name: &str, reqs: &[(RequirementKind, &str)]) -> Node {
        Node {
            name: name.to_string(),
            node_type: NodeType::new(type_name),
            properties: PropertyMap::new(),
            capabilities: PropertyMap::new(),
            requirements: reqs
                .iter()
                .enumerate()
                .map(|(index, (kind, target))| Requirement {
                    kind: kind.clone(),
                    target: target.to_string(),
                    index,
                })
                .collect(),
        }
    }

    fn sample() -> Topology {
        Topology::new(
            TemplateHeader::default(),
            vec![
                node("VDU1", "tosca.nodes.nfv.VDU.Tacker", &[]),
                node(
                    "CP1",
                    "tosca.nodes.nfv.CP.Tacker",
                    &[
                        (RequirementKind::VirtualLink, "VL1"),
                        (RequirementKind::VirtualBinding, "VDU1"),
                    ],
                ),
                node(
                    "CP2",
                    "tosca.nodes.nfv.CP.Tacker",
                    &[
                        (RequirementKind::VirtualLink, "VL2"),
                        (RequirementKind::VirtualBinding, "VDU1"),
                    ],
                ),
                node("VL1", "tosca.nodes.nfv.VL", &[]),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_lookup_and_order() {
        let topology = sample();
        assert_eq!(topology.len(), 4);
        let names: Vec<_> = topology.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["VDU1", "CP1", "CP2", "VL1"]);
        assert_eq!(topology.node("CP1").unwrap().kind(), NodeKind::Cp);
        assert!(topology.node("VL9").is_none());
        assert_eq!(topology.nodes_of_kind(NodeKind::Cp).count(), 2);
    }

    #[test]
    fn test_edges_skip_undefined_targets() {
        let topology = sample();
        let edges: Vec<_> = topology.edges().collect();
        // CP2 -> VL2 is dangling
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].source, "CP1");
        assert_eq!(edges[0].target, "VL1");
        assert_eq!(edges[0].index, 0);
        assert_eq!(edges[2].source, "CP2");
        assert_eq!(edges[2].target, "VDU1");
        assert_eq!(edges[2].index, 1);
    }

    #[test]
    fn test_binding_queries() {
        let topology = sample();
        assert_eq!(topology.binding_of("CP1").unwrap().name, "VDU1");
        let links: Vec<_> = topology.links_of("CP1").iter().map(|n| n.name.clone()).collect();
        assert_eq!(links, vec!["VL1"]);
        assert!(topology.links_of("CP2").is_empty());
        let cps: Vec<_> = topology
            .connection_points_of("VDU1")
            .iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(cps, vec!["CP1", "CP2"]);
        assert!(topology.binding_of("missing").is_none());
    }
}
