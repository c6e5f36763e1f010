//! Node and requirement records.

use std::fmt;

use serde::Serialize;

use crate::value::{PropertyMap, PropertyValue, Scalar};

const VDU_TYPE_PREFIX: &str = "tosca.nodes.nfv.VDU";
const CP_TYPE_PREFIX: &str = "tosca.nodes.nfv.CP";
const VL_TYPE_PREFIX: &str = "tosca.nodes.nfv.VL";

/// Closed set of node kinds understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// Virtual Deployment Unit, one virtual machine
    Vdu,
    /// Connection Point, a network interface attachment
    Cp,
    /// Virtual Link, a logical network
    Vl,
    Unknown,
}

impl NodeKind {
    /// Classify a TOSCA type string.
    ///
    /// Vendor-specific refinements such as `tosca.nodes.nfv.VDU.Tacker`
    /// classify the same as their base type.
    pub fn classify(type_name: &str) -> Self {
        let matches_base = |prefix: &str| {
            type_name == prefix
                || type_name
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        };

        if matches_base(VDU_TYPE_PREFIX) {
            NodeKind::Vdu
        } else if matches_base(CP_TYPE_PREFIX) {
            NodeKind::Cp
        } else if matches_base(VL_TYPE_PREFIX) {
            NodeKind::Vl
        } else {
            NodeKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Vdu => "VDU",
            NodeKind::Cp => "CP",
            NodeKind::Vl => "VL",
            NodeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node's declared type: the classified kind plus the raw type string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeType {
    pub kind: NodeKind,
    pub raw: String,
}

impl NodeType {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            kind: NodeKind::classify(&raw),
            raw,
        }
    }
}

/// Kind of a requirement entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum RequirementKind {
    VirtualLink,
    VirtualBinding,
    Other(String),
}

impl RequirementKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "virtualLink" => RequirementKind::VirtualLink,
            "virtualBinding" => RequirementKind::VirtualBinding,
            other => RequirementKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequirementKind::VirtualLink => "virtualLink",
            RequirementKind::VirtualBinding => "virtualBinding",
            RequirementKind::Other(name) => name,
        }
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequirementKind> for String {
    fn from(kind: RequirementKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A reference from the owning node to `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub target: String,
    /// Position in the owning node's `requirements` list
    pub index: usize,
}

/// A node template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    pub node_type: NodeType,
    pub properties: PropertyMap,
    #[serde(skip_serializing_if = "PropertyMap::is_empty")]
    pub capabilities: PropertyMap,
    pub requirements: Vec<Requirement>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.node_type.kind
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Management driver named by the node, if any
    pub fn mgmt_driver(&self) -> Option<&str> {
        self.property("mgmt_driver")
            .and_then(PropertyValue::as_scalar)
            .and_then(Scalar::as_str)
    }

    pub fn requirements_of_kind<'a>(
        &'a self,
        kind: &'a RequirementKind,
    ) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.requirements.iter().filter(move |r| &r.kind == kind)
    }
}
