//! Error types for template loading.
//!
//! Loading happens in three phases and each phase has its own failure:
//! syntax ([`LoaderError::Parse`]), structural shape ([`SchemaError`]) and
//! dangling cross-references ([`ReferenceError`]).

use std::fmt;

use crate::node::RequirementKind;

/// Top-level error returned by [`crate::loader::parse`]
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Malformed template syntax: {source}")]
    Parse {
        #[from]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{} unresolved reference(s): {}", .0.len(), join_references(.0))]
    Reference(Vec<ReferenceError>),
}

impl LoaderError {
    /// Reference errors carried by this error, empty for other phases
    pub fn reference_errors(&self) -> &[ReferenceError] {
        match self {
            LoaderError::Reference(errors) => errors,
            _ => &[],
        }
    }

    /// Line and column of a syntax error, when the parser reported one
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            LoaderError::Parse { source } => source.location().map(|loc| (loc.line(), loc.column())),
            _ => None,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, LoaderError::Parse { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, LoaderError::Schema(_))
    }
}

fn join_references(errors: &[ReferenceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Structural shape violations found after the document parsed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Template document must be a mapping")]
    NotAMapping,

    #[error("Missing required section: {0}")]
    MissingSection(String),

    #[error("Section '{section}' must be a {expected}")]
    InvalidSection { section: String, expected: &'static str },

    #[error("Node name must be a string, found {0}")]
    InvalidNodeName(String),

    #[error("Definition of node '{0}' is not a mapping")]
    NodeNotAMapping(String),

    #[error("Node '{0}' has a missing or empty type")]
    MissingType(String),

    #[error("Node '{node}' has unknown type '{type_name}'")]
    UnknownNodeType { node: String, type_name: String },

    #[error("Node '{node}' requirement #{index} is malformed: {reason}")]
    MalformedRequirement {
        node: String,
        index: usize,
        reason: String,
    },

    #[error("Policy entry #{index} is malformed: {reason}")]
    MalformedPolicy { index: usize, reason: String },
}

/// Where a dangling reference was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOrigin {
    /// Entry `index` of the `requirements` list of `node`
    Requirement {
        node: String,
        index: usize,
        kind: RequirementKind,
    },
    /// Entry `index` of the `targets` list of policy `policy`
    PolicyTarget { policy: String, index: usize },
}

impl fmt::Display for ReferenceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceOrigin::Requirement { node, index, kind } => {
                write!(f, "node '{}' requirement #{} ({})", node, index, kind)
            }
            ReferenceOrigin::PolicyTarget { policy, index } => {
                write!(f, "policy '{}' target #{}", policy, index)
            }
        }
    }
}

/// A cross-reference naming a node that is not defined in `node_templates`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin} references undefined node '{target}'")]
pub struct ReferenceError {
    pub origin: ReferenceOrigin,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_display_names_target_and_origin() {
        let err = ReferenceError {
            origin: ReferenceOrigin::Requirement {
                node: "CP1".to_string(),
                index: 2,
                kind: RequirementKind::VirtualLink,
            },
            target: "VL9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CP1"));
        assert!(msg.contains("#2"));
        assert!(msg.contains("virtualLink"));
        assert!(msg.contains("VL9"));
    }

    #[test]
    fn test_loader_error_lists_every_reference() {
        let make = |target: &str| ReferenceError {
            origin: ReferenceOrigin::PolicyTarget {
                policy: "SP1".to_string(),
                index: 0,
            },
            target: target.to_string(),
        };
        let err = LoaderError::Reference(vec![make("A"), make("B")]);
        assert_eq!(err.reference_errors().len(), 2);
        let msg = err.to_string();
        assert!(msg.starts_with("2 unresolved"));
        assert!(msg.contains("'A'") && msg.contains("'B'"));
    }

    #[test]
    fn test_parse_error_includes_location() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        let err = LoaderError::from(yaml_err);
        assert!(err.is_parse());
        assert!(err.reference_errors().is_empty());
        assert!(err.to_string().contains("line"));
    }
}
