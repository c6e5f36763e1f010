//! Template loading.
//!
//! Loading runs in three phases over the document text:
//!
//! 1. syntax: the text is parsed into a generic YAML tree
//!    ([`LoaderError::Parse`] on failure);
//! 2. schema: the tree is walked into typed [`Node`] and [`Policy`] records
//!    ([`SchemaError`] on the first structural violation);
//! 3. references: every requirement and policy target is checked against
//!    the defined node names, and *all* dangling references are reported
//!    together.
//!
//! No phase produces a partial [`Topology`].

use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info, warn};
use serde_yaml::{Mapping, Value};

use crate::error::{LoaderError, ReferenceError, ReferenceOrigin, SchemaError};
use crate::node::{Node, NodeKind, NodeType, Requirement, RequirementKind};
use crate::options::LoaderOptions;
use crate::topology::{Policy, TemplateHeader, Topology};
use crate::value::{key_to_string, PropertyMap, PropertyValue};

const TOPOLOGY_TEMPLATE: &str = "topology_template";
const NODE_TEMPLATES: &str = "node_templates";
const DEFINITIONS_VERSION: &str = "tosca_definitions_version";

/// Parse and fully validate a template with default options
pub fn parse(text: &str) -> Result<Topology, LoaderError> {
    parse_with_options(text, &LoaderOptions::default())
}

/// Parse and fully validate a template
pub fn parse_with_options(text: &str, options: &LoaderOptions) -> Result<Topology, LoaderError> {
    let topology = parse_unvalidated(text, options)?;

    let errors = validate_references(&topology);
    if !errors.is_empty() {
        return Err(LoaderError::Reference(errors));
    }

    info!(
        "Loaded topology with {} nodes and {} requirement links",
        topology.len(),
        topology.edges().count()
    );
    Ok(topology)
}

/// Run the syntax and schema phases only.
///
/// The returned topology may still contain requirements naming undefined
/// nodes; pass it to [`validate_references`] to list them.
pub fn parse_unvalidated(text: &str, options: &LoaderOptions) -> Result<Topology, LoaderError> {
    let document: Value = serde_yaml::from_str(text)?;
    let root = document.as_mapping().ok_or(SchemaError::NotAMapping)?;

    let header = read_header(root, options)?;

    let topology_template = required_mapping(root, TOPOLOGY_TEMPLATE, TOPOLOGY_TEMPLATE)?;
    let node_templates = required_mapping(topology_template, NODE_TEMPLATES, NODE_TEMPLATES)?;

    let nodes = node_templates
        .iter()
        .map(|(name, definition)| read_node(name, definition, options))
        .collect::<Result<Vec<_>, _>>()?;

    let policies = match topology_template.get("policies") {
        Some(value) => read_policies(value)?,
        None => Vec::new(),
    };

    Ok(Topology::new(header, nodes, policies))
}

/// Collect every reference to an undefined node.
///
/// Requirements are checked in node order, then policy targets in policy
/// order. Returns an empty list when all references resolve.
pub fn validate_references(topology: &Topology) -> Vec<ReferenceError> {
    let mut errors = Vec::new();

    for node in topology.nodes() {
        for req in &node.requirements {
            if !topology.contains(&req.target) {
                errors.push(ReferenceError {
                    origin: ReferenceOrigin::Requirement {
                        node: node.name.clone(),
                        index: req.index,
                        kind: req.kind.clone(),
                    },
                    target: req.target.clone(),
                });
            }
        }
    }

    for policy in topology.policies() {
        for (index, target) in policy.targets.iter().enumerate() {
            if !topology.contains(target) {
                errors.push(ReferenceError {
                    origin: ReferenceOrigin::PolicyTarget {
                        policy: policy.name.clone(),
                        index,
                    },
                    target: target.clone(),
                });
            }
        }
    }

    for err in &errors {
        warn!("{}", err);
    }

    errors
}

/// Read a template file from disk and load it
pub fn load_template(path: &Path, options: &LoaderOptions) -> Result<Topology> {
    info!("Loading template from: {:?}", path);

    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read template '{}'", path.display()))?;

    let topology = parse_with_options(&text, options)
        .wrap_err_with(|| format!("Failed to load template '{}'", path.display()))?;

    Ok(topology)
}

fn read_header(root: &Mapping, options: &LoaderOptions) -> Result<TemplateHeader, SchemaError> {
    let definitions_version = root.get(DEFINITIONS_VERSION).and_then(scalar_string);
    if definitions_version.is_none() {
        if options.require_definitions_version {
            return Err(SchemaError::MissingSection(DEFINITIONS_VERSION.to_string()));
        }
        warn!(
            "Template has no {}; legacy templates are deprecated",
            DEFINITIONS_VERSION
        );
    }

    let template_name = root
        .get("metadata")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("template_name"))
        .and_then(scalar_string);

    Ok(TemplateHeader {
        definitions_version,
        description: root.get("description").and_then(scalar_string),
        template_name,
    })
}

fn required_mapping<'a>(
    parent: &'a Mapping,
    key: &str,
    section: &str,
) -> Result<&'a Mapping, SchemaError> {
    let value = parent
        .get(key)
        .ok_or_else(|| SchemaError::MissingSection(section.to_string()))?;
    value.as_mapping().ok_or_else(|| SchemaError::InvalidSection {
        section: section.to_string(),
        expected: "mapping",
    })
}

/// Optional mapping-valued field; absent or empty (`key:`) reads as empty
fn optional_map(
    definition: &Mapping,
    key: &str,
    section: impl FnOnce() -> String,
) -> Result<PropertyMap, SchemaError> {
    match definition.get(key) {
        None | Some(Value::Null) => Ok(PropertyMap::new()),
        Some(value) => PropertyMap::from_yaml(value).ok_or_else(|| SchemaError::InvalidSection {
            section: section(),
            expected: "mapping",
        }),
    }
}

fn read_node(name: &Value, definition: &Value, options: &LoaderOptions) -> Result<Node, SchemaError> {
    let name = match name {
        Value::String(s) => s.clone(),
        other => return Err(SchemaError::InvalidNodeName(key_to_string(other))),
    };

    let definition = definition
        .as_mapping()
        .ok_or_else(|| SchemaError::NodeNotAMapping(name.clone()))?;

    let type_name = definition
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SchemaError::MissingType(name.clone()))?;

    let node_type = NodeType::new(type_name);
    if node_type.kind == NodeKind::Unknown {
        if options.strict_types {
            return Err(SchemaError::UnknownNodeType {
                node: name,
                type_name: node_type.raw,
            });
        }
        warn!("Node '{}' has unrecognised type '{}'", name, node_type.raw);
    }
    debug!("Node '{}' classified as {}", name, node_type.kind);

    let properties = optional_map(definition, "properties", || format!("{}.properties", name))?;
    let capabilities =
        optional_map(definition, "capabilities", || format!("{}.capabilities", name))?;
    let requirements = read_requirements(&name, definition.get("requirements"))?;

    Ok(Node {
        name,
        node_type,
        properties,
        capabilities,
        requirements,
    })
}

fn read_requirements(node: &str, value: Option<&Value>) -> Result<Vec<Requirement>, SchemaError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(entries)) => entries,
        Some(_) => {
            return Err(SchemaError::InvalidSection {
                section: format!("{}.requirements", node),
                expected: "sequence",
            })
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| read_requirement(node, index, entry))
        .collect()
}

fn read_requirement(node: &str, index: usize, entry: &Value) -> Result<Requirement, SchemaError> {
    let malformed = |reason: &str| SchemaError::MalformedRequirement {
        node: node.to_string(),
        index,
        reason: reason.to_string(),
    };

    let (kind, body) = single_entry(entry)
        .ok_or_else(|| malformed("expected a mapping with exactly one requirement name"))?;

    // `virtualLink: VL1` or `virtualLink: { node: VL1 }`
    let target = match body {
        Value::String(target) => target.clone(),
        Value::Mapping(fields) => fields
            .get("node")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| malformed("missing 'node' target"))?,
        _ => return Err(malformed("target must be a node name or a mapping with 'node'")),
    };

    if target.trim().is_empty() {
        return Err(malformed("target node name is empty"));
    }

    Ok(Requirement {
        kind: RequirementKind::from_name(&kind),
        target,
        index,
    })
}

fn read_policies(value: &Value) -> Result<Vec<Policy>, SchemaError> {
    let entries: Vec<(String, &Value)> = match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                single_entry(item).ok_or_else(|| SchemaError::MalformedPolicy {
                    index,
                    reason: "expected a mapping with exactly one policy name".to_string(),
                })
            })
            .collect::<Result<_, _>>()?,
        Value::Mapping(map) => map.iter().map(|(k, v)| (key_to_string(k), v)).collect(),
        _ => {
            return Err(SchemaError::InvalidSection {
                section: "policies".to_string(),
                expected: "sequence",
            })
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, body))| read_policy(index, name, body))
        .collect()
}

fn read_policy(index: usize, name: String, body: &Value) -> Result<Policy, SchemaError> {
    let malformed = |reason: String| SchemaError::MalformedPolicy { index, reason };

    let body = body
        .as_mapping()
        .ok_or_else(|| malformed(format!("policy '{}' is not a mapping", name)))?;

    let policy_type = body
        .get("type")
        .and_then(scalar_string)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| malformed(format!("policy '{}' has no type", name)))?;

    let properties = optional_map(body, "properties", || format!("policies.{}.properties", name))?;

    let targets = match body.get("targets") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|t| {
                t.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| malformed(format!("policy '{}' has a non-string target", name)))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(malformed(format!("policy '{}' targets must be a list", name))),
    };

    Ok(Policy {
        name,
        policy_type,
        properties,
        targets,
    })
}

/// Split a single-key mapping such as `- virtualLink: ...` into its parts
fn single_entry(value: &Value) -> Option<(String, &Value)> {
    let map = value.as_mapping()?;
    if map.len() != 1 {
        return None;
    }
    let (key, body) = map.iter().next()?;
    Some((key.as_str()?.to_string(), body))
}

fn scalar_string(value: &Value) -> Option<String> {
    match PropertyValue::from_yaml(value) {
        PropertyValue::Scalar(scalar) => Some(scalar.to_plain_string()),
        PropertyValue::TextBlock(text) => Some(text),
        _ => None,
    }
}
