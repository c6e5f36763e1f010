//! # vnfd-loader - Validating loader for TOSCA NFV descriptors
//!
//! This library turns a TOSCA virtual network function descriptor (VNFD)
//! into an in-memory topology graph that an orchestrator can consume
//! without re-reading the YAML.
//!
//! ## Overview
//!
//! A descriptor declares its nodes under `topology_template.node_templates`:
//! virtual deployment units (VDUs, one virtual machine each), connection
//! points (CPs, network interfaces) and virtual links (VLs, logical
//! networks). Connection points reference the other two through their
//! `requirements` list (`virtualLink` and `virtualBinding`).
//!
//! The loader:
//!
//! - **Parses** the document text (syntax errors are reported with a location)
//! - **Checks structure**: required sections, node shapes, requirement shapes
//! - **Types nodes** into a closed [`NodeKind`] set, keeping the raw type string
//! - **Resolves references**, reporting every dangling one in a single pass
//!
//! Properties such as monitoring policies or embedded boot scripts are kept
//! as opaque [`PropertyValue`] data; nothing is interpreted or executed.
//!
//! ## Architecture
//!
//! - `loader`: the parse phases and reference validation
//! - `node`: node, type and requirement records
//! - `value`: typed property values
//! - `topology`: the immutable loaded topology and its queries
//! - `graph`: petgraph view for ordering and traversal
//! - `options`: loader options
//! - `error`: error taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use vnfd_loader::{parse, NodeKind};
//!
//! let text = r#"
//! tosca_definitions_version: tosca_simple_profile_for_nfv_1_0_0
//! topology_template:
//!   node_templates:
//!     VDU1:
//!       type: tosca.nodes.nfv.VDU.Tacker
//!     CP1:
//!       type: tosca.nodes.nfv.CP.Tacker
//!       requirements:
//!         - virtualLink:
//!             node: VL1
//!         - virtualBinding:
//!             node: VDU1
//!     VL1:
//!       type: tosca.nodes.nfv.VL
//! "#;
//!
//! let topology = parse(text)?;
//! assert_eq!(topology.len(), 3);
//! assert_eq!(topology.binding_of("CP1").map(|n| n.kind()), Some(NodeKind::Vdu));
//! # Ok::<(), vnfd_loader::LoaderError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`LoaderError`], split into parse, schema and
//! reference failures. File-facing helpers return `color_eyre` results with
//! the offending path attached.

pub mod error;
pub mod graph;
pub mod loader;
pub mod node;
pub mod options;
pub mod topology;
pub mod value;

pub use error::{LoaderError, ReferenceError, ReferenceOrigin, SchemaError};
pub use graph::{GraphError, TopologyGraph};
pub use loader::{load_template, parse, parse_unvalidated, parse_with_options, validate_references};
pub use node::{Node, NodeKind, NodeType, Requirement, RequirementKind};
pub use options::{load_options, LoaderOptions};
pub use topology::{Edge, Policy, TemplateHeader, Topology};
pub use value::{PropertyMap, PropertyValue, Scalar};
