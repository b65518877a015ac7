//! Foundation types for uibind.
//!
//! uibind keeps a hand-maintained UI panel class in sync with a list of
//! typed fields. This crate holds the types every other uibind crate shares.
//!
//! # Key Types
//!
//! - [`FieldDescriptor`] -- `(name, type, source id)` of one generated field
//! - [`Document`] / [`Line`] / [`Marker`] -- line sequence with pending-change markers
//! - [`GeneratorConfig`] -- anchors, markers, naming and backup settings
//! - [`NodeNameSupplier`] -- descriptors from `[Tag]Name` node names

pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod supplier;

pub use config::{Anchors, BackupConfig, GeneratorConfig, HandoffConfig, Lifecycle, MarkerStyle};
pub use descriptor::{
    unique_by_name, FieldDescriptor, HandlerKind, SourceId, TypeCategory, BINDING_EVENTS,
};
pub use document::{AnchorKind, Document, Line, Marker};
pub use error::{TypesError, TypesResult};
pub use supplier::{
    parse_node_name, DescriptorSupplier, NodeNameSupplier, SourceNode, SupplyError, SupplyReport,
    TagTable,
};
