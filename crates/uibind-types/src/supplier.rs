//! Descriptor suppliers.
//!
//! The generator consumes an ordered list of [`FieldDescriptor`]s. Where they
//! come from is up to the host; [`NodeNameSupplier`] implements the
//! `[Tag]FieldName` node-naming convention, resolving tags through a
//! [`TagTable`].

use std::collections::BTreeMap;

use crate::descriptor::{FieldDescriptor, SourceId};

/// A capability producing field descriptors in traversal order.
pub trait DescriptorSupplier {
    fn supply(&self) -> SupplyReport;
}

/// Descriptors produced by a supplier plus the nodes it had to skip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupplyReport {
    pub descriptors: Vec<FieldDescriptor>,
    pub errors: Vec<SupplyError>,
}

impl SupplyReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A node that could not be turned into a descriptor. Never fatal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SupplyError {
    #[error("node {node:?}: unknown component tag {tag:?}")]
    UnknownTag { node: String, tag: String },

    #[error("node {node:?}: invalid field name {field:?}")]
    InvalidFieldName { node: String, field: String },
}

/// Maps naming-convention tags to field types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagTable(BTreeMap<String, String>);

impl Default for TagTable {
    fn default() -> Self {
        let pairs = [
            ("Button", "Button"),
            ("Text", "Text"),
            ("TMP", "TextMeshProUGUI"),
            ("Slider", "Slider"),
            ("InputField", "InputField"),
            ("Dropdown", "Dropdown"),
            ("Image", "Image"),
            ("RawImage", "RawImage"),
            ("Toggle", "Toggle"),
            ("ScrollRect", "ScrollRect"),
            ("TMP_Dropdown", "TMP_Dropdown"),
            ("TMP_InputField", "TMP_InputField"),
        ];
        Self(
            pairs
                .into_iter()
                .map(|(tag, ty)| (tag.to_string(), ty.to_string()))
                .collect(),
        )
    }
}

impl TagTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, tag: impl Into<String>, field_type: impl Into<String>) {
        self.0.insert(tag.into(), field_type.into());
    }

    pub fn resolve(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split `[Tag]FieldName` into `(tag, field)`.
///
/// Returns `None` for names that do not follow the convention; such nodes
/// are structural and carry no field.
pub fn parse_node_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix('[')?;
    rest.split_once(']')
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A named node from the host's tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceNode {
    pub id: SourceId,
    pub name: String,
}

/// Supplies descriptors from an ordered list of node names.
#[derive(Clone, Debug, Default)]
pub struct NodeNameSupplier {
    nodes: Vec<SourceNode>,
    table: TagTable,
}

impl NodeNameSupplier {
    pub fn new(table: TagTable) -> Self {
        Self {
            nodes: Vec::new(),
            table,
        }
    }

    /// One node per non-blank line; the source id is the 1-based line
    /// number.
    pub fn from_lines(text: &str, table: TagTable) -> Self {
        let nodes = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| SourceNode {
                id: SourceId::from(i as u64 + 1),
                name: l.trim().to_string(),
            })
            .collect();
        Self { nodes, table }
    }

    pub fn push(&mut self, id: impl Into<SourceId>, name: impl Into<String>) {
        self.nodes.push(SourceNode {
            id: id.into(),
            name: name.into(),
        });
    }

    pub fn nodes(&self) -> &[SourceNode] {
        &self.nodes
    }
}

impl DescriptorSupplier for NodeNameSupplier {
    fn supply(&self) -> SupplyReport {
        let mut report = SupplyReport::default();
        for node in &self.nodes {
            let Some((tag, field)) = parse_node_name(&node.name) else {
                continue;
            };
            let Some(field_type) = self.table.resolve(tag) else {
                tracing::warn!(node = %node.name, tag, "unknown component tag; node skipped");
                report.errors.push(SupplyError::UnknownTag {
                    node: node.name.clone(),
                    tag: tag.to_string(),
                });
                continue;
            };
            if !is_identifier(field) {
                tracing::warn!(node = %node.name, field, "invalid field name; node skipped");
                report.errors.push(SupplyError::InvalidFieldName {
                    node: node.name.clone(),
                    field: field.to_string(),
                });
                continue;
            }
            report.descriptors.push(
                FieldDescriptor::new(field, field_type).with_source(node.id.clone()),
            );
        }
        report
    }
}
