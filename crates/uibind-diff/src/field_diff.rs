//! Field-level diff: classify the current descriptors against history.
//!
//! Matching is by name only. A field that kept its name but changed type is
//! unchanged as far as the diff is concerned; [`type_drift`] reports such
//! fields so callers can surface them.

use std::collections::HashSet;

use serde::Serialize;
use uibind_types::{unique_by_name, FieldDescriptor};

use crate::history::HistoryEntry;

/// The result of comparing current descriptors with historical names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Descriptors absent from history, in current order.
    pub added: Vec<FieldDescriptor>,
    /// Historical names absent from the current set, in historical order.
    pub removed: Vec<String>,
}

impl DiffResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was added or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.added.len()
    }

    pub fn removals(&self) -> usize {
        self.removed.len()
    }

    pub fn added_names(&self) -> Vec<&str> {
        self.added.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Compute the diff between `current` and `history`.
///
/// Duplicate names in `current` collapse to their first occurrence;
/// duplicate historical names are reported once.
pub fn diff_fields(current: &[FieldDescriptor], history: &[String]) -> DiffResult {
    let current = unique_by_name(current);
    let history_set: HashSet<&str> = history.iter().map(String::as_str).collect();
    let current_set: HashSet<&str> = current.iter().map(|d| d.name.as_str()).collect();

    let added = current
        .iter()
        .filter(|d| !history_set.contains(d.name.as_str()))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let removed = history
        .iter()
        .filter(|name| !current_set.contains(name.as_str()))
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect();

    DiffResult { added, removed }
}

/// A field whose declared type differs from the current descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeDrift {
    pub name: String,
    pub declared: String,
    pub current: String,
}

/// Fields present in both lists whose types disagree.
///
/// The diff ignores these; their old bindings and handlers persist.
pub fn type_drift(current: &[FieldDescriptor], history: &[HistoryEntry]) -> Vec<TypeDrift> {
    unique_by_name(current)
        .into_iter()
        .filter_map(|d| {
            let entry = history.iter().find(|e| e.name == d.name)?;
            (entry.field_type != d.field_type).then(|| TypeDrift {
                name: d.name.clone(),
                declared: entry.field_type.clone(),
                current: d.field_type.clone(),
            })
        })
        .collect()
}
