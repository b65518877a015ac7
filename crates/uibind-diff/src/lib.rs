//! Diff engine for uibind.
//!
//! Recovers the fields a previous generation emitted and classifies the
//! current descriptor list against them.
//!
//! # Key Types
//!
//! - [`HistoryEntry`] -- a declaration found in an existing document
//! - [`DiffResult`] -- added descriptors and removed names
//! - [`TypeDrift`] -- a name kept across runs with a different type

pub mod field_diff;
pub mod history;

pub use field_diff::{diff_fields, type_drift, DiffResult, TypeDrift};
pub use history::{extract_history, extract_history_entries, extract_history_text, HistoryEntry};
