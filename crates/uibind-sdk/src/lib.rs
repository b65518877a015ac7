//! High-level SDK for uibind.
//!
//! A [`Generator`] runs one generation at a time: it backs up the target,
//! recovers the fields an earlier run emitted, diffs them against the
//! current descriptors and merges the difference into the file. The result
//! is a [`PendingGeneration`] that is reviewed and then committed or
//! discarded; nothing is written to the target before that.

pub mod error;
pub mod generator;
pub mod state;

pub use error::{SdkError, SdkResult};
pub use generator::{CommitOutcome, Generator, PendingGeneration};
pub use state::RunState;

// Re-export key types
pub use uibind_diff::{DiffResult, HistoryEntry, TypeDrift};
pub use uibind_merge::MergeReport;
pub use uibind_store::{
    BackupRecord, FileHandoffStore, HandoffEntry, HandoffStore, InMemoryHandoffStore,
    StoreError,
};
pub use uibind_types::{
    Document, FieldDescriptor, GeneratorConfig, Marker, MarkerStyle,
};
