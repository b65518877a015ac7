//! Filesystem side of a uibind run.
//!
//! Everything that touches disk lives here:
//!
//! - [`BackupRotator`] -- timestamped copies of the target before a run,
//!   pruned to a retention cap
//! - [`Committer`] -- strips markers and removed lines, then replaces the
//!   target atomically
//! - [`HandoffStore`] -- the publish/consume entry handed to the
//!   post-recompile binding pass, with [`FileHandoffStore`] and
//!   [`InMemoryHandoffStore`] backends
//!
//! Backup errors are logged and never abort a run. Commit and hand-off
//! errors are returned; the SDK reports a hand-off failure that follows a
//! successful write on the commit outcome instead of failing the commit.

pub mod backup;
pub mod commit;
pub mod error;
pub mod handoff;

pub use backup::{BackupRecord, BackupRotator};
pub use commit::{write_atomic, Committer};
pub use error::{StoreError, StoreResult};
pub use handoff::{FileHandoffStore, HandoffEntry, HandoffStore, InMemoryHandoffStore};
