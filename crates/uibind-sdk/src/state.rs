use std::fmt;

use serde::Serialize;
use tracing::debug;

/// Lifecycle of one generation run.
///
/// `Committed` and `Discarded` are terminal; the pending handle that could
/// move past `Merged` is consumed on either.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Snapshotted,
    Diffed,
    /// Annotated document ready for review.
    Merged,
    Committed,
    Discarded,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Committed | RunState::Discarded)
    }

    /// Move to `next`, logging the transition.
    pub(crate) fn advance(&mut self, next: RunState) {
        debug!(from = %self, to = %next, "run state");
        *self = next;
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Snapshotted => "snapshotted",
            RunState::Diffed => "diffed",
            RunState::Merged => "merged",
            RunState::Committed => "committed",
            RunState::Discarded => "discarded",
        };
        f.write_str(name)
    }
}
