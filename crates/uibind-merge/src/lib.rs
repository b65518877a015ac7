//! Merge engine for uibind.
//!
//! Patches a previously generated panel in place: additions are rendered and
//! inserted below fixed anchor comments, removals are located by brace
//! matching and tagged rather than deleted. A first-generation template
//! covers targets that do not exist yet.

pub mod locate;
pub mod merger;
pub mod render;
pub mod template;

pub use locate::{brace_block_end, BlockLocator, BlockRange, FieldBlocks};
pub use merger::{ContentMerger, MergeReport};
pub use template::render_template;
