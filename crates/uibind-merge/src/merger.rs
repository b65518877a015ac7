//! Content merging: mark removed fields and insert added ones at anchors.
//!
//! Removal never deletes a line; it tags the line `Removed` so a reviewer
//! sees what will go. Insertion always lands directly below the anchor, so
//! successive runs stack their additions most-recent-first.

use serde::Serialize;
use tracing::debug;
use uibind_diff::DiffResult;
use uibind_types::{AnchorKind, Document, FieldDescriptor, GeneratorConfig, Line, Marker};

use crate::locate::{BlockLocator, BlockRange};
use crate::render;

/// What a merge changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Lines tagged `Removed`.
    pub removed_lines: usize,
    /// Lines inserted and tagged `Added`.
    pub added_lines: usize,
    /// Categories whose anchor was missing; their content was dropped.
    pub missing_anchors: Vec<AnchorKind>,
    /// Removed names for which nothing was found in the document.
    pub unresolved: Vec<String>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.removed_lines == 0 && self.added_lines == 0
    }
}

/// Applies a [`DiffResult`] to a document.
pub struct ContentMerger<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> ContentMerger<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Mark removals, then insert additions.
    pub fn merge(&self, doc: &mut Document, diff: &DiffResult) -> MergeReport {
        let mut report = MergeReport::default();
        if !diff.removed.is_empty() {
            self.mark_removed(doc, &diff.removed, &mut report);
        }
        if !diff.added.is_empty() {
            self.insert_added(doc, &diff.added, &mut report);
        }
        debug!(
            removed = report.removed_lines,
            added = report.added_lines,
            "merge applied"
        );
        report
    }

    /// Tag declarations, bindings and handler blocks of `names` as removed.
    pub fn mark_removed(&self, doc: &mut Document, names: &[String], report: &mut MergeReport) {
        let binding_block = BlockLocator::new(doc, self.config).binding_block();

        for name in names {
            let blocks = BlockLocator::new(doc, self.config).field_blocks(name, binding_block);
            if blocks.is_empty() {
                debug!(field = %name, "nothing to remove; skipped");
                report.unresolved.push(name.clone());
                continue;
            }

            if let Some(line) = blocks.declaration {
                report.removed_lines += usize::from(doc.mark(line, Marker::Removed));
            }
            for line in blocks.bindings {
                report.removed_lines += usize::from(doc.mark(line, Marker::Removed));
            }
            for block in blocks.handlers {
                report.removed_lines += mark_block(doc, block);
            }
        }
    }

    /// Render `fields` and insert each category below its anchor.
    pub fn insert_added(
        &self,
        doc: &mut Document,
        fields: &[FieldDescriptor],
        report: &mut MergeReport,
    ) {
        for kind in AnchorKind::ALL {
            let anchor = self.config.anchor(kind);
            let Some(index) = doc.find_anchor(anchor) else {
                debug!(?kind, anchor, "anchor not found; additions dropped");
                report.missing_anchors.push(kind);
                continue;
            };
            let indent = render::leading_indent(doc.line(index).map_or("", Line::text)).to_string();
            let block = self.render_block(kind, fields, &indent);
            if block.is_empty() {
                continue;
            }
            report.added_lines += block.len();
            doc.insert_after(index, block);
        }
    }

    fn render_block(&self, kind: AnchorKind, fields: &[FieldDescriptor], indent: &str) -> Vec<Line> {
        let lines: Vec<String> = match kind {
            AnchorKind::Field => fields
                .iter()
                .map(|f| format!("{indent}{}", render::declaration(f)))
                .collect(),
            AnchorKind::Binding => fields
                .iter()
                .flat_map(render::bindings)
                .map(|b| format!("{indent}{b}"))
                .collect(),
            AnchorKind::Handler => render::handler_stubs(fields, indent),
        };
        lines.into_iter().map(Line::added).collect()
    }
}

/// Tag a handler block and one following blank line.
fn mark_block(doc: &mut Document, block: BlockRange) -> usize {
    let mut marked = doc.mark_range(block.start, block.end, Marker::Removed);
    let next = block.end + 1;
    if doc.line(next).is_some_and(|l| l.is_blank() && !l.is_marked()) {
        marked += usize::from(doc.mark(next, Marker::Removed));
    }
    marked
}
