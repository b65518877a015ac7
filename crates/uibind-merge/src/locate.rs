//! Block location by line scanning and brace counting.
//!
//! Nothing here parses the language. Signatures are found with regular
//! expressions and block extents by counting `{` and `}` from the signature
//! line: depth starts at zero, and the block ends on the line where depth
//! returns to zero after having gone positive. Braces inside strings or
//! comments are counted like any other.
//!
//! Only the first match of a signature is ever used, so documents with
//! duplicate method names have only one instance located.

use regex::Regex;
use uibind_types::{Document, GeneratorConfig, HandlerKind, BINDING_EVENTS};

/// An inclusive line range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub start: usize,
    pub end: usize,
}

impl BlockRange {
    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Everything belonging to one field in an existing document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldBlocks {
    /// Line of the field declaration.
    pub declaration: Option<usize>,
    /// Binding-registration lines inside the binding lifecycle block.
    pub bindings: Vec<usize>,
    /// Handler method blocks.
    pub handlers: Vec<BlockRange>,
}

impl FieldBlocks {
    /// Returns `true` if nothing was found for the field.
    pub fn is_empty(&self) -> bool {
        self.declaration.is_none() && self.bindings.is_empty() && self.handlers.is_empty()
    }
}

/// Line of the brace that closes the block opened at or after `start`.
///
/// Returns `None` if the block never opens or never closes.
pub fn brace_block_end(doc: &Document, start: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut opened = false;
    for (index, line) in doc.lines().iter().enumerate().skip(start) {
        for c in line.text().chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                    if depth == 0 && opened {
                        return Some(index);
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Locates declarations, bindings and method blocks in a document.
pub struct BlockLocator<'a> {
    doc: &'a Document,
    config: &'a GeneratorConfig,
}

impl<'a> BlockLocator<'a> {
    pub fn new(doc: &'a Document, config: &'a GeneratorConfig) -> Self {
        Self { doc, config }
    }

    /// Block of a fixed lifecycle method such as `Start`.
    pub fn lifecycle_block(&self, method: &str) -> Option<BlockRange> {
        let signature = Regex::new(&format!(
            r"(?:protected override|public override|private) void {}\(\)",
            regex::escape(method)
        ))
        .ok()?;
        let start = self
            .doc
            .lines()
            .iter()
            .position(|l| signature.is_match(l.text()))?;
        let end = brace_block_end(self.doc, start)?;
        Some(BlockRange { start, end })
    }

    /// Block of the lifecycle method holding binding registrations.
    pub fn binding_block(&self) -> Option<BlockRange> {
        self.lifecycle_block(&self.config.lifecycle.binding_method)
    }

    /// Block of the first unmarked handler method named `method`.
    pub fn handler_block(&self, method: &str) -> Option<BlockRange> {
        let signature = Regex::new(&format!(r"private void {}\(.*\)", regex::escape(method))).ok()?;
        let start = self
            .doc
            .lines()
            .iter()
            .position(|l| !l.is_marked() && signature.is_match(l.text()))?;
        let end = brace_block_end(self.doc, start)?;
        Some(BlockRange { start, end })
    }

    /// Line of the first unmarked declaration of `field`.
    pub fn declaration(&self, field: &str) -> Option<usize> {
        let pattern = Regex::new(&format!(r"public\s+\w+\s+{};", regex::escape(field))).ok()?;
        self.doc
            .lines()
            .iter()
            .position(|l| !l.is_marked() && pattern.is_match(l.text()))
    }

    /// Lines inside `block` registering a listener on `field`.
    pub fn binding_lines(&self, block: BlockRange, field: &str) -> Vec<usize> {
        let Ok(pattern) = Regex::new(&format!(
            r"(?:^|\W){}\.(?:{})\.AddListener",
            regex::escape(field),
            BINDING_EVENTS.join("|")
        )) else {
            return Vec::new();
        };
        (block.start..=block.end)
            .filter(|&i| {
                self.doc
                    .line(i)
                    .is_some_and(|l| pattern.is_match(l.text()))
            })
            .collect()
    }

    /// Everything generated for `field`.
    ///
    /// The field's type is not known here, so every handler naming
    /// convention is tried.
    pub fn field_blocks(&self, field: &str, binding_block: Option<BlockRange>) -> FieldBlocks {
        FieldBlocks {
            declaration: self.declaration(field),
            bindings: binding_block
                .map(|b| self.binding_lines(b, field))
                .unwrap_or_default(),
            handlers: HandlerKind::ALL
                .iter()
                .filter_map(|kind| self.handler_block(&kind.method_name(field)))
                .collect(),
        }
    }
}
