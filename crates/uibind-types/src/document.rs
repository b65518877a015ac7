//! Line-indexed documents carrying pending-change markers.
//!
//! A [`Document`] is the in-memory form of a generated file during one run.
//! Each line keeps its raw text and at most one [`Marker`]; the marker
//! strings only appear in the rendered review text, never in `Line::text`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MarkerStyle;

/// A pending change on a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Inserted by this run; kept at commit.
    Added,
    /// Scheduled for removal; dropped at commit.
    Removed,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Added => f.write_str("added"),
            Marker::Removed => f.write_str("removed"),
        }
    }
}

/// Insertion category of an anchor line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    /// Field declarations.
    Field,
    /// Binding registrations inside the binding lifecycle method.
    Binding,
    /// Handler methods.
    Handler,
}

impl AnchorKind {
    pub const ALL: [AnchorKind; 3] = [AnchorKind::Field, AnchorKind::Binding, AnchorKind::Handler];
}

/// One line of a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    text: String,
    marker: Option<Marker>,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marker: None,
        }
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marker: Some(Marker::Added),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }

    pub fn is_marked(&self) -> bool {
        self.marker.is_some()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Apply a marker. `Removed` supersedes `Added`; nothing supersedes
    /// `Removed`. Returns `true` if the marker changed.
    pub fn mark(&mut self, marker: Marker) -> bool {
        match (self.marker, marker) {
            (Some(Marker::Removed), _) => false,
            (Some(current), m) if current == m => false,
            _ => {
                self.marker = Some(marker);
                true
            }
        }
    }

    /// Text as shown for review, with the marker string appended.
    pub fn render(&self, style: &MarkerStyle) -> String {
        match self.marker {
            None => self.text.clone(),
            Some(Marker::Added) => format!("{} {}", self.text, style.added),
            Some(Marker::Removed) => format!("{} {}", self.text, style.removed),
        }
    }
}

/// An ordered sequence of lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unmarked document from plain text. Accepts `\n` and `\r\n`.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(Line::new).collect(),
        }
    }

    /// Parse review text, recognising in-band marker strings.
    ///
    /// A line containing the removed marker is `Removed` (even if it also
    /// carries the added marker); otherwise a line containing the added
    /// marker is `Added`. Marker substrings are stripped from the text.
    pub fn parse(text: &str, style: &MarkerStyle) -> Self {
        let lines = text
            .lines()
            .map(|raw| {
                let removed = raw.contains(style.removed.as_str());
                let added = raw.contains(style.added.as_str());
                if !removed && !added {
                    return Line::new(raw);
                }
                let stripped = raw
                    .replace(style.removed.as_str(), "")
                    .replace(style.added.as_str(), "");
                Line {
                    text: stripped.trim_end().to_string(),
                    marker: Some(if removed { Marker::Removed } else { Marker::Added }),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Insert `block` directly after line `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn insert_after(&mut self, index: usize, block: Vec<Line>) {
        let at = index + 1;
        self.lines.splice(at..at, block);
    }

    /// Mark one line. Returns `false` if the index is out of range or the
    /// marker did not change.
    pub fn mark(&mut self, index: usize, marker: Marker) -> bool {
        self.lines
            .get_mut(index)
            .map(|line| line.mark(marker))
            .unwrap_or(false)
    }

    /// Mark every line in the inclusive range `[start, end]`.
    pub fn mark_range(&mut self, start: usize, end: usize, marker: Marker) -> usize {
        (start..=end).filter(|&i| self.mark(i, marker)).count()
    }

    /// Index of the first line containing `anchor`.
    pub fn find_anchor(&self, anchor: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.text.contains(anchor))
    }

    /// Number of lines containing `anchor`.
    pub fn anchor_count(&self, anchor: &str) -> usize {
        self.lines.iter().filter(|l| l.text.contains(anchor)).count()
    }

    pub fn count_marked(&self, marker: Marker) -> usize {
        self.lines.iter().filter(|l| l.marker == Some(marker)).count()
    }

    pub fn has_markers(&self) -> bool {
        self.lines.iter().any(Line::is_marked)
    }

    /// Review text: lines joined by `\n`, marked lines carrying their marker
    /// string.
    pub fn render(&self, style: &MarkerStyle) -> String {
        self.lines
            .iter()
            .map(|l| l.render(style))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Raw text of every line, markers ignored.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<Line> for Document {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_supersedes_added() {
        let mut line = Line::added("public Button A;");
        assert!(line.mark(Marker::Removed));
        assert!(!line.mark(Marker::Added));
        assert_eq!(line.marker(), Some(Marker::Removed));
    }

    #[test]
    fn insert_after_places_block_below_anchor() {
        let mut doc = Document::from_text("a\nanchor\nz");
        doc.insert_after(1, vec![Line::added("b"), Line::added("c")]);
        let texts: Vec<_> = doc.lines().iter().map(Line::text).collect();
        assert_eq!(texts, vec!["a", "anchor", "b", "c", "z"]);
    }

    #[test]
    fn insert_after_last_line_appends() {
        let mut doc = Document::from_text("anchor");
        doc.insert_after(0, vec![Line::added("x")]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.line(1).unwrap().text(), "x");
    }

    #[test]
    fn render_and_parse_recover_markers() {
        let style = MarkerStyle::default();
        let doc: Document = vec![
            Line::new("keep"),
            Line::added("\tnew();"),
            {
                let mut l = Line::new("\told();");
                l.mark(Marker::Removed);
                l
            },
            Line::added(""),
        ]
        .into_iter()
        .collect();

        let text = doc.render(&style);
        assert!(text.contains("\tnew(); // NEW_ADD"));
        assert!(text.contains("\told(); // REMOVE_MARK"));

        let parsed = Document::parse(&text, &style);
        assert_eq!(parsed, doc);
    }

    #[test]
    fn parse_line_with_both_markers_is_removed() {
        let style = MarkerStyle::default();
        let doc = Document::parse("x(); // NEW_ADD // REMOVE_MARK", &style);
        assert_eq!(doc.line(0).unwrap().marker(), Some(Marker::Removed));
        assert_eq!(doc.line(0).unwrap().text(), "x();");
    }

    #[test]
    fn crlf_input_is_split_cleanly() {
        let doc = Document::from_text("a\r\nb\r\n");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.line(1).unwrap().text(), "b");
    }

    #[test]
    fn anchors_found_by_substring() {
        let doc = Document::from_text("x\n\t\t// ANCHOR\ny\n// ANCHOR");
        assert_eq!(doc.find_anchor("// ANCHOR"), Some(1));
        assert_eq!(doc.anchor_count("// ANCHOR"), 2);
        assert_eq!(doc.find_anchor("// MISSING"), None);
    }

    #[test]
    fn mark_range_counts_changes() {
        let mut doc = Document::from_text("a\nb\nc\nd");
        doc.mark(1, Marker::Removed);
        assert_eq!(doc.mark_range(0, 2, Marker::Removed), 2);
        assert_eq!(doc.count_marked(Marker::Removed), 3);
        assert!(!doc.mark(10, Marker::Added));
    }
}
