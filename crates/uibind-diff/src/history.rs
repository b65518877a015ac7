//! History extraction: recover the fields a previous run emitted.
//!
//! This is a best-effort scan for `public <type> <name>;` declarations, not
//! a parser. Lines that do not match are ignored and nothing here fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use uibind_types::{Document, Marker};

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"public\s+(\w+)\s+(\w+);").expect("declaration pattern is valid")
});

/// A field declaration found in an existing document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub name: String,
    pub field_type: String,
    /// Zero-based line index of the declaration.
    pub line: usize,
}

/// Every declaration in `doc`, in file order.
///
/// Lines already marked [`Marker::Removed`] are skipped: they will not
/// survive the commit.
pub fn extract_history_entries(doc: &Document) -> Vec<HistoryEntry> {
    doc.lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| line.marker() != Some(Marker::Removed))
        .flat_map(|(index, line)| {
            DECLARATION
                .captures_iter(line.text())
                .map(move |caps| HistoryEntry {
                    name: caps[2].to_string(),
                    field_type: caps[1].to_string(),
                    line: index,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Historical field names of `doc`, in file order.
pub fn extract_history(doc: &Document) -> Vec<String> {
    extract_history_entries(doc)
        .into_iter()
        .map(|e| e.name)
        .collect()
}

/// Historical field names of raw file text.
pub fn extract_history_text(text: &str) -> Vec<String> {
    extract_history(&Document::from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_history() {
        assert!(extract_history(&Document::new()).is_empty());
    }

    #[test]
    fn collects_declarations_in_order() {
        let text = "\
public class StartPanel : BasePanel
{
\tpublic Button Play;
\tpublic TextMeshProUGUI Title;
\t// Reserved for new fields
\tpublic override void ShowMe()
\t{
\t}
}";
        assert_eq!(extract_history_text(text), vec!["Play", "Title"]);
    }

    #[test]
    fn ignores_non_declarations() {
        let text = "\
private Button hidden;
public Button Broken
public static int Count = 0;
var x = 1;";
        assert!(extract_history_text(text).is_empty());
    }

    #[test]
    fn hand_written_public_fields_are_included() {
        // The scan cannot tell generated and hand-written declarations apart.
        let text = "public Button Play;\npublic int score;";
        assert_eq!(extract_history_text(text), vec!["Play", "score"]);
    }

    #[test]
    fn entries_record_type_and_line() {
        let doc = Document::from_text("x\n\tpublic Toggle Sound;");
        let entries = extract_history_entries(&doc);
        assert_eq!(
            entries,
            vec![HistoryEntry {
                name: "Sound".into(),
                field_type: "Toggle".into(),
                line: 1,
            }]
        );
    }

    #[test]
    fn removed_lines_are_not_history() {
        let mut doc = Document::from_text("public Button A;\npublic Button B;");
        doc.mark(1, Marker::Removed);
        assert_eq!(extract_history(&doc), vec!["A"]);
    }
}
