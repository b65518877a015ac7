//! Commit: turn a reviewed document into the persisted file.
//!
//! This is the only destructive step of a run. The complete buffer is
//! computed first and written through a temporary file in the target's
//! directory that is then renamed over the target, so a failed write never
//! leaves a partial file behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;
use uibind_types::{Document, Marker, MarkerStyle};

use crate::error::StoreResult;

/// Strips markers and removed lines, then writes the result.
#[derive(Clone, Debug, Default)]
pub struct Committer {
    markers: MarkerStyle,
}

impl Committer {
    pub fn new(markers: MarkerStyle) -> Self {
        Self { markers }
    }

    /// Final text of `doc`.
    ///
    /// `Removed` lines are dropped; every other line loses any added-marker
    /// substring and its trailing whitespace. Leading and trailing blank
    /// lines of the whole document are trimmed.
    pub fn finalize(&self, doc: &Document) -> String {
        let lines: Vec<String> = doc
            .lines()
            .iter()
            .filter(|l| l.marker() != Some(Marker::Removed))
            .map(|l| l.text().replace(self.markers.added.as_str(), "").trim_end().to_string())
            .collect();

        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        match (first, last) {
            (Some(first), Some(last)) => lines[first..=last].join("\n"),
            _ => String::new(),
        }
    }

    /// Final text of review output, recognising in-band markers.
    pub fn finalize_reviewed(&self, reviewed: &str) -> String {
        self.finalize(&Document::parse(reviewed, &self.markers))
    }

    /// Finalize `doc` and replace `target` with the result.
    pub fn commit(&self, doc: &Document, target: &Path) -> StoreResult<String> {
        let text = self.finalize(doc);
        write_atomic(target, &text)?;
        info!(target = %target.display(), bytes = text.len(), "committed");
        Ok(text)
    }
}

/// Replace `path` with `contents` in a single rename.
///
/// The parent directory is created if needed.
pub fn write_atomic(path: &Path, contents: &str) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
