use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};
use uibind_diff::{diff_fields, extract_history_entries, type_drift, DiffResult, TypeDrift};
use uibind_merge::{render_template, ContentMerger, MergeReport};
use uibind_store::{
    BackupRecord, BackupRotator, Committer, FileHandoffStore, HandoffEntry, HandoffStore,
    StoreError,
};
use uibind_types::{unique_by_name, Document, FieldDescriptor, GeneratorConfig, Marker};

use crate::error::{SdkError, SdkResult};
use crate::state::RunState;

const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Runs generations against panel files.
///
/// One `Generator` can serve any number of runs; each run is a
/// [`PendingGeneration`] that must be committed or discarded.
pub struct Generator {
    config: GeneratorConfig,
    rotator: BackupRotator,
    committer: Committer,
    handoff: Arc<dyn HandoffStore>,
}

impl Generator {
    /// Create a generator. Fails if `config` is inconsistent.
    pub fn new(config: GeneratorConfig, handoff: Arc<dyn HandoffStore>) -> SdkResult<Self> {
        config.validate()?;
        Ok(Self {
            rotator: BackupRotator::new(config.backup.clone()),
            committer: Committer::new(config.markers.clone()),
            config,
            handoff,
        })
    }

    /// Generator whose hand-off file lives under `base`.
    pub fn with_file_handoff(config: GeneratorConfig, base: &Path) -> SdkResult<Self> {
        let store = FileHandoffStore::from_config(&config.handoff, base);
        Self::new(config, Arc::new(store))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn rotator(&self) -> &BackupRotator {
        &self.rotator
    }

    pub fn committer(&self) -> &Committer {
        &self.committer
    }

    pub fn handoff(&self) -> &dyn HandoffStore {
        self.handoff.as_ref()
    }

    /// Class name of `target`: its file stem, validated against the config.
    pub fn class_name(&self, target: &Path) -> SdkResult<String> {
        let stem = target
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SdkError::InvalidTarget {
                path: target.to_path_buf(),
                reason: "no file name".into(),
            })?;
        self.config.validate_class_name(stem)?;
        Ok(stem.to_string())
    }

    /// Start a run for `target` with the current time.
    pub fn begin(
        &self,
        target: &Path,
        descriptors: &[FieldDescriptor],
    ) -> SdkResult<PendingGeneration<'_>> {
        self.begin_at(target, descriptors, Local::now().naive_local())
    }

    /// Start a run as if at `now`: snapshot, read history, diff and merge.
    ///
    /// Nothing is written to `target` until the returned handle is
    /// committed. The backup, if enabled, is taken here.
    pub fn begin_at(
        &self,
        target: &Path,
        descriptors: &[FieldDescriptor],
        now: NaiveDateTime,
    ) -> SdkResult<PendingGeneration<'_>> {
        let class_name = self.class_name(target)?;
        let descriptors = unique_by_name(descriptors);
        let mut state = RunState::Idle;

        let backup = self.rotator.snapshot_at(target, now);
        state.advance(RunState::Snapshotted);

        let original = read_existing(target)?;
        let (mut document, diff, drift) = match &original {
            Some(text) => {
                let document = Document::parse(text, &self.config.markers);
                let entries = extract_history_entries(&document);
                let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
                let diff = diff_fields(&descriptors, &names);
                let drift = type_drift(&descriptors, &entries);
                (document, diff, drift)
            }
            None => {
                let generated_at = now.format(HEADER_TIME_FORMAT).to_string();
                let document =
                    render_template(&class_name, &descriptors, &self.config, &generated_at);
                (document, diff_fields(&descriptors, &[]), Vec::new())
            }
        };
        for d in &drift {
            warn!(
                field = %d.name,
                declared = %d.declared,
                current = %d.current,
                "field type changed; existing bindings are kept"
            );
        }
        state.advance(RunState::Diffed);

        let report = if original.is_some() {
            ContentMerger::new(&self.config).merge(&mut document, &diff)
        } else {
            let added_lines = match document.len() {
                0 => 0,
                n => document.mark_range(0, n - 1, Marker::Added),
            };
            MergeReport {
                added_lines,
                ..MergeReport::default()
            }
        };
        state.advance(RunState::Merged);

        info!(
            target = %target.display(),
            added = diff.additions(),
            removed = diff.removals(),
            incremental = original.is_some(),
            "generation ready for review"
        );

        Ok(PendingGeneration {
            generator: self,
            target: target.to_path_buf(),
            class_name,
            descriptors,
            original,
            document,
            diff,
            drift,
            report,
            backup,
            state,
        })
    }

    /// Diff `descriptors` against `target` without touching disk.
    pub fn preview_diff(
        &self,
        target: &Path,
        descriptors: &[FieldDescriptor],
    ) -> SdkResult<DiffResult> {
        let history = match read_existing(target)? {
            Some(text) => {
                let document = Document::parse(&text, &self.config.markers);
                extract_history_entries(&document)
                    .into_iter()
                    .map(|e| e.name)
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(diff_fields(descriptors, &history))
    }
}

fn read_existing(target: &Path) -> SdkResult<Option<String>> {
    if !target.exists() {
        return Ok(None);
    }
    fs::read_to_string(target)
        .map(Some)
        .map_err(|source| SdkError::Read {
            path: target.to_path_buf(),
            source,
        })
}

/// A merged run awaiting review.
///
/// Dropping it without calling [`commit`](Self::commit) or
/// [`discard`](Self::discard) leaves the target untouched.
pub struct PendingGeneration<'g> {
    generator: &'g Generator,
    target: PathBuf,
    class_name: String,
    descriptors: Vec<FieldDescriptor>,
    original: Option<String>,
    document: Document,
    diff: DiffResult,
    drift: Vec<TypeDrift>,
    report: MergeReport,
    backup: Option<BackupRecord>,
    state: RunState,
}

impl PendingGeneration<'_> {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// The merged document with its markers.
    pub fn annotated(&self) -> &Document {
        &self.document
    }

    /// Review text: the merged document with marker strings appended.
    pub fn review_text(&self) -> String {
        self.document.render(&self.generator.config.markers)
    }

    /// Text the target would hold after [`commit`](Self::commit).
    pub fn preview(&self) -> String {
        self.generator.committer.finalize(&self.document)
    }

    /// Target contents before the run, if it existed.
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn diff(&self) -> &DiffResult {
        &self.diff
    }

    pub fn drift(&self) -> &[TypeDrift] {
        &self.drift
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    /// `true` when merging into an existing file, `false` on first
    /// generation.
    pub fn is_incremental(&self) -> bool {
        self.original.is_some()
    }

    /// `true` if committing would change the target.
    pub fn has_changes(&self) -> bool {
        !self.is_incremental() || self.document.has_markers()
    }

    pub fn backup(&self) -> Option<&BackupRecord> {
        self.backup.as_ref()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Write the merged document and publish the descriptors.
    ///
    /// Once the target is written the run counts as committed. A hand-off
    /// failure after that point is logged and carried on
    /// [`CommitOutcome::handoff_error`] rather than returned.
    pub fn commit(self) -> SdkResult<CommitOutcome> {
        let text = self.generator.committer.finalize(&self.document);
        self.persist(text)
    }

    /// Write the reviewer's edited text instead of the merged document.
    ///
    /// Marker strings left in `reviewed` are honoured.
    pub fn commit_reviewed(self, reviewed: &str) -> SdkResult<CommitOutcome> {
        let text = self.generator.committer.finalize_reviewed(reviewed);
        self.persist(text)
    }

    /// Abandon the run. The target is left as it was; a backup taken by
    /// [`Generator::begin`] stays.
    pub fn discard(mut self) -> RunState {
        self.state.advance(RunState::Discarded);
        info!(target = %self.target.display(), "generation discarded");
        self.state
    }

    fn persist(mut self, text: String) -> SdkResult<CommitOutcome> {
        uibind_store::write_atomic(&self.target, &text)?;
        self.state.advance(RunState::Committed);
        info!(
            target = %self.target.display(),
            fields = self.descriptors.len(),
            "generation committed"
        );

        let entry = HandoffEntry::new(self.descriptors).with_class_name(self.class_name);
        let handoff_error = match self.generator.handoff.publish_entry(&entry) {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    target = %self.target.display(),
                    error = %e,
                    "target written but descriptors were not handed off"
                );
                Some(e)
            }
        };
        Ok(CommitOutcome {
            target: self.target,
            text,
            published: if handoff_error.is_none() { entry.descriptors.len() } else { 0 },
            handoff_error,
            backup: self.backup,
            state: self.state,
        })
    }
}

/// What a committed run wrote.
#[derive(Debug)]
pub struct CommitOutcome {
    pub target: PathBuf,
    /// Final file contents.
    pub text: String,
    /// Descriptors handed off for binding; zero if the hand-off failed.
    pub published: usize,
    /// Why the hand-off failed, if it did. The target is written either way.
    pub handoff_error: Option<StoreError>,
    pub backup: Option<BackupRecord>,
    pub state: RunState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uibind_diff::extract_history_text;
    use uibind_store::InMemoryHandoffStore;
    use uibind_types::{BackupConfig, TypesError};

    fn at(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, s)
            .unwrap()
    }

    fn setup() -> (tempfile::TempDir, Generator, Arc<InMemoryHandoffStore>) {
        setup_with(GeneratorConfig::default())
    }

    fn setup_with(config: GeneratorConfig) -> (tempfile::TempDir, Generator, Arc<InMemoryHandoffStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryHandoffStore::new());
        let generator = Generator::new(config, store.clone()).unwrap();
        (dir, generator, store)
    }

    fn fields(specs: &[(&str, &str)]) -> Vec<FieldDescriptor> {
        specs
            .iter()
            .map(|(name, ty)| FieldDescriptor::new(*name, *ty))
            .collect()
    }

    fn generate(g: &Generator, target: &Path, current: &[FieldDescriptor], s: u32) -> CommitOutcome {
        g.begin_at(target, current, at(s)).unwrap().commit().unwrap()
    }

    #[test]
    fn first_generation_writes_template() {
        let (dir, g, store) = setup();
        let target = dir.path().join("StartPanel.cs");
        let current = fields(&[("Play", "Button"), ("Title", "Text")]);

        let pending = g.begin_at(&target, &current, at(0)).unwrap();
        assert!(!pending.is_incremental());
        assert!(pending.has_changes());
        assert!(pending.backup().is_none());
        assert_eq!(pending.diff().added_names(), vec!["Play", "Title"]);
        assert_eq!(pending.report().added_lines, pending.annotated().len());
        assert_eq!(pending.state(), RunState::Merged);

        let outcome = pending.commit().unwrap();
        assert_eq!(outcome.state, RunState::Committed);
        let written = fs::read_to_string(&target).unwrap();
        assert_eq!(written, outcome.text);
        assert!(written.contains("public class StartPanel : BasePanel"));
        assert!(written.contains("2026-05-01 10:00:00"));
        assert!(!written.contains("NEW_ADD"));
        assert_eq!(extract_history_text(&written), vec!["Play", "Title"]);
        assert_eq!(store.consume().unwrap(), Some(current));
    }

    #[test]
    fn rerun_with_same_fields_is_idempotent() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        let current = fields(&[("Play", "Button"), ("Name", "TMP_InputField")]);
        let first = generate(&g, &target, &current, 0);

        let pending = g.begin_at(&target, &current, at(1)).unwrap();
        assert!(pending.is_incremental());
        assert!(pending.diff().is_empty());
        assert!(!pending.annotated().has_markers());
        assert!(!pending.has_changes());
        assert_eq!(pending.preview(), first.text);
        assert_eq!(pending.commit().unwrap().text, first.text);
    }

    #[test]
    fn added_field_appears_once() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        generate(&g, &target, &fields(&[("Play", "Button")]), 0);

        let current = fields(&[("Play", "Button"), ("Sound", "Toggle")]);
        let pending = g.begin_at(&target, &current, at(1)).unwrap();
        assert_eq!(pending.diff().added_names(), vec!["Sound"]);
        assert!(pending.review_text().contains("public Toggle Sound; // NEW_ADD"));

        let outcome = pending.commit().unwrap();
        assert_eq!(outcome.text.matches("public Toggle Sound;").count(), 1);
        assert_eq!(outcome.text.matches("private void OnSoundToggleChange(bool value)").count(), 1);
        assert_eq!(extract_history_text(&outcome.text), vec!["Play", "Sound"]);
    }

    #[test]
    fn removed_field_disappears_on_commit() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        generate(&g, &target, &fields(&[("Play", "Button"), ("Quit", "Button")]), 0);

        let pending = g.begin_at(&target, &fields(&[("Play", "Button")]), at(1)).unwrap();
        assert_eq!(pending.diff().removed, vec!["Quit"]);
        assert!(pending.annotated().count_marked(Marker::Removed) > 0);
        assert!(pending.review_text().contains("public Button Quit; // REMOVE_MARK"));

        let text = pending.commit().unwrap().text;
        assert!(!text.contains("Quit"));
        assert_eq!(extract_history_text(&text), vec!["Play"]);
    }

    #[test]
    fn add_then_remove_restores_file() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        let base = fields(&[("Play", "Button")]);
        let original = generate(&g, &target, &base, 0).text;

        generate(&g, &target, &fields(&[("Play", "Button"), ("Extra", "Button")]), 1);
        let restored = generate(&g, &target, &base, 2).text;
        assert_eq!(restored, original);
    }

    #[test]
    fn hand_written_code_survives() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        generate(&g, &target, &fields(&[("Play", "Button")]), 0);

        let edited = fs::read_to_string(&target)
            .unwrap()
            .replace("// Hand-written content", "// Hand-written content\n\t\tprivate int score = 3;");
        fs::write(&target, edited).unwrap();

        let text = generate(&g, &target, &fields(&[("Play", "Button"), ("Next", "Button")]), 1).text;
        assert!(text.contains("\t\tprivate int score = 3;"));
    }

    struct UnwritableHandoff;

    impl HandoffStore for UnwritableHandoff {
        fn publish_entry(&self, _: &HandoffEntry) -> uibind_store::StoreResult<()> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "hand-off file is read-only",
            )))
        }

        fn consume_entry(&self) -> uibind_store::StoreResult<Option<HandoffEntry>> {
            Ok(None)
        }
    }

    #[test]
    fn failed_handoff_still_reports_the_commit() {
        let dir = tempfile::tempdir().unwrap();
        let g = Generator::new(GeneratorConfig::default(), Arc::new(UnwritableHandoff)).unwrap();
        let target = dir.path().join("StartPanel.cs");

        let outcome = g
            .begin_at(&target, &fields(&[("Play", "Button")]), at(0))
            .unwrap()
            .commit()
            .unwrap();
        assert_eq!(outcome.state, RunState::Committed);
        assert_eq!(outcome.published, 0);
        assert!(matches!(outcome.handoff_error, Some(StoreError::Io(_))));
        assert_eq!(fs::read_to_string(&target).unwrap(), outcome.text);
    }

    #[test]
    fn handoff_names_the_generated_class() {
        let (dir, g, store) = setup();
        let target = dir.path().join("StartPanel.cs");
        let current = fields(&[("Play", "Button")]);
        let outcome = generate(&g, &target, &current, 0);
        assert!(outcome.handoff_error.is_none());

        let entry = store.consume_entry().unwrap().unwrap();
        assert_eq!(entry.class_name.as_deref(), Some("StartPanel"));
        assert_eq!(entry.descriptors, current);
    }

    #[test]
    fn discard_leaves_target_untouched() {
        let (dir, g, store) = setup();
        let target = dir.path().join("StartPanel.cs");
        generate(&g, &target, &fields(&[("Play", "Button")]), 0);
        store.consume().unwrap();
        let before = fs::read_to_string(&target).unwrap();

        let pending = g.begin_at(&target, &fields(&[("Other", "Toggle")]), at(1)).unwrap();
        assert!(pending.backup().is_some());
        assert_eq!(pending.discard(), RunState::Discarded);

        assert_eq!(fs::read_to_string(&target).unwrap(), before);
        assert!(!store.is_pending());
    }

    #[test]
    fn reviewed_text_is_committed() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        generate(&g, &target, &fields(&[("Play", "Button")]), 0);

        let pending = g.begin_at(&target, &fields(&[("Play", "Button"), ("Back", "Button")]), at(1)).unwrap();
        let reviewed = pending
            .review_text()
            .replace("public Button Back; // NEW_ADD", "public Button Back; // REMOVE_MARK");
        let text = pending.commit_reviewed(&reviewed).unwrap().text;
        assert!(!text.contains("public Button Back;"));
        assert!(text.contains("Back.onClick.AddListener"));
        assert!(!text.contains("NEW_ADD"));
    }

    #[test]
    fn each_run_backs_up_previous_version() {
        let config = GeneratorConfig {
            backup: BackupConfig {
                max_count: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let (dir, g, _) = setup_with(config);
        let target = dir.path().join("StartPanel.cs");
        let current = fields(&[("Play", "Button")]);
        for s in 0..4 {
            generate(&g, &target, &current, s);
        }
        let backups = g.rotator().list(&target).unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].timestamp < backups[1].timestamp);
    }

    #[test]
    fn type_change_is_reported_not_diffed() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        generate(&g, &target, &fields(&[("Volume", "Slider")]), 0);

        let pending = g.begin_at(&target, &fields(&[("Volume", "Toggle")]), at(1)).unwrap();
        assert!(pending.diff().is_empty());
        assert_eq!(pending.drift().len(), 1);
        assert_eq!(pending.drift()[0].declared, "Slider");
    }

    #[test]
    fn class_name_must_carry_suffix() {
        let (dir, g, _) = setup();
        let err = g
            .begin_at(&dir.path().join("Start.cs"), &[], at(0))
            .err()
            .expect("invalid class name");
        assert!(matches!(err, SdkError::Types(TypesError::InvalidClassName { .. })));
        assert!(!dir.path().join("Start.cs").exists());
    }

    #[test]
    fn preview_diff_reads_without_writing() {
        let (dir, g, _) = setup();
        let target = dir.path().join("StartPanel.cs");
        let diff = g.preview_diff(&target, &fields(&[("Play", "Button")])).unwrap();
        assert_eq!(diff.added_names(), vec!["Play"]);
        assert!(!target.exists());
    }
}
