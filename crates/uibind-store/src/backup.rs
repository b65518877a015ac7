//! Rotating backups of a target file, taken before each run mutates it.
//!
//! Backups live in a sub-directory next to the target and are named
//! `{stem}_{timestamp}{suffix}{extension}`. Pruning is global over every
//! file in that directory that carries the suffix and extension, keeping
//! only the newest `max_count`.
//!
//! Backup failures never abort a run: [`BackupRotator::snapshot`] logs and
//! returns `None`. The `try_*` variants surface the error for callers that
//! want it.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use tracing::{debug, error, info};
use uibind_types::BackupConfig;

use crate::error::{StoreError, StoreResult};

/// Upper bound on one-second advances while looking for a free name.
const MAX_STAMP_ADVANCE: u32 = 86_400;

/// One backup file on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    /// Timestamp embedded in the file name.
    pub timestamp: String,
    /// Creation time, or modification time where the platform lacks it.
    #[serde(skip)]
    pub created: SystemTime,
    pub path: PathBuf,
}

/// Snapshots a target into its backup directory and prunes old copies.
#[derive(Clone, Debug, Default)]
pub struct BackupRotator {
    config: BackupConfig,
}

impl BackupRotator {
    pub fn new(config: BackupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Directory holding the backups of `target`.
    pub fn backup_dir(&self, target: &Path) -> PathBuf {
        let sub = Path::new(&self.config.sub_dir);
        if sub.is_absolute() {
            return sub.to_path_buf();
        }
        match target.parent() {
            Some(parent) => parent.join(sub),
            None => sub.to_path_buf(),
        }
    }

    /// Back up `target` now. Logs and returns `None` on failure.
    pub fn snapshot(&self, target: &Path) -> Option<BackupRecord> {
        self.snapshot_at(target, Local::now().naive_local())
    }

    /// Back up `target` as if taken at `now`. Logs and returns `None` on
    /// failure, when backups are disabled, or when `target` does not exist.
    pub fn snapshot_at(&self, target: &Path, now: NaiveDateTime) -> Option<BackupRecord> {
        match self.try_snapshot_at(target, now) {
            Ok(record) => record,
            Err(e) => {
                error!(target = %target.display(), error = %e, "backup failed");
                None
            }
        }
    }

    /// Fallible form of [`snapshot_at`](Self::snapshot_at).
    pub fn try_snapshot_at(
        &self,
        target: &Path,
        now: NaiveDateTime,
    ) -> StoreResult<Option<BackupRecord>> {
        if !self.config.enabled {
            debug!("backups disabled");
            return Ok(None);
        }
        if !target.is_file() {
            debug!(target = %target.display(), "nothing to back up");
            return Ok(None);
        }

        let stem = stem_of(target)?;
        self.format_stamp(now)?;
        let dir = self.backup_dir(target);
        fs::create_dir_all(&dir)?;

        let mut stamp_time = now;
        if let Some(latest) = self.latest_stamp(&dir, &stem)? {
            if stamp_time <= latest {
                stamp_time = latest + TimeDelta::seconds(1);
            }
        }

        let mut advanced = 0;
        let (timestamp, path) = loop {
            let timestamp = self.format_stamp(stamp_time)?;
            let path = dir.join(self.file_name(&stem, &timestamp));
            if !path.exists() {
                break (timestamp, path);
            }
            advanced += 1;
            if advanced > MAX_STAMP_ADVANCE {
                return Err(StoreError::BackupNameExhausted(target.to_path_buf()));
            }
            stamp_time += TimeDelta::seconds(1);
        };

        fs::copy(target, &path)?;
        let created = created_time(&path)?;
        info!(backup = %path.display(), "backup written");

        for pruned in self.prune(&dir) {
            debug!(path = %pruned.display(), "pruned backup");
        }

        Ok(Some(BackupRecord {
            timestamp,
            created,
            path,
        }))
    }

    /// Delete the oldest backups in `dir` until at most `max_count` remain.
    /// Returns the deleted paths; individual failures are logged.
    pub fn prune(&self, dir: &Path) -> Vec<PathBuf> {
        let mut entries = match self.backup_files(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "cannot list backups");
                return Vec::new();
            }
        };
        if entries.len() <= self.config.max_count {
            return Vec::new();
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        let excess = entries.len() - self.config.max_count;
        let mut removed = Vec::with_capacity(excess);
        for (_, path) in entries.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) => error!(path = %path.display(), error = %e, "cannot delete backup"),
            }
        }
        removed
    }

    /// Backups of `target`, oldest first.
    pub fn list(&self, target: &Path) -> StoreResult<Vec<BackupRecord>> {
        let stem = stem_of(target)?;
        let dir = self.backup_dir(target);

        let mut records: Vec<BackupRecord> = self
            .backup_files(&dir)?
            .into_iter()
            .filter_map(|(created, path)| {
                let timestamp = self.stamp_of(&path, &stem)?.to_string();
                Some(BackupRecord {
                    timestamp,
                    created,
                    path,
                })
            })
            .collect();
        records.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.path.cmp(&b.path)));
        Ok(records)
    }

    fn file_name(&self, stem: &str, timestamp: &str) -> String {
        format!("{stem}_{timestamp}{}", self.tail())
    }

    fn tail(&self) -> String {
        format!("{}{}", self.config.suffix, self.config.extension)
    }

    fn format_stamp(&self, time: NaiveDateTime) -> StoreResult<String> {
        let mut stamp = String::new();
        write!(stamp, "{}", time.format(&self.config.timestamp_format))
            .map_err(|_| StoreError::TimestampFormat(self.config.timestamp_format.clone()))?;
        Ok(stamp)
    }

    /// The stamp of a backup of `stem`, if `path` is one.
    ///
    /// The part between `{stem}_` and the tail must parse with the
    /// timestamp format, so `APanel_OldPanel_...` is not taken for a backup
    /// of `APanel`.
    fn stamp_of<'p>(&self, path: &'p Path, stem: &str) -> Option<&'p str> {
        let name = path.file_name()?.to_str()?;
        let stamp = name
            .strip_prefix(stem)?
            .strip_prefix('_')?
            .strip_suffix(self.tail().as_str())?;
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, stamp, StrftimeItems::new(&self.config.timestamp_format))
            .ok()?;
        Some(stamp)
    }

    /// Latest parseable stamp among the backups of `stem`.
    fn latest_stamp(&self, dir: &Path, stem: &str) -> StoreResult<Option<NaiveDateTime>> {
        let latest = self
            .backup_files(dir)?
            .iter()
            .filter_map(|(_, path)| {
                let stamp = self.stamp_of(path, stem)?;
                NaiveDateTime::parse_from_str(stamp, &self.config.timestamp_format).ok()
            })
            .max();
        Ok(latest)
    }

    /// Every file in `dir` ending with suffix + extension.
    fn backup_files(&self, dir: &Path) -> StoreResult<Vec<(SystemTime, PathBuf)>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let tail = self.tail();
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&tail));
            if matches && path.is_file() {
                out.push((created_time(&path)?, path));
            }
        }
        Ok(out)
    }
}

fn stem_of(target: &Path) -> StoreResult<String> {
    target
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| StoreError::NoFileName(target.to_path_buf()))
}

fn created_time(path: &Path) -> StoreResult<SystemTime> {
    let meta = fs::metadata(path)?;
    Ok(meta.created().or_else(|_| meta.modified())?)
}
