use std::path::PathBuf;

/// Errors from backup, commit and hand-off storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A path that must name a file has no file name component.
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    /// The backup timestamp format cannot be rendered.
    #[error("invalid backup timestamp format {0:?}")]
    TimestampFormat(String),

    /// No free backup name could be found.
    #[error("backup name space exhausted for {0}")]
    BackupNameExhausted(PathBuf),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
