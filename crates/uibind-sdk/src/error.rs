use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid target {path}: {reason}")]
    InvalidTarget { path: PathBuf, reason: String },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Types(#[from] uibind_types::TypesError),

    #[error("store error: {0}")]
    Store(#[from] uibind_store::StoreError),
}

pub type SdkResult<T> = Result<T, SdkError>;
