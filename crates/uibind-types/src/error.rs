use thiserror::Error;

/// Errors produced while loading configuration or validating names.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid class name {name:?}: {reason}")]
    InvalidClassName { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for type-level operations.
pub type TypesResult<T> = Result<T, TypesError>;
