use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReclaimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access denied: {0}")]
    Access(PathBuf),

    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Relocation of {path} failed: {message}")]
    Relocation { path: PathBuf, message: String },

    #[error("Restore of {path} failed: {message}")]
    Restore { path: PathBuf, message: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Confirmation required before removing {path} ({tier})")]
    ConfirmationRequired { path: PathBuf, tier: String },

    #[error("A {0} scan is already running")]
    ScanInProgress(String),

    #[error("Cannot resolve {raw}: {reason}")]
    Unresolved { raw: String, reason: String },

    #[error("User input error: {0}")]
    UserInput(String),
}

impl ReclaimError {
    /// Maps an IO error on `path` onto the access/not-found taxonomy where possible.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ReclaimError::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => ReclaimError::Access(path.into()),
            _ => ReclaimError::Io(err),
        }
    }
}

impl From<dialoguer::Error> for ReclaimError {
    fn from(err: dialoguer::Error) -> Self {
        ReclaimError::UserInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReclaimError>;
