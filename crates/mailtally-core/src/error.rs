//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::Backend;

/// Remediation shown when the mail store cannot be read.
pub const FULL_DISK_ACCESS_HINT: &str = "Grant Full Disk Access to your terminal in \
     System Settings > Privacy & Security > Full Disk Access, then restart it";

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No mail store exists where the backend looked.
    #[error("{backend} database not found at {}", path.display())]
    NotFound {
        /// Backend that was probed.
        backend: Backend,
        /// Last path that was tried.
        path: PathBuf,
    },

    /// The mail store exists but cannot be opened.
    #[error("Permission denied reading {}: {hint}", path.display())]
    PermissionDenied {
        /// Path that could not be read.
        path: PathBuf,
        /// What the user can do about it.
        hint: String,
    },

    /// Auto-detection found neither backend.
    #[error(
        "No mail backend found: neither Apple Mail nor Outlook data is present. \
         Set `database_path` in the config or choose a backend explicitly"
    )]
    NoBackend,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Whether auto-detection may move on to another backend after this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::PermissionDenied { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
