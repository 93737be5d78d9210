//! Read-only connections to mail store databases.

use std::io::ErrorKind;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

use super::Backend;
use crate::error::{Error, FULL_DISK_ACCESS_HINT, Result};

/// Opens `path` in `SQLite` read-only mode.
///
/// The file is opened once through the filesystem first so that a missing
/// file and an unreadable one are reported distinctly.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file does not exist,
/// [`Error::PermissionDenied`] if it cannot be read, or a database error if
/// `SQLite` rejects it.
pub async fn open_read_only(backend: Backend, path: &Path) -> Result<SqliteConnection> {
    check_readable(backend, path)?;

    let conn = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
        .connect()
        .await?;

    debug!("Opened {backend} database read-only: {}", path.display());
    Ok(conn)
}

/// Closes a connection, logging instead of failing.
pub async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        debug!("Error closing mail database: {e}");
    }
}

fn check_readable(backend: Backend, path: &Path) -> Result<()> {
    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound {
            backend,
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(permission_denied(path)),
        Err(e) => Err(e.into()),
    }
}

/// Builds the permission error with remediation text.
pub(crate) fn permission_denied(path: &Path) -> Error {
    Error::PermissionDenied {
        path: path.to_path_buf(),
        hint: FULL_DISK_ACCESS_HINT.to_string(),
    }
}
