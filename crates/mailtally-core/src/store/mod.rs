//! Read-only access to local mail stores.
//!
//! Two stores are supported:
//! - **Apple Mail**: `~/Library/Mail/V<N>/MailData/Envelope Index`
//! - **Outlook for Mac**: `Outlook.sqlite` in the Main Profile
//!
//! Both are vendor-owned `SQLite` files whose shape changes between releases.
//! Each reader discovers the schema it is facing and builds its query from
//! that, so missing tables or columns shrink the result instead of failing
//! it. Every call opens its own read-only connection and closes it before
//! returning.
//!
//! # Example
//!
//! ```ignore
//! use mailtally_core::store::{BackendChoice, IndexReader, MailReader, MailRoots};
//! use mailtally_core::MessageFilter;
//!
//! let reader = MailReader::open(BackendChoice::Auto, None, &MailRoots::default()).await?;
//! for record in reader.query(&MessageFilter::new().unread_only()).await? {
//!     println!("{} - {}", record.sender, record.subject);
//! }
//! ```

mod account;
mod apple_mail;
mod connection;
mod emlx;
mod locate;
mod outlook;
mod schema;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::path::Path;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{MessageFilter, MessageRecord};

pub use account::{ACCOUNT_STRATEGIES, AccountStrategy, account_from_path, accounts_from_paths};
pub use apple_mail::{AppleMailReader, AppleMailSchema};
pub use locate::{AppleMailLocation, MailRoots, OutlookLocation};
pub use outlook::{CORE_DATA_EPOCH_OFFSET, OutlookReader, OutlookSchema, normalize_sender};
pub use schema::ColumnSet;

/// A supported mail store format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Apple Mail `Envelope Index`.
    AppleMail,
    /// Outlook for Mac `Outlook.sqlite`.
    Outlook,
}

impl Backend {
    /// Parse from configuration string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "apple-mail" | "apple_mail" | "applemail" | "mail" => Some(Self::AppleMail),
            "outlook" => Some(Self::Outlook),
            _ => None,
        }
    }

    /// Convert to configuration string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AppleMail => "apple-mail",
            Self::Outlook => "outlook",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::AppleMail => "Apple Mail",
            Self::Outlook => "Outlook",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendChoice {
    /// Apple Mail first, then Outlook.
    #[default]
    Auto,
    /// Apple Mail only.
    AppleMail,
    /// Outlook only.
    Outlook,
}

/// Common contract of the per-backend readers.
///
/// Implementations acquire one read-only connection per call and release it
/// on every path before returning.
#[allow(async_fn_in_trait)]
pub trait IndexReader {
    /// Which store this reader is attached to.
    fn backend(&self) -> Backend;

    /// Messages matching `filter`, newest first.
    ///
    /// A query the store rejects yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database can no longer be opened.
    async fn query(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>>;

    /// Account identities known to the store.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database can no longer be opened.
    async fn accounts(&self) -> Result<Vec<String>>;

    /// Mailbox paths or folder names known to the store.
    ///
    /// # Errors
    ///
    /// Returns an error only if the database can no longer be opened.
    async fn mailboxes(&self) -> Result<Vec<String>>;
}

/// A reader for whichever backend was selected.
#[derive(Debug, Clone)]
pub enum MailReader {
    /// Apple Mail.
    AppleMail(AppleMailReader),
    /// Outlook for Mac.
    Outlook(OutlookReader),
}

impl MailReader {
    /// Selects and opens a backend.
    ///
    /// An explicit `choice` opens that backend only. `Auto` tries Apple Mail,
    /// then Outlook; a permission error stops the search immediately since the
    /// other store lives under the same protected directory. `database` overrides
    /// discovery for whichever backend is tried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::PermissionDenied`] for an
    /// explicit backend, [`Error::PermissionDenied`] or [`Error::NoBackend`]
    /// in auto mode.
    pub async fn open(
        choice: BackendChoice,
        database: Option<&Path>,
        roots: &MailRoots,
    ) -> Result<Self> {
        match choice {
            BackendChoice::AppleMail => Self::open_backend(Backend::AppleMail, database, roots).await,
            BackendChoice::Outlook => Self::open_backend(Backend::Outlook, database, roots).await,
            BackendChoice::Auto => {
                for backend in [Backend::AppleMail, Backend::Outlook] {
                    match Self::open_backend(backend, database, roots).await {
                        Ok(reader) => return Ok(reader),
                        Err(e) if e.is_retryable() => {
                            debug!("{backend} probe failed: {e}");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(Error::NoBackend)
            }
        }
    }

    async fn open_backend(
        backend: Backend,
        database: Option<&Path>,
        roots: &MailRoots,
    ) -> Result<Self> {
        let reader = match backend {
            Backend::AppleMail => {
                let location = match database {
                    Some(path) => AppleMailLocation::from_database(path.to_path_buf()),
                    None => roots.find_apple_mail()?,
                };
                Self::AppleMail(AppleMailReader::open(location).await?)
            }
            Backend::Outlook => {
                let location = match database {
                    Some(path) => OutlookLocation::from_database(path.to_path_buf()),
                    None => roots.find_outlook()?,
                };
                Self::Outlook(OutlookReader::open(location).await?)
            }
        };
        info!("Using {backend} store at {}", reader.database().display());
        Ok(reader)
    }

    /// Path of the open database.
    #[must_use]
    pub fn database(&self) -> &Path {
        match self {
            Self::AppleMail(reader) => &reader.location().database,
            Self::Outlook(reader) => &reader.location().database,
        }
    }
}

impl IndexReader for MailReader {
    fn backend(&self) -> Backend {
        match self {
            Self::AppleMail(reader) => reader.backend(),
            Self::Outlook(reader) => reader.backend(),
        }
    }

    async fn query(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        match self {
            Self::AppleMail(reader) => reader.query(filter).await,
            Self::Outlook(reader) => reader.query(filter).await,
        }
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        match self {
            Self::AppleMail(reader) => reader.accounts().await,
            Self::Outlook(reader) => reader.accounts().await,
        }
    }

    async fn mailboxes(&self) -> Result<Vec<String>> {
        match self {
            Self::AppleMail(reader) => reader.mailboxes().await,
            Self::Outlook(reader) => reader.mailboxes().await,
        }
    }
}

/// A bind value for a dynamically built query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    /// Integer parameter.
    Int(i64),
    /// Text parameter.
    Text(String),
}

/// Runs `sql` with positional `binds` and collects every row.
pub(crate) async fn fetch_rows(
    conn: &mut SqliteConnection,
    sql: &str,
    binds: Vec<Bind>,
) -> std::result::Result<Vec<SqliteRow>, sqlx::Error> {
    let mut query = sqlx::query(sql);
    for bind in binds {
        query = match bind {
            Bind::Int(value) => query.bind(value),
            Bind::Text(value) => query.bind(value),
        };
    }
    query.fetch_all(&mut *conn).await
}

/// Non-empty trimmed text column; absent, NULL and blank are all `None`.
pub(crate) fn text_column(row: &SqliteRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
