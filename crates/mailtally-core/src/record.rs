//! Normalized message records and query filters.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Default number of messages returned by a query.
pub const DEFAULT_LIMIT: u32 = 50;

/// On-disk container wrapping a raw RFC 822 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Apple Mail `.emlx`: byte-count line, message, trailing plist.
    Emlx,
    /// Outlook message source: binary framing before the headers.
    OutlookSource,
}

/// Where a message body can be read from, lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// A file holding the full message.
    File {
        /// Path to the file.
        path: PathBuf,
        /// How the message is wrapped inside the file.
        format: ContainerFormat,
    },
    /// Plain text stored alongside the message row.
    Inline(String),
}

/// One mail message as read from a local store.
///
/// Records are built per query and never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Backend-local identifier (ROWID / RecordID).
    pub id: i64,
    /// Raw sender address, possibly empty.
    pub sender: String,
    /// Raw subject, possibly empty.
    pub subject: String,
    /// Time received, normalized to the Unix epoch.
    pub received_at: Option<DateTime<Utc>>,
    /// Whether the message has been read.
    pub read: bool,
    /// Folder name or mailbox path.
    pub mailbox: Option<String>,
    /// Best-effort account association.
    pub account_hint: Option<String>,
    /// Where to read the body from for previews.
    pub body_source: Option<BodySource>,
}

impl MessageRecord {
    /// Creates a record with only the fields every backend can supply.
    #[must_use]
    pub fn new(id: i64, sender: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id,
            sender: sender.into(),
            subject: subject.into(),
            received_at: None,
            read: false,
            mailbox: None,
            account_hint: None,
            body_source: None,
        }
    }

    /// Lowercased domain part of the sender, if the address has one.
    #[must_use]
    pub fn sender_domain(&self) -> Option<String> {
        sender_domain(&self.sender)
    }
}

/// Lowercased text after the last `@`, or `None` when there is no domain.
#[must_use]
pub fn sender_domain(sender: &str) -> Option<String> {
    let (_, domain) = sender.rsplit_once('@')?;
    let domain = domain.trim().trim_end_matches('>').trim().to_lowercase();
    (!domain.is_empty()).then_some(domain)
}

/// Narrows a message query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MessageFilter {
    /// Maximum number of messages.
    pub limit: u32,
    /// Only messages received within this many days.
    pub since_days: Option<u32>,
    /// Only unread messages.
    pub unread_only: bool,
    /// Substring of the mailbox path or folder name.
    pub mailbox: Option<String>,
    /// Substring of the account identity.
    pub account: Option<String>,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            since_days: None,
            unread_only: false,
            mailbox: None,
            account: None,
        }
    }
}

impl MessageFilter {
    /// Creates a filter with the default limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of messages.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Restricts to messages received within `days` days.
    #[must_use]
    pub const fn since_days(mut self, days: u32) -> Self {
        self.since_days = Some(days);
        self
    }

    /// Restricts to unread messages.
    #[must_use]
    pub const fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    /// Restricts to mailboxes whose path contains `mailbox`.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = Some(mailbox.into());
        self
    }

    /// Restricts to the given account.
    #[must_use]
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Unix timestamp of the `since_days` cutoff relative to `now`.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<i64> {
        self.since_days
            .map(|days| now.timestamp() - i64::from(days) * 86_400)
    }
}

/// `%value%` pattern for a substring `LIKE` match.
pub(crate) fn like_pattern(value: &str) -> String {
    format!("%{value}%")
}
