//! Account resolution for stores without an explicit account column.
//!
//! Resolution is an ordered list of strategies; the first one that yields a
//! non-empty set wins and an empty set is a valid final answer.

use std::collections::BTreeSet;

use sqlx::Row;
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use super::schema::{quote_ident, tables_with_column};

/// One way of deriving account names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStrategy {
    /// First meaningful segment of each mailbox path.
    MailboxPathSegment,
    /// Distinct values of any column named `account`, in any table.
    AccountColumnScan,
}

/// Strategies in the order they are tried.
pub const ACCOUNT_STRATEGIES: [AccountStrategy; 2] = [
    AccountStrategy::MailboxPathSegment,
    AccountStrategy::AccountColumnScan,
];

impl AccountStrategy {
    /// Runs this strategy. Never fails; no result is an empty list.
    pub async fn resolve(self, conn: &mut SqliteConnection, mailbox_paths: &[String]) -> Vec<String> {
        match self {
            Self::MailboxPathSegment => accounts_from_paths(mailbox_paths.iter().map(String::as_str)),
            Self::AccountColumnScan => accounts_from_columns(conn).await,
        }
    }
}

/// Tries each strategy in order until one yields accounts.
pub async fn resolve_accounts(conn: &mut SqliteConnection, mailbox_paths: &[String]) -> Vec<String> {
    for strategy in ACCOUNT_STRATEGIES {
        let accounts = strategy.resolve(conn, mailbox_paths).await;
        if !accounts.is_empty() {
            debug!("Resolved {} accounts via {strategy:?}", accounts.len());
            return accounts;
        }
    }
    Vec::new()
}

/// Account segment of a mailbox path.
///
/// A leading `scheme://` is not a segment; empty and dot-prefixed segments
/// are skipped. `imap://ABC-123/INBOX` → `ABC-123`.
#[must_use]
pub fn account_from_path(path: &str) -> Option<String> {
    let rest = path.split_once("://").map_or(path, |(_, rest)| rest);
    rest.split(['/', '\\'])
        .map(str::trim)
        .find(|segment| !segment.is_empty() && !segment.starts_with('.'))
        .map(ToString::to_string)
}

/// Sorted, distinct account segments of `paths`.
pub fn accounts_from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    paths
        .into_iter()
        .filter_map(account_from_path)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

async fn accounts_from_columns(conn: &mut SqliteConnection) -> Vec<String> {
    let mut accounts = BTreeSet::new();

    for table in tables_with_column(conn, "account").await {
        let sql = format!(
            "SELECT DISTINCT CAST(account AS TEXT) AS account FROM {} \
             WHERE account IS NOT NULL AND account != ''",
            quote_ident(&table)
        );
        match sqlx::query(&sql).fetch_all(&mut *conn).await {
            Ok(rows) => accounts.extend(
                rows.iter()
                    .filter_map(|r| r.try_get::<String, _>("account").ok())
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty()),
            ),
            Err(e) => debug!("Reading accounts from {table} failed: {e}"),
        }
    }

    accounts.into_iter().collect()
}
