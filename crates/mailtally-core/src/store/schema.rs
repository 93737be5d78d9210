//! Schema discovery over vendor-controlled `SQLite` files.
//!
//! Every probe here is a metadata query (`sqlite_master`, `pragma_table_info`)
//! and every probe degrades to "absent" on failure. Nothing in this module
//! returns an error.

use std::collections::BTreeSet;

use sqlx::Row;
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

/// Columns present on one table, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    names: BTreeSet<String>,
}

impl ColumnSet {
    /// Whether the table has `column`.
    #[must_use]
    pub fn has(&self, column: &str) -> bool {
        self.names.contains(&column.to_lowercase())
    }

    /// Whether no column was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }
}

/// Returns the stored name of the first candidate table that exists.
pub async fn first_table(conn: &mut SqliteConnection, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        if let Some(name) = table_name(conn, candidate).await {
            return Some(name);
        }
    }
    None
}

/// Returns the stored name of `table` if it exists (case-insensitive).
pub async fn table_name(conn: &mut SqliteConnection, table: &str) -> Option<String> {
    let result = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
    )
    .bind(table)
    .fetch_optional(&mut *conn)
    .await;

    match result {
        Ok(row) => row.and_then(|r| r.try_get::<String, _>("name").ok()),
        Err(e) => {
            debug!("Table probe for {table} failed: {e}");
            None
        }
    }
}

/// Lists the columns of `table`; empty when the table is missing.
pub async fn columns(conn: &mut SqliteConnection, table: &str) -> ColumnSet {
    let result = sqlx::query("SELECT name FROM pragma_table_info(?1)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await;

    match result {
        Ok(rows) => rows
            .iter()
            .filter_map(|r| r.try_get::<String, _>("name").ok())
            .collect(),
        Err(e) => {
            debug!("Column probe for {table} failed: {e}");
            ColumnSet::default()
        }
    }
}

/// Lists every table that has a column named exactly `column`.
pub async fn tables_with_column(conn: &mut SqliteConnection, column: &str) -> Vec<String> {
    let result = sqlx::query(
        "SELECT m.name AS name FROM sqlite_master m, pragma_table_info(m.name) p \
         WHERE m.type = 'table' AND p.name = ?1 COLLATE NOCASE ORDER BY m.name",
    )
    .bind(column)
    .fetch_all(&mut *conn)
    .await;

    match result {
        Ok(rows) => rows
            .iter()
            .filter_map(|r| r.try_get::<String, _>("name").ok())
            .collect(),
        Err(e) => {
            debug!("Scan for `{column}` columns failed: {e}");
            Vec::new()
        }
    }
}

/// Quotes an identifier for interpolation into SQL.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sqlx::Connection;

    async fn memory_db() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE Messages (ROWID INTEGER PRIMARY KEY, Sender INTEGER, account TEXT)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE subjects (ROWID INTEGER PRIMARY KEY, subject TEXT)")
            .execute(&mut conn)
            .await
            .unwrap();
        conn
    }

    #[tokio::test]
    async fn test_first_table_respects_priority_and_case() {
        let mut conn = memory_db().await;
        assert_eq!(
            first_table(&mut conn, &["mail", "messages", "message"]).await,
            Some("Messages".to_string())
        );
        assert_eq!(first_table(&mut conn, &["addresses", "address"]).await, None);
    }

    #[tokio::test]
    async fn test_columns() {
        let mut conn = memory_db().await;
        let cols = columns(&mut conn, "Messages").await;
        assert!(cols.has("sender"));
        assert!(cols.has("ROWID"));
        assert!(!cols.has("date_received"));
        assert!(columns(&mut conn, "missing").await.is_empty());
    }

    #[tokio::test]
    async fn test_tables_with_column() {
        let mut conn = memory_db().await;
        assert_eq!(tables_with_column(&mut conn, "account").await, vec!["Messages"]);
        assert!(tables_with_column(&mut conn, "nothing_here").await.is_empty());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("mail"), "\"mail\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
