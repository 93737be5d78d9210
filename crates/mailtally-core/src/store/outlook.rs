//! Outlook for Mac `Outlook.sqlite` reader.
//!
//! Message rows embed sender, subject, preview and timestamps directly.
//! Folder names and account addresses need joins against `Folders` and
//! `AccountsMail`. Timestamps are seconds since the Core Data reference date.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use tracing::{debug, warn};

use super::connection::{open_read_only, release};
use super::locate::OutlookLocation;
use super::schema::{ColumnSet, columns, quote_ident, table_name};
use super::{Backend, Bind, IndexReader, fetch_rows, text_column};
use crate::error::{Error, Result};
use crate::record::{BodySource, ContainerFormat, MessageFilter, MessageRecord, like_pattern};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
pub const CORE_DATA_EPOCH_OFFSET: i64 = 978_307_200;

/// Message table.
pub const MAIL_TABLE: &str = "Mail";
/// Folder table.
pub const FOLDERS_TABLE: &str = "Folders";
/// Account table.
pub const ACCOUNTS_TABLE: &str = "AccountsMail";

/// Core Data seconds → Unix seconds.
#[must_use]
pub const fn core_data_to_unix(secs: i64) -> i64 {
    secs + CORE_DATA_EPOCH_OFFSET
}

/// Unix seconds → Core Data seconds.
#[must_use]
pub const fn unix_to_core_data(secs: i64) -> i64 {
    secs - CORE_DATA_EPOCH_OFFSET
}

/// `"Jane Doe <jane@x.com>"` → `jane@x.com`; anything else trimmed verbatim.
#[must_use]
pub fn normalize_sender(raw: &str) -> String {
    if let Some(start) = raw.find('<')
        && let Some(len) = raw[start + 1..].find('>')
    {
        let address = raw[start + 1..start + 1 + len].trim();
        if !address.is_empty() {
            return address.to_string();
        }
    }
    raw.trim().to_string()
}

/// What an `Outlook.sqlite` looks like, resolved once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlookSchema {
    /// Message table name.
    pub mail: String,
    /// Columns on the message table.
    pub mail_columns: ColumnSet,
    /// Folder table, when it can be joined.
    pub folders: Option<String>,
    /// Account table, when it can be joined through the folder table.
    pub accounts: Option<String>,
}

impl OutlookSchema {
    /// Discovers the schema; `None` when there is no `Mail` table.
    pub async fn discover(conn: &mut SqliteConnection) -> Option<Self> {
        let mail = table_name(conn, MAIL_TABLE).await?;
        let mail_columns = columns(conn, &mail).await;

        let folders = match table_name(conn, FOLDERS_TABLE).await {
            Some(table) if mail_columns.has("Record_FolderID") => {
                let cols = columns(conn, &table).await;
                (cols.has("Record_RecordID") && cols.has("Folder_Name")).then_some((table, cols))
            }
            _ => None,
        };

        let accounts = match (&folders, table_name(conn, ACCOUNTS_TABLE).await) {
            (Some((_, folder_cols)), Some(table)) if folder_cols.has("Record_AccountUID") => {
                let cols = columns(conn, &table).await;
                (cols.has("Record_RecordID") && cols.has("Account_EmailAddress")).then_some(table)
            }
            _ => None,
        };

        let folders = folders.map(|(table, _)| table);
        debug!("Outlook schema: mail={mail} folders={folders:?} accounts={accounts:?}");

        Some(Self {
            mail,
            mail_columns,
            folders,
            accounts,
        })
    }

    fn column(&self, name: &str, cast: &str) -> String {
        if self.mail_columns.has(name) {
            format!("CAST(m.{name} AS {cast})")
        } else {
            "NULL".to_string()
        }
    }

    /// Builds the message query and its bind values.
    #[must_use]
    pub fn message_query(&self, filter: &MessageFilter, now: DateTime<Utc>) -> (String, Vec<Bind>) {
        let folder = if self.folders.is_some() {
            "f.Folder_Name"
        } else {
            "NULL"
        };
        let account = if self.accounts.is_some() {
            "acct.Account_EmailAddress"
        } else {
            "NULL"
        };
        let id = if self.mail_columns.has("Record_RecordID") {
            "m.Record_RecordID"
        } else {
            "m.ROWID"
        };

        let mut sql = format!(
            "SELECT {id} AS id, {sender} AS sender, {subject} AS subject, \
             {received} AS received, {read} AS is_read, {preview} AS preview, \
             {data_file} AS data_file, {folder} AS folder, {account} AS account \
             FROM {table} m",
            sender = self.column("Message_SenderAddressList", "TEXT"),
            subject = self.column("Message_NormalizedSubject", "TEXT"),
            received = self.column("Message_TimeReceived", "INTEGER"),
            read = self.column("Message_ReadFlag", "INTEGER"),
            preview = self.column("Message_Preview", "TEXT"),
            data_file = self.column("PathToDataFile", "TEXT"),
            table = quote_ident(&self.mail),
        );

        if let Some(folders) = &self.folders {
            sql.push_str(&format!(
                " LEFT JOIN {} f ON m.Record_FolderID = f.Record_RecordID",
                quote_ident(folders)
            ));
        }
        if let Some(accounts) = &self.accounts {
            sql.push_str(&format!(
                " LEFT JOIN {} acct ON f.Record_AccountUID = acct.Record_RecordID",
                quote_ident(accounts)
            ));
        }

        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        let has_time = self.mail_columns.has("Message_TimeReceived");
        let has_sender = self.mail_columns.has("Message_SenderAddressList");

        if let Some(cutoff) = filter.cutoff(now) {
            if has_time {
                conditions.push("m.Message_TimeReceived >= ?".to_string());
                binds.push(Bind::Int(unix_to_core_data(cutoff)));
            } else {
                debug!("No Message_TimeReceived column; ignoring since_days");
            }
        }
        if filter.unread_only {
            if self.mail_columns.has("Message_ReadFlag") {
                conditions.push("COALESCE(m.Message_ReadFlag, 0) = 0".to_string());
            } else {
                debug!("No Message_ReadFlag column; ignoring unread_only");
            }
        }
        if let Some(value) = &filter.mailbox {
            if self.folders.is_some() {
                conditions.push("f.Folder_Name LIKE ?".to_string());
                binds.push(Bind::Text(like_pattern(value)));
            } else {
                debug!("No folder table; ignoring mailbox filter");
            }
        }
        if let Some(value) = &filter.account {
            let domain = value.split_once('@').map(|(_, d)| d.trim()).filter(|d| !d.is_empty());
            let mut branches = Vec::new();
            if self.accounts.is_some() {
                branches.push("acct.Account_EmailAddress LIKE ?");
                binds.push(Bind::Text(like_pattern(value)));
            }
            if has_sender {
                if let Some(domain) = domain {
                    branches.push("m.Message_SenderAddressList LIKE ?");
                    binds.push(Bind::Text(like_pattern(&format!("@{domain}"))));
                } else if self.accounts.is_none() {
                    branches.push("m.Message_SenderAddressList LIKE ?");
                    binds.push(Bind::Text(like_pattern(value)));
                }
            }
            if branches.is_empty() {
                debug!("Nothing to match the account filter against; ignoring it");
            } else {
                conditions.push(format!("({})", branches.join(" OR ")));
            }
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if has_time {
            sql.push_str(" ORDER BY m.Message_TimeReceived DESC");
        } else {
            sql.push_str(&format!(" ORDER BY {id} DESC"));
        }
        sql.push_str(" LIMIT ?");
        binds.push(Bind::Int(i64::from(filter.limit)));

        (sql, binds)
    }
}

/// Reader for Outlook for Mac's `Outlook.sqlite`.
#[derive(Debug, Clone)]
pub struct OutlookReader {
    location: OutlookLocation,
}

impl OutlookReader {
    /// Opens the store once to confirm it has a `Mail` table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file is missing or has no `Mail`
    /// table, [`Error::PermissionDenied`] if it cannot be read, or a database
    /// error if it is not an `SQLite` file.
    pub async fn open(location: OutlookLocation) -> Result<Self> {
        let mut conn = open_read_only(Backend::Outlook, &location.database).await?;
        let schema = OutlookSchema::discover(&mut conn).await;
        release(conn).await;

        if schema.is_none() {
            debug!("{} has no Mail table", location.database.display());
            return Err(Error::NotFound {
                backend: Backend::Outlook,
                path: location.database,
            });
        }
        Ok(Self { location })
    }

    /// The located store.
    #[must_use]
    pub const fn location(&self) -> &OutlookLocation {
        &self.location
    }

    async fn fetch(&self, conn: &mut SqliteConnection, filter: &MessageFilter) -> Vec<MessageRecord> {
        let Some(schema) = OutlookSchema::discover(conn).await else {
            warn!("Outlook database has no Mail table");
            return Vec::new();
        };

        let (sql, binds) = schema.message_query(filter, Utc::now());
        match fetch_rows(conn, &sql, binds).await {
            Ok(rows) => rows.iter().map(|row| self.row_to_record(row)).collect(),
            Err(e) => {
                warn!("Outlook query failed: {e}");
                Vec::new()
            }
        }
    }

    fn row_to_record(&self, row: &SqliteRow) -> MessageRecord {
        let body_source = text_column(row, "preview").map(BodySource::Inline).or_else(|| {
            text_column(row, "data_file").map(|relative| BodySource::File {
                path: self.location.data_dir.join(relative),
                format: ContainerFormat::OutlookSource,
            })
        });

        MessageRecord {
            id: row.try_get::<i64, _>("id").unwrap_or_default(),
            sender: text_column(row, "sender")
                .map(|raw| normalize_sender(&raw))
                .unwrap_or_default(),
            subject: text_column(row, "subject").unwrap_or_default(),
            received_at: row
                .try_get::<Option<i64>, _>("received")
                .ok()
                .flatten()
                .and_then(|secs| DateTime::from_timestamp(core_data_to_unix(secs), 0)),
            read: row
                .try_get::<Option<i64>, _>("is_read")
                .ok()
                .flatten()
                .is_some_and(|flag| flag != 0),
            mailbox: text_column(row, "folder"),
            account_hint: text_column(row, "account"),
            body_source,
        }
    }

    async fn list_column(
        conn: &mut SqliteConnection,
        table: Option<&str>,
        column: &str,
    ) -> Vec<String> {
        let Some(table) = table else {
            return Vec::new();
        };
        let sql = format!(
            "SELECT DISTINCT {column} AS value FROM {} \
             WHERE {column} IS NOT NULL AND {column} != '' ORDER BY {column}",
            quote_ident(table)
        );
        match fetch_rows(conn, &sql, Vec::new()).await {
            Ok(rows) => rows.iter().filter_map(|r| text_column(r, "value")).collect(),
            Err(e) => {
                warn!("Listing {table}.{column} failed: {e}");
                Vec::new()
            }
        }
    }
}

impl IndexReader for OutlookReader {
    fn backend(&self) -> Backend {
        Backend::Outlook
    }

    async fn query(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        let mut conn = open_read_only(Backend::Outlook, &self.location.database).await?;
        let records = self.fetch(&mut conn, filter).await;
        release(conn).await;
        Ok(records)
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        let mut conn = open_read_only(Backend::Outlook, &self.location.database).await?;
        let table = table_name(&mut conn, ACCOUNTS_TABLE).await;
        let accounts =
            Self::list_column(&mut conn, table.as_deref(), "Account_EmailAddress").await;
        release(conn).await;
        Ok(accounts)
    }

    async fn mailboxes(&self) -> Result<Vec<String>> {
        let mut conn = open_read_only(Backend::Outlook, &self.location.database).await?;
        let table = table_name(&mut conn, FOLDERS_TABLE).await;
        let folders = Self::list_column(&mut conn, table.as_deref(), "Folder_Name").await;
        release(conn).await;
        Ok(folders)
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::testing::{outlook_fixture, outlook_no_accounts_fixture};

    #[test]
    fn test_normalize_sender() {
        assert_eq!(normalize_sender("Jane Doe <jane@corp.com>"), "jane@corp.com");
        assert_eq!(normalize_sender("  plain@corp.com "), "plain@corp.com");
        assert_eq!(normalize_sender("Broken <"), "Broken <");
        assert_eq!(normalize_sender("Empty <>"), "Empty <>");
    }

    #[test]
    fn test_epoch_conversion() {
        assert_eq!(core_data_to_unix(0), 978_307_200);
        assert_eq!(unix_to_core_data(core_data_to_unix(12_345)), 12_345);
    }

    #[tokio::test]
    async fn test_query_normalizes_rows() {
        let fixture = outlook_fixture().await;
        let reader = OutlookReader::open(fixture.location()).await.unwrap();

        let records = reader.query(&MessageFilter::new()).await.unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.sender, "boss@corp.example");
        assert_eq!(first.mailbox.as_deref(), Some("Inbox"));
        assert_eq!(first.account_hint.as_deref(), Some("me@corp.example"));
        assert_eq!(
            first.body_source,
            Some(BodySource::Inline("Please confirm the budget".into()))
        );
        // Stored on the Core Data epoch, returned on the Unix epoch.
        assert!(first.received_at.unwrap() > DateTime::from_timestamp(CORE_DATA_EPOCH_OFFSET, 0).unwrap());

        let file_backed = records.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(
            file_backed.body_source,
            Some(BodySource::File {
                path: fixture.location().data_dir.join("Message Sources/2.olk15MsgSource"),
                format: ContainerFormat::OutlookSource,
            })
        );
    }

    #[tokio::test]
    async fn test_since_days_uses_core_data_epoch() {
        let fixture = outlook_fixture().await;
        let reader = OutlookReader::open(fixture.location()).await.unwrap();

        let recent = reader.query(&MessageFilter::new().since_days(3)).await.unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn test_account_filter_matches_address_or_sender_domain() {
        let fixture = outlook_fixture().await;
        let reader = OutlookReader::open(fixture.location()).await.unwrap();

        // Two messages live in the corp account; one more is from a corp sender
        // but filed under the personal account.
        let corp = reader
            .query(&MessageFilter::new().account("me@corp.example"))
            .await
            .unwrap();
        assert_eq!(corp.len(), 3);

        let personal = reader
            .query(&MessageFilter::new().account("me@home.example"))
            .await
            .unwrap();
        assert_eq!(personal.len(), 1);
    }

    #[tokio::test]
    async fn test_without_accounts_table_uses_sender_domain() {
        let fixture = outlook_no_accounts_fixture().await;
        let reader = OutlookReader::open(fixture.location()).await.unwrap();

        let records = reader
            .query(&MessageFilter::new().account("someone@corp.example"))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].account_hint.is_none());
        assert!(reader.accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accounts_and_mailboxes() {
        let fixture = outlook_fixture().await;
        let reader = OutlookReader::open(fixture.location()).await.unwrap();

        assert_eq!(
            reader.accounts().await.unwrap(),
            vec!["me@corp.example", "me@home.example"]
        );
        assert_eq!(reader.mailboxes().await.unwrap(), vec!["Archive", "Inbox"]);
    }
}
