//! Apple Mail `Envelope Index` reader.
//!
//! Message rows reference their sender, subject and mailbox through foreign
//! keys into lookup tables. Which of those tables exist varies across macOS
//! releases, so the query is assembled from whatever the schema discovery
//! found: a missing lookup table degrades to selecting the raw key.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use tracing::{debug, warn};

use super::account::{account_from_path, resolve_accounts};
use super::connection::{open_read_only, release};
use super::locate::AppleMailLocation;
use super::schema::{ColumnSet, columns, first_table, quote_ident};
use super::{Backend, Bind, IndexReader, fetch_rows, text_column};
use crate::error::{Error, Result};
use crate::record::{BodySource, ContainerFormat, MessageFilter, MessageRecord, like_pattern};

/// Candidate names for the message table, in priority order.
pub const MESSAGE_TABLES: &[&str] = &["messages", "message", "mail"];
/// Candidate names for the sender lookup table.
pub const ADDRESS_TABLES: &[&str] = &["addresses", "address"];
/// Candidate names for the subject lookup table.
pub const SUBJECT_TABLES: &[&str] = &["subjects", "subject"];
/// Candidate names for the mailbox table.
pub const MAILBOX_TABLES: &[&str] = &["mailboxes", "mailbox"];
/// A message table needs at least one of these to be read as an `Envelope Index`.
const ENVELOPE_COLUMNS: &[&str] = &["sender", "subject", "date_received"];

/// What an `Envelope Index` looks like, resolved once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleMailSchema {
    /// Message table name.
    pub messages: String,
    /// Columns on the message table.
    pub message_columns: ColumnSet,
    /// Sender lookup table, with an `address` column.
    pub addresses: Option<String>,
    /// Subject lookup table, with a `subject` column.
    pub subjects: Option<String>,
    /// Mailbox table, with a `url` column.
    pub mailboxes: Option<String>,
}

impl AppleMailSchema {
    /// Discovers the schema.
    ///
    /// `None` when there is no message table, or when the table found carries
    /// none of the envelope columns (Outlook's `Mail` table matches by name).
    pub async fn discover(conn: &mut SqliteConnection) -> Option<Self> {
        let messages = first_table(conn, MESSAGE_TABLES).await?;
        let message_columns = columns(conn, &messages).await;
        if !ENVELOPE_COLUMNS.iter().any(|c| message_columns.has(c)) {
            debug!("Table {messages} has no envelope columns; not an Envelope Index");
            return None;
        }

        let addresses = lookup_table(conn, ADDRESS_TABLES, "address").await;
        let subjects = lookup_table(conn, SUBJECT_TABLES, "subject").await;
        let mailboxes = lookup_table(conn, MAILBOX_TABLES, "url").await;

        debug!(
            "Envelope Index schema: messages={messages} addresses={addresses:?} \
             subjects={subjects:?} mailboxes={mailboxes:?}"
        );

        Some(Self {
            messages,
            message_columns,
            addresses,
            subjects,
            mailboxes,
        })
    }

    fn has(&self, column: &str) -> bool {
        self.message_columns.has(column)
    }

    /// Whether the message table carries its own account column.
    #[must_use]
    pub fn has_account_column(&self) -> bool {
        self.has("account")
    }

    fn sender_expr(&self) -> &'static str {
        match (self.has("sender"), self.addresses.is_some()) {
            (true, true) => "COALESCE(a.address, '')",
            (true, false) => "COALESCE(CAST(m.sender AS TEXT), '')",
            (false, _) => "''",
        }
    }

    fn subject_expr(&self) -> &'static str {
        match (self.has("subject"), self.subjects.is_some()) {
            (true, true) => "COALESCE(s.subject, '')",
            (true, false) => "COALESCE(CAST(m.subject AS TEXT), '')",
            (false, _) => "''",
        }
    }

    fn mailbox_expr(&self) -> &'static str {
        match (self.has("mailbox"), self.mailboxes.is_some()) {
            (true, true) => "COALESCE(mb.url, CAST(m.mailbox AS TEXT))",
            (true, false) => "CAST(m.mailbox AS TEXT)",
            (false, _) => "NULL",
        }
    }

    /// Whether mailbox keys resolve to path URLs through the mailbox table.
    ///
    /// Without it the only mailbox data is the raw key, which names neither
    /// a mailbox nor an account.
    #[must_use]
    pub fn resolves_mailbox_paths(&self) -> bool {
        self.has("mailbox") && self.mailboxes.is_some()
    }

    /// Builds the message query and its bind values.
    #[must_use]
    pub fn message_query(&self, filter: &MessageFilter, now: DateTime<Utc>) -> (String, Vec<Bind>) {
        let date = if self.has("date_received") {
            "CAST(m.date_received AS INTEGER)"
        } else {
            "NULL"
        };
        let read = if self.has("read") {
            "CAST(m.read AS INTEGER)"
        } else {
            "0"
        };
        let account = if self.has_account_column() {
            "CAST(m.account AS TEXT)"
        } else {
            "NULL"
        };
        let mailbox = self.mailbox_expr();
        let path = if self.resolves_mailbox_paths() {
            "mb.url"
        } else {
            "NULL"
        };

        let mut sql = format!(
            "SELECT m.ROWID AS id, {sender} AS sender, {subject} AS subject, \
             {date} AS date_received, {read} AS is_read, {mailbox} AS mailbox, \
             {path} AS mailbox_path, {account} AS account FROM {table} m",
            sender = self.sender_expr(),
            subject = self.subject_expr(),
            table = quote_ident(&self.messages),
        );

        if let Some(addresses) = self.addresses.as_deref().filter(|_| self.has("sender")) {
            sql.push_str(&format!(
                " LEFT JOIN {} a ON m.sender = a.ROWID",
                quote_ident(addresses)
            ));
        }
        if let Some(subjects) = self.subjects.as_deref().filter(|_| self.has("subject")) {
            sql.push_str(&format!(
                " LEFT JOIN {} s ON m.subject = s.ROWID",
                quote_ident(subjects)
            ));
        }
        if let Some(mailboxes) = self.mailboxes.as_deref().filter(|_| self.has("mailbox")) {
            sql.push_str(&format!(
                " LEFT JOIN {} mb ON m.mailbox = mb.ROWID",
                quote_ident(mailboxes)
            ));
        }

        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(cutoff) = filter.cutoff(now) {
            if self.has("date_received") {
                conditions.push("m.date_received >= ?".to_string());
                binds.push(Bind::Int(cutoff));
            } else {
                debug!("No date_received column; ignoring since_days");
            }
        }
        if filter.unread_only {
            if self.has("read") {
                conditions.push("m.read = 0".to_string());
            } else {
                debug!("No read column; ignoring unread_only");
            }
        }
        if let Some(value) = &filter.mailbox {
            if self.resolves_mailbox_paths() {
                conditions.push("mb.url LIKE ?".to_string());
                binds.push(Bind::Text(like_pattern(value)));
            } else {
                debug!("No mailbox table; ignoring mailbox filter");
            }
        }
        if let Some(value) = &filter.account {
            let mut branches = Vec::new();
            if self.resolves_mailbox_paths() {
                branches.push("mb.url LIKE ?");
                binds.push(Bind::Text(like_pattern(value)));
            }
            if self.has_account_column() {
                branches.push("m.account LIKE ?");
                binds.push(Bind::Text(like_pattern(value)));
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

        if self.has("date_received") {
            sql.push_str(" ORDER BY m.date_received DESC");
        } else {
            sql.push_str(" ORDER BY m.ROWID DESC");
        }
        sql.push_str(" LIMIT ?");
        binds.push(Bind::Int(i64::from(filter.limit)));

        (sql, binds)
    }

    fn mailbox_list_query(&self) -> String {
        match &self.mailboxes {
            Some(mailboxes) => format!(
                "SELECT DISTINCT url AS mailbox FROM {} WHERE url IS NOT NULL ORDER BY url",
                quote_ident(mailboxes)
            ),
            None if self.has("mailbox") => format!(
                "SELECT DISTINCT CAST(mailbox AS TEXT) AS mailbox FROM {} \
                 WHERE mailbox IS NOT NULL ORDER BY mailbox",
                quote_ident(&self.messages)
            ),
            None => "SELECT NULL AS mailbox WHERE 0".to_string(),
        }
    }
}

/// First candidate table that also has `column`.
async fn lookup_table(
    conn: &mut SqliteConnection,
    candidates: &[&str],
    column: &str,
) -> Option<String> {
    let table = first_table(conn, candidates).await?;
    if columns(conn, &table).await.has(column) {
        Some(table)
    } else {
        debug!("Table {table} has no {column} column; treating it as absent");
        None
    }
}

/// Reader for Apple Mail's `Envelope Index`.
#[derive(Debug, Clone)]
pub struct AppleMailReader {
    location: AppleMailLocation,
}

impl AppleMailReader {
    /// Opens the store once to confirm it has a message table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file is missing or has no message
    /// table, [`Error::PermissionDenied`] if it cannot be read, or a database
    /// error if it is not an `SQLite` file.
    pub async fn open(location: AppleMailLocation) -> Result<Self> {
        let mut conn = open_read_only(Backend::AppleMail, &location.database).await?;
        let schema = AppleMailSchema::discover(&mut conn).await;
        release(conn).await;

        if schema.is_none() {
            debug!("{} has no Envelope Index message table", location.database.display());
            return Err(Error::NotFound {
                backend: Backend::AppleMail,
                path: location.database,
            });
        }
        Ok(Self { location })
    }

    /// The located store.
    #[must_use]
    pub const fn location(&self) -> &AppleMailLocation {
        &self.location
    }

    async fn fetch(&self, conn: &mut SqliteConnection, filter: &MessageFilter) -> Vec<MessageRecord> {
        let Some(schema) = AppleMailSchema::discover(conn).await else {
            warn!("Envelope Index has no message table");
            return Vec::new();
        };

        let (sql, binds) = schema.message_query(filter, Utc::now());
        match fetch_rows(conn, &sql, binds).await {
            Ok(rows) => rows.iter().map(|row| self.row_to_record(row)).collect(),
            Err(e) => {
                warn!("Apple Mail query failed: {e}");
                Vec::new()
            }
        }
    }

    fn row_to_record(&self, row: &SqliteRow) -> MessageRecord {
        let id = row.try_get::<i64, _>("id").unwrap_or_default();
        let path = text_column(row, "mailbox_path");
        let account_hint =
            text_column(row, "account").or_else(|| path.as_deref().and_then(account_from_path));
        let body_source = path
            .as_deref()
            .and_then(|url| super::emlx::locate(&self.location.version_dir, url, id))
            .map(|path| BodySource::File {
                path,
                format: ContainerFormat::Emlx,
            });

        MessageRecord {
            id,
            sender: text_column(row, "sender").unwrap_or_default(),
            subject: text_column(row, "subject").unwrap_or_default(),
            received_at: row
                .try_get::<Option<i64>, _>("date_received")
                .ok()
                .flatten()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            read: row
                .try_get::<Option<i64>, _>("is_read")
                .ok()
                .flatten()
                .is_some_and(|flag| flag != 0),
            mailbox: text_column(row, "mailbox"),
            account_hint,
            body_source,
        }
    }

    async fn list_mailboxes(conn: &mut SqliteConnection, schema: &AppleMailSchema) -> Vec<String> {
        match fetch_rows(conn, &schema.mailbox_list_query(), Vec::new()).await {
            Ok(rows) => rows.iter().filter_map(|r| text_column(r, "mailbox")).collect(),
            Err(e) => {
                warn!("Listing Apple Mail mailboxes failed: {e}");
                Vec::new()
            }
        }
    }

    async fn list_accounts(conn: &mut SqliteConnection, schema: &AppleMailSchema) -> Vec<String> {
        if schema.has_account_column() {
            let sql = format!(
                "SELECT DISTINCT CAST(account AS TEXT) AS account FROM {} \
                 WHERE account IS NOT NULL AND account != '' ORDER BY account",
                quote_ident(&schema.messages)
            );
            match fetch_rows(conn, &sql, Vec::new()).await {
                Ok(rows) => return rows.iter().filter_map(|r| text_column(r, "account")).collect(),
                Err(e) => warn!("Reading account column failed: {e}"),
            }
        }

        let paths = if schema.resolves_mailbox_paths() {
            Self::list_mailboxes(conn, schema).await
        } else {
            Vec::new()
        };
        resolve_accounts(conn, &paths).await
    }
}

impl IndexReader for AppleMailReader {
    fn backend(&self) -> Backend {
        Backend::AppleMail
    }

    async fn query(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        let mut conn = open_read_only(Backend::AppleMail, &self.location.database).await?;
        let records = self.fetch(&mut conn, filter).await;
        release(conn).await;
        Ok(records)
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        let mut conn = open_read_only(Backend::AppleMail, &self.location.database).await?;
        let accounts = match AppleMailSchema::discover(&mut conn).await {
            Some(schema) => Self::list_accounts(&mut conn, &schema).await,
            None => Vec::new(),
        };
        release(conn).await;
        Ok(accounts)
    }

    async fn mailboxes(&self) -> Result<Vec<String>> {
        let mut conn = open_read_only(Backend::AppleMail, &self.location.database).await?;
        let mailboxes = match AppleMailSchema::discover(&mut conn).await {
            Some(schema) => Self::list_mailboxes(&mut conn, &schema).await,
            None => Vec::new(),
        };
        release(conn).await;
        Ok(mailboxes)
    }
}
