//! On-disk fixture stores for tests.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

use super::locate::{AppleMailLocation, MailRoots, OutlookLocation};
use super::outlook::CORE_DATA_EPOCH_OFFSET;

const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;

/// Raw message stored as `1.emlx` in the Apple Mail fixture.
pub const JANE_MESSAGE: &str = concat!(
    "From: Jane <jane@gmail.com>\n",
    "Subject: Can you review this by Friday?\n",
    "Content-Type: text/plain; charset=utf-8\n",
    "\n",
    "Hi,\n",
    "\n",
    "Could you please review the attached proposal and confirm by Friday?\n",
    "Thanks, Jane\n",
    "\n",
    "-- \n",
    "Jane Doe | Product\n",
);

/// Creates a database at `path` and runs `statements` against it.
pub async fn create_db(path: &Path, statements: &[&str]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

/// An Apple Mail store under a temporary home directory.
pub struct AppleMailFixture {
    home: TempDir,
}

impl AppleMailFixture {
    pub fn roots(&self) -> MailRoots {
        MailRoots::new(self.home.path())
    }

    pub fn version_dir(&self) -> PathBuf {
        self.roots().apple_mail_dir().join("V10")
    }

    pub fn location(&self) -> AppleMailLocation {
        AppleMailLocation {
            database: self.version_dir().join("MailData/Envelope Index"),
            version_dir: self.version_dir(),
        }
    }
}

/// Full schema: three messages across two accounts, one with an `.emlx`.
pub async fn apple_mail_fixture() -> AppleMailFixture {
    let fixture = AppleMailFixture {
        home: tempfile::tempdir().unwrap(),
    };
    let now = Utc::now().timestamp();

    let inserts = format!(
        "INSERT INTO messages (ROWID, sender, subject, date_received, mailbox, read) VALUES \
         (1, 1, 1, {}, 1, 0), (2, 2, 2, {}, 1, 1), (3, 3, 3, {}, 2, 0)",
        now - HOUR,
        now - 2 * DAY,
        now - 10 * DAY
    );
    create_db(
        &fixture.location().database,
        &[
            "CREATE TABLE messages (ROWID INTEGER PRIMARY KEY, sender INTEGER, subject INTEGER, \
             date_received INTEGER, mailbox INTEGER, read INTEGER)",
            "CREATE TABLE addresses (ROWID INTEGER PRIMARY KEY, address TEXT, comment TEXT)",
            "CREATE TABLE subjects (ROWID INTEGER PRIMARY KEY, subject TEXT)",
            "CREATE TABLE mailboxes (ROWID INTEGER PRIMARY KEY, url TEXT)",
            "INSERT INTO addresses VALUES (1, 'jane@gmail.com', 'Jane'), \
             (2, 'colleague@work.example', ''), (3, 'newsletter@promo.example.com', '')",
            "INSERT INTO subjects VALUES (1, 'Can you review this by Friday?'), \
             (2, 'Re: status'), (3, 'Weekly Digest: Top Stories')",
            "INSERT INTO mailboxes VALUES (1, 'imap://WORK-ACCT/INBOX'), (2, 'imap://HOME-ACCT/INBOX')",
            &inserts,
        ],
    )
    .await;

    let messages = fixture
        .version_dir()
        .join("WORK-ACCT/INBOX.mbox/0A1B2C3D-STORE/Data/Messages");
    std::fs::create_dir_all(&messages).unwrap();
    let emlx = format!(
        "{}\n{JANE_MESSAGE}<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\
         <dict><key>flags</key><integer>8590195713</integer></dict></plist>\n",
        JANE_MESSAGE.len()
    );
    std::fs::write(messages.join("1.emlx"), emlx).unwrap();

    fixture
}

/// Message table only: no lookups, no dates, no mailboxes.
pub async fn apple_mail_minimal_fixture() -> AppleMailFixture {
    let fixture = AppleMailFixture {
        home: tempfile::tempdir().unwrap(),
    };
    create_db(
        &fixture.location().database,
        &[
            "CREATE TABLE messages (ROWID INTEGER PRIMARY KEY, sender INTEGER, subject INTEGER)",
            "INSERT INTO messages VALUES (1, 12, 3), (2, 17, 4)",
        ],
    )
    .await;
    fixture
}

/// An Outlook store under a temporary home directory.
pub struct OutlookFixture {
    home: TempDir,
}

impl OutlookFixture {
    pub fn roots(&self) -> MailRoots {
        MailRoots::new(self.home.path())
    }

    pub fn location(&self) -> OutlookLocation {
        let [primary, _] = self.roots().outlook_candidates();
        OutlookLocation::from_database(primary)
    }
}

/// Core Data timestamp `ago` seconds before now.
fn core_data_ago(ago: i64) -> i64 {
    Utc::now().timestamp() - ago - CORE_DATA_EPOCH_OFFSET
}

/// Two accounts, three folders, three messages; one message body on disk.
pub async fn outlook_fixture() -> OutlookFixture {
    let fixture = OutlookFixture {
        home: tempfile::tempdir().unwrap(),
    };

    let inserts = format!(
        "INSERT INTO Mail VALUES \
         (1, 'Budget approval needed', 'Boss <boss@corp.example>', {}, 0, 'Please confirm the budget', 1, NULL), \
         (2, 'Weekly report', 'alerts@corp.example', {}, 1, NULL, 2, 'Message Sources/2.olk15MsgSource'), \
         (3, 'Lunch?', 'Pal <pal@corp.example>', {}, 0, 'Are you free on Thursday', 3, NULL)",
        core_data_ago(HOUR),
        core_data_ago(2 * DAY),
        core_data_ago(10 * DAY)
    );
    create_db(
        &fixture.location().database,
        &[
            "CREATE TABLE Mail (Record_RecordID INTEGER PRIMARY KEY, Message_NormalizedSubject TEXT, \
             Message_SenderAddressList TEXT, Message_TimeReceived REAL, Message_ReadFlag INTEGER, \
             Message_Preview TEXT, Record_FolderID INTEGER, PathToDataFile TEXT)",
            "CREATE TABLE Folders (Record_RecordID INTEGER PRIMARY KEY, Folder_Name TEXT, \
             Record_AccountUID INTEGER)",
            "CREATE TABLE AccountsMail (Record_RecordID INTEGER PRIMARY KEY, Account_EmailAddress TEXT)",
            "INSERT INTO AccountsMail VALUES (1, 'me@corp.example'), (2, 'me@home.example')",
            "INSERT INTO Folders VALUES (1, 'Inbox', 1), (2, 'Archive', 1), (3, 'Inbox', 2)",
            &inserts,
        ],
    )
    .await;

    let source = fixture
        .location()
        .data_dir
        .join("Message Sources/2.olk15MsgSource");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    let mut bytes = vec![0x00, 0x01, 0x4d, 0x53, 0x47, 0x00];
    bytes.extend_from_slice(
        b"From: alerts@corp.example\r\nSubject: Weekly report\r\n\r\n\
          This is an automated message. Your weekly report is ready.\r\n",
    );
    std::fs::write(source, bytes).unwrap();

    fixture
}

/// `Mail` and `Folders` only.
pub async fn outlook_no_accounts_fixture() -> OutlookFixture {
    let fixture = OutlookFixture {
        home: tempfile::tempdir().unwrap(),
    };
    create_db(
        &fixture.location().database,
        &[
            "CREATE TABLE Mail (Record_RecordID INTEGER PRIMARY KEY, Message_NormalizedSubject TEXT, \
             Message_SenderAddressList TEXT, Message_TimeReceived REAL, Record_FolderID INTEGER)",
            "CREATE TABLE Folders (Record_RecordID INTEGER PRIMARY KEY, Folder_Name TEXT, \
             Record_AccountUID INTEGER)",
            "INSERT INTO Folders VALUES (1, 'Inbox', 1)",
            "INSERT INTO Mail VALUES (1, 'Hello', 'x@corp.example', 100, 1), \
             (2, 'Hi', 'y@other.example', 200, 1)",
        ],
    )
    .await;
    fixture
}
