//! Discovery of mail store files under the user's home directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::Backend;
use super::connection::permission_denied;
use crate::error::{Error, Result};

/// Apple Mail database file name inside `V<N>/MailData`.
pub const ENVELOPE_INDEX: &str = "Envelope Index";

const OUTLOOK_PROFILE: &str =
    "Library/Group Containers/UBF8T346G9.Office/Outlook/Outlook 15 Profiles/Main Profile";

/// Root directories the stores are discovered under.
///
/// Defaults to the real home directory; tests point it at a temp dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailRoots {
    /// The user's home directory.
    pub home: PathBuf,
}

/// A located Apple Mail store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleMailLocation {
    /// The `Envelope Index` database.
    pub database: PathBuf,
    /// The `V<N>` directory holding account folders and `.emlx` files.
    pub version_dir: PathBuf,
}

impl AppleMailLocation {
    /// Location for an explicit database path.
    #[must_use]
    pub fn from_database(database: PathBuf) -> Self {
        let version_dir = database
            .parent()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            database,
            version_dir,
        }
    }
}

/// A located Outlook store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlookLocation {
    /// The `Outlook.sqlite` database.
    pub database: PathBuf,
    /// The profile `Data` directory that `PathToDataFile` is relative to.
    pub data_dir: PathBuf,
}

impl OutlookLocation {
    /// Location for an explicit database path.
    #[must_use]
    pub fn from_database(database: PathBuf) -> Self {
        let parent = database
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let data_dir = if parent.file_name().is_some_and(|n| n == "Data") {
            parent
        } else {
            parent.join("Data")
        };
        Self { database, data_dir }
    }
}

impl Default for MailRoots {
    fn default() -> Self {
        Self {
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

impl MailRoots {
    /// Roots under an explicit home directory.
    #[must_use]
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `~/Library/Mail`.
    #[must_use]
    pub fn apple_mail_dir(&self) -> PathBuf {
        self.home.join("Library").join("Mail")
    }

    /// Outlook database candidates in priority order.
    #[must_use]
    pub fn outlook_candidates(&self) -> [PathBuf; 2] {
        let profile = self.home.join(OUTLOOK_PROFILE);
        [
            profile.join("Data").join("Outlook.sqlite"),
            profile.join("Outlook.sqlite"),
        ]
    }

    /// Finds the `Envelope Index` in the highest-numbered `V<N>` directory
    /// that has one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the mail directory cannot be
    /// listed, or [`Error::NotFound`] if no version directory has a database.
    pub fn find_apple_mail(&self) -> Result<AppleMailLocation> {
        let mail_dir = self.apple_mail_dir();
        let entries = match std::fs::read_dir(&mail_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(permission_denied(&mail_dir));
            }
            Err(e) => {
                debug!("Cannot list {}: {e}", mail_dir.display());
                return Err(Error::NotFound {
                    backend: Backend::AppleMail,
                    path: mail_dir,
                });
            }
        };

        let best = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                let version = parse_version(&entry.file_name().to_string_lossy())?;
                let database = entry.path().join("MailData").join(ENVELOPE_INDEX);
                database.is_file().then_some((version, entry.path(), database))
            })
            .max_by_key(|(version, _, _)| *version);

        best.map(|(version, version_dir, database)| {
            debug!("Using Apple Mail store V{version}");
            AppleMailLocation {
                database,
                version_dir,
            }
        })
        .ok_or_else(|| Error::NotFound {
            backend: Backend::AppleMail,
            path: mail_dir,
        })
    }

    /// Finds the first Outlook database candidate that exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the primary candidate if neither exists.
    pub fn find_outlook(&self) -> Result<OutlookLocation> {
        let [primary, fallback] = self.outlook_candidates();
        if primary.exists() {
            return Ok(OutlookLocation::from_database(primary));
        }
        if fallback.exists() {
            return Ok(OutlookLocation::from_database(fallback));
        }
        Err(Error::NotFound {
            backend: Backend::Outlook,
            path: primary,
        })
    }
}

/// `V10` → `10`; anything else is not a version directory.
fn parse_version(name: &str) -> Option<u32> {
    name.strip_prefix('V')?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("V10"), Some(10));
        assert_eq!(parse_version("V2"), Some(2));
        assert_eq!(parse_version("Vx"), None);
        assert_eq!(parse_version("MailData"), None);
    }

    #[test]
    fn test_highest_numeric_version_wins() {
        let home = tempfile::tempdir().unwrap();
        let roots = MailRoots::new(home.path());
        let mail = roots.apple_mail_dir();
        touch(&mail.join("V9/MailData/Envelope Index"));
        touch(&mail.join("V10/MailData/Envelope Index"));
        // Highest version, but no database inside.
        std::fs::create_dir_all(mail.join("V11/MailData")).unwrap();

        let location = roots.find_apple_mail().unwrap();
        assert_eq!(location.version_dir, mail.join("V10"));
        assert_eq!(location.database, mail.join("V10/MailData/Envelope Index"));
    }

    #[test]
    fn test_missing_mail_dir_is_not_found() {
        let home = tempfile::tempdir().unwrap();
        let err = MailRoots::new(home.path()).find_apple_mail().unwrap_err();
        assert!(matches!(err, Error::NotFound { backend: Backend::AppleMail, .. }));
    }

    #[test]
    fn test_outlook_candidate_order() {
        let home = tempfile::tempdir().unwrap();
        let roots = MailRoots::new(home.path());
        let [primary, fallback] = roots.outlook_candidates();

        assert!(roots.find_outlook().is_err());

        touch(&fallback);
        let location = roots.find_outlook().unwrap();
        assert_eq!(location.database, fallback);
        assert_eq!(location.data_dir, primary.parent().unwrap());

        touch(&primary);
        assert_eq!(roots.find_outlook().unwrap().database, primary);
    }

    #[test]
    fn test_explicit_apple_mail_path() {
        let location =
            AppleMailLocation::from_database(PathBuf::from("/x/Mail/V10/MailData/Envelope Index"));
        assert_eq!(location.version_dir, PathBuf::from("/x/Mail/V10"));
    }
}
