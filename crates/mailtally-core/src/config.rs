//! User configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{Classifier, Thresholds};
use crate::error::Result;
use crate::record::MessageFilter;
use crate::scoring::{DEFAULT_INFORMATIONAL_PENALTY, Scorer, ScorerConfig};
use crate::store::BackendChoice;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "MAILTALLY_CONFIG";

/// Everything a user can tune, as stored in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Use this database instead of discovering one.
    pub database_path: Option<PathBuf>,
    /// Which backend to read.
    pub backend: BackendChoice,
    /// Name to look for in message previews.
    pub user_name: Option<String>,
    /// Domains trusted in addition to the built-in list.
    pub extra_trusted_domains: Vec<String>,
    /// Category thresholds.
    pub thresholds: Thresholds,
    /// Points removed for urgent-sounding informational subjects.
    pub informational_penalty: u32,
    /// Read message files to build previews.
    pub extract_previews: bool,
    /// Default query.
    pub query: MessageFilter,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            backend: BackendChoice::Auto,
            user_name: None,
            extra_trusted_domains: Vec::new(),
            thresholds: Thresholds::default(),
            informational_penalty: DEFAULT_INFORMATIONAL_PENALTY,
            extract_previews: true,
            query: MessageFilter::default(),
        }
    }
}

impl TriageConfig {
    /// `$MAILTALLY_CONFIG`, else `<config dir>/mailtally/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailtally")
            .join("config.json")
    }

    /// Loads the config at `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        config.thresholds.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Writes the config as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Scorer configuration derived from this config.
    #[must_use]
    pub fn scorer_config(&self) -> ScorerConfig {
        let mut config = ScorerConfig::default()
            .with_trusted_domains(&self.extra_trusted_domains)
            .with_informational_penalty(self.informational_penalty);
        if let Some(name) = &self.user_name {
            config = config.with_user_name(name.as_str());
        }
        config
    }

    /// Builds the scorer.
    ///
    /// # Errors
    ///
    /// Returns an error if a phrase list cannot be compiled.
    pub fn scorer(&self) -> Result<Scorer> {
        Scorer::new(self.scorer_config())
    }

    /// Builds the classifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the thresholds overlap.
    pub fn classifier(&self) -> Result<Classifier> {
        Classifier::new(self.thresholds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TriageConfig::load(&dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(config, TriageConfig::default());
    }

    #[tokio::test]
    async fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "backend": "outlook",
                "user_name": "Jane",
                "extra_trusted_domains": ["corp.example"],
                "thresholds": { "action": 40 },
                "query": { "limit": 10, "unread_only": true }
            }"#,
        )
        .unwrap();

        let config = TriageConfig::load(&path).await.unwrap();
        assert_eq!(config.backend, BackendChoice::Outlook);
        assert_eq!(config.thresholds, Thresholds { action: 40, fyi: 20 });
        assert_eq!(config.query.limit, 10);
        assert!(config.query.unread_only);
        assert!(config.extract_previews);

        let scorer = config.scorer_config();
        assert!(scorer.is_trusted("corp.example"));
        assert_eq!(scorer.user_name.as_deref(), Some("Jane"));
    }

    #[tokio::test]
    async fn test_invalid_thresholds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "thresholds": { "action": 10, "fyi": 20 } }"#).unwrap();
        assert!(matches!(
            TriageConfig::load(&path).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            TriageConfig::load(&path).await,
            Err(Error::Serde(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = TriageConfig {
            informational_penalty: 5,
            extract_previews: false,
            ..TriageConfig::default()
        };
        config.save(&path).await.unwrap();
        assert_eq!(TriageConfig::load(&path).await.unwrap(), config);
    }
}
