//! Score-to-category classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Triage tier of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Needs a response or decision.
    Action,
    /// Worth reading, nothing to do.
    Fyi,
    /// Bulk or automated mail.
    Ignore,
}

impl Category {
    /// All categories, most urgent first.
    pub const ALL: [Self; 3] = [Self::Action, Self::Fyi, Self::Ignore];

    /// Parse from the upper-case name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACTION" => Some(Self::Action),
            "FYI" => Some(Self::Fyi),
            "IGNORE" => Some(Self::Ignore),
            _ => None,
        }
    }

    /// Upper-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "ACTION",
            Self::Fyi => "FYI",
            Self::Ignore => "IGNORE",
        }
    }

    /// What belongs in this category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Action => "Requires your attention or a response",
            Self::Fyi => "Informational, read when convenient",
            Self::Ignore => "Bulk, automated or promotional mail",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Config(format!("Unknown category: {s}")))
    }
}

/// Lower bounds of the ACTION and FYI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Scores at or above this are ACTION.
    pub action: u8,
    /// Scores at or above this (and below `action`) are FYI.
    pub fyi: u8,
}

impl Thresholds {
    /// Default ACTION threshold.
    pub const DEFAULT_ACTION: u8 = 30;
    /// Default FYI threshold.
    pub const DEFAULT_FYI: u8 = 20;

    /// Creates validated thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless `action > fyi`.
    pub fn new(action: u8, fyi: u8) -> Result<Self> {
        Self { action, fyi }.validate()
    }

    /// Checks `action > fyi`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the bands overlap.
    pub fn validate(self) -> Result<Self> {
        if self.action > self.fyi {
            Ok(self)
        } else {
            Err(Error::Config(format!(
                "Action threshold ({}) must be greater than FYI threshold ({})",
                self.action, self.fyi
            )))
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            action: Self::DEFAULT_ACTION,
            fyi: Self::DEFAULT_FYI,
        }
    }
}

/// Maps scores to categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    /// Creates a classifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the thresholds are invalid.
    pub fn new(thresholds: Thresholds) -> Result<Self> {
        Ok(Self {
            thresholds: thresholds.validate()?,
        })
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Category for `score`.
    #[must_use]
    pub const fn classify(&self, score: u8) -> Category {
        if score >= self.thresholds.action {
            Category::Action
        } else if score >= self.thresholds.fyi {
            Category::Fyi
        } else {
            Category::Ignore
        }
    }

    /// Category for `score` plus the comparison that decided it.
    #[must_use]
    pub fn classify_with_explanation(&self, score: u8) -> (Category, String) {
        let Thresholds { action, fyi } = self.thresholds;
        let category = self.classify(score);
        let justification = match category {
            Category::Action => format!("Score {score} >= {action} (requires attention)"),
            Category::Fyi => format!(
                "Score {score} between {fyi}-{} (informational)",
                action - 1
            ),
            Category::Ignore => format!("Score {score} < {fyi} (bulk/automated)"),
        };
        (category, justification)
    }
}
