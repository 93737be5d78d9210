//! # mailtally-core
//!
//! Deterministic email triage over local mail stores.
//!
//! This crate provides:
//! - Read-only, schema-adaptive readers for Apple Mail and Outlook for Mac
//! - Best-effort body previews from `.emlx` and Outlook message sources
//! - **Weighted signal scoring** - explainable `0..=100` scores
//! - **Classification** - ACTION / FYI / IGNORE bands
//! - **Calibration** - proposing trusted domains and thresholds from a batch
//!
//! # Example
//!
//! ```ignore
//! use mailtally_core::{MailReader, MailRoots, TriageConfig, Triage};
//!
//! let config = TriageConfig::load(&TriageConfig::default_path()).await?;
//! let reader = MailReader::open(config.backend, config.database_path.as_deref(), &MailRoots::default()).await?;
//! let triage = Triage::new(config.scorer()?, config.classifier()?);
//! for message in triage.run(&reader, &config.query, config.extract_previews).await? {
//!     println!("{} {}", message.category, message.record.subject);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod calibrate;
pub mod classify;
pub mod config;
mod error;
pub mod pipeline;
pub mod preview;
pub mod record;
pub mod scoring;
pub mod store;

pub use calibrate::{CalibrationReport, CalibrationStats, calibrate};
pub use classify::{Category, Classifier, Thresholds};
pub use config::TriageConfig;
pub use error::{Error, FULL_DISK_ACCESS_HINT, Result};
pub use pipeline::{Triage, TriageSummary, TriagedMessage};
pub use record::{BodySource, ContainerFormat, MessageFilter, MessageRecord};
pub use scoring::{ScoreResult, Scorer, ScorerConfig, Signal};
pub use store::{Backend, BackendChoice, IndexReader, MailReader, MailRoots};
