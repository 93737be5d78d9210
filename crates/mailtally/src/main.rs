//! `mailtally` - Deterministic email triage for local mail stores
//!
//! Reads Apple Mail or Outlook for Mac data in place, scores each message and
//! prints one ledger line per message followed by a category summary.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod ledger;

use anyhow::Context;
use mailtally_core::{
    Error, IndexReader, MailReader, MailRoots, Triage, TriageConfig, TriageSummary, calibrate,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailtally=info,mailtally_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = TriageConfig::default_path();
    let config = TriageConfig::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let reader = match MailReader::open(
        config.backend,
        config.database_path.as_deref(),
        &MailRoots::default(),
    )
    .await
    {
        Ok(reader) => reader,
        Err(e @ (Error::PermissionDenied { .. } | Error::NoBackend)) => {
            anyhow::bail!("{e}");
        }
        Err(e) => return Err(e).context("Failed to open mail store"),
    };
    info!(
        "Reading {} at {}",
        reader.backend(),
        reader.database().display()
    );

    let triage = Triage::new(config.scorer()?, config.classifier()?);
    let messages = triage
        .run(&reader, &config.query, config.extract_previews)
        .await
        .context("Triage failed")?;

    for message in &messages {
        println!("{}", ledger::line(message));
    }
    println!("{}", ledger::summary(&TriageSummary::of(&messages)));
    for line in ledger::legend() {
        println!("{line}");
    }

    let records: Vec<_> = messages.into_iter().map(|m| m.record).collect();
    let report = calibrate(&records, triage.scorer(), triage.classifier());
    if report.is_empty() {
        debug!("Calibration has no suggestions");
    } else {
        info!(
            "Calibration suggests trusting [{}] and threshold adjustment {:?}",
            report.domains_to_add.join(", "),
            report.threshold_adjustment
        );
    }

    Ok(())
}
