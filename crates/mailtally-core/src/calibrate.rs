//! Offline calibration of trusted domains and the ACTION threshold.
//!
//! Calibration looks at a batch of real messages and proposes a new
//! configuration. It never touches the scorer that produced the numbers;
//! callers apply the report to build a new [`ScorerConfig`] and
//! [`Thresholds`].

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::classify::{Category, Classifier, Thresholds};
use crate::record::MessageRecord;
use crate::scoring::{Scorer, ScorerConfig};

/// Most common sender domains considered for trust.
const CANDIDATE_DOMAINS: usize = 20;
/// Trusted domains proposed at most.
const MAX_DOMAINS_TO_ADD: usize = 10;
/// Share of all messages a domain needs, in percent.
const MIN_DOMAIN_SHARE: f64 = 2.0;
/// Below this ACTION share the threshold is lowered.
const LOW_ACTION_SHARE: f64 = 10.0;
/// Above this ACTION share the threshold is raised.
const HIGH_ACTION_SHARE: f64 = 40.0;
/// Threshold step.
const THRESHOLD_STEP: i32 = 10;
/// Bounds for a calibrated ACTION threshold.
const ACTION_THRESHOLD_RANGE: (i32, i32) = (30, 90);

/// Distribution of a scored batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CalibrationStats {
    /// Messages analyzed.
    pub total: usize,
    /// Mean score, rounded to one decimal.
    pub average_score: f64,
    /// ACTION share in percent, one decimal.
    pub action_pct: f64,
    /// FYI share in percent, one decimal.
    pub fyi_pct: f64,
    /// IGNORE share in percent, one decimal.
    pub ignore_pct: f64,
}

/// Proposed configuration changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// Frequent sender domains not yet trusted, most common first.
    pub domains_to_add: Vec<String>,
    /// Change to the ACTION threshold, if any.
    pub threshold_adjustment: Option<i32>,
    /// Batch statistics.
    pub stats: CalibrationStats,
}

impl CalibrationReport {
    /// Whether applying the report would change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains_to_add.is_empty() && self.threshold_adjustment.is_none()
    }

    /// Builds the calibrated configuration.
    ///
    /// The ACTION threshold moves by the adjustment, clamped to `30..=90` and
    /// kept above the FYI threshold.
    #[must_use]
    pub fn apply(&self, config: &ScorerConfig, thresholds: Thresholds) -> (ScorerConfig, Thresholds) {
        let config = config.clone().with_trusted_domains(&self.domains_to_add);

        let Some(adjustment) = self.threshold_adjustment else {
            return (config, thresholds);
        };
        let (low, high) = ACTION_THRESHOLD_RANGE;
        let action = (i32::from(thresholds.action) + adjustment)
            .clamp(low, high)
            .max(i32::from(thresholds.fyi) + 1);
        let action = u8::try_from(action).unwrap_or(u8::MAX);

        (
            config,
            Thresholds {
                action,
                fyi: thresholds.fyi,
            },
        )
    }
}

/// Scores `records` without previews and proposes changes.
#[must_use]
pub fn calibrate(
    records: &[MessageRecord],
    scorer: &Scorer,
    classifier: &Classifier,
) -> CalibrationReport {
    if records.is_empty() {
        debug!("Nothing to calibrate");
        return CalibrationReport::default();
    }

    let mut domain_counts: HashMap<String, usize> = HashMap::new();
    let mut score_sum = 0usize;
    let mut category_counts: HashMap<Category, usize> = HashMap::new();

    for record in records {
        if let Some(domain) = record.sender_domain() {
            *domain_counts.entry(domain).or_default() += 1;
        }
        let score = scorer.score(&record.sender, &record.subject, None);
        score_sum += usize::from(score.total);
        *category_counts
            .entry(classifier.classify(score.total))
            .or_default() += 1;
    }

    let total = records.len();
    let share = |category: Category| percent(category_counts.get(&category).copied().unwrap_or(0), total);
    let stats = CalibrationStats {
        total,
        average_score: round1(ratio(score_sum, total)),
        action_pct: round1(share(Category::Action)),
        fyi_pct: round1(share(Category::Fyi)),
        ignore_pct: round1(share(Category::Ignore)),
    };

    let action_share = share(Category::Action);
    let threshold_adjustment = if action_share < LOW_ACTION_SHARE {
        Some(-THRESHOLD_STEP)
    } else if action_share > HIGH_ACTION_SHARE {
        Some(THRESHOLD_STEP)
    } else {
        None
    };

    let mut ranked: Vec<(String, usize)> = domain_counts.into_iter().collect();
    ranked.sort_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.cmp(b)));
    let domains_to_add: Vec<String> = ranked
        .into_iter()
        .take(CANDIDATE_DOMAINS)
        .filter(|(domain, count)| {
            !scorer.config().is_trusted(domain) && percent(*count, total) >= MIN_DOMAIN_SHARE
        })
        .map(|(domain, _)| domain)
        .take(MAX_DOMAINS_TO_ADD)
        .collect();

    debug!(
        "Calibrated over {total} messages: {} domains, adjustment {:?}",
        domains_to_add.len(),
        threshold_adjustment
    );

    CalibrationReport {
        domains_to_add,
        threshold_adjustment,
        stats,
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    let as_f64 = |n: usize| f64::from(u32::try_from(n).unwrap_or(u32::MAX));
    as_f64(part) / as_f64(whole)
}

fn percent(part: usize, whole: usize) -> f64 {
    ratio(part, whole) * 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
