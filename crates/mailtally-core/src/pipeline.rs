//! One triage batch: query, preview, score, classify.

use tracing::{debug, info};

use crate::classify::{Category, Classifier};
use crate::error::Result;
use crate::preview;
use crate::record::{BodySource, MessageFilter, MessageRecord};
use crate::scoring::{ScoreResult, Scorer};
use crate::store::IndexReader;

/// A message with its score and category.
#[derive(Debug, Clone)]
pub struct TriagedMessage {
    /// The message as read from the store.
    pub record: MessageRecord,
    /// Body preview used for scoring, if any.
    pub preview: Option<String>,
    /// Score and contributing signals.
    pub score: ScoreResult,
    /// Resulting category.
    pub category: Category,
    /// Why the score maps to the category.
    pub justification: String,
}

/// Message counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageSummary {
    /// ACTION messages.
    pub action: usize,
    /// FYI messages.
    pub fyi: usize,
    /// IGNORE messages.
    pub ignore: usize,
}

impl TriageSummary {
    /// Counts `messages` by category.
    #[must_use]
    pub fn of(messages: &[TriagedMessage]) -> Self {
        let mut summary = Self::default();
        for message in messages {
            summary.add(message.category);
        }
        summary
    }

    fn add(&mut self, category: Category) {
        match category {
            Category::Action => self.action += 1,
            Category::Fyi => self.fyi += 1,
            Category::Ignore => self.ignore += 1,
        }
    }

    /// Count for `category`.
    #[must_use]
    pub const fn count(&self, category: Category) -> usize {
        match category {
            Category::Action => self.action,
            Category::Fyi => self.fyi,
            Category::Ignore => self.ignore,
        }
    }

    /// All messages counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.action + self.fyi + self.ignore
    }
}

/// Scorer and classifier applied together.
#[derive(Debug, Clone)]
pub struct Triage {
    scorer: Scorer,
    classifier: Classifier,
}

impl Triage {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(scorer: Scorer, classifier: Classifier) -> Self {
        Self { scorer, classifier }
    }

    /// The scorer in use.
    #[must_use]
    pub const fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// The classifier in use.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Queries `reader` once and triages every returned message in order.
    ///
    /// Inline previews are always used. Message files are read only when
    /// `extract_previews` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub async fn run<R: IndexReader>(
        &self,
        reader: &R,
        filter: &MessageFilter,
        extract_previews: bool,
    ) -> Result<Vec<TriagedMessage>> {
        let records = reader.query(filter).await?;
        debug!(
            "Triaging {} messages from {}",
            records.len(),
            reader.backend()
        );

        let mut triaged = Vec::with_capacity(records.len());
        for record in records {
            let preview = match &record.body_source {
                Some(source @ BodySource::Inline(_)) => preview::extract(source).await,
                Some(source @ BodySource::File { .. }) if extract_previews => {
                    preview::extract(source).await
                }
                _ => None,
            };
            triaged.push(self.triage(record, preview));
        }

        let summary = TriageSummary::of(&triaged);
        info!(
            "Triaged {} messages: {} action, {} fyi, {} ignore",
            summary.total(),
            summary.action,
            summary.fyi,
            summary.ignore
        );
        Ok(triaged)
    }

    /// Scores and classifies one record.
    #[must_use]
    pub fn triage(&self, record: MessageRecord, preview: Option<String>) -> TriagedMessage {
        let score = self
            .scorer
            .score(&record.sender, &record.subject, preview.as_deref());
        let (category, justification) = self.classifier.classify_with_explanation(score.total);
        TriagedMessage {
            record,
            preview,
            score,
            category,
            justification,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::ContainerFormat;
    use crate::scoring::{ScorerConfig, Signal};
    use crate::store::Backend;
    use crate::store::testing::JANE_MESSAGE;

    struct FixedReader(Vec<MessageRecord>);

    impl IndexReader for FixedReader {
        fn backend(&self) -> Backend {
            Backend::Outlook
        }

        async fn query(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
            Ok(self
                .0
                .iter()
                .take(filter.limit as usize)
                .cloned()
                .collect())
        }

        async fn accounts(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn mailboxes(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn triage() -> Triage {
        Triage::new(
            Scorer::new(ScorerConfig::default()).unwrap(),
            Classifier::default(),
        )
    }

    #[tokio::test]
    async fn test_run_scores_and_classifies() {
        let mut jane = MessageRecord::new(1, "jane@gmail.com", "Can you review this by Friday?");
        jane.body_source = Some(BodySource::Inline(
            "Hi, could you please review the proposal?".into(),
        ));
        let newsletter =
            MessageRecord::new(2, "newsletter@promo.example.com", "Weekly Digest: Top Stories");
        let reader = FixedReader(vec![jane, newsletter]);

        let triaged = triage()
            .run(&reader, &MessageFilter::default(), false)
            .await
            .unwrap();

        assert_eq!(triaged.len(), 2);
        assert_eq!(triaged[0].category, Category::Action);
        assert!(triaged[0].score.has(Signal::ActionPhrase));
        assert_eq!(triaged[0].justification, "Score 65 >= 30 (requires attention)");
        assert_eq!(triaged[1].category, Category::Ignore);
        assert_eq!(triaged[1].score.total, 0);
        assert_eq!(
            TriageSummary::of(&triaged),
            TriageSummary {
                action: 1,
                fyi: 0,
                ignore: 1
            }
        );
    }

    #[tokio::test]
    async fn test_files_read_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.emlx");
        std::fs::write(&path, format!("{}\n{JANE_MESSAGE}", JANE_MESSAGE.len())).unwrap();

        let mut record = MessageRecord::new(1, "jane@gmail.com", "Proposal");
        record.body_source = Some(BodySource::File {
            path,
            format: ContainerFormat::Emlx,
        });
        let reader = FixedReader(vec![record]);
        let pipeline = triage();

        let without = pipeline
            .run(&reader, &MessageFilter::default(), false)
            .await
            .unwrap();
        assert!(without[0].preview.is_none());

        let with = pipeline
            .run(&reader, &MessageFilter::default(), true)
            .await
            .unwrap();
        assert!(with[0].preview.as_deref().unwrap().starts_with("Hi, Could you"));
        assert!(with[0].score.has(Signal::ActionPhrase));
        assert!(with[0].score.total > without[0].score.total);
    }

    #[tokio::test]
    async fn test_filter_limit_is_passed_through() {
        let reader = FixedReader(
            (0..5)
                .map(|id| MessageRecord::new(id, "a@b.example", "hello"))
                .collect(),
        );
        let triaged = triage()
            .run(&reader, &MessageFilter::new().limit(2), false)
            .await
            .unwrap();
        assert_eq!(triaged.len(), 2);
    }
}
