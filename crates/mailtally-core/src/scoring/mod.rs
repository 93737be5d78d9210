//! Weighted signal scoring.
//!
//! Every message earns a set of named, fixed-magnitude [`Signal`]s from its
//! sender, subject and (when available) body preview. The total is the sum,
//! clamped to `0..=100`. Scoring is pure: the same input and configuration
//! always produce the same [`ScoreResult`].

mod config;
mod phrases;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::record::sender_domain;

pub use config::{DEFAULT_INFORMATIONAL_PENALTY, ScorerConfig};
pub use phrases::PhraseSet;

/// Highest possible score.
pub const MAX_SCORE: u8 = 100;

/// A named score contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Sender address looks automated.
    BulkSender,
    /// Sender address looks like a person.
    DirectSender,
    /// Sender domain is trusted.
    TrustedDomain,
    /// Subject asks for action.
    ActionRequired,
    /// Subject asks for a meeting.
    MeetingRequest,
    /// Subject mentions a meeting.
    MeetingMention,
    /// Subject contains a question mark.
    ContainsQuestion,
    /// Subject starts with `Re:`.
    IsReply,
    /// Subject reads like a newsletter.
    NewsletterSubject,
    /// Urgent-sounding subject that is only informational.
    InformationalCorrection,
    /// Preview reads like an automated follow-up.
    AutomatedFollowup,
    /// Preview is informational only.
    InformationalContent,
    /// Preview asks for something.
    ActionPhrase,
    /// Preview mentions the user by name.
    MentionsName,
    /// Preview has an unsubscribe link or text.
    HasUnsubscribe,
}

impl Signal {
    /// Snake-case signal name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BulkSender => "bulk_sender",
            Self::DirectSender => "direct_sender",
            Self::TrustedDomain => "trusted_domain",
            Self::ActionRequired => "action_required",
            Self::MeetingRequest => "meeting_request",
            Self::MeetingMention => "meeting_mention",
            Self::ContainsQuestion => "contains_question",
            Self::IsReply => "is_reply",
            Self::NewsletterSubject => "newsletter_subject",
            Self::InformationalCorrection => "informational_correction",
            Self::AutomatedFollowup => "automated_followup",
            Self::InformationalContent => "informational_content",
            Self::ActionPhrase => "action_phrase",
            Self::MentionsName => "mentions_name",
            Self::HasUnsubscribe => "has_unsubscribe",
        }
    }

    /// Fixed contribution. `InformationalCorrection` is configurable, so the
    /// value here is its default.
    #[must_use]
    pub const fn points(&self) -> i32 {
        match self {
            Self::BulkSender => -30,
            Self::DirectSender | Self::MeetingRequest | Self::ActionPhrase => 20,
            Self::TrustedDomain | Self::MeetingMention | Self::IsReply => 10,
            Self::ActionRequired => 25,
            Self::ContainsQuestion | Self::MentionsName => 15,
            Self::NewsletterSubject | Self::InformationalCorrection => -20,
            Self::AutomatedFollowup => -25,
            Self::InformationalContent => -15,
            Self::HasUnsubscribe => -40,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    /// Clamped total in `0..=100`.
    pub total: u8,
    /// Every signal that fired, with its contribution.
    pub signals: BTreeMap<Signal, i32>,
}

impl ScoreResult {
    fn from_signals(signals: BTreeMap<Signal, i32>) -> Self {
        let sum: i32 = signals.values().sum();
        let total = u8::try_from(sum.clamp(0, i32::from(MAX_SCORE))).unwrap_or_default();
        Self { total, signals }
    }

    /// Whether `signal` fired.
    #[must_use]
    pub fn has(&self, signal: Signal) -> bool {
        self.signals.contains_key(&signal)
    }

    /// One line per signal, largest contribution first.
    #[must_use]
    pub fn explain(&self) -> String {
        let mut entries: Vec<_> = self.signals.iter().collect();
        entries.sort_by(|(a, pa), (b, pb)| {
            pb.abs()
                .cmp(&pa.abs())
                .then_with(|| a.as_str().cmp(b.as_str()))
        });
        entries
            .into_iter()
            .map(|(signal, points)| format!("  {signal}: {points:+}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Scores messages against a fixed [`ScorerConfig`].
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScorerConfig,
    bulk_senders: PhraseSet,
    action_required: PhraseSet,
    meeting_request: PhraseSet,
    meeting_mention: PhraseSet,
    newsletter: PhraseSet,
    informational_subject: PhraseSet,
    automated_followup: PhraseSet,
    informational_content: PhraseSet,
    action_phrases: PhraseSet,
    unsubscribe: PhraseSet,
    user_name: PhraseSet,
    informational_penalty: i32,
}

impl Scorer {
    /// Compiles the phrase lists of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if a phrase list
    /// cannot be compiled.
    pub fn new(config: ScorerConfig) -> Result<Self> {
        let user_name: Vec<&str> = config.user_name.iter().map(String::as_str).collect();
        Ok(Self {
            bulk_senders: PhraseSet::substrings(&config.bulk_sender_patterns)?,
            action_required: PhraseSet::words(&config.action_required_phrases)?,
            meeting_request: PhraseSet::words(&config.meeting_request_phrases)?,
            meeting_mention: PhraseSet::words(&config.meeting_mention_phrases)?,
            newsletter: PhraseSet::words(&config.newsletter_phrases)?,
            informational_subject: PhraseSet::words(&config.informational_subject_phrases)?,
            automated_followup: PhraseSet::words(&config.automated_followup_phrases)?,
            informational_content: PhraseSet::words(&config.informational_content_phrases)?,
            action_phrases: PhraseSet::words(&config.action_phrases)?,
            unsubscribe: PhraseSet::words(&config.unsubscribe_phrases)?,
            user_name: PhraseSet::words(&user_name)?,
            informational_penalty: i32::try_from(config.informational_penalty)
                .unwrap_or(i32::MAX),
            config,
        })
    }

    /// The configuration this scorer was built from.
    #[must_use]
    pub const fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Scores one message.
    #[must_use]
    pub fn score(&self, sender: &str, subject: &str, preview: Option<&str>) -> ScoreResult {
        let mut signals = BTreeMap::new();

        self.score_sender(sender, &mut signals);
        self.score_subject(subject, &mut signals);
        if let Some(preview) = preview.filter(|p| !p.trim().is_empty()) {
            self.score_content(preview, &mut signals);
        }

        ScoreResult::from_signals(signals)
    }

    fn score_sender(&self, sender: &str, signals: &mut BTreeMap<Signal, i32>) {
        if self.bulk_senders.is_match(sender) {
            fire(signals, Signal::BulkSender);
        } else {
            fire(signals, Signal::DirectSender);
        }

        if sender_domain(sender).is_some_and(|d| self.config.is_trusted(&d)) {
            fire(signals, Signal::TrustedDomain);
        }
    }

    fn score_subject(&self, subject: &str, signals: &mut BTreeMap<Signal, i32>) {
        let action_required = self.action_required.is_match(subject);
        if action_required {
            fire(signals, Signal::ActionRequired);
        } else if self.meeting_request.is_match(subject) {
            fire(signals, Signal::MeetingRequest);
        } else if self.meeting_mention.is_match(subject) {
            fire(signals, Signal::MeetingMention);
        }

        if subject.contains('?') {
            fire(signals, Signal::ContainsQuestion);
        }
        if is_reply(subject) {
            fire(signals, Signal::IsReply);
        }
        if self.newsletter.is_match(subject) {
            fire(signals, Signal::NewsletterSubject);
        }

        // Secondary pass: "urgent: license expires" is a notice, not a task.
        if action_required && self.informational_subject.is_match(subject) {
            signals.insert(Signal::InformationalCorrection, -self.informational_penalty);
        }
    }

    fn score_content(&self, preview: &str, signals: &mut BTreeMap<Signal, i32>) {
        if self.automated_followup.is_match(preview) {
            fire(signals, Signal::AutomatedFollowup);
        } else if self.informational_content.is_match(preview) {
            fire(signals, Signal::InformationalContent);
        } else if self.action_phrases.is_match(preview) {
            fire(signals, Signal::ActionPhrase);
        }

        if self.user_name.is_match(preview) {
            fire(signals, Signal::MentionsName);
        }
        if self.unsubscribe.is_match(preview) {
            fire(signals, Signal::HasUnsubscribe);
        }
    }
}

fn fire(signals: &mut BTreeMap<Signal, i32>, signal: Signal) {
    signals.insert(signal, signal.points());
}

fn is_reply(subject: &str) -> bool {
    subject
        .trim_start()
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scorer() -> Scorer {
        Scorer::new(ScorerConfig::default()).unwrap()
    }

    #[test]
    fn test_newsletter_scores_zero() {
        let result = scorer().score(
            "newsletter@promo.example.com",
            "Weekly Digest: Top Stories",
            None,
        );
        assert_eq!(result.total, 0);
        assert_eq!(
            result.signals,
            BTreeMap::from([(Signal::BulkSender, -30), (Signal::NewsletterSubject, -20)])
        );
    }

    #[test]
    fn test_direct_question_from_trusted_domain() {
        let result = scorer().score(
            "jane@gmail.com",
            "Can you review this by Friday?",
            Some("Hi, Could you please review the attached proposal?"),
        );
        assert_eq!(
            result.signals,
            BTreeMap::from([
                (Signal::DirectSender, 20),
                (Signal::TrustedDomain, 10),
                (Signal::ContainsQuestion, 15),
                (Signal::ActionPhrase, 20),
            ])
        );
        assert_eq!(result.total, 65);
    }

    #[test]
    fn test_review_request_lands_in_action() {
        let result = scorer().score(
            "jane@gmail.com",
            "Can you review this by Friday?",
            Some("Could you please review the attached proposal and confirm by Friday? Thanks, Jane"),
        );
        for signal in [
            Signal::DirectSender,
            Signal::TrustedDomain,
            Signal::ContainsQuestion,
            Signal::ActionPhrase,
        ] {
            assert!(result.has(signal), "{signal}");
        }
        assert_eq!(result.total, 65);
        assert_eq!(
            crate::classify::Classifier::default().classify(result.total),
            crate::classify::Category::Action
        );
    }

    #[test]
    fn test_urgency_tier_fires_once() {
        let s = scorer();
        let result = s.score("a@b.example", "Action required: meeting request", None);
        assert!(result.has(Signal::ActionRequired));
        assert!(!result.has(Signal::MeetingRequest));
        assert!(!result.has(Signal::MeetingMention));

        let result = s.score("a@b.example", "Meeting request for Monday", None);
        assert!(result.has(Signal::MeetingRequest));
        assert!(!result.has(Signal::MeetingMention));

        let result = s.score("a@b.example", "Quick call", None);
        assert!(result.has(Signal::MeetingMention));
    }

    #[test]
    fn test_informational_correction() {
        let s = scorer();
        let plain = s.score("it@corp.example", "Urgent: action required", None);
        let license = s.score("it@corp.example", "Urgent: license expires soon", None);
        assert!(!plain.has(Signal::InformationalCorrection));
        assert_eq!(license.signals.get(&Signal::InformationalCorrection), Some(&-20));
        assert!(license.total < plain.total);
    }

    #[test]
    fn test_correction_needs_action_required() {
        let result = scorer().score("it@corp.example", "Your license expires soon", None);
        assert!(!result.has(Signal::InformationalCorrection));
    }

    #[test]
    fn test_configurable_penalty() {
        let s = Scorer::new(ScorerConfig::default().with_informational_penalty(5)).unwrap();
        let result = s.score("it@corp.example", "Urgent: license expires soon", None);
        assert_eq!(result.signals.get(&Signal::InformationalCorrection), Some(&-5));
    }

    #[test]
    fn test_reply_detection() {
        assert!(is_reply("Re: budget"));
        assert!(is_reply("  RE: budget"));
        assert!(is_reply("re:budget"));
        assert!(!is_reply("Fwd: Re: budget"));
        assert!(!is_reply("Regarding budget"));
        assert!(!is_reply("R"));
    }

    #[test]
    fn test_content_precedence() {
        let s = scorer();
        let result = s.score(
            "a@b.example",
            "Hello",
            Some("This is an automated message. Could you confirm? FYI"),
        );
        assert!(result.has(Signal::AutomatedFollowup));
        assert!(!result.has(Signal::InformationalContent));
        assert!(!result.has(Signal::ActionPhrase));

        let result = s.score("a@b.example", "Hello", Some("FYI, could you look?"));
        assert!(result.has(Signal::InformationalContent));
        assert!(!result.has(Signal::ActionPhrase));
    }

    #[test]
    fn test_unsubscribe_counts_once() {
        let result = scorer().score(
            "a@b.example",
            "Hello",
            Some("Unsubscribe here, or opt out, or manage preferences"),
        );
        assert_eq!(result.signals.get(&Signal::HasUnsubscribe), Some(&-40));
    }

    #[test]
    fn test_content_ignored_without_preview() {
        let s = scorer();
        assert_eq!(s.score("a@b.example", "Hi", None), s.score("a@b.example", "Hi", Some("  ")));
    }

    #[test]
    fn test_mentions_name() {
        let s = Scorer::new(ScorerConfig::default().with_user_name("Jane")).unwrap();
        let result = s.score("a@b.example", "Hi", Some("Thanks jane, see you"));
        assert!(result.has(Signal::MentionsName));
        let result = scorer().score("a@b.example", "Hi", Some("Thanks jane, see you"));
        assert!(!result.has(Signal::MentionsName));
    }

    #[test]
    fn test_explain_orders_by_magnitude() {
        let result = scorer().score("newsletter@promo.example.com", "Weekly digest?", None);
        assert_eq!(
            result.explain(),
            "  bulk_sender: -30\n  newsletter_subject: -20\n  contains_question: +15"
        );
    }

    #[test]
    fn test_explain_ties_by_name() {
        let result = scorer().score("a@gmail.com", "Re: lunch", None);
        assert_eq!(
            result.explain(),
            "  direct_sender: +20\n  is_reply: +10\n  trusted_domain: +10"
        );
    }

    proptest! {
        #[test]
        fn prop_score_is_pure(sender in ".{0,40}", subject in ".{0,60}", preview in proptest::option::of(".{0,120}")) {
            let s = scorer();
            let a = s.score(&sender, &subject, preview.as_deref());
            let b = s.score(&sender, &subject, preview.as_deref());
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_total_in_range(sender in ".{0,40}", subject in ".{0,60}", preview in proptest::option::of(".{0,120}")) {
            let result = scorer().score(&sender, &subject, preview.as_deref());
            prop_assert!(result.total <= MAX_SCORE);
        }

        #[test]
        fn prop_bulk_never_direct(local in "[a-z]{0,8}", pattern in prop::sample::select(vec!["noreply", "notifications", "newsletter", "marketing"]), subject in ".{0,40}") {
            let sender = format!("{local}{pattern}@example.com");
            let result = scorer().score(&sender, &subject, None);
            prop_assert!(result.has(Signal::BulkSender));
            prop_assert!(!result.has(Signal::DirectSender));
        }
    }
}
