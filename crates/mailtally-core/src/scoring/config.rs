//! Scorer configuration: phrase lists, trusted domains and tunables.

use serde::{Deserialize, Serialize};

/// Default penalty for urgent-sounding informational subjects.
pub const DEFAULT_INFORMATIONAL_PENALTY: u32 = 20;

const BULK_SENDER_PATTERNS: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "do-not-reply",
    "notifications",
    "automated",
    "newsletter",
    "marketing",
    "promo",
    "bounce",
    "mailer-daemon",
    "postmaster",
];

const TRUSTED_DOMAINS: &[&str] = &[
    "gmail.com",
    "outlook.com",
    "hotmail.com",
    "yahoo.com",
    "icloud.com",
    "me.com",
    "mac.com",
    "microsoft.com",
];

const ACTION_REQUIRED_PHRASES: &[&str] = &[
    "action required",
    "action needed",
    "action requested",
    "response required",
    "response needed",
    "approval required",
    "approval needed",
    "urgent",
    "asap",
    "time sensitive",
    "deadline",
];

const MEETING_REQUEST_PHRASES: &[&str] = &[
    "meeting request",
    "invitation:",
    "calendar invite",
    "schedule a",
    "scheduling",
    "availability",
    "are you available",
    "let's meet",
    "book a time",
];

const MEETING_MENTION_PHRASES: &[&str] = &[
    "meeting", "call", "sync", "1:1", "catch up", "catch-up", "standup", "huddle",
];

const NEWSLETTER_PHRASES: &[&str] = &[
    "newsletter",
    "digest",
    "weekly update",
    "daily update",
    "monthly update",
    "roundup",
    "recap",
    "your daily",
    "your weekly",
    "summary",
    "automated",
    "system notification",
];

const INFORMATIONAL_SUBJECT_PHRASES: &[&str] = &[
    "license expiration",
    "license expires",
    "licence",
    "expires soon",
    "expiring",
    "renewal notice",
    "subscription renewal",
    "no action required",
    "for your information",
    "fyi",
    "informational",
];

const AUTOMATED_FOLLOWUP_PHRASES: &[&str] = &[
    "this is an automated message",
    "automatically generated",
    "automated reminder",
    "do not reply to this email",
    "automatic reply",
    "out of office",
    "commented on your",
    "mentioned you in",
    "assigned to you",
];

const INFORMATIONAL_CONTENT_PHRASES: &[&str] = &[
    "for your information",
    "fyi",
    "no action required",
    "no action is required",
    "no action needed",
    "for your records",
    "for your reference",
    "just to let you know",
    "this is a notification",
    "informational",
];

const ACTION_PHRASES: &[&str] = &[
    "can you",
    "could you",
    "please advise",
    "please review",
    "please confirm",
    "need your",
    "waiting for",
    "urgent",
    "asap",
    "action required",
    "please respond",
    "feedback needed",
    "please let me know",
    "when can you",
    "do you have",
    "can we",
    "meeting request",
    "schedule",
    "deadline",
    "follow up",
    "follow-up",
];

const UNSUBSCRIBE_PHRASES: &[&str] = &[
    "unsubscribe",
    "opt out",
    "opt-out",
    "manage preferences",
    "manage subscription",
    "email preferences",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Everything the scorer needs besides the message itself.
///
/// Immutable once handed to a [`Scorer`](super::Scorer); changing the rules
/// means building a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Sender domains that earn `trusted_domain`.
    pub trusted_domains: Vec<String>,
    /// Substrings of automated sender addresses.
    pub bulk_sender_patterns: Vec<String>,
    /// Subject phrases for `action_required`.
    pub action_required_phrases: Vec<String>,
    /// Subject phrases for `meeting_request`.
    pub meeting_request_phrases: Vec<String>,
    /// Subject phrases for `meeting_mention`.
    pub meeting_mention_phrases: Vec<String>,
    /// Subject phrases for `newsletter_subject`.
    pub newsletter_phrases: Vec<String>,
    /// Subject phrases that make an urgent subject merely informational.
    pub informational_subject_phrases: Vec<String>,
    /// Body phrases for `automated_followup`.
    pub automated_followup_phrases: Vec<String>,
    /// Body phrases for `informational_content`.
    pub informational_content_phrases: Vec<String>,
    /// Body phrases for `action_phrase`.
    pub action_phrases: Vec<String>,
    /// Body phrases for `has_unsubscribe`.
    pub unsubscribe_phrases: Vec<String>,
    /// The user's name, for `mentions_name`.
    pub user_name: Option<String>,
    /// Points removed by `informational_correction`.
    pub informational_penalty: u32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            trusted_domains: owned(TRUSTED_DOMAINS),
            bulk_sender_patterns: owned(BULK_SENDER_PATTERNS),
            action_required_phrases: owned(ACTION_REQUIRED_PHRASES),
            meeting_request_phrases: owned(MEETING_REQUEST_PHRASES),
            meeting_mention_phrases: owned(MEETING_MENTION_PHRASES),
            newsletter_phrases: owned(NEWSLETTER_PHRASES),
            informational_subject_phrases: owned(INFORMATIONAL_SUBJECT_PHRASES),
            automated_followup_phrases: owned(AUTOMATED_FOLLOWUP_PHRASES),
            informational_content_phrases: owned(INFORMATIONAL_CONTENT_PHRASES),
            action_phrases: owned(ACTION_PHRASES),
            unsubscribe_phrases: owned(UNSUBSCRIBE_PHRASES),
            user_name: None,
            informational_penalty: DEFAULT_INFORMATIONAL_PENALTY,
        }
    }
}

impl ScorerConfig {
    /// Sets the name looked for in previews.
    #[must_use]
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.user_name = (!name.trim().is_empty()).then(|| name.trim().to_string());
        self
    }

    /// Adds trusted domains, skipping ones already present.
    #[must_use]
    pub fn with_trusted_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for domain in domains {
            let domain = domain.as_ref().trim().trim_start_matches('@').to_lowercase();
            if !domain.is_empty() && !self.trusted_domains.contains(&domain) {
                self.trusted_domains.push(domain);
            }
        }
        self
    }

    /// Sets the informational penalty.
    #[must_use]
    pub const fn with_informational_penalty(mut self, penalty: u32) -> Self {
        self.informational_penalty = penalty;
        self
    }

    /// Whether `domain` is trusted (case-insensitive, exact).
    #[must_use]
    pub fn is_trusted(&self, domain: &str) -> bool {
        self.trusted_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    }
}
