//! Compiled phrase matchers.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// A case-insensitive "any of these phrases" matcher.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    regex: Option<Regex>,
}

impl PhraseSet {
    /// Matches phrases as whole words.
    ///
    /// A word boundary is required only at ends of a phrase that are word
    /// characters, so `invitation:` and `1:1` behave as expected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the combined pattern cannot be compiled.
    pub fn words<S: AsRef<str>>(phrases: &[S]) -> Result<Self> {
        Self::build(phrases, |phrase| {
            let mut pattern = String::new();
            if phrase.chars().next().is_some_and(is_word_char) {
                pattern.push_str(r"\b");
            }
            pattern.push_str(&regex::escape(phrase));
            if phrase.chars().next_back().is_some_and(is_word_char) {
                pattern.push_str(r"\b");
            }
            pattern
        })
    }

    /// Matches phrases anywhere, including inside words.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the combined pattern cannot be compiled.
    pub fn substrings<S: AsRef<str>>(phrases: &[S]) -> Result<Self> {
        Self::build(phrases, regex::escape)
    }

    fn build<S: AsRef<str>>(phrases: &[S], to_pattern: impl Fn(&str) -> String) -> Result<Self> {
        let alternatives: Vec<String> = phrases
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(to_pattern)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { regex: None });
        }

        let regex = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("Invalid phrase list: {e}")))?;
        Ok(Self { regex: Some(regex) })
    }

    /// Whether any phrase occurs in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }

    /// Whether the set has no phrases.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_words_respect_boundaries() {
        let set = PhraseSet::words(&["call", "1:1", "invitation:"]).unwrap();
        assert!(set.is_match("Quick CALL tomorrow"));
        assert!(set.is_match("Weekly 1:1"));
        assert!(set.is_match("Invitation: Planning"));
        assert!(!set.is_match("Recall the numbers"));
        assert!(!set.is_match("Invitation for you"));
    }

    #[test]
    fn test_substrings_match_inside_words() {
        let set = PhraseSet::substrings(&["noreply", "promo"]).unwrap();
        assert!(set.is_match("updates@NoReply.example.com"));
        assert!(set.is_match("deals@promotions.example"));
        assert!(!set.is_match("jane@gmail.com"));
    }

    #[test]
    fn test_special_characters_are_literal() {
        let set = PhraseSet::words(&["c++ (urgent)"]).unwrap();
        assert!(set.is_match("re: c++ (urgent)"));
        assert!(!set.is_match("cxx urgent"));
    }

    #[test]
    fn test_empty_set_never_matches() {
        let set = PhraseSet::words::<&str>(&[]).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_match("anything"));
        assert!(PhraseSet::words(&["  "]).unwrap().is_empty());
    }
}
