// src/moderation/classifier.rs - Stateless content checks

use log::debug;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::{ConfigError, ContentConfig};
use crate::moderation::spam_rules::SpamRule;

/// Banned-term and spam-pattern inspection of message text.
///
/// Holds only read-only configuration; every method is a pure function of its
/// input, so repeated calls on the same text always agree.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    banned_terms: HashSet<String>,
    spam_rules: Vec<SpamRule>,
}

impl ContentClassifier {
    pub fn new<I, S>(banned_terms: I, spam_rules: Vec<SpamRule>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned_terms = banned_terms
            .into_iter()
            .map(|term| normalize(term.as_ref()))
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty())
            .collect();

        Self {
            banned_terms,
            spam_rules,
        }
    }

    pub fn from_config(config: &ContentConfig) -> Result<Self, ConfigError> {
        let spam_rules = config
            .spam_rules
            .iter()
            .map(SpamRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(&config.banned_terms, spam_rules))
    }

    /// True if any normalized token equals a banned term exactly.
    ///
    /// Punctuation is removed before tokenizing, so "a-ss" becomes "ass" while
    /// "assess" stays a single harmless token.
    pub fn contains_banned_term(&self, text: &str) -> bool {
        if self.banned_terms.is_empty() {
            return false;
        }

        let cleaned = normalize(text);
        let hit = cleaned
            .split_whitespace()
            .find(|token| self.banned_terms.contains(*token));

        if let Some(token) = hit {
            debug!("Banned term matched: '{}'", token);
            return true;
        }
        false
    }

    /// True on the first spam rule matching the raw text
    pub fn looks_like_spam(&self, text: &str) -> bool {
        self.matching_spam_rule(text).is_some()
    }

    pub fn matching_spam_rule(&self, text: &str) -> Option<&SpamRule> {
        self.spam_rules.iter().find(|rule| rule.matches(text))
    }

    pub fn banned_term_count(&self) -> usize {
        self.banned_terms.len()
    }

    pub fn spam_rules(&self) -> &[SpamRule] {
        &self.spam_rules
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        // Built-in defaults contain only known-good regexes
        Self::from_config(&ContentConfig::default()).unwrap_or_else(|_| Self::new(Vec::<String>::new(), Vec::new()))
    }
}

/// Lowercase, fold accents and compatibility forms, and drop everything that is
/// not an ASCII letter, digit or whitespace.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}
