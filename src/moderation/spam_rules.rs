// src/moderation/spam_rules.rs - Heuristic spam patterns

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::config::{ConfigError, SpamRuleConfig};

/// A single compiled spam heuristic.
///
/// Rules are deliberately simple pattern matches evaluated against the raw
/// message text. The repetition rules need back-references, which the `regex`
/// crate does not support, so they are implemented as scanners.
#[derive(Debug, Clone)]
pub enum SpamRule {
    /// The same whitespace-delimited token `min_repeats` or more times in a row
    RepeatedToken { min_repeats: usize },

    /// The same character `min_run` or more times in a row
    RepeatedChar { min_run: usize },

    /// Promotional keyword, bare dollar amount or `www.` prefix
    PromotionalKeywords { keywords: Vec<String>, compiled: Regex },

    /// Any http(s) URL
    Url { compiled: Regex },

    /// Operator supplied regular expression
    Pattern { pattern: String, compiled: Regex },
}

impl SpamRule {
    pub fn compile(config: &SpamRuleConfig) -> Result<Self, ConfigError> {
        match config {
            SpamRuleConfig::RepeatedToken { min_repeats } => Ok(SpamRule::RepeatedToken {
                min_repeats: *min_repeats,
            }),
            SpamRuleConfig::RepeatedChar { min_run } => Ok(SpamRule::RepeatedChar { min_run: *min_run }),
            SpamRuleConfig::PromotionalKeywords { keywords } => {
                let compiled = build_regex(&Self::keyword_pattern(keywords))?;
                Ok(SpamRule::PromotionalKeywords {
                    keywords: keywords.clone(),
                    compiled,
                })
            }
            SpamRuleConfig::Url => Ok(SpamRule::Url {
                compiled: build_regex(r"https?://\S+")?,
            }),
            SpamRuleConfig::Pattern { regex } => Ok(SpamRule::Pattern {
                pattern: regex.clone(),
                compiled: build_regex(regex)?,
            }),
        }
    }

    /// Short identifier used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SpamRule::RepeatedToken { .. } => "repeated_token",
            SpamRule::RepeatedChar { .. } => "repeated_char",
            SpamRule::PromotionalKeywords { .. } => "promotional_keywords",
            SpamRule::Url { .. } => "url",
            SpamRule::Pattern { .. } => "pattern",
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let matched = match self {
            SpamRule::RepeatedToken { min_repeats } => Self::has_repeated_token(text, *min_repeats),
            SpamRule::RepeatedChar { min_run } => Self::has_repeated_char(text, *min_run),
            SpamRule::PromotionalKeywords { compiled, .. }
            | SpamRule::Url { compiled }
            | SpamRule::Pattern { compiled, .. } => compiled.is_match(text),
        };

        if matched {
            debug!("Spam rule '{}' matched: {}", self.name(), text);
        }
        matched
    }

    fn keyword_pattern(keywords: &[String]) -> String {
        let words: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if words.is_empty() {
            r"\bwww\.|\$\d+".to_string()
        } else {
            format!(r"\b(?:{})\b|\bwww\.|\$\d+", words.join("|"))
        }
    }

    fn has_repeated_token(text: &str, min_repeats: usize) -> bool {
        if min_repeats == 0 {
            return false;
        }

        let mut previous: Option<String> = None;
        let mut run = 0;

        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            if previous.as_deref() == Some(token.as_str()) {
                run += 1;
            } else {
                run = 1;
                previous = Some(token);
            }
            if run >= min_repeats {
                return true;
            }
        }
        false
    }

    fn has_repeated_char(text: &str, min_run: usize) -> bool {
        if min_run == 0 {
            return false;
        }

        let mut previous: Option<char> = None;
        let mut run = 0;

        for ch in text.chars() {
            if matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                previous = None;
                run = 0;
                continue;
            }

            let folded = ch.to_lowercase().next().unwrap_or(ch);
            if previous == Some(folded) {
                run += 1;
            } else {
                run = 1;
                previous = Some(folded);
            }
            if run >= min_run {
                return true;
            }
        }
        false
    }
}

fn build_regex(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// The four heuristics used when no rules are configured
pub fn default_rules() -> Vec<SpamRuleConfig> {
    vec![
        SpamRuleConfig::RepeatedToken { min_repeats: 4 },
        SpamRuleConfig::RepeatedChar { min_run: 5 },
        SpamRuleConfig::PromotionalKeywords {
            keywords: ["buy", "sell", "profit", "guaranteed"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        },
        SpamRuleConfig::Url,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(config: SpamRuleConfig) -> SpamRule {
        SpamRule::compile(&config).unwrap()
    }

    #[test]
    fn test_repeated_token() {
        let r = rule(SpamRuleConfig::RepeatedToken { min_repeats: 4 });
        assert!(r.matches("moon moon moon moon"));
        assert!(r.matches("to the MOON moon Moon moon"));
        assert!(!r.matches("moon moon moon"));
        assert!(!r.matches("moon moon sun moon moon"));
        assert!(!r.matches(""));
    }

    #[test]
    fn test_repeated_char() {
        let r = rule(SpamRuleConfig::RepeatedChar { min_run: 5 });
        assert!(r.matches("hellooooo"));
        assert!(r.matches("aAaAa"));
        assert!(r.matches("wow!!!!!"));
        assert!(!r.matches("hello!!!!"));
        assert!(!r.matches("aa\naaa"));
        assert!(!r.matches(""));
    }

    #[test]
    fn test_line_terminators_break_char_runs() {
        let r = rule(SpamRuleConfig::RepeatedChar { min_run: 5 });
        assert!(!r.matches("\r\r\r\r\r"));
        assert!(!r.matches("\u{2028}\u{2028}\u{2028}\u{2028}\u{2028}"));
        assert!(!r.matches("zzz\r\nzzz"));
        assert!(!r.matches("zz\u{2029}zzz"));
        assert!(r.matches("\t\t\t\t\t"));
    }

    #[test]
    fn test_promotional_keywords() {
        let r = rule(default_rules().remove(2));
        assert!(r.matches("should I BUY now?"));
        assert!(r.matches("guaranteed returns"));
        assert!(r.matches("only $100 today"));
        assert!(r.matches("visit www.example.org"));
        assert!(!r.matches("the buyer market is calm"));
        assert!(!r.matches("profitable? not sure"));
        assert!(!r.matches("a few dollars"));
    }

    #[test]
    fn test_url() {
        let r = rule(SpamRuleConfig::Url);
        assert!(r.matches("see https://example.com/path"));
        assert!(r.matches("HTTP://EXAMPLE.COM"));
        assert!(!r.matches("https:// nothing"));
        assert!(!r.matches("plain text"));
    }

    #[test]
    fn test_custom_pattern() {
        let r = rule(SpamRuleConfig::Pattern {
            regex: r"(follow|sub)\s*(for|4)\s*(follow|sub)".to_string(),
        });
        assert!(r.matches("Follow 4 follow anyone?"));
        assert!(!r.matches("I follow the market"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = SpamRule::compile(&SpamRuleConfig::Pattern {
            regex: "(unclosed".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_empty_keyword_list_still_catches_amounts() {
        let r = rule(SpamRuleConfig::PromotionalKeywords { keywords: Vec::new() });
        assert!(r.matches("$5 each"));
        assert!(!r.matches("buy"));
    }
}
