// src/types/mod.rs - Verdicts, rejection reasons and sender snapshots

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Why a message was refused. The set is closed; callers should match on
/// [`RejectionReason::category`] rather than on the rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum RejectionReason {
    /// Sender is serving a timeout. `newly_imposed` is set on the call that triggered it.
    TimedOut { remaining_secs: u64, newly_imposed: bool },
    SendingTooQuickly,
    TooManyMessages,
    MessageTooShort,
    MessageTooLong { max_length: usize },
    InappropriateLanguage,
    DetectedAsSpam,
}

impl RejectionReason {
    /// Stable machine-readable category code
    pub fn category(&self) -> &'static str {
        match self {
            RejectionReason::TimedOut { .. } => "timed-out",
            RejectionReason::SendingTooQuickly => "sending-too-quickly",
            RejectionReason::TooManyMessages => "too-many-messages",
            RejectionReason::MessageTooShort => "message-too-short",
            RejectionReason::MessageTooLong { .. } => "message-too-long",
            RejectionReason::InappropriateLanguage => "inappropriate-language",
            RejectionReason::DetectedAsSpam => "detected-as-spam",
        }
    }

    /// True for reasons produced by the rate limiter rather than the content checks
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            RejectionReason::TimedOut { .. }
                | RejectionReason::SendingTooQuickly
                | RejectionReason::TooManyMessages
        )
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::TimedOut { remaining_secs, newly_imposed: true } => {
                write!(f, "You have been timed out for {} seconds", remaining_secs)
            }
            RejectionReason::TimedOut { remaining_secs, newly_imposed: false } => {
                write!(f, "You are in timeout for {} seconds", remaining_secs)
            }
            RejectionReason::SendingTooQuickly => write!(f, "You are sending messages too quickly"),
            RejectionReason::TooManyMessages => write!(f, "Too many messages in a short time"),
            RejectionReason::MessageTooShort => write!(f, "Message is too short"),
            RejectionReason::MessageTooLong { max_length } => {
                write!(f, "Message is too long (max {} characters)", max_length)
            }
            RejectionReason::InappropriateLanguage => write!(f, "Message contains inappropriate language"),
            RejectionReason::DetectedAsSpam => write!(f, "Message detected as spam"),
        }
    }
}

/// Outcome of a single validation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectionReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reason(&self) -> Option<&RejectionReason> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }

    /// Flatten into the `{is_valid, reason}` shape handed to chat front-ends
    pub fn to_report(&self, sender: &str) -> VerdictReport {
        VerdictReport {
            sender: sender.to_string(),
            is_valid: self.is_valid(),
            reason: self.reason().map(|r| r.to_string()),
            category: self.reason().map(|r| r.category().to_string()),
        }
    }
}

/// Serializable form of a [`Verdict`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictReport {
    pub sender: String,
    pub is_valid: bool,
    pub reason: Option<String>,
    pub category: Option<String>,
}

/// Result of the rate limiter's timing check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied(RejectionReason),
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// Read-only copy of a sender's rate-limiting state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderSnapshot {
    pub last_message_at: Option<Instant>,
    pub window_start: Instant,
    pub message_count_in_window: u32,
    pub violation_count: u32,
    pub timeout_until: Option<Instant>,
}

impl SenderSnapshot {
    /// Whether the sender is blocked at `now`
    pub fn is_timed_out(&self, now: Instant) -> bool {
        self.timeout_until.map_or(false, |until| now < until)
    }
}

/// Counters exposed by the gate for dashboards and logs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationStats {
    pub accepted: u64,
    pub rejected: BTreeMap<String, u64>,
    pub tracked_senders: usize,
    pub senders_evicted: u64,
    pub last_sweep_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ModerationStats {
    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }
}
