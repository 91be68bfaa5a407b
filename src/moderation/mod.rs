// src/moderation/mod.rs - Moderation gate composing rate limiting and content checks

use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ConfigError, ConfigValidator, ModerationSettings, RateLimitConfig};
use crate::types::{ModerationStats, RateDecision, RejectionReason, SenderSnapshot, Verdict};

pub mod classifier;
pub mod clock;
pub mod rate_limiter;
pub mod spam_rules;
pub mod sweeper;

use classifier::ContentClassifier;
use clock::{Clock, SystemClock};
use rate_limiter::RateLimiter;

/// Everything a verdict depends on, swapped as a unit on reload
#[derive(Debug)]
struct GatePolicy {
    rate_limits: RateLimitConfig,
    classifier: ContentClassifier,
    max_message_length: usize,
    sweep_interval: Duration,
}

/// Single entry point for inbound chat messages.
///
/// Every call runs the rate limiter first, then the length checks, then the
/// classifier. A message refused for timing is never inspected, and the
/// sender's timing state is updated exactly once per call whatever the
/// content turns out to be.
///
/// Each gate owns its sender table, so several gates (one per room, say) can
/// live side by side without sharing state.
#[derive(Debug)]
pub struct ModerationGate {
    rate_limiter: RateLimiter,
    policy: RwLock<Arc<GatePolicy>>,
    clock: Arc<dyn Clock>,
    accepted: AtomicU64,
    rejected: Mutex<BTreeMap<&'static str, u64>>,
    senders_evicted: AtomicU64,
    last_sweep_at: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl ModerationGate {
    /// Build a gate that reads the system clock
    pub fn new(settings: &ModerationSettings) -> Result<Self, ConfigError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &ModerationSettings, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        ConfigValidator::new().validate(settings)?;
        let classifier = ContentClassifier::from_config(&settings.content)?;

        Ok(Self::assemble(
            GatePolicy {
                rate_limits: settings.rate_limits,
                classifier,
                max_message_length: settings.content.max_message_length,
                sweep_interval: settings.sweep_interval(),
            },
            clock,
        ))
    }

    /// Assemble a gate from already-built components
    pub fn from_parts(
        rate_limits: RateLimitConfig,
        classifier: ContentClassifier,
        max_message_length: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::assemble(
            GatePolicy {
                rate_limits,
                classifier,
                max_message_length,
                sweep_interval: ModerationSettings::default().sweep_interval(),
            },
            clock,
        )
    }

    fn assemble(policy: GatePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            rate_limiter: RateLimiter::new(policy.rate_limits),
            policy: RwLock::new(Arc::new(policy)),
            clock,
            accepted: AtomicU64::new(0),
            rejected: Mutex::new(BTreeMap::new()),
            senders_evicted: AtomicU64::new(0),
            last_sweep_at: Mutex::new(None),
        }
    }

    /// Validate one message from `sender_id` at the current time
    pub fn validate(&self, text: &str, sender_id: &str) -> Verdict {
        self.validate_at(text, sender_id, self.clock.now())
    }

    pub fn validate_at(&self, text: &str, sender_id: &str, now: Instant) -> Verdict {
        let verdict = self.decide(text, sender_id, now);

        match &verdict {
            Verdict::Accepted => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Verdict::Rejected(reason) => {
                debug!("Rejected message from {}: {}", sender_id, reason.category());
                *self.rejected.lock().entry(reason.category()).or_insert(0) += 1;
            }
        }

        verdict
    }

    fn decide(&self, text: &str, sender_id: &str, now: Instant) -> Verdict {
        // One snapshot judges the whole call, even across a concurrent reload
        let policy = self.policy.read().clone();

        if let RateDecision::Denied(reason) = self.rate_limiter.evaluate_with(sender_id, now, &policy.rate_limits) {
            return Verdict::Rejected(reason);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Verdict::Rejected(RejectionReason::MessageTooShort);
        }
        if trimmed.chars().count() > policy.max_message_length {
            return Verdict::Rejected(RejectionReason::MessageTooLong {
                max_length: policy.max_message_length,
            });
        }

        if policy.classifier.contains_banned_term(text) {
            return Verdict::Rejected(RejectionReason::InappropriateLanguage);
        }
        if policy.classifier.looks_like_spam(text) {
            return Verdict::Rejected(RejectionReason::DetectedAsSpam);
        }

        Verdict::Accepted
    }

    /// Evict idle senders. The host calls this on a fixed interval.
    pub fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let limits = self.policy.read().rate_limits;
        let evicted = self.rate_limiter.sweep_with(now, &limits);
        self.senders_evicted.fetch_add(evicted as u64, Ordering::Relaxed);
        *self.last_sweep_at.lock() = Some(chrono::Utc::now());

        if evicted > 0 {
            info!(
                "Sweep evicted {} idle senders ({} still tracked)",
                evicted,
                self.rate_limiter.tracked_senders()
            );
        } else {
            debug!("Sweep found no idle senders");
        }
        evicted
    }

    /// Swap in new limits and content rules. Sender state carries over.
    pub fn apply_settings(&self, settings: &ModerationSettings) -> Result<(), ConfigError> {
        ConfigValidator::new().validate(settings)?;
        let classifier = ContentClassifier::from_config(&settings.content)?;

        let mut policy = self.policy.write();
        *policy = Arc::new(GatePolicy {
            rate_limits: settings.rate_limits,
            classifier,
            max_message_length: settings.content.max_message_length,
            sweep_interval: settings.sweep_interval(),
        });
        self.rate_limiter.reconfigure(settings.rate_limits);
        Ok(())
    }

    pub fn rate_limits(&self) -> RateLimitConfig {
        self.policy.read().rate_limits
    }

    /// How often the host should call `sweep`
    pub fn sweep_interval(&self) -> Duration {
        self.policy.read().sweep_interval
    }

    pub fn sender_snapshot(&self, sender_id: &str) -> Option<SenderSnapshot> {
        self.rate_limiter.snapshot(sender_id)
    }

    pub fn tracked_senders(&self) -> usize {
        self.rate_limiter.tracked_senders()
    }

    pub fn stats(&self) -> ModerationStats {
        ModerationStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self
                .rejected
                .lock()
                .iter()
                .map(|(category, count)| (category.to_string(), *count))
                .collect(),
            tracked_senders: self.rate_limiter.tracked_senders(),
            senders_evicted: self.senders_evicted.load(Ordering::Relaxed),
            last_sweep_at: *self.last_sweep_at.lock(),
        }
    }
}
