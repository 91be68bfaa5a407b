// src/moderation/rate_limiter.rs - Per-sender behavioral rate limiting

use dashmap::DashMap;
use log::{debug, info};
use parking_lot::RwLock;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::types::{RateDecision, RejectionReason, SenderSnapshot};

/// Timing history for one sender
#[derive(Debug, Clone)]
struct SenderState {
    last_message_at: Option<Instant>,
    window_start: Instant,
    message_count_in_window: u32,
    violation_count: u32,
    timeout_until: Option<Instant>,
}

impl SenderState {
    fn fresh(now: Instant) -> Self {
        Self {
            last_message_at: None,
            window_start: now,
            message_count_in_window: 0,
            violation_count: 0,
            timeout_until: None,
        }
    }

    fn is_timed_out(&self, now: Instant) -> bool {
        self.timeout_until.map_or(false, |until| now < until)
    }

    /// Reference point for idle eviction
    fn last_seen(&self) -> Instant {
        self.last_message_at.unwrap_or(self.window_start)
    }

    fn snapshot(&self) -> SenderSnapshot {
        SenderSnapshot {
            last_message_at: self.last_message_at,
            window_start: self.window_start,
            message_count_in_window: self.message_count_in_window,
            violation_count: self.violation_count,
            timeout_until: self.timeout_until,
        }
    }
}

/// Decides from timing history alone whether a sender may post.
///
/// State lives in a sharded map: `evaluate` holds the sender's shard lock for
/// the whole read-modify-write, so two calls for the same sender never
/// interleave while calls for other senders proceed independently.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RwLock<RateLimitConfig>,
    senders: DashMap<String, SenderState>,
}

impl RateLimiter {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            limits: RwLock::new(limits),
            senders: DashMap::new(),
        }
    }

    /// Run the timing checks for one message from `sender_id` at `now`
    pub fn evaluate(&self, sender_id: &str, now: Instant) -> RateDecision {
        let limits = self.limits();
        self.evaluate_with(sender_id, now, &limits)
    }

    /// Same as `evaluate`, judged by `limits` instead of the stored ones
    pub fn evaluate_with(&self, sender_id: &str, now: Instant, limits: &RateLimitConfig) -> RateDecision {
        let mut state = self
            .senders
            .entry(sender_id.to_string())
            .or_insert_with(|| SenderState::fresh(now));

        if let Some(until) = state.timeout_until {
            if now < until {
                return RateDecision::Denied(RejectionReason::TimedOut {
                    remaining_secs: ceil_secs(until - now),
                    newly_imposed: false,
                });
            }
        }

        if now.saturating_duration_since(state.window_start) > limits.window_duration() {
            state.message_count_in_window = 0;
            state.window_start = now;
        }

        let too_quick = state
            .last_message_at
            .map_or(false, |last| now.saturating_duration_since(last) < limits.min_message_interval());

        let reason = if too_quick {
            RejectionReason::SendingTooQuickly
        } else if state.message_count_in_window >= limits.max_messages_per_window {
            RejectionReason::TooManyMessages
        } else {
            state.last_message_at = Some(now);
            state.message_count_in_window += 1;
            return RateDecision::Allowed;
        };

        state.violation_count += 1;

        if state.violation_count >= limits.violation_threshold {
            let duration = limits.timeout_duration();
            state.timeout_until = Some(now + duration);
            state.violation_count = 0;
            info!(
                "Sender {} timed out for {}s after repeated rate violations",
                sender_id,
                ceil_secs(duration)
            );
            return RateDecision::Denied(RejectionReason::TimedOut {
                remaining_secs: ceil_secs(duration),
                newly_imposed: true,
            });
        }

        debug!(
            "Rate violation {}/{} for {}: {}",
            state.violation_count,
            limits.violation_threshold,
            sender_id,
            reason.category()
        );
        RateDecision::Denied(reason)
    }

    /// Drop every sender idle longer than the eviction threshold. Senders still
    /// serving a timeout are kept so eviction never lifts a penalty.
    pub fn sweep(&self, now: Instant) -> usize {
        let limits = self.limits();
        self.sweep_with(now, &limits)
    }

    pub fn sweep_with(&self, now: Instant, limits: &RateLimitConfig) -> usize {
        let idle_limit = limits.idle_threshold();
        let mut evicted = 0;

        self.senders.retain(|_, state| {
            let keep = state.is_timed_out(now) || now.saturating_duration_since(state.last_seen()) <= idle_limit;
            if !keep {
                evicted += 1;
            }
            keep
        });

        evicted
    }

    pub fn tracked_senders(&self) -> usize {
        self.senders.len()
    }

    pub fn snapshot(&self, sender_id: &str) -> Option<SenderSnapshot> {
        self.senders.get(sender_id).map(|state| state.snapshot())
    }

    pub fn limits(&self) -> RateLimitConfig {
        *self.limits.read()
    }

    /// Swap in new limits. Existing sender state is kept and judged by the new
    /// limits from the next call on.
    pub fn reconfigure(&self, limits: RateLimitConfig) {
        *self.limits.write() = limits;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let millis = duration.as_millis();
    ((millis + 999) / 1000) as u64
}
