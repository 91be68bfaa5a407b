//! # chatgate
//!
//! A moderation and rate-limiting gate for chat messages.
//!
//! Every inbound message passes through a per-sender behavioral rate limiter
//! and then through stateless content checks (banned terms, spam heuristics).
//! The result is a single accept/reject verdict with a user-facing reason.
//! Per-sender state is reclaimed by a periodic sweep the host schedules.
//!
//! ## Features
//!
//! - **Behavioral rate limiting**: minimum spacing, per-window caps and
//!   escalating timeouts for repeat offenders
//! - **Content classification**: exact-token banned terms with accent folding,
//!   ordered spam heuristics
//! - **Injectable clock**: deterministic tests without sleeping
//! - **Hot-reload configuration**: YAML, TOML or JSON settings files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatgate::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ModerationSettings::default();
//!     let gate = Arc::new(ModerationGate::new(&settings)?);
//!
//!     let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
//!     let sweeper = Sweeper::spawn(gate.clone(), Duration::from_secs(60), shutdown_rx);
//!
//!     match gate.validate("gm everyone", "client-42") {
//!         Verdict::Accepted => println!("relay it"),
//!         Verdict::Rejected(reason) => println!("refused: {}", reason),
//!     }
//!
//!     let _ = shutdown_tx.send(());
//!     sweeper.await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod moderation;
pub mod types;

pub mod prelude {
    pub use crate::config::{
        ConfigChangeEvent, ConfigError, ConfigurationManager, ContentConfig, ModerationSettings,
        RateLimitConfig, SpamRuleConfig,
    };
    pub use crate::moderation::{
        classifier::ContentClassifier,
        clock::{Clock, MockClock, SystemClock},
        rate_limiter::RateLimiter,
        spam_rules::SpamRule,
        sweeper::Sweeper,
        ModerationGate,
    };
    pub use crate::types::{
        ModerationStats, RateDecision, RejectionReason, SenderSnapshot, Verdict, VerdictReport,
    };
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
