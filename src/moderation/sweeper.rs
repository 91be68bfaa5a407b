// src/moderation/sweeper.rs - Periodic eviction of idle senders

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::moderation::ModerationGate;

/// Host-side task that sweeps a gate on a fixed interval.
///
/// The gate never schedules work on its own; whoever owns it decides how often
/// memory is reclaimed.
pub struct Sweeper;

impl Sweeper {
    /// Sweep `gate` every `interval` until `shutdown` fires or its sender is
    /// dropped. `interval` must be non-zero.
    pub fn spawn(
        gate: Arc<ModerationGate>,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::run(gate, move |_: &ModerationGate| interval, shutdown))
    }

    /// Like `spawn`, but the interval tracks `gate.sweep_interval()` so a
    /// reloaded setting applies from the next tick on.
    pub fn spawn_following(gate: Arc<ModerationGate>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(Self::run(gate, ModerationGate::sweep_interval, shutdown))
    }

    async fn run<F>(gate: Arc<ModerationGate>, interval_of: F, mut shutdown: broadcast::Receiver<()>)
    where
        F: Fn(&ModerationGate) -> Duration,
    {
        let mut interval = interval_of(&gate);
        let mut ticker = Self::ticker(interval);

        info!("Sweeper started ({:?} interval)", interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = gate.sweep();
                    debug!("Periodic sweep removed {} senders", evicted);

                    let next = interval_of(&gate);
                    if next != interval {
                        info!("Sweep interval changed from {:?} to {:?}", interval, next);
                        interval = next;
                        ticker = Self::ticker(interval);
                    }
                }
                _ = shutdown.recv() => {
                    info!("Sweeper stopping");
                    break;
                }
            }
        }
    }

    fn ticker(interval: Duration) -> Interval {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
