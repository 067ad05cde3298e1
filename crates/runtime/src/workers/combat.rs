//! Real-time driver for one combat phase.
//!
//! Three periodic tasks race over the same [`CombatSimulator`]:
//! - the tick loop advances the simulation and publishes snapshots
//! - the resolution check ends the phase as soon as one side is wiped
//! - the countdown counts simulated seconds and resolves on timeout
//!
//! Access is serialized through one async mutex, so ticks never overlap and
//! every check sees a committed tick. Cancellation is a `watch` flag all
//! three tasks select on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, trace};

use battler_core::{CombatOutcome, CombatSimulator};

use crate::events::{CombatEvent, EventBus};

/// Wall-clock periods of the three combat tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatTiming {
    pub tick_interval: Duration,
    pub check_interval: Duration,
    pub countdown_interval: Duration,
}

impl CombatTiming {
    pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(25);

    /// Real-time pacing for a game config: one tick every `tick_ms`, one
    /// countdown step per simulated second.
    pub fn for_tick_ms(tick_ms: u32) -> Self {
        let tick_interval = Duration::from_millis(u64::from(tick_ms.max(1)));
        let ticks_per_second = (1000 / tick_ms.max(1)).max(1);
        Self {
            tick_interval,
            check_interval: Self::DEFAULT_CHECK_INTERVAL.min(tick_interval),
            countdown_interval: tick_interval * ticks_per_second,
        }
    }
}

impl Default for CombatTiming {
    fn default() -> Self {
        Self::for_tick_ms(100)
    }
}

/// A running combat phase.
pub struct CombatDriver {
    simulator: Arc<Mutex<CombatSimulator>>,
    cancel_tx: watch::Sender<bool>,
    resolved: Arc<Notify>,
    tasks: Vec<JoinHandle<()>>,
}

impl CombatDriver {
    /// Spawn the three periodic tasks over `simulator`.
    pub fn spawn(simulator: CombatSimulator, timing: CombatTiming, event_bus: EventBus) -> Self {
        let simulator = Arc::new(Mutex::new(simulator));
        let (cancel_tx, _) = watch::channel(false);
        let resolved = Arc::new(Notify::new());

        let tick_bus = event_bus.clone();
        let tick = PeriodicTask {
            name: "tick",
            period: timing.tick_interval,
            simulator: Arc::clone(&simulator),
            cancel_rx: cancel_tx.subscribe(),
            resolved: Arc::clone(&resolved),
        }
        .spawn(move |simulator| {
            let outcome = simulator.tick();
            tick_bus.publish(CombatEvent::Tick {
                snapshot: simulator.snapshot(),
                log: simulator.drain_log(),
            });
            outcome
        });

        let check = PeriodicTask {
            name: "check",
            period: timing.check_interval,
            simulator: Arc::clone(&simulator),
            cancel_rx: cancel_tx.subscribe(),
            resolved: Arc::clone(&resolved),
        }
        .spawn(CombatSimulator::check_resolution);

        let countdown_bus = event_bus;
        let countdown = PeriodicTask {
            name: "countdown",
            period: timing.countdown_interval,
            simulator: Arc::clone(&simulator),
            cancel_rx: cancel_tx.subscribe(),
            resolved: Arc::clone(&resolved),
        }
        .spawn(move |simulator| {
            let outcome = simulator.countdown();
            countdown_bus.publish(CombatEvent::Countdown {
                seconds_remaining: simulator.seconds_remaining(),
            });
            outcome
        });

        Self {
            simulator,
            cancel_tx,
            resolved,
            tasks: vec![tick, check, countdown],
        }
    }

    /// Wait until one of the tasks resolves the phase.
    pub async fn resolved(&self) -> CombatOutcome {
        loop {
            if let Some(outcome) = self.simulator.lock().await.outcome() {
                return outcome;
            }
            self.resolved.notified().await;
        }
    }

    /// Shared simulator, for inspection.
    pub fn simulator(&self) -> &Arc<Mutex<CombatSimulator>> {
        &self.simulator
    }

    /// Stop all three tasks and wait for them to exit. The simulator and its
    /// units are dropped with the driver.
    pub async fn stop(self) {
        // Receivers may already be gone if every task has exited.
        let _ = self.cancel_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                error!(error = %e, "combat task failed");
            }
        }
        debug!("combat tasks stopped");
    }
}

/// One of the periodic combat tasks.
struct PeriodicTask {
    name: &'static str,
    period: Duration,
    simulator: Arc<Mutex<CombatSimulator>>,
    cancel_rx: watch::Receiver<bool>,
    resolved: Arc<Notify>,
}

impl PeriodicTask {
    fn spawn<F>(self, step: F) -> JoinHandle<()>
    where
        F: FnMut(&mut CombatSimulator) -> Option<CombatOutcome> + Send + 'static,
    {
        tokio::spawn(self.run(step))
    }

    async fn run<F>(mut self, mut step: F)
    where
        F: FnMut(&mut CombatSimulator) -> Option<CombatOutcome> + Send + 'static,
    {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = self.cancel_rx.changed() => {
                    if changed.is_err() || *self.cancel_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    let mut simulator = self.simulator.lock().await;
                    if simulator.is_resolved() {
                        break;
                    }
                    if let Some(outcome) = step(&mut *simulator) {
                        debug!(task = self.name, ?outcome, tick = simulator.tick_count(), "combat resolved");
                        self.resolved.notify_one();
                        break;
                    }
                }
            }
        }
        trace!(task = self.name, "combat task exiting");
    }
}
