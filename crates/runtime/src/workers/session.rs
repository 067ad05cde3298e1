//! Session worker that owns the authoritative [`RoundController`].
//!
//! Receives commands from [`RaidHandle`](crate::RaidHandle), applies them to
//! the controller, starts and stops combat drivers, and publishes events.
//! Because every command goes through this one task, Setup commands can
//! never interleave with a running combat phase.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use battler_core::{
    AcquireOutcome, CombatOutcome, CombatSnapshot, Location, PlaceOutcome, RaidResult,
    RaidSession, RollSummary, RoundController, RoundReport, SaleOutcome, UnitId,
};

use crate::api::{RaidView, Result, RuntimeError};
use crate::events::{CombatEvent, EventBus, RaidEvent, SetupEvent};

use super::combat::{CombatDriver, CombatTiming};

/// Commands that can be sent to the session worker
pub enum Command {
    Purchase {
        slot: usize,
        reply: oneshot::Sender<Result<AcquireOutcome>>,
    },
    Refresh {
        reply: oneshot::Sender<Result<RollSummary>>,
    },
    BuyExperience {
        reply: oneshot::Sender<Result<u8>>,
    },
    ToggleLock {
        slot: usize,
        reply: oneshot::Sender<Result<bool>>,
    },
    Place {
        unit: UnitId,
        destination: Location,
        reply: oneshot::Sender<Result<PlaceOutcome>>,
    },
    Sell {
        unit: UnitId,
        reply: oneshot::Sender<Result<SaleOutcome>>,
    },
    /// Leave Setup and start the three combat tasks.
    StartCombat {
        reply: oneshot::Sender<Result<CombatSnapshot>>,
    },
    /// Start combat and reply with its report, without a window in which
    /// the phase can resolve unobserved.
    PlayRound {
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    /// Reply once the running combat phase resolves, or with the report of
    /// the phase that resolved last.
    AwaitResolution {
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    /// Discard the running combat phase and return to Setup.
    AbortCombat {
        reply: oneshot::Sender<Result<()>>,
    },
    /// After a defeat, return to Setup of the same round.
    Retry {
        reply: oneshot::Sender<Result<()>>,
    },
    /// Close the raid from any phase.
    Terminate {
        reply: oneshot::Sender<RaidResult>,
    },
    /// Read-only view of the raid.
    Query { reply: oneshot::Sender<RaidView> },
    /// The session, only while it may be persisted.
    SetupSession {
        reply: oneshot::Sender<Result<RaidSession>>,
    },
}

/// Background task that processes raid commands.
pub struct SessionWorker {
    controller: RoundController,
    timing: CombatTiming,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    combat: Option<CombatDriver>,
    waiters: Vec<oneshot::Sender<Result<RoundReport>>>,
    /// Report of the most recently resolved combat; cleared when the next
    /// one starts.
    last_report: Option<RoundReport>,
}

impl SessionWorker {
    /// Creates a new session worker.
    pub fn new(
        controller: RoundController,
        timing: CombatTiming,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            controller,
            timing,
            command_rx,
            event_bus,
            combat: None,
            waiters: Vec::new(),
            last_report: None,
        }
    }

    /// Main worker loop. Exits once every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                outcome = resolution(self.combat.as_ref()) => {
                    self.finish_combat(outcome).await;
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }

        if self.combat.is_some() {
            self.cancel_combat().await;
        }
        debug!("session worker stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Purchase { slot, reply } => {
                let _ = reply.send(self.purchase(slot));
            }
            Command::Refresh { reply } => {
                let _ = reply.send(self.refresh());
            }
            Command::BuyExperience { reply } => {
                let result = self.controller.buy_experience().map_err(RuntimeError::from);
                if result.is_ok() {
                    self.publish_economy();
                }
                let _ = reply.send(result);
            }
            Command::ToggleLock { slot, reply } => {
                let result = self.controller.toggle_lock(slot).map_err(RuntimeError::from);
                if let Ok(locked) = result {
                    self.event_bus
                        .publish(SetupEvent::ShopLockToggled { slot, locked });
                }
                let _ = reply.send(result);
            }
            Command::Place {
                unit,
                destination,
                reply,
            } => {
                let _ = reply.send(self.place(unit, destination));
            }
            Command::Sell { unit, reply } => {
                let _ = reply.send(self.sell(unit));
            }
            Command::StartCombat { reply } => {
                let _ = reply.send(self.start_combat());
            }
            Command::PlayRound { reply } => match self.start_combat() {
                Ok(_) => self.waiters.push(reply),
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            Command::AwaitResolution { reply } => {
                if self.combat.is_some() {
                    self.waiters.push(reply);
                } else {
                    let result = self
                        .last_report
                        .clone()
                        .ok_or(RuntimeError::NoActiveCombat);
                    let _ = reply.send(result);
                }
            }
            Command::AbortCombat { reply } => {
                let result = self.abort_combat().await;
                let _ = reply.send(result);
            }
            Command::Retry { reply } => {
                let result = self.controller.retry().map_err(RuntimeError::from);
                let _ = reply.send(result);
            }
            Command::Terminate { reply } => {
                if self.combat.is_some() {
                    self.cancel_combat().await;
                }
                let result = self.controller.terminate();
                self.event_bus.publish(RaidEvent::Closed(result));
                let _ = reply.send(result);
            }
            Command::Query { reply } => {
                let _ = reply.send(self.view());
            }
            Command::SetupSession { reply } => {
                let result = self
                    .controller
                    .setup_session()
                    .cloned()
                    .map_err(RuntimeError::from);
                let _ = reply.send(result);
            }
        }
    }

    fn view(&self) -> RaidView {
        RaidView {
            phase: self.controller.phase(),
            session: self.controller.session().clone(),
            catalog: self.controller.catalog().clone(),
        }
    }

    // ===== setup =====

    fn purchase(&mut self, slot: usize) -> Result<AcquireOutcome> {
        let outcome = self.controller.purchase(slot)?;
        let template = self
            .controller
            .session()
            .roster()
            .unit(outcome.unit)
            .map(|unit| unit.template.clone());
        if let Some(template) = template {
            self.event_bus.publish(SetupEvent::UnitAcquired {
                unit: outcome.unit,
                template,
                slot,
            });
        }
        for record in &outcome.combines {
            self.event_bus
                .publish(SetupEvent::UnitCombined(record.clone()));
        }
        self.publish_economy();
        self.publish_synergies();
        Ok(outcome)
    }

    fn refresh(&mut self) -> Result<RollSummary> {
        let summary = self.controller.refresh()?;
        self.publish_shop();
        self.publish_economy();
        Ok(summary)
    }

    fn place(&mut self, unit: UnitId, destination: Location) -> Result<PlaceOutcome> {
        let outcome = self.controller.place(unit, destination)?;
        self.event_bus.publish(SetupEvent::UnitPlaced {
            unit,
            destination,
            swapped: outcome.swapped,
        });
        for record in &outcome.combines {
            self.event_bus
                .publish(SetupEvent::UnitCombined(record.clone()));
        }
        self.publish_synergies();
        Ok(outcome)
    }

    fn sell(&mut self, unit: UnitId) -> Result<SaleOutcome> {
        let outcome = self.controller.sell(unit)?;
        self.event_bus.publish(SetupEvent::UnitSold {
            unit,
            refund: outcome.refund,
        });
        for record in &outcome.combines {
            self.event_bus
                .publish(SetupEvent::UnitCombined(record.clone()));
        }
        self.publish_economy();
        self.publish_synergies();
        Ok(outcome)
    }

    fn publish_shop(&self) {
        self.event_bus.publish(SetupEvent::ShopRolled {
            slots: self.controller.session().shop().slots().to_vec(),
        });
    }

    fn publish_economy(&self) {
        self.event_bus.publish(SetupEvent::EconomyChanged(
            self.controller.session().economy().clone(),
        ));
    }

    fn publish_synergies(&self) {
        self.event_bus.publish(SetupEvent::SynergiesChanged(
            self.controller.session().synergies().to_vec(),
        ));
    }

    // ===== combat =====

    fn start_combat(&mut self) -> Result<CombatSnapshot> {
        let simulator = self.controller.start_combat()?;
        let snapshot = simulator.snapshot();
        let round = self.controller.session().round();

        self.last_report = None;
        self.combat = Some(CombatDriver::spawn(
            simulator,
            self.timing,
            self.event_bus.clone(),
        ));
        self.event_bus.publish(CombatEvent::Started {
            round,
            snapshot: snapshot.clone(),
        });
        info!(round, "combat tasks started");
        Ok(snapshot)
    }

    async fn finish_combat(&mut self, outcome: CombatOutcome) {
        let Some(driver) = self.combat.take() else {
            return;
        };
        driver.stop().await;

        let round = self.controller.session().round();
        match self.controller.finish_combat(outcome) {
            Ok(report) => {
                self.event_bus
                    .publish(CombatEvent::Resolved { round, outcome });
                self.event_bus
                    .publish(RaidEvent::RoundCompleted(report.clone()));
                if outcome.is_victory() {
                    self.publish_shop();
                }
                self.publish_economy();
                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(Ok(report.clone()));
                }
                self.last_report = Some(report);
            }
            Err(e) => {
                error!(error = %e, round, "resolved combat could not be applied");
                for waiter in self.waiters.drain(..) {
                    let _ = waiter.send(Err(e.clone().into()));
                }
            }
        }
    }

    async fn abort_combat(&mut self) -> Result<()> {
        self.controller.abort_combat()?;
        if self.combat.is_some() {
            self.cancel_combat().await;
        }
        Ok(())
    }

    /// Stop the driver without applying an outcome.
    async fn cancel_combat(&mut self) {
        let Some(driver) = self.combat.take() else {
            return;
        };
        driver.stop().await;

        let round = self.controller.session().round();
        warn!(round, "combat phase cancelled");
        self.event_bus.publish(CombatEvent::Cancelled { round });
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(RuntimeError::CombatCancelled));
        }
    }
}

/// Resolves when the running combat does; pending forever without one.
async fn resolution(combat: Option<&CombatDriver>) -> CombatOutcome {
    match combat {
        Some(driver) => driver.resolved().await,
        None => std::future::pending().await,
    }
}
