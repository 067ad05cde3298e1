//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RaidHandle`] hides channel plumbing and offers async helpers for
//! Setup commands, combat control, and streaming events from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use battler_core::{
    AcquireOutcome, CombatSnapshot, Location, PlaceOutcome, RaidResult, RaidSession, RollSummary,
    RoundReport, SaleOutcome, UnitId,
};

use super::errors::{Result, RuntimeError};
use super::view::RaidView;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with a raid
#[derive(Clone)]
pub struct RaidHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RaidHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    // ===== setup =====

    /// Buy the offer in a shop slot.
    pub async fn purchase(&self, slot: usize) -> Result<AcquireOutcome> {
        self.request(|reply| Command::Purchase { slot, reply })
            .await?
    }

    /// Pay to re-roll every unlocked shop slot.
    pub async fn refresh(&self) -> Result<RollSummary> {
        self.request(|reply| Command::Refresh { reply }).await?
    }

    /// Pay for experience; returns levels gained.
    pub async fn buy_experience(&self) -> Result<u8> {
        self.request(|reply| Command::BuyExperience { reply })
            .await?
    }

    /// Lock or unlock a shop slot; returns the new lock flag.
    pub async fn toggle_lock(&self, slot: usize) -> Result<bool> {
        self.request(|reply| Command::ToggleLock { slot, reply })
            .await?
    }

    /// Move an owned unit between Board and Bench slots.
    pub async fn place(&self, unit: UnitId, destination: Location) -> Result<PlaceOutcome> {
        self.request(|reply| Command::Place {
            unit,
            destination,
            reply,
        })
        .await?
    }

    /// Sell an owned unit.
    pub async fn sell(&self, unit: UnitId) -> Result<SaleOutcome> {
        self.request(|reply| Command::Sell { unit, reply }).await?
    }

    // ===== combat =====

    /// Start the combat phase; returns the opening snapshot.
    ///
    /// The phase runs in the background. Follow it on [`Topic::Combat`] or
    /// wait for the result with [`await_resolution`](Self::await_resolution).
    pub async fn start_combat(&self) -> Result<CombatSnapshot> {
        self.request(|reply| Command::StartCombat { reply })
            .await?
    }

    /// Wait for the running combat phase to resolve.
    pub async fn await_resolution(&self) -> Result<RoundReport> {
        self.request(|reply| Command::AwaitResolution { reply })
            .await?
    }

    /// Start combat and wait for its report.
    pub async fn play_round(&self) -> Result<RoundReport> {
        self.request(|reply| Command::PlayRound { reply }).await?
    }

    /// Discard the running combat phase and return to Setup of the same round.
    pub async fn abort_combat(&self) -> Result<()> {
        self.request(|reply| Command::AbortCombat { reply })
            .await?
    }

    /// After a defeat, go back to Setup with Board, Bench and economy intact.
    pub async fn retry(&self) -> Result<()> {
        self.request(|reply| Command::Retry { reply }).await?
    }

    /// Close the raid from any phase and return the result.
    pub async fn terminate(&self) -> Result<RaidResult> {
        self.request(|reply| Command::Terminate { reply }).await
    }

    // ===== queries =====

    /// Query the current raid (read-only snapshot)
    pub async fn query(&self) -> Result<RaidView> {
        self.request(|reply| Command::Query { reply }).await
    }

    /// The session, if it may be saved (Setup phase only).
    pub async fn setup_session(&self) -> Result<RaidSession> {
        self.request(|reply| Command::SetupSession { reply })
            .await?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Setup` - Shop, roster and economy changes
    /// - `Topic::Combat` - Combat start, per-tick snapshots, resolution
    /// - `Topic::Raid` - Round reports and raid close
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use battler_runtime::Topic;
    ///
    /// let mut combat_rx = handle.subscribe(Topic::Combat);
    /// while let Ok(event) = combat_rx.recv().await {
    ///     // Render the snapshot
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
