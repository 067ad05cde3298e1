//! Event payloads published by the runtime.

use battler_core::{
    ActiveTrait, CombatLogEntry, CombatOutcome, CombatSnapshot, CombineRecord, Location,
    RaidResult, RoundEconomy, RoundReport, ShopSlot, TemplateId, UnitId,
};
use serde::{Deserialize, Serialize};

/// Setup-phase changes: shop, roster and economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SetupEvent {
    /// The shop was re-rolled (refresh or post-victory roll).
    ShopRolled { slots: Vec<Option<ShopSlot>> },

    /// An offer was bought.
    UnitAcquired {
        unit: UnitId,
        template: TemplateId,
        slot: usize,
    },

    /// Three copies became one unit a star higher.
    UnitCombined(CombineRecord),

    UnitPlaced {
        unit: UnitId,
        destination: Location,
        /// Unit that moved to the origin slot, if the destination was taken.
        swapped: Option<UnitId>,
    },

    UnitSold { unit: UnitId, refund: u32 },

    ShopLockToggled { slot: usize, locked: bool },

    EconomyChanged(RoundEconomy),

    /// Active traits after a Board change.
    SynergiesChanged(Vec<ActiveTrait>),
}

/// Combat-phase progress for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    Started { round: u32, snapshot: CombatSnapshot },

    /// State after one simulation tick, with the log entries it produced.
    Tick {
        snapshot: CombatSnapshot,
        log: Vec<CombatLogEntry>,
    },

    /// One simulated second elapsed.
    Countdown { seconds_remaining: u32 },

    Resolved { round: u32, outcome: CombatOutcome },

    /// The phase was discarded before it resolved.
    Cancelled { round: u32 },
}

/// Raid-level milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaidEvent {
    RoundCompleted(RoundReport),

    /// The raid is over; carries the terminal result.
    Closed(RaidResult),
}
