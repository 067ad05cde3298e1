//! Deterministic auto-battler rules shared by the runtime and offline tools.
//!
//! `battler-core` defines the canonical simulation: the shared resource
//! pool, shop, roster with the combine rule, trait synergies, tick-based
//! combat, and the round economy. Everything is pure and seeded; the
//! runtime drives it in real time and the CLI drives it headlessly.
//!
//! All Setup-phase state lives in [`RaidSession`]; all phase transitions go
//! through [`RoundController`].
pub mod catalog;
pub mod combat;
pub mod config;
pub mod economy;
pub mod error;
pub mod pool;
pub mod rng;
pub mod roster;
pub mod round;
pub mod session;
pub mod shop;
pub mod synergy;
pub mod unit;

pub use catalog::{
    AbilityDefinition, AbilityEffect, CatalogError, CharacterCatalog, CharacterTemplate, Stats,
    TemplateId, TraitBonus, TraitDefinition, TraitThreshold,
};
pub use combat::{
    CombatLogEntry, CombatOutcome, CombatPhase, CombatSimulator, CombatSnapshot, CombatUnit,
    Point, ProgressionContext, Side, StatusKind, UnitView,
};
pub use config::GameConfig;
pub use economy::{RoundEconomy, VictoryReward};
pub use error::{ErrorSeverity, GameError, InvariantViolation};
pub use pool::{PoolExhausted, ResourcePool};
pub use rng::{PcgRng, RngSource, compute_seed};
pub use roster::{AcquireOutcome, CombineRecord, PlaceOutcome, Roster, RosterError};
pub use round::{PhaseError, RoundController, RoundPhase};
pub use session::{
    CommandError, RaidResult, RaidRewards, RaidSession, RaidStats, RoundReport, SaleOutcome,
};
pub use shop::{RollSummary, Shop, ShopError, ShopSlot};
pub use synergy::{ActiveTrait, UnitBonus};
pub use unit::{CharacterInstance, Location, UnitId};
