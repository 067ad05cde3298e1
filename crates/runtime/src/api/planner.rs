//! Asynchronous abstraction for sourcing Setup-phase decisions.
//!
//! Runtime users plug in [`SetupPlanner`] implementations so a raid can be
//! played by human input, scripted fixtures, or automatic policies.
use async_trait::async_trait;
use battler_core::{Location, UnitId};

use super::errors::Result;
use super::view::RaidView;

/// One Setup-phase command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    Purchase(usize),
    Refresh,
    BuyExperience,
    ToggleLock(usize),
    Place { unit: UnitId, destination: Location },
    Sell(UnitId),
    /// Finish Setup and fight.
    StartCombat,
}

/// Trait for choosing Setup actions based on the current raid view.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - Automatic planners
/// - Scripted/replayed actions
/// - Testing fixtures
#[async_trait]
pub trait SetupPlanner: Send + Sync {
    /// Next action for the Setup phase. Returning
    /// [`SetupAction::StartCombat`] ends the phase.
    async fn next_action(&self, view: &RaidView) -> Result<SetupAction>;

    /// After a defeat: `true` retries the round, `false` ends the raid.
    async fn retry_after_defeat(&self, _view: &RaidView) -> bool {
        false
    }
}

/// A planner that fights immediately with whatever is on the Board.
/// Useful for testing or as a fallback.
pub struct ImmediateCombatPlanner;

#[async_trait]
impl SetupPlanner for ImmediateCombatPlanner {
    async fn next_action(&self, _view: &RaidView) -> Result<SetupAction> {
        Ok(SetupAction::StartCombat)
    }
}
