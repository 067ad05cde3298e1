//! Round lifecycle: `Setup → Combat → Resolution → Setup | Terminated`.
//!
//! [`RoundController`] is the only entry point the runtime talks to. It
//! enforces Setup-phase exclusivity: shop and roster commands are rejected
//! while a combat phase is in flight, and a combat phase can only start
//! from Setup.

use std::sync::Arc;

use tracing::info;

use crate::catalog::CharacterCatalog;
use crate::combat::{CombatOutcome, CombatSimulator, ProgressionContext};
use crate::error::{ErrorSeverity, GameError};
use crate::roster::{AcquireOutcome, PlaceOutcome};
use crate::session::{CommandError, RaidResult, RaidSession, RoundReport, SaleOutcome};
use crate::shop::RollSummary;
use crate::unit::{Location, UnitId};

/// Phase of the round state machine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoundPhase {
    Setup,
    Combat,
    /// A combat was lost; the caller decides between retry and terminate.
    Resolution,
    Terminated,
}

/// A command arrived in the wrong phase.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseError {
    #[error("command requires the {expected} phase, current phase is {actual}")]
    WrongPhase {
        expected: RoundPhase,
        actual: RoundPhase,
    },

    #[error("cannot start combat with an empty board")]
    NoUnitsOnBoard,
}

impl GameError for PhaseError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::WrongPhase { .. } => ErrorSeverity::Validation,
            Self::NoUnitsOnBoard => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::WrongPhase { .. } => "WRONG_PHASE",
            Self::NoUnitsOnBoard => "NO_UNITS_ON_BOARD",
        }
    }
}

/// Orchestrates one raid from creation to termination.
#[derive(Clone, Debug)]
pub struct RoundController {
    catalog: Arc<CharacterCatalog>,
    session: RaidSession,
    progression: ProgressionContext,
    phase: RoundPhase,
}

impl RoundController {
    pub fn new(
        catalog: Arc<CharacterCatalog>,
        session: RaidSession,
        progression: ProgressionContext,
    ) -> Self {
        Self {
            catalog,
            session,
            progression,
            phase: RoundPhase::Setup,
        }
    }

    /// Continue a saved session. Saved sessions are always in Setup.
    pub fn resume(
        catalog: Arc<CharacterCatalog>,
        session: RaidSession,
        progression: ProgressionContext,
    ) -> Self {
        info!(round = session.round(), "raid resumed");
        Self::new(catalog, session, progression)
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn session(&self) -> &RaidSession {
        &self.session
    }

    pub fn catalog(&self) -> &Arc<CharacterCatalog> {
        &self.catalog
    }

    pub fn progression(&self) -> &ProgressionContext {
        &self.progression
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == RoundPhase::Terminated
    }

    /// The session, if it may be persisted (Setup only).
    pub fn setup_session(&self) -> Result<&RaidSession, PhaseError> {
        self.require(RoundPhase::Setup)?;
        Ok(&self.session)
    }

    // ===== setup commands =====

    pub fn purchase(&mut self, slot: usize) -> Result<AcquireOutcome, CommandError> {
        self.require(RoundPhase::Setup)?;
        self.session.purchase(slot, &self.catalog)
    }

    pub fn refresh(&mut self) -> Result<RollSummary, CommandError> {
        self.require(RoundPhase::Setup)?;
        self.session.refresh(&self.catalog)
    }

    pub fn buy_experience(&mut self) -> Result<u8, CommandError> {
        self.require(RoundPhase::Setup)?;
        self.session.buy_experience()
    }

    pub fn toggle_lock(&mut self, slot: usize) -> Result<bool, CommandError> {
        self.require(RoundPhase::Setup)?;
        self.session.toggle_lock(slot)
    }

    pub fn place(
        &mut self,
        unit: UnitId,
        destination: Location,
    ) -> Result<PlaceOutcome, CommandError> {
        self.require(RoundPhase::Setup)?;
        self.session.place(unit, destination, &self.catalog)
    }

    pub fn sell(&mut self, unit: UnitId) -> Result<SaleOutcome, CommandError> {
        self.require(RoundPhase::Setup)?;
        self.session.sell(unit, &self.catalog)
    }

    // ===== combat =====

    /// Leave Setup and hand back the combat phase to drive.
    pub fn start_combat(&mut self) -> Result<CombatSimulator, PhaseError> {
        self.require(RoundPhase::Setup)?;
        if self.session.roster().board_count() == 0 {
            return Err(PhaseError::NoUnitsOnBoard);
        }
        let simulator = self.session.build_combat(&self.catalog, &self.progression);
        self.transition(RoundPhase::Combat);
        Ok(simulator)
    }

    /// Apply a resolved combat. Victory returns to Setup for the next round;
    /// defeat waits in Resolution for [`retry`](Self::retry) or
    /// [`terminate`](Self::terminate).
    pub fn finish_combat(&mut self, outcome: CombatOutcome) -> Result<RoundReport, PhaseError> {
        self.require(RoundPhase::Combat)?;
        let report = self.session.apply_outcome(outcome, &self.catalog);
        let next = if outcome.is_victory() {
            RoundPhase::Setup
        } else {
            RoundPhase::Resolution
        };
        self.transition(next);
        Ok(report)
    }

    /// Drive a whole combat phase without wall-clock timing.
    pub fn run_combat(&mut self) -> Result<RoundReport, PhaseError> {
        let mut simulator = self.start_combat()?;
        let outcome = simulator.run_to_completion();
        self.finish_combat(outcome)
    }

    /// Discard an in-flight combat and return to Setup of the same round.
    pub fn abort_combat(&mut self) -> Result<(), PhaseError> {
        self.require(RoundPhase::Combat)?;
        self.transition(RoundPhase::Setup);
        Ok(())
    }

    /// After a defeat, go back to Setup with Board, Bench and economy intact.
    pub fn retry(&mut self) -> Result<(), PhaseError> {
        self.require(RoundPhase::Resolution)?;
        self.transition(RoundPhase::Setup);
        Ok(())
    }

    /// End the raid from any phase and report the result.
    ///
    /// Terminating mid-combat discards the combat phase; the session keeps
    /// the state it had when combat started.
    pub fn terminate(&mut self) -> RaidResult {
        if self.phase != RoundPhase::Terminated {
            self.transition(RoundPhase::Terminated);
        }
        let result = self.session.result();
        info!(
            success = result.success,
            rounds_won = result.rounds_won,
            rounds_played = result.rounds_played,
            "raid closed"
        );
        result
    }

    /// Consume the controller, returning the final session and result.
    pub fn close(mut self) -> (RaidSession, RaidResult) {
        let result = self.terminate();
        (self.session, result)
    }

    fn require(&self, expected: RoundPhase) -> Result<(), PhaseError> {
        if self.phase != expected {
            return Err(PhaseError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: RoundPhase) {
        info!(from = %self.phase, to = %next, round = self.session.round(), "phase transition");
        self.phase = next;
    }
}
