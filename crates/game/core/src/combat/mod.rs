//! Combat phase: projection of the Board into combat space and tick-based
//! resolution against a generated enemy team.
//!
//! Nothing in this module writes to owned units, the pool or the economy.
//! A [`CombatSimulator`] owns every [`CombatUnit`] for one phase and is
//! dropped afterward, whatever the outcome.

pub mod damage;
pub mod enemy;
pub mod log;
pub mod simulator;
pub mod status;
pub mod unit;

pub use damage::{DamageRules, apply_damage, attack_damage, mitigate};
pub use enemy::{EnemySpec, ProgressionContext, generate_enemies};
pub use log::CombatLogEntry;
pub use simulator::{CombatOutcome, CombatPhase, CombatSimulator, CombatSnapshot, UnitView};
pub use status::{StatusEffect, StatusKind, StatusSet};
pub use unit::{CombatUnit, Point, Side};
