//! Worker tasks that back the runtime orchestration.
//!
//! The session worker executes raid commands; each combat phase runs on a
//! short-lived [`CombatDriver`] of three periodic tasks.

mod combat;
mod session;

pub use combat::{CombatDriver, CombatTiming};
pub use session::{Command, SessionWorker};
