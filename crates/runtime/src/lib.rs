//! Runtime orchestration for the auto-battler simulation.
//!
//! This crate wires the pure `battler-core` rules into a real-time raid:
//! a session worker that owns the round controller, a combat driver whose
//! three periodic tasks (tick, resolution check, countdown) share one
//! mutex-guarded simulator, a topic event bus for presentation, and
//! repositories that persist the raid between rounds. Consumers embed
//! [`Raid`] and talk to it through [`RaidHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`repository`] persists Setup-phase sessions
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{
    ImmediateCombatPlanner, RaidHandle, RaidView, Result, RuntimeError, SetupAction,
    SetupPlanner,
};
pub use events::{CombatEvent, Event, EventBus, RaidEvent, SetupEvent, Topic};
pub use repository::{
    FileSetupRepository, InMemorySetupRepo, RepositoryError, SaveMetadata, SetupRepository,
};
pub use runtime::{Raid, RaidBuilder, RaidConfig};
pub use workers::CombatTiming;
