//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the session worker, combat driver, repositories and
//! rejected game commands so clients can bubble them up with consistent
//! context.
use thiserror::Error;
use tokio::sync::oneshot;

use battler_core::{CommandError, ErrorSeverity, GameError, InvariantViolation, PhaseError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("no combat phase is running")]
    NoActiveCombat,

    #[error("combat phase was cancelled before it resolved")]
    CombatCancelled,

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to load bundled content: {0}")]
    Content(String),

    #[error("raid has no repository configured")]
    NoRepository,

    #[error("no saved raid named {0}")]
    SaveNotFound(String),

    #[error("saved raid {raid_id} is inconsistent: {source}")]
    CorruptSave {
        raid_id: String,
        #[source]
        source: InvariantViolation,
    },
}

impl RuntimeError {
    /// Whether the raid cannot continue after this error.
    ///
    /// Rejected commands leave the session untouched; channel and join
    /// failures mean the worker is gone.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Command(error) => error.severity() == ErrorSeverity::Fatal,
            Self::Phase(error) => error.severity() == ErrorSeverity::Fatal,
            Self::CommandChannelClosed
            | Self::ReplyChannelClosed(_)
            | Self::WorkerJoin(_)
            | Self::Content(_) => true,
            _ => false,
        }
    }
}
