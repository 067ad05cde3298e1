//! Common error infrastructure for battler-core.
//!
//! Domain-specific errors (`ShopError`, `RosterError`, `PhaseError`) live next
//! to the operations that raise them. This module holds the shared severity
//! taxonomy, the [`GameError`] trait, and the invariant checks used by tests
//! and debug builds.
//!
//! # Design Principles
//!
//! - **No partial application**: every recoverable error leaves state untouched
//! - **Severity Classification**: errors are categorized for recovery strategies
//! - **Invariants are not user errors**: violations are programming bugs

use crate::catalog::TemplateId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the command may succeed later (more gold, a free slot)
/// - **Validation**: the command itself is malformed (unknown unit, bad slot)
/// - **Internal**: unexpected state inconsistency that requires investigation
/// - **Fatal**: session state is corrupted and cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battler-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for error categorization, metrics, and testing.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A broken session invariant.
///
/// These are never produced by valid command sequences; they exist so tests
/// and debug assertions can report *which* invariant failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("pool for {template} holds {remaining} copies with {owned} owned, expected total {expected}")]
    PoolConservation {
        template: TemplateId,
        remaining: u32,
        owned: u32,
        expected: u32,
    },

    #[error("{count} owned copies of {template} at star {star} left uncombined")]
    UncombinedTriple {
        template: TemplateId,
        star: u8,
        count: usize,
    },

    #[error("board holds {occupied} units but capacity is {capacity}")]
    BoardOverCapacity { occupied: usize, capacity: usize },

    #[error("unit {unit} location does not match its slot")]
    LocationMismatch { unit: u32 },

    #[error("unit {unit} occupies more than one slot")]
    DuplicatePlacement { unit: u32 },

    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),

    #[error("derived synergy state is stale")]
    StaleSynergies,
}

impl GameError for InvariantViolation {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PoolConservation { .. } => "POOL_CONSERVATION",
            Self::UncombinedTriple { .. } => "UNCOMBINED_TRIPLE",
            Self::BoardOverCapacity { .. } => "BOARD_OVER_CAPACITY",
            Self::LocationMismatch { .. } => "LOCATION_MISMATCH",
            Self::DuplicatePlacement { .. } => "DUPLICATE_PLACEMENT",
            Self::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
            Self::StaleSynergies => "STALE_SYNERGIES",
        }
    }
}
