//! Records shared by repository implementations.

use battler_core::RaidSession;
use serde::{Deserialize, Serialize};

/// Human-readable summary stored next to a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub raid_id: String,
    pub round: u32,
    pub gold: u32,
    pub level: u8,
    pub rounds_won: u32,
    pub units: usize,
    /// Hex-encoded SHA-256 of the session bytes; empty for in-memory saves.
    pub checksum: String,
}

impl SaveMetadata {
    pub fn describe(raid_id: &str, session: &RaidSession, checksum: String) -> Self {
        Self {
            raid_id: raid_id.to_owned(),
            round: session.round(),
            gold: session.economy().gold,
            level: session.economy().level,
            rounds_won: session.stats().rounds_won,
            units: session.roster().units().count(),
            checksum,
        }
    }
}

/// Raid ids become file names, so keep them to a safe alphabet.
pub(crate) fn validate_raid_id(raid_id: &str) -> super::error::Result<()> {
    let valid = !raid_id.is_empty()
        && raid_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(super::error::RepositoryError::InvalidRaidId(raid_id.to_owned()))
    }
}
