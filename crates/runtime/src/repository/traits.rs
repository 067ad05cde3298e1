//! Repository contract for saving and loading a raid between rounds.

use battler_core::RaidSession;

use super::error::Result;
use super::types::SaveMetadata;

/// Repository for Setup-phase raid persistence.
///
/// Only [`RaidSession`] is stored: the economy, pool counts, roster, shop
/// and rng stream. Combat units are ephemeral and never reach a repository.
pub trait SetupRepository: Send + Sync {
    /// Save a session under `raid_id`, replacing any earlier save.
    fn save(&self, raid_id: &str, session: &RaidSession) -> Result<()>;

    /// Load the session saved under `raid_id`.
    fn load(&self, raid_id: &str) -> Result<Option<RaidSession>>;

    /// Check if a save exists
    fn exists(&self, raid_id: &str) -> bool;

    /// Delete a save
    fn delete(&self, raid_id: &str) -> Result<()>;

    /// Summaries of every save, ordered by raid id.
    fn list(&self) -> Result<Vec<SaveMetadata>>;
}
