//! In-memory SetupRepository implementation for tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use battler_core::RaidSession;

use super::error::{RepositoryError, Result};
use super::traits::SetupRepository;
use super::types::SaveMetadata;

/// In-memory implementation of SetupRepository.
pub struct InMemorySetupRepo {
    sessions: RwLock<BTreeMap<String, RaidSession>>,
}

impl InMemorySetupRepo {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemorySetupRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupRepository for InMemorySetupRepo {
    fn save(&self, raid_id: &str, session: &RaidSession) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        sessions.insert(raid_id.to_owned(), session.clone());
        Ok(())
    }

    fn load(&self, raid_id: &str) -> Result<Option<RaidSession>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(sessions.get(raid_id).cloned())
    }

    fn exists(&self, raid_id: &str) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(raid_id))
            .unwrap_or(false)
    }

    fn delete(&self, raid_id: &str) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        sessions.remove(raid_id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<SaveMetadata>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(sessions
            .iter()
            .map(|(id, session)| SaveMetadata::describe(id, session, String::new()))
            .collect())
    }
}
