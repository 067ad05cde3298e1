//! Read-only snapshot of a raid handed to clients and planners.

use std::sync::Arc;

use battler_core::{CharacterCatalog, CharacterTemplate, RaidSession, RoundPhase, ShopSlot};

/// The raid as the session worker last saw it.
#[derive(Debug, Clone)]
pub struct RaidView {
    pub phase: RoundPhase,
    pub session: RaidSession,
    pub catalog: Arc<CharacterCatalog>,
}

impl RaidView {
    pub fn gold(&self) -> u32 {
        self.session.economy().gold
    }

    /// Shop offers with their templates, by slot index.
    pub fn offers(&self) -> impl Iterator<Item = (usize, &ShopSlot, &CharacterTemplate)> {
        self.session
            .shop()
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let slot = slot.as_ref()?;
                let template = self.catalog.character(&slot.template)?;
                Some((index, slot, template))
            })
    }
}
