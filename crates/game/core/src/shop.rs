//! Shop offers sampled from level-indexed tier odds under pool constraints.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::catalog::{CharacterCatalog, TemplateId};
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::pool::{PoolExhausted, ResourcePool};
use crate::rng::RngSource;

/// Errors raised by shop and economy commands. None of them change state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShopError {
    #[error("insufficient gold: need {required}, have {available}")]
    InsufficientGold { required: u32, available: u32 },

    #[error("shop slot {index} is empty")]
    EmptySlot { index: usize },

    #[error("shop slot {index} does not exist")]
    InvalidSlot { index: usize },

    #[error("already at maximum level")]
    MaxLevel,
}

impl GameError for ShopError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientGold { .. } | Self::MaxLevel => ErrorSeverity::Recoverable,
            Self::EmptySlot { .. } | Self::InvalidSlot { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientGold { .. } => "INSUFFICIENT_GOLD",
            Self::EmptySlot { .. } => "EMPTY_SLOT",
            Self::InvalidSlot { .. } => "INVALID_SLOT",
            Self::MaxLevel => "MAX_LEVEL",
        }
    }
}

/// One purchasable offer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShopSlot {
    pub template: TemplateId,
    /// Equal to the template tier.
    pub cost: u32,
    /// Locked slots survive re-rolls untouched.
    pub locked: bool,
}

/// Outcome of a roll, for logging and presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RollSummary {
    pub rerolled: usize,
    pub kept_locked: usize,
    /// Slots whose sampled tier was exhausted and fell back to tier 1.
    pub fallbacks: usize,
    /// Slots left empty because tier 1 was exhausted too.
    pub empty: usize,
}

/// The five shop slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shop {
    slots: [Option<ShopSlot>; GameConfig::SHOP_SLOTS],
}

impl Shop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[Option<ShopSlot>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Result<&ShopSlot, ShopError> {
        self.slots
            .get(index)
            .ok_or(ShopError::InvalidSlot { index })?
            .as_ref()
            .ok_or(ShopError::EmptySlot { index })
    }

    /// Remove the offer in `index` after a purchase.
    pub fn clear(&mut self, index: usize) -> Result<ShopSlot, ShopError> {
        self.slots
            .get_mut(index)
            .ok_or(ShopError::InvalidSlot { index })?
            .take()
            .ok_or(ShopError::EmptySlot { index })
    }

    /// Flip the lock flag of an offer; returns the new flag.
    pub fn toggle_lock(&mut self, index: usize) -> Result<bool, ShopError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ShopError::InvalidSlot { index })?
            .as_mut()
            .ok_or(ShopError::EmptySlot { index })?;
        slot.locked = !slot.locked;
        Ok(slot.locked)
    }

    /// Copies of `template` currently on offer.
    pub fn offered(&self, template: &TemplateId) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| &slot.template == template)
            .count() as u32
    }

    /// Re-sample every unlocked slot.
    ///
    /// Offers are reserved against the pool: a template is only offered while
    /// `remaining - already offered > 0`, so every offer can be bought.
    pub fn roll(
        &mut self,
        level: u8,
        pool: &ResourcePool,
        catalog: &CharacterCatalog,
        rng: &mut impl RngSource,
    ) -> RollSummary {
        let mut summary = RollSummary::default();
        let mut reserved: BTreeMap<TemplateId, u32> = BTreeMap::new();

        for slot in self.slots.iter_mut() {
            match slot {
                Some(offer) if offer.locked => {
                    *reserved.entry(offer.template.clone()).or_insert(0) += 1;
                    summary.kept_locked += 1;
                }
                _ => *slot = None,
            }
        }

        for index in 0..GameConfig::SHOP_SLOTS {
            if self.slots[index].is_some() {
                continue;
            }
            summary.rerolled += 1;

            let tier = Self::sample_tier(level, rng);
            let sampled = match Self::sample_template(tier, pool, &reserved, catalog, rng) {
                Ok(id) => Some(id),
                Err(exhausted) => {
                    warn!(tier, %exhausted, "shop tier exhausted, falling back to tier 1");
                    summary.fallbacks += 1;
                    Self::sample_template(1, pool, &reserved, catalog, rng).ok()
                }
            };

            let Some(template_id) = sampled else {
                warn!(slot = index, "tier 1 exhausted, leaving shop slot empty");
                summary.empty += 1;
                continue;
            };

            let cost = catalog
                .character(&template_id)
                .map(|template| template.cost())
                .unwrap_or(1);
            *reserved.entry(template_id.clone()).or_insert(0) += 1;
            self.slots[index] = Some(ShopSlot {
                template: template_id,
                cost,
                locked: false,
            });
        }

        debug!(
            level,
            rerolled = summary.rerolled,
            kept_locked = summary.kept_locked,
            "shop rolled"
        );
        summary
    }

    /// Sample a tier (1-5) from the level's weight vector.
    pub fn sample_tier(level: u8, rng: &mut impl RngSource) -> u8 {
        rng.weighted_index(GameConfig::shop_odds(level))
            .map(|index| index as u8 + 1)
            .unwrap_or(1)
    }

    /// Sample uniformly among templates of `tier` with unreserved copies left.
    fn sample_template(
        tier: u8,
        pool: &ResourcePool,
        reserved: &BTreeMap<TemplateId, u32>,
        catalog: &CharacterCatalog,
        rng: &mut impl RngSource,
    ) -> Result<TemplateId, PoolExhausted> {
        let candidates: Vec<&TemplateId> = catalog
            .characters_of_tier(tier)
            .map(|template| &template.id)
            .filter(|id| pool.remaining(id) > reserved.get(*id).copied().unwrap_or(0))
            .collect();

        if candidates.is_empty() {
            return Err(PoolExhausted(format!("tier {tier}")));
        }
        let pick = rng.below(candidates.len() as u32) as usize;
        Ok(candidates[pick].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::rng::PcgRng;

    #[test]
    fn roll_fills_every_slot_with_full_pools() {
        let catalog = sample_catalog();
        let pool = ResourcePool::new(&catalog);
        let mut shop = Shop::new();
        let mut rng = PcgRng::seeded(1);

        let summary = shop.roll(1, &pool, &catalog, &mut rng);

        assert_eq!(summary.rerolled, 5);
        for slot in shop.slots() {
            let slot = slot.as_ref().unwrap();
            assert_eq!(slot.cost, 1, "level 1 only offers tier 1");
            assert!(!slot.locked);
        }
    }

    #[test]
    fn locked_slots_survive_rerolls() {
        let catalog = sample_catalog();
        let pool = ResourcePool::new(&catalog);
        let mut shop = Shop::new();
        let mut rng = PcgRng::seeded(2);
        shop.roll(1, &pool, &catalog, &mut rng);

        assert!(shop.toggle_lock(3).unwrap());
        let locked = shop.slot(3).unwrap().clone();

        for _ in 0..20 {
            let summary = shop.roll(1, &pool, &catalog, &mut rng);
            assert_eq!(summary.kept_locked, 1);
            assert_eq!(summary.rerolled, 4);
            assert_eq!(shop.slot(3).unwrap(), &locked);
        }
    }

    #[test]
    fn exhausted_tier_falls_back_to_tier_one() {
        let catalog = sample_catalog();
        let mut pool = ResourcePool::new(&catalog);
        let archer = TemplateId::from("shadow_archer");
        while pool.take(&archer).is_ok() {}

        let mut shop = Shop::new();
        let mut rng = PcgRng::seeded(3);
        // Level 9 samples tier 2 often; the only tier-2 template is empty.
        for _ in 0..50 {
            shop.roll(9, &pool, &catalog, &mut rng);
            for slot in shop.slots().iter().flatten() {
                assert_ne!(slot.template, archer);
            }
        }
    }

    #[test]
    fn offers_never_exceed_remaining_copies() {
        let catalog = sample_catalog();
        let mut pool = ResourcePool::new(&catalog);
        for template in catalog.characters_of_tier(1) {
            while pool.remaining(&template.id) > 1 {
                pool.take(&template.id).unwrap();
            }
        }

        let mut shop = Shop::new();
        let mut rng = PcgRng::seeded(4);
        let summary = shop.roll(1, &pool, &catalog, &mut rng);

        // Three tier-1 templates with one copy each: three offers, two empty slots.
        assert_eq!(summary.empty, 2);
        for template in catalog.characters_of_tier(1) {
            assert!(shop.offered(&template.id) <= 1);
        }
    }

    #[test]
    fn lock_requires_an_offer() {
        let mut shop = Shop::new();
        assert_eq!(shop.toggle_lock(0), Err(ShopError::EmptySlot { index: 0 }));
        assert_eq!(shop.toggle_lock(7), Err(ShopError::InvalidSlot { index: 7 }));
    }
}
