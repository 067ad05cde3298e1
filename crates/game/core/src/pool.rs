//! Shared finite supply of purchasable copies.

use std::collections::BTreeMap;

use crate::catalog::{CharacterCatalog, TemplateId};
use crate::config::GameConfig;

/// No copies of the requested template (or tier) are left.
///
/// Never surfaced to callers: the shop recovers by falling back to tier 1.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("pool exhausted for {0}")]
pub struct PoolExhausted(pub String);

/// Remaining purchasable copies per character template.
///
/// Invariant: for every template,
/// `owned copies + remaining == GameConfig::pool_size(tier)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePool {
    remaining: BTreeMap<TemplateId, u32>,
}

impl ResourcePool {
    /// Full pool for every purchasable template in the catalog.
    pub fn new(catalog: &CharacterCatalog) -> Self {
        let remaining = catalog
            .characters()
            .map(|template| (template.id.clone(), GameConfig::pool_size(template.tier)))
            .collect();
        Self { remaining }
    }

    pub fn remaining(&self, template: &TemplateId) -> u32 {
        self.remaining.get(template).copied().unwrap_or(0)
    }

    /// Remove one copy from circulation (a purchase).
    pub fn take(&mut self, template: &TemplateId) -> Result<(), PoolExhausted> {
        match self.remaining.get_mut(template) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(())
            }
            _ => Err(PoolExhausted(template.to_string())),
        }
    }

    /// Return copies to circulation (a sale).
    pub fn restore(&mut self, template: &TemplateId, copies: u32) {
        let count = self.remaining.entry(template.clone()).or_insert(0);
        *count += copies;
    }

    pub fn counts(&self) -> impl Iterator<Item = (&TemplateId, u32)> {
        self.remaining.iter().map(|(id, count)| (id, *count))
    }
}
