//! Static character data: templates, enemies, and trait ladders.
//!
//! The catalog is a pure lookup table built once at raid start. Nothing in
//! it is mutated during play; owned units and combat units only reference
//! templates by [`TemplateId`].

mod ability;
mod traits;

use std::collections::BTreeMap;
use std::fmt;

pub use ability::{AbilityDefinition, AbilityEffect};
pub use traits::{TraitBonus, TraitDefinition, TraitThreshold};

use crate::config::GameConfig;

/// Identifier of a character or enemy template.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Combat stats of a template or an owned unit.
///
/// `attack_speed` is in hundredths of attacks per second (100 = one attack
/// per second); `range` is in grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    pub attack_speed: u32,
    pub range: u32,
}

impl Stats {
    pub const fn new(health: u32, attack: u32, defense: u32, attack_speed: u32, range: u32) -> Self {
        Self {
            health,
            attack,
            defense,
            attack_speed,
            range,
        }
    }

    /// Stats of a unit at `star`, scaling health, attack and defense by the
    /// per-star multiplier. The floor is taken after every star step, so
    /// 500 health becomes 900 at star 2 and 1620 at star 3 under ×1.8.
    ///
    /// Attack speed and range do not scale.
    pub fn at_star(&self, star: u8, multiplier_permille: u32) -> Self {
        let scale = |value: u32| {
            (1..star.max(1)).fold(value, |acc, _| {
                (u64::from(acc) * u64::from(multiplier_permille) / 1000) as u32
            })
        };
        Self {
            health: scale(self.health),
            attack: scale(self.attack),
            defense: scale(self.defense),
            attack_speed: self.attack_speed,
            range: self.range,
        }
    }

    /// Stats one star above `self`, for combining three copies.
    pub fn next_star(&self, multiplier_permille: u32) -> Self {
        self.at_star(2, multiplier_permille)
    }
}

/// Immutable description of a purchasable character or a generated enemy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterTemplate {
    pub id: TemplateId,
    pub name: String,
    /// 1-5: shop cost, roll weight bracket and pool size.
    pub tier: u8,
    pub stats: Stats,
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Vec<AbilityDefinition>,
}

impl CharacterTemplate {
    /// Shop cost of one star-1 copy.
    pub fn cost(&self) -> u32 {
        u32::from(self.tier)
    }

    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t == name)
    }
}

/// Errors raised while assembling a catalog.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("template {0} is defined more than once")]
    DuplicateTemplate(TemplateId),

    #[error("template {id} has tier {tier}, expected 1..={max}", max = GameConfig::MAX_TIER)]
    InvalidTier { id: TemplateId, tier: u8 },

    #[error("trait {0} thresholds must be strictly ascending and non-zero")]
    UnsortedTraitLadder(String),

    #[error("template {owner} summons unknown template {summoned}")]
    UnknownSummon {
        owner: TemplateId,
        summoned: TemplateId,
    },

    #[error("catalog has no tier 1 characters for the shop to fall back on")]
    MissingTierOne,
}

/// Pure lookup table of character templates, enemy templates and traits.
///
/// Backed by ordered maps so iteration (and therefore every seeded roll)
/// is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterCatalog {
    characters: BTreeMap<TemplateId, CharacterTemplate>,
    enemies: BTreeMap<TemplateId, CharacterTemplate>,
    traits: BTreeMap<String, TraitDefinition>,
}

impl CharacterCatalog {
    /// Build and validate a catalog.
    pub fn new(
        characters: impl IntoIterator<Item = CharacterTemplate>,
        enemies: impl IntoIterator<Item = CharacterTemplate>,
        traits: impl IntoIterator<Item = TraitDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for template in characters {
            Self::validate_tier(&template)?;
            if catalog.characters.contains_key(&template.id) {
                return Err(CatalogError::DuplicateTemplate(template.id));
            }
            catalog.characters.insert(template.id.clone(), template);
        }

        for template in enemies {
            Self::validate_tier(&template)?;
            if catalog.enemies.contains_key(&template.id)
                || catalog.characters.contains_key(&template.id)
            {
                return Err(CatalogError::DuplicateTemplate(template.id));
            }
            catalog.enemies.insert(template.id.clone(), template);
        }

        for definition in traits {
            if !definition.is_sorted() {
                return Err(CatalogError::UnsortedTraitLadder(definition.name));
            }
            catalog.traits.insert(definition.name.clone(), definition);
        }

        for template in catalog.characters.values().chain(catalog.enemies.values()) {
            for ability in &template.abilities {
                if let Some(summoned) = ability.effect.summoned_template()
                    && catalog.template(summoned).is_none()
                {
                    return Err(CatalogError::UnknownSummon {
                        owner: template.id.clone(),
                        summoned: summoned.clone(),
                    });
                }
            }
        }

        if catalog.characters_of_tier(1).next().is_none() {
            return Err(CatalogError::MissingTierOne);
        }

        Ok(catalog)
    }

    fn validate_tier(template: &CharacterTemplate) -> Result<(), CatalogError> {
        if template.tier == 0 || template.tier > GameConfig::MAX_TIER {
            return Err(CatalogError::InvalidTier {
                id: template.id.clone(),
                tier: template.tier,
            });
        }
        Ok(())
    }

    /// Purchasable character by id.
    pub fn character(&self, id: &TemplateId) -> Option<&CharacterTemplate> {
        self.characters.get(id)
    }

    /// Enemy by id.
    pub fn enemy(&self, id: &TemplateId) -> Option<&CharacterTemplate> {
        self.enemies.get(id)
    }

    /// Character or enemy by id.
    pub fn template(&self, id: &TemplateId) -> Option<&CharacterTemplate> {
        self.character(id).or_else(|| self.enemy(id))
    }

    pub fn characters(&self) -> impl Iterator<Item = &CharacterTemplate> {
        self.characters.values()
    }

    pub fn characters_of_tier(&self, tier: u8) -> impl Iterator<Item = &CharacterTemplate> {
        self.characters.values().filter(move |t| t.tier == tier)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &CharacterTemplate> {
        self.enemies.values()
    }

    pub fn trait_definition(&self, name: &str) -> Option<&TraitDefinition> {
        self.traits.get(name)
    }

    pub fn trait_definitions(&self) -> impl Iterator<Item = &TraitDefinition> {
        self.traits.values()
    }
}
