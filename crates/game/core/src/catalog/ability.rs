//! Ability definitions cast by units when their mana fills.

use crate::catalog::TemplateId;
use crate::combat::StatusKind;

/// A castable ability attached to a character template.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDefinition {
    pub name: String,
    /// Mana required before the ability replaces a basic attack.
    pub mana_cost: u32,
    pub effect: AbilityEffect,
}

/// The effect an ability resolves to.
///
/// Closed set: every variant carries exactly the payload it needs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEffect {
    /// Damage the caster's current target.
    Damage { amount: u32 },

    /// Restore health to the most wounded living ally (caster included).
    Heal { amount: u32 },

    /// Apply a beneficial status to the caster.
    Buff { status: StatusKind, duration_ticks: u32 },

    /// Apply a harmful status to the caster's current target.
    Debuff { status: StatusKind, duration_ticks: u32 },

    /// Spawn star-1 copies of a template next to the caster.
    Summon { template: TemplateId, count: u32 },

    /// Damage every opponent within `radius` grid units of the target.
    AreaDamage { amount: u32, radius: f32 },
}

impl AbilityEffect {
    /// Whether the effect needs a living opposing target to resolve.
    pub fn needs_target(&self) -> bool {
        matches!(
            self,
            Self::Damage { .. } | Self::Debuff { .. } | Self::AreaDamage { .. }
        )
    }

    /// Template referenced by a summon effect.
    pub fn summoned_template(&self) -> Option<&TemplateId> {
        match self {
            Self::Summon { template, .. } => Some(template),
            _ => None,
        }
    }
}
