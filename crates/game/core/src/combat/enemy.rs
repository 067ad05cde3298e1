//! Round-scaled enemy team generation.

use crate::catalog::{CharacterCatalog, CharacterTemplate, Stats};
use crate::config::GameConfig;
use crate::rng::RngSource;

/// External progression supplied read-only at raid start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressionContext {
    /// Account-level progression of the player, 1 or higher.
    pub player_level: u32,
    /// Extra enemies per round granted by unlocked difficulty tiers.
    pub difficulty_bonus: u32,
}

impl Default for ProgressionContext {
    fn default() -> Self {
        Self {
            player_level: 1,
            difficulty_bonus: 0,
        }
    }
}

/// One generated enemy, ready to be projected into combat.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySpec {
    pub template: CharacterTemplate,
    pub star: u8,
    pub stats: Stats,
}

/// Enemies fielded in `round`: `min(1 + ceil(round / 2) + bonus, 9)`.
pub fn enemy_count(round: u32, progression: &ProgressionContext) -> usize {
    let count = 1 + round.div_ceil(2) + progression.difficulty_bonus;
    (count as usize).min(GameConfig::MAX_ENEMIES)
}

/// Star of every enemy in `round`.
pub fn enemy_star(round: u32) -> u8 {
    1 + u8::from(round >= 8) + u8::from(round >= 15)
}

/// Highest enemy tier that may appear in `round`.
pub fn max_enemy_tier(round: u32) -> u8 {
    let tier = 1 + round.saturating_sub(1) / 3;
    tier.min(u32::from(GameConfig::MAX_TIER)) as u8
}

/// Percentage applied to health and attack: +8 % per round past the first
/// and +3 % per player level past the first.
pub fn strength_percent(round: u32, progression: &ProgressionContext) -> u32 {
    100 + 8 * round.saturating_sub(1) + 3 * progression.player_level.saturating_sub(1)
}

/// Generate the enemy team for `round`.
///
/// Templates are drawn uniformly from the catalog's enemies whose tier the
/// round has unlocked. A catalog without eligible enemies falls back to
/// purchasable characters of those tiers.
pub fn generate_enemies(
    round: u32,
    progression: &ProgressionContext,
    catalog: &CharacterCatalog,
    config: &GameConfig,
    rng: &mut impl RngSource,
) -> Vec<EnemySpec> {
    let max_tier = max_enemy_tier(round);
    let mut candidates: Vec<&CharacterTemplate> =
        catalog.enemies().filter(|t| t.tier <= max_tier).collect();
    if candidates.is_empty() {
        candidates = catalog.characters().filter(|t| t.tier <= max_tier).collect();
    }
    if candidates.is_empty() {
        return Vec::new();
    }

    let star = enemy_star(round);
    let strength = strength_percent(round, progression);
    (0..enemy_count(round, progression))
        .map(|_| {
            let template = candidates[rng.below(candidates.len() as u32) as usize];
            let mut stats = template
                .stats
                .at_star(star, config.star_multiplier_permille);
            stats.health = stats.health * strength / 100;
            stats.attack = stats.attack * strength / 100;
            EnemySpec {
                template: template.clone(),
                star,
                stats,
            }
        })
        .collect()
}
