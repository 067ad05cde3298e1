//! Damage calculation and application.

use crate::config::GameConfig;
use crate::rng::RngSource;

use super::unit::CombatUnit;

/// Parameters of the basic attack formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRules {
    pub base: u32,
    pub attack_ratio_pct: u32,
    pub jitter: u32,
}

impl DamageRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            base: config.damage_base,
            attack_ratio_pct: config.attack_ratio_pct,
            jitter: config.damage_jitter,
        }
    }
}

/// Raw damage of one basic attack, before the victim's defense.
///
/// # Formula
///
/// ```text
/// raw = base + attack × ratio / 100 + trait bonus + jitter(0..=max)
/// raw = raw × (100 - weakened%) / 100
/// ```
pub fn attack_damage(attacker: &CombatUnit, rules: &DamageRules, rng: &mut impl RngSource) -> u32 {
    let raw = rules.base
        + attacker.attack * rules.attack_ratio_pct / 100
        + attacker.bonus_damage
        + rng.range(0, rules.jitter);
    weaken(raw, attacker)
}

/// Scale outgoing damage by the attacker's Weakened status.
pub fn weaken(raw: u32, attacker: &CombatUnit) -> u32 {
    raw * (100 - attacker.statuses.weakened_percent()) / 100
}

/// Damage that gets past `defense`: `raw × 100 / (100 + defense)`.
pub fn mitigate(raw: u32, defense: u32) -> u32 {
    let reduced = u64::from(raw) * 100 / (100 + u64::from(defense));
    reduced as u32
}

/// Apply damage to current health.
///
/// Returns the new health value (clamped to 0).
pub fn apply_damage(current: u32, damage: u32) -> u32 {
    current.saturating_sub(damage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Stats, TemplateId};
    use crate::combat::{Point, Side, StatusKind};
    use crate::rng::PcgRng;

    fn attacker(attack: u32) -> CombatUnit {
        CombatUnit::new(
            Side::Player,
            TemplateId::from("a"),
            1,
            Stats::new(100, attack, 0, 100, 1),
            Point::default(),
            None,
        )
    }

    #[test]
    fn formula_without_jitter() {
        let rules = DamageRules {
            base: 10,
            attack_ratio_pct: 50,
            jitter: 0,
        };
        let mut rng = PcgRng::seeded(1);
        let mut unit = attacker(50);
        assert_eq!(attack_damage(&unit, &rules, &mut rng), 35);

        unit.bonus_damage = 15;
        assert_eq!(attack_damage(&unit, &rules, &mut rng), 50);

        unit.statuses.apply(StatusKind::Weakened { percent: 50 }, 5);
        assert_eq!(attack_damage(&unit, &rules, &mut rng), 25);
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let rules = DamageRules::from_config(&GameConfig::default());
        let mut rng = PcgRng::seeded(9);
        let unit = attacker(50);
        for _ in 0..500 {
            let damage = attack_damage(&unit, &rules, &mut rng);
            assert!((35..=40).contains(&damage));
        }
    }

    #[test]
    fn defense_mitigates() {
        assert_eq!(mitigate(100, 0), 100);
        assert_eq!(mitigate(100, 100), 50);
        assert_eq!(mitigate(35, 20), 29);
        assert_eq!(apply_damage(10, 25), 0);
    }
}
