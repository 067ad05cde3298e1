//! Shared fixtures for battler-core integration tests.
#![allow(dead_code)]

use battler_core::{
    AbilityDefinition, AbilityEffect, CharacterCatalog, CharacterTemplate, GameConfig, PcgRng,
    RaidSession, RngSource, Stats, StatusKind, TemplateId, TraitBonus, TraitDefinition,
    TraitThreshold,
};

pub fn template(
    id: &str,
    tier: u8,
    stats: Stats,
    traits: &[&str],
    ability: Option<AbilityDefinition>,
) -> CharacterTemplate {
    CharacterTemplate {
        id: TemplateId::from(id),
        name: id.replace('_', " "),
        tier,
        stats,
        traits: traits.iter().map(|t| (*t).to_owned()).collect(),
        abilities: ability.into_iter().collect(),
    }
}

fn ability(name: &str, mana_cost: u32, effect: AbilityEffect) -> Option<AbilityDefinition> {
    Some(AbilityDefinition {
        name: name.to_owned(),
        mana_cost,
        effect,
    })
}

fn ladder(name: &str, rungs: &[(u32, TraitBonus)]) -> TraitDefinition {
    TraitDefinition {
        name: name.to_owned(),
        thresholds: rungs
            .iter()
            .map(|(count, bonus)| TraitThreshold {
                count: *count,
                bonus: *bonus,
                description: format!("({count}) {name}"),
            })
            .collect(),
    }
}

/// A catalog with templates in every tier and one ability of each kind.
pub fn catalog() -> CharacterCatalog {
    CharacterCatalog::new(
        [
            template(
                "shadow_soldier",
                1,
                Stats::new(500, 50, 20, 70, 1),
                &["shadow", "knight"],
                None,
            ),
            template(
                "iron_guard",
                1,
                Stats::new(650, 35, 35, 55, 1),
                &["knight"],
                ability(
                    "Bulwark",
                    40,
                    AbilityEffect::Buff {
                        status: StatusKind::Shielded { amount: 150 },
                        duration_ticks: 30,
                    },
                ),
            ),
            template(
                "apprentice_mage",
                1,
                Stats::new(400, 40, 10, 65, 3),
                &["mage"],
                ability(
                    "Spark",
                    30,
                    AbilityEffect::Debuff {
                        status: StatusKind::Burning { per_tick: 4 },
                        duration_ticks: 20,
                    },
                ),
            ),
            template(
                "shadow_archer",
                2,
                Stats::new(550, 55, 15, 80, 4),
                &["shadow", "hunter"],
                ability("Piercing Shot", 50, AbilityEffect::Damage { amount: 120 }),
            ),
            template(
                "field_medic",
                2,
                Stats::new(600, 30, 20, 60, 3),
                &["mage"],
                ability("Mend", 60, AbilityEffect::Heal { amount: 200 }),
            ),
            template(
                "beast_tamer",
                3,
                Stats::new(700, 60, 25, 70, 2),
                &["hunter"],
                ability(
                    "Call Wolves",
                    80,
                    AbilityEffect::Summon {
                        template: TemplateId::from("wolf"),
                        count: 2,
                    },
                ),
            ),
            template(
                "storm_caller",
                4,
                Stats::new(800, 70, 25, 75, 3),
                &["mage"],
                ability(
                    "Thunderclap",
                    70,
                    AbilityEffect::AreaDamage {
                        amount: 150,
                        radius: 1.5,
                    },
                ),
            ),
            template(
                "dragon_knight",
                5,
                Stats::new(1400, 95, 60, 70, 1),
                &["knight"],
                None,
            ),
        ],
        [
            template("goblin_grunt", 1, Stats::new(300, 30, 5, 70, 1), &[], None),
            template("wolf", 1, Stats::new(250, 25, 5, 90, 1), &[], None),
            template(
                "orc_shaman",
                2,
                Stats::new(450, 40, 10, 60, 3),
                &[],
                ability(
                    "Hex",
                    40,
                    AbilityEffect::Debuff {
                        status: StatusKind::Weakened { percent: 30 },
                        duration_ticks: 30,
                    },
                ),
            ),
            template("troll", 3, Stats::new(900, 60, 30, 50, 1), &[], None),
        ],
        [
            ladder(
                "shadow",
                &[(2, TraitBonus::Damage(15)), (4, TraitBonus::Damage(40))],
            ),
            ladder(
                "knight",
                &[(2, TraitBonus::Defense(15)), (3, TraitBonus::Defense(30))],
            ),
            ladder("mage", &[(2, TraitBonus::Mana(20))]),
            ladder("hunter", &[(2, TraitBonus::AttackSpeed(25))]),
        ],
    )
    .expect("fixture catalog is valid")
}

pub fn session(seed: u64) -> RaidSession {
    RaidSession::new(GameConfig::default(), &catalog(), seed)
}

/// Seeded command fuzzer: picks a Setup command from `rng`.
pub fn random_slot(rng: &mut PcgRng) -> usize {
    rng.below(GameConfig::SHOP_SLOTS as u32) as usize
}
