//! Active trait computation from Board composition.
//!
//! [`recompute`] is a pure function of the Board: Bench and Deferred units
//! never count, and instance identifiers never influence the result.

use std::collections::BTreeMap;

use crate::catalog::{CharacterCatalog, TraitBonus};
use crate::unit::CharacterInstance;

/// A trait whose Board tally meets at least one rung of its ladder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveTrait {
    pub name: String,
    /// Distinct Board units carrying the trait.
    pub count: u32,
    /// Unit count required by the highest rung met.
    pub threshold: u32,
    /// Zero-based index of that rung in the ladder.
    pub rung: usize,
    pub bonus: TraitBonus,
    pub description: String,
}

/// Tally traits over `board` and return the active ones, sorted by name.
///
/// Traits below their first rung are excluded rather than returned at
/// level zero. Traits without a ladder in the catalog never activate.
pub fn recompute<'a>(
    board: impl IntoIterator<Item = &'a CharacterInstance>,
    catalog: &CharacterCatalog,
) -> Vec<ActiveTrait> {
    let mut tally: BTreeMap<&str, u32> = BTreeMap::new();
    for unit in board {
        let Some(template) = catalog.template(&unit.template) else {
            continue;
        };
        // A template listing a trait twice still counts as one unit.
        let mut seen: Vec<&str> = Vec::with_capacity(template.traits.len());
        for name in &template.traits {
            if !seen.contains(&name.as_str()) {
                seen.push(name);
                *tally.entry(name).or_insert(0) += 1;
            }
        }
    }

    tally
        .into_iter()
        .filter_map(|(name, count)| {
            let definition = catalog.trait_definition(name)?;
            let (rung, threshold) = definition.threshold_for(count)?;
            Some(ActiveTrait {
                name: name.to_owned(),
                count,
                threshold: threshold.count,
                rung,
                bonus: threshold.bonus,
                description: threshold.description.clone(),
            })
        })
        .collect()
}

/// Summed trait bonuses for one unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitBonus {
    pub damage: u32,
    pub health: u32,
    pub defense: u32,
    pub attack_speed_pct: u32,
    pub mana: u32,
}

impl UnitBonus {
    fn add(&mut self, bonus: TraitBonus) {
        match bonus {
            TraitBonus::Damage(value) => self.damage += value,
            TraitBonus::Health(value) => self.health += value,
            TraitBonus::Defense(value) => self.defense += value,
            TraitBonus::AttackSpeed(value) => self.attack_speed_pct += value,
            TraitBonus::Mana(value) => self.mana += value,
        }
    }
}

/// Bonuses granted to a unit carrying `traits` under the active set.
pub fn bonus_for(traits: &[String], active: &[ActiveTrait]) -> UnitBonus {
    let mut total = UnitBonus::default();
    for trait_state in active {
        if traits.iter().any(|name| *name == trait_state.name) {
            total.add(trait_state.bonus);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::catalog::{Stats, TemplateId};
    use crate::unit::{Location, UnitId};

    fn unit(id: u32, template: &str, location: Location) -> CharacterInstance {
        CharacterInstance {
            id: UnitId(id),
            template: TemplateId::from(template),
            star: 1,
            stats: Stats::default(),
            location,
        }
    }

    #[test]
    fn thresholds_select_highest_rung_met() {
        let catalog = sample_catalog();
        let board = [
            unit(1, "shadow_soldier", Location::Board(0)),
            unit(2, "shadow_archer", Location::Board(1)),
            unit(3, "iron_guard", Location::Board(2)),
        ];

        let active = recompute(&board, &catalog);

        let names: Vec<_> = active.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["knight", "shadow"]);
        assert_eq!(active[0].count, 2);
        assert_eq!(active[0].bonus, TraitBonus::Defense(15));
        assert_eq!(active[1].rung, 0);
        assert_eq!(active[1].bonus, TraitBonus::Damage(15));
    }

    #[test]
    fn traits_below_first_rung_are_excluded() {
        let catalog = sample_catalog();
        let board = [unit(1, "apprentice_mage", Location::Board(0))];
        assert!(recompute(&board, &catalog).is_empty());
    }

    #[test]
    fn result_ignores_identity_and_order() {
        let catalog = sample_catalog();
        let a = [
            unit(1, "shadow_soldier", Location::Board(0)),
            unit(2, "iron_guard", Location::Board(5)),
        ];
        let b = [
            unit(40, "iron_guard", Location::Board(3)),
            unit(77, "shadow_soldier", Location::Board(9)),
        ];
        assert_eq!(recompute(&a, &catalog), recompute(&b, &catalog));
    }

    #[test]
    fn duplicates_of_one_template_each_count() {
        let catalog = sample_catalog();
        let board = [
            unit(1, "shadow_soldier", Location::Board(0)),
            unit(2, "shadow_soldier", Location::Board(1)),
        ];
        let active = recompute(&board, &catalog);
        let shadow = active.iter().find(|t| t.name == "shadow").unwrap();
        assert_eq!(shadow.count, 2);
    }

    #[test]
    fn bonuses_apply_only_to_carriers() {
        let catalog = sample_catalog();
        let board = [
            unit(1, "shadow_soldier", Location::Board(0)),
            unit(2, "shadow_archer", Location::Board(1)),
            unit(3, "iron_guard", Location::Board(2)),
        ];
        let active = recompute(&board, &catalog);

        let soldier = bonus_for(&["shadow".into(), "knight".into()], &active);
        assert_eq!(soldier.damage, 15);
        assert_eq!(soldier.defense, 15);

        let mage = bonus_for(&["mage".into()], &active);
        assert_eq!(mage, UnitBonus::default());
    }
}
