//! Greedy Setup policy for headless raids.
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use battler_core::{CharacterInstance, GameConfig, Location, RaidSession, ShopSlot};
use battler_runtime::{RaidView, Result, SetupAction, SetupPlanner};

/// Buys toward duplicates and shared traits, levels with surplus gold, and
/// fields the strongest units it owns.
///
/// Actions are chosen in priority order:
/// 1. fill open Board capacity from the Bench, strongest first
/// 2. swap a Bench unit in for a weaker Board unit
/// 3. buy experience with gold above the maximum-interest threshold
/// 4. buy the most wanted affordable offer
/// 5. sell the weakest spare Bench unit to make room for a wanted offer
/// 6. reroll with surplus gold when nothing is wanted
/// 7. start combat
#[derive(Debug)]
pub struct GreedyPlanner {
    retries_left: AtomicU32,
}

impl GreedyPlanner {
    pub fn new(retries: u32) -> Self {
        Self {
            retries_left: AtomicU32::new(retries),
        }
    }

    pub fn decide(&self, view: &RaidView) -> SetupAction {
        let session = &view.session;
        let roster = session.roster();
        let capacity = session.economy().max_team_size();

        if let Some(bench) = strongest(roster.bench_units()) {
            if roster.board_count() < capacity {
                if let Some(slot) = roster.free_board_slot() {
                    return SetupAction::Place {
                        unit: bench.id,
                        destination: Location::Board(slot),
                    };
                }
            }
            if let Some(board) = weakest(roster.board_units()) {
                if power(bench) > power(board) {
                    return SetupAction::Place {
                        unit: bench.id,
                        destination: board.location,
                    };
                }
            }
        }

        let config = session.config();
        let surplus = interest_threshold(config);
        let gold = session.economy().gold;

        if session.economy().level < GameConfig::MAX_LEVEL
            && gold >= surplus + config.experience_cost
        {
            return SetupAction::BuyExperience;
        }

        let wanted = wanted_offers(view);
        if let Some(&(slot, _)) = wanted
            .iter()
            .find(|(_, offer)| roster.can_acquire(&offer.template).is_ok())
        {
            return SetupAction::Purchase(slot);
        }

        if wanted.is_empty() {
            if gold >= surplus + config.refresh_cost {
                return SetupAction::Refresh;
            }
        } else if let Some(spare) = spare_bench_unit(session) {
            return SetupAction::Sell(spare.id);
        }

        SetupAction::StartCombat
    }
}

#[async_trait]
impl SetupPlanner for GreedyPlanner {
    async fn next_action(&self, view: &RaidView) -> Result<SetupAction> {
        Ok(self.decide(view))
    }

    async fn retry_after_defeat(&self, _view: &RaidView) -> bool {
        self.retries_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

/// Rough combat value used to rank owned units.
fn power(unit: &CharacterInstance) -> u32 {
    let stats = unit.stats;
    stats.health + stats.attack * 4 + stats.defense * 2 + stats.attack_speed
}

fn strongest<'a>(
    units: impl Iterator<Item = &'a CharacterInstance>,
) -> Option<&'a CharacterInstance> {
    // Ties go to the earliest slot.
    units.fold(None, |best, unit| match best {
        Some(best) if power(best) >= power(unit) => Some(best),
        _ => Some(unit),
    })
}

fn weakest<'a>(units: impl Iterator<Item = &'a CharacterInstance>) -> Option<&'a CharacterInstance> {
    units.min_by_key(|unit| power(unit))
}

/// Gold at which interest is already capped.
fn interest_threshold(config: &GameConfig) -> u32 {
    config.interest_step * config.interest_cap
}

/// Affordable offers worth buying, most wanted first.
///
/// An offer is wanted when it duplicates an owned template, shares a trait
/// with the Board, or fills a Board slot nothing on the Bench can.
fn wanted_offers(view: &RaidView) -> Vec<(usize, &ShopSlot)> {
    let session = &view.session;
    let roster = session.roster();
    let gold = session.economy().gold;
    let open_slots = session
        .economy()
        .max_team_size()
        .saturating_sub(roster.board_count() + roster.bench_units().count());

    let board_traits: BTreeSet<&str> = roster
        .board_units()
        .filter_map(|unit| view.catalog.character(&unit.template))
        .flat_map(|template| template.traits.iter().map(String::as_str))
        .collect();

    let mut scored: Vec<(u32, usize, &ShopSlot)> = view
        .offers()
        .filter(|(_, slot, _)| slot.cost <= gold)
        .filter_map(|(index, slot, template)| {
            let copies = roster.owned_copies(&slot.template);
            let overlap = template
                .traits
                .iter()
                .filter(|name| board_traits.contains(name.as_str()))
                .count() as u32;
            if copies == 0 && overlap == 0 && open_slots == 0 {
                return None;
            }
            let score = copies * 10 + overlap * 3 + u32::from(template.tier);
            Some((score, index, slot))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .map(|(_, index, slot)| (index, slot))
        .collect()
}

/// The weakest Bench unit with no other copies of its template owned.
fn spare_bench_unit(session: &RaidSession) -> Option<&CharacterInstance> {
    let roster = session.roster();
    if roster.free_bench_slot().is_some() {
        return None;
    }
    weakest(
        roster
            .bench_units()
            .filter(|unit| roster.owned_copies(&unit.template) == unit.copies()),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use battler_core::RoundPhase;

    use super::*;

    fn view(config: GameConfig) -> RaidView {
        let catalog = Arc::new(battler_content::default_catalog().unwrap());
        let session = RaidSession::new(config, &catalog, 11);
        RaidView {
            phase: RoundPhase::Setup,
            session,
            catalog,
        }
    }

    #[test]
    fn buys_a_unit_for_an_empty_board() {
        let view = view(GameConfig::default());
        assert!(matches!(
            GreedyPlanner::new(0).decide(&view),
            SetupAction::Purchase(_)
        ));
    }

    #[test]
    fn fields_a_benched_unit() {
        let mut view = view(GameConfig::default());
        let unit = view.session.purchase(0, &view.catalog).unwrap().unit;

        assert_eq!(
            GreedyPlanner::new(0).decide(&view),
            SetupAction::Place {
                unit,
                destination: Location::Board(0),
            }
        );
    }

    #[test]
    fn fights_when_broke() {
        let config = GameConfig {
            starting_gold: 0,
            ..GameConfig::default()
        };
        assert_eq!(
            GreedyPlanner::new(0).decide(&view(config)),
            SetupAction::StartCombat
        );
    }

    #[test]
    fn levels_with_surplus_gold() {
        let config = GameConfig {
            starting_gold: 100,
            ..GameConfig::default()
        };
        assert_eq!(
            GreedyPlanner::new(0).decide(&view(config)),
            SetupAction::BuyExperience
        );
    }

    #[test]
    fn spends_on_units_at_max_level() {
        let config = GameConfig {
            starting_gold: 100,
            starting_level: GameConfig::MAX_LEVEL,
            ..GameConfig::default()
        };
        assert!(matches!(
            GreedyPlanner::new(0).decide(&view(config)),
            SetupAction::Purchase(_)
        ));
    }

    #[tokio::test]
    async fn retries_until_the_budget_runs_out() {
        let view = view(GameConfig::default());
        let planner = GreedyPlanner::new(2);

        assert!(planner.retry_after_defeat(&view).await);
        assert!(planner.retry_after_defeat(&view).await);
        assert!(!planner.retry_after_defeat(&view).await);
    }

    #[test]
    fn swaps_in_a_stronger_bench_unit() {
        // Level 1 holds a single Board unit.
        let mut view = view(GameConfig {
            starting_gold: 40,
            ..GameConfig::default()
        });
        let catalog = Arc::clone(&view.catalog);
        let first = view.session.purchase(0, &catalog).unwrap().unit;
        view.session.place(first, Location::Board(0), &catalog).unwrap();
        let second = view.session.purchase(1, &catalog).unwrap().unit;

        let board = view.session.roster().unit(first).unwrap();
        let bench = view.session.roster().unit(second).unwrap();
        let action = GreedyPlanner::new(0).decide(&view);

        if bench.location.is_bench() && power(bench) > power(board) {
            assert_eq!(
                action,
                SetupAction::Place {
                    unit: second,
                    destination: Location::Board(0),
                }
            );
        } else {
            assert!(!matches!(action, SetupAction::Place { unit, .. } if unit == second));
        }
    }
}
