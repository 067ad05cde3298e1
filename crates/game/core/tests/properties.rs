//! Property checks over long seeded command sequences.

mod common;

use battler_core::{
    CombatOutcome, CommandError, GameConfig, Location, PcgRng, ProgressionContext, RaidSession,
    RngSource, Shop, TemplateId, UnitId,
};

fn rich_config() -> GameConfig {
    GameConfig {
        starting_gold: 500,
        starting_level: 5,
        ..GameConfig::default()
    }
}

fn random_unit(session: &RaidSession, rng: &mut PcgRng) -> UnitId {
    let ids: Vec<UnitId> = session.roster().units().map(|u| u.id).collect();
    if ids.is_empty() {
        return UnitId(u32::MAX);
    }
    ids[rng.below(ids.len() as u32) as usize]
}

fn random_location(rng: &mut PcgRng) -> Location {
    if rng.below(2) == 0 {
        Location::Board(rng.below(GameConfig::BOARD_SLOTS as u32) as usize)
    } else {
        Location::Bench(rng.below(GameConfig::BENCH_SLOTS as u32) as usize)
    }
}

/// Random Setup commands never break pool conservation, the combine rule,
/// board capacity or synergy freshness, and rejected commands never change
/// state.
#[test]
fn invariants_hold_under_random_commands() {
    let catalog = common::catalog();

    for seed in 0..24 {
        let mut session = RaidSession::new(rich_config(), &catalog, seed);
        let mut rng = PcgRng::seeded(seed ^ 0xfeed);

        for step in 0..400 {
            let before = session.clone();
            let result: Result<(), CommandError> = match rng.below(10) {
                0..=3 => session
                    .purchase(common::random_slot(&mut rng), &catalog)
                    .map(drop),
                4 => session.refresh(&catalog).map(drop),
                5 => {
                    let unit = random_unit(&session, &mut rng);
                    session.sell(unit, &catalog).map(drop)
                }
                6..=7 => {
                    let unit = random_unit(&session, &mut rng);
                    session
                        .place(unit, random_location(&mut rng), &catalog)
                        .map(drop)
                }
                8 => session.buy_experience().map(drop),
                _ => session.toggle_lock(common::random_slot(&mut rng)).map(drop),
            };

            if result.is_err() {
                assert_eq!(session, before, "seed {seed} step {step}: {result:?}");
            }
            if let Err(violation) = session.check_invariants(&catalog) {
                panic!("seed {seed} step {step}: {violation}");
            }
        }
    }
}

#[test]
fn three_shadow_soldiers_make_one_star_two() {
    let catalog = common::catalog();
    let mut session = RaidSession::new(rich_config(), &catalog, 99);
    let soldier = TemplateId::from("shadow_soldier");
    let start = session.pool().remaining(&soldier);

    let mut bought = 0;
    while bought < 3 {
        let slot = session
            .shop()
            .slots()
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.template == soldier));
        match slot {
            Some(slot) => {
                session.purchase(slot, &catalog).unwrap();
                bought += 1;
            }
            None => {
                session.refresh(&catalog).unwrap();
            }
        }
    }

    let owned: Vec<_> = session
        .roster()
        .units()
        .filter(|u| u.template == soldier)
        .collect();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].star, 2);
    assert_eq!(owned[0].stats.health, 900);
    assert_eq!(session.pool().remaining(&soldier), start - 3);
}

#[test]
fn sampled_tiers_match_the_odds_table() {
    const ROLLS: u32 = 100_000;
    let mut rng = PcgRng::seeded(2024);

    for level in 1..=GameConfig::MAX_LEVEL {
        let mut counts = [0u32; 5];
        for _ in 0..ROLLS {
            counts[Shop::sample_tier(level, &mut rng) as usize - 1] += 1;
        }
        for (tier, (&count, &weight)) in counts
            .iter()
            .zip(GameConfig::shop_odds(level))
            .enumerate()
        {
            let observed = f64::from(count) * 100.0 / f64::from(ROLLS);
            assert!(
                (observed - f64::from(weight)).abs() < 1.0,
                "level {level} tier {}: observed {observed:.2}%, expected {weight}%",
                tier + 1
            );
        }
    }
}

#[test]
fn full_pool_rolls_follow_the_odds_table() {
    let catalog = common::catalog();
    let session = RaidSession::new(GameConfig::default(), &catalog, 1);
    let mut shop = Shop::new();
    let mut rng = PcgRng::seeded(77);
    let level = 9;

    let mut counts = [0u32; 5];
    for _ in 0..20_000 {
        let summary = shop.roll(level, session.pool(), &catalog, &mut rng);
        assert_eq!(summary.fallbacks, 0);
        for slot in shop.slots().iter().flatten() {
            let tier = catalog.character(&slot.template).unwrap().tier;
            counts[tier as usize - 1] += 1;
        }
    }

    let total: u32 = counts.iter().sum();
    assert_eq!(total, 100_000);
    for (tier, (&count, &weight)) in counts
        .iter()
        .zip(GameConfig::shop_odds(level))
        .enumerate()
    {
        let observed = f64::from(count) * 100.0 / f64::from(total);
        assert!(
            (observed - f64::from(weight)).abs() < 1.0,
            "tier {}: observed {observed:.2}%, expected {weight}%",
            tier + 1
        );
    }
}

/// Every combat phase resolves within the countdown bound.
#[test]
fn combat_always_terminates() {
    let catalog = common::catalog();
    let progression = ProgressionContext {
        player_level: 20,
        difficulty_bonus: 1,
    };

    for seed in 0..12 {
        let mut session = RaidSession::new(rich_config(), &catalog, seed);
        let mut rng = PcgRng::seeded(seed);

        for round in 1..=20 {
            for _ in 0..4 {
                let _ = session.purchase(common::random_slot(&mut rng), &catalog);
            }
            let bench: Vec<UnitId> = session.roster().bench_units().map(|u| u.id).collect();
            for unit in bench {
                let Some(slot) = session.roster().free_board_slot() else {
                    break;
                };
                if session.place(unit, Location::Board(slot), &catalog).is_err() {
                    break;
                }
            }

            let mut simulator = session.build_combat(&catalog, &progression);
            simulator.run_to_completion();
            assert!(simulator.is_resolved(), "seed {seed} round {round}");
            assert!(simulator.tick_count() <= session.config().countdown_ticks());

            session.apply_outcome(CombatOutcome::Victory, &catalog);
            session.check_invariants(&catalog).unwrap();
        }
    }
}

#[test]
fn victory_payout_from_ten_gold() {
    let catalog = common::catalog();
    let mut session = RaidSession::new(GameConfig::default(), &catalog, 3);
    assert_eq!(session.economy().gold, 10);
    assert_eq!(session.config().interest(10), 1);

    let report = session.apply_outcome(CombatOutcome::Victory, &catalog);

    let reward = report.reward.unwrap();
    assert_eq!(reward.base + reward.round_bonus + reward.interest, 6);
    assert_eq!(reward.experience, 2);
    assert_eq!(session.economy().gold, 16);
    assert_eq!(session.economy().win_streak, 1);
    assert_eq!(session.economy().lose_streak, 0);
}
