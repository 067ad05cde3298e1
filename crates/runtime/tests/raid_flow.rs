//! End-to-end raid flow through the session worker and combat driver.

use std::time::Duration;

use async_trait::async_trait;
use battler_core::{CommandError, GameConfig, Location, PhaseError, RoundPhase};
use battler_runtime::{
    CombatEvent, CombatTiming, Event, ImmediateCombatPlanner, Raid, RaidConfig, RaidView,
    Result, RuntimeError, SetupAction, SetupPlanner, Topic,
};
use tokio::time::timeout;

/// Millisecond ticks and a ten-millisecond "second".
fn fast_config() -> RaidConfig {
    RaidConfig {
        timing: CombatTiming {
            tick_interval: Duration::from_millis(1),
            check_interval: Duration::from_millis(1),
            countdown_interval: Duration::from_millis(10),
        },
        // Room for every tick of a full-length combat.
        event_buffer_size: 4096,
        ..RaidConfig::default()
    }
}

/// Real-time pacing, slow enough to act while combat is running.
fn slow_config() -> RaidConfig {
    RaidConfig::with_game_config(GameConfig {
        tick_ms: 50,
        ..GameConfig::default()
    })
}

async fn field_one_unit(raid: &Raid) {
    let handle = raid.handle();
    let unit = handle.purchase(0).await.unwrap().unit;
    handle.place(unit, Location::Board(3)).await.unwrap();
}

#[tokio::test]
async fn combat_resolves_and_reports() {
    let raid = Raid::builder().config(fast_config()).seed(11).build().unwrap();
    let handle = raid.handle();
    let mut combat_rx = handle.subscribe(Topic::Combat);
    field_one_unit(&raid).await;

    let report = timeout(Duration::from_secs(5), handle.play_round())
        .await
        .expect("combat finished in time")
        .unwrap();

    assert_eq!(report.round, 1);
    let view = handle.query().await.unwrap();
    if report.outcome.is_victory() {
        assert_eq!(view.phase, RoundPhase::Setup);
        assert_eq!(view.session.round(), 2);
    } else {
        assert_eq!(view.phase, RoundPhase::Resolution);
    }

    let mut started = false;
    let mut resolved = None;
    while let Ok(event) = combat_rx.try_recv() {
        match event {
            Event::Combat(CombatEvent::Started { round, .. }) => {
                assert_eq!(round, 1);
                started = true;
            }
            Event::Combat(CombatEvent::Resolved { outcome, .. }) => resolved = Some(outcome),
            _ => {}
        }
    }
    assert!(started);
    assert_eq!(resolved, Some(report.outcome));

    raid.shutdown().await.unwrap();
}

#[tokio::test]
async fn setup_commands_are_rejected_while_combat_runs() {
    let raid = Raid::builder().config(slow_config()).seed(3).build().unwrap();
    let handle = raid.handle();
    field_one_unit(&raid).await;
    let before = handle.query().await.unwrap().session;

    handle.start_combat().await.unwrap();

    let err = handle.purchase(1).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Command(CommandError::Phase(PhaseError::WrongPhase {
            expected: RoundPhase::Setup,
            actual: RoundPhase::Combat,
        }))
    ));
    assert!(handle.refresh().await.is_err());
    assert!(matches!(
        handle.setup_session().await,
        Err(RuntimeError::Phase(_))
    ));

    handle.abort_combat().await.unwrap();

    let after = handle.query().await.unwrap();
    assert_eq!(after.phase, RoundPhase::Setup);
    assert_eq!(after.session.round(), before.round());
    assert_eq!(after.session.roster(), before.roster());
    assert_eq!(after.session.economy(), before.economy());
    assert_eq!(after.session.pool(), before.pool());
    assert_eq!(after.session.shop(), before.shop());

    raid.shutdown().await.unwrap();
}

#[tokio::test]
async fn terminate_cancels_a_running_combat() {
    let raid = Raid::builder().config(slow_config()).seed(5).build().unwrap();
    let handle = raid.handle();
    let mut combat_rx = handle.subscribe(Topic::Combat);
    field_one_unit(&raid).await;
    handle.start_combat().await.unwrap();

    let (waiting, result) = tokio::join!(handle.await_resolution(), handle.terminate());

    assert!(matches!(waiting, Err(RuntimeError::CombatCancelled)));
    let result = result.unwrap();
    assert_eq!(result.rounds_played, 0);
    assert!(!result.success);

    let mut cancelled = false;
    while let Ok(event) = combat_rx.try_recv() {
        if let Event::Combat(CombatEvent::Cancelled { round }) = event {
            assert_eq!(round, 1);
            cancelled = true;
        }
    }
    assert!(cancelled);
    assert_eq!(handle.query().await.unwrap().phase, RoundPhase::Terminated);

    raid.shutdown().await.unwrap();
}

#[tokio::test]
async fn await_without_combat_is_an_error() {
    let raid = Raid::builder().config(fast_config()).seed(1).build().unwrap();
    let handle = raid.handle();

    assert!(matches!(
        handle.await_resolution().await,
        Err(RuntimeError::NoActiveCombat)
    ));
    assert!(matches!(
        handle.start_combat().await,
        Err(RuntimeError::Phase(PhaseError::NoUnitsOnBoard))
    ));

    raid.shutdown().await.unwrap();
}

#[tokio::test]
async fn late_await_still_receives_the_report() {
    let raid = Raid::builder().config(fast_config()).seed(11).build().unwrap();
    let handle = raid.handle();
    let mut combat_rx = handle.subscribe(Topic::Combat);
    field_one_unit(&raid).await;

    handle.start_combat().await.unwrap();
    let outcome = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(Event::Combat(CombatEvent::Resolved { outcome, .. })) =
                combat_rx.recv().await
            {
                break outcome;
            }
        }
    })
    .await
    .expect("combat resolves");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let report = handle.await_resolution().await.unwrap();
    assert_eq!(report.round, 1);
    assert_eq!(report.outcome, outcome);
    assert_ne!(handle.query().await.unwrap().phase, RoundPhase::Combat);

    raid.shutdown().await.unwrap();
}

#[tokio::test]
async fn play_round_reports_even_when_combat_is_instant() {
    let raid = Raid::builder().config(fast_config()).seed(11).build().unwrap();
    let handle = raid.handle();
    field_one_unit(&raid).await;

    let report = timeout(Duration::from_secs(5), handle.play_round())
        .await
        .expect("round completes")
        .unwrap();
    assert_eq!(report.round, 1);
    assert_eq!(handle.await_resolution().await.unwrap(), report);

    raid.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_board_closes_the_raid() {
    let raid = Raid::builder().config(fast_config()).seed(8).build().unwrap();

    let result = raid.play(&ImmediateCombatPlanner).await.unwrap();

    assert_eq!(result.rounds_played, 0);
    assert_eq!(result.rewards.experience, 0);
    raid.shutdown().await.unwrap();
}

/// Buys the first affordable offer and fields it.
struct FirstOfferPlanner;

#[async_trait]
impl SetupPlanner for FirstOfferPlanner {
    async fn next_action(&self, view: &RaidView) -> Result<SetupAction> {
        let roster = view.session.roster();
        let capacity = view.session.economy().max_team_size();

        if roster.board_count() < capacity
            && let Some(unit) = roster.bench_units().next()
            && let Some(slot) = roster.free_board_slot()
        {
            return Ok(SetupAction::Place {
                unit: unit.id,
                destination: Location::Board(slot),
            });
        }

        let affordable = view
            .offers()
            .find(|(_, slot, _)| slot.cost <= view.gold())
            .map(|(index, _, _)| index);
        match affordable {
            Some(index) if roster.free_bench_slot().is_some() => Ok(SetupAction::Purchase(index)),
            _ => Ok(SetupAction::StartCombat),
        }
    }

    async fn retry_after_defeat(&self, _view: &RaidView) -> bool {
        true
    }
}

#[tokio::test]
async fn planner_plays_bounded_rounds() {
    let config = RaidConfig {
        max_rounds: Some(3),
        ..fast_config()
    };
    let raid = Raid::builder().config(config).seed(42).build().unwrap();

    let result = timeout(Duration::from_secs(10), raid.play(&FirstOfferPlanner))
        .await
        .expect("raid finished in time")
        .unwrap();

    assert_eq!(result.rounds_played, 3);
    assert!(result.rounds_won <= 3);
    assert_eq!(result.rewards.experience, 25 * result.rounds_won);

    let view = raid.handle().query().await.unwrap();
    assert_eq!(view.phase, RoundPhase::Terminated);
    view.session.check_invariants(&view.catalog).unwrap();

    raid.shutdown().await.unwrap();
}
