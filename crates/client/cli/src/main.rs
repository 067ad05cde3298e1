//! Headless raid runner.
//!
//! Plays one raid with [`GreedyPlanner`] and prints each round and the final
//! result. Configuration comes from `BATTLER_*` environment variables; see
//! [`CliConfig::from_env`].
mod config;
mod logging;
mod planner;

use anyhow::{Context, Result};
use battler_content::ConfigLoader;
use battler_core::{ProgressionContext, RaidResult, RoundReport};
use battler_runtime::{
    CombatTiming, Event, FileSetupRepository, Raid, RaidConfig, RaidEvent, Topic,
};
use tokio::sync::broadcast::error::RecvError;

use crate::config::CliConfig;
use crate::planner::GreedyPlanner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = CliConfig::from_env();
    let _guard = logging::setup_logging(config.log_stderr)?;

    let raid = build_raid(&config)?;
    println!("raid {} started", raid.raid_id());

    let mut events = raid.subscribe(Topic::Raid);
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::Raid(RaidEvent::RoundCompleted(report))) => print_round(&report),
                Ok(Event::Raid(RaidEvent::Closed(_))) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "round printer lagged");
                }
            }
        }
    });

    let planner = GreedyPlanner::new(config.retries);
    let result = raid.play(&planner).await;
    raid.shutdown().await.context("shutting down raid")?;
    let _ = printer.await;

    let result = result.context("playing raid")?;
    print_result(&result);
    Ok(())
}

fn build_raid(config: &CliConfig) -> Result<Raid> {
    let mut game_config = match &config.config_path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("loading game config {}", path.display()))?,
        None => battler_content::default_config()?,
    };
    if let Some(tick_ms) = config.tick_ms {
        game_config.tick_ms = tick_ms;
    }

    let mut raid_config = RaidConfig::with_game_config(game_config);
    raid_config.timing = CombatTiming::for_tick_ms(raid_config.game_config.tick_ms);
    raid_config.max_rounds = config.max_rounds;
    raid_config.autosave = config.save_dir.is_some();

    let mut builder = Raid::builder()
        .config(raid_config)
        .progression(ProgressionContext {
            player_level: config.player_level,
            ..ProgressionContext::default()
        })
        .resume(config.resume);

    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    if let Some(raid_id) = &config.raid_id {
        builder = builder.raid_id(raid_id.clone());
    }
    if let Some(dir) = &config.save_dir {
        let repository = FileSetupRepository::new(dir)
            .with_context(|| format!("opening save directory {}", dir.display()))?;
        builder = builder.repository(repository);
    }

    builder.build().context("building raid")
}

fn print_round(report: &RoundReport) {
    let gold = report.reward.as_ref().map(|reward| reward.gold()).unwrap_or_default();
    println!(
        "round {:>2}: {:<8} +{gold} gold (gold {}, level {})",
        report.round,
        if report.outcome.is_victory() { "victory" } else { "defeat" },
        report.economy.gold,
        report.economy.level,
    );
}

fn print_result(result: &RaidResult) {
    println!(
        "raid {}: {} of {} rounds won, {} experience, {} currency",
        if result.success { "cleared" } else { "failed" },
        result.rounds_won,
        result.rounds_played,
        result.rewards.experience,
        result.rewards.currency,
    );
}
