//! CLI configuration read from process environment variables.
use std::env;
use std::path::PathBuf;

/// Raid rounds played when `BATTLER_MAX_ROUNDS` is unset.
pub const DEFAULT_MAX_ROUNDS: u32 = 15;

/// Configuration for one headless raid.
#[derive(Clone, Debug, PartialEq)]
pub struct CliConfig {
    pub seed: Option<u64>,
    pub max_rounds: Option<u32>,
    pub player_level: u32,
    pub save_dir: Option<PathBuf>,
    pub tick_ms: Option<u32>,
    pub config_path: Option<PathBuf>,
    pub log_stderr: bool,
    pub raid_id: Option<String>,
    pub resume: bool,
    /// Defeats the planner may retry before conceding.
    pub retries: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_rounds: Some(DEFAULT_MAX_ROUNDS),
            player_level: 1,
            save_dir: None,
            tick_ms: None,
            config_path: None,
            log_stderr: false,
            raid_id: None,
            resume: false,
            retries: 2,
        }
    }
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLER_SEED` - Raid seed (default: random)
    /// - `BATTLER_MAX_ROUNDS` - Combat rounds before the raid closes, `0` for no limit (default: 15)
    /// - `BATTLER_PLAYER_LEVEL` - Out-of-raid progression level (default: 1)
    /// - `BATTLER_SAVE_DIR` - Directory for Setup saves (default: none, saving disabled)
    /// - `BATTLER_TICK_MS` - Combat tick interval override
    /// - `BATTLER_CONFIG` - TOML file overriding the game config
    /// - `BATTLER_LOG_STDERR` - Also log to stderr
    /// - `BATTLER_RAID_ID` - Raid identifier used for saves
    /// - `BATTLER_RESUME` - Continue the saved raid named by `BATTLER_RAID_ID`
    /// - `BATTLER_RETRIES` - Defeats retried before conceding (default: 2)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(read: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        config.seed = parse(read("BATTLER_SEED"));

        if let Some(max) = parse::<u32>(read("BATTLER_MAX_ROUNDS")) {
            config.max_rounds = (max > 0).then_some(max);
        }

        if let Some(level) = parse::<u32>(read("BATTLER_PLAYER_LEVEL")) {
            config.player_level = level.max(1);
        }

        config.save_dir = read("BATTLER_SAVE_DIR").map(PathBuf::from);
        config.tick_ms = parse::<u32>(read("BATTLER_TICK_MS")).filter(|ms| *ms > 0);
        config.config_path = read("BATTLER_CONFIG").map(PathBuf::from);
        config.log_stderr = flag(read("BATTLER_LOG_STDERR"));
        config.raid_id = read("BATTLER_RAID_ID");
        config.resume = flag(read("BATTLER_RESUME"));

        if let Some(retries) = parse(read("BATTLER_RETRIES")) {
            config.retries = retries;
        }

        config
    }
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.trim().parse().ok()
}

/// A set variable counts as `true` unless it parses as `false`.
fn flag(value: Option<String>) -> bool {
    match value {
        Some(value) => value.trim().parse::<bool>().unwrap_or(value.trim() != "0"),
        None => false,
    }
}
