//! Game configuration loader.

use std::path::Path;

use battler_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Fields missing from the file keep their [`GameConfig::default`] values.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::from_str(&content)
    }

    /// Parse config data from TOML text.
    pub fn from_str(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.tick_ms == 0 {
            anyhow::bail!("tick_ms must be positive");
        }
        if config.combat_seconds == 0 {
            anyhow::bail!("combat_seconds must be positive");
        }
        if config.starting_level == 0 || config.starting_level > GameConfig::MAX_LEVEL {
            anyhow::bail!(
                "starting_level must be in 1..={}, got {}",
                GameConfig::MAX_LEVEL,
                config.starting_level
            );
        }

        Ok(config)
    }
}
