//! Content factory for loading a full content set from a data directory.

use std::path::{Path, PathBuf};

use battler_core::{CharacterCatalog, GameConfig};

use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── characters.ron
/// ├── enemies.ron
/// └── traits.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load the character catalog from `characters.ron`, `enemies.ron` and
    /// `traits.ron`.
    pub fn load_catalog(&self) -> LoadResult<CharacterCatalog> {
        CatalogLoader::load(
            &self.data_dir.join("characters.ron"),
            &self.data_dir.join("enemies.ron"),
            &self.data_dir.join("traits.ron"),
        )
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn loads_bundled_data_directory() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        let config = factory.load_config().unwrap();
        let catalog = factory.load_catalog().unwrap();

        assert_eq!(config, GameConfig::default());
        assert!(catalog.characters_of_tier(5).count() >= 2);
    }
}
