//! Character catalog loader.

use std::path::Path;

use battler_core::{CharacterCatalog, CharacterTemplate, TraitDefinition};
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

/// Loader for the character catalog from RON files.
///
/// A catalog is three lists: purchasable characters, enemies and trait
/// ladders. The lists are validated together once all three are parsed.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load and validate a catalog from three RON files.
    pub fn load(characters: &Path, enemies: &Path, traits: &Path) -> LoadResult<CharacterCatalog> {
        let characters = read_file(characters)?;
        let enemies = read_file(enemies)?;
        let traits = read_file(traits)?;
        Self::from_str(&characters, &enemies, &traits)
    }

    /// Parse and validate a catalog from RON text.
    pub fn from_str(characters: &str, enemies: &str, traits: &str) -> LoadResult<CharacterCatalog> {
        let characters = Self::parse_templates(characters, "character")?;
        let enemies = Self::parse_templates(enemies, "enemy")?;
        let traits: Vec<TraitDefinition> = ron::from_str(traits)
            .map_err(|e| anyhow::anyhow!("Failed to parse trait RON: {}", e))?;

        debug!(
            characters = characters.len(),
            enemies = enemies.len(),
            traits = traits.len(),
            "catalog parsed"
        );

        let catalog = CharacterCatalog::new(characters, enemies, traits)
            .map_err(|e| anyhow::anyhow!("Invalid catalog: {}", e))?;
        Ok(catalog)
    }

    fn parse_templates(content: &str, kind: &str) -> LoadResult<Vec<CharacterTemplate>> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse {} RON: {}", kind, e))
    }
}
