//! Content compiled into the binary from `data/`.

use battler_core::{CharacterCatalog, GameConfig};

use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult};

const CHARACTERS: &str = include_str!("../data/characters.ron");
const ENEMIES: &str = include_str!("../data/enemies.ron");
const TRAITS: &str = include_str!("../data/traits.ron");
const CONFIG: &str = include_str!("../data/config.toml");

/// The bundled character catalog.
pub fn default_catalog() -> LoadResult<CharacterCatalog> {
    CatalogLoader::from_str(CHARACTERS, ENEMIES, TRAITS)
}

/// The bundled game configuration.
pub fn default_config() -> LoadResult<GameConfig> {
    ConfigLoader::from_str(CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battler_core::{RaidSession, TemplateId};

    #[test]
    fn bundled_content_is_valid() {
        let catalog = default_catalog().unwrap();
        for tier in 1..=GameConfig::MAX_TIER {
            assert!(
                catalog.characters_of_tier(tier).next().is_some(),
                "tier {tier} has no characters"
            );
        }
        assert!(catalog.enemy(&TemplateId::from("wolf_spirit")).is_some());
        assert_eq!(catalog.trait_definitions().count(), 7);
    }

    #[test]
    fn bundled_content_starts_a_raid() {
        let catalog = default_catalog().unwrap();
        let config = default_config().unwrap();
        let session = RaidSession::new(config, &catalog, 7);
        session.check_invariants(&catalog).unwrap();
    }
}
