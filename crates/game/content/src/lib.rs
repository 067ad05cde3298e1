//! Data-driven content definitions and loaders.
//!
//! This crate houses the static game content and the loaders for its data files:
//! - Character templates (data-driven via RON)
//! - Enemy templates (data-driven via RON)
//! - Trait ladders (data-driven via RON)
//! - Game configuration (data-driven via TOML)
//!
//! The default content set is compiled in through [`builtin`], so a raid can
//! start without a data directory on disk.
//!
//! All loaders use battler-core types directly with serde for RON/TOML deserialization.

#[cfg(feature = "loaders")]
pub mod builtin;
#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use builtin::{default_catalog, default_config};
#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, ContentFactory, LoadResult};
