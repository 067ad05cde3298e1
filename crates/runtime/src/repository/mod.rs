//! Repository layer for dynamic runtime data
//!
//! Repositories hold the raid between rounds: the Setup-phase
//! [`battler_core::RaidSession`] only. Static content (characters, enemies,
//! trait ladders) comes from `battler-content`, not from repositories.

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::FileSetupRepository;
pub use memory::InMemorySetupRepo;
pub use traits::SetupRepository;
pub use types::SaveMetadata;
