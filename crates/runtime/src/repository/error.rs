//! Failures reading or writing saved raids.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("save store lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session encoding failed: {0}")]
    Encoding(String),

    #[error("save metadata error: {0}")]
    Metadata(String),

    #[error("save for {raid_id} is truncated ({len} bytes)")]
    Truncated { raid_id: String, len: usize },

    #[error("checksum mismatch for {raid_id}: stored {stored}, computed {computed}")]
    ChecksumMismatch {
        raid_id: String,
        stored: String,
        computed: String,
    },

    #[error("invalid raid id {0:?}")]
    InvalidRaidId(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
