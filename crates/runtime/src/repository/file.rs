//! File-based SetupRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use battler_core::RaidSession;
use sha2::{Digest, Sha256};

use super::error::{RepositoryError, Result};
use super::traits::SetupRepository;
use super::types::{SaveMetadata, validate_raid_id};

const DIGEST_LEN: usize = 32;

/// File-based implementation of SetupRepository.
///
/// # File Format
///
/// Each raid is stored as two files:
/// - `{raid_id}.bin`: SHA-256 digest of the payload (32 bytes) followed by
///   the bincode-encoded [`RaidSession`]
/// - `{raid_id}.json`: [`SaveMetadata`] for listing saves without decoding them
///
/// Both are written to a temp file first and moved into place with a rename.
pub struct FileSetupRepository {
    base_dir: PathBuf,
}

impl FileSetupRepository {
    /// Create a new file-based repository rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn session_path(&self, raid_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.bin", raid_id))
    }

    fn metadata_path(&self, raid_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", raid_id))
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl SetupRepository for FileSetupRepository {
    fn save(&self, raid_id: &str, session: &RaidSession) -> Result<()> {
        validate_raid_id(raid_id)?;

        let payload =
            bincode::serialize(session).map_err(|e| RepositoryError::Encoding(e.to_string()))?;
        let digest = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(DIGEST_LEN + payload.len());
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&payload);

        let metadata = SaveMetadata::describe(raid_id, session, hex::encode(digest));
        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| RepositoryError::Metadata(e.to_string()))?;

        let path = self.session_path(raid_id);
        Self::write_atomic(&path, &bytes)?;
        Self::write_atomic(&self.metadata_path(raid_id), json.as_bytes())?;

        tracing::debug!(raid_id, round = session.round(), "saved raid to {}", path.display());
        Ok(())
    }

    fn load(&self, raid_id: &str) -> Result<Option<RaidSession>> {
        validate_raid_id(raid_id)?;
        let path = self.session_path(raid_id);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        if bytes.len() < DIGEST_LEN {
            return Err(RepositoryError::Truncated {
                raid_id: raid_id.to_owned(),
                len: bytes.len(),
            });
        }

        let (stored, payload) = bytes.split_at(DIGEST_LEN);
        let actual = Sha256::digest(payload);
        if stored != actual.as_slice() {
            return Err(RepositoryError::ChecksumMismatch {
                raid_id: raid_id.to_owned(),
                stored: hex::encode(stored),
                computed: hex::encode(actual),
            });
        }

        let session: RaidSession = bincode::deserialize(payload)
            .map_err(|e| RepositoryError::Encoding(e.to_string()))?;

        tracing::debug!(raid_id, round = session.round(), "loaded raid from {}", path.display());
        Ok(Some(session))
    }

    fn exists(&self, raid_id: &str) -> bool {
        validate_raid_id(raid_id).is_ok() && self.session_path(raid_id).exists()
    }

    fn delete(&self, raid_id: &str) -> Result<()> {
        validate_raid_id(raid_id)?;

        for path in [self.session_path(raid_id), self.metadata_path(raid_id)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        tracing::debug!(raid_id, "deleted raid save");
        Ok(())
    }

    fn list(&self) -> Result<Vec<SaveMetadata>> {
        let mut saves = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            let metadata: SaveMetadata =
                serde_json::from_str(&json).map_err(|e| RepositoryError::Metadata(e.to_string()))?;
            saves.push(metadata);
        }

        saves.sort_by(|a, b| a.raid_id.cmp(&b.raid_id));
        Ok(saves)
    }
}
