//! Model Storage - Per-user artifact persistence

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use super::artifact::ModelArtifact;
use super::ModelError;

pub trait ModelStore: Send + Sync {
    /// Fitted model for a user, `None` if none was persisted yet
    fn load(&self, user_id: &str) -> Result<Option<ModelArtifact>, ModelError>;

    fn save(&self, user_id: &str, artifact: &ModelArtifact) -> Result<(), ModelError>;
}

// ============================================================================
// FILE STORE
// ============================================================================

/// Bytes of the user id digest kept in file names
const USER_DIGEST_BYTES: usize = 8;

/// One `model_<user>_<digest>.json` envelope per user under a directory
#[derive(Debug, Clone)]
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `model_<readable id>_<id digest>.json`
    ///
    /// The readable part only keeps `[A-Za-z0-9_-]`; the digest of the raw id
    /// keeps distinct users in distinct files.
    pub fn path_for(&self, user_id: &str) -> PathBuf {
        let readable: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let digest = Sha256::digest(user_id.as_bytes());
        let suffix = hex::encode(&digest[..USER_DIGEST_BYTES]);
        self.dir.join(format!("model_{}_{}.json", readable, suffix))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ModelError + '_ {
    move |source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ModelStore for FileModelStore {
    fn load(&self, user_id: &str) -> Result<Option<ModelArtifact>, ModelError> {
        let path = self.path_for(user_id);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path).map_err(io_error(&path))?;
        let artifact = ModelArtifact::from_envelope(&data)?
            .ok_or_else(|| ModelError::ChecksumMismatch { path: path.clone() })?;

        artifact.validate()?;
        if artifact.user_id != user_id {
            return Err(ModelError::UserMismatch {
                path,
                found: artifact.user_id,
            });
        }

        log::info!(
            "Loaded model for {} ({} training vectors, created {})",
            user_id,
            artifact.trained_on,
            artifact.created_at
        );
        Ok(Some(artifact))
    }

    fn save(&self, user_id: &str, artifact: &ModelArtifact) -> Result<(), ModelError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let path = self.path_for(user_id);
        let tmp = path.with_extension("json.tmp");
        let bytes = artifact.to_envelope()?;
        fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;

        log::info!("Saved model for {} to {}", user_id, path.display());
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryModelStore {
    models: RwLock<HashMap<String, ModelArtifact>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for MemoryModelStore {
    fn load(&self, user_id: &str) -> Result<Option<ModelArtifact>, ModelError> {
        self.models.read().get(user_id).cloned().map_or(Ok(None), |artifact| {
            artifact.validate()?;
            Ok(Some(artifact))
        })
    }

    fn save(&self, user_id: &str, artifact: &ModelArtifact) -> Result<(), ModelError> {
        self.models.write().insert(user_id.to_string(), artifact.clone());
        Ok(())
    }
}
