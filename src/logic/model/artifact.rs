//! Model Artifact - Fitted per-user model and its on-disk envelope
//!
//! On disk the artifact is serialized to a JSON payload string and wrapped
//! with a SHA-256 checksum of that payload:
//!
//! ```json
//! { "checksum": "<hex sha256>", "payload": "{...artifact json...}" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::features::{layout_hash, validate_layout, FeatureVector, FEATURE_VERSION};

use super::novelty::KernelBoundary;
use super::scaler::StandardScaler;
use super::ModelError;

/// Current artifact format version
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Number of training vectors the model was fitted on
    pub trained_on: usize,
    pub scaler: StandardScaler,
    pub boundary: KernelBoundary,
}

#[derive(Serialize, Deserialize)]
struct ArtifactEnvelope {
    checksum: String,
    payload: String,
}

impl ModelArtifact {
    pub fn new(scaler: StandardScaler, boundary: KernelBoundary, trained_on: usize) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            user_id: String::new(),
            created_at: Utc::now(),
            trained_on,
            scaler,
            boundary,
        }
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    /// Check format and feature layout against the running engine
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat(self.format_version));
        }
        validate_layout(self.feature_version, self.layout_hash)?;
        Ok(())
    }

    /// Signed novelty score of a vector, positive = consistent with the user
    pub fn decision(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        vector.validate()?;
        Ok(self.boundary.decision(&self.scaler.transform(vector)))
    }

    pub fn to_envelope(&self) -> Result<Vec<u8>, ModelError> {
        let payload = serde_json::to_string(self)?;
        let envelope = ArtifactEnvelope {
            checksum: checksum(&payload),
            payload,
        };
        Ok(serde_json::to_vec_pretty(&envelope)?)
    }

    /// Decode an envelope; `None` when the checksum does not match
    pub fn from_envelope(bytes: &[u8]) -> Result<Option<Self>, ModelError> {
        let envelope: ArtifactEnvelope = serde_json::from_slice(bytes)?;
        if checksum(&envelope.payload) != envelope.checksum {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&envelope.payload)?))
    }
}

fn checksum(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}
