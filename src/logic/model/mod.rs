//! Model Module - Per-user Novelty Model
//!
//! A standard scaler followed by a kernel density boundary, fitted on the
//! legitimate user's vectors only. Fitted models are persisted per user as a
//! checksummed JSON envelope.

pub mod artifact;
pub mod novelty;
pub mod scaler;
pub mod storage;


use std::path::PathBuf;

use crate::logic::features::LayoutMismatchError;

pub use artifact::{ModelArtifact, MODEL_FORMAT_VERSION};
pub use novelty::{KernelBoundary, KernelDensityTrainer, NoveltyTrainer};
pub use scaler::StandardScaler;
pub use storage::{FileModelStore, MemoryModelStore, ModelStore};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("unsupported model format version {0}")]
    UnsupportedFormat(u32),

    #[error("model checksum mismatch in {path}")]
    ChecksumMismatch { path: PathBuf },

    #[error("model in {path} belongs to user {found}")]
    UserMismatch { path: PathBuf, found: String },

    #[error("model IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
