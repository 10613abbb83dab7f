//! MMouse Core - Continuous Authentication Engine
//!
//! Verifies that the person moving the pointer is still the authenticated user.
//! Pointer events are segmented into batches, cleaned, reduced to a 17-value
//! movement feature vector and scored against a per-user novelty model. The
//! score drives a bounded trust value; the session is locked once trust drops
//! to the lockout threshold.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌──────────────┐   ┌────────────┐   ┌────────────┐
//! │  Listener  │──▶│ Segmenter  │──▶│ Preprocessor │──▶│  Features  │──▶│   Trust    │
//! │ (RawEvent) │   │  (batch)   │   │  (cleaned)   │   │ (vector)   │   │  Engine    │
//! └────────────┘   └────────────┘   └──────────────┘   └────────────┘   └─────┬──────┘
//!                                                                             │
//!                                              ┌──────────────┐  ┌────────────▼──┐
//!                                              │ ModelStore   │◀▶│   Verdict     │
//!                                              │ TrainingStore│  │ continue/block│
//!                                              └──────────────┘  └───────────────┘
//! ```
//!
//! ## Modules
//! - [`logic::capture`]: event labeling, segmentation, listener control, replay
//! - [`logic::preprocess`]: dedup, timestamp repair, clamping, IQR fencing
//! - [`logic::features`]: versioned feature layout and movement geometry
//! - [`logic::model`]: scaler, kernel novelty boundary, artifact persistence
//! - [`logic::dataset`]: per-user training sample store
//! - [`logic::trust`]: trust state machine and engine
//! - [`logic::session`]: async authentication session loop
//! - [`logic::lock`]: screen lock action

pub mod constants;
pub mod logic;

pub use logic::capture::{EventLabeler, RawEvent, Segmenter, SessionBatch};
pub use logic::config::EngineConfig;
pub use logic::features::{extract, FeatureVector, FEATURE_COUNT};
pub use logic::preprocess::{CleanedSample, Preprocessor};
pub use logic::session::{replay_vectors, AuthSession, ReplaySummary, SessionOutcome};
pub use logic::trust::{Decision, Phase, TrustEngine, TrustState, Verdict};

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] logic::config::ConfigError),

    #[error("Feature extraction error: {0}")]
    Extract(#[from] logic::features::ExtractError),

    #[error(transparent)]
    Layout(#[from] logic::features::LayoutMismatchError),

    #[error("Model error: {0}")]
    Model(#[from] logic::model::ModelError),

    #[error("Training store error: {0}")]
    Store(#[from] logic::dataset::StoreError),

    #[error("Screen lock error: {0}")]
    Lock(#[from] logic::lock::LockError),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
