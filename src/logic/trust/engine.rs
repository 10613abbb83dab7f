//! Trust Engine - Training / Monitoring transitions and persistence
//!
//! The engine holds no per-user state itself; callers own a `TrustState` per
//! session and pass it by `&mut` to `evaluate`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logic::config::EngineConfig;
use crate::logic::dataset::{SqliteTrainingStore, TrainingStore};
use crate::logic::features::{FeatureVector, LayoutInfo};
use crate::logic::model::{FileModelStore, KernelDensityTrainer, ModelStore, NoveltyTrainer};
use crate::Result;

use super::state::{Decision, Phase, TrustState, Verdict};

/// Training progress is logged at info level every this many stored vectors
const PROGRESS_LOG_INTERVAL: u64 = 1_000;

pub struct TrustEngine {
    config: EngineConfig,
    models: Box<dyn ModelStore>,
    training: Box<dyn TrainingStore>,
    trainer: Box<dyn NoveltyTrainer>,
}

/// Persisted model details for status output
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub created_at: DateTime<Utc>,
    pub trained_on: usize,
    pub support: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStatus {
    pub user_id: String,
    pub phase: Phase,
    pub training_vectors: u64,
    pub min_train_size: u64,
    pub model: Option<ModelSummary>,
    pub layout: LayoutInfo,
}

impl TrustEngine {
    pub fn new(
        config: EngineConfig,
        models: Box<dyn ModelStore>,
        training: Box<dyn TrainingStore>,
    ) -> Self {
        Self {
            config,
            models,
            training,
            trainer: Box::new(KernelDensityTrainer),
        }
    }

    /// Engine over the on-disk stores under `config.data_dir`
    pub fn open(config: EngineConfig) -> Result<Self> {
        let models = FileModelStore::new(config.model_dir());
        let training = SqliteTrainingStore::open(&config.training_db_path())?;
        log::info!("Engine data directory: {}", config.data_dir.display());
        Ok(Self::new(config, Box::new(models), Box::new(training)))
    }

    pub fn with_trainer(mut self, trainer: Box<dyn NoveltyTrainer>) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn training_store(&self) -> &dyn TrainingStore {
        self.training.as_ref()
    }

    pub fn model_store(&self) -> &dyn ModelStore {
        self.models.as_ref()
    }

    // ========================================================================
    // SESSION
    // ========================================================================

    /// Fresh trust state for a session: persisted model (if any), full trust
    pub fn begin_session(&self, user_id: &str) -> Result<TrustState> {
        let model = self.models.load(user_id)?;
        let state = TrustState::new(user_id, self.config.trust, model);

        match state.phase {
            Phase::Monitoring => log::info!("Session for {} starts in monitoring", user_id),
            Phase::Training => log::info!(
                "Session for {} starts in training ({}/{} vectors)",
                user_id,
                self.training.count(user_id)?,
                self.config.min_train_size
            ),
        }
        Ok(state)
    }

    /// Run one feature vector through the state machine
    pub fn evaluate(&self, state: &mut TrustState, vector: &FeatureVector) -> Result<Verdict> {
        vector.validate()?;

        if state.phase == Phase::Monitoring && state.model.is_none() {
            state.model = self.models.load(&state.user_id)?;
            if state.model.is_none() {
                log::warn!("No model for {} while monitoring, back to training", state.user_id);
                state.phase = Phase::Training;
            }
        }

        match state.phase {
            Phase::Training => self.training_step(state, vector),
            Phase::Monitoring => self.monitoring_step(state, vector),
        }
    }

    fn training_step(&self, state: &mut TrustState, vector: &FeatureVector) -> Result<Verdict> {
        let target = self.config.min_train_size;
        let count = self.training.count(&state.user_id)?;

        if count < target {
            self.append_with_retry(&state.user_id, vector)?;
            self.log_progress(&state.user_id, count + 1);
            return Ok(state.verdict(Decision::Continue, None));
        }

        let rows = self.training.read_all(&state.user_id)?;
        log::info!("Fitting model for {} on {} vectors", state.user_id, rows.len());

        let artifact = self
            .trainer
            .fit(&rows, &self.config.novelty)?
            .with_user(&state.user_id);
        self.models.save(&state.user_id, &artifact)?;

        state.model = Some(artifact);
        state.phase = Phase::Monitoring;
        log::info!("User {}: training -> monitoring", state.user_id);

        Ok(state.verdict(Decision::Continue, None))
    }

    fn monitoring_step(&self, state: &mut TrustState, vector: &FeatureVector) -> Result<Verdict> {
        let score = match state.model.as_ref() {
            Some(model) => model.decision(vector)?,
            None => return Ok(state.verdict(Decision::Continue, None)),
        };
        let decision = state.apply_score(score);

        log::debug!(
            "User {}: score={:.4} trust={:.2}",
            state.user_id,
            score,
            state.trust_value
        );

        match decision {
            Decision::Continue => {
                if self.config.online_adaptation && state.has_full_trust() {
                    self.append_with_retry(&state.user_id, vector)?;
                }
            }
            Decision::Block => {
                log::warn!(
                    "User {} blocked: trust {:.2} <= {:.2}",
                    state.user_id,
                    state.trust_value,
                    state.params.lockout_threshold
                );
                state.model = None;
            }
        }

        Ok(state.verdict(decision, Some(score)))
    }

    fn log_progress(&self, user_id: &str, stored: u64) {
        let target = self.config.min_train_size;
        let remaining_secs = target.saturating_sub(stored) as f64 * self.config.idle_gap_threshold;

        if stored % PROGRESS_LOG_INTERVAL == 0 || stored >= target {
            log::info!(
                "Training {}: {}/{} vectors, ~{:.0}s remaining",
                user_id,
                stored,
                target,
                remaining_secs
            );
        } else {
            log::debug!("Training {}: {}/{} vectors", user_id, stored, target);
        }
    }

    /// Append with linear backoff between attempts
    fn append_with_retry(&self, user_id: &str, vector: &FeatureVector) -> Result<()> {
        let attempts = self.config.store_retry_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.training.append(user_id, vector) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    log::warn!(
                        "Training store append failed (attempt {}/{}): {}",
                        attempt,
                        attempts,
                        e
                    );
                    std::thread::sleep(self.config.store_retry_backoff() * attempt);
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Training store append failed after {} attempts: {}", attempts, e);
                    return Err(e.into());
                }
            }
        }
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    pub fn status(&self, user_id: &str) -> Result<UserStatus> {
        let model = self.models.load(user_id)?;
        Ok(UserStatus {
            user_id: user_id.to_string(),
            phase: if model.is_some() {
                Phase::Monitoring
            } else {
                Phase::Training
            },
            training_vectors: self.training.count(user_id)?,
            min_train_size: self.config.min_train_size,
            model: model.map(|m| ModelSummary {
                created_at: m.created_at,
                trained_on: m.trained_on,
                support: m.boundary.support.len(),
            }),
            layout: LayoutInfo::current(),
        })
    }
}
