use serde::{Deserialize, Serialize};

use crate::constants::MAX_TRUST_VALUE;
use crate::logic::config::TrustParams;
use crate::logic::model::ModelArtifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Collecting vectors, no model yet
    Training,
    /// Scoring vectors against the fitted model
    Monitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Continue,
    Block,
}

/// Outcome of evaluating one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub trust_value: f64,
    pub phase: Phase,
    /// Novelty score, `None` while training
    pub score: Option<f64>,
}

impl Verdict {
    pub fn is_block(&self) -> bool {
        self.decision == Decision::Block
    }
}

/// Trust change for one novelty score
///
/// `ΔT = min(-D + D(1 + 1/C) / (1/C + exp(-(score - A) / B)), C)`, bounded to
/// `[-D, C]`. A NaN result counts as the full penalty `-D`.
pub fn trust_delta(score: f64, params: &TrustParams) -> f64 {
    let TrustParams { a, b, c, d, .. } = *params;
    let up = d * (1.0 + 1.0 / c);
    let down = 1.0 / c + (-(score - a) / b).exp();
    let delta = -d + up / down;
    if delta.is_nan() {
        -d
    } else {
        delta.min(c)
    }
}

/// Session-owned trust state of one user
#[derive(Debug, Clone)]
pub struct TrustState {
    pub user_id: String,
    pub phase: Phase,
    pub trust_value: f64,
    pub params: TrustParams,
    pub model: Option<ModelArtifact>,
}

impl TrustState {
    /// Monitoring when a model is present, Training otherwise; full trust
    pub fn new(user_id: &str, params: TrustParams, model: Option<ModelArtifact>) -> Self {
        let phase = if model.is_some() {
            Phase::Monitoring
        } else {
            Phase::Training
        };
        Self {
            user_id: user_id.to_string(),
            phase,
            trust_value: MAX_TRUST_VALUE,
            params,
            model,
        }
    }

    pub fn reset_trust(&mut self) {
        self.trust_value = MAX_TRUST_VALUE;
    }

    /// Fold one score into the trust value and decide
    pub fn apply_score(&mut self, score: f64) -> Decision {
        let delta = trust_delta(score, &self.params);
        self.trust_value = (self.trust_value + delta).clamp(0.0, MAX_TRUST_VALUE);

        if self.trust_value <= self.params.lockout_threshold {
            Decision::Block
        } else {
            Decision::Continue
        }
    }

    pub fn has_full_trust(&self) -> bool {
        self.trust_value >= MAX_TRUST_VALUE
    }

    pub fn verdict(&self, decision: Decision, score: Option<f64>) -> Verdict {
        Verdict {
            decision,
            trust_value: self.trust_value,
            phase: self.phase,
            score,
        }
    }
}
