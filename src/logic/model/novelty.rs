//! Novelty Boundary - One-class kernel density model
//!
//! The boundary keeps a subsample of the scaled training rows as support and
//! scores a point by its mean kernel similarity to them. The offset is the
//! `nu`-quantile of the leave-one-out training densities, so roughly `nu` of
//! the training rows fall outside the boundary.
//!
//! `decision(x) > 0` means inlier, `< 0` outlier.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::logic::config::{Gamma, Kernel, NoveltyParams};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::preprocess::percentile;

use super::artifact::ModelArtifact;
use super::scaler::StandardScaler;
use super::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelBoundary {
    pub kernel: Kernel,
    /// Resolved kernel width
    pub gamma: f64,
    /// Density at the decision boundary
    pub offset: f64,
    pub support: Vec<[f64; FEATURE_COUNT]>,
}

impl KernelBoundary {
    pub fn fit(scaled: ArrayView2<f64>, params: &NoveltyParams) -> Result<Self, ModelError> {
        let n = scaled.nrows();
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }

        let gamma = resolve_gamma(scaled, params.gamma);
        let stride = n.div_ceil(params.max_support.max(1));
        let support: Vec<[f64; FEATURE_COUNT]> =
            scaled.outer_iter().step_by(stride).map(to_row).collect();

        let mut boundary = Self {
            kernel: params.kernel,
            gamma,
            offset: 0.0,
            support,
        };

        let mut densities: Vec<f64> = (0..boundary.support.len())
            .map(|i| boundary.leave_one_out_density(i))
            .collect();
        densities.sort_by(|a, b| a.total_cmp(b));
        boundary.offset = percentile(&densities, params.nu * 100.0);

        Ok(boundary)
    }

    fn similarity(&self, a: &[f64; FEATURE_COUNT], b: &[f64; FEATURE_COUNT]) -> f64 {
        let distance: f64 = match self.kernel {
            Kernel::Rbf => a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum(),
            Kernel::Laplacian => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        };
        (-self.gamma * distance).exp()
    }

    /// Mean kernel similarity to the support set
    pub fn density(&self, point: &[f64; FEATURE_COUNT]) -> f64 {
        if self.support.is_empty() {
            return 0.0;
        }
        let total: f64 = self.support.iter().map(|s| self.similarity(point, s)).sum();
        total / self.support.len() as f64
    }

    fn leave_one_out_density(&self, index: usize) -> f64 {
        let m = self.support.len();
        if m < 2 {
            return 1.0;
        }
        let point = &self.support[index];
        let total: f64 = self
            .support
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, s)| self.similarity(point, s))
            .sum();
        total / (m - 1) as f64
    }

    /// Signed distance to the boundary, positive for inliers
    pub fn decision(&self, point: &[f64; FEATURE_COUNT]) -> f64 {
        self.density(point) - self.offset
    }
}

fn resolve_gamma(scaled: ArrayView2<f64>, gamma: Gamma) -> f64 {
    match gamma {
        Gamma::Value(g) => g,
        Gamma::Scale => {
            let len = scaled.len() as f64;
            let mean = scaled.sum() / len;
            let var = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len;
            if var > 0.0 {
                1.0 / (FEATURE_COUNT as f64 * var)
            } else {
                1.0
            }
        }
    }
}

fn to_row(row: ArrayView1<f64>) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for (dst, src) in out.iter_mut().zip(row.iter()) {
        *dst = *src;
    }
    out
}

// ============================================================================
// TRAINER
// ============================================================================

/// Fits a complete model artifact from raw training vectors
pub trait NoveltyTrainer: Send + Sync {
    fn fit(&self, rows: &[FeatureVector], params: &NoveltyParams) -> Result<ModelArtifact, ModelError>;
}

/// Standard scaler + kernel density boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelDensityTrainer;

impl NoveltyTrainer for KernelDensityTrainer {
    fn fit(&self, rows: &[FeatureVector], params: &NoveltyParams) -> Result<ModelArtifact, ModelError> {
        for row in rows {
            row.validate()?;
        }
        let scaler = StandardScaler::fit(rows)?;
        let scaled = scaler.transform_rows(rows)?;
        let boundary = KernelBoundary::fit(scaled.view(), params)?;

        log::info!(
            "Fitted novelty model: {} rows, {} support, gamma={:.4}, offset={:.4}",
            rows.len(),
            boundary.support.len(),
            boundary.gamma,
            boundary.offset
        );

        Ok(ModelArtifact::new(scaler, boundary, rows.len()))
    }
}
