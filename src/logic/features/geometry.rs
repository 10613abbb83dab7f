//! Movement Geometry - Feature extraction from cleaned samples
//!
//! Shared intermediates (steps, elapsed time, chord, distances) are computed
//! once in `MotionContext` and handed to the dependent features. Degenerate
//! geometry (zero norms, zero elapsed time) resolves to `0.0`.

use crate::logic::preprocess::CleanedSample;

use super::layout::FEATURE_COUNT;
use super::vector::FeatureVector;

/// Stand-in for a zero time step
pub const MIN_DT: f64 = 1e-3;

/// Direction histogram size
pub const DIRECTION_BINS: usize = 8;

/// Threshold for distance / curve length binning (pixels)
pub const DISTANCE_BIN_THRESHOLD: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("need at least 2 samples, got {0}")]
    TooFewSamples(usize),
}

// ============================================================================
// BINNING
// ============================================================================

/// Piecewise bin index (0-19) of a distance
///
/// Five coarse bins up to `threshold`, ten finer ones up to twice it, four up
/// to three times it, and a final catch-all bin.
pub fn bin(value: f64, threshold: f64) -> f64 {
    if value.is_nan() || threshold <= 0.0 {
        return 0.0;
    }
    let value = value.max(0.0);
    if value <= threshold {
        (value / (threshold / 5.0)).floor()
    } else if value <= 2.0 * threshold {
        5.0 + ((value - threshold) / (threshold / 10.0)).floor()
    } else if value <= 3.0 * threshold {
        15.0 + ((value - 2.0 * threshold) / (threshold / 4.0)).floor()
    } else {
        19.0
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

struct MotionContext<'a> {
    samples: &'a [CleanedSample],
    /// Euclidean length of each consecutive step
    steps: Vec<f64>,
    /// Last timestamp minus first timestamp
    elapsed: f64,
    /// Vector from first to last sample
    chord: (f64, f64),
    actual_distance: f64,
    curve_length: f64,
}

impl<'a> MotionContext<'a> {
    fn new(samples: &'a [CleanedSample]) -> Self {
        let first = samples[0];
        let last = samples[samples.len() - 1];

        let steps: Vec<f64> = samples
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .collect();
        let chord = (last.x - first.x, last.y - first.y);

        Self {
            samples,
            curve_length: steps.iter().sum(),
            steps,
            elapsed: last.timestamp - first.timestamp,
            actual_distance: chord.0.hypot(chord.1),
            chord,
        }
    }

    /// `value / elapsed`, or 0 when no time passed
    fn per_elapsed(&self, value: f64) -> f64 {
        if self.elapsed == 0.0 {
            0.0
        } else {
            value / self.elapsed
        }
    }

    fn interior(&self) -> &'a [CleanedSample] {
        let n = self.samples.len();
        if n < 3 {
            &[]
        } else {
            &self.samples[1..n - 1]
        }
    }
}

fn guarded_dt(dt: f64) -> f64 {
    if dt == 0.0 {
        MIN_DT
    } else {
        dt
    }
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// ============================================================================
// FEATURES
// ============================================================================

/// Central-difference gradient, one-sided at both ends
fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| {
            if i == 0 {
                values[1] - values[0]
            } else if i == n - 1 {
                values[n - 1] - values[n - 2]
            } else {
                (values[i + 1] - values[i - 1]) / 2.0
            }
        })
        .collect()
}

fn direction_bin(samples: &[CleanedSample]) -> f64 {
    let xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.y).collect();
    let gx = gradient(&xs);
    let gy = gradient(&ys);

    let mut counts = [0usize; DIRECTION_BINS];
    for (dx, dy) in gx.iter().zip(gy.iter()) {
        let angle = dy.atan2(*dx).to_degrees() + 180.0;
        let bin = (angle % DIRECTION_BINS as f64) as usize;
        counts[bin.min(DIRECTION_BINS - 1)] += 1;
    }

    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    best as f64
}

fn curve_speed(ctx: &MotionContext) -> f64 {
    mean(
        ctx.steps
            .iter()
            .zip(ctx.samples.windows(2))
            .map(|(len, w)| len / guarded_dt(w[1].timestamp - w[0].timestamp)),
    )
}

/// Signed distance of each interior sample from the chord
fn chord_offsets(ctx: &MotionContext) -> Vec<f64> {
    if ctx.actual_distance == 0.0 {
        return Vec::new();
    }
    let origin = ctx.samples[0];
    let (cx, cy) = ctx.chord;
    ctx.interior()
        .iter()
        .map(|p| (cx * (p.y - origin.y) - cy * (p.x - origin.x)) / ctx.actual_distance)
        .collect()
}

fn mean_curvature(samples: &[CleanedSample]) -> f64 {
    mean(samples.iter().filter_map(|s| {
        let radius = s.x.hypot(s.y);
        (radius != 0.0).then(|| s.y.atan2(s.x) / radius)
    }))
}

fn mean_curvature_change_rate(samples: &[CleanedSample]) -> f64 {
    let last = samples[samples.len() - 1];
    mean(samples[..samples.len() - 1].iter().filter_map(|s| {
        let radius = (last.x - s.x).hypot(last.y - s.y);
        (radius != 0.0).then(|| s.y.atan2(s.x) / radius)
    }))
}

fn mean_angular_velocity(samples: &[CleanedSample]) -> f64 {
    mean(samples.windows(3).filter_map(|w| {
        let (prev, mid, next) = (w[0], w[1], w[2]);
        let a = (prev.x - mid.x, prev.y - mid.y);
        let b = (next.x - mid.x, next.y - mid.y);
        let norm = a.0.hypot(a.1) * b.0.hypot(b.1);
        if norm == 0.0 {
            return None;
        }
        let cos = ((a.0 * b.0 + a.1 * b.1) / norm).clamp(-1.0, 1.0);
        Some(cos.acos() / guarded_dt(next.timestamp - prev.timestamp))
    }))
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Reduce a cleaned batch to its movement feature vector
pub fn extract(samples: &[CleanedSample]) -> Result<FeatureVector, ExtractError> {
    if samples.len() < 2 {
        return Err(ExtractError::TooFewSamples(samples.len()));
    }
    let ctx = MotionContext::new(samples);

    let length_ratio = if ctx.actual_distance == 0.0 {
        0.0
    } else {
        ctx.curve_length / ctx.actual_distance
    };
    let curve_speed = curve_speed(&ctx);

    let offsets = chord_offsets(&ctx);
    let movement_offset = mean(offsets.iter().copied());
    let movement_error = mean(offsets.iter().map(|o| o.abs()));
    let movement_variability = mean(
        ctx.interior()
            .iter()
            .map(|p| (p.y - movement_offset).powi(2)),
    )
    .sqrt();

    let curvature = mean_curvature(samples);
    let curvature_velocity = ctx.per_elapsed(curvature);

    let values: [f64; FEATURE_COUNT] = [
        direction_bin(samples),
        ctx.actual_distance,
        bin(ctx.actual_distance, DISTANCE_BIN_THRESHOLD),
        ctx.curve_length,
        bin(ctx.curve_length, DISTANCE_BIN_THRESHOLD),
        length_ratio,
        ctx.per_elapsed(ctx.actual_distance),
        curve_speed,
        ctx.per_elapsed(curve_speed),
        movement_offset,
        movement_error,
        movement_variability,
        curvature,
        mean_curvature_change_rate(samples),
        curvature_velocity,
        ctx.per_elapsed(curvature_velocity),
        mean_angular_velocity(samples),
    ];

    Ok(FeatureVector::from_values(values))
}
