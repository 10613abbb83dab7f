//! Preprocessor - Batch Cleaning
//!
//! Turns a raw session batch into timestamp/x/y samples:
//! 1. duplicate suppression
//! 2. timestamp-collision repair (midpoint of neighbours)
//! 3. negative coordinate clamping
//! 4. per-axis upper Tukey fence (`Q3 + 1.5 * IQR`), x then y
//!
//! The last raw event of a batch is never emitted. Only the upper fence is
//! applied; negative excursions are already removed by clamping.


use serde::{Deserialize, Serialize};

use crate::logic::capture::SessionBatch;

/// Tukey fence multiplier
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Cleaned pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanedSample {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
}

impl CleanedSample {
    pub fn new(timestamp: f64, x: f64, y: f64) -> Self {
        Self { timestamp, x, y }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    min_action_count: usize,
}

impl Preprocessor {
    pub fn new(min_action_count: usize) -> Self {
        Self { min_action_count }
    }

    pub fn min_action_count(&self) -> usize {
        self.min_action_count
    }

    /// Clean a batch; empty when it holds fewer than `min_action_count` events
    pub fn clean(&self, batch: &SessionBatch) -> Vec<CleanedSample> {
        let raw = batch.events();
        if raw.len() < self.min_action_count || raw.len() < 2 {
            return Vec::new();
        }

        let mut samples = Vec::with_capacity(raw.len() - 1);
        for i in 0..raw.len() - 1 {
            let event = &raw[i];
            let mut timestamp = event.timestamp;

            if i > 0 {
                let prev = &raw[i - 1];
                if prev == event {
                    continue;
                }
                if prev.timestamp == timestamp {
                    timestamp = (prev.timestamp + raw[i + 1].timestamp) / 2.0;
                }
            }

            samples.push(CleanedSample::new(
                timestamp,
                f64::from(event.x.max(0)),
                f64::from(event.y.max(0)),
            ));
        }

        fence_upper(&mut samples, |s| &mut s.x);
        fence_upper(&mut samples, |s| &mut s.y);
        samples
    }
}

// ============================================================================
// OUTLIER FENCING
// ============================================================================

/// Percentile with linear interpolation between closest ranks
///
/// `sorted` must be ascending and non-empty.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Upper Tukey fence of a column, `None` for an empty column
pub fn upper_fence(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    Some(q3 + IQR_FENCE_FACTOR * (q3 - q1))
}

fn fence_upper<F>(samples: &mut [CleanedSample], mut axis: F)
where
    F: FnMut(&mut CleanedSample) -> &mut f64,
{
    let column: Vec<f64> = samples.iter_mut().map(|s| *axis(s)).collect();
    let Some(fence) = upper_fence(&column) else {
        return;
    };
    for sample in samples.iter_mut() {
        let value = axis(sample);
        if *value > fence {
            *value = fence;
        }
    }
}
