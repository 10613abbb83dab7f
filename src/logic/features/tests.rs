//! Extraction tests over hand-built and preprocessed batches

use std::f64::consts::PI;

use super::*;
use crate::logic::capture::{RawEvent, SessionBatch};
use crate::logic::preprocess::{CleanedSample, Preprocessor};

fn sample(t: f64, x: f64, y: f64) -> CleanedSample {
    CleanedSample::new(t, x, y)
}

fn feature(vector: &FeatureVector, name: &str) -> f64 {
    vector.named()[name]
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// BINNING
// ============================================================================

#[test]
fn test_bin_boundaries() {
    assert_eq!(bin(0.0, 1000.0), 0.0);
    assert_eq!(bin(199.0, 1000.0), 0.0);
    assert_eq!(bin(200.0, 1000.0), 1.0);
    assert_eq!(bin(1000.0, 1000.0), 5.0);
    assert_eq!(bin(1270.0, 1000.0), 7.0);
    assert_eq!(bin(2500.0, 1000.0), 17.0);
    assert_eq!(bin(3500.0, 1000.0), 19.0);
}

#[test]
fn test_bin_is_monotone_and_bounded() {
    let mut last = 0.0;
    for step in 0..400 {
        let b = bin(step as f64 * 10.0, 1000.0);
        assert!(b >= last, "bin decreased at {}", step);
        assert!((0.0..=19.0).contains(&b));
        last = b;
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

#[test]
fn test_too_few_samples() {
    assert_eq!(extract(&[]).unwrap_err(), ExtractError::TooFewSamples(0));
    assert_eq!(
        extract(&[sample(0.0, 1.0, 1.0)]).unwrap_err(),
        ExtractError::TooFewSamples(1)
    );
}

#[test]
fn test_scenario_a_through_preprocessor() {
    let raw = SessionBatch::new(vec![
        RawEvent::moved(0.0, 10, 10),
        RawEvent::moved(0.5, 20, 10),
        RawEvent::moved(1.0, 30, 10),
        RawEvent::moved(1.5, 2000, 10),
        RawEvent::moved(2.0, 2010, 10),
    ]);
    let samples = Preprocessor::new(5).clean(&raw);
    let v = extract(&samples).unwrap();

    assert!(v.validate().is_ok());
    assert_eq!(feature(&v, "actual_distance"), 1270.0);
    assert_eq!(feature(&v, "actual_distance_bin"), 7.0);
    assert_eq!(feature(&v, "curve_length"), 1270.0);
    assert_eq!(feature(&v, "length_ratio"), 1.0);
    assert!(approx(feature(&v, "actual_speed"), 1270.0 / 1.5));
    assert!(approx(feature(&v, "curve_speed"), (20.0 + 20.0 + 2500.0) / 3.0));
}

#[test]
fn test_straight_line_geometry() {
    let samples = vec![
        sample(0.0, 10.0, 10.0),
        sample(0.5, 20.0, 10.0),
        sample(1.0, 30.0, 10.0),
        sample(1.5, 40.0, 10.0),
    ];
    let v = extract(&samples).unwrap();

    assert_eq!(feature(&v, "direction_bin"), 4.0);
    assert_eq!(feature(&v, "mean_movement_offset"), 0.0);
    assert_eq!(feature(&v, "mean_movement_error"), 0.0);
    // variability is taken over the interior y coordinates
    assert!(approx(feature(&v, "mean_movement_variability"), 10.0));
    // straight path: every interior angle is pi, over a 1s window
    assert!(approx(feature(&v, "mean_angular_velocity"), PI));
}

#[test]
fn test_chord_offset_sign() {
    // bulge to the left of a rightward chord
    let samples = vec![
        sample(0.0, 0.0, 0.0),
        sample(0.1, 5.0, 4.0),
        sample(0.2, 10.0, 0.0),
    ];
    let v = extract(&samples).unwrap();
    assert!(approx(feature(&v, "mean_movement_offset"), 4.0));
    assert!(approx(feature(&v, "mean_movement_error"), 4.0));

    let mirrored: Vec<CleanedSample> = samples
        .iter()
        .map(|s| sample(s.timestamp, s.x, 10.0 - s.y))
        .collect();
    let v = extract(&mirrored).unwrap();
    assert!(approx(feature(&v, "mean_movement_offset"), -4.0));
    assert!(approx(feature(&v, "mean_movement_error"), 4.0));
}

#[test]
fn test_degenerate_batch_stays_finite() {
    let samples = vec![sample(0.0, 5.0, 5.0), sample(0.0, 5.0, 5.0)];
    let v = extract(&samples).unwrap();
    assert!(v.is_finite());
    assert_eq!(feature(&v, "actual_distance"), 0.0);
    assert_eq!(feature(&v, "length_ratio"), 0.0);
    assert_eq!(feature(&v, "actual_speed"), 0.0);
    assert_eq!(feature(&v, "curve_speed"), 0.0);
    assert_eq!(feature(&v, "mean_angular_velocity"), 0.0);
}

#[test]
fn test_origin_samples_skip_curvature() {
    let samples = vec![sample(0.0, 0.0, 0.0), sample(1.0, 0.0, 0.0), sample(2.0, 0.0, 0.0)];
    let v = extract(&samples).unwrap();
    assert!(v.is_finite());
    assert_eq!(feature(&v, "mean_curvature"), 0.0);
    assert_eq!(feature(&v, "mean_curvature_change_rate"), 0.0);
}

#[test]
fn test_zero_step_time_is_guarded() {
    let samples = vec![
        sample(1.0, 0.0, 0.0),
        sample(1.0, 3.0, 4.0),
        sample(2.0, 6.0, 8.0),
    ];
    let v = extract(&samples).unwrap();
    assert!(v.is_finite());
    // (5 / MIN_DT + 5 / 1.0) / 2
    assert!(approx(feature(&v, "curve_speed"), (5.0 / MIN_DT + 5.0) / 2.0));
}

#[test]
fn test_direction_ties_choose_lowest_bin() {
    // rightward then leftward gradients, equal counts
    let samples = vec![
        sample(0.0, 0.0, 0.0),
        sample(0.1, 10.0, 0.0),
        sample(0.2, 0.0, 0.0),
        sample(0.3, -10.0, 0.0),
    ];
    let v = extract(&samples).unwrap();
    let bin = feature(&v, "direction_bin");
    assert!((0.0..8.0).contains(&bin));
}
