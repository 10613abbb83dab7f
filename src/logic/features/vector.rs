//! Feature Vector - Versioned movement features
//!
//! Every vector carries the layout version and hash it was built with, so
//! stored training data and fitted models can be checked against the running
//! layout.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use super::layout::{
    layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT,
    FEATURE_VERSION,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout
    pub layout_hash: u32,
    /// Values in the order of `FEATURE_LAYOUT`
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Zeroed vector with the current layout
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Build from a slice; `None` unless it holds exactly `FEATURE_COUNT` values
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let values: [f64; FEATURE_COUNT] = values.try_into().ok()?;
        Some(Self::from_values(values))
    }

    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Values keyed by feature name
    pub fn named(&self) -> BTreeMap<&'static str, f64> {
        FEATURE_LAYOUT.iter().copied().zip(self.values).collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_new() {
        let vector = FeatureVector::new();
        assert_eq!(vector.version, FEATURE_VERSION);
        assert_eq!(vector.layout_hash, layout_hash());
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn test_from_slice_requires_exact_length() {
        assert!(FeatureVector::from_slice(&[1.0; 16]).is_none());
        assert!(FeatureVector::from_slice(&[1.0; 18]).is_none());
        let v = FeatureVector::from_slice(&[2.0; FEATURE_COUNT]).unwrap();
        assert_eq!(v.values[16], 2.0);
    }

    #[test]
    fn test_named_values() {
        let mut values = [0.0; FEATURE_COUNT];
        values[1] = 42.0;
        let named = FeatureVector::from_values(values).named();
        assert_eq!(named.len(), FEATURE_COUNT);
        assert_eq!(named["actual_distance"], 42.0);
        assert_eq!(named["curve_speed"], 0.0);
        assert!(!named.contains_key("nonexistent"));
    }

    #[test]
    fn test_incompatible_vector() {
        let mut v = FeatureVector::new();
        v.layout_hash ^= 0xFFFF;
        assert!(v.validate().is_err());
    }
}
