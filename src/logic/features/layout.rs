//! Feature Layout - Movement Feature Schema
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Stored training vectors and fitted models carry the version and hash;
//! anything built against another layout is rejected on load.

use crc32fast::Hasher;
use serde::Serialize;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Feature names in the exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "direction_bin",                       // 0: modal 8-way movement direction
    "actual_distance",                     // 1: first → last sample distance
    "actual_distance_bin",                 // 2
    "curve_length",                        // 3: path length
    "curve_length_bin",                    // 4
    "length_ratio",                        // 5: curve_length / actual_distance
    "actual_speed",                        // 6
    "curve_speed",                         // 7: mean step speed
    "curve_acceleration",                  // 8
    "mean_movement_offset",                // 9: signed offset from the chord
    "mean_movement_error",                 // 10: absolute offset from the chord
    "mean_movement_variability",           // 11
    "mean_curvature",                      // 12
    "mean_curvature_change_rate",          // 13
    "mean_curvature_velocity",             // 14
    "mean_curvature_velocity_change_rate", // 15
    "mean_angular_velocity",               // 16
];

/// Total number of features
pub const FEATURE_COUNT: usize = 17;

const _: () = assert!(FEATURE_LAYOUT.len() == FEATURE_COUNT);

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the version and the ordered feature names
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Running layout as reported by `mmouse status`
#[derive(Debug, Clone, Serialize)]
pub struct LayoutInfo {
    pub version: u8,
    /// Layout hash as 8 hex digits
    pub hash: String,
    pub features: &'static [&'static str],
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: format!("{:08x}", layout_hash()),
            features: FEATURE_LAYOUT,
        }
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Feature layout mismatch: expected v{expected_version} (hash: {expected_hash:08x}), \
     got v{actual_version} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

/// Validate that incoming data matches the current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 17);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_stable() {
        assert_eq!(compute_layout_hash(), compute_layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_validate_layout() {
        assert!(validate_layout(FEATURE_VERSION, layout_hash()).is_ok());
        assert!(validate_layout(FEATURE_VERSION + 1, layout_hash()).is_err());

        let err = validate_layout(FEATURE_VERSION, layout_hash() ^ 1).unwrap_err();
        assert_eq!(err.expected_hash, layout_hash());
    }

    #[test]
    fn test_layout_info_current() {
        let info = LayoutInfo::current();
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(u32::from_str_radix(&info.hash, 16).unwrap(), layout_hash());
        assert_eq!(info.features.len(), FEATURE_COUNT);
        assert_eq!(info.features[16], "mean_angular_velocity");
    }
}
