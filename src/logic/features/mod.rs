//! Features Module - Movement Feature Extraction
//!
//! Cleaned samples in, one fixed-layout 17-value vector out.
//! The layout is versioned and hashed so persisted data can be checked.

pub mod csv;
pub mod geometry;
pub mod layout;
pub mod vector;

#[cfg(test)]
mod tests;

pub use csv::{load_feature_csv, parse_feature_row};
pub use geometry::{bin, extract, ExtractError, DISTANCE_BIN_THRESHOLD, MIN_DT};
pub use layout::{
    layout_hash, validate_layout, LayoutInfo, LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT,
    FEATURE_VERSION,
};
pub use vector::FeatureVector;
