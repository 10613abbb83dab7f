use serde::{Deserialize, Serialize};

use crate::logic::features::FeatureVector;

/// One exported training vector
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub user_id: String,
    /// Position in the user's training sequence
    pub index: u64,

    // Feature contract
    pub feature_version: u8,
    pub layout_hash: u32,
    pub features: Vec<f64>,
}

impl TrainingRecord {
    pub fn new(user_id: &str, index: u64, vector: &FeatureVector) -> Self {
        Self {
            user_id: user_id.to_string(),
            index,
            feature_version: vector.version,
            layout_hash: vector.layout_hash,
            features: vector.values.to_vec(),
        }
    }
}
