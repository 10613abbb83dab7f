//! Standard Scaler - Zero mean, unit variance per feature

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::features::{FeatureVector, FEATURE_COUNT};

use super::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Population standard deviation; 1.0 where a column is constant
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[FeatureVector]) -> Result<Self, ModelError> {
        let data = to_matrix(rows)?;
        let mean = data.mean_axis(Axis(0)).ok_or(ModelError::EmptyTrainingSet)?;
        let scale: Array1<f64> = data
            .var_axis(Axis(0), 0.0)
            .mapv(|var| if var > 0.0 { var.sqrt() } else { 1.0 });

        Ok(Self {
            mean: mean.to_vec(),
            scale: scale.to_vec(),
        })
    }

    pub fn transform(&self, vector: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in vector.values.iter().enumerate() {
            out[i] = (value - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Scale every row into an `n × FEATURE_COUNT` matrix
    pub fn transform_rows(&self, rows: &[FeatureVector]) -> Result<Array2<f64>, ModelError> {
        let data = to_matrix(rows)?;
        let mean = Array1::from(self.mean.clone());
        let scale = Array1::from(self.scale.clone());
        Ok((data - &mean) / &scale)
    }
}

/// Stack vectors into a row-major matrix
pub fn to_matrix(rows: &[FeatureVector]) -> Result<Array2<f64>, ModelError> {
    if rows.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.values).collect();
    Ok(Array2::from_shape_vec((rows.len(), FEATURE_COUNT), flat)?)
}
