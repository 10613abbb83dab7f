use std::collections::HashMap;

use parking_lot::RwLock;

use crate::logic::features::FeatureVector;

use super::StoreError;

pub trait TrainingStore: Send + Sync {
    /// Append one vector; rejects vectors built against another layout
    fn append(&self, user_id: &str, vector: &FeatureVector) -> Result<(), StoreError>;

    fn count(&self, user_id: &str) -> Result<u64, StoreError>;

    /// Every stored vector for the user, in insertion order
    fn read_all(&self, user_id: &str) -> Result<Vec<FeatureVector>, StoreError>;
}

/// In-process store, nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryTrainingStore {
    vectors: RwLock<HashMap<String, Vec<FeatureVector>>>,
}

impl MemoryTrainingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainingStore for MemoryTrainingStore {
    fn append(&self, user_id: &str, vector: &FeatureVector) -> Result<(), StoreError> {
        vector.validate()?;
        self.vectors
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(*vector);
        Ok(())
    }

    fn count(&self, user_id: &str) -> Result<u64, StoreError> {
        Ok(self.vectors.read().get(user_id).map_or(0, |v| v.len() as u64))
    }

    fn read_all(&self, user_id: &str) -> Result<Vec<FeatureVector>, StoreError> {
        Ok(self.vectors.read().get(user_id).cloned().unwrap_or_default())
    }
}
