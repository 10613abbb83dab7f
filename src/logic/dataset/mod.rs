//! Dataset Module - Per-user Training Vectors
//!
//! Append-only store of accepted feature vectors per user. The model is fitted
//! over everything stored for a user once enough vectors are collected.
//! Every stored row carries the feature version and layout hash; rows from
//! another layout are refused on read.

pub mod export;
pub mod record;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod tests;

use crate::logic::features::LayoutMismatchError;

pub use export::export_jsonl;
pub use record::TrainingRecord;
pub use sqlite::SqliteTrainingStore;
pub use store::{MemoryTrainingStore, TrainingStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("Corrupt training row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}
