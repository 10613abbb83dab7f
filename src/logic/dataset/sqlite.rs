//! SQLite Training Store
//!
//! One row per vector; values are a JSON array so the schema does not follow
//! the feature count.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::logic::features::{validate_layout, FeatureVector};

use super::store::TrainingStore;
use super::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS training_vectors (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    recorded_at     INTEGER NOT NULL,
    feature_version INTEGER NOT NULL,
    layout_hash     INTEGER NOT NULL,
    vals            TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_training_vectors_user ON training_vectors(user_id, id);
";

pub struct SqliteTrainingStore {
    conn: Mutex<Connection>,
}

impl SqliteTrainingStore {
    /// Open (or create) the database; the schema exists once this returns
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_V1)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TrainingStore for SqliteTrainingStore {
    fn append(&self, user_id: &str, vector: &FeatureVector) -> Result<(), StoreError> {
        vector.validate()?;
        let vals = serde_json::to_string(&vector.values.to_vec())?;
        let now = chrono::Utc::now().timestamp();

        self.conn.lock().execute(
            "INSERT INTO training_vectors (user_id, recorded_at, feature_version, layout_hash, vals)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, now, vector.version, i64::from(vector.layout_hash), vals],
        )?;
        Ok(())
    }

    fn count(&self, user_id: &str) -> Result<u64, StoreError> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM training_vectors WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn read_all(&self, user_id: &str) -> Result<Vec<FeatureVector>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, feature_version, layout_hash, vals FROM training_vectors
             WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut vectors = Vec::new();
        for row in rows {
            let (id, version, hash, vals) = row?;
            let hash = u32::try_from(hash).map_err(|_| StoreError::Corrupt {
                id,
                reason: format!("layout hash {} out of range", hash),
            })?;
            validate_layout(version, hash)?;

            let values: Vec<f64> = serde_json::from_str(&vals)?;
            let vector = FeatureVector::from_slice(&values).ok_or_else(|| StoreError::Corrupt {
                id,
                reason: format!("expected feature vector, got {} values", values.len()),
            })?;
            vectors.push(vector);
        }
        Ok(vectors)
    }
}
