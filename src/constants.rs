//! Central Configuration Constants
//!
//! Single source of truth for engine defaults and the environment variable
//! names that override them.

use std::path::PathBuf;

/// App name
pub const APP_NAME: &str = "MMouse";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Pipeline defaults
// ============================================

/// Batch span (seconds) at which the segmenter flushes
pub const DEFAULT_IDLE_GAP_THRESHOLD: f64 = 3.0;

/// Batches with fewer raw events are discarded
pub const DEFAULT_MIN_ACTION_COUNT: usize = 5;

/// Stored vectors required before the novelty model is fitted
pub const DEFAULT_MIN_TRAIN_SIZE: u64 = 100_000;

// ============================================
// Trust model defaults
// ============================================

pub const DEFAULT_TRUST_A: f64 = 0.0;
pub const DEFAULT_TRUST_B: f64 = 0.25;
pub const DEFAULT_TRUST_C: f64 = 1.0;
pub const DEFAULT_TRUST_D: f64 = 1.0;
pub const DEFAULT_LOCKOUT_THRESHOLD: f64 = 90.0;

/// Trust value every session starts from
pub const MAX_TRUST_VALUE: f64 = 100.0;

// ============================================
// Novelty model defaults
// ============================================

pub const DEFAULT_NU: f64 = 0.1;
pub const DEFAULT_MAX_SUPPORT: usize = 2000;

// ============================================
// Storage defaults
// ============================================

pub const DEFAULT_STORE_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_STORE_RETRY_BACKOFF_MS: u64 = 50;

/// SQLite file holding training samples
pub const TRAINING_DB_FILE: &str = "training.db";

// ============================================
// Environment variable names
// ============================================

pub const ENV_CONFIG_FILE: &str = "MMOUSE_CONFIG";
pub const ENV_DATA_DIR: &str = "MMOUSE_DATA_DIR";
pub const ENV_IDLE_GAP: &str = "MMOUSE_IDLE_GAP";
pub const ENV_MIN_ACTION_COUNT: &str = "MMOUSE_MIN_ACTION_COUNT";
pub const ENV_MIN_TRAIN_SIZE: &str = "MMOUSE_MIN_TRAIN_SIZE";
pub const ENV_TRUST_A: &str = "MMOUSE_TRUST_A";
pub const ENV_TRUST_B: &str = "MMOUSE_TRUST_B";
pub const ENV_TRUST_C: &str = "MMOUSE_TRUST_C";
pub const ENV_TRUST_D: &str = "MMOUSE_TRUST_D";
pub const ENV_LOCKOUT: &str = "MMOUSE_LOCKOUT";
pub const ENV_NU: &str = "MMOUSE_NU";
pub const ENV_GAMMA: &str = "MMOUSE_GAMMA";
pub const ENV_KERNEL: &str = "MMOUSE_KERNEL";
pub const ENV_ONLINE_ADAPTATION: &str = "MMOUSE_ONLINE_ADAPTATION";
pub const ENV_LOCK_COMMAND: &str = "MMOUSE_LOCK_COMMAND";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Default data directory (`<local data dir>/mmouse`)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mmouse")
}

/// Read a boolean flag (`false`/`0` disable, anything else enables)
pub fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|s| s.to_lowercase() != "false" && s != "0")
}
