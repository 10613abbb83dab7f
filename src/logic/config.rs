//! Engine Configuration
//!
//! All tunables of the authentication pipeline. Layered as
//! defaults → JSON file → `MMOUSE_*` environment → CLI flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown {what} '{value}'")]
    Unknown { what: &'static str, value: String },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

fn out_of_range(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::OutOfRange { field, reason: reason.into() }
}

/// Parse the raw value of `var`; unset is `None`, unparsable is an error
fn parse_env_value<T: FromStr>(
    var: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

fn env_value<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    parse_env_value(var, std::env::var(var).ok())
}

// ============================================================================
// TRUST PARAMETERS
// ============================================================================

/// Parameters of the sigmoid reward/penalty trust update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustParams {
    /// Score at which reward turns into penalty
    pub a: f64,
    /// Sigmoid width (> 0)
    pub b: f64,
    /// Maximum reward per step (> 0)
    pub c: f64,
    /// Maximum penalty per step (> 0)
    pub d: f64,
    /// Trust value at or below which the session is blocked
    pub lockout_threshold: f64,
}

impl Default for TrustParams {
    fn default() -> Self {
        Self {
            a: DEFAULT_TRUST_A,
            b: DEFAULT_TRUST_B,
            c: DEFAULT_TRUST_C,
            d: DEFAULT_TRUST_D,
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
        }
    }
}

impl TrustParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.a.is_finite() {
            return Err(out_of_range("trust.a", "must be finite"));
        }
        for (field, value) in [("trust.b", self.b), ("trust.c", self.c), ("trust.d", self.d)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(out_of_range(field, format!("{} must be > 0", value)));
            }
        }
        if !(0.0..=MAX_TRUST_VALUE).contains(&self.lockout_threshold) {
            return Err(out_of_range(
                "trust.lockout_threshold",
                format!("{} not in [0, 100]", self.lockout_threshold),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// NOVELTY MODEL PARAMETERS
// ============================================================================

/// Kernel of the one-class boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// `exp(-gamma * ||x - s||^2)`
    Rbf,
    /// `exp(-gamma * ||x - s||_1)`
    Laplacian,
}

impl FromStr for Kernel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rbf" => Ok(Kernel::Rbf),
            "laplacian" => Ok(Kernel::Laplacian),
            other => Err(ConfigError::Unknown { what: "kernel", value: other.to_string() }),
        }
    }
}

/// Kernel coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gamma {
    /// `1 / (n_features * var(X))` over the scaled training set
    Scale,
    Value(f64),
}

impl FromStr for Gamma {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("scale") {
            return Ok(Gamma::Scale);
        }
        s.parse::<f64>()
            .map(Gamma::Value)
            .map_err(|_| ConfigError::Unknown { what: "gamma", value: s.to_string() })
    }
}

/// Hyperparameters handed to the novelty trainer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyParams {
    pub kernel: Kernel,
    pub gamma: Gamma,
    /// Expected fraction of training samples outside the boundary, in (0, 1]
    pub nu: f64,
    /// Upper bound on retained support vectors
    pub max_support: usize,
}

impl Default for NoveltyParams {
    fn default() -> Self {
        Self {
            kernel: Kernel::Rbf,
            gamma: Gamma::Scale,
            nu: DEFAULT_NU,
            max_support: DEFAULT_MAX_SUPPORT,
        }
    }
}

impl NoveltyParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(out_of_range("novelty.nu", format!("{} not in (0, 1]", self.nu)));
        }
        if let Gamma::Value(g) = self.gamma {
            if !(g.is_finite() && g > 0.0) {
                return Err(out_of_range("novelty.gamma", format!("{} must be > 0", g)));
            }
        }
        if self.max_support == 0 {
            return Err(out_of_range("novelty.max_support", "must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Batch span (seconds) that flushes the segmenter
    pub idle_gap_threshold: f64,
    /// Minimum raw events per batch
    pub min_action_count: usize,
    /// Stored vectors needed before the first fit
    pub min_train_size: u64,
    pub trust: TrustParams,
    pub novelty: NoveltyParams,
    /// Append full-trust vectors to the training store while monitoring
    pub online_adaptation: bool,
    pub store_retry_attempts: u32,
    pub store_retry_backoff_ms: u64,
    /// Root for model artifacts and the training database
    pub data_dir: PathBuf,
    /// Overrides the platform lock command
    pub lock_command: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_gap_threshold: DEFAULT_IDLE_GAP_THRESHOLD,
            min_action_count: DEFAULT_MIN_ACTION_COUNT,
            min_train_size: DEFAULT_MIN_TRAIN_SIZE,
            trust: TrustParams::default(),
            novelty: NoveltyParams::default(),
            online_adaptation: true,
            store_retry_attempts: DEFAULT_STORE_RETRY_ATTEMPTS,
            store_retry_backoff_ms: DEFAULT_STORE_RETRY_BACKOFF_MS,
            data_dir: default_data_dir(),
            lock_command: None,
        }
    }
}

impl EngineConfig {
    /// Defaults, then `file` (or `$MMOUSE_CONFIG`), then environment overrides
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let env_file = std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from);
        let mut config = match file.map(Path::to_path_buf).or(env_file) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_slice(&data)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Apply `MMOUSE_*` overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_value(ENV_IDLE_GAP)? {
            self.idle_gap_threshold = v;
        }
        if let Some(v) = env_value(ENV_MIN_ACTION_COUNT)? {
            self.min_action_count = v;
        }
        if let Some(v) = env_value(ENV_MIN_TRAIN_SIZE)? {
            self.min_train_size = v;
        }
        if let Some(v) = env_value(ENV_TRUST_A)? {
            self.trust.a = v;
        }
        if let Some(v) = env_value(ENV_TRUST_B)? {
            self.trust.b = v;
        }
        if let Some(v) = env_value(ENV_TRUST_C)? {
            self.trust.c = v;
        }
        if let Some(v) = env_value(ENV_TRUST_D)? {
            self.trust.d = v;
        }
        if let Some(v) = env_value(ENV_LOCKOUT)? {
            self.trust.lockout_threshold = v;
        }
        if let Some(v) = env_value(ENV_NU)? {
            self.novelty.nu = v;
        }
        if let Ok(raw) = std::env::var(ENV_GAMMA) {
            self.novelty.gamma = raw.parse()?;
        }
        if let Ok(raw) = std::env::var(ENV_KERNEL) {
            self.novelty.kernel = raw.parse()?;
        }
        if let Some(v) = env_flag(ENV_ONLINE_ADAPTATION) {
            self.online_adaptation = v;
        }
        if let Ok(cmd) = std::env::var(ENV_LOCK_COMMAND) {
            self.lock_command = Some(cmd);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.idle_gap_threshold.is_finite() && self.idle_gap_threshold > 0.0) {
            return Err(out_of_range(
                "idle_gap_threshold",
                format!("{} must be > 0", self.idle_gap_threshold),
            ));
        }
        // Two samples survive the dropped boundary event only from three upward.
        if self.min_action_count < 3 {
            return Err(out_of_range(
                "min_action_count",
                format!("{} must be >= 3", self.min_action_count),
            ));
        }
        if self.min_train_size == 0 {
            return Err(out_of_range("min_train_size", "must be > 0"));
        }
        self.trust.validate()?;
        self.novelty.validate()?;
        Ok(())
    }

    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    pub fn training_db_path(&self) -> PathBuf {
        self.data_dir.join(TRAINING_DB_FILE)
    }

    pub fn store_retry_backoff(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_retry_backoff_ms)
    }
}
