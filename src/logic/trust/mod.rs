//! Trust Module - Per-user Trust State Machine
//!
//! A user starts in `Training` until enough vectors are stored to fit the
//! novelty model, then moves to `Monitoring`, where every vector's novelty
//! score nudges a bounded trust value up or down. The session is blocked once
//! trust falls to the lockout threshold.

pub mod engine;
pub mod state;


pub use engine::{ModelSummary, TrustEngine, UserStatus};
pub use state::{trust_delta, Decision, Phase, TrustState, Verdict};
