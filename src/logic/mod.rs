//! Logic Module - Authentication Pipeline
//!
//! - `capture/` - event labeling, segmentation, listener control, replay
//! - `preprocess/` - batch cleaning
//! - `features/` - feature layout and movement geometry
//! - `model/` - scaler, novelty boundary, artifact persistence
//! - `dataset/` - per-user training vectors
//! - `trust/` - trust state machine
//! - `session` - async session loop
//! - `lock` - screen lock action

pub mod config;

pub mod capture;
pub mod preprocess;
pub mod features;
pub mod model;
pub mod dataset;
pub mod trust;

pub mod session;
pub mod lock;
