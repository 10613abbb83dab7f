//! Capture Module - Pointer Event Intake
//!
//! Labels listener callbacks, segments the stream into batches and controls
//! the (external) listener.

pub mod event;
pub mod segmenter;
pub mod listener;

pub use event::{Button, EventError, EventLabeler, MotionState, PointerInput, RawEvent};
pub use segmenter::{Segmenter, SessionBatch};
pub use listener::{control_channel, load_recording, ListenerState, Recording, ReplayListener};
