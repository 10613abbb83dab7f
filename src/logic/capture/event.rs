//! Pointer Event Types
//!
//! `RawEvent` is the unit every later stage consumes. `EventLabeler` turns
//! listener callbacks into labeled events with session-relative timestamps.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Pointer button reported with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    None,
    Left,
    Right,
    Middle,
    Scroll,
}

/// Motion/click state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionState {
    Move,
    Pressed,
    Released,
    Drag,
    Down,
    Up,
}

/// One labeled pointer event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Seconds since the session origin
    pub timestamp: f64,
    pub button: Button,
    pub state: MotionState,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("timestamp {0} is not a finite non-negative number")]
    BadTimestamp(f64),
}

impl RawEvent {
    pub fn new(timestamp: f64, button: Button, state: MotionState, x: i32, y: i32) -> Self {
        Self { timestamp, button, state, x, y }
    }

    /// Plain move event, mostly for tests and replays
    pub fn moved(timestamp: f64, x: i32, y: i32) -> Self {
        Self::new(timestamp, Button::None, MotionState::Move, x, y)
    }

    /// Boundary check before an event enters the pipeline
    pub fn validate(&self) -> Result<(), EventError> {
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return Err(EventError::BadTimestamp(self.timestamp));
        }
        Ok(())
    }
}

// ============================================================================
// LISTENER INPUT
// ============================================================================

/// Callback payload of an OS pointer listener
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Move { x: i32, y: i32 },
    Click { x: i32, y: i32, button: Button, pressed: bool },
    Scroll { x: i32, y: i32, dx: i32, dy: i32 },
}

/// Labels listener callbacks as `RawEvent`s
///
/// A move while a button is held becomes `Drag`; scroll direction comes from
/// the sign of the vertical delta.
#[derive(Debug)]
pub struct EventLabeler {
    origin: Instant,
    pressed: bool,
}

impl EventLabeler {
    pub fn new() -> Self {
        Self { origin: Instant::now(), pressed: false }
    }

    /// Label with the time elapsed since the labeler was created
    pub fn label(&mut self, input: PointerInput) -> RawEvent {
        let timestamp = self.origin.elapsed().as_secs_f64();
        self.label_at(input, timestamp)
    }

    pub fn label_at(&mut self, input: PointerInput, timestamp: f64) -> RawEvent {
        match input {
            PointerInput::Move { x, y } => {
                let state = if self.pressed { MotionState::Drag } else { MotionState::Move };
                RawEvent::new(timestamp, Button::None, state, x, y)
            }
            PointerInput::Click { x, y, button, pressed } => {
                self.pressed = pressed;
                let state = if pressed { MotionState::Pressed } else { MotionState::Released };
                RawEvent::new(timestamp, button, state, x, y)
            }
            PointerInput::Scroll { x, y, dy, .. } => {
                let state = if dy < 0 { MotionState::Down } else { MotionState::Up };
                RawEvent::new(timestamp, Button::Scroll, state, x, y)
            }
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

impl Default for EventLabeler {
    fn default() -> Self {
        Self::new()
    }
}
