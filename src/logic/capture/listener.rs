//! Listener Control & Replay
//!
//! The OS pointer hook lives outside this crate. It delivers `RawEvent`s over
//! an mpsc channel and watches a `ListenerState` to know when capture is
//! paused. `ReplayListener` plays a recorded JSONL session through the same
//! interface.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::event::RawEvent;

/// Channel capacity between listener and session
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Listening,
    Paused,
}

/// Create the control channel, starting in `Listening`
pub fn control_channel() -> (watch::Sender<ListenerState>, watch::Receiver<ListenerState>) {
    watch::channel(ListenerState::Listening)
}

// ============================================================================
// RECORDINGS
// ============================================================================

/// Events loaded from a JSONL recording
#[derive(Debug, Default)]
pub struct Recording {
    pub events: Vec<RawEvent>,
    /// Lines rejected as unparsable or invalid
    pub rejected: usize,
}

/// Load a JSONL recording, one `RawEvent` per line
///
/// Malformed lines are rejected here so they never reach the pipeline.
pub fn load_recording(path: &Path) -> std::io::Result<Recording> {
    let reader = BufReader::new(File::open(path)?);
    let mut recording = Recording::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<RawEvent>(trimmed) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("{:?}:{}: rejected malformed event: {}", path, index + 1, e);
                recording.rejected += 1;
                continue;
            }
        };
        if let Err(e) = event.validate() {
            log::warn!("{:?}:{}: rejected event: {}", path, index + 1, e);
            recording.rejected += 1;
            continue;
        }
        recording.events.push(event);
    }

    log::info!(
        "Loaded {} events from {:?} ({} rejected)",
        recording.events.len(),
        path,
        recording.rejected
    );
    Ok(recording)
}

// ============================================================================
// REPLAY LISTENER
// ============================================================================

/// Feeds recorded events into a session channel
pub struct ReplayListener {
    events: Vec<RawEvent>,
    realtime: bool,
}

impl ReplayListener {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self { events, realtime: false }
    }

    /// Sleep between events according to their timestamps
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Spawn the feeder task
    ///
    /// The task waits while the session has capture paused and ends when the
    /// recording is exhausted or the session hangs up.
    pub fn spawn(
        self,
        mut control: watch::Receiver<ListenerState>,
    ) -> (mpsc::Receiver<RawEvent>, JoinHandle<usize>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let realtime = self.realtime;
        let events = self.events;

        let handle = tokio::spawn(async move {
            let mut sent = 0usize;
            let mut previous: Option<f64> = None;

            for event in events {
                if control.wait_for(|s| *s == ListenerState::Listening).await.is_err() {
                    break;
                }
                if realtime {
                    if let Some(prev) = previous {
                        let gap = (event.timestamp - prev).max(0.0);
                        tokio::time::sleep(Duration::from_secs_f64(gap)).await;
                    }
                    previous = Some(event.timestamp);
                }
                if tx.send(event).await.is_err() {
                    break;
                }
                sent += 1;
            }

            log::debug!("Replay listener finished after {} events", sent);
            sent
        });

        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_recording_rejects_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"timestamp":0.0,"button":"None","state":"Move","x":1,"y":2}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"timestamp":-3.0,"button":"None","state":"Move","x":1,"y":2}}"#).unwrap();
        writeln!(file, r#"{{"timestamp":0.5,"button":"Left","state":"Pressed","x":3,"y":4}}"#).unwrap();

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.events.len(), 2);
        assert_eq!(recording.rejected, 2);
        assert_eq!(recording.events[1].x, 3);
    }

    #[tokio::test]
    async fn test_replay_delivers_all_events() {
        let events: Vec<_> = (0..10).map(|i| RawEvent::moved(i as f64 * 0.1, i, i)).collect();
        let (_control_tx, control_rx) = control_channel();

        let (mut rx, handle) = ReplayListener::new(events).spawn(control_rx);
        let mut received = Vec::new();
        while let Some(e) = rx.recv().await {
            received.push(e);
        }

        assert_eq!(received.len(), 10);
        assert_eq!(handle.await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_replay_stops_when_control_dropped() {
        let events: Vec<_> = (0..5).map(|i| RawEvent::moved(i as f64, i, i)).collect();
        let (control_tx, control_rx) = control_channel();
        control_tx.send(ListenerState::Paused).unwrap();
        drop(control_tx);

        let (mut rx, handle) = ReplayListener::new(events).spawn(control_rx);
        assert!(rx.recv().await.is_none());
        assert_eq!(handle.await.unwrap(), 0);
    }
}
