//! Authentication Session - Async event loop for one user
//!
//! Events are pulled from the listener channel one at a time. When the
//! segmenter closes a batch the listener is paused, the batch runs through
//! preprocess → extract → trust engine synchronously, and listening resumes.
//! The loop ends on shutdown, on a Block verdict, or when the source closes.
//!
//! `replay_vectors` drives the engine from vectors that were extracted
//! elsewhere and stops under the same conditions.

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::logic::capture::{ListenerState, RawEvent, Segmenter, SessionBatch};
use crate::logic::features::{extract, FeatureVector};
use crate::logic::preprocess::Preprocessor;
use crate::logic::trust::{TrustEngine, TrustState, Verdict};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Shutdown was requested
    Stopped,
    /// Trust fell to the lockout threshold
    Blocked { trust_value: f64 },
    /// The event source hung up
    SourceClosed,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionStats {
    pub events: u64,
    pub rejected_events: u64,
    pub batches: u64,
    pub skipped_batches: u64,
    pub verdicts: u64,
}

pub struct AuthSession<'a> {
    id: Uuid,
    engine: &'a TrustEngine,
    state: TrustState,
    segmenter: Segmenter,
    preprocessor: Preprocessor,
    stats: SessionStats,
}

impl<'a> AuthSession<'a> {
    pub fn new(engine: &'a TrustEngine, user_id: &str) -> Result<Self> {
        let config = engine.config();
        let state = engine.begin_session(user_id)?;
        Ok(Self {
            id: Uuid::new_v4(),
            engine,
            state,
            segmenter: Segmenter::new(config.idle_gap_threshold),
            preprocessor: Preprocessor::new(config.min_action_count),
            stats: SessionStats::default(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &TrustState {
        &self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Events buffered in the open batch
    pub fn pending(&self) -> usize {
        self.segmenter.pending()
    }

    /// Feed one event; `Some` verdict when it closed a usable batch
    pub fn process_event(&mut self, event: RawEvent) -> Result<Option<Verdict>> {
        match self.accept(event) {
            Some(batch) => self.process_batch(&batch),
            None => Ok(None),
        }
    }

    fn accept(&mut self, event: RawEvent) -> Option<SessionBatch> {
        if let Err(e) = event.validate() {
            log::warn!("Session {}: rejected event: {}", self.id, e);
            self.stats.rejected_events += 1;
            return None;
        }
        self.stats.events += 1;
        self.segmenter.observe(event)
    }

    fn process_batch(&mut self, batch: &SessionBatch) -> Result<Option<Verdict>> {
        self.stats.batches += 1;

        let samples = self.preprocessor.clean(batch);
        if samples.len() < 2 {
            log::debug!(
                "Session {}: skipped batch of {} events ({} samples)",
                self.id,
                batch.len(),
                samples.len()
            );
            self.stats.skipped_batches += 1;
            return Ok(None);
        }

        let vector = extract(&samples)?;
        let verdict = self.engine.evaluate(&mut self.state, &vector)?;
        self.stats.verdicts += 1;
        log::debug!(
            "Session {}: {:?} trust {:.1} score {:?} features {}",
            self.id,
            verdict.decision,
            verdict.trust_value,
            verdict.score,
            serde_json::json!(vector.named())
        );
        Ok(Some(verdict))
    }

    fn discard_pending(&mut self) {
        let dropped = self.segmenter.reset();
        if dropped > 0 {
            log::debug!("Session {}: discarded {} unflushed events", self.id, dropped);
        }
    }

    /// Drive the session until shutdown, block or source close
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<RawEvent>,
        control: watch::Sender<ListenerState>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SessionOutcome> {
        log::info!(
            "Session {} started for {} ({:?}, trust {:.0})",
            self.id,
            self.state.user_id,
            self.state.phase,
            self.state.trust_value
        );
        control.send_replace(ListenerState::Listening);

        let mut watch_shutdown = true;
        let outcome = loop {
            if *shutdown.borrow() {
                break SessionOutcome::Stopped;
            }

            let event = tokio::select! {
                biased;
                changed = shutdown.changed(), if watch_shutdown => {
                    if changed.is_err() {
                        // sender gone, nobody can ask us to stop anymore
                        watch_shutdown = false;
                    }
                    continue;
                }
                event = events.recv() => event,
            };

            let Some(event) = event else {
                break SessionOutcome::SourceClosed;
            };
            let Some(batch) = self.accept(event) else {
                continue;
            };

            control.send_replace(ListenerState::Paused);
            let result = self.process_batch(&batch);
            control.send_replace(ListenerState::Listening);

            if let Some(verdict) = result? {
                if verdict.is_block() {
                    break SessionOutcome::Blocked {
                        trust_value: verdict.trust_value,
                    };
                }
            }
        };

        self.discard_pending();
        log::info!(
            "Session {} ended: {:?} ({} events, {} batches, {} verdicts)",
            self.id,
            outcome,
            self.stats.events,
            self.stats.batches,
            self.stats.verdicts
        );
        Ok(outcome)
    }
}

// ============================================================================
// VECTOR REPLAY
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReplaySummary {
    /// `SourceClosed` when every vector was evaluated
    pub outcome: SessionOutcome,
    pub evaluated: usize,
    pub last_verdict: Option<Verdict>,
}

/// Evaluate pre-extracted vectors in order for one user
pub async fn replay_vectors(
    engine: &TrustEngine,
    user_id: &str,
    vectors: &[FeatureVector],
    shutdown: &watch::Receiver<bool>,
) -> Result<ReplaySummary> {
    let mut state = engine.begin_session(user_id)?;
    let mut summary = ReplaySummary {
        outcome: SessionOutcome::SourceClosed,
        evaluated: 0,
        last_verdict: None,
    };

    for vector in vectors {
        if *shutdown.borrow() {
            summary.outcome = SessionOutcome::Stopped;
            break;
        }
        let verdict = engine.evaluate(&mut state, vector)?;
        summary.evaluated += 1;
        summary.last_verdict = Some(verdict);
        if verdict.is_block() {
            summary.outcome = SessionOutcome::Blocked {
                trust_value: verdict.trust_value,
            };
            break;
        }
        // let the signal task run between vectors
        tokio::task::yield_now().await;
    }

    log::info!(
        "Replay for {} ended: {:?} after {} of {} vectors",
        user_id,
        summary.outcome,
        summary.evaluated,
        vectors.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::logic::capture::{control_channel, ReplayListener};
    use crate::logic::config::{EngineConfig, NoveltyParams, TrustParams};
    use crate::logic::dataset::MemoryTrainingStore;
    use crate::logic::features::FEATURE_COUNT;
    use crate::logic::model::{KernelDensityTrainer, MemoryModelStore, ModelStore, NoveltyTrainer};
    use crate::logic::trust::{Decision, Phase};

    /// Pointer events every 0.5s along a gentle curve
    fn movement(count: usize) -> Vec<RawEvent> {
        (0..count)
            .map(|i| {
                let k = i as i32;
                RawEvent::moved(i as f64 * 0.5, 10 + k * 7, 20 + (k % 6) * (k % 6))
            })
            .collect()
    }

    fn training_engine(min_train_size: u64) -> TrustEngine {
        TrustEngine::new(
            EngineConfig {
                min_train_size,
                ..EngineConfig::default()
            },
            Box::new(MemoryModelStore::new()),
            Box::new(MemoryTrainingStore::new()),
        )
    }

    /// Monitoring engine where any score blocks
    fn strict_engine() -> TrustEngine {
        let models = MemoryModelStore::new();
        let rows: Vec<FeatureVector> = (0..10)
            .map(|i| FeatureVector::from_values([i as f64; FEATURE_COUNT]))
            .collect();
        let artifact = KernelDensityTrainer
            .fit(&rows, &NoveltyParams::default())
            .unwrap()
            .with_user("alice");
        models.save("alice", &artifact).unwrap();

        TrustEngine::new(
            EngineConfig {
                trust: TrustParams {
                    lockout_threshold: 100.0,
                    ..TrustParams::default()
                },
                ..EngineConfig::default()
            },
            Box::new(models),
            Box::new(MemoryTrainingStore::new()),
        )
    }

    #[test]
    fn test_process_event_emits_verdict_per_batch() {
        let engine = training_engine(100);
        let mut session = AuthSession::new(&engine, "alice").unwrap();

        let verdicts: Vec<Verdict> = movement(14)
            .into_iter()
            .filter_map(|e| session.process_event(e).unwrap())
            .collect();

        // flushes at t=3.0 and t=6.5
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts.iter().all(|v| v.decision == Decision::Continue));
        assert!(verdicts.iter().all(|v| v.phase == Phase::Training));
        assert_eq!(engine.training_store().count("alice").unwrap(), 2);
    }

    #[test]
    fn test_invalid_events_are_rejected() {
        let engine = training_engine(100);
        let mut session = AuthSession::new(&engine, "alice").unwrap();

        assert!(session.process_event(RawEvent::moved(f64::NAN, 1, 1)).unwrap().is_none());
        assert!(session.process_event(RawEvent::moved(-1.0, 1, 1)).unwrap().is_none());
        assert_eq!(session.stats().rejected_events, 2);
        assert_eq!(session.pending(), 0);
    }

    #[test]
    fn test_short_batch_is_skipped() {
        let engine = training_engine(100);
        let mut session = AuthSession::new(&engine, "alice").unwrap();

        // two events, then one past the idle gap
        for e in [RawEvent::moved(0.0, 1, 1), RawEvent::moved(0.5, 2, 2), RawEvent::moved(4.0, 3, 3)] {
            assert!(session.process_event(e).unwrap().is_none());
        }
        assert_eq!(session.stats().skipped_batches, 1);
        assert_eq!(engine.training_store().count("alice").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_until_source_closes() {
        let engine = training_engine(100);
        let mut session = AuthSession::new(&engine, "alice").unwrap();

        let (control_tx, control_rx) = control_channel();
        let (events, feeder) = ReplayListener::new(movement(14)).spawn(control_rx.clone());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let outcome = session.run(events, control_tx, shutdown_rx).await.unwrap();
        assert_eq!(outcome, SessionOutcome::SourceClosed);
        assert_eq!(feeder.await.unwrap(), 14);
        assert_eq!(session.stats().verdicts, 2);
        // partial third batch is dropped
        assert_eq!(session.pending(), 0);
        assert_eq!(*control_rx.borrow(), ListenerState::Listening);
    }

    #[tokio::test]
    async fn test_shutdown_discards_partial_batch() {
        let engine = training_engine(100);
        let mut session = AuthSession::new(&engine, "alice").unwrap();

        let (control_tx, _control_rx) = control_channel();
        let (event_tx, event_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = async move {
            for e in movement(3) {
                event_tx.send(e).await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            shutdown_tx.send(true).unwrap();
            // keep the channel open so only shutdown can end the run
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(event_tx);
        };

        let (outcome, _) = tokio::join!(session.run(event_rx, control_tx, shutdown_rx), driver);
        assert_eq!(outcome.unwrap(), SessionOutcome::Stopped);
        assert_eq!(session.stats().events, 3);
        assert_eq!(session.pending(), 0);
        assert_eq!(engine.training_store().count("alice").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let engine = training_engine(100);
        let mut session = AuthSession::new(&engine, "alice").unwrap();

        let (control_tx, _control_rx) = control_channel();
        let (_event_tx, event_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        let outcome = session.run(event_rx, control_tx, shutdown_rx).await.unwrap();
        assert_eq!(outcome, SessionOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_block_ends_run() {
        let engine = strict_engine();
        let mut session = AuthSession::new(&engine, "alice").unwrap();
        assert_eq!(session.state().phase, Phase::Monitoring);

        let (control_tx, control_rx) = control_channel();
        let (events, _feeder) = ReplayListener::new(movement(40)).spawn(control_rx);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let outcome = session.run(events, control_tx, shutdown_rx).await.unwrap();
        match outcome {
            SessionOutcome::Blocked { trust_value } => assert!(trust_value <= 100.0),
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert_eq!(session.stats().verdicts, 1);
        assert!(session.state().model.is_none());
    }

    #[tokio::test]
    async fn test_replay_vectors_until_exhausted() {
        let engine = training_engine(100);
        let vectors = vec![FeatureVector::from_values([1.0; FEATURE_COUNT]); 3];
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let summary = replay_vectors(&engine, "alice", &vectors, &shutdown_rx).await.unwrap();
        assert_eq!(summary.outcome, SessionOutcome::SourceClosed);
        assert_eq!(summary.evaluated, 3);
        assert_eq!(summary.last_verdict.unwrap().phase, Phase::Training);
        assert_eq!(engine.training_store().count("alice").unwrap(), 3);
    }

    #[tokio::test]
    async fn test_replay_vectors_honours_shutdown() {
        let engine = training_engine(100);
        let vectors = vec![FeatureVector::from_values([1.0; FEATURE_COUNT]); 3];
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        let summary = replay_vectors(&engine, "alice", &vectors, &shutdown_rx).await.unwrap();
        assert_eq!(summary.outcome, SessionOutcome::Stopped);
        assert_eq!(summary.evaluated, 0);
        assert!(summary.last_verdict.is_none());
        assert_eq!(engine.training_store().count("alice").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replay_vectors_stops_on_block() {
        let engine = strict_engine();
        let vectors = vec![FeatureVector::from_values([500.0; FEATURE_COUNT]); 5];
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let summary = replay_vectors(&engine, "alice", &vectors, &shutdown_rx).await.unwrap();
        assert!(matches!(summary.outcome, SessionOutcome::Blocked { .. }));
        assert_eq!(summary.evaluated, 1);
        assert!(summary.last_verdict.unwrap().is_block());
    }
}
