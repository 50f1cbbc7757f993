//! # Materialization Pipeline
//!
//! Applies events to the entity store, one at a time and in order.
//!
//! ## Event Lifecycle
//!
//! ```text
//! envelope ─┬─ below start_block ──> skipped
//!           └─ dispatch into StagedWrites
//!                 ├─ Err ──> overlay dropped, nothing persisted
//!                 └─ Ok  ──> writes saved, metadata activated
//! ```
//!
//! A failed event leaves the store exactly as it was, so the same event can
//! be delivered again.

use kinora_shared::EventEnvelope;
use tracing::{debug, warn};

use crate::error::{FailedEvent, IndexResult};
use crate::handlers;
use crate::listener::EventListener;
use crate::metadata::MetadataActivator;
use crate::reader::ChainReader;
use crate::staging::StagedWrites;
use crate::store::EntityStore;

/// Pipeline settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Events from earlier blocks are ignored.
    pub start_block: u64,
    /// Extra attempts for an event whose reads failed transiently.
    pub max_read_retries: u32,
}

/// Pipeline counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Events applied to the store.
    pub processed: u64,
    /// Events ignored because of `start_block`.
    pub skipped: u64,
    /// Events that failed and were not applied.
    pub failed: u64,
    /// Retried attempts.
    pub retried: u64,
    /// Block of the last applied event.
    pub last_block: Option<u64>,
}

/// Owns the store, the chain reader and the metadata activator.
pub struct Pipeline<S, R, A> {
    store: S,
    reader: R,
    activator: A,
    config: PipelineConfig,
    stats: PipelineStats,
}

impl<S, R, A> Pipeline<S, R, A>
where
    S: EntityStore,
    R: ChainReader,
    A: MetadataActivator,
{
    /// Creates a pipeline.
    pub fn new(store: S, reader: R, activator: A, config: PipelineConfig) -> Self {
        Self {
            store,
            reader,
            activator,
            config,
            stats: PipelineStats::default(),
        }
    }

    /// Applies one event.
    ///
    /// Returns `false` if the event was skipped.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`](crate::IndexError) if the handler failed.
    /// The store is left untouched.
    pub fn process(&mut self, envelope: &EventEnvelope) -> IndexResult<bool> {
        let result = self.try_process(envelope);
        if result.is_err() {
            self.stats.failed += 1;
        }
        result
    }

    /// Applies one event, retrying up to `max_read_retries` times while the
    /// failure is transient.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted or the failure is
    /// permanent.
    pub fn process_with_retry(&mut self, envelope: &EventEnvelope) -> IndexResult<bool> {
        let mut attempt = 0;
        loop {
            match self.try_process(envelope) {
                Err(err) if err.is_transient() && attempt < self.config.max_read_retries => {
                    attempt += 1;
                    self.stats.retried += 1;
                    warn!(
                        event = envelope.event.name(),
                        block = envelope.block_number,
                        attempt,
                        error = %err,
                        "retrying event"
                    );
                }
                Err(err) => {
                    self.stats.failed += 1;
                    return Err(err);
                }
                Ok(applied) => return Ok(applied),
            }
        }
    }

    /// Processes every queued event in order.
    ///
    /// Returns the number of events taken from the listener.
    ///
    /// # Errors
    ///
    /// Stops at the first event that still fails after retries and hands
    /// it back in a [`FailedEvent`]. Events behind it stay queued.
    pub fn drain(&mut self, listener: &EventListener) -> Result<usize, FailedEvent> {
        let receiver = listener.receiver();
        let mut taken = 0;
        while let Ok(envelope) = receiver.try_recv() {
            taken += 1;
            let result = self.process_with_retry(&envelope);
            listener.record_processed();
            if let Err(error) = result {
                return Err(FailedEvent::new(envelope, error));
            }
        }
        Ok(taken)
    }

    fn try_process(&mut self, envelope: &EventEnvelope) -> IndexResult<bool> {
        if envelope.block_number < self.config.start_block {
            self.stats.skipped += 1;
            debug!(block = envelope.block_number, "event before start block skipped");
            return Ok(false);
        }

        let mut tx = StagedWrites::new(&self.store);
        handlers::dispatch(&mut tx, &self.reader, envelope)?;
        let (writes, activations) = tx.into_parts();

        for entity in writes {
            self.store.save(entity);
        }
        for content in &activations {
            self.activator.activate(content);
        }

        self.stats.processed += 1;
        self.stats.last_block = Some(envelope.block_number);
        Ok(true)
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// The entity store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The metadata activator.
    #[must_use]
    pub const fn activator(&self) -> &A {
        &self.activator
    }

    /// Releases the store and the activator.
    pub fn into_parts(self) -> (S, A) {
        (self.store, self.activator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RecordingActivator;
    use crate::reader::{ChainSnapshot, FixtureReader, QuestState};
    use crate::store::MemoryStore;
    use alloy_primitives::{Address, B256, U256};
    use kinora_shared::{EntityKind, QuestEvent};

    fn envelope(block_number: u64, event: QuestEvent) -> EventEnvelope {
        EventEnvelope {
            transaction_hash: B256::repeat_byte(block_number as u8),
            log_index: 0,
            block_number,
            block_timestamp: block_number * 12,
            event,
        }
    }

    fn instantiate(block_number: u64) -> EventEnvelope {
        envelope(
            block_number,
            QuestEvent::QuestInstantiated {
                quest_id: U256::from(5),
                milestone_count: 0,
            },
        )
    }

    fn pipeline(
        reader: FixtureReader,
        config: PipelineConfig,
    ) -> Pipeline<MemoryStore, FixtureReader, RecordingActivator> {
        Pipeline::new(MemoryStore::new(), reader, RecordingActivator::new(), config)
    }

    fn reader() -> FixtureReader {
        FixtureReader::new(Address::ZERO, ChainSnapshot::default()).with_quest(QuestState {
            quest_id: U256::from(5),
            uri: "ipfs://QmQuest".into(),
            ..QuestState::default()
        })
    }

    #[test]
    fn test_events_before_start_block_are_skipped() {
        let mut pipeline = pipeline(
            reader(),
            PipelineConfig {
                start_block: 10,
                ..PipelineConfig::default()
            },
        );

        assert!(!pipeline.process(&instantiate(9)).unwrap());
        assert!(pipeline.store().is_empty());
        assert!(pipeline.process(&instantiate(10)).unwrap());

        let stats = pipeline.stats();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.last_block, Some(10));
    }

    #[test]
    fn test_commit_applies_writes_and_activations() {
        let mut pipeline = pipeline(reader(), PipelineConfig::default());
        pipeline.process(&instantiate(1)).unwrap();

        assert_eq!(pipeline.store().count(EntityKind::Quest), 1);
        assert_eq!(pipeline.store().count(EntityKind::EventRecord), 1);
        assert_eq!(pipeline.activator().activated().len(), 1);
    }

    #[test]
    fn test_failed_event_persists_nothing() {
        let mut pipeline = pipeline(reader().with_revert("gated_one_of(5)"), PipelineConfig::default());

        assert!(pipeline.process(&instantiate(1)).is_err());
        assert!(pipeline.store().is_empty());
        assert!(pipeline.activator().activated().is_empty());
        assert_eq!(pipeline.stats().failed, 1);
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let config = PipelineConfig {
            max_read_retries: 2,
            ..PipelineConfig::default()
        };
        let mut pipeline = pipeline(reader().with_unavailable("quest_uri(5)", 2), config);

        assert!(pipeline.process_with_retry(&instantiate(1)).unwrap());
        assert_eq!(pipeline.stats().retried, 2);
        assert_eq!(pipeline.stats().failed, 0);
    }

    #[test]
    fn test_retries_are_bounded() {
        let config = PipelineConfig {
            max_read_retries: 1,
            ..PipelineConfig::default()
        };
        let mut pipeline = pipeline(reader().with_unavailable("quest_uri(5)", 5), config);

        assert!(pipeline.process_with_retry(&instantiate(1)).is_err());
        assert_eq!(pipeline.stats().retried, 1);
        assert_eq!(pipeline.stats().failed, 1);
    }

    #[test]
    fn test_drain_stops_at_failure() {
        let listener = EventListener::new(crate::listener::ListenerConfig::default());
        let mut pipeline = pipeline(reader().with_revert("quest_uri(5)"), PipelineConfig::default());

        assert!(listener.inject(instantiate(1)));
        assert!(listener.inject(envelope(
            2,
            QuestEvent::QuestCompleted {
                quest_id: U256::from(5),
                player_profile_id: U256::from(9),
            },
        )));

        assert!(pipeline.drain(&listener).is_err());
        assert_eq!(listener.pending(), 1);
        assert_eq!(pipeline.drain(&listener).unwrap(), 1);
        assert_eq!(pipeline.stats().processed, 1);
    }

    #[test]
    fn test_drain_hands_back_the_failed_event() {
        let listener = EventListener::new(crate::listener::ListenerConfig::default());
        let mut failing =
            pipeline(reader().with_revert("quest_uri(5)"), PipelineConfig::default());
        assert!(listener.inject(instantiate(1)));

        let failed = failing.drain(&listener).unwrap_err();
        assert_eq!(*failed.envelope, instantiate(1));
        assert!(matches!(failed.error, crate::IndexError::Enrichment(_)));
        assert_eq!(listener.pending(), 0);

        let mut healthy = pipeline(reader(), PipelineConfig::default());
        assert!(listener.inject(*failed.envelope));
        assert_eq!(healthy.drain(&listener).unwrap(), 1);
        assert_eq!(healthy.store().count(EntityKind::Quest), 1);
    }
}
