//! # Indexer Run
//!
//! Wires configuration, chain state and an event stream into one indexing
//! run.
//!
//! ```text
//! events ──> EventListener ──> Pipeline (main thread) ──> SharedStore
//!                                 │ activate                  ▲
//!                                 ▼                           │ QuestMetadata
//!                          ChannelActivator ──> MetadataHydrator (worker)
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread;

use kinora_indexer::{
    ChainSnapshot, ChannelActivator, DirectorySource, EventListener, FixtureReader,
    MemoryStore, MetadataActivator, MetadataHydrator, Pipeline, PipelineStats,
    RecordingActivator, SharedStore,
};
use kinora_shared::EventEnvelope;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Outcome of a run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Pipeline counters.
    pub stats: PipelineStats,
    /// Metadata documents written by the worker.
    pub hydrated: usize,
    /// Final store contents.
    pub store: MemoryStore,
}

/// Indexes `events` against `chain`.
///
/// The run stops at the first event that still fails after retries, so the
/// store never moves past an event it could not apply. Entities written
/// before that event stay in the store.
///
/// # Errors
///
/// Returns [`AppError::EventFailed`] with the failed event, or another
/// [`AppError`] if the event stream is unreadable or the metadata worker
/// panicked.
pub fn run<I>(config: &Config, chain: ChainSnapshot, events: I) -> AppResult<RunSummary>
where
    I: IntoIterator<Item = AppResult<EventEnvelope>>,
{
    let store = SharedStore::new();
    let reader = FixtureReader::new(config.indexer.contract_address, chain);
    let listener = EventListener::new(config.listener_config());

    if !config.metadata.enabled {
        let mut pipeline =
            Pipeline::new(store.clone(), reader, RecordingActivator::new(), config.pipeline_config());
        feed(&mut pipeline, &listener, events)?;
        info!(
            activations = pipeline.activator().activated().len(),
            "metadata hydration disabled"
        );
        return Ok(summary(pipeline.stats(), 0, &store));
    }

    let (activator, receiver) = ChannelActivator::new(config.metadata.channel_buffer);
    let hydrator = MetadataHydrator::new(
        store.clone(),
        DirectorySource::new(config.metadata.directory.clone()),
    );
    let worker = thread::Builder::new()
        .name("kinora-metadata".to_string())
        .spawn(move || hydrator.run(&receiver))
        .map_err(AppError::Spawn)?;

    let mut pipeline = Pipeline::new(store.clone(), reader, activator, config.pipeline_config());
    let fed = feed(&mut pipeline, &listener, events);
    let stats = pipeline.stats();
    // Dropping the activator closes the channel and lets the worker finish.
    drop(pipeline);
    let hydrated = worker.join().map_err(|_| AppError::WorkerPanicked)?;
    fed?;

    Ok(summary(stats, hydrated, &store))
}

fn summary(stats: PipelineStats, hydrated: usize, store: &SharedStore) -> RunSummary {
    RunSummary {
        stats,
        hydrated,
        store: store.snapshot(),
    }
}

fn feed<A, I>(
    pipeline: &mut Pipeline<SharedStore, FixtureReader, A>,
    listener: &EventListener,
    events: I,
) -> AppResult<()>
where
    A: MetadataActivator,
    I: IntoIterator<Item = AppResult<EventEnvelope>>,
{
    for event in events {
        let envelope = event?;
        if listener.pending() >= listener.config().channel_buffer {
            drain(pipeline, listener)?;
        }
        if !listener.inject(envelope) {
            warn!("event channel full, event dropped");
        }
    }
    drain(pipeline, listener)
}

fn drain<A: MetadataActivator>(
    pipeline: &mut Pipeline<SharedStore, FixtureReader, A>,
    listener: &EventListener,
) -> AppResult<()> {
    pipeline.drain(listener).map(|_| ()).map_err(|failed| {
        error!(
            event = failed.envelope.event.name(),
            block = failed.envelope.block_number,
            log_index = failed.envelope.log_index,
            error = %failed.error,
            "event failed, stopping"
        );
        AppError::EventFailed(Box::new(failed))
    })
}

/// Writes every entity in `store` to `path` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`AppError::Io`] if the file cannot be created or flushed and
/// [`AppError::Json`] if serialization fails.
pub fn write_dump(path: &Path, store: &MemoryStore) -> AppResult<()> {
    let io_error = |source| AppError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    let entities: Vec<_> = store.iter().collect();
    serde_json::to_writer_pretty(&mut writer, &entities).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error)
}
