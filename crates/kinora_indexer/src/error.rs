//! # Indexer Error Types
//!
//! Errors that abort the processing of one event.

use kinora_shared::EventEnvelope;
use thiserror::Error;

use crate::events::DecodeError;
use crate::reader::ReadError;

/// Errors that can occur while indexing an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// An enrichment read failed. Nothing of the event was persisted.
    #[error("enrichment read failed: {0}")]
    Enrichment(#[from] ReadError),

    /// A raw log could not be decoded.
    #[error("undecodable log: {0}")]
    Decode(#[from] DecodeError),
}

impl IndexError {
    /// Whether re-delivering the same event may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Enrichment(err) => err.is_transient(),
            Self::Decode(_) => false,
        }
    }
}

/// Result type for indexing operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// An event the pipeline gave up on, handed back so it can be delivered
/// again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{} at block {} (tx {}, log {}) failed: {error}",
    .envelope.event.name(),
    .envelope.block_number,
    .envelope.transaction_hash,
    .envelope.log_index
)]
pub struct FailedEvent {
    /// The event, exactly as it was taken from the queue.
    pub envelope: Box<EventEnvelope>,
    /// Why it failed.
    #[source]
    pub error: IndexError,
}

impl FailedEvent {
    /// Pairs an event with its failure.
    #[must_use]
    pub fn new(envelope: EventEnvelope, error: IndexError) -> Self {
        Self {
            envelope: Box::new(envelope),
            error,
        }
    }
}
