//! # Application Error Types
//!
//! Errors that stop the indexer binary.

use std::path::PathBuf;

use kinora_indexer::FailedEvent;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::config::ConfigError;

/// Errors that can occur while running the indexer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("failed to initialize logging: {0}")]
    Logging(#[from] TryInitError),

    /// A file could not be opened, read or written.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A JSON file is invalid.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The event stream could not be read.
    #[error("failed to read events: {source}")]
    ReadEvents {
        /// Underlying error.
        source: std::io::Error,
    },

    /// A recorded event is not a valid envelope.
    #[error("invalid event on line {line}: {source}")]
    Replay {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// An event still failed after retries; the run stops there.
    #[error("indexing stopped: {0}")]
    EventFailed(#[source] Box<FailedEvent>),

    /// The metadata worker thread could not be started.
    #[error("failed to spawn metadata worker: {0}")]
    Spawn(std::io::Error),

    /// The metadata worker thread panicked.
    #[error("metadata worker panicked")]
    WorkerPanicked,
}

/// Result type for the indexer binary.
pub type AppResult<T> = Result<T, AppError>;
