//! # KINORA
//!
//! The indexer binary's library half: configuration, logging and the
//! replay driver that feeds recorded events through the pipeline.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod replay;

pub use app::{run, write_dump, RunSummary};
pub use config::{Config, ConfigError, ConfigResult, IndexerConfig, LoggingConfig, MetadataConfig};
pub use error::{AppError, AppResult};
pub use replay::EventReader;
