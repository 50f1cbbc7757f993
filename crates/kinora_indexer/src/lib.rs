//! # KINORA Indexer
//!
//! Materializes Kinora quest contract events into a normalized entity graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    Logs     ┌─────────────────┐
//! │  Quest          │ ─────────▶  │  EventListener  │
//! │  Contract       │             │  (LogDecoder)   │
//! └────────┬────────┘             └────────┬────────┘
//!          │ view calls                    │ EventEnvelope
//!          ▼                               ▼
//! ┌─────────────────┐             ┌─────────────────┐    writes    ┌─────────────┐
//! │  ChainReader    │ ◀────────── │  Pipeline       │ ───────────▶ │ EntityStore │
//! └─────────────────┘  enrichment │  (StagedWrites) │              └─────────────┘
//!                                 └────────┬────────┘
//!                                          │ activate(cid)
//!                                          ▼
//!                                 ┌─────────────────┐
//!                                 │ MetadataHydrator│
//!                                 └─────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Events are applied one at a time, in delivery order
//! - An event's writes are applied all together or not at all
//! - Re-delivering an event leaves the store unchanged

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod contracts;
pub mod error;
pub mod events;
pub mod handlers;
pub mod listener;
pub mod metadata;
pub mod pipeline;
pub mod reader;
pub mod staging;
pub mod store;

pub use contracts::IKinoraQuest;
pub use error::{FailedEvent, IndexError, IndexResult};
pub use events::{DecodeError, DecodeResult, LogDecoder, RawLog};
pub use listener::{EventListener, ListenerConfig, ListenerStats};
pub use metadata::{
    ChannelActivator, DirectorySource, MetadataActivator, MetadataError, MetadataHydrator,
    MetadataResult, MetadataSource, RecordingActivator,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineStats};
pub use reader::{ChainReader, ChainSnapshot, FixtureReader, GateScope, ReadError, ReadResult};
pub use staging::StagedWrites;
pub use store::{EntityStore, EntityStoreExt, MemoryStore, SharedStore};
