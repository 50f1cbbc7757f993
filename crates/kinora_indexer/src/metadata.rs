//! # Metadata Templates
//!
//! Off-chain documents (quest, milestone and reward JSON on IPFS) are not
//! fetched by handlers. A handler *activates* a content id and moves on;
//! an independent [`MetadataHydrator`] later fetches the document and saves
//! a [`QuestMetadata`] record under the same id.
//!
//! ```text
//! handler ──activate(cid)──> ChannelActivator ──channel──> MetadataHydrator
//!                                                             │ fetch + parse
//!                                                             ▼
//!                                                        QuestMetadata(cid)
//! ```
//!
//! Nothing in the indexer reads metadata records, so a document that never
//! arrives only leaves the reference dangling.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use crossbeam_channel::{bounded, Receiver, Sender};
use kinora_shared::{ContentId, QuestMetadata};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{EntityStore, EntityStoreExt};

/// Errors raised while hydrating a metadata document.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The document could not be read.
    #[error("failed to read metadata {content}: {source}")]
    Io {
        /// Content id.
        content: ContentId,
        /// Underlying error.
        source: io::Error,
    },

    /// The document is not valid metadata JSON.
    #[error("invalid metadata {content}: {source}")]
    Parse {
        /// Content id.
        content: ContentId,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Result type for metadata hydration.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Registers interest in an off-chain document.
pub trait MetadataActivator {
    /// Activates the template for `content`. Activating the same id twice
    /// has no further effect.
    fn activate(&mut self, content: &ContentId);
}

/// Activator that only remembers what it was asked for.
#[derive(Clone, Debug, Default)]
pub struct RecordingActivator {
    activated: Vec<ContentId>,
}

impl RecordingActivator {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activated ids, in first-activation order.
    #[must_use]
    pub fn activated(&self) -> &[ContentId] {
        &self.activated
    }
}

impl MetadataActivator for RecordingActivator {
    fn activate(&mut self, content: &ContentId) {
        if !self.activated.contains(content) {
            self.activated.push(content.clone());
        }
    }
}

/// Activator feeding a bounded channel drained by a [`MetadataHydrator`].
pub struct ChannelActivator {
    sender: Sender<ContentId>,
    seen: HashSet<ContentId>,
}

impl ChannelActivator {
    /// Creates an activator and the receiver its ids are delivered to.
    #[must_use]
    pub fn new(buffer: usize) -> (Self, Receiver<ContentId>) {
        let (sender, receiver) = bounded(buffer);
        (
            Self {
                sender,
                seen: HashSet::new(),
            },
            receiver,
        )
    }
}

impl MetadataActivator for ChannelActivator {
    fn activate(&mut self, content: &ContentId) {
        if !self.seen.insert(content.clone()) {
            return;
        }
        if self.sender.send(content.clone()).is_err() {
            warn!(%content, "metadata worker gone, activation dropped");
        }
    }
}

/// Where hydration fetches documents from.
pub trait MetadataSource {
    /// Returns the raw document, or `None` if it is not available (yet).
    ///
    /// # Errors
    ///
    /// Returns a [`MetadataError`] if the source failed.
    fn fetch(&self, content: &ContentId) -> MetadataResult<Option<String>>;
}

/// Reads `<directory>/<content id>.json`. Ids with a sub-path, such as
/// `QmA/metadata.json`, map to nested files under the CID's directory.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    directory: PathBuf,
}

impl DirectorySource {
    /// Serves documents from `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl MetadataSource for DirectorySource {
    fn fetch(&self, content: &ContentId) -> MetadataResult<Option<String>> {
        let path = self.directory.join(format!("{content}.json"));
        match std::fs::read_to_string(path) {
            Ok(document) => Ok(Some(document)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(MetadataError::Io {
                content: content.clone(),
                source,
            }),
        }
    }
}

/// Fields the indexer keeps from a metadata document. Other fields are
/// ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetadataDocument {
    cover: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

/// Fetches activated documents and stores them as [`QuestMetadata`].
pub struct MetadataHydrator<S, M> {
    store: S,
    source: M,
    hydrated: usize,
}

impl<S: EntityStore, M: MetadataSource> MetadataHydrator<S, M> {
    /// Creates a hydrator writing to `store`.
    pub fn new(store: S, source: M) -> Self {
        Self {
            store,
            source,
            hydrated: 0,
        }
    }

    /// Number of documents saved so far.
    #[must_use]
    pub const fn hydrated(&self) -> usize {
        self.hydrated
    }

    /// Fetches, parses and saves one document.
    ///
    /// Returns `false` if the source does not have the document.
    ///
    /// # Errors
    ///
    /// Returns a [`MetadataError`] if fetching or parsing failed.
    pub fn hydrate(&mut self, content: &ContentId) -> MetadataResult<bool> {
        let Some(raw) = self.source.fetch(content)? else {
            return Ok(false);
        };
        let document: MetadataDocument =
            serde_json::from_str(&raw).map_err(|source| MetadataError::Parse {
                content: content.clone(),
                source,
            })?;

        self.store.save_record(QuestMetadata {
            cover: document.cover,
            title: document.title,
            description: document.description,
            ..QuestMetadata::new(content)
        });
        self.hydrated += 1;
        Ok(true)
    }

    /// Hydrates every id received until all senders are dropped.
    ///
    /// Failures are logged and skipped; the record simply stays absent.
    pub fn run(mut self, receiver: &Receiver<ContentId>) -> usize {
        for content in receiver {
            match self.hydrate(&content) {
                Ok(true) => debug!(%content, "metadata hydrated"),
                Ok(false) => debug!(%content, "metadata document not available"),
                Err(err) => warn!(error = %err, "metadata hydration failed"),
            }
        }
        self.hydrated
    }
}
