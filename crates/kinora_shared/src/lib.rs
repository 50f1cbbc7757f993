//! # KINORA Shared
//!
//! Types shared by every Kinora crate: the entity model the indexer
//! materializes, the decoded contract events it consumes, and the
//! identifier builder that ties the two together.
//!
//! ## CRITICAL RULE
//!
//! Every cross-reference between entities is an [`EntityId`] built by the
//! functions in [`ids`]. Never format a key by hand: a key built any other
//! way creates a duplicate entity instead of updating the intended one.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod engagement;
pub mod entities;
pub mod events;
pub mod ids;

pub use constants::{QUEST_SCOPE_MILESTONE, QUEST_STATUS_ACTIVE};
pub use engagement::{Engagement, EngagementFlag, EngagementMetric};
pub use entities::{
    push_unique, CompletionActivity, Eligible, Entity, EntityKind, Erc20Logic, Erc721Logic,
    EventRecord, Gate, Milestone, Player, Quest, QuestMetadata, Record, Reward, RewardKind, Video,
    VideoActivity,
};
pub use events::{EventEnvelope, QuestEvent};
pub use ids::{normalize_uri, ContentId, EntityId, IdError, VideoRef};
