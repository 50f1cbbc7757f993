//! # Entity Model
//!
//! The normalized graph the indexer materializes from quest events.
//!
//! ## Relationships
//!
//! ```text
//! Quest ──┬──> Gate ──> Erc20Logic / Erc721Logic
//!         ├──> QuestMetadata
//!         ├──> Milestone* ──┬──> Gate
//!         │                 ├──> Video*
//!         │                 └──> Reward* ──> QuestMetadata
//!         └──> Player* ──┬──> Eligible*
//!                        ├──> CompletionActivity*
//!                        └──> VideoActivity*
//! ```
//!
//! Every relationship is an [`EntityId`] (or a quest id for the player's
//! quest lists). Relationship lists only ever grow: use [`push_unique`] to
//! append.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{REWARD_KIND_ERC20, REWARD_KIND_ERC721};
use crate::engagement::Engagement;
use crate::events::{EventEnvelope, QuestEvent};
use crate::ids::{ContentId, EntityId, VideoRef};

/// Appends `item` unless the list already holds it.
///
/// Returns `true` if the list grew. Lists are relationship indexes, not
/// audit logs, so a repeated event never adds a second copy.
pub fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        return false;
    }
    list.push(item);
    true
}

/// The kind of a stored entity. Stores partition their keys by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// [`Quest`]
    Quest,
    /// [`Milestone`]
    Milestone,
    /// [`Gate`]
    Gate,
    /// [`Erc20Logic`]
    Erc20Logic,
    /// [`Erc721Logic`]
    Erc721Logic,
    /// [`Video`]
    Video,
    /// [`Reward`]
    Reward,
    /// [`Player`]
    Player,
    /// [`Eligible`]
    Eligible,
    /// [`CompletionActivity`]
    CompletionActivity,
    /// [`VideoActivity`]
    VideoActivity,
    /// [`QuestMetadata`]
    QuestMetadata,
    /// [`EventRecord`]
    EventRecord,
}

/// A quest campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Key.
    pub id: EntityId,
    /// On-chain quest id.
    pub quest_id: U256,
    /// Number of milestones at instantiation.
    pub milestone_count: Option<u64>,
    /// Player cap.
    pub max_player_count: Option<U256>,
    /// Lens profile that created the quest.
    pub profile_id: Option<U256>,
    /// Lens publication announcing the quest.
    pub pub_id: Option<U256>,
    /// Normalized quest URI.
    pub uri: Option<String>,
    /// `true` while the quest is active.
    pub status: Option<bool>,
    /// Entry gate.
    pub gate: Option<EntityId>,
    /// Off-chain metadata, set only when `uri` resolves.
    pub quest_metadata: Option<EntityId>,
    /// Milestones in order.
    pub milestones: Vec<EntityId>,
    /// Players who joined.
    pub players: Vec<EntityId>,
}

impl Quest {
    /// Creates an empty quest row.
    #[must_use]
    pub fn new(quest_id: U256) -> Self {
        Self {
            id: EntityId::quest(quest_id),
            quest_id,
            milestone_count: None,
            max_player_count: None,
            profile_id: None,
            pub_id: None,
            uri: None,
            status: None,
            gate: None,
            quest_metadata: None,
            milestones: Vec::new(),
            players: Vec::new(),
        }
    }
}

/// One stage of a quest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Key.
    pub id: EntityId,
    /// Owning quest.
    pub quest_id: U256,
    /// Sequence number within the quest, from 1.
    pub milestone_id: u64,
    /// Normalized milestone URI.
    pub uri: Option<String>,
    /// Off-chain metadata, set only when `uri` resolves.
    pub milestone_metadata: Option<EntityId>,
    /// Gate guarding the milestone.
    pub gated: Option<EntityId>,
    /// Number of videos the contract reports.
    pub video_length: Option<u64>,
    /// Number of rewards the contract reports.
    pub rewards_length: Option<u64>,
    /// Video requirements.
    pub videos: Vec<EntityId>,
    /// Rewards paid on completion.
    pub rewards: Vec<EntityId>,
}

impl Milestone {
    /// Creates an empty milestone row.
    #[must_use]
    pub fn new(quest_id: U256, milestone_id: u64) -> Self {
        Self {
            id: EntityId::milestone(quest_id, milestone_id),
            quest_id,
            milestone_id,
            uri: None,
            milestone_metadata: None,
            gated: None,
            video_length: None,
            rewards_length: None,
            videos: Vec::new(),
            rewards: Vec::new(),
        }
    }
}

/// Token-holding rule guarding a quest or milestone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Key.
    pub id: EntityId,
    /// ERC20 conditions.
    pub erc20_logic: Vec<EntityId>,
    /// ERC721 conditions.
    pub erc721_logic: Vec<EntityId>,
    /// `true`: any one condition suffices. `false`: all are required.
    pub one_of: Option<bool>,
}

/// Minimum ERC20 balance condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Logic {
    /// Key.
    pub id: EntityId,
    /// Token contract.
    pub address: Address,
    /// Required balance; absent when the contract returned no threshold.
    pub amount: Option<U256>,
}

/// ERC721 holding condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc721Logic {
    /// Key.
    pub id: EntityId,
    /// Token contract.
    pub address: Address,
    /// Accepted token ids.
    pub token_ids: Option<Vec<U256>>,
    /// Accepted token URIs.
    pub token_uris: Option<Vec<String>>,
}

/// A Lens video a milestone requires the player to engage with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    /// Key.
    pub id: EntityId,
    /// Composite `"<profileHex>-<pubHex>"` id as returned by the contract.
    pub composite_id: String,
    /// Owning quest.
    pub quest_id: U256,
    /// Owning milestone.
    pub milestone_id: u64,
    /// Profile that posted the video; absent if `composite_id` is malformed.
    pub profile_id: Option<U256>,
    /// Publication id; absent if `composite_id` is malformed.
    pub pub_id: Option<U256>,
    /// Minimum engagement required; absent if `composite_id` is malformed.
    pub criteria: Option<Engagement>,
}

impl Video {
    /// Returns the parsed publication reference, when both ids are known.
    #[must_use]
    pub fn video_ref(&self) -> Option<VideoRef> {
        Some(VideoRef::new(self.profile_id?, self.pub_id?))
    }
}

/// Reward kind as encoded by the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    /// Fungible token payout.
    Erc20,
    /// NFT payout.
    Erc721,
    /// A code this indexer does not know.
    Unknown(u8),
}

impl From<u8> for RewardKind {
    fn from(code: u8) -> Self {
        match code {
            REWARD_KIND_ERC20 => Self::Erc20,
            REWARD_KIND_ERC721 => Self::Erc721,
            other => Self::Unknown(other),
        }
    }
}

/// One payout for completing a milestone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Key.
    pub id: EntityId,
    /// Owning quest.
    pub quest_id: U256,
    /// Owning milestone.
    pub milestone_id: u64,
    /// Position in the milestone's reward list.
    pub index: u64,
    /// Payout kind.
    pub kind: Option<RewardKind>,
    /// Token amount.
    pub amount: Option<U256>,
    /// Token contract.
    pub token_address: Option<Address>,
    /// Normalized reward URI.
    pub uri: Option<String>,
    /// Off-chain metadata, set only when `uri` resolves.
    pub reward_metadata: Option<EntityId>,
}

/// A Lens profile taking part in quests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Key.
    pub id: EntityId,
    /// Lens profile id.
    pub profile_id: U256,
    /// Quest ids joined.
    pub quests_joined: Vec<U256>,
    /// Quest ids completed.
    pub quests_completed: Vec<U256>,
    /// Completion records.
    pub milestones_completed: Vec<EntityId>,
    /// Eligibility records.
    pub eligible: Vec<EntityId>,
    /// Video activity snapshots.
    pub videos: Vec<EntityId>,
}

impl Player {
    /// Creates a player with empty lists.
    #[must_use]
    pub fn new(profile_id: U256) -> Self {
        Self {
            id: EntityId::player(profile_id),
            profile_id,
            quests_joined: Vec::new(),
            quests_completed: Vec::new(),
            milestones_completed: Vec::new(),
            eligible: Vec::new(),
            videos: Vec::new(),
        }
    }
}

/// Whether a player may currently claim a milestone's rewards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligible {
    /// Key.
    pub id: EntityId,
    /// Quest id.
    pub quest_id: U256,
    /// Milestone number.
    pub milestone: u64,
    /// Lens profile of the player.
    pub player: U256,
    /// Current eligibility. Last writer wins.
    pub status: bool,
}

impl Eligible {
    /// Builds the eligibility row for `(quest, milestone, player)`.
    #[must_use]
    pub fn new(quest_id: U256, milestone: u64, player: U256, status: bool) -> Self {
        Self {
            id: EntityId::eligible(quest_id, milestone, player),
            quest_id,
            milestone,
            player,
            status,
        }
    }
}

/// Record of a milestone completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionActivity {
    /// Key.
    pub id: EntityId,
    /// Quest id.
    pub quest_id: U256,
    /// Milestone number.
    pub milestone: u64,
    /// Lens profile of the player.
    pub player: U256,
    /// Block of the completion event.
    pub block_number: u64,
    /// Timestamp of that block.
    pub block_timestamp: u64,
}

/// Latest engagement snapshot of a player for one video.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoActivity {
    /// Key.
    pub id: EntityId,
    /// Lens profile of the player.
    pub player: U256,
    /// Profile that posted the video.
    pub video_profile_id: U256,
    /// Publication id of the video.
    pub video_pub_id: U256,
    /// Engagement at `block_number`.
    pub metrics: Engagement,
    /// Block of the update that produced this snapshot.
    pub block_number: u64,
}

/// Off-chain document describing a quest, milestone or reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestMetadata {
    /// Key (the content id).
    pub id: EntityId,
    /// Cover image URI.
    pub cover: Option<String>,
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
}

impl QuestMetadata {
    /// Creates an empty metadata row for a content id.
    #[must_use]
    pub fn new(content: &ContentId) -> Self {
        Self {
            id: EntityId::metadata(content),
            cover: None,
            title: None,
            description: None,
        }
    }
}

/// The raw event as delivered to the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Key, derived from transaction hash and log index.
    pub id: EntityId,
    /// Transaction that emitted the log.
    pub transaction_hash: B256,
    /// Index of the log within its block.
    pub log_index: u64,
    /// Block number.
    pub block_number: u64,
    /// Block timestamp.
    pub block_timestamp: u64,
    /// Decoded event.
    pub event: QuestEvent,
}

impl From<&EventEnvelope> for EventRecord {
    fn from(envelope: &EventEnvelope) -> Self {
        Self {
            id: envelope.record_id(),
            transaction_hash: envelope.transaction_hash,
            log_index: envelope.log_index,
            block_number: envelope.block_number,
            block_timestamp: envelope.block_timestamp,
            event: envelope.event.clone(),
        }
    }
}

/// Any stored entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity")]
pub enum Entity {
    /// A quest.
    Quest(Quest),
    /// A milestone.
    Milestone(Milestone),
    /// A gate.
    Gate(Gate),
    /// An ERC20 gating condition.
    Erc20Logic(Erc20Logic),
    /// An ERC721 gating condition.
    Erc721Logic(Erc721Logic),
    /// A video requirement.
    Video(Video),
    /// A reward.
    Reward(Reward),
    /// A player.
    Player(Player),
    /// An eligibility flag.
    Eligible(Eligible),
    /// A completion record.
    CompletionActivity(CompletionActivity),
    /// A video engagement snapshot.
    VideoActivity(VideoActivity),
    /// A hydrated metadata document.
    QuestMetadata(QuestMetadata),
    /// A raw event.
    EventRecord(EventRecord),
}

/// A concrete entity type that can round-trip through [`Entity`].
pub trait Record: Sized + Into<Entity> {
    /// Kind the record is stored under.
    const KIND: EntityKind;

    /// Key of this record.
    fn id(&self) -> &EntityId;

    /// Unwraps the record from an [`Entity`] of the matching kind.
    fn from_entity(entity: Entity) -> Option<Self>;
}

macro_rules! impl_record {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Entity {
                fn from(record: $ty) -> Self {
                    Entity::$ty(record)
                }
            }

            impl Record for $ty {
                const KIND: EntityKind = EntityKind::$ty;

                fn id(&self) -> &EntityId {
                    &self.id
                }

                fn from_entity(entity: Entity) -> Option<Self> {
                    match entity {
                        Entity::$ty(record) => Some(record),
                        _ => None,
                    }
                }
            }
        )*

        impl Entity {
            /// Kind of the wrapped record.
            #[must_use]
            pub const fn kind(&self) -> EntityKind {
                match self {
                    $(Entity::$ty(_) => EntityKind::$ty,)*
                }
            }

            /// Key of the wrapped record.
            #[must_use]
            pub fn id(&self) -> &EntityId {
                match self {
                    $(Entity::$ty(record) => &record.id,)*
                }
            }
        }
    };
}

impl_record!(
    Quest,
    Milestone,
    Gate,
    Erc20Logic,
    Erc721Logic,
    Video,
    Reward,
    Player,
    Eligible,
    CompletionActivity,
    VideoActivity,
    QuestMetadata,
    EventRecord,
);
