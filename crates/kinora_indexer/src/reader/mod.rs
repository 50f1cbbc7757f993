//! # Chain Reader
//!
//! Enrichment reads against the quest contract.
//!
//! Every method is a named view call evaluated at the block of the event
//! being handled, passed as its `block` argument. Readers must be
//! deterministic: replaying the same events against the same reader yields
//! the same entity graph.

pub mod fixture;

use std::fmt;

use alloy_primitives::{Address, U256};
use kinora_shared::{EngagementFlag, EngagementMetric, VideoRef, QUEST_SCOPE_MILESTONE};
use thiserror::Error;

pub use fixture::{ChainSnapshot, FixtureReader, GateState, MilestoneState, QuestState, RewardState};

/// Errors raised by enrichment reads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The contract reverted the call.
    #[error("call {call} reverted")]
    Reverted {
        /// Call label, e.g. `quest_uri(5)`.
        call: String,
    },

    /// The node could not serve the call.
    #[error("call {call} failed: {reason}")]
    Unavailable {
        /// Call label.
        call: String,
        /// Transport message.
        reason: String,
    },
}

impl ReadError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type for enrichment reads.
pub type ReadResult<T> = Result<T, ReadError>;

/// Owner of a gate: a quest or one of its milestones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateScope {
    /// The quest's entry gate.
    Quest(U256),
    /// A milestone gate.
    Milestone(U256, u64),
}

impl GateScope {
    /// Quest the gate belongs to.
    #[must_use]
    pub const fn quest_id(self) -> U256 {
        match self {
            Self::Quest(quest_id) | Self::Milestone(quest_id, _) => quest_id,
        }
    }

    /// Milestone segment used in keys; 0 for the quest gate.
    #[must_use]
    pub const fn milestone(self) -> u64 {
        match self {
            Self::Quest(_) => QUEST_SCOPE_MILESTONE,
            Self::Milestone(_, milestone) => milestone,
        }
    }
}

impl fmt::Display for GateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quest(quest_id) => write!(f, "{quest_id}"),
            Self::Milestone(quest_id, milestone) => write!(f, "{quest_id},{milestone}"),
        }
    }
}

/// Deterministic view calls against one quest contract.
///
/// Every read takes the block of the event being handled and answers with
/// the contract state as of that block, so re-delivering an old event never
/// sees state the event did not see.
///
/// Gate arrays are returned as the contract stores them: sibling arrays
/// (addresses and thresholds, addresses and token ids) may differ in length.
pub trait ChainReader {
    /// Contract every call is made against.
    fn contract(&self) -> Address;

    /// Quest metadata URI.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn quest_uri(&self, block: u64, quest_id: U256) -> ReadResult<String>;

    /// Quest player cap.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn quest_max_player_count(&self, block: u64, quest_id: U256) -> ReadResult<U256>;

    /// Lens profile that created the quest.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn quest_profile_id(&self, block: u64, quest_id: U256) -> ReadResult<U256>;

    /// Lens publication announcing the quest.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn quest_pub_id(&self, block: u64, quest_id: U256) -> ReadResult<U256>;

    /// ERC20 tokens of a gate.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn gated_erc20_addresses(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Address>>;

    /// ERC20 thresholds of a gate, paired by index with the addresses.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn gated_erc20_thresholds(&self, block: u64, scope: GateScope) -> ReadResult<Vec<U256>>;

    /// ERC721 tokens of a gate.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn gated_erc721_addresses(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Address>>;

    /// Accepted ERC721 token ids, paired by index with the addresses.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn gated_erc721_token_ids(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Vec<U256>>>;

    /// Accepted ERC721 token URIs, paired by index with the addresses.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn gated_erc721_token_uris(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Vec<String>>>;

    /// Whether any single condition satisfies the gate.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn gated_one_of(&self, block: u64, scope: GateScope) -> ReadResult<bool>;

    /// Milestone metadata URI.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn milestone_uri(&self, block: u64, quest_id: U256, milestone: u64) -> ReadResult<String>;

    /// Number of videos the milestone requires.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn milestone_video_length(&self, block: u64, quest_id: U256, milestone: u64) -> ReadResult<u64>;

    /// Composite `"<profileHex>-<pubHex>"` ids of the milestone videos.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn milestone_videos(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
    ) -> ReadResult<Vec<String>>;

    /// Number of rewards paid by the milestone.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn milestone_rewards_length(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
    ) -> ReadResult<u64>;

    /// Integer-encoded kind of one reward.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn reward_kind(&self, block: u64, quest_id: U256, milestone: u64, index: u64) -> ReadResult<u8>;

    /// URI of one reward.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn reward_uri(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<String>;

    /// Token contract of one reward.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn reward_token_address(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<Address>;

    /// Token amount of one reward.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn reward_amount(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<U256>;

    /// Minimum a player must reach on one metric for a milestone video.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn video_threshold(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        video: VideoRef,
        metric: EngagementMetric,
    ) -> ReadResult<U256>;

    /// Whether a milestone video requires one kind of interaction.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn video_requirement(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        video: VideoRef,
        flag: EngagementFlag,
    ) -> ReadResult<bool>;

    /// A player's current value of one metric for a video.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn player_video_metric(
        &self,
        block: u64,
        player: U256,
        video: VideoRef,
        metric: EngagementMetric,
    ) -> ReadResult<U256>;

    /// Whether a player has performed one kind of interaction on a video.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadError`] if the call fails.
    fn player_video_flag(
        &self,
        block: u64,
        player: U256,
        video: VideoRef,
        flag: EngagementFlag,
    ) -> ReadResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_scope_segments() {
        let quest = GateScope::Quest(U256::from(5));
        let milestone = GateScope::Milestone(U256::from(5), 2);

        assert_eq!(quest.milestone(), 0);
        assert_eq!(milestone.milestone(), 2);
        assert_eq!(milestone.quest_id(), U256::from(5));
        assert_eq!(milestone.to_string(), "5,2");
    }

    #[test]
    fn test_only_unavailable_is_transient() {
        let reverted = ReadError::Reverted { call: "quest_uri(1)".into() };
        let unavailable = ReadError::Unavailable {
            call: "quest_uri(1)".into(),
            reason: "timeout".into(),
        };
        assert!(!reverted.is_transient());
        assert!(unavailable.is_transient());
    }
}
