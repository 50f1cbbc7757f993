//! # Fixture Reader
//!
//! A [`ChainReader`] backed by an in-memory snapshot of contract state.
//!
//! Quest and player state carry the block they apply from. A read at block
//! `b` sees the latest entry applying at or before `b`, so history can be
//! replayed against later state without leaking it into old events.
//!
//! Unknown quests, milestones and players read as zero values, the way the
//! contract answers for ids it never stored. Individual calls can be made
//! to revert, or to fail a number of times before succeeding, by their call
//! label (e.g. `quest_uri(5)`). Labels do not include the block.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};
use kinora_shared::{Engagement, EngagementFlag, EngagementMetric, VideoRef};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{ChainReader, GateScope, ReadError, ReadResult};

/// Gate arrays as stored by the contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateState {
    /// ERC20 tokens.
    pub erc20_addresses: Vec<Address>,
    /// ERC20 thresholds.
    pub erc20_thresholds: Vec<U256>,
    /// ERC721 tokens.
    pub erc721_addresses: Vec<Address>,
    /// ERC721 token ids per token.
    pub erc721_token_ids: Vec<Vec<U256>>,
    /// ERC721 token URIs per token.
    pub erc721_token_uris: Vec<Vec<String>>,
    /// Any-one-of semantics.
    pub one_of: bool,
}

/// Criteria of one milestone video.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCriteria {
    /// The video.
    pub video: VideoRef,
    /// Required minimums and interactions.
    pub criteria: Engagement,
}

/// One reward as stored by the contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardState {
    /// Integer-encoded kind.
    pub kind: u8,
    /// Reward URI.
    pub uri: String,
    /// Token contract.
    pub token_address: Address,
    /// Token amount.
    pub amount: U256,
}

/// One milestone as stored by the contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneState {
    /// Milestone URI.
    pub uri: String,
    /// Milestone gate.
    pub gate: GateState,
    /// Composite video ids.
    pub videos: Vec<String>,
    /// Reported video count; defaults to `videos.len()`.
    pub video_length: Option<u64>,
    /// Criteria per video.
    pub criteria: Vec<VideoCriteria>,
    /// Rewards.
    pub rewards: Vec<RewardState>,
}

/// One quest as stored by the contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestState {
    /// Quest id.
    pub quest_id: U256,
    /// First block this state applies to.
    pub from_block: u64,
    /// Quest URI.
    pub uri: String,
    /// Player cap.
    pub max_player_count: U256,
    /// Creator profile.
    pub profile_id: U256,
    /// Announcement publication.
    pub pub_id: U256,
    /// Entry gate.
    pub gate: GateState,
    /// Milestones, numbered from 1.
    pub milestones: Vec<MilestoneState>,
}

/// A player's engagement with one video.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerVideoState {
    /// Player profile.
    pub player: U256,
    /// The video.
    pub video: VideoRef,
    /// First block these metrics apply to.
    #[serde(default)]
    pub from_block: u64,
    /// Current metrics.
    pub metrics: Engagement,
}

/// Contract state served by a [`FixtureReader`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSnapshot {
    /// Quests.
    pub quests: Vec<QuestState>,
    /// Player engagement.
    pub player_videos: Vec<PlayerVideoState>,
    /// Labels of calls that revert.
    pub reverts: BTreeSet<String>,
    /// Labels of calls that fail transiently, with the number of failures
    /// before they succeed.
    pub unavailable: BTreeMap<String, u32>,
}

/// In-memory [`ChainReader`].
pub struct FixtureReader {
    address: Address,
    quests: Vec<QuestState>,
    player_videos: Vec<PlayerVideoState>,
    reverts: BTreeSet<String>,
    /// Remaining transient failures per call label.
    unavailable: Mutex<BTreeMap<String, u32>>,
}

impl FixtureReader {
    /// Creates a reader for `address` serving `snapshot`.
    #[must_use]
    pub fn new(address: Address, snapshot: ChainSnapshot) -> Self {
        Self {
            address,
            quests: snapshot.quests,
            player_videos: snapshot.player_videos,
            reverts: snapshot.reverts,
            unavailable: Mutex::new(snapshot.unavailable),
        }
    }

    /// Adds or replaces a quest state at its `from_block`.
    #[must_use]
    pub fn with_quest(mut self, quest: QuestState) -> Self {
        self.quests.retain(|existing| {
            !(existing.quest_id == quest.quest_id && existing.from_block == quest.from_block)
        });
        self.quests.push(quest);
        self
    }

    /// Sets a player's metrics for a video from `from_block` on.
    pub fn set_player_metrics(
        &mut self,
        player: U256,
        video: VideoRef,
        from_block: u64,
        metrics: Engagement,
    ) {
        self.player_videos.retain(|state| {
            !(state.player == player && state.video == video && state.from_block == from_block)
        });
        self.player_videos.push(PlayerVideoState {
            player,
            video,
            from_block,
            metrics,
        });
    }

    /// Makes a call revert.
    #[must_use]
    pub fn with_revert(mut self, call: impl Into<String>) -> Self {
        self.reverts.insert(call.into());
        self
    }

    /// Makes a call fail `times` times before it succeeds.
    #[must_use]
    pub fn with_unavailable(self, call: impl Into<String>, times: u32) -> Self {
        self.unavailable.lock().insert(call.into(), times);
        self
    }

    fn call<T>(&self, label: String, value: impl FnOnce() -> T) -> ReadResult<T> {
        if self.reverts.contains(&label) {
            return Err(ReadError::Reverted { call: label });
        }
        if let Some(remaining) = self.unavailable.lock().get_mut(&label) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ReadError::Unavailable {
                    call: label,
                    reason: "fixture marked call unavailable".to_string(),
                });
            }
        }
        Ok(value())
    }

    fn quest(&self, block: u64, quest_id: U256) -> Option<&QuestState> {
        self.quests
            .iter()
            .filter(|quest| quest.quest_id == quest_id && quest.from_block <= block)
            .max_by_key(|quest| quest.from_block)
    }

    fn milestone(&self, block: u64, quest_id: U256, milestone: u64) -> Option<&MilestoneState> {
        let index = usize::try_from(milestone.checked_sub(1)?).ok()?;
        self.quest(block, quest_id)?.milestones.get(index)
    }

    fn gate(&self, block: u64, scope: GateScope) -> Option<&GateState> {
        match scope {
            GateScope::Quest(quest_id) => self.quest(block, quest_id).map(|quest| &quest.gate),
            GateScope::Milestone(quest_id, milestone) => {
                self.milestone(block, quest_id, milestone).map(|state| &state.gate)
            }
        }
    }

    fn reward(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> Option<&RewardState> {
        let index = usize::try_from(index).ok()?;
        self.milestone(block, quest_id, milestone)?.rewards.get(index)
    }

    fn criteria(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        video: VideoRef,
    ) -> Option<&Engagement> {
        self.milestone(block, quest_id, milestone)?
            .criteria
            .iter()
            .find(|entry| entry.video == video)
            .map(|entry| &entry.criteria)
    }

    fn player_video(&self, block: u64, player: U256, video: VideoRef) -> Option<&Engagement> {
        self.player_videos
            .iter()
            .filter(|state| state.player == player && state.video == video)
            .filter(|state| state.from_block <= block)
            .max_by_key(|state| state.from_block)
            .map(|state| &state.metrics)
    }
}

fn video_label(video: VideoRef) -> String {
    format!("{}-{}", video.profile_id, video.pub_id)
}

impl ChainReader for FixtureReader {
    fn contract(&self) -> Address {
        self.address
    }

    fn quest_uri(&self, block: u64, quest_id: U256) -> ReadResult<String> {
        self.call(format!("quest_uri({quest_id})"), || {
            self.quest(block, quest_id).map(|quest| quest.uri.clone()).unwrap_or_default()
        })
    }

    fn quest_max_player_count(&self, block: u64, quest_id: U256) -> ReadResult<U256> {
        self.call(format!("quest_max_player_count({quest_id})"), || {
            self.quest(block, quest_id).map(|quest| quest.max_player_count).unwrap_or_default()
        })
    }

    fn quest_profile_id(&self, block: u64, quest_id: U256) -> ReadResult<U256> {
        self.call(format!("quest_profile_id({quest_id})"), || {
            self.quest(block, quest_id).map(|quest| quest.profile_id).unwrap_or_default()
        })
    }

    fn quest_pub_id(&self, block: u64, quest_id: U256) -> ReadResult<U256> {
        self.call(format!("quest_pub_id({quest_id})"), || {
            self.quest(block, quest_id).map(|quest| quest.pub_id).unwrap_or_default()
        })
    }

    fn gated_erc20_addresses(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Address>> {
        self.call(format!("gated_erc20_addresses({scope})"), || {
            self.gate(block, scope)
                .map(|gate| gate.erc20_addresses.clone())
                .unwrap_or_default()
        })
    }

    fn gated_erc20_thresholds(&self, block: u64, scope: GateScope) -> ReadResult<Vec<U256>> {
        self.call(format!("gated_erc20_thresholds({scope})"), || {
            self.gate(block, scope)
                .map(|gate| gate.erc20_thresholds.clone())
                .unwrap_or_default()
        })
    }

    fn gated_erc721_addresses(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Address>> {
        self.call(format!("gated_erc721_addresses({scope})"), || {
            self.gate(block, scope)
                .map(|gate| gate.erc721_addresses.clone())
                .unwrap_or_default()
        })
    }

    fn gated_erc721_token_ids(&self, block: u64, scope: GateScope) -> ReadResult<Vec<Vec<U256>>> {
        self.call(format!("gated_erc721_token_ids({scope})"), || {
            self.gate(block, scope)
                .map(|gate| gate.erc721_token_ids.clone())
                .unwrap_or_default()
        })
    }

    fn gated_erc721_token_uris(
        &self,
        block: u64,
        scope: GateScope,
    ) -> ReadResult<Vec<Vec<String>>> {
        self.call(format!("gated_erc721_token_uris({scope})"), || {
            self.gate(block, scope)
                .map(|gate| gate.erc721_token_uris.clone())
                .unwrap_or_default()
        })
    }

    fn gated_one_of(&self, block: u64, scope: GateScope) -> ReadResult<bool> {
        self.call(format!("gated_one_of({scope})"), || {
            self.gate(block, scope).is_some_and(|gate| gate.one_of)
        })
    }

    fn milestone_uri(&self, block: u64, quest_id: U256, milestone: u64) -> ReadResult<String> {
        self.call(format!("milestone_uri({quest_id},{milestone})"), || {
            self.milestone(block, quest_id, milestone)
                .map(|state| state.uri.clone())
                .unwrap_or_default()
        })
    }

    fn milestone_video_length(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
    ) -> ReadResult<u64> {
        self.call(format!("milestone_video_length({quest_id},{milestone})"), || {
            self.milestone(block, quest_id, milestone)
                .map(|state| state.video_length.unwrap_or(state.videos.len() as u64))
                .unwrap_or_default()
        })
    }

    fn milestone_videos(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
    ) -> ReadResult<Vec<String>> {
        self.call(format!("milestone_videos({quest_id},{milestone})"), || {
            self.milestone(block, quest_id, milestone)
                .map(|state| state.videos.clone())
                .unwrap_or_default()
        })
    }

    fn milestone_rewards_length(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
    ) -> ReadResult<u64> {
        self.call(format!("milestone_rewards_length({quest_id},{milestone})"), || {
            self.milestone(block, quest_id, milestone)
                .map(|state| state.rewards.len() as u64)
                .unwrap_or_default()
        })
    }

    fn reward_kind(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<u8> {
        self.call(format!("reward_kind({quest_id},{milestone},{index})"), || {
            self.reward(block, quest_id, milestone, index)
                .map(|reward| reward.kind)
                .unwrap_or_default()
        })
    }

    fn reward_uri(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<String> {
        self.call(format!("reward_uri({quest_id},{milestone},{index})"), || {
            self.reward(block, quest_id, milestone, index)
                .map(|reward| reward.uri.clone())
                .unwrap_or_default()
        })
    }

    fn reward_token_address(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<Address> {
        self.call(format!("reward_token_address({quest_id},{milestone},{index})"), || {
            self.reward(block, quest_id, milestone, index)
                .map(|reward| reward.token_address)
                .unwrap_or_default()
        })
    }

    fn reward_amount(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        index: u64,
    ) -> ReadResult<U256> {
        self.call(format!("reward_amount({quest_id},{milestone},{index})"), || {
            self.reward(block, quest_id, milestone, index)
                .map(|reward| reward.amount)
                .unwrap_or_default()
        })
    }

    fn video_threshold(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        video: VideoRef,
        metric: EngagementMetric,
    ) -> ReadResult<U256> {
        let label = format!(
            "video_threshold({quest_id},{milestone},{},{})",
            video_label(video),
            metric.name()
        );
        self.call(label, || {
            self.criteria(block, quest_id, milestone, video)
                .map(|criteria| criteria.metric(metric))
                .unwrap_or_default()
        })
    }

    fn video_requirement(
        &self,
        block: u64,
        quest_id: U256,
        milestone: u64,
        video: VideoRef,
        flag: EngagementFlag,
    ) -> ReadResult<bool> {
        let label = format!(
            "video_requirement({quest_id},{milestone},{},{})",
            video_label(video),
            flag.name()
        );
        self.call(label, || {
            self.criteria(block, quest_id, milestone, video)
                .is_some_and(|criteria| criteria.flag(flag))
        })
    }

    fn player_video_metric(
        &self,
        block: u64,
        player: U256,
        video: VideoRef,
        metric: EngagementMetric,
    ) -> ReadResult<U256> {
        let label = format!(
            "player_video_metric({player},{},{})",
            video_label(video),
            metric.name()
        );
        self.call(label, || {
            self.player_video(block, player, video)
                .map(|metrics| metrics.metric(metric))
                .unwrap_or_default()
        })
    }

    fn player_video_flag(
        &self,
        block: u64,
        player: U256,
        video: VideoRef,
        flag: EngagementFlag,
    ) -> ReadResult<bool> {
        let label = format!(
            "player_video_flag({player},{},{})",
            video_label(video),
            flag.name()
        );
        self.call(label, || {
            self.player_video(block, player, video).is_some_and(|metrics| metrics.flag(flag))
        })
    }
}
