//! Quest creation and status.

use alloy_primitives::U256;
use kinora_shared::{
    normalize_uri, push_unique, ContentId, Engagement, EngagementFlag, EngagementMetric, EntityId,
    Milestone, Quest, Reward, RewardKind, Video, VideoRef, QUEST_STATUS_ACTIVE,
};
use tracing::{debug, info, warn};

use super::gate::build_gate;
use crate::error::IndexResult;
use crate::reader::{ChainReader, GateScope, ReadResult};
use crate::staging::StagedWrites;
use crate::store::{EntityStore, EntityStoreExt};

/// Normalized URI plus metadata reference, activating the template when
/// the URI resolves. An empty URI yields neither.
fn resolve_uri<S: EntityStore + ?Sized>(
    tx: &mut StagedWrites<'_, S>,
    raw: &str,
) -> (Option<String>, Option<EntityId>) {
    if raw.trim().is_empty() {
        return (None, None);
    }
    let metadata = ContentId::from_uri(raw).map(|content| {
        let id = EntityId::metadata(&content);
        tx.activate(content);
        id
    });
    (Some(normalize_uri(raw)), metadata)
}

pub(super) fn quest_instantiated<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    block: u64,
    quest_id: U256,
    milestone_count: u64,
) -> IndexResult<()>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    let uri = reader.quest_uri(block, quest_id)?;
    let max_player_count = reader.quest_max_player_count(block, quest_id)?;
    let profile_id = reader.quest_profile_id(block, quest_id)?;
    let pub_id = reader.quest_pub_id(block, quest_id)?;
    let gate = build_gate(tx, reader, block, GateScope::Quest(quest_id))?;

    let mut milestones = Vec::new();
    for milestone in 1..=milestone_count {
        let id = build_milestone(tx, reader, block, quest_id, milestone)?;
        push_unique(&mut milestones, id);
    }

    let (uri, quest_metadata) = resolve_uri(tx, &uri);

    // Players may have joined before the quest was seen.
    let mut quest = tx.get_or_create(&EntityId::quest(quest_id), || Quest::new(quest_id));
    quest.milestone_count = Some(milestone_count);
    quest.max_player_count = Some(max_player_count);
    quest.profile_id = Some(profile_id);
    quest.pub_id = Some(pub_id);
    quest.uri = uri;
    quest.quest_metadata = quest_metadata;
    quest.gate = Some(gate);
    if quest.status.is_none() {
        quest.status = Some(true);
    }
    quest.milestones = milestones;
    tx.save_record(quest);

    info!(
        quest = %quest_id,
        milestones = milestone_count,
        writes = tx.pending_writes(),
        "quest instantiated"
    );
    Ok(())
}

fn build_milestone<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    block: u64,
    quest_id: U256,
    milestone_id: u64,
) -> IndexResult<EntityId>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    let uri = reader.milestone_uri(block, quest_id, milestone_id)?;
    let gated = build_gate(tx, reader, block, GateScope::Milestone(quest_id, milestone_id))?;
    let video_length = reader.milestone_video_length(block, quest_id, milestone_id)?;
    let composites = reader.milestone_videos(block, quest_id, milestone_id)?;
    let rewards_length = reader.milestone_rewards_length(block, quest_id, milestone_id)?;

    let mut milestone = Milestone::new(quest_id, milestone_id);
    for (index, composite) in composites.iter().enumerate() {
        let video = build_video(tx, reader, block, quest_id, milestone_id, index, composite)?;
        push_unique(&mut milestone.videos, video);
    }
    for index in 0..rewards_length {
        let reward = build_reward(tx, reader, block, quest_id, milestone_id, index)?;
        push_unique(&mut milestone.rewards, reward);
    }

    let (uri, milestone_metadata) = resolve_uri(tx, &uri);
    milestone.uri = uri;
    milestone.milestone_metadata = milestone_metadata;
    milestone.gated = Some(gated);
    milestone.video_length = Some(video_length);
    milestone.rewards_length = Some(rewards_length);

    let id = milestone.id.clone();
    tx.save_record(milestone);
    Ok(id)
}

fn build_video<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    block: u64,
    quest_id: U256,
    milestone_id: u64,
    index: usize,
    composite: &str,
) -> IndexResult<EntityId>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    let mut video = Video {
        id: EntityId::video(quest_id, milestone_id, index, composite),
        composite_id: composite.to_string(),
        quest_id,
        milestone_id,
        profile_id: None,
        pub_id: None,
        criteria: None,
    };

    match VideoRef::parse(composite) {
        Ok(video_ref) => {
            video.profile_id = Some(video_ref.profile_id);
            video.pub_id = Some(video_ref.pub_id);
            let criteria = read_criteria(reader, block, quest_id, milestone_id, video_ref)?;
            video.criteria = Some(criteria);
        }
        Err(err) => warn!(
            quest = %quest_id,
            milestone = milestone_id,
            error = %err,
            "video stored without criteria"
        ),
    }

    let id = video.id.clone();
    tx.save_record(video);
    Ok(id)
}

fn read_criteria<R: ChainReader + ?Sized>(
    reader: &R,
    block: u64,
    quest_id: U256,
    milestone_id: u64,
    video: VideoRef,
) -> ReadResult<Engagement> {
    let mut criteria = Engagement::default();
    for metric in EngagementMetric::ALL {
        let threshold = reader.video_threshold(block, quest_id, milestone_id, video, metric)?;
        criteria.set_metric(metric, threshold);
    }
    for flag in EngagementFlag::ALL {
        let required = reader.video_requirement(block, quest_id, milestone_id, video, flag)?;
        criteria.set_flag(flag, required);
    }
    Ok(criteria)
}

fn build_reward<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    block: u64,
    quest_id: U256,
    milestone_id: u64,
    index: u64,
) -> IndexResult<EntityId>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    let kind = reader.reward_kind(block, quest_id, milestone_id, index)?;
    let uri = reader.reward_uri(block, quest_id, milestone_id, index)?;
    let token_address = reader.reward_token_address(block, quest_id, milestone_id, index)?;
    let amount = reader.reward_amount(block, quest_id, milestone_id, index)?;
    let (uri, reward_metadata) = resolve_uri(tx, &uri);

    let reward = Reward {
        id: EntityId::reward(quest_id, milestone_id, index),
        quest_id,
        milestone_id,
        index,
        kind: Some(RewardKind::from(kind)),
        amount: Some(amount),
        token_address: Some(token_address),
        uri,
        reward_metadata,
    };
    let id = reward.id.clone();
    tx.save_record(reward);
    Ok(id)
}

pub(super) fn quest_status_updated<S: EntityStore + ?Sized>(
    tx: &mut StagedWrites<'_, S>,
    quest_id: U256,
    status: u8,
) {
    let updated = tx.update_if_present::<Quest>(&EntityId::quest(quest_id), |quest| {
        quest.status = Some(status == QUEST_STATUS_ACTIVE);
    });
    if !updated {
        debug!(quest = %quest_id, status, "status update for unknown quest skipped");
    }
}
