//! Player progress: joins, engagement, milestone completion and claims.

use alloy_primitives::U256;
use kinora_shared::{
    push_unique, CompletionActivity, Eligible, Engagement, EngagementFlag, EngagementMetric,
    EntityId, Player, Quest, VideoActivity, VideoRef,
};
use tracing::debug;

use super::BlockContext;
use crate::error::IndexResult;
use crate::reader::ChainReader;
use crate::staging::StagedWrites;
use crate::store::{EntityStore, EntityStoreExt};

pub(super) fn player_joined_quest<S: EntityStore + ?Sized>(
    tx: &mut StagedWrites<'_, S>,
    quest_id: U256,
    profile_id: U256,
) {
    let player_id = EntityId::player(profile_id);
    let mut player = tx.get_or_create(&player_id, || Player::new(profile_id));
    push_unique(&mut player.quests_joined, quest_id);
    tx.save_record(player);

    let joined = tx.update_if_present::<Quest>(&EntityId::quest(quest_id), |quest| {
        push_unique(&mut quest.players, player_id);
    });
    if !joined {
        debug!(quest = %quest_id, player = %profile_id, "join recorded before quest exists");
    }
}

pub(super) fn player_metrics_updated<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    block: BlockContext,
    profile_id: U256,
    video_pub_id: U256,
    video_profile_id: U256,
) -> IndexResult<()>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    let player_id = EntityId::player(profile_id);
    let Some(mut player) = tx.load_as::<Player>(&player_id) else {
        debug!(player = %profile_id, "metrics update for unknown player skipped");
        return Ok(());
    };

    let video = VideoRef::new(video_profile_id, video_pub_id);
    let mut metrics = Engagement::default();
    for metric in EngagementMetric::ALL {
        let value = reader.player_video_metric(block.number, profile_id, video, metric)?;
        metrics.set_metric(metric, value);
    }
    for flag in EngagementFlag::ALL {
        let value = reader.player_video_flag(block.number, profile_id, video, flag)?;
        metrics.set_flag(flag, value);
    }

    let activity = VideoActivity {
        id: EntityId::video_activity(profile_id, &video),
        player: profile_id,
        video_profile_id,
        video_pub_id,
        metrics,
        block_number: block.number,
    };
    push_unique(&mut player.videos, activity.id.clone());
    tx.save_record(activity);
    tx.save_record(player);
    Ok(())
}

pub(super) fn milestone_completed<S: EntityStore + ?Sized>(
    tx: &mut StagedWrites<'_, S>,
    block: BlockContext,
    quest_id: U256,
    milestone: u64,
    profile_id: U256,
) {
    tx.save_record(Eligible::new(quest_id, milestone, profile_id, false));

    let completion = CompletionActivity {
        id: EntityId::completion(quest_id, milestone, profile_id),
        quest_id,
        milestone,
        player: profile_id,
        block_number: block.number,
        block_timestamp: block.timestamp,
    };
    let completion_id = completion.id.clone();
    tx.save_record(completion);

    let appended = tx.update_if_present::<Player>(&EntityId::player(profile_id), |player| {
        push_unique(&mut player.milestones_completed, completion_id);
    });
    if !appended {
        debug!(quest = %quest_id, milestone, player = %profile_id, "completion for unknown player");
    }
}

pub(super) fn player_eligible_to_claim<S: EntityStore + ?Sized>(
    tx: &mut StagedWrites<'_, S>,
    quest_id: U256,
    milestone: u64,
    profile_id: U256,
) {
    let eligible = Eligible::new(quest_id, milestone, profile_id, true);
    let eligible_id = eligible.id.clone();
    tx.save_record(eligible);

    let appended = tx.update_if_present::<Player>(&EntityId::player(profile_id), |player| {
        push_unique(&mut player.eligible, eligible_id);
    });
    if !appended {
        debug!(quest = %quest_id, milestone, player = %profile_id, "eligibility for unknown player");
    }
}

pub(super) fn quest_completed<S: EntityStore + ?Sized>(
    tx: &mut StagedWrites<'_, S>,
    quest_id: U256,
    profile_id: U256,
) {
    let appended = tx.update_if_present::<Player>(&EntityId::player(profile_id), |player| {
        push_unique(&mut player.quests_completed, quest_id);
    });
    if !appended {
        debug!(quest = %quest_id, player = %profile_id, "quest completion for unknown player skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{ChainSnapshot, FixtureReader};
    use crate::store::MemoryStore;
    use alloy_primitives::Address;

    const BLOCK: BlockContext = BlockContext {
        number: 42,
        timestamp: 1_700_000_000,
    };

    fn player(tx: &StagedWrites<'_, MemoryStore>, profile_id: u64) -> Player {
        tx.load_as::<Player>(&EntityId::player(U256::from(profile_id))).unwrap()
    }

    #[test]
    fn test_join_creates_player_and_skips_missing_quest() {
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);
        player_joined_quest(&mut tx, U256::from(5), U256::from(9));
        player_joined_quest(&mut tx, U256::from(5), U256::from(9));

        assert_eq!(player(&tx, 9).quests_joined, vec![U256::from(5)]);
        assert!(tx.load_as::<Quest>(&EntityId::quest(U256::from(5))).is_none());
    }

    #[test]
    fn test_join_links_existing_quest() {
        let mut store = MemoryStore::new();
        store.save_record(Quest::new(U256::from(5)));
        let mut tx = StagedWrites::new(&store);
        player_joined_quest(&mut tx, U256::from(5), U256::from(9));

        let quest = tx.load_as::<Quest>(&EntityId::quest(U256::from(5))).unwrap();
        assert_eq!(quest.players, vec![EntityId::player(U256::from(9))]);
    }

    #[test]
    fn test_metrics_update_overwrites_snapshot() {
        let video = VideoRef::new(U256::from(1), U256::from(10));
        let mut reader = FixtureReader::new(Address::ZERO, ChainSnapshot::default());
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);
        player_joined_quest(&mut tx, U256::from(5), U256::from(9));

        for plays in [3u64, 7] {
            reader.set_player_metrics(
                U256::from(9),
                video,
                0,
                Engagement {
                    play_count: U256::from(plays),
                    mirror: true,
                    ..Engagement::default()
                },
            );
            player_metrics_updated(&mut tx, &reader, BLOCK, U256::from(9), U256::from(10), U256::from(1))
                .unwrap();
        }

        let activity = tx
            .load_as::<VideoActivity>(&EntityId::video_activity(U256::from(9), &video))
            .unwrap();
        assert_eq!(activity.metrics.play_count, U256::from(7));
        assert!(activity.metrics.mirror);
        assert_eq!(player(&tx, 9).videos.len(), 1);
    }

    #[test]
    fn test_metrics_update_for_unknown_player_reads_nothing() {
        let reader = FixtureReader::new(Address::ZERO, ChainSnapshot::default())
            .with_revert("player_video_metric(9,1-10,play_count)");
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);

        player_metrics_updated(&mut tx, &reader, BLOCK, U256::from(9), U256::from(10), U256::from(1))
            .unwrap();
        assert_eq!(tx.pending_writes(), 0);
    }

    #[test]
    fn test_completion_is_written_without_player() {
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);
        milestone_completed(&mut tx, BLOCK, U256::from(5), 1, U256::from(9));

        let eligible = tx
            .load_as::<Eligible>(&EntityId::eligible(U256::from(5), 1, U256::from(9)))
            .unwrap();
        assert!(!eligible.status);
        let completion = tx
            .load_as::<CompletionActivity>(&EntityId::completion(U256::from(5), 1, U256::from(9)))
            .unwrap();
        assert_eq!(completion.block_number, 42);
    }

    #[test]
    fn test_eligibility_last_writer_wins() {
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);
        player_joined_quest(&mut tx, U256::from(5), U256::from(9));
        let id = EntityId::eligible(U256::from(5), 1, U256::from(9));

        player_eligible_to_claim(&mut tx, U256::from(5), 1, U256::from(9));
        milestone_completed(&mut tx, BLOCK, U256::from(5), 1, U256::from(9));
        assert!(!tx.load_as::<Eligible>(&id).unwrap().status);

        player_eligible_to_claim(&mut tx, U256::from(5), 1, U256::from(9));
        assert!(tx.load_as::<Eligible>(&id).unwrap().status);

        let player = player(&tx, 9);
        assert_eq!(player.eligible, vec![id]);
        assert_eq!(player.milestones_completed.len(), 1);
    }

    #[test]
    fn test_quest_completed_appends_once() {
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);
        quest_completed(&mut tx, U256::from(5), U256::from(9));
        assert_eq!(tx.pending_writes(), 0);

        player_joined_quest(&mut tx, U256::from(5), U256::from(9));
        quest_completed(&mut tx, U256::from(5), U256::from(9));
        quest_completed(&mut tx, U256::from(5), U256::from(9));
        assert_eq!(player(&tx, 9).quests_completed, vec![U256::from(5)]);
    }
}
