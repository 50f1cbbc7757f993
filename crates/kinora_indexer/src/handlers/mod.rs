//! # Event Handlers
//!
//! One handler per contract event. Every handler writes through a
//! [`StagedWrites`] overlay and never touches the real store.
//!
//! ## Missing Parents
//!
//! Events may arrive before the event that creates the entity they refer
//! to (a player joins a quest the indexer has not seen yet). Handlers skip
//! the relationship update in that case and log it at `debug`; it is never
//! an error.

mod gate;
mod player;
mod quest;

pub use gate::build_gate;

use kinora_shared::{EventEnvelope, EventRecord, QuestEvent};

use crate::error::IndexResult;
use crate::reader::ChainReader;
use crate::staging::StagedWrites;
use crate::store::{EntityStore, EntityStoreExt};

/// Block position of the event being handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockContext {
    pub number: u64,
    pub timestamp: u64,
}

/// Records the raw event and runs its handler.
///
/// # Errors
///
/// Returns an [`IndexError`](crate::IndexError) if an enrichment read
/// failed. The overlay must then be discarded.
pub fn dispatch<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    envelope: &EventEnvelope,
) -> IndexResult<()>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    tx.save_record(EventRecord::from(envelope));

    let block = BlockContext {
        number: envelope.block_number,
        timestamp: envelope.block_timestamp,
    };

    match envelope.event {
        QuestEvent::QuestInstantiated {
            quest_id,
            milestone_count,
        } => quest::quest_instantiated(tx, reader, block.number, quest_id, milestone_count),
        QuestEvent::QuestStatusUpdated { quest_id, status } => {
            quest::quest_status_updated(tx, quest_id, status);
            Ok(())
        }
        QuestEvent::PlayerJoinedQuest {
            quest_id,
            player_profile_id,
        } => {
            player::player_joined_quest(tx, quest_id, player_profile_id);
            Ok(())
        }
        QuestEvent::PlayerMetricsUpdated {
            player_profile_id,
            video_pub_id,
            video_profile_id,
        } => player::player_metrics_updated(
            tx,
            reader,
            block,
            player_profile_id,
            video_pub_id,
            video_profile_id,
        ),
        QuestEvent::MilestoneCompleted {
            quest_id,
            player_profile_id,
            milestone,
        } => {
            player::milestone_completed(tx, block, quest_id, milestone, player_profile_id);
            Ok(())
        }
        QuestEvent::PlayerEligibleToClaimMilestone {
            quest_id,
            milestone,
            player_profile_id,
        } => {
            player::player_eligible_to_claim(tx, quest_id, milestone, player_profile_id);
            Ok(())
        }
        QuestEvent::QuestCompleted {
            quest_id,
            player_profile_id,
        } => {
            player::quest_completed(tx, quest_id, player_profile_id);
            Ok(())
        }
    }
}
