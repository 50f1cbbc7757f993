//! Decoded quest contract events.
//!
//! The indexer never sees raw logs past its decoder: handlers receive an
//! [`EventEnvelope`] carrying one of these events plus the position of the
//! log on chain.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

/// Events emitted by the Kinora quest contracts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "params")]
pub enum QuestEvent {
    /// A quest was created with `milestone_count` milestones.
    QuestInstantiated {
        /// Quest id.
        quest_id: U256,
        /// Number of milestones, numbered from 1.
        milestone_count: u64,
    },
    /// A player joined a quest.
    PlayerJoinedQuest {
        /// Quest id.
        quest_id: U256,
        /// Lens profile of the player.
        player_profile_id: U256,
    },
    /// A player's engagement with a video changed.
    PlayerMetricsUpdated {
        /// Lens profile of the player.
        player_profile_id: U256,
        /// Publication id of the video.
        video_pub_id: U256,
        /// Profile that posted the video.
        video_profile_id: U256,
    },
    /// A player completed a milestone.
    MilestoneCompleted {
        /// Quest id.
        quest_id: U256,
        /// Lens profile of the player.
        player_profile_id: U256,
        /// Milestone number.
        milestone: u64,
    },
    /// A player became eligible to claim a milestone's rewards.
    PlayerEligibleToClaimMilestone {
        /// Quest id.
        quest_id: U256,
        /// Milestone number.
        milestone: u64,
        /// Lens profile of the player.
        player_profile_id: U256,
    },
    /// A player completed every milestone of a quest.
    QuestCompleted {
        /// Quest id.
        quest_id: U256,
        /// Lens profile of the player.
        player_profile_id: U256,
    },
    /// A quest's status changed.
    QuestStatusUpdated {
        /// Quest id.
        quest_id: U256,
        /// Raw status code; see [`crate::QUEST_STATUS_ACTIVE`].
        status: u8,
    },
}

impl QuestEvent {
    /// Event name as declared in the contract.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::QuestInstantiated { .. } => "QuestInstantiated",
            Self::PlayerJoinedQuest { .. } => "PlayerJoinedQuest",
            Self::PlayerMetricsUpdated { .. } => "PlayerMetricsUpdated",
            Self::MilestoneCompleted { .. } => "MilestoneCompleted",
            Self::PlayerEligibleToClaimMilestone { .. } => "PlayerEligibleToClaimMilestone",
            Self::QuestCompleted { .. } => "QuestCompleted",
            Self::QuestStatusUpdated { .. } => "QuestStatusUpdated",
        }
    }
}

/// One decoded log plus its position on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Transaction that emitted the log.
    pub transaction_hash: B256,
    /// Index of the log within its block.
    pub log_index: u64,
    /// Block the log was included in.
    pub block_number: u64,
    /// Timestamp of that block (seconds).
    pub block_timestamp: u64,
    /// The decoded event.
    pub event: QuestEvent,
}

impl EventEnvelope {
    /// Key of the raw event record for this log.
    #[inline]
    #[must_use]
    pub fn record_id(&self) -> EntityId {
        EntityId::event(self.transaction_hash, self.log_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_json_shape() {
        let json = r#"{
            "transaction_hash": "0x0101010101010101010101010101010101010101010101010101010101010101",
            "log_index": 3,
            "block_number": 100,
            "block_timestamp": 1700000000,
            "event": { "event": "QuestStatusUpdated", "params": { "quest_id": "0x5", "status": 1 } }
        }"#;

        let envelope: EventEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.log_index, 3);
        assert_eq!(
            envelope.event,
            QuestEvent::QuestStatusUpdated { quest_id: U256::from(5), status: 1 }
        );
        assert_eq!(envelope.event.name(), "QuestStatusUpdated");
    }

    #[test]
    fn test_record_id_depends_on_log_position() {
        let envelope = EventEnvelope {
            transaction_hash: B256::repeat_byte(1),
            log_index: 0,
            block_number: 1,
            block_timestamp: 1,
            event: QuestEvent::QuestCompleted {
                quest_id: U256::from(1),
                player_profile_id: U256::from(2),
            },
        };
        let mut next = envelope.clone();
        next.log_index = 1;
        assert_ne!(envelope.record_id(), next.record_id());
    }
}
