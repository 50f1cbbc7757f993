//! # Contract Definitions
//!
//! Event ABI of the Kinora quest contract, generated with alloy's `sol!`.

// The sol! macro generates code that we can't document, so allow missing_docs
#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    /// Events emitted by the Kinora quest data and metrics contracts.
    #[derive(Debug)]
    interface IKinoraQuest {
        /// A quest was created.
        event QuestInstantiated(uint256 indexed questId, uint256 milestoneCount);

        /// A player joined a quest.
        event PlayerJoinedQuest(uint256 indexed questId, uint256 indexed playerProfileId);

        /// A player's engagement metrics for a video were updated.
        event PlayerMetricsUpdated(
            uint256 indexed playerProfileId,
            uint256 videoPubId,
            uint256 videoProfileId
        );

        /// A player completed a milestone.
        event MilestoneCompleted(
            uint256 indexed questId,
            uint256 indexed playerProfileId,
            uint256 milestone
        );

        /// A player became eligible to claim a milestone.
        event PlayerEligibleToClaimMilestone(
            uint256 indexed questId,
            uint256 milestone,
            uint256 indexed playerProfileId
        );

        /// A player completed a quest.
        event QuestCompleted(uint256 indexed questId, uint256 indexed playerProfileId);

        /// A quest's status changed.
        event QuestStatusUpdated(uint256 indexed questId, uint8 status);
    }
}
