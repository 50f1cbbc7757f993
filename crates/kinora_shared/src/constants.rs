//! # Protocol Constants
//!
//! Values fixed by the Kinora contracts. Changing any of them changes the
//! entity graph produced from the same chain history.

/// Status code the quest contract emits for an active quest.
///
/// `QuestStatusUpdated` carries the contract's status enum as an integer;
/// every other value means the quest is inactive.
pub const QUEST_STATUS_ACTIVE: u8 = 0;

/// Milestone segment used in keys of quest-level entities.
///
/// Milestones are numbered from 1, so 0 never names a real milestone.
pub const QUEST_SCOPE_MILESTONE: u64 = 0;

/// Reward kind code for ERC20 payouts.
pub const REWARD_KIND_ERC20: u8 = 0;

/// Reward kind code for ERC721 payouts.
pub const REWARD_KIND_ERC721: u8 = 1;

/// URI scheme prefix for content-addressed documents.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Path segment gateways put in front of the content hash.
pub const IPFS_GATEWAY_SEGMENT: &str = "ipfs";
