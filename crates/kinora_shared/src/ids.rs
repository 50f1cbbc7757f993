//! # Identifier Builder
//!
//! Pure functions deriving the key of every entity the indexer writes.
//!
//! ## Key Format
//!
//! ```text
//! kind:questId:milestoneId:index:discriminator
//! ```
//!
//! Segments are colon-joined so variable-width numbers never run into each
//! other (`1` + `23` and `12` + `3` stay distinct). Quest-level entities use
//! milestone `0`. URIs are never part of a key: the same quest read back
//! with a different URI is still the same quest.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{IPFS_GATEWAY_SEGMENT, IPFS_SCHEME};

/// Errors raised while parsing identifiers received from the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// A composite video id is not `<profileHex>-<pubHex>`.
    #[error("malformed video id: {0:?}")]
    MalformedVideoId(String),
}

/// Key of a stored entity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Key of a quest.
    #[must_use]
    pub fn quest(quest_id: U256) -> Self {
        Self(format!("quest:{quest_id}"))
    }

    /// Key of a milestone within a quest.
    #[must_use]
    pub fn milestone(quest_id: U256, milestone: u64) -> Self {
        Self(format!("milestone:{quest_id}:{milestone}"))
    }

    /// Key of the gate owned by a quest (`milestone == 0`) or a milestone.
    #[must_use]
    pub fn gate(quest_id: U256, milestone: u64) -> Self {
        Self(format!("gate:{quest_id}:{milestone}"))
    }

    /// Key of one ERC20 gating condition.
    #[must_use]
    pub fn erc20_logic(quest_id: U256, milestone: u64, index: usize, token: Address) -> Self {
        Self(format!("erc20:{quest_id}:{milestone}:{index}:{token}"))
    }

    /// Key of one ERC721 gating condition.
    #[must_use]
    pub fn erc721_logic(quest_id: U256, milestone: u64, index: usize, token: Address) -> Self {
        Self(format!("erc721:{quest_id}:{milestone}:{index}:{token}"))
    }

    /// Key of a milestone video requirement.
    ///
    /// The raw composite id is kept as the discriminator so malformed ids
    /// still get a stable key.
    #[must_use]
    pub fn video(quest_id: U256, milestone: u64, index: usize, composite: &str) -> Self {
        Self(format!("video:{quest_id}:{milestone}:{index}:{composite}"))
    }

    /// Key of a milestone reward.
    #[must_use]
    pub fn reward(quest_id: U256, milestone: u64, index: u64) -> Self {
        Self(format!("reward:{quest_id}:{milestone}:{index}"))
    }

    /// Key of a player (a Lens profile).
    #[must_use]
    pub fn player(profile_id: U256) -> Self {
        Self(format!("player:{profile_id}"))
    }

    /// Key of the claim eligibility of a player for a milestone.
    #[must_use]
    pub fn eligible(quest_id: U256, milestone: u64, player: U256) -> Self {
        Self(format!("eligible:{quest_id}:{milestone}:{player}"))
    }

    /// Key of a milestone completion record.
    #[must_use]
    pub fn completion(quest_id: U256, milestone: u64, player: U256) -> Self {
        Self(format!("completion:{quest_id}:{milestone}:{player}"))
    }

    /// Key of a player's engagement snapshot for one video.
    #[must_use]
    pub fn video_activity(player: U256, video: &VideoRef) -> Self {
        Self(format!(
            "video-activity:{player}:{}:{}",
            video.pub_id, video.profile_id
        ))
    }

    /// Key of a hydrated metadata document: the content id itself.
    #[must_use]
    pub fn metadata(content: &ContentId) -> Self {
        Self(content.0.clone())
    }

    /// Key of a raw event record.
    #[must_use]
    pub fn event(transaction_hash: B256, log_index: u64) -> Self {
        Self(format!("event:{transaction_hash}:{log_index}"))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalized identifier of a content-addressed document.
///
/// `ipfs://<cid>/<path>` and `https://<gateway>/ipfs/<cid>/<path>` both
/// normalize to `<cid>/<path>`, so a document is activated and stored once
/// whichever form the contract returned. The CID stays part of the id:
/// `QmA/metadata.json` and `QmB/metadata.json` are different documents.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Extracts the content id from an IPFS or gateway URI.
    ///
    /// Query strings, fragments and empty segments are dropped. Returns
    /// `None` for URIs that do not point at IPFS content, for IPFS URIs
    /// with no CID, and for paths containing `.` or `..` segments.
    #[must_use]
    pub fn from_uri(raw: &str) -> Option<Self> {
        let uri = raw.trim();
        let (path, gateway) = match uri.strip_prefix(IPFS_SCHEME) {
            Some(rest) => (rest, false),
            None => {
                let (_, rest) = uri.split_once("://")?;
                let (_host, path) = rest.split_once('/')?;
                (path, true)
            }
        };

        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
        let start = if gateway {
            segments.iter().position(|segment| *segment == IPFS_GATEWAY_SEGMENT)? + 1
        } else {
            usize::from(segments.first() == Some(&IPFS_GATEWAY_SEGMENT))
        };

        let content = segments.get(start..)?;
        if content.is_empty() || content.iter().any(|segment| matches!(*segment, "." | "..")) {
            return None;
        }
        Some(Self(content.join("/")))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrites IPFS URIs to their content id and leaves other URIs untouched.
#[must_use]
pub fn normalize_uri(raw: &str) -> String {
    ContentId::from_uri(raw).map_or_else(|| raw.trim().to_string(), |content| content.0)
}

/// A Lens publication: the profile that posted it and its publication id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef {
    /// Profile that owns the publication.
    pub profile_id: U256,
    /// Publication id within the profile.
    pub pub_id: U256,
}

impl VideoRef {
    /// Creates a reference from its two ids.
    #[inline]
    #[must_use]
    pub const fn new(profile_id: U256, pub_id: U256) -> Self {
        Self { profile_id, pub_id }
    }

    /// Parses a composite `"<profileHex>-<pubHex>"` id.
    ///
    /// The `0x` prefix is optional on both halves.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::MalformedVideoId`] when the separator is missing or
    /// either half is not hexadecimal.
    pub fn parse(composite: &str) -> Result<Self, IdError> {
        let malformed = || IdError::MalformedVideoId(composite.to_string());
        let (profile, publication) = composite.trim().split_once('-').ok_or_else(malformed)?;
        let profile_id = parse_hex(profile).ok_or_else(malformed)?;
        let pub_id = parse_hex(publication).ok_or_else(malformed)?;
        Ok(Self { profile_id, pub_id })
    }
}

fn parse_hex(part: &str) -> Option<U256> {
    let digits = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
        .unwrap_or(part);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    U256::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_do_not_collide_across_digit_boundaries() {
        let a = EntityId::milestone(U256::from(1), 23);
        let b = EntityId::milestone(U256::from(12), 3);
        assert_ne!(a, b);

        let quest_gate = EntityId::gate(U256::from(5), 0);
        let milestone_gate = EntityId::gate(U256::from(5), 1);
        assert_ne!(quest_gate, milestone_gate);
    }

    #[test]
    fn test_keys_are_stable() {
        assert_eq!(EntityId::quest(U256::from(5)).as_str(), "quest:5");
        assert_eq!(EntityId::reward(U256::from(5), 2, 0).as_str(), "reward:5:2:0");
        assert_eq!(
            EntityId::video_activity(U256::from(9), &VideoRef::new(U256::from(1), U256::from(10))).as_str(),
            "video-activity:9:10:1"
        );
        assert_eq!(
            EntityId::quest(U256::from(5)),
            EntityId::quest(U256::from(5))
        );
    }

    #[test]
    fn test_ipfs_and_gateway_uris_normalize_to_same_id() {
        let direct = ContentId::from_uri("ipfs://bafybeigdyrzt5").unwrap();
        let gateway = ContentId::from_uri("https://gw.example/ipfs/bafybeigdyrzt5").unwrap();
        assert_eq!(direct, gateway);
        assert_eq!(direct.as_str(), "bafybeigdyrzt5");
    }

    #[test]
    fn test_cid_and_sub_path_are_kept() {
        assert_eq!(normalize_uri("ipfs://Qm1"), "Qm1");
        assert_eq!(normalize_uri("ipfs://ipfs/Qm1/"), "Qm1");
        assert_eq!(normalize_uri("https://gw.example/ipfs/Qm1?filename=a"), "Qm1");
        assert_eq!(
            normalize_uri("https://gw.example/ipfs/QmA/meta//quest.json#top"),
            "QmA/meta/quest.json"
        );
    }

    #[test]
    fn test_same_file_name_under_different_cids_stays_distinct() {
        let a = ContentId::from_uri("ipfs://QmA/metadata.json").unwrap();
        let b = ContentId::from_uri("ipfs://QmB/metadata.json").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "QmA/metadata.json");
        assert_eq!(
            ContentId::from_uri("https://gw.example/ipfs/QmA/metadata.json").unwrap(),
            a
        );
    }

    #[test]
    fn test_gateway_marker_is_a_whole_segment() {
        assert_eq!(normalize_uri("https://gw.example/myipfs/ipfs/Qm1"), "Qm1");
        assert_eq!(normalize_uri("https://gw.example/v1/ipfs/Qm1/a.json"), "Qm1/a.json");
        assert!(ContentId::from_uri("https://gw.example/myipfs/Qm1").is_none());
        assert!(ContentId::from_uri("https://gw.example/ipfs/").is_none());
    }

    #[test]
    fn test_non_ipfs_uris_are_not_resolvable() {
        assert!(ContentId::from_uri("https://example.com/quest.json").is_none());
        assert!(ContentId::from_uri("").is_none());
        assert!(ContentId::from_uri("ipfs://").is_none());
        assert!(ContentId::from_uri("ipfs://ipfs/").is_none());
        assert!(ContentId::from_uri("ipfs://QmA/../QmB").is_none());
        assert_eq!(
            normalize_uri("https://example.com/quest.json"),
            "https://example.com/quest.json"
        );
    }

    #[test]
    fn test_video_ref_parse() {
        let video = VideoRef::parse("0x01-0x0a").unwrap();
        assert_eq!(video.profile_id, U256::from(1));
        assert_eq!(video.pub_id, U256::from(10));

        let bare = VideoRef::parse("ff-1").unwrap();
        assert_eq!(bare.profile_id, U256::from(255));
    }

    #[test]
    fn test_video_ref_rejects_malformed() {
        assert!(VideoRef::parse("0x01").is_err());
        assert!(VideoRef::parse("0x-0x02").is_err());
        assert!(VideoRef::parse("0x0_1-0x02").is_err());
        assert!(VideoRef::parse("0x01-+2").is_err());
        assert_eq!(
            VideoRef::parse("zz-01"),
            Err(IdError::MalformedVideoId("zz-01".to_string()))
        );
    }
}
