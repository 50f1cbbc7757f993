//! # Log Decoding
//!
//! Turns raw contract logs into [`QuestEvent`]s. The signature topic picks
//! the event; alloy validates and decodes the rest.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use kinora_shared::{EventEnvelope, QuestEvent};
use thiserror::Error;

use crate::contracts::IKinoraQuest;

/// Errors raised while decoding a raw log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The log carries no signature topic.
    #[error("log has no topics")]
    NoTopics,

    /// The signature topic is not a quest contract event.
    #[error("unknown event signature {0}")]
    UnknownSignature(B256),

    /// Topics or data do not match the event ABI.
    #[error("malformed {event} log: {reason}")]
    Malformed {
        /// Event signature.
        event: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// A milestone number does not fit in 64 bits.
    #[error("{field} of {event} does not fit in 64 bits")]
    Overflow {
        /// Event signature.
        event: &'static str,
        /// Parameter name.
        field: &'static str,
    },
}

/// Result type for log decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A raw log as delivered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, signature first.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed parameters.
    pub data: Vec<u8>,
    /// Transaction that emitted the log.
    pub transaction_hash: B256,
    /// Index of the log within its block.
    pub log_index: u64,
    /// Block number.
    pub block_number: u64,
    /// Block timestamp.
    pub block_timestamp: u64,
}

impl RawLog {
    /// Decodes the log into an envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the log is not a valid quest event.
    pub fn decode(&self) -> DecodeResult<EventEnvelope> {
        Ok(EventEnvelope {
            transaction_hash: self.transaction_hash,
            log_index: self.log_index,
            block_number: self.block_number,
            block_timestamp: self.block_timestamp,
            event: LogDecoder::decode(&self.topics, &self.data)?,
        })
    }
}

/// Decoder for quest contract logs.
pub struct LogDecoder;

impl LogDecoder {
    /// Decodes topics and data into a quest event.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] for unknown signatures and malformed logs.
    pub fn decode(topics: &[B256], data: &[u8]) -> DecodeResult<QuestEvent> {
        use IKinoraQuest::{
            MilestoneCompleted, PlayerEligibleToClaimMilestone, PlayerJoinedQuest,
            PlayerMetricsUpdated, QuestCompleted, QuestInstantiated, QuestStatusUpdated,
        };

        let signature = *topics.first().ok_or(DecodeError::NoTopics)?;

        if signature == QuestInstantiated::SIGNATURE_HASH {
            let log = decode_as::<QuestInstantiated>(topics, data)?;
            return Ok(QuestEvent::QuestInstantiated {
                quest_id: log.questId,
                milestone_count: narrow::<QuestInstantiated>(log.milestoneCount, "milestoneCount")?,
            });
        }
        if signature == PlayerJoinedQuest::SIGNATURE_HASH {
            let log = decode_as::<PlayerJoinedQuest>(topics, data)?;
            return Ok(QuestEvent::PlayerJoinedQuest {
                quest_id: log.questId,
                player_profile_id: log.playerProfileId,
            });
        }
        if signature == PlayerMetricsUpdated::SIGNATURE_HASH {
            let log = decode_as::<PlayerMetricsUpdated>(topics, data)?;
            return Ok(QuestEvent::PlayerMetricsUpdated {
                player_profile_id: log.playerProfileId,
                video_pub_id: log.videoPubId,
                video_profile_id: log.videoProfileId,
            });
        }
        if signature == MilestoneCompleted::SIGNATURE_HASH {
            let log = decode_as::<MilestoneCompleted>(topics, data)?;
            return Ok(QuestEvent::MilestoneCompleted {
                quest_id: log.questId,
                player_profile_id: log.playerProfileId,
                milestone: narrow::<MilestoneCompleted>(log.milestone, "milestone")?,
            });
        }
        if signature == PlayerEligibleToClaimMilestone::SIGNATURE_HASH {
            let log = decode_as::<PlayerEligibleToClaimMilestone>(topics, data)?;
            return Ok(QuestEvent::PlayerEligibleToClaimMilestone {
                quest_id: log.questId,
                milestone: narrow::<PlayerEligibleToClaimMilestone>(log.milestone, "milestone")?,
                player_profile_id: log.playerProfileId,
            });
        }
        if signature == QuestCompleted::SIGNATURE_HASH {
            let log = decode_as::<QuestCompleted>(topics, data)?;
            return Ok(QuestEvent::QuestCompleted {
                quest_id: log.questId,
                player_profile_id: log.playerProfileId,
            });
        }
        if signature == QuestStatusUpdated::SIGNATURE_HASH {
            let log = decode_as::<QuestStatusUpdated>(topics, data)?;
            return Ok(QuestEvent::QuestStatusUpdated {
                quest_id: log.questId,
                status: log.status,
            });
        }

        Err(DecodeError::UnknownSignature(signature))
    }
}

fn decode_as<E: SolEvent>(topics: &[B256], data: &[u8]) -> DecodeResult<E> {
    E::decode_raw_log(topics.iter().copied(), data, true).map_err(|err| DecodeError::Malformed {
        event: E::SIGNATURE,
        reason: err.to_string(),
    })
}

fn narrow<E: SolEvent>(value: U256, field: &'static str) -> DecodeResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(DecodeError::Overflow {
            event: E::SIGNATURE,
            field,
        });
    }
    Ok(value.as_limbs()[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<E: SolEvent>(event: &E) -> (Vec<B256>, Vec<u8>) {
        let topics = event.encode_topics().into_iter().map(|topic| topic.0).collect();
        (topics, event.encode_data())
    }

    #[test]
    fn test_decode_quest_instantiated() {
        let (topics, data) = encode(&IKinoraQuest::QuestInstantiated {
            questId: U256::from(5),
            milestoneCount: U256::from(2),
        });

        let event = LogDecoder::decode(&topics, &data).unwrap();
        assert_eq!(
            event,
            QuestEvent::QuestInstantiated {
                quest_id: U256::from(5),
                milestone_count: 2,
            }
        );
    }

    #[test]
    fn test_decode_player_events() {
        let (topics, data) = encode(&IKinoraQuest::PlayerEligibleToClaimMilestone {
            questId: U256::from(5),
            milestone: U256::from(1),
            playerProfileId: U256::from(77),
        });
        assert_eq!(
            LogDecoder::decode(&topics, &data).unwrap(),
            QuestEvent::PlayerEligibleToClaimMilestone {
                quest_id: U256::from(5),
                milestone: 1,
                player_profile_id: U256::from(77),
            }
        );

        let (topics, data) = encode(&IKinoraQuest::QuestStatusUpdated {
            questId: U256::from(5),
            status: 1,
        });
        assert_eq!(
            LogDecoder::decode(&topics, &data).unwrap(),
            QuestEvent::QuestStatusUpdated {
                quest_id: U256::from(5),
                status: 1,
            }
        );
    }

    #[test]
    fn test_decode_join_and_metrics() {
        let (topics, data) = encode(&IKinoraQuest::PlayerJoinedQuest {
            questId: U256::from(5),
            playerProfileId: U256::from(9),
        });
        assert_eq!(
            LogDecoder::decode(&topics, &data).unwrap(),
            QuestEvent::PlayerJoinedQuest {
                quest_id: U256::from(5),
                player_profile_id: U256::from(9),
            }
        );

        let (topics, data) = encode(&IKinoraQuest::PlayerMetricsUpdated {
            playerProfileId: U256::from(9),
            videoPubId: U256::from(10),
            videoProfileId: U256::from(1),
        });
        assert_eq!(
            LogDecoder::decode(&topics, &data).unwrap(),
            QuestEvent::PlayerMetricsUpdated {
                player_profile_id: U256::from(9),
                video_pub_id: U256::from(10),
                video_profile_id: U256::from(1),
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_and_empty() {
        assert_eq!(LogDecoder::decode(&[], &[]), Err(DecodeError::NoTopics));

        let unknown = B256::repeat_byte(0xAB);
        assert_eq!(
            LogDecoder::decode(&[unknown], &[]),
            Err(DecodeError::UnknownSignature(unknown))
        );
    }

    #[test]
    fn test_decode_rejects_oversized_milestone() {
        let (topics, data) = encode(&IKinoraQuest::MilestoneCompleted {
            questId: U256::from(1),
            playerProfileId: U256::from(2),
            milestone: U256::MAX,
        });
        assert!(matches!(
            LogDecoder::decode(&topics, &data),
            Err(DecodeError::Overflow { field: "milestone", .. })
        ));
    }

    #[test]
    fn test_raw_log_keeps_position() {
        let (topics, data) = encode(&IKinoraQuest::QuestCompleted {
            questId: U256::from(3),
            playerProfileId: U256::from(4),
        });
        let log = RawLog {
            address: Address::repeat_byte(1),
            topics,
            data,
            transaction_hash: B256::repeat_byte(2),
            log_index: 9,
            block_number: 100,
            block_timestamp: 1_700_000_000,
        };

        let envelope = log.decode().unwrap();
        assert_eq!(envelope.log_index, 9);
        assert_eq!(envelope.block_number, 100);
        assert_eq!(envelope.event.name(), "QuestCompleted");
    }
}
