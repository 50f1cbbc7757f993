//! # Pipeline Throughput Benchmark
//!
//! Measures log decoding and event materialization against an in-memory
//! store and fixture reader.
//!
//! Run with: `cargo bench --package kinora_indexer`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kinora_indexer::reader::{MilestoneState, QuestState, RewardState};
use kinora_indexer::{
    ChainSnapshot, FixtureReader, IKinoraQuest, LogDecoder, MemoryStore, Pipeline, PipelineConfig,
    RecordingActivator,
};
use kinora_shared::{EventEnvelope, QuestEvent};

fn reader(quests: u64) -> FixtureReader {
    let milestone = MilestoneState {
        uri: "ipfs://QmMilestone".into(),
        videos: vec!["0x01-0x0a".into(), "0x01-0x0b".into()],
        rewards: vec![RewardState {
            kind: 0,
            uri: "ipfs://QmReward".into(),
            token_address: Address::repeat_byte(4),
            amount: U256::from(1_000),
        }],
        ..MilestoneState::default()
    };

    (1..=quests).fold(
        FixtureReader::new(Address::ZERO, ChainSnapshot::default()),
        |reader, quest_id| {
            reader.with_quest(QuestState {
                quest_id: U256::from(quest_id),
                uri: format!("ipfs://QmQuest{quest_id}"),
                milestones: vec![milestone.clone(); 3],
                ..QuestState::default()
            })
        },
    )
}

fn envelope(log_index: u64, event: QuestEvent) -> EventEnvelope {
    EventEnvelope {
        transaction_hash: B256::repeat_byte(7),
        log_index,
        block_number: log_index,
        block_timestamp: log_index * 12,
        event,
    }
}

/// Benchmark: Raw log decoding.
fn bench_log_decoding(c: &mut Criterion) {
    let event = IKinoraQuest::MilestoneCompleted {
        questId: U256::from(5),
        playerProfileId: U256::from(9),
        milestone: U256::from(2),
    };
    let topics: Vec<B256> = event.encode_topics().into_iter().map(|topic| topic.0).collect();
    let data = event.encode_data();

    c.bench_function("decode_milestone_completed", |b| {
        b.iter(|| black_box(LogDecoder::decode(&topics, &data)));
    });
}

/// Benchmark: Quest instantiation with enrichment reads.
fn bench_quest_instantiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("quest_instantiation");

    for quests in [10u64, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(quests), &quests, |b, &quests| {
            let events: Vec<_> = (1..=quests)
                .map(|quest_id| {
                    envelope(
                        quest_id,
                        QuestEvent::QuestInstantiated {
                            quest_id: U256::from(quest_id),
                            milestone_count: 3,
                        },
                    )
                })
                .collect();

            b.iter(|| {
                let mut pipeline = Pipeline::new(
                    MemoryStore::new(),
                    reader(quests),
                    RecordingActivator::new(),
                    PipelineConfig::default(),
                );
                for event in &events {
                    black_box(pipeline.process(event).ok());
                }
                black_box(pipeline.stats())
            });
        });
    }

    group.finish();
}

/// Benchmark: Player progress events on an existing quest.
fn bench_player_events(c: &mut Criterion) {
    let mut pipeline = Pipeline::new(
        MemoryStore::new(),
        reader(1),
        RecordingActivator::new(),
        PipelineConfig::default(),
    );
    let setup = envelope(
        0,
        QuestEvent::QuestInstantiated {
            quest_id: U256::from(1),
            milestone_count: 3,
        },
    );
    let _ = pipeline.process(&setup);

    let mut log_index = 1u64;
    c.bench_function("player_join_and_complete", |b| {
        b.iter(|| {
            let player = U256::from(log_index % 1_000);
            let joined = envelope(
                log_index,
                QuestEvent::PlayerJoinedQuest {
                    quest_id: U256::from(1),
                    player_profile_id: player,
                },
            );
            let completed = envelope(
                log_index + 1,
                QuestEvent::MilestoneCompleted {
                    quest_id: U256::from(1),
                    player_profile_id: player,
                    milestone: 1,
                },
            );
            log_index += 2;
            black_box(pipeline.process(&joined).ok());
            black_box(pipeline.process(&completed).ok());
        });
    });
}

criterion_group!(
    benches,
    bench_log_decoding,
    bench_quest_instantiation,
    bench_player_events,
);

criterion_main!(benches);
