//! Gate construction shared by quests and milestones.

use kinora_shared::{push_unique, EntityId, Erc20Logic, Erc721Logic, Gate};

use crate::error::IndexResult;
use crate::reader::{ChainReader, GateScope};
use crate::staging::StagedWrites;
use crate::store::{EntityStore, EntityStoreExt};

/// Reads the gate arrays of `scope` as of `block` and stages the gate with
/// its conditions. Returns the gate key.
///
/// Sibling arrays are paired by index. A sibling shorter than its address
/// array leaves the field absent on the trailing conditions.
///
/// # Errors
///
/// Returns an [`IndexError`](crate::IndexError) if a read failed.
pub fn build_gate<S, R>(
    tx: &mut StagedWrites<'_, S>,
    reader: &R,
    block: u64,
    scope: GateScope,
) -> IndexResult<EntityId>
where
    S: EntityStore + ?Sized,
    R: ChainReader + ?Sized,
{
    let quest_id = scope.quest_id();
    let milestone = scope.milestone();

    let erc20_addresses = reader.gated_erc20_addresses(block, scope)?;
    let erc20_thresholds = reader.gated_erc20_thresholds(block, scope)?;
    let erc721_addresses = reader.gated_erc721_addresses(block, scope)?;
    let erc721_token_ids = reader.gated_erc721_token_ids(block, scope)?;
    let erc721_token_uris = reader.gated_erc721_token_uris(block, scope)?;
    let one_of = reader.gated_one_of(block, scope)?;

    let mut gate = Gate {
        id: EntityId::gate(quest_id, milestone),
        erc20_logic: Vec::with_capacity(erc20_addresses.len()),
        erc721_logic: Vec::with_capacity(erc721_addresses.len()),
        one_of: Some(one_of),
    };

    for (index, address) in erc20_addresses.into_iter().enumerate() {
        let logic = Erc20Logic {
            id: EntityId::erc20_logic(quest_id, milestone, index, address),
            address,
            amount: erc20_thresholds.get(index).copied(),
        };
        push_unique(&mut gate.erc20_logic, logic.id.clone());
        tx.save_record(logic);
    }

    for (index, address) in erc721_addresses.into_iter().enumerate() {
        let logic = Erc721Logic {
            id: EntityId::erc721_logic(quest_id, milestone, index, address),
            address,
            token_ids: erc721_token_ids.get(index).cloned(),
            token_uris: erc721_token_uris.get(index).cloned(),
        };
        push_unique(&mut gate.erc721_logic, logic.id.clone());
        tx.save_record(logic);
    }

    let id = gate.id.clone();
    tx.save_record(gate);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{ChainSnapshot, FixtureReader, GateState, QuestState};
    use crate::store::MemoryStore;
    use alloy_primitives::{Address, U256};

    const BLOCK: u64 = 100;

    fn reader_with_gate(gate: GateState) -> FixtureReader {
        FixtureReader::new(Address::ZERO, ChainSnapshot::default()).with_quest(QuestState {
            quest_id: U256::from(5),
            gate,
            ..QuestState::default()
        })
    }

    #[test]
    fn test_short_threshold_array_leaves_amount_absent() {
        let tokens = [
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        ];
        let reader = reader_with_gate(GateState {
            erc20_addresses: tokens.to_vec(),
            erc20_thresholds: vec![U256::from(10), U256::from(20)],
            one_of: true,
            ..GateState::default()
        });
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);

        let id = build_gate(&mut tx, &reader, BLOCK, GateScope::Quest(U256::from(5))).unwrap();
        let gate = tx.load_as::<Gate>(&id).unwrap();
        assert_eq!(gate.erc20_logic.len(), 3);
        assert_eq!(gate.one_of, Some(true));

        let amounts: Vec<_> = gate
            .erc20_logic
            .iter()
            .map(|logic_id| tx.load_as::<Erc20Logic>(logic_id).unwrap().amount)
            .collect();
        assert_eq!(amounts, vec![Some(U256::from(10)), Some(U256::from(20)), None]);
    }

    #[test]
    fn test_erc721_siblings_are_paired_by_index() {
        let reader = reader_with_gate(GateState {
            erc721_addresses: vec![Address::repeat_byte(7), Address::repeat_byte(8)],
            erc721_token_ids: vec![vec![U256::from(1), U256::from(2)]],
            erc721_token_uris: vec![vec!["ipfs://QmA".into()], vec!["ipfs://QmB".into()]],
            ..GateState::default()
        });
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);

        let id = build_gate(&mut tx, &reader, BLOCK, GateScope::Quest(U256::from(5))).unwrap();
        let gate = tx.load_as::<Gate>(&id).unwrap();
        let second = tx.load_as::<Erc721Logic>(&gate.erc721_logic[1]).unwrap();
        assert_eq!(second.token_ids, None);
        assert_eq!(second.token_uris, Some(vec!["ipfs://QmB".to_string()]));
    }

    #[test]
    fn test_quest_and_milestone_gates_do_not_collide() {
        let reader = reader_with_gate(GateState::default());
        let store = MemoryStore::new();
        let mut tx = StagedWrites::new(&store);

        let quest_gate =
            build_gate(&mut tx, &reader, BLOCK, GateScope::Quest(U256::from(5))).unwrap();
        let milestone_gate =
            build_gate(&mut tx, &reader, BLOCK, GateScope::Milestone(U256::from(5), 1)).unwrap();
        assert_ne!(quest_gate, milestone_gate);
        assert_eq!(tx.pending_writes(), 2);
    }
}
