//! # Staged Writes
//!
//! One event in, many entity writes out, all or nothing.
//!
//! Handlers never write to the real store. They write to a
//! [`StagedWrites`] overlay that reads through to the store, and the
//! pipeline applies the overlay only after the handler returned `Ok`. A
//! failed enrichment read halfway through a quest therefore leaves no
//! partial quest behind, and re-delivering the event starts from a clean
//! state.
//!
//! ```text
//! handler ──load──> overlay ──miss──> store
//! handler ──save──> overlay
//!                     │ commit (handler returned Ok)
//!                     ▼
//!                   store + metadata activator
//! ```

use std::collections::BTreeMap;

use kinora_shared::{ContentId, Entity, EntityId, EntityKind};

use crate::store::EntityStore;

/// Buffered writes and metadata activations of one event.
pub struct StagedWrites<'s, S: EntityStore + ?Sized> {
    base: &'s S,
    pending: BTreeMap<(EntityKind, EntityId), Entity>,
    activations: Vec<ContentId>,
}

impl<'s, S: EntityStore + ?Sized> StagedWrites<'s, S> {
    /// Starts an empty overlay over `base`.
    #[must_use]
    pub fn new(base: &'s S) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
            activations: Vec::new(),
        }
    }

    /// Queues a metadata activation, skipping duplicates within the event.
    pub fn activate(&mut self, content: ContentId) {
        if !self.activations.contains(&content) {
            self.activations.push(content);
        }
    }

    /// Number of buffered writes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Releases the buffered writes (ordered by kind then key) and
    /// activations (in request order).
    #[must_use]
    pub fn into_parts(self) -> (Vec<Entity>, Vec<ContentId>) {
        (self.pending.into_values().collect(), self.activations)
    }
}

impl<S: EntityStore + ?Sized> EntityStore for StagedWrites<'_, S> {
    fn load(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        match self.pending.get(&(kind, id.clone())) {
            Some(entity) => Some(entity.clone()),
            None => self.base.load(kind, id),
        }
    }

    fn save(&mut self, entity: Entity) {
        self.pending.insert((entity.kind(), entity.id().clone()), entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EntityStoreExt, MemoryStore};
    use alloy_primitives::U256;
    use kinora_shared::Quest;

    #[test]
    fn test_reads_see_staged_writes_first() {
        let mut store = MemoryStore::new();
        store.save_record(Quest::new(U256::from(1)));
        let id = EntityId::quest(U256::from(1));

        let mut staged = StagedWrites::new(&store);
        assert!(staged.update_if_present::<Quest>(&id, |quest| quest.status = Some(true)));
        assert_eq!(staged.load_as::<Quest>(&id).unwrap().status, Some(true));
        assert_eq!(store.load_as::<Quest>(&id).unwrap().status, None);
    }

    #[test]
    fn test_into_parts_releases_last_write_per_key() {
        let store = MemoryStore::new();
        let mut staged = StagedWrites::new(&store);

        let mut quest = Quest::new(U256::from(1));
        staged.save_record(quest.clone());
        quest.status = Some(false);
        staged.save_record(quest.clone());
        staged.activate(ContentId::from_uri("ipfs://Qm1").unwrap());
        staged.activate(ContentId::from_uri("ipfs://Qm1").unwrap());

        assert_eq!(staged.pending_writes(), 1);
        let (writes, activations) = staged.into_parts();
        assert_eq!(writes, vec![Entity::Quest(quest)]);
        assert_eq!(activations.len(), 1);
    }
}
