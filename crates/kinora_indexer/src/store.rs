//! # Entity Store
//!
//! Key-value persistence of the entity graph.
//!
//! The indexer only needs two primitives from a store: load by
//! `(kind, key)` and upsert. Everything else (lazy creation, appends on
//! parents that may not exist yet) is layered on top by [`EntityStoreExt`]
//! so every handler shares the same semantics.

use std::collections::BTreeMap;
use std::sync::Arc;

use kinora_shared::{Entity, EntityId, EntityKind, Record};
use parking_lot::RwLock;

/// Load/save access to stored entities.
pub trait EntityStore {
    /// Loads an entity, or `None` if the key was never saved.
    fn load(&self, kind: EntityKind, id: &EntityId) -> Option<Entity>;

    /// Upserts an entity under its own kind and key.
    fn save(&mut self, entity: Entity);
}

/// Typed helpers over any [`EntityStore`].
pub trait EntityStoreExt: EntityStore {
    /// Loads a record of type `T`.
    fn load_as<T: Record>(&self, id: &EntityId) -> Option<T> {
        self.load(T::KIND, id).and_then(T::from_entity)
    }

    /// Upserts a typed record.
    fn save_record<T: Record>(&mut self, record: T) {
        self.save(record.into());
    }

    /// Loads a record, or builds it with `create` if absent.
    ///
    /// Nothing is written: the caller saves the record once it has been
    /// filled in.
    fn get_or_create<T: Record>(&self, id: &EntityId, create: impl FnOnce() -> T) -> T {
        self.load_as(id).unwrap_or_else(create)
    }

    /// Applies `update` to a stored record and saves it.
    ///
    /// Returns `false` without writing if the record does not exist. A
    /// child event may arrive before the event that creates its parent;
    /// that is not an error.
    fn update_if_present<T: Record>(&mut self, id: &EntityId, update: impl FnOnce(&mut T)) -> bool {
        let Some(mut record) = self.load_as::<T>(id) else {
            return false;
        };
        update(&mut record);
        self.save_record(record);
        true
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}

/// In-memory store, ordered by kind then key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entities: BTreeMap<EntityKind, BTreeMap<EntityId, Entity>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.values().map(BTreeMap::len).sum()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entities of one kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.get(&kind).map_or(0, BTreeMap::len)
    }

    /// All records of type `T`, in key order.
    #[must_use]
    pub fn all<T: Record>(&self) -> Vec<T> {
        self.entities
            .get(&T::KIND)
            .map(|entities| {
                entities
                    .values()
                    .cloned()
                    .filter_map(T::from_entity)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every stored entity, ordered by kind then key.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().flat_map(BTreeMap::values)
    }
}

impl EntityStore for MemoryStore {
    fn load(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.entities.get(&kind)?.get(id).cloned()
    }

    fn save(&mut self, entity: Entity) {
        self.entities
            .entry(entity.kind())
            .or_default()
            .insert(entity.id().clone(), entity);
    }
}

/// A [`MemoryStore`] shared between the pipeline and the metadata worker.
#[derive(Clone, Debug, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<MemoryStore>>,
}

impl SharedStore {
    /// Creates an empty shared store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with read access to the underlying store.
    pub fn read<T>(&self, f: impl FnOnce(&MemoryStore) -> T) -> T {
        f(&self.inner.read())
    }

    /// Copies the current contents.
    #[must_use]
    pub fn snapshot(&self) -> MemoryStore {
        self.inner.read().clone()
    }
}

impl EntityStore for SharedStore {
    fn load(&self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        self.inner.read().load(kind, id)
    }

    fn save(&mut self, entity: Entity) {
        self.inner.write().save(entity);
    }
}
