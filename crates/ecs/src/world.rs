//! The `World`: entity lifecycle, component storage, resources, relations,
//! and observers, wired together behind one owning struct. Grounded in the
//! teacher's `World` (`ecs/world.rs`), replacing its archetype move table
//! with the sparse-set `AnyStore` map.

use crate::component::{AnyStore, Component, ComponentStore};
use crate::entity::{CapacityExceeded, EntityId, EntityManager};
use crate::observer::Observers;
use crate::relation::RelationStore;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Owns every entity, component store, resource, and relation edge in one
/// simulation. A tick counter advances once per `World::advance_tick` call
/// and backs change detection across every component store.
pub struct World {
    entities: EntityManager,
    components: HashMap<TypeId, Box<dyn AnyStore>>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    relations: RelationStore,
    observers: Observers,
    tick: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: EntityManager::new(),
            components: HashMap::new(),
            resources: HashMap::new(),
            relations: RelationStore::new(),
            observers: Observers::new(),
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the world's tick counter. Called once per scheduler pass by
    /// the runtime loop, never implicitly by mutation methods.
    pub fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn create_entity(&mut self) -> EntityId {
        self.entities.create().expect("entity capacity exceeded")
    }

    pub fn try_create_entity(&mut self) -> Result<EntityId, CapacityExceeded> {
        self.entities.create()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.is_alive(id)
    }

    pub fn alive_count(&self) -> u32 {
        self.entities.alive_count()
    }

    pub fn alive_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter_alive()
    }

    /// Destroy `id` along with every entity reachable by following
    /// cascade-delete relations (e.g. `ChildOf`), depth-first, within this
    /// single call. Returns `false` if `id` was already dead.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.entities.is_alive(id) {
            return false;
        }

        let mut to_destroy = vec![id];
        let mut seen = std::collections::HashSet::new();
        let mut i = 0;
        while i < to_destroy.len() {
            let current = to_destroy[i];
            i += 1;
            if !seen.insert(current) {
                continue;
            }
            for source in self.relations.cascade_sources_of(current) {
                if !seen.contains(&source) {
                    to_destroy.push(source);
                }
            }
        }

        let tick = self.tick;
        for &entity in &to_destroy {
            for store in self.components.values_mut() {
                store.remove_any(entity, tick);
            }
            self.relations.purge_entity(entity);
            self.entities.destroy(entity);
        }
        true
    }

    fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStore<T>>())
    }

    fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStore::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .expect("component store type mismatch")
    }

    /// Add or overwrite a component, firing `on_add`/`on_set` observers and
    /// applying any commands they record before returning.
    pub fn add<T: Component>(&mut self, id: EntityId, value: T) {
        let tick = self.tick;
        // Field-disjoint access (not through a `&self`/`&mut self` helper)
        // so `self.observers` can still be borrowed below while `new`/`old`
        // hold a borrow rooted in `self.components`.
        let store = self
            .components
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStore::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .expect("component store type mismatch");
        let replaced = store.add(id, value, tick);
        let new = store.get(id).expect("just inserted");

        let mut cmds = crate::command::CommandBuffer::new();
        match &replaced {
            Some(old) => self.observers.dispatch_set(id, old, new, &mut cmds),
            None => self.observers.dispatch_add(id, new, &mut cmds),
        }
        cmds.flush(self);
    }

    /// In-place mutation for callers that only need to touch a couple of
    /// fields on a large component without cloning it first. Bumps the
    /// write tick like `add` does, but does not fire `on_set`/`on_change`:
    /// there is no prior snapshot to hand observers without requiring
    /// `T: Clone`. Observed overwrites should go through `add` instead.
    pub fn set<T: Component>(&mut self, id: EntityId, updater: impl FnOnce(&mut T)) -> bool {
        let tick = self.tick;
        self.store_mut::<T>().set(id, updater, tick)
    }

    pub fn remove<T: Component>(&mut self, id: EntityId) -> bool {
        let tick = self.tick;
        let removed = self.store_mut::<T>().remove(id, tick);
        match removed {
            Some((value, _moved)) => {
                let mut cmds = crate::command::CommandBuffer::new();
                self.observers.dispatch_remove(id, &value, &mut cmds);
                cmds.flush(self);
                true
            }
            None => false,
        }
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.store::<T>().map(|s| s.has(id)).unwrap_or(false)
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.store::<T>()?.get(id)
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.store_mut::<T>().get_mut(id)
    }

    pub fn last_write_tick<T: Component>(&self, id: EntityId) -> Option<u64> {
        self.store::<T>()?.last_write_tick(id)
    }

    pub fn added_tick<T: Component>(&self, id: EntityId) -> Option<u64> {
        self.store::<T>()?.added_tick(id)
    }

    pub fn component_count<T: Component>(&self) -> usize {
        self.store::<T>().map(|s| s.len()).unwrap_or(0)
    }

    /// Iterate every `(EntityId, &T)` pair currently stored, in dense order.
    pub fn iter_all<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.store::<T>()
            .map(|s| s.iter())
            .into_iter()
            .flatten()
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut RelationStore {
        &mut self.relations
    }

    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }

    pub fn insert_resource<R: 'static + Send + Sync>(&mut self, resource: R) {
        self.resources.insert(TypeId::of::<R>(), Box::new(resource));
    }

    pub fn resource<R: 'static + Send + Sync>(&self) -> Option<&R> {
        self.resources.get(&TypeId::of::<R>())?.downcast_ref()
    }

    pub fn resource_mut<R: 'static + Send + Sync>(&mut self) -> Option<&mut R> {
        self.resources.get_mut(&TypeId::of::<R>())?.downcast_mut()
    }

    pub fn remove_resource<R: 'static + Send + Sync>(&mut self) -> Option<R> {
        self.resources
            .remove(&TypeId::of::<R>())
            .and_then(|boxed| boxed.downcast::<R>().ok())
            .map(|boxed| *boxed)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);

    #[test]
    fn add_get_remove_roundtrip() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add(e, Health(10));
        assert_eq!(world.get::<Health>(e), Some(&Health(10)));
        assert!(world.remove::<Health>(e));
        assert_eq!(world.get::<Health>(e), None);
    }

    #[test]
    fn destroy_entity_clears_components() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add(e, Health(5));
        world.destroy_entity(e);
        assert!(!world.is_alive(e));
        assert_eq!(world.component_count::<Health>(), 0);
    }

    #[test]
    fn cascade_delete_follows_child_of_chain() {
        let mut world = World::new();
        let parent = world.create_entity();
        let child = world.create_entity();
        let grandchild = world.create_entity();
        world
            .relations_mut()
            .relate(child, crate::relation::CHILD_OF, parent, None)
            .unwrap();
        world
            .relations_mut()
            .relate(grandchild, crate::relation::CHILD_OF, child, None)
            .unwrap();

        world.destroy_entity(parent);
        assert!(!world.is_alive(parent));
        assert!(!world.is_alive(child));
        assert!(!world.is_alive(grandchild));
    }

    #[test]
    fn resource_roundtrip() {
        let mut world = World::new();
        world.insert_resource(42i32);
        assert_eq!(world.resource::<i32>(), Some(&42));
        *world.resource_mut::<i32>().unwrap() += 1;
        assert_eq!(world.remove_resource::<i32>(), Some(43));
        assert_eq!(world.resource::<i32>(), None);
    }
}
