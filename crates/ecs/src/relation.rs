//! Typed directed relations with exclusivity, symmetry, and cascade-delete.
//! Generalized from a per-tick scratch buffer of spatial-proximity edges
//! into a persistent, queryable relation graph keyed by relation name.

use crate::entity::EntityId;
use crate::error::RelationError;
use std::any::Any;
use std::collections::{HashMap, HashSet};

/// A relation type's declared semantics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RelationTypeDef {
    pub exclusive: bool,
    pub symmetric: bool,
    pub cascade_delete: bool,
}

impl RelationTypeDef {
    pub const fn new(exclusive: bool, symmetric: bool, cascade_delete: bool) -> Self {
        Self {
            exclusive,
            symmetric,
            cascade_delete,
        }
    }
}

/// Built-in relation: exclusive, cascade-delete (destroying a target
/// destroys every source that points to it).
pub const CHILD_OF: &str = "ChildOf";
/// Built-in relation: non-exclusive, non-cascade.
pub const CONTAINS: &str = "Contains";
/// Built-in relation: exclusive, non-cascade.
pub const TARGETS: &str = "Targets";

struct Edge {
    target: EntityId,
    payload: Option<Box<dyn Any + Send + Sync>>,
}

/// Directed relation graph: forward (`src -> targets`) and reverse
/// (`tgt -> sources`) indices per relation type, plus the type registry.
pub struct RelationStore {
    defs: HashMap<&'static str, RelationTypeDef>,
    forward: HashMap<(&'static str, EntityId), Vec<Edge>>,
    reverse: HashMap<(&'static str, EntityId), Vec<EntityId>>,
}

impl RelationStore {
    pub fn new() -> Self {
        let mut store = Self {
            defs: HashMap::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
        };
        store.register(CHILD_OF, RelationTypeDef::new(true, false, true));
        store.register(CONTAINS, RelationTypeDef::new(false, false, false));
        store.register(TARGETS, RelationTypeDef::new(true, false, false));
        store
    }

    pub fn register(&mut self, name: &'static str, def: RelationTypeDef) {
        self.defs.insert(name, def);
    }

    pub fn def(&self, rel: &str) -> Option<RelationTypeDef> {
        self.defs.get(rel).copied()
    }

    fn sorted_by_index(mut ids: Vec<EntityId>) -> Vec<EntityId> {
        ids.sort_by_key(|id| id.index());
        ids
    }

    /// `true` if adding `(src, rel, tgt)` to an exclusive chain would create
    /// a cycle, i.e. `src` is already reachable by walking `get_target`
    /// forward from `tgt`.
    fn would_cycle(&self, rel: &'static str, src: EntityId, tgt: EntityId) -> bool {
        let mut current = tgt;
        let mut guard = 0usize;
        loop {
            if current == src {
                return true;
            }
            let Some(next) = self.get_target(current, rel) else {
                return false;
            };
            current = next;
            guard += 1;
            if guard > 1_000_000 {
                // Defensive: a well-formed exclusive graph can't loop this
                // long without revisiting `src`; treat as a cycle rather
                // than spinning forever on corrupt state.
                return true;
            }
        }
    }

    pub fn relate(
        &mut self,
        src: EntityId,
        rel: &'static str,
        tgt: EntityId,
        payload: Option<Box<dyn Any + Send + Sync>>,
    ) -> Result<(), RelationError> {
        let def = self.def(rel).unwrap_or(RelationTypeDef::new(false, false, false));

        if src == tgt {
            return Err(RelationError::SelfParent);
        }
        if def.exclusive && self.would_cycle(rel, src, tgt) {
            return Err(RelationError::CycleDetected);
        }

        self.insert_directed(src, rel, tgt, payload, def.exclusive);
        if def.symmetric {
            self.insert_directed(tgt, rel, src, None, def.exclusive);
        }
        Ok(())
    }

    fn insert_directed(
        &mut self,
        src: EntityId,
        rel: &'static str,
        tgt: EntityId,
        payload: Option<Box<dyn Any + Send + Sync>>,
        exclusive: bool,
    ) {
        if exclusive {
            self.remove_all_targets(src, rel);
        } else if self.has_relation(src, rel, tgt) {
            // Adding an existing non-exclusive edge again is a no-op.
            return;
        }
        self.forward
            .entry((rel, src))
            .or_default()
            .push(Edge { target: tgt, payload });
        self.reverse.entry((rel, tgt)).or_default().push(src);
    }

    fn remove_all_targets(&mut self, src: EntityId, rel: &'static str) {
        if let Some(edges) = self.forward.remove(&(rel, src)) {
            for edge in edges {
                if let Some(sources) = self.reverse.get_mut(&(rel, edge.target)) {
                    sources.retain(|&s| s != src);
                }
            }
        }
    }

    pub fn unrelate(&mut self, src: EntityId, rel: &'static str, tgt: EntityId) {
        if let Some(edges) = self.forward.get_mut(&(rel, src)) {
            edges.retain(|edge| edge.target != tgt);
        }
        if let Some(sources) = self.reverse.get_mut(&(rel, tgt)) {
            sources.retain(|&s| s != src);
        }
        if let Some(def) = self.def(rel) {
            if def.symmetric {
                if let Some(edges) = self.forward.get_mut(&(rel, tgt)) {
                    edges.retain(|edge| edge.target != src);
                }
                if let Some(sources) = self.reverse.get_mut(&(rel, src)) {
                    sources.retain(|&s| s != tgt);
                }
            }
        }
    }

    pub fn has_relation(&self, src: EntityId, rel: &str, tgt: EntityId) -> bool {
        self.forward
            .get(&(rel, src))
            .map(|edges| edges.iter().any(|e| e.target == tgt))
            .unwrap_or(false)
    }

    /// Single target for an exclusive relation.
    pub fn get_target(&self, src: EntityId, rel: &str) -> Option<EntityId> {
        self.forward.get(&(rel, src))?.first().map(|e| e.target)
    }

    pub fn get_targets(&self, src: EntityId, rel: &str) -> Vec<EntityId> {
        let targets = self
            .forward
            .get(&(rel, src))
            .map(|edges| edges.iter().map(|e| e.target).collect())
            .unwrap_or_default();
        Self::sorted_by_index(targets)
    }

    pub fn get_sources(&self, tgt: EntityId, rel: &str) -> Vec<EntityId> {
        let sources = self.reverse.get(&(rel, tgt)).cloned().unwrap_or_default();
        Self::sorted_by_index(sources)
    }

    pub fn count_targets(&self, src: EntityId, rel: &str) -> usize {
        self.forward.get(&(rel, src)).map(|e| e.len()).unwrap_or(0)
    }

    pub fn count_sources(&self, tgt: EntityId, rel: &str) -> usize {
        self.reverse.get(&(rel, tgt)).map(|e| e.len()).unwrap_or(0)
    }

    pub fn payload(&self, src: EntityId, rel: &str, tgt: EntityId) -> Option<&(dyn Any + Send + Sync)> {
        self.forward
            .get(&(rel, src))?
            .iter()
            .find(|e| e.target == tgt)
            .and_then(|e| e.payload.as_deref())
    }

    pub fn clear_by_type(&mut self, rel: &str) {
        self.forward.retain(|(name, _), _| *name != rel);
        self.reverse.retain(|(name, _), _| *name != rel);
    }

    /// All entities that would need to cascade-destroy if `target` were
    /// destroyed right now: every source `S` with `relate(S, R, target)`
    /// for some cascade-delete relation type `R`.
    pub fn cascade_sources_of(&self, target: EntityId) -> Vec<EntityId> {
        let mut sources = HashSet::new();
        for (&name, def) in &self.defs {
            if !def.cascade_delete {
                continue;
            }
            if let Some(edges) = self.reverse.get(&(name, target)) {
                sources.extend(edges.iter().copied());
            }
        }
        Self::sorted_by_index(sources.into_iter().collect())
    }

    /// Remove every edge touching `entity`, as source or target, across all
    /// relation types. Called once an entity is actually being destroyed.
    pub fn purge_entity(&mut self, entity: EntityId) {
        let rel_names: Vec<&'static str> = self.defs.keys().copied().collect();
        for rel in rel_names {
            let targets = self.get_targets(entity, rel);
            for tgt in targets {
                self.unrelate(entity, rel, tgt);
            }
            let sources = self.get_sources(entity, rel);
            for src in sources {
                self.unrelate(src, rel, entity);
            }
        }
    }
}

impl Default for RelationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(i: u32) -> EntityId {
        EntityId::from_parts(0, i)
    }

    #[test]
    fn exclusive_relation_replaces_prior_target() {
        let mut store = RelationStore::new();
        let a = eid(0);
        let b = eid(1);
        let c = eid(2);
        store.relate(a, TARGETS, b, None).unwrap();
        store.relate(a, TARGETS, c, None).unwrap();
        assert_eq!(store.get_target(a, TARGETS), Some(c));
        assert_eq!(store.count_sources(b, TARGETS), 0);
    }

    #[test]
    fn symmetric_relation_is_bidirectional() {
        let mut store = RelationStore::new();
        store.register("Adjacent", RelationTypeDef::new(false, true, false));
        let a = eid(0);
        let b = eid(1);
        store.relate(a, "Adjacent", b, None).unwrap();
        assert!(store.has_relation(a, "Adjacent", b));
        assert!(store.has_relation(b, "Adjacent", a));
        store.unrelate(a, "Adjacent", b);
        assert!(!store.has_relation(b, "Adjacent", a));
    }

    #[test]
    fn cascade_sources_collected_for_direct_children() {
        let mut store = RelationStore::new();
        let a = eid(0);
        let b = eid(1);
        let c = eid(2);
        store.relate(b, CHILD_OF, a, None).unwrap();
        store.relate(c, CHILD_OF, b, None).unwrap();
        assert_eq!(store.cascade_sources_of(a), vec![b]);
        assert_eq!(store.cascade_sources_of(b), vec![c]);
    }

    #[test]
    fn self_relation_rejected() {
        let mut store = RelationStore::new();
        let a = eid(0);
        assert_eq!(store.relate(a, CHILD_OF, a, None), Err(RelationError::SelfParent));
    }

    #[test]
    fn reparent_cycle_detected() {
        let mut store = RelationStore::new();
        let a = eid(0);
        let b = eid(1);
        store.relate(b, CHILD_OF, a, None).unwrap();
        // a -> child of b would close a cycle a->b->a.
        assert_eq!(store.relate(a, CHILD_OF, b, None), Err(RelationError::CycleDetected));
    }

    #[test]
    fn iteration_order_is_sorted_by_index() {
        let mut store = RelationStore::new();
        let parent = eid(0);
        for i in [5, 2, 8, 1] {
            store.relate(eid(i), CHILD_OF, parent, None).unwrap();
        }
        let sources = store.get_sources(parent, CHILD_OF);
        let indices: Vec<u32> = sources.iter().map(|e| e.index()).collect();
        assert_eq!(indices, vec![1, 2, 5, 8]);
    }
}
