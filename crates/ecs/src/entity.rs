//! Entity identity: packed (generation, index) handles with a free-list
//! allocator. See `EntityManager` for the allocation contract.

use std::fmt;

/// Bits allotted to the index half of an [`EntityId`].
const INDEX_BITS: u32 = 20;
/// Bits allotted to the generation half.
const GENERATION_BITS: u32 = 12;

const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = (1 << GENERATION_BITS) - 1;

/// Maximum number of live entity index slots.
pub const MAX_ENTITIES: u32 = 1 << INDEX_BITS;
/// Generation wraps modulo this value. A handle whose generation has
/// wrapped all the way around can alias a fresh allocation at the same
/// index; this is an accepted limit, not a bug.
pub const GENERATION_MODULUS: u32 = 1 << GENERATION_BITS;

/// A 32-bit entity handle: `index` in the low 20 bits, `generation` in the
/// next 12 bits. Two handles are equal iff both fields match; a handle is
/// alive iff `EntityManager::is_alive` says so, not by virtue of equality.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u32);

/// Reserved value that is never alive.
pub const NULL_ENTITY: EntityId = EntityId(u32::MAX);

impl EntityId {
    #[inline]
    pub const fn from_parts(generation: u32, index: u32) -> Self {
        debug_assert!(index <= INDEX_MASK);
        debug_assert!(generation <= GENERATION_MASK);
        EntityId((generation << INDEX_BITS) | index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        (self.0 >> INDEX_BITS) & GENERATION_MASK
    }

    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        EntityId(bits)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}#{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index(), self.generation())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        NULL_ENTITY
    }
}

/// Error returned when the entity manager cannot allocate another index.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("entity capacity exceeded: {0} live index slots already allocated")]
pub struct CapacityExceeded(pub u32);

/// Owns the generation table and free list backing entity allocation.
///
/// Invariant: `alive_count == allocated_index_count - free_list_size`.
/// Indices are recycled LIFO.
pub struct EntityManager {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    alive_count: u32,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            alive_count: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocate a new entity, reusing a freed index when one is available.
    pub fn create(&mut self) -> Result<EntityId, CapacityExceeded> {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else {
            let index = self.generations.len() as u32;
            if index >= MAX_ENTITIES {
                return Err(CapacityExceeded(index));
            }
            self.generations.push(0);
            self.alive.push(false);
            index
        };
        self.alive[index as usize] = true;
        self.alive_count += 1;
        let generation = self.generations[index as usize];
        Ok(EntityId::from_parts(generation, index))
    }

    /// Destroy an entity. Idempotent: destroying an already-dead or stale
    /// handle is a silent no-op, not an error.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let index = id.index() as usize;
        self.generations[index] = (self.generations[index] + 1) % GENERATION_MODULUS;
        self.alive[index] = false;
        self.free_list.push(id.index());
        self.alive_count -= 1;
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        if id == NULL_ENTITY {
            return false;
        }
        let index = id.index() as usize;
        match (self.generations.get(index), self.alive.get(index)) {
            (Some(&generation), Some(&alive)) => alive && generation == id.generation(),
            _ => false,
        }
    }

    /// Every currently-alive entity, in ascending index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive.iter().enumerate().filter_map(move |(index, &is_alive)| {
            is_alive.then(|| EntityId::from_parts(self.generations[index], index as u32))
        })
    }

    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    pub fn allocated_count(&self) -> u32 {
        self.generations.len() as u32
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_destroy_recycles_index_lifo() {
        let mut mgr = EntityManager::new();
        let a = mgr.create().unwrap();
        let b = mgr.create().unwrap();
        assert_ne!(a.index(), b.index());
        mgr.destroy(b);
        mgr.destroy(a);
        // LIFO: a's index (freed last) comes back first.
        let c = mgr.create().unwrap();
        assert_eq!(c.index(), a.index());
        assert_eq!(c.generation(), a.generation() + 1);
    }

    #[test]
    fn stale_handle_reports_dead_after_reuse() {
        let mut mgr = EntityManager::new();
        let a = mgr.create().unwrap();
        mgr.destroy(a);
        let b = mgr.create().unwrap();
        assert_eq!(a.index(), b.index());
        assert!(!mgr.is_alive(a));
        assert!(mgr.is_alive(b));
    }

    #[test]
    fn destroy_is_idempotent_on_stale_handles() {
        let mut mgr = EntityManager::new();
        let a = mgr.create().unwrap();
        assert!(mgr.destroy(a));
        assert!(!mgr.destroy(a));
    }

    #[test]
    fn null_entity_never_alive() {
        let mgr = EntityManager::new();
        assert!(!mgr.is_alive(NULL_ENTITY));
    }

    #[test]
    fn alive_count_tracks_create_and_destroy() {
        let mut mgr = EntityManager::new();
        let a = mgr.create().unwrap();
        let _b = mgr.create().unwrap();
        assert_eq!(mgr.alive_count(), 2);
        mgr.destroy(a);
        assert_eq!(mgr.alive_count(), 1);
    }
}
