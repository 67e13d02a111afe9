//! Query builder over a `World`: `with`/`not`/`changed_since` filters,
//! `added`/`modified`/`changed` convenience predicates. Chooses the
//! smallest `with` component store as the driver and probes every other
//! filter against its candidates, rather than scanning every live entity.

use crate::component::Component;
use crate::entity::EntityId;
use crate::world::World;

struct Term {
    has: fn(&World, EntityId) -> bool,
    store_len: fn(&World) -> usize,
    dense: fn(&World) -> Vec<EntityId>,
    last_write_tick: fn(&World, EntityId) -> Option<u64>,
    added_tick: fn(&World, EntityId) -> Option<u64>,
}

fn has_fn<T: Component>(world: &World, id: EntityId) -> bool {
    world.has::<T>(id)
}
fn len_fn<T: Component>(world: &World) -> usize {
    world.component_count::<T>()
}
fn dense_fn<T: Component>(world: &World) -> Vec<EntityId> {
    world.iter_all::<T>().map(|(id, _)| id).collect()
}
fn last_write_fn<T: Component>(world: &World, id: EntityId) -> Option<u64> {
    world.last_write_tick::<T>(id)
}
fn added_fn<T: Component>(world: &World, id: EntityId) -> Option<u64> {
    world.added_tick::<T>(id)
}

fn term_for<T: Component>() -> Term {
    Term {
        has: has_fn::<T>,
        store_len: len_fn::<T>,
        dense: dense_fn::<T>,
        last_write_tick: last_write_fn::<T>,
        added_tick: added_fn::<T>,
    }
}

#[derive(Copy, Clone)]
enum ChangeMode {
    /// `added()`: entity's tracked component's `added_tick` is newer than
    /// the watermark.
    Added,
    /// `modified()`: `last_write_tick` is newer but `added_tick` is not,
    /// i.e. an overwrite of a pre-existing component, not a fresh insert.
    Modified,
    /// `changed()`: `last_write_tick` is newer, added or not.
    Changed,
}

/// A query over one `World`, built by chaining `with`/`without` and
/// evaluated lazily by `iter`/`entities`.
pub struct Query<'w> {
    world: &'w World,
    with: Vec<Term>,
    not: Vec<Term>,
    change_filter: Option<(Term, ChangeMode, u64)>,
}

impl<'w> Query<'w> {
    pub fn new(world: &'w World) -> Self {
        Self {
            world,
            with: Vec::new(),
            not: Vec::new(),
            change_filter: None,
        }
    }

    /// Require component `T` to be present.
    pub fn with<T: Component>(mut self) -> Self {
        self.with.push(term_for::<T>());
        self
    }

    /// Require component `T` to be absent.
    pub fn without<T: Component>(mut self) -> Self {
        self.not.push(term_for::<T>());
        self
    }

    /// Require `T`'s `added_tick` to be strictly greater than `since`.
    pub fn added<T: Component>(mut self, since: u64) -> Self {
        self.change_filter = Some((term_for::<T>(), ChangeMode::Added, since));
        self
    }

    /// Require `T` to have been overwritten (not freshly added) since
    /// `since`.
    pub fn modified<T: Component>(mut self, since: u64) -> Self {
        self.change_filter = Some((term_for::<T>(), ChangeMode::Modified, since));
        self
    }

    /// Require `T`'s `last_write_tick` to be strictly greater than `since`,
    /// whether that write was an add or an overwrite.
    pub fn changed<T: Component>(mut self, since: u64) -> Self {
        self.change_filter = Some((term_for::<T>(), ChangeMode::Changed, since));
        self
    }

    fn passes(&self, id: EntityId) -> bool {
        if self.not.iter().any(|term| (term.has)(self.world, id)) {
            return false;
        }
        if self.with.iter().any(|term| !(term.has)(self.world, id)) {
            return false;
        }
        if let Some((term, mode, since)) = &self.change_filter {
            if !(term.has)(self.world, id) {
                return false;
            }
            let passes_change = match mode {
                ChangeMode::Added => (term.added_tick)(self.world, id).map_or(false, |t| t > *since),
                ChangeMode::Modified => {
                    let added = (term.added_tick)(self.world, id);
                    let written = (term.last_write_tick)(self.world, id);
                    match (added, written) {
                        (Some(added), Some(written)) => written > *since && added <= *since,
                        _ => false,
                    }
                }
                ChangeMode::Changed => (term.last_write_tick)(self.world, id).map_or(false, |t| t > *since),
            };
            if !passes_change {
                return false;
            }
        }
        true
    }

    /// The candidate set to probe: the smallest declared `with` store, or
    /// every live entity if no `with` term was declared.
    fn driver(&self) -> Vec<EntityId> {
        let smallest = self
            .with
            .iter()
            .min_by_key(|term| (term.store_len)(self.world));
        match smallest {
            Some(term) => (term.dense)(self.world),
            None => self.world.alive_entities().collect(),
        }
    }

    /// Evaluate the query, yielding every matching entity id.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.driver().into_iter().filter(move |&id| self.passes(id))
    }

    pub fn entities(&self) -> Vec<EntityId> {
        self.iter().collect()
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}
