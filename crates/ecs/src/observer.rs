//! Per-component-type observer callbacks. Fired synchronously at the call
//! site of the triggering mutation, before that call returns. Observers
//! must not re-enter the world's mutation API for the component type they
//! observe — they may record into a
//! [`CommandBuffer`](crate::command::CommandBuffer) instead.

use crate::command::CommandBuffer;
use crate::component::Component;
use crate::entity::EntityId;
use std::any::{Any, TypeId};
use std::collections::HashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum ObserverKind {
    Add,
    Set,
    Remove,
    Change,
}

/// Opaque handle returned by every `on_*` subscription; pass to
/// `Observers::unsubscribe` to remove it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObserverHandle {
    type_id: TypeId,
    kind: ObserverKind,
    id: u64,
}

type Callback<T> = Box<dyn Fn(EntityId, Option<&T>, Option<&T>, &mut CommandBuffer) + Send + Sync>;

struct Bucket<T> {
    add: Vec<(u64, Callback<T>)>,
    set: Vec<(u64, Callback<T>)>,
    remove: Vec<(u64, Callback<T>)>,
    change: Vec<(u64, Callback<T>)>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            set: Vec::new(),
            remove: Vec::new(),
            change: Vec::new(),
        }
    }
}

/// Object-safe surface every `Bucket<T>` exposes so `Observers` can hold
/// heterogeneous buckets in one map and still unsubscribe without knowing
/// the concrete component type at the call site.
trait AnyBucket: Any + Send + Sync {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_by_id(&mut self, kind: ObserverKind, id: u64);
}

impl<T: Component> AnyBucket for Bucket<T> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_by_id(&mut self, kind: ObserverKind, id: u64) {
        let list = match kind {
            ObserverKind::Add => &mut self.add,
            ObserverKind::Set => &mut self.set,
            ObserverKind::Remove => &mut self.remove,
            ObserverKind::Change => &mut self.change,
        };
        list.retain(|(existing_id, _)| *existing_id != id);
    }
}

/// Registry of observer callbacks, one bucket per component type.
#[derive(Default)]
pub struct Observers {
    buckets: HashMap<TypeId, Box<dyn AnyBucket>>,
    next_id: u64,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut<T: Component>(&mut self) -> &mut Bucket<T> {
        self.buckets
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Bucket::<T>::default()))
            .as_any_mut()
            .downcast_mut::<Bucket<T>>()
            .expect("bucket type mismatch")
    }

    fn next_handle(&mut self, type_id: TypeId, kind: ObserverKind) -> ObserverHandle {
        let id = self.next_id;
        self.next_id += 1;
        ObserverHandle { type_id, kind, id }
    }

    pub fn on_add<T, F>(&mut self, callback: F) -> ObserverHandle
    where
        T: Component,
        F: Fn(EntityId, &T, &mut CommandBuffer) + Send + Sync + 'static,
    {
        let handle = self.next_handle(TypeId::of::<T>(), ObserverKind::Add);
        self.bucket_mut::<T>().add.push((
            handle.id,
            Box::new(move |id, _old, new, cmds| {
                if let Some(new) = new {
                    callback(id, new, cmds);
                }
            }),
        ));
        handle
    }

    pub fn on_set<T, F>(&mut self, callback: F) -> ObserverHandle
    where
        T: Component,
        F: Fn(EntityId, &T, &T, &mut CommandBuffer) + Send + Sync + 'static,
    {
        let handle = self.next_handle(TypeId::of::<T>(), ObserverKind::Set);
        self.bucket_mut::<T>().set.push((
            handle.id,
            Box::new(move |id, old, new, cmds| {
                if let (Some(old), Some(new)) = (old, new) {
                    callback(id, old, new, cmds);
                }
            }),
        ));
        handle
    }

    pub fn on_remove<T, F>(&mut self, callback: F) -> ObserverHandle
    where
        T: Component,
        F: Fn(EntityId, &T, &mut CommandBuffer) + Send + Sync + 'static,
    {
        let handle = self.next_handle(TypeId::of::<T>(), ObserverKind::Remove);
        self.bucket_mut::<T>().remove.push((
            handle.id,
            Box::new(move |id, old, _new, cmds| {
                if let Some(old) = old {
                    callback(id, old, cmds);
                }
            }),
        ));
        handle
    }

    pub fn on_change<T, F>(&mut self, callback: F) -> ObserverHandle
    where
        T: Component,
        F: Fn(EntityId, &T, &mut CommandBuffer) + Send + Sync + 'static,
    {
        let handle = self.next_handle(TypeId::of::<T>(), ObserverKind::Change);
        self.bucket_mut::<T>().change.push((
            handle.id,
            Box::new(move |id, _old, new, cmds| {
                if let Some(new) = new {
                    callback(id, new, cmds);
                }
            }),
        ));
        handle
    }

    /// Remove a subscription. Safe to call twice; the second call is a
    /// no-op since the id will no longer be present.
    pub fn unsubscribe(&mut self, handle: ObserverHandle) {
        if let Some(bucket) = self.buckets.get_mut(&handle.type_id) {
            bucket.remove_by_id(handle.kind, handle.id);
        }
    }

    pub(crate) fn dispatch_add<T: Component>(&mut self, id: EntityId, new: &T, cmds: &mut CommandBuffer) {
        let Some(bucket) = self.buckets.get_mut(&TypeId::of::<T>()) else {
            return;
        };
        let bucket = bucket
            .as_any_mut()
            .downcast_mut::<Bucket<T>>()
            .expect("bucket type mismatch");
        for (_, cb) in &bucket.add {
            cb(id, None, Some(new), cmds);
        }
        for (_, cb) in &bucket.change {
            cb(id, None, Some(new), cmds);
        }
    }

    pub(crate) fn dispatch_set<T: Component>(&mut self, id: EntityId, old: &T, new: &T, cmds: &mut CommandBuffer) {
        let Some(bucket) = self.buckets.get_mut(&TypeId::of::<T>()) else {
            return;
        };
        let bucket = bucket
            .as_any_mut()
            .downcast_mut::<Bucket<T>>()
            .expect("bucket type mismatch");
        for (_, cb) in &bucket.set {
            cb(id, Some(old), Some(new), cmds);
        }
        for (_, cb) in &bucket.change {
            cb(id, Some(old), Some(new), cmds);
        }
    }

    pub(crate) fn dispatch_remove<T: Component>(&mut self, id: EntityId, old: &T, cmds: &mut CommandBuffer) {
        let Some(bucket) = self.buckets.get_mut(&TypeId::of::<T>()) else {
            return;
        };
        let bucket = bucket
            .as_any_mut()
            .downcast_mut::<Bucket<T>>()
            .expect("bucket type mismatch");
        for (_, cb) in &bucket.remove {
            cb(id, Some(old), None, cmds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn add_and_change_both_fire_on_insert() {
        let mut observers = Observers::new();
        let add_count = Arc::new(AtomicI32::new(0));
        let change_count = Arc::new(AtomicI32::new(0));
        {
            let add_count = add_count.clone();
            observers.on_add::<i32, _>(move |_, _, _| {
                add_count.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let change_count = change_count.clone();
            observers.on_change::<i32, _>(move |_, _, _| {
                change_count.fetch_add(1, Ordering::SeqCst);
            });
        }
        let mut cmds = CommandBuffer::new();
        observers.dispatch_add(EntityId::from_parts(0, 0), &5, &mut cmds);
        assert_eq!(add_count.load(Ordering::SeqCst), 1);
        assert_eq!(change_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_future_dispatch() {
        let mut observers = Observers::new();
        let count = Arc::new(AtomicI32::new(0));
        let handle = {
            let count = count.clone();
            observers.on_add::<i32, _>(move |_, _, _| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        observers.unsubscribe(handle);
        let mut cmds = CommandBuffer::new();
        observers.dispatch_add(EntityId::from_parts(0, 0), &5, &mut cmds);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
