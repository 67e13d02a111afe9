//! Deferred mutation buffer. Records `spawn`/`destroy`/`add`/`remove` and
//! applies them in submit order on `flush`. A `spawn`
//! returns a placeholder reference that later commands in the same buffer
//! can target; `flush` resolves placeholders to real ids as it allocates
//! them.

use crate::component::Component;
use crate::entity::EntityId;
use crate::world::World;
use std::collections::HashMap;

/// A reference to an entity from inside a `CommandBuffer`: either a handle
/// to an already-live entity, or a placeholder standing in for an entity
/// that will be spawned earlier in the same buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Real(EntityId),
    Placeholder(u32),
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        EntityRef::Real(id)
    }
}

enum Command {
    Spawn(u32),
    Destroy(EntityRef),
    Add(EntityRef, Box<dyn FnOnce(&mut World, EntityId) + Send>),
    Remove(EntityRef, Box<dyn FnOnce(&mut World, EntityId) + Send>),
}

/// Records deferred mutations; nothing is applied until `flush`.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_placeholder: u32,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer the creation of a new entity. Returns a placeholder other
    /// commands in this same buffer can reference before `flush` runs.
    pub fn spawn(&mut self) -> EntityRef {
        let id = self.next_placeholder;
        self.next_placeholder += 1;
        self.commands.push(Command::Spawn(id));
        EntityRef::Placeholder(id)
    }

    pub fn destroy(&mut self, target: impl Into<EntityRef>) {
        self.commands.push(Command::Destroy(target.into()));
    }

    pub fn add<T: Component>(&mut self, target: impl Into<EntityRef>, value: T) {
        let target = target.into();
        self.commands.push(Command::Add(
            target,
            Box::new(move |world, id| world.add(id, value)),
        ));
    }

    pub fn remove<T: Component>(&mut self, target: impl Into<EntityRef>) {
        let target = target.into();
        self.commands.push(Command::Remove(
            target,
            Box::new(move |world, id| {
                world.remove::<T>(id);
            }),
        ));
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Apply every recorded command to `world`, in submit order.
    pub fn flush(self, world: &mut World) {
        let mut placeholders: HashMap<u32, EntityId> = HashMap::new();
        for command in self.commands {
            match command {
                Command::Spawn(placeholder) => {
                    let id = world.create_entity();
                    placeholders.insert(placeholder, id);
                }
                Command::Destroy(target) => {
                    if let Some(id) = resolve(target, &placeholders) {
                        world.destroy_entity(id);
                    }
                }
                Command::Add(target, apply) => {
                    if let Some(id) = resolve(target, &placeholders) {
                        apply(world, id);
                    }
                }
                Command::Remove(target, apply) => {
                    if let Some(id) = resolve(target, &placeholders) {
                        apply(world, id);
                    }
                }
            }
        }
    }
}

fn resolve(target: EntityRef, placeholders: &HashMap<u32, EntityId>) -> Option<EntityId> {
    match target {
        EntityRef::Real(id) => Some(id),
        EntityRef::Placeholder(ph) => placeholders.get(&ph).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: i32,
        y: i32,
    }

    #[test]
    fn spawn_then_add_resolves_placeholder() {
        let mut world = World::new();
        let mut cmds = CommandBuffer::new();
        let placeholder = cmds.spawn();
        cmds.add(placeholder, Position { x: 1, y: 2 });
        cmds.flush(&mut world);

        let mut found = None;
        for (id, pos) in world.iter_all::<Position>() {
            assert_eq!(found, None);
            found = Some((id, pos.x, pos.y));
        }
        assert_eq!(found.map(|(_, x, y)| (x, y)), Some((1, 2)));
    }

    #[test]
    fn last_writer_wins_within_one_flush() {
        let mut world = World::new();
        let entity = world.create_entity();
        let mut cmds = CommandBuffer::new();
        cmds.add(entity, Position { x: 1, y: 1 });
        cmds.add(entity, Position { x: 2, y: 2 });
        cmds.flush(&mut world);
        assert_eq!(world.get::<Position>(entity), Some(&Position { x: 2, y: 2 }));
    }
}
