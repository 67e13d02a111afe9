//! Prefab templates: single-parent inheritance resolved once at define
//! time, so `spawn` itself never needs to walk an inheritance chain.
//! Spawned entities are tagged with the template they came from.

use crate::component::Component;
use crate::entity::EntityId;
use crate::world::World;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Tag component attached to every entity spawned from a prefab, naming
/// the template it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateId(pub String);

pub type ComponentApplier = Arc<dyn Fn(&mut World, EntityId) + Send + Sync>;
pub type OnCreateHook = Arc<dyn Fn(&mut World, EntityId) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum PrefabError {
    #[error("prefab '{0}' is already registered")]
    DuplicateName(String),
    #[error("prefab '{name}' extends unknown parent '{parent}'")]
    UnknownParent { name: String, parent: String },
    #[error("prefab '{0}' is unknown")]
    UnknownPrefab(String),
    #[error("prefab '{0}' cannot be removed while other prefabs extend it")]
    ParentInUse(String),
}

struct PrefabDef {
    parent: Option<String>,
    components: Vec<ComponentApplier>,
    on_create: Vec<OnCreateHook>,
}

/// A builder collecting one prefab's own (non-inherited) components and
/// `onCreate` hooks, to be resolved against its parent on `register`.
#[derive(Default)]
pub struct PrefabBuilder {
    components: Vec<ComponentApplier>,
    on_create: Vec<OnCreateHook>,
}

impl PrefabBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component<T: Component + Clone>(mut self, value: T) -> Self {
        self.components.push(Arc::new(move |world, id| {
            world.add(id, value.clone());
        }));
        self
    }

    pub fn on_create(mut self, hook: impl Fn(&mut World, EntityId) + Send + Sync + 'static) -> Self {
        self.on_create.push(Arc::new(hook));
        self
    }
}

/// Registry of named prefabs. Inheritance is flattened at `register` time:
/// a child's resolved component/hook lists are the parent's lists followed
/// by its own, so spawning never needs to walk the chain and `onCreate`
/// hooks naturally run parent-first.
#[derive(Default)]
pub struct PrefabRegistry {
    defs: HashMap<String, PrefabDef>,
    children_of: HashMap<String, HashSet<String>>,
}

impl PrefabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        parent: Option<&str>,
        builder: PrefabBuilder,
    ) -> Result<(), PrefabError> {
        let name = name.into();
        if self.defs.contains_key(&name) {
            return Err(PrefabError::DuplicateName(name));
        }

        let (mut components, mut on_create) = match parent {
            Some(parent_name) => {
                let parent_def = self.defs.get(parent_name).ok_or_else(|| PrefabError::UnknownParent {
                    name: name.clone(),
                    parent: parent_name.to_string(),
                })?;
                (parent_def.components.clone(), parent_def.on_create.clone())
            }
            None => (Vec::new(), Vec::new()),
        };
        components.extend(builder.components);
        on_create.extend(builder.on_create);

        if let Some(parent_name) = parent {
            self.children_of
                .entry(parent_name.to_string())
                .or_default()
                .insert(name.clone());
        }

        self.defs.insert(
            name,
            PrefabDef {
                parent: parent.map(|p| p.to_string()),
                components,
                on_create,
            },
        );
        Ok(())
    }

    /// Remove a prefab. Rejected if another registered prefab still
    /// extends it; callers must remove descendants first.
    pub fn unregister(&mut self, name: &str) -> Result<(), PrefabError> {
        if self.children_of.get(name).map_or(false, |set| !set.is_empty()) {
            return Err(PrefabError::ParentInUse(name.to_string()));
        }
        let def = self.defs.remove(name).ok_or_else(|| PrefabError::UnknownPrefab(name.to_string()))?;
        if let Some(parent) = &def.parent {
            if let Some(siblings) = self.children_of.get_mut(parent) {
                siblings.remove(name);
            }
        }
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Spawn a new entity from `name`: tag it, apply every resolved
    /// component (parent-first), run `overrides`, then fire every resolved
    /// `onCreate` hook (parent-first) so hooks observe final component
    /// values.
    pub fn spawn(
        &self,
        world: &mut World,
        name: &str,
        overrides: impl FnOnce(&mut World, EntityId),
    ) -> Result<EntityId, PrefabError> {
        let def = self.defs.get(name).ok_or_else(|| PrefabError::UnknownPrefab(name.to_string()))?;
        let entity = world.create_entity();
        world.add(entity, TemplateId(name.to_string()));
        for applier in &def.components {
            applier(world, entity);
        }
        overrides(world, entity);
        for hook in &def.on_create {
            hook(world, entity);
        }
        Ok(entity)
    }
}
