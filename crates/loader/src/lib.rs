//! Glue between a finished dungeon artifact and a live ECS world: moves
//! the terrain bytes into a world-owned map resource, spawns the player at
//! the entrance, and instantiates every content spawn descriptor through
//! a prefab registry. No generation logic lives here — by the time a
//! [`DungeonArtifact`] reaches this crate it has already passed invariant
//! validation.

use dungeoncore_dungeon::{DungeonArtifact, RoomKind};
use dungeoncore_ecs::{EntityId, PrefabError, PrefabRegistry, World};
use thiserror::Error;

fn ensure_game_map(world: &mut World) {
    if world.resource::<GameMap>().is_none() {
        world.insert_resource(GameMap::empty());
    }
}

/// The world-owned terrain resource. Adopting an artifact's grid moves it
/// here in place — the artifact's cell bytes are never copied.
pub struct GameMap {
    width: i64,
    height: i64,
    tiles: Vec<u8>,
}

impl GameMap {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            tiles: Vec::new(),
        }
    }

    /// Adopt `tiles` as the live map, replacing whatever was there before.
    /// O(1): `tiles` is moved in, never cloned.
    pub fn set_raw_tiles(&mut self, tiles: Vec<u8>, width: i64, height: i64) {
        self.width = width;
        self.height = height;
        self.tiles = tiles;
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }
}

impl Default for GameMap {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("player prefab {0:?} is not registered")]
    MissingPlayerPrefab(String),
    #[error("spawn prefab failed: {0}")]
    PrefabSpawnFailed(#[from] PrefabError),
}

pub struct DungeonLoader<'a> {
    pub player_template_id: &'a str,
}

pub struct LoadResult {
    pub player: EntityId,
    pub spawned: Vec<EntityId>,
}

impl<'a> DungeonLoader<'a> {
    pub fn new(player_template_id: &'a str) -> Self {
        Self { player_template_id }
    }

    /// Load `artifact` into `world`: adopt the terrain into the world's
    /// [`GameMap`] resource, spawn the player at the entrance room's
    /// center, then spawn every content descriptor via `prefabs`.
    pub fn load(
        &self,
        artifact: DungeonArtifact,
        world: &mut World,
        prefabs: &PrefabRegistry,
    ) -> Result<LoadResult, LoadError> {
        let width = artifact.width;
        let height = artifact.height;
        let room_count = artifact.rooms.len();
        let player_spawn = artifact
            .rooms
            .iter()
            .find(|r| matches!(r.kind, RoomKind::Entrance))
            .or_else(|| artifact.rooms.first())
            .map(|r| (r.center_x, r.center_y))
            .unwrap_or((0, 0));

        let DungeonArtifact { terrain, spawns, .. } = artifact;
        let tiles = terrain.into_cells();

        ensure_game_map(world);
        world
            .resource_mut::<GameMap>()
            .expect("just inserted")
            .set_raw_tiles(tiles, width, height);

        let spawn_x = player_spawn.0;
        let spawn_y = player_spawn.1;
        let player = prefabs
            .spawn(world, self.player_template_id, |world, id| {
                world.add(id, Position { x: spawn_x, y: spawn_y });
            })
            .map_err(LoadError::PrefabSpawnFailed)?;

        let mut spawned = Vec::with_capacity(spawns.len());
        for spawn in &spawns {
            let position = Position {
                x: spawn.descriptor.position.0,
                y: spawn.descriptor.position.1,
            };
            match prefabs.spawn(world, &spawn.descriptor.template_id, |world, id| {
                world.add(id, position);
            }) {
                Ok(entity) => spawned.push(entity),
                Err(err) => {
                    tracing::warn!(template = %spawn.descriptor.template_id, error = %err, "spawn prefab not found, skipping");
                }
            }
        }

        tracing::info!(room_count, spawn_count = spawned.len(), "dungeon loaded into world");

        Ok(LoadResult { player, spawned })
    }
}

/// The only component this crate knows about directly: a spawned
/// entity's position in map space. Game-specific components beyond this
/// are attached by the prefab's own `onCreate` hooks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeoncore_dungeon::{DungeonSeed, DungeonState, Room, SpawnPoint, EntitySpawnDescriptor};

    fn sample_artifact() -> DungeonArtifact {
        let mut state = DungeonState::new(20, 20, DungeonSeed::from_primary(1));
        let mut entrance = Room::new(0, 1, 1, 4, 4, 1);
        entrance.kind = RoomKind::Entrance;
        state.rooms.push(entrance);
        state.spawns.push(SpawnPoint {
            room_id: 0,
            descriptor: EntitySpawnDescriptor {
                template_id: "goblin".to_string(),
                position: (2, 2),
                tags: vec!["enemy".to_string()],
                metadata: None,
                weight: None,
                distance_from_start: None,
            },
        });
        state.into_artifact()
    }

    #[test]
    fn loading_adopts_terrain_and_spawns_player() {
        let mut world = World::new();
        let mut prefabs = PrefabRegistry::new();
        prefabs
            .register("player", None, dungeoncore_ecs::prefab::PrefabBuilder::new())
            .unwrap();
        prefabs
            .register("goblin", None, dungeoncore_ecs::prefab::PrefabBuilder::new())
            .unwrap();

        let loader = DungeonLoader::new("player");
        let result = loader.load(sample_artifact(), &mut world, &prefabs).unwrap();

        assert!(world.has::<Position>(result.player));
        assert_eq!(result.spawned.len(), 1);
        assert_eq!(world.resource::<GameMap>().unwrap().width(), 20);
    }
}
