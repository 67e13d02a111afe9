//! The data model produced by a generation run: rooms, connections,
//! spawn descriptors, and the finished grid they sit on. `DungeonState` is
//! the mutable, in-progress version of the same shape that passes through
//! the pipeline; `DungeonArtifact` is its frozen, checksum-stamped output.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::seed::DungeonSeed;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: u32,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub center_x: i64,
    pub center_y: i64,
    pub kind: RoomKind,
    pub seed: u64,
    pub connection_count: Option<u32>,
    pub is_dead_end: Option<bool>,
    pub distance_from_entrance: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Normal,
    Entrance,
    Treasure,
    Boss,
}

impl Room {
    pub fn new(id: u32, x: i64, y: i64, width: i64, height: i64, seed: u64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            center_x: x + width / 2,
            center_y: y + height / 2,
            kind: RoomKind::Normal,
            seed,
            connection_count: None,
            is_dead_end: None,
            distance_from_entrance: None,
        }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Bounds expanded by `margin` on every side, for overlap checks that
    /// require spacing between rooms rather than mere non-intersection.
    pub fn overlaps_with_margin(&self, other: &Room, margin: i64) -> bool {
        let (ax0, ay0) = (self.x - margin, self.y - margin);
        let (ax1, ay1) = (self.x + self.width + margin, self.y + self.height + margin);
        let (bx0, by0) = (other.x, other.y);
        let (bx1, by1) = (other.x + other.width, other.y + other.height);
        ax0 < bx1 && ax1 > bx0 && ay0 < by1 && ay1 > by0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    Corridor,
    Door,
    SecretPassage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from_room_id: u32,
    pub to_room_id: u32,
    pub path_length: u32,
    pub path: Vec<(i64, i64)>,
    pub kind: Option<ConnectionKind>,
    pub door_position: Option<(i64, i64)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySpawnDescriptor {
    pub template_id: String,
    pub position: (i64, i64),
    pub tags: Vec<String>,
    pub metadata: Option<serde_json::Value>,
    pub weight: Option<f64>,
    pub distance_from_start: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub room_id: u32,
    pub descriptor: EntitySpawnDescriptor,
}

/// The mutable working state a pipeline thread passes between passes.
/// Each pass receives one of these and returns a new one (typically a
/// cheap clone-on-write of the unchanged parts plus its own edits).
#[derive(Clone, Debug)]
pub struct DungeonState {
    pub width: i64,
    pub height: i64,
    pub terrain: Grid,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
    pub spawns: Vec<SpawnPoint>,
    pub seed: DungeonSeed,
}

impl DungeonState {
    pub fn new(width: i64, height: i64, seed: DungeonSeed) -> Self {
        Self {
            width,
            height,
            terrain: Grid::filled(width as usize, height as usize, crate::grid::WALL),
            rooms: Vec::new(),
            connections: Vec::new(),
            spawns: Vec::new(),
            seed,
        }
    }

    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn into_artifact(self) -> DungeonArtifact {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(self.terrain.cells());
        for room in &self.rooms {
            hasher.update(&room.id.to_le_bytes());
            hasher.update(&room.x.to_le_bytes());
            hasher.update(&room.y.to_le_bytes());
            hasher.update(&room.width.to_le_bytes());
            hasher.update(&room.height.to_le_bytes());
            hasher.update(&[room.kind as u8]);
        }
        for connection in &self.connections {
            hasher.update(&connection.from_room_id.to_le_bytes());
            hasher.update(&connection.to_room_id.to_le_bytes());
            hasher.update(&connection.path_length.to_le_bytes());
        }
        for spawn in &self.spawns {
            hasher.update(&spawn.room_id.to_le_bytes());
            hasher.update(spawn.descriptor.template_id.as_bytes());
            hasher.update(&spawn.descriptor.position.0.to_le_bytes());
            hasher.update(&spawn.descriptor.position.1.to_le_bytes());
        }
        let checksum = hasher.finalize();

        DungeonArtifact {
            width: self.width,
            height: self.height,
            terrain: self.terrain,
            rooms: self.rooms,
            connections: self.connections,
            spawns: self.spawns,
            checksum,
            seed: self.seed.primary as u64,
        }
    }
}

/// The frozen, shareable result of a completed generation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DungeonArtifact {
    pub width: i64,
    pub height: i64,
    pub terrain: Grid,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
    pub spawns: Vec<SpawnPoint>,
    pub checksum: u32,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_center_is_computed_from_bounds() {
        let room = Room::new(0, 10, 10, 6, 4, 1);
        assert_eq!(room.center_x, 13);
        assert_eq!(room.center_y, 12);
    }

    #[test]
    fn overlap_with_margin_catches_near_misses() {
        let a = Room::new(0, 0, 0, 5, 5, 1);
        let b = Room::new(1, 6, 0, 5, 5, 2);
        assert!(!a.overlaps_with_margin(&b, 0));
        assert!(a.overlaps_with_margin(&b, 2));
    }

    #[test]
    fn artifact_checksum_is_deterministic() {
        let seed = DungeonSeed::from_primary(5);
        let state = DungeonState::new(20, 20, seed);
        let a = state.clone().into_artifact();
        let b = state.into_artifact();
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn artifact_checksum_reflects_rooms_and_spawns_not_just_terrain() {
        let seed = DungeonSeed::from_primary(5);
        let mut with_room = DungeonState::new(20, 20, seed.clone());
        let plain = with_room.clone().into_artifact();

        with_room.rooms.push(Room::new(0, 1, 1, 4, 4, 1));
        with_room.spawns.push(SpawnPoint {
            room_id: 0,
            descriptor: EntitySpawnDescriptor {
                template_id: "goblin".to_string(),
                position: (2, 2),
                tags: vec![],
                metadata: None,
                weight: None,
                distance_from_start: None,
            },
        });
        let with_content = with_room.into_artifact();

        assert_ne!(plain.checksum, with_content.checksum);
    }
}
