//! Summary statistics computed from a finished [`DungeonArtifact`]: how
//! much of the grid is walkable, how the rooms are connected, and what
//! got spawned where. Meant for logging and generation-quality
//! dashboards, not for gating correctness (see [`crate::validator`]).

use std::collections::HashMap;

use crate::artifact::DungeonArtifact;

#[derive(Clone, Debug, Default)]
pub struct SpatialStats {
    pub floor_ratio: f64,
    pub room_density: f64,
    pub average_room_area: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ConnectivityStats {
    pub connected_components: usize,
    pub average_path_length: f64,
    pub dead_end_count: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ContentStats {
    pub spawn_count_by_template: HashMap<String, usize>,
    pub spawns_per_room: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DungeonMetrics {
    pub spatial: SpatialStats,
    pub connectivity: ConnectivityStats,
    pub content: ContentStats,
}

impl DungeonMetrics {
    pub fn collect(artifact: &DungeonArtifact) -> Self {
        Self {
            spatial: spatial_stats(artifact),
            connectivity: connectivity_stats(artifact),
            content: content_stats(artifact),
        }
    }
}

fn spatial_stats(artifact: &DungeonArtifact) -> SpatialStats {
    let area = (artifact.width * artifact.height).max(1) as f64;
    let room_area_total: i64 = artifact.rooms.iter().map(|r| r.width * r.height).sum();

    SpatialStats {
        floor_ratio: artifact.terrain.floor_ratio(),
        room_density: room_area_total as f64 / area,
        average_room_area: if artifact.rooms.is_empty() {
            0.0
        } else {
            room_area_total as f64 / artifact.rooms.len() as f64
        },
    }
}

fn connectivity_stats(artifact: &DungeonArtifact) -> ConnectivityStats {
    let (_, sizes) = artifact.terrain.label_components();

    let average_path_length = if artifact.connections.is_empty() {
        0.0
    } else {
        artifact.connections.iter().map(|c| c.path_length as f64).sum::<f64>()
            / artifact.connections.len() as f64
    };

    let mut connection_counts: HashMap<u32, usize> = HashMap::new();
    for connection in &artifact.connections {
        *connection_counts.entry(connection.from_room_id).or_insert(0) += 1;
        *connection_counts.entry(connection.to_room_id).or_insert(0) += 1;
    }
    let dead_end_count = artifact
        .rooms
        .iter()
        .filter(|r| connection_counts.get(&r.id).copied().unwrap_or(0) <= 1)
        .count();

    ConnectivityStats {
        connected_components: sizes.len(),
        average_path_length,
        dead_end_count,
    }
}

fn content_stats(artifact: &DungeonArtifact) -> ContentStats {
    let mut spawn_count_by_template = HashMap::new();
    for spawn in &artifact.spawns {
        *spawn_count_by_template
            .entry(spawn.descriptor.template_id.clone())
            .or_insert(0) += 1;
    }

    let spawns_per_room = if artifact.rooms.is_empty() {
        0.0
    } else {
        artifact.spawns.len() as f64 / artifact.rooms.len() as f64
    };

    ContentStats {
        spawn_count_by_template,
        spawns_per_room,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::DungeonState;
    use crate::grid::FLOOR;
    use crate::seed::DungeonSeed;

    #[test]
    fn floor_ratio_reflects_carved_area() {
        let mut state = DungeonState::new(10, 10, DungeonSeed::from_primary(1));
        state.terrain.fill_rect(0, 0, 5, 5, FLOOR);
        let artifact = state.into_artifact();
        let metrics = DungeonMetrics::collect(&artifact);
        assert!((metrics.spatial.floor_ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn dead_end_rooms_have_at_most_one_connection() {
        let mut state = DungeonState::new(30, 10, DungeonSeed::from_primary(2));
        state.rooms.push(crate::artifact::Room::new(0, 1, 1, 4, 4, 1));
        state.rooms.push(crate::artifact::Room::new(1, 20, 1, 4, 4, 2));
        state.connections.push(crate::artifact::Connection {
            from_room_id: 0,
            to_room_id: 1,
            path_length: 5,
            path: vec![(3, 3), (10, 3), (22, 3)],
            kind: Some(crate::artifact::ConnectionKind::Corridor),
            door_position: None,
        });
        let artifact = state.into_artifact();
        let metrics = DungeonMetrics::collect(&artifact);
        assert_eq!(metrics.connectivity.dead_end_count, 2);
    }
}
