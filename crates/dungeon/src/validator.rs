//! Checks a finished [`DungeonState`] against the invariants a consumer
//! is allowed to rely on: rooms are well-formed and non-overlapping,
//! connections reference real rooms with a real path, the grid is the
//! declared size, and every room is actually reachable.

use std::collections::HashSet;

use crate::artifact::DungeonState;

#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub rooms: Vec<String>,
    pub connections: Vec<String>,
    pub grid: Vec<String>,
    pub reachability: Vec<String>,
}

impl ValidationReport {
    pub fn valid(&self) -> bool {
        self.rooms.is_empty()
            && self.connections.is_empty()
            && self.grid.is_empty()
            && self.reachability.is_empty()
    }
}

/// Corridor carving sometimes leaves a reached cell a step short of a
/// room's exact center (rounding during L-corridor bends); flood-fill
/// reachability tolerates being within this many cells of each room
/// center rather than demanding an exact hit.
const REACHABILITY_TOLERANCE: i64 = 1;

fn distance(ax: i64, ay: i64, bx: i64, by: i64) -> f64 {
    (((ax - bx).pow(2) + (ay - by).pow(2)) as f64).sqrt()
}

#[derive(Copy, Clone, Debug)]
pub struct ValidationProfile {
    /// Skip grid-dimension and reachability checks — useful for checking
    /// partially-generated state mid-pipeline, where shrunken grids are
    /// expected, not cheaper production gating.
    pub skip_grid_and_reachability: bool,
}

impl Default for ValidationProfile {
    fn default() -> Self {
        Self {
            skip_grid_and_reachability: false,
        }
    }
}

pub struct InvariantValidator {
    pub profile: ValidationProfile,
    pub room_spacing_margin: i64,
}

impl Default for InvariantValidator {
    fn default() -> Self {
        Self {
            profile: ValidationProfile::default(),
            room_spacing_margin: 1,
        }
    }
}

impl InvariantValidator {
    pub fn validate(&self, state: &DungeonState) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_rooms(state, &mut report);
        self.check_connections(state, &mut report);
        if !self.profile.skip_grid_and_reachability {
            self.check_grid(state, &mut report);
            self.check_reachability(state, &mut report);
        }

        report
    }

    fn check_rooms(&self, state: &DungeonState, report: &mut ValidationReport) {
        let mut seen_ids = HashSet::new();
        for room in &state.rooms {
            if !seen_ids.insert(room.id) {
                report.rooms.push(format!("duplicate room id {}", room.id));
            }
            if room.width <= 0 || room.height <= 0 {
                report.rooms.push(format!("room {} has non-positive dimensions", room.id));
            }
            if room.x < 0 || room.y < 0 || room.x + room.width > state.width || room.y + room.height > state.height {
                report.rooms.push(format!("room {} lies outside the grid", room.id));
            }
            let expected_center_x = room.x + room.width / 2;
            let expected_center_y = room.y + room.height / 2;
            if room.center_x != expected_center_x || room.center_y != expected_center_y {
                report.rooms.push(format!("room {} has a center inconsistent with its bounds", room.id));
            }
        }

        for i in 0..state.rooms.len() {
            for j in (i + 1)..state.rooms.len() {
                if state.rooms[i].overlaps_with_margin(&state.rooms[j], self.room_spacing_margin) {
                    report.rooms.push(format!(
                        "room {} and room {} overlap within the {}-cell spacing margin",
                        state.rooms[i].id, state.rooms[j].id, self.room_spacing_margin
                    ));
                }
            }
        }
    }

    fn check_connections(&self, state: &DungeonState, report: &mut ValidationReport) {
        let room_ids: HashSet<u32> = state.rooms.iter().map(|r| r.id).collect();
        let endpoint_tolerance = state.width.max(state.height) as f64;

        for connection in &state.connections {
            let references_unknown_room = (connection.from_room_id != u32::MAX
                && !room_ids.contains(&connection.from_room_id))
                || (connection.to_room_id != u32::MAX && !room_ids.contains(&connection.to_room_id));
            if references_unknown_room {
                report.connections.push(format!(
                    "connection {} -> {} references an unknown room",
                    connection.from_room_id, connection.to_room_id
                ));
            }
            if connection.path.is_empty() {
                report.connections.push(format!(
                    "connection {} -> {} has an empty path",
                    connection.from_room_id, connection.to_room_id
                ));
            }
            if connection.path.len() as u32 != connection.path_length {
                report.connections.push(format!(
                    "connection {} -> {} path_length does not match the recorded path",
                    connection.from_room_id, connection.to_room_id
                ));
            }

            if let Some(&(fx, fy)) = connection.path.first() {
                if connection.from_room_id != u32::MAX {
                    if let Some(room) = state.room(connection.from_room_id) {
                        let dist = distance(fx, fy, room.center_x, room.center_y);
                        if dist > endpoint_tolerance {
                            report.connections.push(format!(
                                "connection {} -> {} starts {dist:.1} cells from room {}'s center, exceeding the {endpoint_tolerance:.1}-cell tolerance",
                                connection.from_room_id, connection.to_room_id, connection.from_room_id
                            ));
                        }
                    }
                }
            }
            if let Some(&(lx, ly)) = connection.path.last() {
                if connection.to_room_id != u32::MAX {
                    if let Some(room) = state.room(connection.to_room_id) {
                        let dist = distance(lx, ly, room.center_x, room.center_y);
                        if dist > endpoint_tolerance {
                            report.connections.push(format!(
                                "connection {} -> {} ends {dist:.1} cells from room {}'s center, exceeding the {endpoint_tolerance:.1}-cell tolerance",
                                connection.from_room_id, connection.to_room_id, connection.to_room_id
                            ));
                        }
                    }
                }
            }

            for pair in connection.path.windows(2) {
                if pair[0] == pair[1] {
                    report.connections.push(format!(
                        "connection {} -> {} has an adjacent duplicate waypoint at {:?}",
                        connection.from_room_id, connection.to_room_id, pair[0]
                    ));
                }
            }
        }
    }

    fn check_grid(&self, state: &DungeonState, report: &mut ValidationReport) {
        if state.terrain.width() as i64 != state.width || state.terrain.height() as i64 != state.height {
            report.grid.push("terrain dimensions do not match declared width/height".to_string());
        }
    }

    fn check_reachability(&self, state: &DungeonState, report: &mut ValidationReport) {
        let Some(first) = state.rooms.first() else {
            return;
        };
        let visited = state.terrain.flood_fill(first.center_x, first.center_y);
        if visited.is_empty() {
            report
                .reachability
                .push("entrance room center is not itself floor".to_string());
            return;
        }
        let visited_set: HashSet<(i64, i64)> = visited.into_iter().collect();

        for room in &state.rooms {
            let reached = (-REACHABILITY_TOLERANCE..=REACHABILITY_TOLERANCE).any(|dx| {
                (-REACHABILITY_TOLERANCE..=REACHABILITY_TOLERANCE)
                    .any(|dy| visited_set.contains(&(room.center_x + dx, room.center_y + dy)))
            });
            if !reached {
                report
                    .reachability
                    .push(format!("room {} is not reachable from the entrance", room.id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Connection, ConnectionKind, Room};
    use crate::grid::FLOOR;
    use crate::seed::DungeonSeed;

    fn connected_two_room_state() -> DungeonState {
        let mut state = DungeonState::new(30, 10, DungeonSeed::from_primary(1));
        state.rooms.push(Room::new(0, 1, 1, 4, 4, 1));
        state.rooms.push(Room::new(1, 20, 1, 4, 4, 2));
        state.terrain.fill_rect(1, 1, 4, 4, FLOOR);
        state.terrain.fill_rect(20, 1, 4, 4, FLOOR);

        let path = crate::generators::carve_l_corridor(&mut state.terrain, (3, 3), (22, 3), 1);
        state.connections.push(Connection {
            from_room_id: 0,
            to_room_id: 1,
            path_length: path.len() as u32,
            path,
            kind: Some(ConnectionKind::Corridor),
            door_position: None,
        });
        state
    }

    #[test]
    fn well_formed_connected_dungeon_passes() {
        let state = connected_two_room_state();
        let report = InvariantValidator::default().validate(&state);
        assert!(report.valid(), "{report:?}");
    }

    #[test]
    fn overlapping_rooms_are_flagged() {
        let mut state = connected_two_room_state();
        state.rooms.push(Room::new(2, 2, 2, 4, 4, 3));
        let report = InvariantValidator::default().validate(&state);
        assert!(!report.rooms.is_empty());
    }

    #[test]
    fn disconnected_room_fails_reachability() {
        let mut state = connected_two_room_state();
        state.rooms.push(Room::new(2, 28, 8, 1, 1, 4));
        let report = InvariantValidator::default().validate(&state);
        assert!(!report.reachability.is_empty());
    }

    #[test]
    fn connection_endpoint_far_from_room_center_is_flagged() {
        let mut state = connected_two_room_state();
        state.connections[0].path.insert(0, (0, 0));
        let report = InvariantValidator::default().validate(&state);
        assert!(!report.connections.is_empty(), "{report:?}");
    }

    #[test]
    fn adjacent_duplicate_waypoint_is_flagged() {
        let mut state = connected_two_room_state();
        let dup = state.connections[0].path[0];
        state.connections[0].path.insert(0, dup);
        state.connections[0].path_length = state.connections[0].path.len() as u32;
        let report = InvariantValidator::default().validate(&state);
        assert!(!report.connections.is_empty(), "{report:?}");
    }

    #[test]
    fn production_profile_skips_grid_and_reachability() {
        let mut state = connected_two_room_state();
        state.rooms.push(Room::new(2, 28, 8, 1, 1, 4));
        let validator = InvariantValidator {
            profile: ValidationProfile {
                skip_grid_and_reachability: true,
            },
            ..Default::default()
        };
        let report = validator.validate(&state);
        assert!(report.reachability.is_empty());
    }
}
