//! The three layout generators: [`bsp`] (recursive partition, blocky
//! rooms-and-corridors), [`cellular`] (cave-like organic caverns), and
//! [`hybrid`] (zones of each, stitched together). Each exposes a
//! [`crate::pipeline::Pass`] that carves `state.terrain` and appends
//! `state.rooms` / `state.connections`.

pub mod bsp;
pub mod cellular;
pub mod hybrid;

use crate::artifact::{Connection, ConnectionKind, Room};
use crate::grid::{Grid, FLOOR};

/// Carve an orthogonal L-shaped corridor between two points: horizontal
/// first, then vertical (the split point is the room-a side of the bend).
/// Returns the full cell path, in carve order, for connection bookkeeping.
pub fn carve_l_corridor(grid: &mut Grid, from: (i64, i64), to: (i64, i64), width: i64) -> Vec<(i64, i64)> {
    let half = (width - 1) / 2;
    let mut path = Vec::new();
    let (x0, y0) = from;
    let (x1, y1) = to;

    let step_x = if x1 >= x0 { 1 } else { -1 };
    let mut x = x0;
    while x != x1 {
        grid.fill_square(x, y0, half, FLOOR);
        path.push((x, y0));
        x += step_x;
    }
    grid.fill_square(x1, y0, half, FLOOR);
    path.push((x1, y0));

    let step_y = if y1 >= y0 { 1 } else { -1 };
    let mut y = y0;
    while y != y1 {
        grid.fill_square(x1, y, half, FLOOR);
        path.push((x1, y));
        y += step_y;
    }
    grid.fill_square(x1, y1, half, FLOOR);
    path.push((x1, y1));

    path
}

/// Build a minimum spanning tree over room centers by Euclidean distance
/// (Prim's algorithm), then carve a corridor for each MST edge. This is
/// the shared "connect everything with the fewest corridors" step used
/// by both BSP and hybrid layouts.
pub fn connect_rooms_by_mst(grid: &mut Grid, rooms: &[Room], corridor_width: i64) -> Vec<Connection> {
    if rooms.len() < 2 {
        return Vec::new();
    }

    let mut in_tree = vec![false; rooms.len()];
    in_tree[0] = true;
    let mut connections = Vec::new();

    for _ in 1..rooms.len() {
        let mut best: Option<(usize, usize, f64)> = None;
        for (i, room_a) in rooms.iter().enumerate() {
            if !in_tree[i] {
                continue;
            }
            for (j, room_b) in rooms.iter().enumerate() {
                if in_tree[j] {
                    continue;
                }
                let dx = (room_a.center_x - room_b.center_x) as f64;
                let dy = (room_a.center_y - room_b.center_y) as f64;
                let dist = (dx * dx + dy * dy).sqrt();
                if best.map(|(_, _, d)| dist < d).unwrap_or(true) {
                    best = Some((i, j, dist));
                }
            }
        }

        if let Some((i, j, _)) = best {
            in_tree[j] = true;
            let a = &rooms[i];
            let b = &rooms[j];
            let path = carve_l_corridor(grid, (a.center_x, a.center_y), (b.center_x, b.center_y), corridor_width);
            connections.push(Connection {
                from_room_id: a.id,
                to_room_id: b.id,
                path_length: path.len() as u32,
                path,
                kind: Some(ConnectionKind::Corridor),
                door_position: None,
            });
        }
    }

    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::WALL;

    #[test]
    fn l_corridor_connects_both_endpoints() {
        let mut grid = Grid::filled(20, 20, WALL);
        carve_l_corridor(&mut grid, (2, 2), (10, 15), 1);
        assert!(grid.is_floor(2, 2));
        assert!(grid.is_floor(10, 15));
        assert!(grid.is_floor(10, 2)); // the bend
    }

    #[test]
    fn mst_connects_every_room() {
        let mut grid = Grid::filled(40, 40, WALL);
        let rooms = vec![
            Room::new(0, 2, 2, 4, 4, 1),
            Room::new(1, 20, 2, 4, 4, 2),
            Room::new(2, 20, 20, 4, 4, 3),
        ];
        let connections = connect_rooms_by_mst(&mut grid, &rooms, 1);
        assert_eq!(connections.len(), 2);

        let (_, sizes) = grid.label_components();
        assert_eq!(sizes.len(), 1, "every room should land in one connected region");
    }
}
