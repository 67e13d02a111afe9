//! Recursive binary-space-partition layout: split the grid into
//! shrinking rectangles until each is near `min_partition_size`, drop one
//! room into each leaf, then connect every room with a minimum spanning
//! tree of corridors.

use crate::artifact::{DungeonState, Room};
use crate::config::BspConfig;
use crate::error::DungeonError;
use crate::grid::FLOOR;
use crate::pipeline::{Pass, PassContext};
use crate::prng::Rng;
use crate::trace::DecisionEvent;

use super::connect_rooms_by_mst;

struct Partition {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    depth: u32,
}

fn split(partitions: &mut Vec<Partition>, leaves: &mut Vec<Partition>, rng: &mut Rng, config: &BspConfig) {
    while let Some(partition) = partitions.pop() {
        let can_split_horizontally = partition.width >= config.min_partition_size * 2;
        let can_split_vertically = partition.height >= config.min_partition_size * 2;
        let hit_depth_limit = partition.depth >= config.max_split_depth;

        if hit_depth_limit || (!can_split_horizontally && !can_split_vertically) {
            leaves.push(partition);
            continue;
        }

        let split_horizontally = if can_split_horizontally && can_split_vertically {
            rng.chance(0.5)
        } else {
            can_split_horizontally
        };

        if split_horizontally {
            let min_cut = config.min_partition_size;
            let max_cut = partition.width - config.min_partition_size;
            let cut = rng.gen_range_i64(min_cut, max_cut);
            partitions.push(Partition {
                x: partition.x,
                y: partition.y,
                width: cut,
                height: partition.height,
                depth: partition.depth + 1,
            });
            partitions.push(Partition {
                x: partition.x + cut,
                y: partition.y,
                width: partition.width - cut,
                height: partition.height,
                depth: partition.depth + 1,
            });
        } else {
            let min_cut = config.min_partition_size;
            let max_cut = partition.height - config.min_partition_size;
            let cut = rng.gen_range_i64(min_cut, max_cut);
            partitions.push(Partition {
                x: partition.x,
                y: partition.y,
                width: partition.width,
                height: cut,
                depth: partition.depth + 1,
            });
            partitions.push(Partition {
                x: partition.x,
                y: partition.y + cut,
                width: partition.width,
                height: partition.height - cut,
                depth: partition.depth + 1,
            });
        }
    }
}

pub struct BspPass {
    pub config: BspConfig,
    pub room_count_target: i64,
    pub room_min: i64,
    pub room_max: i64,
}

impl Pass for BspPass {
    fn id(&self) -> &'static str {
        "bsp_layout"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut PassContext) -> Result<DungeonState, DungeonError> {
        let mut rng = state.seed.layout_rng();

        let mut partitions = vec![Partition {
            x: 0,
            y: 0,
            width: state.width,
            height: state.height,
            depth: 0,
        }];
        let mut leaves = Vec::new();
        split(&mut partitions, &mut leaves, &mut rng, &self.config);

        ctx.trace.record(
            DecisionEvent::new(
                self.id(),
                "how many leaf partitions?",
                leaves.len().to_string(),
                "recursive split terminated by min size or depth limit",
            )
            .with_rng_consumed(0),
        );

        let mut rooms_rng = state.seed.rooms_rng();
        let take = (self.room_count_target as usize).min(leaves.len());
        for (index, leaf) in leaves.iter().take(take).enumerate() {
            // A small leaf (close to `min_partition_size`) combined with a
            // wide `room_size_range` can make `leaf.width - 2` fall below
            // `room_min`; clamp the high bound up to `room_min` so the
            // range is never inverted (which would divide by a zero span).
            let room_w_hi = self.room_max.min(leaf.width - 2).max(self.room_min);
            let room_h_hi = self.room_max.min(leaf.height - 2).max(self.room_min);
            let room_w = rooms_rng.gen_range_i64(self.room_min, room_w_hi).max(self.room_min);
            let room_h = rooms_rng.gen_range_i64(self.room_min, room_h_hi).max(self.room_min);
            let room_x = leaf.x + rooms_rng.gen_range_i64(1, (leaf.width - room_w - 1).max(1));
            let room_y = leaf.y + rooms_rng.gen_range_i64(1, (leaf.height - room_h - 1).max(1));

            let room = Room::new(index as u32, room_x, room_y, room_w, room_h, self.config.min_partition_size as u64);
            state.terrain.fill_rect(room.x, room.y, room.width, room.height, FLOOR);
            state.rooms.push(room);
        }

        if state.rooms.is_empty() {
            return Err(DungeonError::RoomPlacementFailed(
                "bsp partitioning produced no usable leaves".to_string(),
            ));
        }

        let connections = connect_rooms_by_mst(&mut state.terrain, &state.rooms, self.config.corridor_width);
        state.connections.extend(connections);

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::DungeonSeed;

    fn pass() -> BspPass {
        BspPass {
            config: BspConfig::default(),
            room_count_target: 8,
            room_min: 4,
            room_max: 9,
        }
    }

    #[test]
    fn produces_rooms_and_connects_them() {
        let state = DungeonState::new(80, 50, DungeonSeed::from_primary(7));
        let mut ctx = PassContext::new(crate::pipeline::CancellationToken::new());
        let result = pass().run(state, &mut ctx).unwrap();

        assert!(!result.rooms.is_empty());
        if result.rooms.len() > 1 {
            assert_eq!(result.connections.len(), result.rooms.len() - 1);
        }
    }

    #[test]
    fn rooms_stay_within_grid_bounds() {
        let state = DungeonState::new(60, 60, DungeonSeed::from_primary(99));
        let mut ctx = PassContext::new(crate::pipeline::CancellationToken::new());
        let result = pass().run(state, &mut ctx).unwrap();

        for room in &result.rooms {
            assert!(room.x >= 0 && room.x + room.width <= 60);
            assert!(room.y >= 0 && room.y + room.height <= 60);
        }
    }

    #[test]
    fn small_leaves_with_wide_room_range_do_not_panic() {
        let config = BspConfig {
            min_partition_size: 5,
            ..BspConfig::default()
        };
        let pass = BspPass {
            config,
            room_count_target: 20,
            room_min: 4,
            room_max: 9,
        };
        for primary in 1..30u32 {
            let state = DungeonState::new(60, 60, DungeonSeed::from_primary(primary));
            let mut ctx = PassContext::new(crate::pipeline::CancellationToken::new());
            pass.run(state, &mut ctx).unwrap();
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = pass().run(DungeonState::new(80, 50, DungeonSeed::from_primary(42)), &mut PassContext::new(Default::default())).unwrap();
        let b = pass().run(DungeonState::new(80, 50, DungeonSeed::from_primary(42)), &mut PassContext::new(Default::default())).unwrap();
        assert_eq!(a.rooms.len(), b.rooms.len());
        for (ra, rb) in a.rooms.iter().zip(b.rooms.iter()) {
            assert_eq!(ra.x, rb.x);
            assert_eq!(ra.y, rb.y);
        }
    }
}
