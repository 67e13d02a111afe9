//! Zone-based hybrid layout: split the grid into 2-4 zones (alternating
//! split axis), assign each zone to either the BSP or cellular generator
//! by `natural_ratio`, run each zone's pipeline independently, then carve
//! one cross-zone corridor per adjacent zone pair to stitch the result
//! together.

use crate::artifact::{Connection, ConnectionKind, DungeonState};
use crate::config::{BspConfig, CellularConfig, HybridConfig};
use crate::error::DungeonError;
use crate::pipeline::{Pass, PassContext};
use crate::trace::DecisionEvent;

use super::bsp::BspPass;
use super::cellular::CellularPass;
use super::carve_l_corridor;

struct Zone {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

fn split_into_zones(width: i64, height: i64, zone_count: u32) -> Vec<Zone> {
    let mut zones = vec![Zone { x: 0, y: 0, width, height }];
    let mut axis_horizontal = width >= height;

    while (zones.len() as u32) < zone_count {
        let Some((index, _)) = zones.iter().enumerate().max_by_key(|(_, z)| z.width * z.height) else {
            break;
        };

        let zone = zones.remove(index);
        if axis_horizontal && zone.width >= 10 {
            let cut = zone.width / 2;
            zones.push(Zone { x: zone.x, y: zone.y, width: cut, height: zone.height });
            zones.push(Zone { x: zone.x + cut, y: zone.y, width: zone.width - cut, height: zone.height });
        } else if zone.height >= 10 {
            let cut = zone.height / 2;
            zones.push(Zone { x: zone.x, y: zone.y, width: zone.width, height: cut });
            zones.push(Zone { x: zone.x, y: zone.y + cut, width: zone.width, height: zone.height - cut });
        } else {
            zones.push(zone);
            break;
        }
        axis_horizontal = !axis_horizontal;
    }

    zones
}

pub struct HybridPass {
    pub config: HybridConfig,
    pub bsp_config: BspConfig,
    pub cellular_config: CellularConfig,
    pub room_count_target: i64,
    pub room_min: i64,
    pub room_max: i64,
}

impl Pass for HybridPass {
    fn id(&self) -> &'static str {
        "hybrid_layout"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut PassContext) -> Result<DungeonState, DungeonError> {
        let zone_count = self.config.zone_count.clamp(2, 4);
        let zones = split_into_zones(state.width, state.height, zone_count);
        let mut rng = state.seed.layout_rng();

        let mut next_room_id = 0u32;
        let mut zone_anchor_rooms = Vec::new();

        for (zone_index, zone) in zones.iter().enumerate() {
            let use_natural = rng.chance(self.config.natural_ratio);
            ctx.trace.record(DecisionEvent::new(
                self.id(),
                format!("zone {zone_index} generator?"),
                if use_natural { "cellular" } else { "bsp" },
                "weighted coin flip against natural_ratio",
            ));

            let zone_seed = crate::seed::DungeonSeed::from_primary(state.seed.primary ^ (zone_index as u32 + 1));
            let mut zone_state = DungeonState::new(zone.width, zone.height, zone_seed);

            zone_state = if use_natural {
                CellularPass { config: self.cellular_config }.run(zone_state, ctx)?
            } else {
                BspPass {
                    config: self.bsp_config,
                    room_count_target: (self.room_count_target / zones.len() as i64).max(1),
                    room_min: self.room_min,
                    room_max: self.room_max,
                }
                .run(zone_state, ctx)?
            };

            for ty in 0..zone.height {
                for tx in 0..zone.width {
                    let v = zone_state.terrain.get(tx, ty);
                    state.terrain.set(zone.x + tx, zone.y + ty, v);
                }
            }

            for mut room in zone_state.rooms {
                room.id = next_room_id;
                next_room_id += 1;
                room.x += zone.x;
                room.y += zone.y;
                room.center_x += zone.x;
                room.center_y += zone.y;
                state.rooms.push(room);
            }
            for mut connection in zone_state.connections {
                connection.path = connection.path.into_iter().map(|(x, y)| (x + zone.x, y + zone.y)).collect();
                state.connections.push(connection);
            }

            if let Some(anchor) = state.rooms.last() {
                zone_anchor_rooms.push((anchor.center_x, anchor.center_y));
            }
        }

        for pair in zone_anchor_rooms.windows(2) {
            let path = carve_l_corridor(&mut state.terrain, pair[0], pair[1], self.bsp_config.corridor_width);
            state.connections.push(Connection {
                from_room_id: u32::MAX,
                to_room_id: u32::MAX,
                path_length: path.len() as u32,
                path,
                kind: Some(ConnectionKind::Corridor),
                door_position: None,
            });
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::DungeonSeed;

    fn pass() -> HybridPass {
        HybridPass {
            config: HybridConfig::default(),
            bsp_config: BspConfig::default(),
            cellular_config: CellularConfig::default(),
            room_count_target: 8,
            room_min: 4,
            room_max: 9,
        }
    }

    #[test]
    fn produces_zones_with_rooms() {
        let state = DungeonState::new(80, 60, DungeonSeed::from_primary(11));
        let mut ctx = PassContext::new(crate::pipeline::CancellationToken::new());
        let result = pass().run(state, &mut ctx).unwrap();
        assert!(!result.rooms.is_empty());
        assert!(result.terrain.floor_count() > 0);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = pass()
            .run(DungeonState::new(80, 60, DungeonSeed::from_primary(21)), &mut PassContext::new(Default::default()))
            .unwrap();
        let b = pass()
            .run(DungeonState::new(80, 60, DungeonSeed::from_primary(21)), &mut PassContext::new(Default::default()))
            .unwrap();
        assert_eq!(a.terrain.floor_count(), b.terrain.floor_count());
        assert_eq!(a.rooms.len(), b.rooms.len());
    }
}
