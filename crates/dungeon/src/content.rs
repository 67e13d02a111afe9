//! Populates a laid-out dungeon with spawn descriptors: treasure-room
//! designation, enemy/item/decoration placement by density, and corridor
//! traps. Runs after layout and connection passes, before validation.

use crate::artifact::{DungeonState, EntitySpawnDescriptor, RoomKind, SpawnPoint};
use crate::config::ContentConfig;
use crate::error::DungeonError;
use crate::pipeline::{Pass, PassContext};
use crate::trace::DecisionEvent;

pub struct ContentPass {
    pub config: ContentConfig,
    pub templates: TemplatePool,
}

/// Weighted template pools the content pass samples from, keyed by the
/// rough difficulty window a spawn falls in (distance-from-entrance
/// bucketed low/mid/high).
#[derive(Clone, Debug, Default)]
pub struct TemplatePool {
    pub enemies: Vec<WeightedTemplate>,
    pub items: Vec<WeightedTemplate>,
    pub decorations: Vec<WeightedTemplate>,
    pub traps: Vec<WeightedTemplate>,
}

#[derive(Clone, Debug)]
pub struct WeightedTemplate {
    pub template_id: String,
    pub weight: f64,
    pub min_difficulty: u32,
    pub max_difficulty: u32,
}

fn sample_weighted<'a>(
    rng: &mut crate::prng::Rng,
    pool: &'a [WeightedTemplate],
    difficulty: u32,
) -> Option<&'a WeightedTemplate> {
    let eligible: Vec<&WeightedTemplate> = pool
        .iter()
        .filter(|t| difficulty >= t.min_difficulty && difficulty <= t.max_difficulty)
        .collect();
    if eligible.is_empty() {
        return None;
    }
    let total: f64 = eligible.iter().map(|t| t.weight).sum();
    if total <= 0.0 {
        return eligible.first().copied();
    }
    let mut roll = rng.gen_range_f64(0.0, total);
    for template in &eligible {
        if roll < template.weight {
            return Some(template);
        }
        roll -= template.weight;
    }
    eligible.last().copied()
}

impl Pass for ContentPass {
    fn id(&self) -> &'static str {
        "content"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut PassContext) -> Result<DungeonState, DungeonError> {
        let mut rng = state.seed.details_rng();

        if let Some(entrance) = state.rooms.first().map(|r| r.id) {
            if let Some(room) = state.rooms.iter_mut().find(|r| r.id == entrance) {
                room.kind = RoomKind::Entrance;
            }
        }

        let non_entrance_ids: Vec<u32> = state
            .rooms
            .iter()
            .filter(|r| !matches!(r.kind, RoomKind::Entrance))
            .map(|r| r.id)
            .collect();

        if self.config.enable_treasure_rooms {
            for room_id in &non_entrance_ids {
                if rng.chance(self.config.treasure_room_probability) {
                    if let Some(room) = state.rooms.iter_mut().find(|r| r.id == *room_id) {
                        room.kind = RoomKind::Treasure;
                    }
                    ctx.trace.record(DecisionEvent::new(
                        self.id(),
                        format!("room {room_id} treasure?"),
                        "yes",
                        "passed treasure_room_probability roll",
                    ));
                }
            }
        }

        let max_difficulty = 10;
        let rooms_snapshot = state.rooms.clone();
        for room in &rooms_snapshot {
            let difficulty = room
                .distance_from_entrance
                .unwrap_or(self.config.difficulty)
                .clamp(1, max_difficulty);
            let area = (room.width * room.height) as f64;

            if matches!(room.kind, RoomKind::Treasure) {
                let guardian_count = rng.gen_range_i64(1, 3);
                for _ in 0..guardian_count {
                    if let Some(template) = sample_weighted(&mut rng, &self.templates.enemies, max_difficulty) {
                        push_spawn(&mut state.spawns, room.id, template, room, &mut rng, &["enemy", "guardian"]);
                    }
                }

                let rare_item_count = rng.gen_range_i64(3, 6);
                for _ in 0..rare_item_count {
                    if let Some(template) = sample_weighted(&mut rng, &self.templates.items, max_difficulty) {
                        push_spawn(&mut state.spawns, room.id, template, room, &mut rng, &["item", "rare", "treasure"]);
                    }
                }
                continue;
            }

            let enemy_base = (area / 30.0).floor() * self.config.enemy_density;
            let enemy_count = (enemy_base * rng.gen_range_f64(0.5, 1.0)).round() as u32;
            for _ in 0..enemy_count {
                if let Some(template) = sample_weighted(&mut rng, &self.templates.enemies, difficulty) {
                    push_spawn(&mut state.spawns, room.id, template, room, &mut rng, &["enemy"]);
                }
            }

            let item_base = (area / 50.0).floor() * self.config.item_density;
            let item_count = (item_base * rng.gen_range_f64(0.3, 1.0)).round() as u32;
            for _ in 0..item_count {
                if let Some(template) = sample_weighted(&mut rng, &self.templates.items, difficulty) {
                    push_spawn(&mut state.spawns, room.id, template, room, &mut rng, &["item"]);
                }
            }

            let decoration_count = (area * self.config.decoration_density).round() as u32;
            for _ in 0..decoration_count {
                if let Some(template) = sample_weighted(&mut rng, &self.templates.decorations, difficulty) {
                    push_spawn(&mut state.spawns, room.id, template, room, &mut rng, &["decoration"]);
                }
            }
        }

        if self.config.enable_traps {
            for connection in &state.connections.clone() {
                if rng.chance(self.config.trap_probability) {
                    if let Some(template) = sample_weighted(&mut rng, &self.templates.traps, 0) {
                        if let Some(&(x, y)) = connection.path.get(connection.path.len() / 2) {
                            state.spawns.push(SpawnPoint {
                                room_id: connection.from_room_id,
                                descriptor: EntitySpawnDescriptor {
                                    template_id: template.template_id.clone(),
                                    position: (x, y),
                                    tags: vec!["trap".to_string()],
                                    metadata: None,
                                    weight: Some(template.weight),
                                    distance_from_start: None,
                                },
                            });
                        }
                    }
                }
            }
        }

        Ok(state)
    }
}

fn push_spawn(
    spawns: &mut Vec<SpawnPoint>,
    room_id: u32,
    template: &WeightedTemplate,
    room: &crate::artifact::Room,
    rng: &mut crate::prng::Rng,
    tags: &[&str],
) {
    let x = rng.gen_range_i64(room.x + 1, (room.x + room.width - 2).max(room.x + 1));
    let y = rng.gen_range_i64(room.y + 1, (room.y + room.height - 2).max(room.y + 1));
    spawns.push(SpawnPoint {
        room_id,
        descriptor: EntitySpawnDescriptor {
            template_id: template.template_id.clone(),
            position: (x, y),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            metadata: None,
            weight: Some(template.weight),
            distance_from_start: room.distance_from_entrance,
        },
    });
}
