//! Generation request configuration and its validation rules.

use serde::{Deserialize, Serialize};

use crate::error::DungeonError;

pub const MIN_DIMENSION: i64 = 10;
pub const MAX_DIMENSION: i64 = 10_000;
pub const MIN_ROOM_SIZE: i64 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSizeRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeneratorKind {
    Bsp(BspConfig),
    Cellular(CellularConfig),
    Hybrid(HybridConfig),
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BspConfig {
    pub min_partition_size: i64,
    pub max_split_depth: u32,
    pub corridor_width: i64,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            min_partition_size: 10,
            max_split_depth: 6,
            corridor_width: 1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellularConfig {
    pub fill_probability: f64,
    pub iterations: u32,
    pub birth_threshold: u32,
    pub survival_threshold: u32,
    pub keep_largest_region_only: bool,
}

impl Default for CellularConfig {
    fn default() -> Self {
        Self {
            fill_probability: 0.45,
            iterations: 5,
            birth_threshold: 5,
            survival_threshold: 4,
            keep_largest_region_only: true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    pub zone_count: u32,
    pub natural_ratio: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            zone_count: 2,
            natural_ratio: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    pub treasure_room_probability: f64,
    pub enemy_density: f64,
    pub item_density: f64,
    pub decoration_density: f64,
    pub trap_probability: f64,
    /// Global difficulty level, `[1, 10]`, used to pick which weighted
    /// templates a room's content is eligible to sample from.
    pub difficulty: u32,
    pub enable_treasure_rooms: bool,
    pub enable_traps: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            treasure_room_probability: 0.15,
            enemy_density: 0.1,
            item_density: 0.05,
            decoration_density: 0.2,
            trap_probability: 0.05,
            difficulty: 1,
            enable_treasure_rooms: true,
            enable_traps: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub width: i64,
    pub height: i64,
    pub room_count: i64,
    pub room_size_range: RoomSizeRange,
    pub generator: GeneratorKind,
    pub content: ContentConfig,
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), DungeonError> {
        if self.width < MIN_DIMENSION {
            return Err(DungeonError::ConfigDimensionTooSmall {
                field: "width",
                value: self.width,
                minimum: MIN_DIMENSION,
            });
        }
        if self.height < MIN_DIMENSION {
            return Err(DungeonError::ConfigDimensionTooSmall {
                field: "height",
                value: self.height,
                minimum: MIN_DIMENSION,
            });
        }
        if self.width > MAX_DIMENSION {
            return Err(DungeonError::ConfigDimensionTooLarge {
                field: "width",
                value: self.width,
                maximum: MAX_DIMENSION,
            });
        }
        if self.height > MAX_DIMENSION {
            return Err(DungeonError::ConfigDimensionTooLarge {
                field: "height",
                value: self.height,
                maximum: MAX_DIMENSION,
            });
        }

        if self.room_size_range.min < MIN_ROOM_SIZE {
            return Err(DungeonError::ConfigRoomSizeInvalid(format!(
                "room_size_range.min = {} is below the minimum of {MIN_ROOM_SIZE}",
                self.room_size_range.min
            )));
        }
        if self.room_size_range.max >= self.width || self.room_size_range.max >= self.height {
            return Err(DungeonError::ConfigRoomSizeInvalid(format!(
                "room_size_range.max = {} does not fit within a {}x{} grid",
                self.room_size_range.max, self.width, self.height
            )));
        }
        if self.room_size_range.min > self.room_size_range.max {
            return Err(DungeonError::ConfigRoomSizeInvalid(
                "room_size_range.min exceeds room_size_range.max".to_string(),
            ));
        }

        let max_rooms = (self.width * self.height) / 25;
        if self.room_count > max_rooms {
            return Err(DungeonError::ConfigInvalid(format!(
                "room_count = {} exceeds the {}x{} grid's capacity of {max_rooms}",
                self.room_count, self.width, self.height
            )));
        }
        if self.room_count < 1 {
            return Err(DungeonError::ConfigInvalid(
                "room_count must be at least 1".to_string(),
            ));
        }

        if self.content.difficulty < 1 || self.content.difficulty > 10 {
            return Err(DungeonError::ConfigInvalid(format!(
                "content.difficulty = {} is outside the [1, 10] range",
                self.content.difficulty
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> GenerationConfig {
        GenerationConfig {
            width: 80,
            height: 50,
            room_count: 10,
            room_size_range: RoomSizeRange { min: 4, max: 10 },
            generator: GeneratorKind::Bsp(BspConfig::default()),
            content: ContentConfig::default(),
        }
    }

    #[test]
    fn accepts_reasonable_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_too_small_dimension() {
        let mut cfg = base_config();
        cfg.width = 5;
        assert!(matches!(
            cfg.validate(),
            Err(DungeonError::ConfigDimensionTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_too_large_dimension() {
        let mut cfg = base_config();
        cfg.height = 20_000;
        assert!(matches!(
            cfg.validate(),
            Err(DungeonError::ConfigDimensionTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_room_max_not_fitting_grid() {
        let mut cfg = base_config();
        cfg.room_size_range.max = 200;
        assert!(matches!(
            cfg.validate(),
            Err(DungeonError::ConfigRoomSizeInvalid(_))
        ));
    }

    #[test]
    fn rejects_room_min_below_floor() {
        let mut cfg = base_config();
        cfg.room_size_range.min = 2;
        assert!(matches!(
            cfg.validate(),
            Err(DungeonError::ConfigRoomSizeInvalid(_))
        ));
    }

    #[test]
    fn rejects_room_count_above_density_cap() {
        let mut cfg = base_config();
        cfg.width = 10;
        cfg.height = 10;
        cfg.room_count = 10; // cap is floor(100/25) = 4
        assert!(matches!(cfg.validate(), Err(DungeonError::ConfigInvalid(_))));
    }

    #[test]
    fn rejects_difficulty_out_of_range() {
        let mut cfg = base_config();
        cfg.content.difficulty = 11;
        assert!(matches!(cfg.validate(), Err(DungeonError::ConfigInvalid(_))));
    }
}
