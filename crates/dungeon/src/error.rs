//! Error codes surfaced by configuration validation, seed decoding, and
//! the generation pipeline itself.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DungeonError {
    #[error("generation config is invalid: {0}")]
    ConfigInvalid(String),

    #[error("grid dimension too small: {field} = {value}, minimum is {minimum}")]
    ConfigDimensionTooSmall {
        field: &'static str,
        value: i64,
        minimum: i64,
    },

    #[error("grid dimension too large: {field} = {value}, maximum is {maximum}")]
    ConfigDimensionTooLarge {
        field: &'static str,
        value: i64,
        maximum: i64,
    },

    #[error("room size config is invalid: {0}")]
    ConfigRoomSizeInvalid(String),

    #[error("seed share-code failed to decode")]
    SeedDecodeFailed,

    #[error("dungeon generation failed: {0}")]
    GenerationFailed(String),

    #[error("could not place room: {0}")]
    RoomPlacementFailed(String),

    #[error("could not connect rooms: {0}")]
    PathConnectionFailed(String),
}

impl DungeonError {
    /// The stable error code, for logging and client-side matching.
    pub fn code(&self) -> &'static str {
        match self {
            DungeonError::ConfigInvalid(_) => "CONFIG_INVALID",
            DungeonError::ConfigDimensionTooSmall { .. } => "CONFIG_DIMENSION_TOO_SMALL",
            DungeonError::ConfigDimensionTooLarge { .. } => "CONFIG_DIMENSION_TOO_LARGE",
            DungeonError::ConfigRoomSizeInvalid(_) => "CONFIG_ROOM_SIZE_INVALID",
            DungeonError::SeedDecodeFailed => "SEED_DECODE_FAILED",
            DungeonError::GenerationFailed(_) => "GENERATION_FAILED",
            DungeonError::RoomPlacementFailed(_) => "ROOM_PLACEMENT_FAILED",
            DungeonError::PathConnectionFailed(_) => "PATH_CONNECTION_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(DungeonError::SeedDecodeFailed.code(), "SEED_DECODE_FAILED");
        assert_eq!(
            DungeonError::ConfigDimensionTooSmall {
                field: "width",
                value: 1,
                minimum: 10
            }
            .code(),
            "CONFIG_DIMENSION_TOO_SMALL"
        );
    }
}
