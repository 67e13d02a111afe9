pub mod artifact;
pub mod config;
pub mod content;
pub mod encoding;
pub mod error;
pub mod generators;
pub mod grid;
pub mod metrics;
pub mod pipeline;
pub mod prng;
pub mod result;
pub mod seed;
pub mod trace;
pub mod validator;

pub use artifact::{Connection, ConnectionKind, DungeonArtifact, DungeonState, EntitySpawnDescriptor, Room, RoomKind, SpawnPoint};
pub use config::{BspConfig, CellularConfig, ContentConfig, GenerationConfig, GeneratorKind, HybridConfig, RoomSizeRange};
pub use content::{ContentPass, TemplatePool, WeightedTemplate};
pub use error::DungeonError;
pub use grid::Grid;
pub use metrics::DungeonMetrics;
pub use pipeline::{CancellationToken, DungeonSnapshot, Pass, PassContext, Pipeline, PipelineOptions, PipelineReport};
pub use prng::{Rng, RngState};
pub use result::{DungeonResult, ResultExt};
pub use seed::DungeonSeed;
pub use trace::{DecisionEvent, DecisionTrace};
pub use validator::{InvariantValidator, ValidationProfile, ValidationReport};

use generators::bsp::BspPass;
use generators::cellular::CellularPass;
use generators::hybrid::HybridPass;

/// Run a full generation request end to end: validate the config, build
/// and execute the layout/content pipeline, validate invariants, and
/// return the frozen artifact alongside its metrics and decision trace.
pub fn generate(
    config: &GenerationConfig,
    primary_seed: u64,
    templates: TemplatePool,
    options: PipelineOptions,
) -> DungeonResult<(DungeonArtifact, DungeonMetrics, PipelineReport)> {
    config.validate()?;

    let seed = DungeonSeed::from_primary(primary_seed as u32);
    let state = DungeonState::new(config.width, config.height, seed);

    let layout_pass: Box<dyn Pass> = match &config.generator {
        GeneratorKind::Bsp(bsp_config) => Box::new(BspPass {
            config: *bsp_config,
            room_count_target: config.room_count,
            room_min: config.room_size_range.min,
            room_max: config.room_size_range.max,
        }),
        GeneratorKind::Cellular(cellular_config) => Box::new(CellularPass {
            config: *cellular_config,
        }),
        GeneratorKind::Hybrid(hybrid_config) => Box::new(HybridPass {
            config: *hybrid_config,
            bsp_config: BspConfig::default(),
            cellular_config: CellularConfig::default(),
            room_count_target: config.room_count,
            room_min: config.room_size_range.min,
            room_max: config.room_size_range.max,
        }),
    };

    let pipeline = Pipeline::new()
        .add_pass(layout_pass)
        .add_pass(Box::new(ContentPass {
            config: config.content.clone(),
            templates,
        }));

    let (state, report) = pipeline.run(state, options, CancellationToken::new());
    let state = state.ok_or_else(|| {
        report
            .error
            .clone()
            .unwrap_or_else(|| DungeonError::GenerationFailed("pipeline produced no state".to_string()))
    })?;

    let validation = InvariantValidator::default().validate(&state);
    if !validation.valid() {
        tracing::warn!(?validation, "generated dungeon failed invariant validation");
        return Err(DungeonError::GenerationFailed(format!(
            "invariant validation failed: {} room issues, {} connection issues, {} reachability issues",
            validation.rooms.len(),
            validation.connections.len(),
            validation.reachability.len()
        )));
    }

    let artifact = state.into_artifact();
    let metrics = DungeonMetrics::collect(&artifact);
    Ok((artifact, metrics, report))
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerationConfig {
        GenerationConfig {
            width: 60,
            height: 40,
            room_count: 6,
            room_size_range: RoomSizeRange { min: 4, max: 9 },
            generator: GeneratorKind::Bsp(BspConfig::default()),
            content: ContentConfig::default(),
        }
    }

    #[test]
    fn end_to_end_generation_produces_valid_artifact() {
        let (artifact, metrics, report) =
            generate(&config(), 12345, TemplatePool::default(), PipelineOptions::default()).unwrap();
        assert!(report.success);
        assert!(!artifact.rooms.is_empty());
        assert!(metrics.spatial.floor_ratio > 0.0);
    }

    #[test]
    fn same_seed_produces_identical_checksum() {
        let (a, _, _) = generate(&config(), 555, TemplatePool::default(), PipelineOptions::default()).unwrap();
        let (b, _, _) = generate(&config(), 555, TemplatePool::default(), PipelineOptions::default()).unwrap();
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn invalid_config_is_rejected_before_generation() {
        let mut bad = config();
        bad.width = 1;
        assert!(generate(&bad, 1, TemplatePool::default(), PipelineOptions::default()).is_err());
    }
}
