use anyhow::Result;
use dungeoncore_dungeon::{
    generate, BspConfig, ContentConfig, GenerationConfig, GeneratorKind, PipelineOptions, RoomSizeRange,
};
use dungeoncore_ecs::{Phase, PrefabBuilder, PrefabRegistry, Scheduler, World};
use dungeoncore_loader::DungeonLoader;

fn register_prefabs() -> PrefabRegistry {
    let mut prefabs = PrefabRegistry::new();
    prefabs
        .register("player", None, PrefabBuilder::new())
        .expect("player prefab registration");
    prefabs
        .register("goblin", None, PrefabBuilder::new())
        .expect("goblin prefab registration");
    prefabs
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!(version = dungeoncore_dungeon::VERSION, "dungeoncore starting");

    let config = GenerationConfig {
        width: 80,
        height: 50,
        room_count: 10,
        room_size_range: RoomSizeRange { min: 4, max: 10 },
        generator: GeneratorKind::Bsp(BspConfig::default()),
        content: ContentConfig::default(),
    };

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0xC0FFEE);

    let (artifact, metrics, report) = generate(
        &config,
        seed,
        dungeoncore_dungeon::TemplatePool::default(),
        PipelineOptions::default(),
    )
    .map_err(|err| anyhow::anyhow!("generation failed: {err}"))?;

    tracing::info!(
        seed,
        rooms = artifact.rooms.len(),
        connections = artifact.connections.len(),
        floor_ratio = metrics.spatial.floor_ratio,
        duration_ms = report.duration_ms,
        "dungeon generated"
    );

    let mut world = World::new();
    let prefabs = register_prefabs();
    let loader = DungeonLoader::new("player");
    let load_result = loader
        .load(artifact, &mut world, &prefabs)
        .map_err(|err| anyhow::anyhow!("world load failed: {err}"))?;

    tracing::info!(spawned = load_result.spawned.len(), "dungeon loaded into world");

    let mut scheduler = Scheduler::new();
    scheduler
        .add_system(
            "tick_logger",
            Phase::Update,
            &[],
            Box::new(|world: &mut World| {
                tracing::debug!(tick = world.tick(), "tick");
            }),
        )
        .expect("system registration");

    for _ in 0..5 {
        world.advance_tick();
        scheduler.run(&mut world).expect("scheduler run");
    }

    tracing::info!("runtime finished");
    Ok(())
}
