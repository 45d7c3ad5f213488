//! File-driven reloads applied by the engine between frames

use serde::Deserialize;
use sim_engine::ecs::components::TransformComponent;
use sim_engine::ecs::systems::{BoundaryMode, BoundarySystem};
use sim_engine::foundation::time::ManualClock;
use sim_engine::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize)]
struct Bounds {
    width: f32,
    height: f32,
    mode: BoundaryMode,
}

struct BoundsReloader {
    dir: PathBuf,
}

impl ReloadHandler for BoundsReloader {
    fn handles(&self, change: &Change) -> bool {
        change.id == "bounds.ron" && change.kind != ChangeKind::Removed
    }

    fn apply(&mut self, change: &Change, _scene: &mut Scene, world: &mut World) -> Result<(), ReloadError> {
        let path = self.dir.join(&change.id);
        let text = fs::read_to_string(&path).map_err(|source| ReloadError::Io { path, source })?;
        let bounds: Bounds = ron::from_str(&text).map_err(|error| ReloadError::handler(&change.id, error))?;
        let system = BoundarySystem::new(Vec2::new(bounds.width, bounds.height), bounds.mode);
        world.replace_system("BoundarySystem", Box::new(system))?;
        Ok(())
    }
}

struct Headless;

impl Application for Headless {}

#[test]
fn test_reload_swaps_system_and_isolates_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = FileWatcher::with_extensions(dir.path(), ["ron"]).unwrap();
    let reload = HotReload::new(watcher, Logger::disabled())
        .with_handler(BoundsReloader { dir: dir.path().to_path_buf() });

    let clock = ManualClock::new();
    let config = EngineConfig::default().with_tick_rate(50.0).with_log_level("off");
    let mut engine: Engine = Engine::builder(config)
        .with_clock(clock.clone())
        .with_hot_reload(reload)
        .build()
        .unwrap();

    let ship = engine.world_mut().create_entity();
    engine.world_mut().add_component(ship, TransformComponent::from_position(Vec2::new(500.0, 500.0))).unwrap();
    engine.world_mut().add_system(BoundarySystem::default());
    engine.start().unwrap();
    let position = |engine: &Engine| engine.world().get_component::<TransformComponent>(ship).unwrap().position;

    clock.push(Duration::from_millis(20));
    let frame = engine.run_frame(&mut Headless).unwrap();
    assert_eq!(frame.ticks_run, 1);
    assert_eq!(position(&engine), Vec2::new(500.0, 500.0));

    fs::write(dir.path().join("bounds.ron"), "(width: 100.0, height: 50.0, mode: clamp)").unwrap();
    clock.push(Duration::from_millis(20));
    let frame = engine.run_frame(&mut Headless).unwrap();
    assert_eq!(frame.reload_failures, 0);
    assert_eq!(position(&engine), Vec2::new(100.0, 50.0));

    fs::write(dir.path().join("bounds.ron"), "(width: oops").unwrap();
    engine.world_mut().get_component_mut::<TransformComponent>(ship).unwrap().position = Vec2::new(500.0, 500.0);
    clock.push(Duration::from_millis(20));
    let frame = engine.run_frame(&mut Headless).unwrap();
    assert_eq!(frame.reload_failures, 1);
    assert_eq!(engine.state(), EngineState::Running);
    // The clamp from the last good reload is still installed
    assert_eq!(position(&engine), Vec2::new(100.0, 50.0));
    assert_eq!(engine.world().system_names(), vec!["BoundarySystem"]);
}
