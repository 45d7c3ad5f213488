//! Asteroids game logic
//!
//! The ship and its bullets live in the scene; asteroids live in the ECS
//! world and are moved, wrapped and despawned by engine systems. Collisions,
//! scoring, lives and waves are resolved here once per tick, before the
//! scene and the world update.

use crate::components::{Asteroid, AsteroidSize, Bullet, ShipController, ShipSettings, BULLET_TAG};
use crate::config::GameConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sim_engine::core::TickContext;
use sim_engine::ecs::components::{HealthComponent, SpriteComponent, TransformComponent, VelocityComponent};
use sim_engine::ecs::systems::{BoundaryMode, BoundarySystem, HealthSystem, MovementSystem};
use sim_engine::ecs::{EcsError, Entity, World};
use sim_engine::foundation::math::{Vec2, Vec2Ext};
use sim_engine::input::InputEvent;
use sim_engine::render::Color;
use sim_engine::scene::{ObjectId, Scene};
use sim_engine::transform::Pose2;
use sim_engine::{AppError, Application, Engine, FrameReport};

/// Ship collision radius
const SHIP_RADIUS: f32 = 10.0;

/// Minimum distance between the ship and a freshly spawned asteroid
const SAFE_SPAWN_DISTANCE: f32 = 150.0;

/// Asteroids application
#[derive(Debug)]
pub struct AsteroidsGame {
    config: GameConfig,
    rng: StdRng,
    ship: Option<ObjectId>,
    lives: u32,
    score: u32,
    wave: u32,
    destroyed: u32,
}

impl AsteroidsGame {
    /// Create a game from configuration
    pub fn new(config: GameConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.gameplay.seed);
        let lives = config.gameplay.starting_lives;
        Self { config, rng, ship: None, lives, score: 0, wave: 0, destroyed: 0 }
    }

    /// Current score
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Lives left
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Waves cleared so far
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Asteroids broken so far
    pub fn asteroids_destroyed(&self) -> u32 {
        self.destroyed
    }

    /// Whether the ship ran out of lives
    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    /// Scene object of the ship, once spawned
    pub fn ship(&self) -> Option<ObjectId> {
        self.ship
    }

    fn center(&self) -> Vec2 {
        self.config.gameplay.world_size() * 0.5
    }

    fn ship_settings(&self) -> ShipSettings {
        let gameplay = &self.config.gameplay;
        ShipSettings {
            acceleration: gameplay.ship_acceleration,
            max_speed: gameplay.ship_max_speed,
            rotation_speed: gameplay.ship_rotation_speed,
            bullet_speed: gameplay.bullet_speed,
            bullet_lifetime: gameplay.bullet_lifetime,
            fire_cooldown: gameplay.fire_cooldown,
            bounds: gameplay.world_size(),
        }
    }

    /// Place the ship at the playfield center
    pub fn spawn_ship(&mut self, scene: &mut Scene) -> Result<ObjectId, AppError> {
        let ship = scene.spawn_at("ship", Pose2::from_position(self.center()));
        let controller = ShipController::new(self.ship_settings(), self.config.controls.action_map());
        scene.add_component(ship, controller)?;
        self.ship = Some(ship);
        Ok(ship)
    }

    /// Create one asteroid entity
    pub fn spawn_asteroid(
        &mut self,
        world: &mut World,
        size: AsteroidSize,
        position: Vec2,
        velocity: Vec2,
    ) -> Result<Entity, EcsError> {
        let entity = world.create_entity();
        let heading = self.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
        let spin = self.rng.gen_range(-1.0..1.0);
        world.add_component(entity, TransformComponent::from_position_rotation(position, heading))?;
        world.add_component(entity, VelocityComponent::new(velocity).with_angular(spin))?;
        world.add_component(entity, SpriteComponent::new(size.outline(entity.index()), Color::rgb(0.7, 0.7, 0.7)))?;
        world.add_component(entity, HealthComponent::new(size.health()))?;
        world.add_component(entity, Asteroid { size })?;
        Ok(entity)
    }

    fn start_wave(&mut self, world: &mut World) -> Result<(), EcsError> {
        let count = self.config.gameplay.asteroid_count + self.wave;
        let bounds = self.config.gameplay.world_size();
        let center = self.center();
        for _ in 0..count {
            let mut position = Vec2::new(self.rng.gen_range(0.0..bounds.x), self.rng.gen_range(0.0..bounds.y));
            // Push spawns that land on the ship out to the safe ring
            if (position - center).magnitude() < SAFE_SPAWN_DISTANCE {
                let direction = (position - center).normalize_or_zero();
                let direction = if direction == Vec2::zeros() { Vec2::new(1.0, 0.0) } else { direction };
                position = center + direction * SAFE_SPAWN_DISTANCE;
            }
            let angle = self.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
            let speed = self.rng.gen_range(30.0..80.0);
            self.spawn_asteroid(world, AsteroidSize::Large, position, Vec2::from_angle(angle, speed))?;
        }
        log::info!("Wave {} started with {count} asteroids", self.wave + 1);
        Ok(())
    }

    fn split(&mut self, world: &mut World, parent: Entity, size: AsteroidSize, position: Vec2) -> Result<(), EcsError> {
        let Some(child) = size.split_into() else {
            return Ok(());
        };
        let base = world.get_component::<VelocityComponent>(parent).map_or_else(Vec2::zeros, |v| v.linear);
        for side in [-1.0_f32, 1.0] {
            let deflection = side * self.rng.gen_range(0.3..0.9);
            let velocity = base.rotated(deflection) * 1.4;
            self.spawn_asteroid(world, child, position, velocity)?;
        }
        Ok(())
    }

    fn live_asteroids(world: &World) -> Vec<(Entity, Vec2, AsteroidSize)> {
        world
            .query::<(TransformComponent, Asteroid, HealthComponent)>()
            .filter(|(_, (_, _, health))| !health.is_dead())
            .map(|(entity, (transform, asteroid, _))| (entity, transform.position, asteroid.size))
            .collect()
    }

    fn resolve_bullet_hits(
        &mut self,
        scene: &mut Scene,
        world: &mut World,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), AppError> {
        let targets = Self::live_asteroids(world);
        let bullets: Vec<(ObjectId, Vec2)> = scene
            .find_with_tag(BULLET_TAG)
            .filter_map(|id| scene.world_pose(id).map(|pose| (id, pose.position)))
            .collect();

        for (bullet, position) in bullets {
            for &(entity, center, size) in &targets {
                if (position - center).magnitude() > size.radius() + Bullet::RADIUS {
                    continue;
                }
                let Some(health) = world.get_component_mut::<HealthComponent>(entity) else {
                    continue;
                };
                if health.is_dead() {
                    continue;
                }
                health.take_damage(1.0);
                let broken = health.is_dead();
                scene.destroy(bullet)?;
                if broken {
                    self.score += size.points();
                    self.destroyed += 1;
                    ctx.play_sound("explosion");
                    self.split(world, entity, size, center)?;
                } else {
                    ctx.play_sound("hit");
                }
                break;
            }
        }
        Ok(())
    }

    fn resolve_ship_hits(&mut self, scene: &mut Scene, world: &World, ctx: &mut TickContext<'_>) -> Result<(), AppError> {
        let Some(ship) = self.ship else {
            return Ok(());
        };
        if self.is_game_over() || scene.get_component::<ShipController>(ship).map_or(true, ShipController::is_invulnerable) {
            return Ok(());
        }
        let Some(pose) = scene.world_pose(ship) else {
            return Ok(());
        };
        let hit = Self::live_asteroids(world)
            .iter()
            .any(|&(_, center, size)| (pose.position - center).magnitude() < size.radius() + SHIP_RADIUS);
        if !hit {
            return Ok(());
        }

        self.lives -= 1;
        ctx.play_sound("ship_destroyed");
        if self.lives == 0 {
            log::info!("Game over at tick {} with score {}", ctx.tick, self.score);
            ctx.request_stop();
            return Ok(());
        }

        let speed = scene.get_component::<ShipController>(ship).map_or(0.0, |c| c.velocity().magnitude());
        log::debug!("Ship destroyed at speed {speed:.1}, {} lives left", self.lives);
        let transform = scene.get(ship).map(|object| object.transform());
        if let Some(transform) = transform {
            scene
                .transforms_mut()
                .set_local(transform, Pose2::from_position(self.center()))
                .map_err(|e| AppError::GameLogic(e.to_string()))?;
        }
        if let Some(controller) = scene.get_component_mut::<ShipController>(ship) {
            controller.respawn(self.config.gameplay.respawn_grace);
        }
        Ok(())
    }
}

impl Application for AsteroidsGame {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let bounds = self.config.gameplay.world_size();
        let (scene, world) = engine.scene_and_world_mut();
        self.spawn_ship(scene)?;
        world.add_system(MovementSystem::new());
        world.add_system(BoundarySystem::new(bounds, BoundaryMode::Wrap));
        world.add_system(HealthSystem::new());
        self.start_wave(world)?;
        log::info!("Asteroids initialized with {} lives", self.lives);
        Ok(())
    }

    fn fixed_update(&mut self, scene: &mut Scene, world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), AppError> {
        self.resolve_bullet_hits(scene, world, ctx)?;
        self.resolve_ship_hits(scene, world, ctx)?;
        if !self.is_game_over() && Self::live_asteroids(world).is_empty() {
            self.wave += 1;
            self.start_wave(world)?;
        }
        Ok(())
    }

    fn on_frame(&mut self, engine: &mut Engine, frame: &FrameReport) -> Result<(), AppError> {
        let every = self.config.demo.report_every.max(1);
        if frame.frame % every == 0 {
            log::info!(
                "frame {}: score {} lives {} wave {} | {} entities, {} objects, {} draw commands",
                frame.frame,
                self.score,
                self.lives,
                self.wave + 1,
                engine.world().entity_count(),
                engine.scene().object_count(),
                frame.draw_commands
            );
        }
        if frame.isolated_errors + frame.structural_errors > 0 {
            log::warn!(
                "frame {}: {} isolated and {} structural failures",
                frame.frame,
                frame.isolated_errors,
                frame.structural_errors
            );
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let shots = self
            .ship()
            .and_then(|ship| engine.scene().get_component::<ShipController>(ship))
            .map_or(0, ShipController::shots_fired);
        log::info!(
            "Final score {} after {} ticks ({} shots, {} asteroids destroyed, {} lives left)",
            self.score,
            engine.tick_count(),
            shots,
            self.destroyed,
            self.lives
        );
    }
}

/// Scripted pilot for headless runs
///
/// Holds thrust in bursts, turns in alternating arcs and taps fire on a
/// fixed rhythm, so every run with the same seed plays out the same way.
pub fn autopilot(frames: u64) -> Vec<Vec<InputEvent>> {
    use sim_engine::input::KeyCode;

    (0..frames)
        .map(|frame| {
            let mut events = Vec::new();
            match frame % 240 {
                0 => events.push(InputEvent::KeyPressed(KeyCode::W)),
                40 => events.push(InputEvent::KeyReleased(KeyCode::W)),
                60 => events.push(InputEvent::KeyPressed(KeyCode::A)),
                100 => events.push(InputEvent::KeyReleased(KeyCode::A)),
                150 => events.push(InputEvent::KeyPressed(KeyCode::D)),
                170 => events.push(InputEvent::KeyReleased(KeyCode::D)),
                _ => {}
            }
            match frame % 20 {
                0 => events.push(InputEvent::KeyPressed(KeyCode::Space)),
                1 => events.push(InputEvent::KeyReleased(KeyCode::Space)),
                _ => {}
            }
            events
        })
        .collect()
}
