//! Game-specific components
//!
//! Asteroids are ECS data; the ship and its bullets are scene objects with
//! behaviour components.

use serde::{Deserialize, Serialize};
use sim_engine::ecs::Component as EcsComponent;
use sim_engine::foundation::math::{Vec2, Vec2Ext};
use sim_engine::input::ActionMap;
use sim_engine::render::{Color, DrawList, Shape};
use sim_engine::scene::{Component, ComponentError, UpdateContext};
use sim_engine::transform::Pose2;

/// Archetype name used for pooled bullets
pub const BULLET_ARCHETYPE: &str = "bullet";

/// Tag carried by every live bullet
pub const BULLET_TAG: &str = "bullet";

/// Asteroid size category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsteroidSize {
    /// Large asteroid (splits into medium)
    Large,
    /// Medium asteroid (splits into small)
    Medium,
    /// Small asteroid (destroyed completely)
    Small,
}

impl AsteroidSize {
    /// Get the scale factor for this size
    pub fn scale_factor(self) -> f32 {
        match self {
            Self::Large => 1.0,
            Self::Medium => 0.6,
            Self::Small => 0.3,
        }
    }

    /// Collision radius
    pub fn radius(self) -> f32 {
        40.0 * self.scale_factor()
    }

    /// Score awarded for destroying it
    pub fn points(self) -> u32 {
        match self {
            Self::Large => 20,
            Self::Medium => 50,
            Self::Small => 100,
        }
    }

    /// Hits it takes to break
    pub fn health(self) -> f32 {
        match self {
            Self::Large => 3.0,
            Self::Medium => 2.0,
            Self::Small => 1.0,
        }
    }

    /// Get the size it splits into when destroyed
    pub fn split_into(self) -> Option<Self> {
        match self {
            Self::Large => Some(Self::Medium),
            Self::Medium => Some(Self::Small),
            Self::Small => None,
        }
    }

    /// Outline used for drawing, jagged by `seed`
    pub fn outline(self, seed: u32) -> Shape {
        const CORNERS: u32 = 9;
        let radius = self.radius();
        let points = (0..CORNERS)
            .map(|i| {
                let angle = i as f32 / CORNERS as f32 * std::f32::consts::TAU;
                let jag = 0.8 + 0.2 * ((seed.wrapping_mul(31).wrapping_add(i * 17) % 7) as f32 / 6.0);
                Vec2::from_angle(angle, radius * jag)
            })
            .collect();
        Shape::Polygon { points }
    }
}

/// Asteroid marker stored in the ECS world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asteroid {
    /// Size category
    pub size: AsteroidSize,
}

impl EcsComponent for Asteroid {}

/// Ship tuning shared by the controller and the game
#[derive(Debug, Clone)]
pub struct ShipSettings {
    /// Thrust acceleration
    pub acceleration: f32,
    /// Speed cap
    pub max_speed: f32,
    /// Turn rate in radians per second
    pub rotation_speed: f32,
    /// Muzzle speed of bullets
    pub bullet_speed: f32,
    /// Seconds a bullet lives
    pub bullet_lifetime: f32,
    /// Seconds between shots
    pub fire_cooldown: f32,
    /// Playfield size, used for wrapping
    pub bounds: Vec2,
}

/// Player ship behaviour
///
/// Reads actions through an [`ActionMap`], integrates its own velocity and
/// wraps around the playfield. Firing spawns a pooled bullet at the end of
/// the tick.
#[derive(Debug)]
pub struct ShipController {
    settings: ShipSettings,
    actions: ActionMap,
    velocity: Vec2,
    cooldown: f32,
    invulnerable: f32,
    thrusting: bool,
    shots_fired: u32,
}

impl ShipController {
    /// Ship controller
    pub fn new(settings: ShipSettings, actions: ActionMap) -> Self {
        Self {
            settings,
            actions,
            velocity: Vec2::zeros(),
            cooldown: 0.0,
            invulnerable: 0.0,
            thrusting: false,
            shots_fired: 0,
        }
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Bullets fired so far
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    /// Whether collisions are currently ignored
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    /// Stop the ship and ignore collisions for `grace` seconds
    pub fn respawn(&mut self, grace: f32) {
        self.velocity = Vec2::zeros();
        self.cooldown = 0.0;
        self.invulnerable = grace;
    }

    fn wrap(&self, position: Vec2) -> Vec2 {
        let bounds = self.settings.bounds;
        Vec2::new(position.x.rem_euclid(bounds.x), position.y.rem_euclid(bounds.y))
    }

    fn fire(&mut self, ctx: &mut UpdateContext<'_, Pose2>, pose: Pose2) {
        let direction = pose.forward();
        let muzzle = Pose2::from_position(pose.position + direction * 12.0).with_rotation(pose.rotation());
        let bullet = Bullet::new(direction * self.settings.bullet_speed + self.velocity, self.settings.bullet_lifetime);
        let bounds = self.settings.bounds;
        ctx.spawn(move |scene| {
            let id = scene.instantiate_at(BULLET_ARCHETYPE, "bullet", muzzle);
            if let Some(object) = scene.get_mut(id) {
                object.add_tag(BULLET_TAG);
            }
            scene.add_component(id, bullet.within(bounds))?;
            Ok(())
        });
        ctx.play_sound("fire");
        self.cooldown = self.settings.fire_cooldown;
        self.shots_fired += 1;
    }
}

impl Component<Pose2> for ShipController {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
        let dt = ctx.delta_time();
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.invulnerable = (self.invulnerable - dt).max(0.0);

        let (turn, thrust, fire) = {
            let input = ctx.input();
            let turn = match (self.actions.is_action_held(input, "left"), self.actions.is_action_held(input, "right")) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            };
            (turn, self.actions.is_action_held(input, "thrust"), self.actions.was_action_pressed(input, "fire"))
        };
        if turn != 0.0 {
            ctx.rotate(turn * self.settings.rotation_speed * dt)?;
        }

        let pose = ctx.local_pose()?;
        self.thrusting = thrust;
        if self.thrusting {
            self.velocity += pose.forward() * self.settings.acceleration * dt;
            let speed = self.velocity.magnitude();
            if speed > self.settings.max_speed {
                self.velocity *= self.settings.max_speed / speed;
            }
        }
        ctx.set_position(self.wrap(pose.position + self.velocity * dt))?;

        if fire && self.cooldown <= 0.0 {
            let pose = ctx.local_pose()?;
            self.fire(ctx, pose);
        }
        Ok(())
    }

    fn draw(&self, world: &Pose2, out: &mut DrawList<Pose2>) {
        let color = if self.is_invulnerable() { Color::WHITE.with_alpha(0.5) } else { Color::WHITE };
        out.push(*world, Shape::Triangle { size: Vec2::new(24.0, 16.0) }, color);
        if self.thrusting {
            let flame = Pose2::from_position(world.position - world.forward() * 14.0)
                .with_rotation(world.rotation() + std::f32::consts::PI);
            out.push(flame, Shape::Triangle { size: Vec2::new(8.0, 6.0) }, Color::YELLOW);
        }
    }
}

/// Bullet behaviour: straight flight until it expires
#[derive(Debug, Clone)]
pub struct Bullet {
    velocity: Vec2,
    remaining: f32,
    bounds: Option<Vec2>,
}

impl Bullet {
    /// Bullet flying at `velocity` for `lifetime` seconds
    pub fn new(velocity: Vec2, lifetime: f32) -> Self {
        Self { velocity, remaining: lifetime, bounds: None }
    }

    /// Builder pattern: wrap around a playfield
    pub fn within(mut self, bounds: Vec2) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Collision radius
    pub const RADIUS: f32 = 2.0;
}

impl Component<Pose2> for Bullet {
    fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
        self.remaining -= ctx.delta_time();
        if self.remaining <= 0.0 {
            ctx.destroy_owner()?;
            return Ok(());
        }
        let position = ctx.local_pose()?.position + self.velocity * ctx.delta_time();
        let position = match self.bounds {
            Some(bounds) => Vec2::new(position.x.rem_euclid(bounds.x), position.y.rem_euclid(bounds.y)),
            None => position,
        };
        ctx.set_position(position)?;
        Ok(())
    }

    fn draw(&self, world: &Pose2, out: &mut DrawList<Pose2>) {
        out.push(Pose2::from_position(world.position), Shape::Circle { radius: Self::RADIUS }, Color::YELLOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_engine::core::TickResources;
    use sim_engine::foundation::logging::Logger;
    use sim_engine::input::{InputEvent, InputState, KeyCode};
    use sim_engine::scene::Scene;
    use std::time::Duration;

    fn settings() -> ShipSettings {
        ShipSettings {
            acceleration: 100.0,
            max_speed: 50.0,
            rotation_speed: 1.0,
            bullet_speed: 200.0,
            bullet_lifetime: 0.05,
            fire_cooldown: 1.0,
            bounds: Vec2::new(100.0, 100.0),
        }
    }

    fn actions() -> ActionMap {
        ActionMap::new()
            .with_binding("thrust", [KeyCode::W])
            .with_binding("left", [KeyCode::A])
            .with_binding("right", [KeyCode::D])
            .with_binding("fire", [KeyCode::Space])
    }

    #[test]
    fn test_size_progression() {
        assert_eq!(AsteroidSize::Large.split_into(), Some(AsteroidSize::Medium));
        assert_eq!(AsteroidSize::Small.split_into(), None);
        assert!(AsteroidSize::Small.points() > AsteroidSize::Large.points());
        assert!(AsteroidSize::Small.radius() < AsteroidSize::Medium.radius());
    }

    #[test]
    fn test_ship_fires_pooled_bullet_after_tick() {
        let mut scene: Scene = Scene::new("test", Logger::disabled());
        let ship = scene.spawn_at("ship", Pose2::from_position(Vec2::new(50.0, 50.0)));
        scene.add_component(ship, ShipController::new(settings(), actions())).unwrap();

        let mut input = InputState::new();
        input.handle_event(InputEvent::KeyPressed(KeyCode::Space));
        let snapshot = input.snapshot();
        let mut resources = TickResources::new();
        resources.input = snapshot;
        let mut ctx = resources.context(Duration::from_millis(10));
        scene.update(&mut ctx).unwrap();
        drop(ctx);

        let bullets: Vec<_> = scene.find_with_tag(BULLET_TAG).collect();
        assert_eq!(bullets.len(), 1);
        assert_eq!(resources.sounds.len(), 1);
        let controller = scene.get_component::<ShipController>(ship).unwrap();
        assert_eq!(controller.shots_fired(), 1);
    }

    #[test]
    fn test_thrust_respects_speed_cap_and_wraps() {
        let mut scene: Scene = Scene::new("test", Logger::disabled());
        let ship = scene.spawn_at("ship", Pose2::from_position(Vec2::new(99.0, 50.0)));
        scene.add_component(ship, ShipController::new(settings(), actions())).unwrap();

        let mut input = InputState::new();
        input.handle_event(InputEvent::KeyPressed(KeyCode::W));
        let mut resources = TickResources::new();
        for _ in 0..100 {
            resources.input = input.snapshot();
            let mut ctx = resources.context(Duration::from_millis(10));
            scene.update(&mut ctx).unwrap();
        }

        let controller = scene.get_component::<ShipController>(ship).unwrap();
        assert!(controller.velocity().magnitude() <= 50.0 + 1e-3);
        let position = scene.world_pose(ship).unwrap().position;
        assert!((0.0..100.0).contains(&position.x));
    }

    #[test]
    fn test_bullet_expires_and_returns_to_pool() {
        let mut scene: Scene = Scene::new("test", Logger::disabled());
        let bullet = scene.instantiate(BULLET_ARCHETYPE, "bullet");
        scene.add_component(bullet, Bullet::new(Vec2::new(10.0, 0.0), 0.025)).unwrap();

        let mut resources = TickResources::new();
        for _ in 0..3 {
            let mut ctx = resources.context(Duration::from_millis(10));
            scene.update(&mut ctx).unwrap();
        }

        assert!(!scene.contains(bullet));
        assert_eq!(scene.pooled_count_of(BULLET_ARCHETYPE), 1);
    }
}
