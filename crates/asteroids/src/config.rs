//! Game configuration

use serde::{Deserialize, Serialize};
use sim_engine::config::{Config, ConfigError};
use sim_engine::core::EngineConfig;
use sim_engine::foundation::math::Vec2;
use sim_engine::input::{ActionMap, KeyCode};

/// Game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Engine loop settings
    pub engine: EngineConfig,

    /// Gameplay settings
    pub gameplay: GameplayConfig,

    /// Audio settings
    pub audio: AudioConfig,

    /// Controls settings
    pub controls: ControlsConfig,

    /// Headless run settings
    pub demo: DemoConfig,
}

impl Config for GameConfig {}

impl GameConfig {
    /// Check values that would make the game unplayable
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        let gameplay = &self.gameplay;
        if gameplay.world_width <= 0.0 || gameplay.world_height <= 0.0 {
            return Err(ConfigError::Invalid("gameplay world size must be positive".to_string()));
        }
        if gameplay.starting_lives == 0 {
            return Err(ConfigError::Invalid("gameplay.starting_lives must be at least 1".to_string()));
        }
        if self.demo.frame_time_ms <= 0.0 {
            return Err(ConfigError::Invalid("demo.frame_time_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Gameplay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Starting lives
    pub starting_lives: u32,

    /// Large asteroids per wave
    pub asteroid_count: u32,

    /// Ship acceleration
    pub ship_acceleration: f32,

    /// Ship max speed
    pub ship_max_speed: f32,

    /// Ship rotation speed
    pub ship_rotation_speed: f32,

    /// Bullet speed
    pub bullet_speed: f32,

    /// Bullet lifetime (seconds)
    pub bullet_lifetime: f32,

    /// Seconds between shots
    pub fire_cooldown: f32,

    /// Seconds of invulnerability after losing a life
    pub respawn_grace: f32,

    /// Playfield width
    pub world_width: f32,

    /// Playfield height
    pub world_height: f32,

    /// Seed for asteroid placement
    pub seed: u64,
}

impl GameplayConfig {
    /// Playfield size
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            asteroid_count: 5,
            ship_acceleration: 500.0,
            ship_max_speed: 300.0,
            ship_rotation_speed: 3.0,
            bullet_speed: 600.0,
            bullet_lifetime: 1.2,
            fire_cooldown: 0.25,
            respawn_grace: 2.0,
            world_width: 800.0,
            world_height: 600.0,
            seed: 0x5eed,
        }
    }
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    /// SFX volume (0.0 - 1.0)
    pub sfx_volume: f32,

    /// Audio enabled
    pub enabled: bool,
}

impl AudioConfig {
    /// Volume applied to every effect
    pub fn effective_volume(&self) -> f32 {
        if self.enabled {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { master_volume: 0.7, sfx_volume: 0.8, enabled: true }
    }
}

/// Controls configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Thrust keys
    pub thrust: Vec<KeyCode>,

    /// Left turn keys
    pub left: Vec<KeyCode>,

    /// Right turn keys
    pub right: Vec<KeyCode>,

    /// Fire keys
    pub fire: Vec<KeyCode>,
}

impl ControlsConfig {
    /// Action bindings for the ship controller
    pub fn action_map(&self) -> ActionMap {
        ActionMap::new()
            .with_binding("thrust", self.thrust.iter().copied())
            .with_binding("left", self.left.iter().copied())
            .with_binding("right", self.right.iter().copied())
            .with_binding("fire", self.fire.iter().copied())
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            thrust: vec![KeyCode::W, KeyCode::Up],
            left: vec![KeyCode::A, KeyCode::Left],
            right: vec![KeyCode::D, KeyCode::Right],
            fire: vec![KeyCode::Space],
        }
    }
}

/// Headless run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Frames to run before stopping
    pub frames: u64,

    /// Simulated wall time per frame, in milliseconds
    pub frame_time_ms: f64,

    /// Log a frame summary every this many frames
    pub report_every: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { frames: 1800, frame_time_ms: 1000.0 / 60.0, report_every: 120 }
    }
}
