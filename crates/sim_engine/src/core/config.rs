//! # Engine Configuration
//!
//! Settings for the fixed-timestep loop, logging, the scene and the window
//! handed to the renderer. Every struct uses `#[serde(default)]`, so a file
//! only needs the keys it changes:
//!
//! ```toml
//! tick_rate = 120.0
//! max_ticks_per_frame = 8
//!
//! [scene]
//! pool_capacity = 64
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::config::{Config, ConfigError};
use crate::foundation::logging::{parse_level, LevelFilter};
use crate::foundation::time::FixedTimestep;
use crate::transform::DEFAULT_MAX_DEPTH;

/// # Window Configuration
///
/// Passed through to the renderer collaborator; the engine never opens a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Simulation".to_string(), width: 800, height: 600 }
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Maximum pooled objects kept per archetype
    pub pool_capacity: usize,
    /// Maximum length of a transform parent chain
    pub max_hierarchy_depth: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { pool_capacity: 32, max_hierarchy_depth: DEFAULT_MAX_DEPTH }
    }
}

/// # Engine Configuration
///
/// Core loop behaviour: tick rate, spiral-of-death guard and logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulation ticks per second
    pub tick_rate: f64,
    /// Most ticks run in one frame; whole ticks beyond this are discarded
    pub max_ticks_per_frame: u32,
    /// Longest wall-clock delta accepted from one frame, in seconds (0 disables the clamp)
    pub max_frame_time: f64,
    /// Log level for the engine's logging handles
    pub log_level: String,
    /// Scene settings
    pub scene: SceneConfig,
    /// Window settings for the renderer
    pub window: WindowConfig,
}

impl EngineConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks_per_frame: 5,
            max_frame_time: 0.25,
            log_level: "info".to_string(),
            scene: SceneConfig::default(),
            window: WindowConfig::default(),
        }
    }

    /// Set tick rate
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the per-frame tick cap
    pub fn with_max_ticks_per_frame(mut self, max_ticks: u32) -> Self {
        self.max_ticks_per_frame = max_ticks;
        self
    }

    /// Set the frame-time clamp in seconds
    pub fn with_max_frame_time(mut self, seconds: f64) -> Self {
        self.max_frame_time = seconds;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set scene configuration
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Set window configuration
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!("tick_rate must be positive, got {}", self.tick_rate)));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ConfigError::Invalid("max_ticks_per_frame must be at least 1".to_string()));
        }
        if !self.max_frame_time.is_finite() || self.max_frame_time < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_frame_time must be zero or positive, got {}",
                self.max_frame_time
            )));
        }
        if self.scene.max_hierarchy_depth == 0 {
            return Err(ConfigError::Invalid("scene.max_hierarchy_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Fixed simulation step
    pub fn fixed_dt(&self) -> Duration {
        self.timestep().fixed_dt()
    }

    /// Frame-time clamp, if enabled
    pub fn frame_time_limit(&self) -> Option<Duration> {
        if self.max_frame_time > 0.0 {
            Duration::try_from_secs_f64(self.max_frame_time).ok()
        } else {
            None
        }
    }

    /// Accumulator configured from these settings
    pub fn timestep(&self) -> FixedTimestep {
        let timestep = FixedTimestep::from_rate(self.tick_rate, self.max_ticks_per_frame);
        match self.frame_time_limit() {
            Some(limit) => timestep.with_max_frame_time(limit),
            None => timestep,
        }
    }

    /// Parsed log level
    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.log_level)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.fixed_dt().as_nanos().abs_diff(16_666_667) <= 1);
        assert_eq!(config.frame_time_limit(), Some(Duration::from_millis(250)));
        assert_eq!(config.scene.pool_capacity, 32);
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            "tick_rate = 120.0\nlog_level = \"debug\"\n[scene]\npool_capacity = 4\n",
        )
        .unwrap();
        assert_eq!(config.tick_rate, 120.0);
        assert_eq!(config.max_ticks_per_frame, 5);
        assert_eq!(config.scene.pool_capacity, 4);
        assert_eq!(config.scene.max_hierarchy_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_validation_rejects_bad_loop_settings() {
        assert!(EngineConfig::new().with_tick_rate(0.0).validate().is_err());
        assert!(EngineConfig::new().with_tick_rate(f64::NAN).validate().is_err());
        assert!(EngineConfig::new().with_max_ticks_per_frame(0).validate().is_err());
        assert!(EngineConfig::new().with_max_frame_time(-1.0).validate().is_err());
        assert_eq!(EngineConfig::new().with_max_frame_time(0.0).frame_time_limit(), None);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = EngineConfig::new().with_tick_rate(30.0).with_log_level("warn");
        let text = config.to_string_as(crate::config::ConfigFormat::Ron).unwrap();
        assert_eq!(EngineConfig::from_ron_str(&text).unwrap(), config);
    }
}
