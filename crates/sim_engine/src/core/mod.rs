//! # Core Engine Module
//!
//! Shared abstractions used by every subsystem driven from the engine loop.
//!
//! ## Organization
//!
//! - **Config**: Engine, scene and window configuration
//! - **Tick**: The per-tick context handed to scene components and ECS systems

pub mod config;
pub mod tick;

pub use config::{Config, ConfigError, EngineConfig, SceneConfig, WindowConfig};
pub use tick::{StopHandle, TickContext, TickResources};
