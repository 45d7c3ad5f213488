//! Application trait and lifecycle management

use crate::config::ConfigError;
use crate::core::tick::TickContext;
use crate::ecs::{EcsError, World};
use crate::engine::{Engine, FrameReport};
use crate::scene::{Scene, SceneError};
use crate::transform::{Pose, Pose2};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive game logic from the engine loop. Every hook
/// has a default, so an application only overrides what it needs.
pub trait Application<P: Pose = Pose2> {
    /// Initialize the application
    ///
    /// Called once before the first frame. Use this to populate the scene and
    /// world and to register systems. An error here stops the engine.
    fn initialize(&mut self, _engine: &mut Engine<P>) -> Result<(), AppError> {
        Ok(())
    }

    /// Game logic for one simulation tick
    ///
    /// Runs before the scene and world update of the same tick, with the
    /// same input snapshot they see.
    fn fixed_update(
        &mut self,
        _scene: &mut Scene<P>,
        _world: &mut World,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once per frame after rendering
    fn on_frame(&mut self, _engine: &mut Engine<P>, _frame: &FrameReport) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called after the engine has stopped and flushed its pending changes.
    fn cleanup(&mut self, _engine: &mut Engine<P>) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// World operation failed
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}
