//! System trait and implementations

use super::world::World;
use super::EcsError;
use crate::core::tick::TickContext;
use std::fmt;
use thiserror::Error;

/// Failure reported by a system during a tick
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    /// Logged; the tick carries on and the system's queued changes stand
    #[error("{0}")]
    Isolated(String),

    /// Logged; the structural changes the system queued this tick are rolled back
    #[error("structural failure: {0}")]
    Structural(String),
}

impl SystemError {
    /// Failure confined to the system
    pub fn isolated(message: impl fmt::Display) -> Self {
        Self::Isolated(message.to_string())
    }

    /// Failure that invalidates the system's structural changes
    pub fn structural(message: impl fmt::Display) -> Self {
        Self::Structural(message.to_string())
    }

    /// Whether the failure requires a rollback
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

impl From<EcsError> for SystemError {
    fn from(error: EcsError) -> Self {
        Self::structural(error)
    }
}

/// System trait for processing entities and components
///
/// Systems run once per tick in registration order. While a system runs,
/// adding or removing components and destroying entities are queued and
/// applied after the last system.
pub trait System {
    /// Name used for lookup, replacement and logging
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Run the system for one tick
    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), SystemError>;

    /// Called when the system is registered
    fn on_added(&mut self, _world: &mut World) {}

    /// Called when the system is removed or replaced
    fn on_removed(&mut self, _world: &mut World) {}
}
