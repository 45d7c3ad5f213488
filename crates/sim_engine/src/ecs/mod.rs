//! Entity-Component-System implementation
//!
//! Entities are generational handles, components live in one sparse set per
//! type, and systems run in registration order once per tick. Structural
//! changes made while systems run are queued and applied after the last one.

pub mod world;
pub mod entity;
pub mod storage;
pub mod component;
pub mod system;
pub mod query;
pub mod components;
pub mod systems;

#[cfg(test)]
mod tests;

pub use world::{InsertFn, World, WorldOp, WorldTickReport};
pub use entity::{Entity, EntityAllocator};
pub use storage::{ComponentStorage, ErasedStorage};
pub use component::Component;
pub use system::{System, SystemError};
pub use query::{ComponentSet, Query};

use thiserror::Error;

/// Errors raised by the ECS world
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The handle's entity was destroyed, possibly with its slot reused
    #[error("entity {0} is not alive")]
    StaleEntity(Entity),

    /// The operation cannot run while systems are iterating
    #[error("cannot change systems or flush while systems are running")]
    MutationDuringIteration,

    /// No system is registered under this name
    #[error("no system named '{0}'")]
    UnknownSystem(String),
}
