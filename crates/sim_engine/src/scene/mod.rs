//! Scene management system
//!
//! The object-oriented half of the engine: a [`Scene`] owns an ordered set of
//! [`GameObject`]s, each with one transform node and an ordered list of
//! [`Component`]s.
//!
//! ## Tick
//!
//! ```text
//! update   objects in scene order, components in insertion order
//!    ↓     destroy / remove / add / spawn requests are only marked
//! flush    marked objects unlinked, reset, returned to their pool
//! ```
//!
//! Marked objects stay in the collection until the flush, so an update in
//! progress never sees it change underneath it.

mod component;
mod context;
mod game_object;
mod pool;
mod scene_manager;

pub use component::{AsAny, Component, ComponentError, ComponentId, ComponentSlot, Lifecycle};
pub use context::UpdateContext;
pub use game_object::{GameObject, ObjectId};
pub use pool::ObjectPool;
pub use scene_manager::{Scene, SceneOp, SceneTickReport, SpawnFn};

use crate::transform::{Pose2, Pose3, TransformError};
use thiserror::Error;

/// Planar scene
pub type Scene2D = Scene<Pose2>;

/// Spatial scene
pub type Scene3D = Scene<Pose3>;

/// Scene errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Handle does not refer to a linked object
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectId),

    /// Object has no live component with that id
    #[error("object {object:?} has no {component}")]
    UnknownComponent {
        /// Object searched
        object: ObjectId,
        /// Component requested
        component: ComponentId,
    },

    /// Object is marked for destruction
    #[error("object {0:?} is destroyed")]
    ObjectDestroyed(ObjectId),

    /// Transform hierarchy rejected the change
    #[error("transform: {0}")]
    Transform(#[from] TransformError),

    /// Update or flush requested while the scene is flushing
    #[error("scene is flushing")]
    FlushInProgress,

    /// Deferred spawn failed
    #[error("spawn failed: {0}")]
    Spawn(String),
}
