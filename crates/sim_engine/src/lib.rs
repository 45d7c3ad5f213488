//! # Sim Engine
//!
//! A small fixed-timestep simulation engine.
//!
//! ## Features
//!
//! - **Transform hierarchy**: parent/child poses in 2D or 3D with cycle
//!   detection and lazily cached world poses
//! - **Scene**: GameObjects with ordered behaviour components, deferred
//!   destruction and an object pool
//! - **ECS Architecture**: generational entities, sparse-set storage, ordered
//!   systems and deferred structural changes
//! - **Fixed-timestep loop**: deterministic ticks with a per-frame cap
//! - **Collaborators**: rendering, input, audio and hot reload behind narrow traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sim_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let ship = engine.world_mut().create_entity();
//!         engine.world_mut().add_component(ship, TransformComponent::default())?;
//!         engine.world_mut().add_system(MovementSystem::new());
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine: Engine = Engine::new(EngineConfig::default())?;
//!     engine.run(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod foundation;
pub mod config;
pub mod transform;
pub mod scene;
pub mod ecs;
pub mod input;
pub mod audio;
pub mod render;
pub mod reload;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineBuilder, EngineError, EngineState, FrameReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application, Engine, EngineBuilder, EngineError, EngineState, FrameReport,
        audio::{SoundPlayer, SoundRequest},
        config::Config,
        core::{EngineConfig, SceneConfig, StopHandle, TickContext, TickResources, WindowConfig},
        ecs::{
            Component as EcsComponent, Entity, Query, System, SystemError, World,
            components::{HealthComponent, Lifetime, SpriteComponent, TagComponent, TransformComponent, VelocityComponent},
            systems::{BoundaryMode, BoundarySystem, HealthSystem, LifetimeSystem, MovementSystem},
        },
        foundation::{
            logging::Logger,
            math::{Quat, Vec2, Vec3},
            time::{Clock, ManualClock, SystemClock},
        },
        input::{ActionMap, InputSnapshot, InputSource, InputState, KeyCode, MouseButton, ScriptedInput},
        render::{Color, DrawList, RenderFrame, Renderer, Shape},
        reload::{Change, ChangeKind, ChangeSource, FileWatcher, HotReload, ReloadError, ReloadHandler},
        scene::{Component, ComponentError, ObjectId, Scene, UpdateContext},
        transform::{Pose, Pose2, Pose3, TransformTree},
    };
}
