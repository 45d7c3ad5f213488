//! ECS Systems module
//!
//! Built-in systems for the built-in components. Every structural change they
//! make is deferred to the world's post-tick flush.

pub mod movement;
pub mod boundary;
pub mod lifetime;
pub mod health;
pub mod render;

pub use movement::MovementSystem;
pub use boundary::{BoundaryMode, BoundarySystem};
pub use lifetime::LifetimeSystem;
pub use health::HealthSystem;
pub use render::collect_sprites;
