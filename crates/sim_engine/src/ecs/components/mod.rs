//! ECS Components module
//!
//! Plain data components understood by the built-in systems

pub mod transform;
pub mod movement;
pub mod renderable;
pub mod health;
pub mod lifetime;
pub mod tags;

pub use transform::TransformComponent;
pub use movement::VelocityComponent;
pub use renderable::SpriteComponent;
pub use health::HealthComponent;
pub use lifetime::Lifetime;
pub use tags::TagComponent;
