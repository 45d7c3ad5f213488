//! Despawns dead entities

use crate::core::tick::TickContext;
use crate::ecs::components::HealthComponent;
use crate::ecs::{Entity, System, SystemError, World};

/// Destroys entities whose health reached zero, at the flush
#[derive(Debug, Default)]
pub struct HealthSystem;

impl HealthSystem {
    /// Create a health system
    pub fn new() -> Self {
        Self
    }
}

impl System for HealthSystem {
    fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
        let dead: Vec<Entity> = world
            .query::<(HealthComponent,)>()
            .filter(|(_, (health,))| health.is_dead())
            .map(|(entity, _)| entity)
            .collect();
        for entity in dead {
            world.destroy_entity(entity)?;
        }
        Ok(())
    }
}
