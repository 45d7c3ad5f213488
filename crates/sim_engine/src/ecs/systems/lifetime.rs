//! Despawns entities whose lifetime ran out

use crate::core::tick::TickContext;
use crate::ecs::components::Lifetime;
use crate::ecs::{Entity, System, SystemError, World};

/// Advances every [`Lifetime`] and destroys the expired entities at the flush
#[derive(Debug, Default)]
pub struct LifetimeSystem;

impl LifetimeSystem {
    /// Create a lifetime system
    pub fn new() -> Self {
        Self
    }
}

impl System for LifetimeSystem {
    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
        let Some(storage) = world.storage_mut::<Lifetime>() else {
            return Ok(());
        };
        let expired: Vec<Entity> = storage
            .iter_mut()
            .filter_map(|(entity, lifetime)| lifetime.advance(ctx.delta_time).then_some(entity))
            .collect();
        for entity in expired {
            world.destroy_entity(entity)?;
        }
        Ok(())
    }
}
