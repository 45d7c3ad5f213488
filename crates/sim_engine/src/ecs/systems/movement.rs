//! Velocity integration

use crate::core::tick::TickContext;
use crate::ecs::components::{TransformComponent, VelocityComponent};
use crate::ecs::{Entity, System, SystemError, World};

/// Clamps each velocity to its speed limit, then moves and spins the transform
#[derive(Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    /// Create a movement system
    pub fn new() -> Self {
        Self
    }
}

impl System for MovementSystem {
    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
        let dt = ctx.delta_time;
        let moving: Vec<Entity> = world.query::<(TransformComponent, VelocityComponent)>().entities().collect();
        for entity in moving {
            let Some(velocity) = world.get_component_mut::<VelocityComponent>(entity) else {
                continue;
            };
            velocity.limit_speed();
            let velocity = *velocity;
            if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
                transform.translate(velocity.linear * dt);
                transform.rotate(velocity.angular * dt);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tick::TickResources;
    use crate::foundation::logging::Logger;
    use crate::foundation::math::Vec2;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn test_integrates_with_speed_limit() {
        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::default()).unwrap();
        world
            .add_component(entity, VelocityComponent::new(Vec2::new(300.0, 400.0)).with_max_speed(50.0).with_angular(1.0))
            .unwrap();
        let still = world.create_entity();
        world.add_component(still, TransformComponent::default()).unwrap();
        world.add_system(MovementSystem::new());

        let mut resources = TickResources::new();
        let mut tick = resources.context(Duration::from_millis(100));
        world.update(&mut tick).unwrap();

        let transform = world.get_component::<TransformComponent>(entity).unwrap();
        assert_relative_eq!(transform.position, Vec2::new(3.0, 4.0), epsilon = 1e-4);
        assert_relative_eq!(transform.rotation, 0.1, epsilon = 1e-6);
        assert_eq!(world.get_component::<TransformComponent>(still).unwrap().position, Vec2::zeros());
    }
}
