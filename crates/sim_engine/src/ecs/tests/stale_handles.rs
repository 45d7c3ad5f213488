//! Generational handles after destroy and reuse

use crate::core::tick::{TickContext, TickResources};
use crate::ecs::components::{HealthComponent, TransformComponent};
use crate::ecs::{EcsError, Entity, System, SystemError, World};
use crate::foundation::logging::Logger;
use std::time::Duration;

#[test]
fn test_recycled_slot_rejects_old_handle() {
    let mut world = World::new(Logger::disabled());
    let old = world.create_entity();
    world.add_component(old, HealthComponent::new(5.0)).unwrap();
    world.destroy_entity(old).unwrap();

    let new = world.create_entity();
    assert_eq!(new.index(), old.index());
    assert_ne!(new, old);
    assert!(new.generation() > old.generation());

    assert_eq!(world.add_component(old, TransformComponent::default()), Err(EcsError::StaleEntity(old)));
    assert_eq!(world.remove_component::<HealthComponent>(old), Err(EcsError::StaleEntity(old)));
    assert_eq!(world.destroy_entity(old), Err(EcsError::StaleEntity(old)));
    assert!(world.get_component::<HealthComponent>(old).is_none());

    // The purge happened before reuse: the new occupant starts empty
    assert!(!world.has_component::<HealthComponent>(new));
    assert!(world.is_alive(new));
}

struct DestroyAndKeep {
    victim: Option<Entity>,
}

impl System for DestroyAndKeep {
    fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
        if let Some(victim) = self.victim.take() {
            world.destroy_entity(victim)?;
            // Still alive until the flush
            if !world.is_alive(victim) {
                return Err(SystemError::isolated("destroyed too early"));
            }
        }
        Ok(())
    }
}

#[test]
fn test_deferred_destroy_then_stale() {
    let mut world = World::new(Logger::disabled());
    let victim = world.create_entity();
    world.add_component(victim, HealthComponent::new(1.0)).unwrap();
    world.add_system(DestroyAndKeep { victim: Some(victim) });

    let mut resources = TickResources::new();
    let mut tick = resources.context(Duration::from_millis(16));
    let report = world.update(&mut tick).unwrap();
    assert_eq!(report.isolated_errors, 0);
    assert!(!world.is_alive(victim));
    assert_eq!(world.component_count::<HealthComponent>(), 0);

    let reused = world.create_entity();
    assert_eq!(reused.index(), victim.index());
    assert_eq!(world.destroy_entity(victim), Err(EcsError::StaleEntity(victim)));
    assert!(world.is_alive(reused));
}
