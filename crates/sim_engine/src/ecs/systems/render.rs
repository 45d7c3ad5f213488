//! Draw commands for ECS sprites

use crate::ecs::components::{SpriteComponent, TransformComponent};
use crate::ecs::World;
use crate::render::DrawList;
use crate::transform::Pose;

/// Push one command per visible sprite with a transform, at the sprite's depth
///
/// Returns the number of commands pushed.
pub fn collect_sprites<P: Pose>(world: &World, out: &mut DrawList<P>) -> usize {
    let mut pushed = 0;
    for (_, (transform, sprite)) in world.query::<(TransformComponent, SpriteComponent)>() {
        if !sprite.visible {
            continue;
        }
        let pose = P::from_planar(&transform.to_pose());
        out.push_at_depth(pose, sprite.shape.clone(), sprite.color, sprite.depth);
        pushed += 1;
    }
    pushed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::logging::Logger;
    use crate::foundation::math::{Vec2, Vec3};
    use crate::render::Color;
    use crate::transform::{Pose2, Pose3};
    use approx::assert_relative_eq;

    #[test]
    fn test_collects_visible_sprites() {
        let mut world = World::new(Logger::disabled());
        let shown = world.create_entity();
        world.add_component(shown, TransformComponent::from_position(Vec2::new(1.0, 2.0))).unwrap();
        world.add_component(shown, SpriteComponent::circle(3.0, Color::RED).with_depth(4)).unwrap();
        let hidden = world.create_entity();
        world.add_component(hidden, TransformComponent::default()).unwrap();
        let mut sprite = SpriteComponent::default();
        sprite.set_visible(false);
        world.add_component(hidden, sprite).unwrap();

        let mut list: DrawList<Pose2> = DrawList::new();
        assert_eq!(collect_sprites(&world, &mut list), 1);
        assert_eq!(list.commands()[0].depth, 4);
        assert_eq!(list.commands()[0].color, Color::RED);

        let mut spatial: DrawList<Pose3> = DrawList::new();
        collect_sprites(&world, &mut spatial);
        assert_relative_eq!(spatial.commands()[0].pose.position, Vec3::new(1.0, 2.0, 0.0));
    }
}
