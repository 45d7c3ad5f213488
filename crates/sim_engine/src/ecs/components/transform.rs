//! Transform component for the ECS system
//!
//! Pure data: a planar pose in world space. ECS entities are flat, so there
//! is no parent link here; hierarchies live in the scene's transform tree.

use crate::ecs::Component;
use crate::foundation::math::{utils::wrap_angle, Vec2, Vec2Ext};
use crate::transform::Pose2;

/// ECS Transform component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    /// World space position
    pub position: Vec2,

    /// Rotation in radians, wrapped into `[-π, π)`
    pub rotation: f32,

    /// Scale factors
    pub scale: Vec2,
}

impl Component for TransformComponent {}

impl Default for TransformComponent {
    fn default() -> Self {
        Self { position: Vec2::zeros(), rotation: 0.0, scale: Vec2::new(1.0, 1.0) }
    }
}

impl TransformComponent {
    /// Create from position only
    pub fn from_position(position: Vec2) -> Self {
        Self { position, ..Default::default() }
    }

    /// Create from position and rotation
    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation: wrap_angle(rotation), ..Default::default() }
    }

    /// Move by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Rotate by `delta` radians
    pub fn rotate(&mut self, delta: f32) {
        self.rotation = wrap_angle(self.rotation + delta);
    }

    /// Unit vector the transform faces
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation, 1.0)
    }

    /// Convert to a pose for drawing
    pub fn to_pose(&self) -> Pose2 {
        Pose2::new(self.position, self.rotation, self.scale)
    }
}

impl From<Pose2> for TransformComponent {
    fn from(pose: Pose2) -> Self {
        Self { position: pose.position, rotation: pose.rotation(), scale: pose.scale }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_rotation_stays_wrapped() {
        let mut transform = TransformComponent::default();
        transform.rotate(PI * 1.5);
        assert_relative_eq!(transform.rotation, -PI * 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_pose_round_trip() {
        let transform = TransformComponent::from_position_rotation(Vec2::new(3.0, 4.0), 0.5);
        let back = TransformComponent::from(transform.to_pose());
        assert_eq!(back, transform);
    }

    #[test]
    fn test_forward() {
        let transform = TransformComponent::from_position_rotation(Vec2::zeros(), PI * 0.5);
        assert_relative_eq!(transform.forward(), Vec2::new(0.0, 1.0), epsilon = 1e-6);
    }
}
