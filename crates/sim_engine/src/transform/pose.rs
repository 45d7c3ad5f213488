//! Local and world poses
//!
//! A pose is position, rotation and scale. [`Pose2`] stores its rotation as a
//! planar angle wrapped into `[-π, π)`; [`Pose3`] stores a unit quaternion that
//! is re-normalized on every composition. Composition follows TRS order: the
//! child's position is scaled, then rotated, by the parent before the parent's
//! translation is added.

use crate::foundation::math::{
    quat_from_planar_angle, renormalize, utils::wrap_angle, Quat, Vec2, Vec2Ext, Vec3,
};
use std::fmt::Debug;

/// Behaviour shared by planar and spatial poses
pub trait Pose: Copy + Debug + PartialEq + 'static {
    /// Vector type for positions and scales
    type Vector: Copy + Debug + PartialEq;
    /// Rotation representation
    type Rotation: Copy + Debug + PartialEq;

    /// Identity pose: origin, no rotation, unit scale
    fn identity() -> Self;

    /// Build a pose from its parts
    fn from_parts(position: Self::Vector, rotation: Self::Rotation, scale: Self::Vector) -> Self;

    /// Position part
    fn position(&self) -> Self::Vector;

    /// Rotation part
    fn rotation(&self) -> Self::Rotation;

    /// Scale part
    fn scale(&self) -> Self::Vector;

    /// World pose of a child whose local pose is `local`, with `self` as the parent's world pose
    fn compose(&self, local: &Self) -> Self;

    /// Move by `delta`
    fn translate(&mut self, delta: Self::Vector);

    /// Rotate by `delta` (applied after the current rotation)
    fn rotate(&mut self, delta: Self::Rotation);

    /// Multiply scale component-wise by `factor`
    fn scale_by(&mut self, factor: Self::Vector);

    /// Replace the position
    fn set_position(&mut self, position: Self::Vector);

    /// Replace the rotation
    fn set_rotation(&mut self, rotation: Self::Rotation);

    /// Replace the scale
    fn set_scale(&mut self, scale: Self::Vector);

    /// Map a point from this pose's local space into its parent space
    fn transform_point(&self, point: Self::Vector) -> Self::Vector;

    /// Map a point from parent space into this pose's local space
    ///
    /// Zero scale components collapse that axis to zero rather than dividing by zero.
    fn inverse_transform_point(&self, point: Self::Vector) -> Self::Vector;

    /// Express a planar pose in this pose type
    fn from_planar(pose: &Pose2) -> Self;
}

fn safe_recip(value: f32) -> f32 {
    if value == 0.0 { 0.0 } else { value.recip() }
}

/// Planar pose with an angle in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2 {
    /// Position
    pub position: Vec2,
    rotation: f32,
    /// Scale factors
    pub scale: Vec2,
}

impl Pose2 {
    /// Rotation in radians, always within `[-π, π)`
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Create a pose, wrapping the angle
    pub fn new(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self { position, rotation: wrap_angle(rotation), scale }
    }

    /// Pose with only a position
    pub fn from_position(position: Vec2) -> Self {
        Self { position, ..Self::identity() }
    }

    /// Builder pattern: set rotation
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = wrap_angle(rotation);
        self
    }

    /// Builder pattern: set scale
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Unit vector this pose faces along
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation, 1.0)
    }

    /// Unit vector a quarter turn counter-clockwise from [`forward`](Self::forward)
    pub fn right(&self) -> Vec2 {
        Vec2::from_angle(self.rotation + std::f32::consts::FRAC_PI_2, 1.0)
    }
}

impl Default for Pose2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose for Pose2 {
    type Vector = Vec2;
    type Rotation = f32;

    fn identity() -> Self {
        Self { position: Vec2::zeros(), rotation: 0.0, scale: Vec2::new(1.0, 1.0) }
    }

    fn from_parts(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self::new(position, rotation, scale)
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn scale(&self) -> Vec2 {
        self.scale
    }

    fn compose(&self, local: &Self) -> Self {
        Self {
            position: self.transform_point(local.position),
            rotation: wrap_angle(self.rotation + local.rotation),
            scale: self.scale.component_mul(&local.scale),
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn rotate(&mut self, delta: f32) {
        self.rotation = wrap_angle(self.rotation + delta);
    }

    fn scale_by(&mut self, factor: Vec2) {
        self.scale = self.scale.component_mul(&factor);
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.rotation = wrap_angle(rotation);
    }

    fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    fn transform_point(&self, point: Vec2) -> Vec2 {
        self.position + self.scale.component_mul(&point).rotated(self.rotation)
    }

    fn inverse_transform_point(&self, point: Vec2) -> Vec2 {
        let unrotated = (point - self.position).rotated(-self.rotation);
        Vec2::new(unrotated.x * safe_recip(self.scale.x), unrotated.y * safe_recip(self.scale.y))
    }

    fn from_planar(pose: &Pose2) -> Self {
        *pose
    }
}

/// Spatial pose with a unit quaternion rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3 {
    /// Position
    pub position: Vec3,
    /// Rotation quaternion
    pub rotation: Quat,
    /// Scale factors
    pub scale: Vec3,
}

impl Pose3 {
    /// Pose with only a position
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::identity() }
    }

    /// Builder pattern: set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = renormalize(&rotation);
        self
    }

    /// Builder pattern: set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Direction of local -Z in parent space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Direction of local +X in parent space
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::new(1.0, 0.0, 0.0)
    }
}

impl Default for Pose3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose for Pose3 {
    type Vector = Vec3;
    type Rotation = Quat;

    fn identity() -> Self {
        Self { position: Vec3::zeros(), rotation: Quat::identity(), scale: Vec3::new(1.0, 1.0, 1.0) }
    }

    fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation: renormalize(&rotation), scale }
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn compose(&self, local: &Self) -> Self {
        Self {
            position: self.transform_point(local.position),
            rotation: renormalize(&(self.rotation * local.rotation)),
            scale: self.scale.component_mul(&local.scale),
        }
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    fn rotate(&mut self, delta: Quat) {
        self.rotation = renormalize(&(self.rotation * delta));
    }

    fn scale_by(&mut self, factor: Vec3) {
        self.scale = self.scale.component_mul(&factor);
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = renormalize(&rotation);
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }

    fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let unrotated = self.rotation.inverse() * (point - self.position);
        Vec3::new(
            unrotated.x * safe_recip(self.scale.x),
            unrotated.y * safe_recip(self.scale.y),
            unrotated.z * safe_recip(self.scale.z),
        )
    }

    fn from_planar(pose: &Pose2) -> Self {
        Self {
            position: pose.position.extend(0.0),
            rotation: quat_from_planar_angle(pose.rotation),
            scale: pose.scale.extend(1.0),
        }
    }
}
