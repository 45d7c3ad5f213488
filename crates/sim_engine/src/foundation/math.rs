//! Math utilities and types
//!
//! Vector and rotation types are nalgebra aliases. The extension traits add the
//! handful of operations the simulation needs on top of nalgebra, each with a
//! single documented policy for degenerate input:
//!
//! - normalizing a zero-length vector yields the zero vector
//! - normalizing a zero quaternion, or building one from a zero axis, yields identity
//! - planar angles are always wrapped into `[-π, π)`

pub use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Lengths below this are treated as zero when normalizing
pub const NORMALIZE_EPSILON: f32 = 1e-12;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Clamp a value between min and max
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        if value < min { min } else if value > max { max } else { value }
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Wrap an angle in radians into `[-π, π)`
    pub fn wrap_angle(angle: f32) -> f32 {
        if !angle.is_finite() {
            return 0.0;
        }
        if (-constants::PI..constants::PI).contains(&angle) {
            return angle;
        }
        let wrapped = angle.rem_euclid(constants::TAU);
        if wrapped >= constants::PI { wrapped - constants::TAU } else { wrapped }
    }
}

/// Planar vector operations not provided by nalgebra
pub trait Vec2Ext {
    /// Unit vector pointing along `angle`, scaled to `length`
    fn from_angle(angle: f32, length: f32) -> Vec2;

    /// Z component of the 3D cross product of two planar vectors
    fn cross_scalar(&self, other: &Vec2) -> f32;

    /// This vector rotated counter-clockwise by `angle` radians
    fn rotated(&self, angle: f32) -> Vec2;

    /// Angle of this vector relative to +X, wrapped into `[-π, π)`
    fn angle(&self) -> f32;

    /// Unsigned angle between two vectors, zero if either is degenerate
    fn angle_to(&self, other: &Vec2) -> f32;

    /// Normalized copy, or the zero vector for zero-length input
    fn normalize_or_zero(&self) -> Vec2;

    /// Linear interpolation toward `other`
    fn lerp_to(&self, other: &Vec2, t: f32) -> Vec2;

    /// Lift into 3D at the given depth
    fn extend(&self, z: f32) -> Vec3;
}

impl Vec2Ext for Vec2 {
    fn from_angle(angle: f32, length: f32) -> Vec2 {
        Vec2::new(angle.cos() * length, angle.sin() * length)
    }

    fn cross_scalar(&self, other: &Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    fn rotated(&self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    fn angle(&self) -> f32 {
        utils::wrap_angle(self.y.atan2(self.x))
    }

    fn angle_to(&self, other: &Vec2) -> f32 {
        let denom = self.magnitude() * other.magnitude();
        if denom <= NORMALIZE_EPSILON {
            return 0.0;
        }
        utils::clamp(self.dot(other) / denom, -1.0, 1.0).acos()
    }

    fn normalize_or_zero(&self) -> Vec2 {
        let length = self.magnitude();
        if length <= NORMALIZE_EPSILON { Vec2::zeros() } else { self / length }
    }

    fn lerp_to(&self, other: &Vec2, t: f32) -> Vec2 {
        self.lerp(other, t)
    }

    fn extend(&self, z: f32) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

/// Spatial vector operations not provided by nalgebra
pub trait Vec3Ext {
    /// Normalized copy, or the zero vector for zero-length input
    fn normalize_or_zero(&self) -> Vec3;

    /// Component of this vector lying in the plane with the given normal
    fn project_onto_plane(&self, normal: &Vec3) -> Vec3;

    /// Reflection of this vector about the given normal
    fn reflect(&self, normal: &Vec3) -> Vec3;

    /// Drop the Z component
    fn truncate(&self) -> Vec2;
}

impl Vec3Ext for Vec3 {
    fn normalize_or_zero(&self) -> Vec3 {
        let length = self.magnitude();
        if length <= NORMALIZE_EPSILON { Vec3::zeros() } else { self / length }
    }

    fn project_onto_plane(&self, normal: &Vec3) -> Vec3 {
        let n = normal.normalize_or_zero();
        self - n * self.dot(&n)
    }

    fn reflect(&self, normal: &Vec3) -> Vec3 {
        let n = normal.normalize_or_zero();
        self - n * (2.0 * self.dot(&n))
    }

    fn truncate(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Build a rotation of `angle` radians about `axis`; a zero axis yields identity
pub fn quat_from_axis_angle(axis: &Vec3, angle: f32) -> Quat {
    Unit::try_new(*axis, NORMALIZE_EPSILON)
        .map_or_else(Quat::identity, |axis| Quat::from_axis_angle(&axis, angle))
}

/// Rotation about +Z, the planar rotation lifted into 3D
pub fn quat_from_planar_angle(angle: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::z_axis(), angle)
}

/// Re-normalize a rotation that has accumulated floating-point drift
///
/// A quaternion whose norm collapsed to zero becomes identity.
pub fn renormalize(rotation: &Quat) -> Quat {
    let raw = rotation.into_inner();
    Unit::try_new(raw, NORMALIZE_EPSILON).unwrap_or_else(Quat::identity)
}

/// Normalize an arbitrary quaternion; zero input becomes identity
pub fn quat_normalize_or_identity(raw: Quaternion<f32>) -> Quat {
    Unit::try_new(raw, NORMALIZE_EPSILON).unwrap_or_else(Quat::identity)
}
