//! Velocity component for entities that move in the plane

use crate::ecs::Component;
use crate::foundation::math::Vec2;

/// Component for entities that can move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityComponent {
    /// Linear velocity in units per second
    pub linear: Vec2,

    /// Angular velocity in radians per second
    pub angular: f32,

    /// Speed limit applied before each integration step
    pub max_speed: Option<f32>,
}

impl Component for VelocityComponent {}

impl Default for VelocityComponent {
    fn default() -> Self {
        Self { linear: Vec2::zeros(), angular: 0.0, max_speed: None }
    }
}

impl VelocityComponent {
    /// Create a velocity component with a linear velocity
    pub fn new(linear: Vec2) -> Self {
        Self { linear, ..Default::default() }
    }

    /// Builder pattern: spin at `angular` radians per second
    pub fn with_angular(mut self, angular: f32) -> Self {
        self.angular = angular;
        self
    }

    /// Builder pattern: cap the speed
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed.max(0.0));
        self
    }

    /// Current speed
    pub fn speed(&self) -> f32 {
        self.linear.norm()
    }

    /// Add to velocity
    pub fn add_velocity(&mut self, delta: Vec2) {
        self.linear += delta;
    }

    /// Scale the velocity down to `max_speed` if it is faster
    pub fn limit_speed(&mut self) {
        if let Some(max_speed) = self.max_speed {
            let speed = self.speed();
            if speed > max_speed && speed > 0.0 {
                self.linear *= max_speed / speed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_limit_speed() {
        let mut velocity = VelocityComponent::new(Vec2::new(30.0, 40.0)).with_max_speed(10.0);
        velocity.limit_speed();
        assert_relative_eq!(velocity.linear, Vec2::new(6.0, 8.0), epsilon = 1e-5);
    }

    #[test]
    fn test_no_limit_leaves_velocity() {
        let mut velocity = VelocityComponent::new(Vec2::new(30.0, 40.0));
        velocity.limit_speed();
        assert_relative_eq!(velocity.speed(), 50.0);
    }

    #[test]
    fn test_zero_limit_stops() {
        let mut velocity = VelocityComponent::new(Vec2::new(1.0, 0.0)).with_max_speed(-3.0);
        velocity.limit_speed();
        assert_relative_eq!(velocity.speed(), 0.0);
    }
}
