//! Lifetime Component
//!
//! Counts simulation time down for entities that despawn after a duration.

use crate::ecs::Component;

/// Lifetime component for entities that should despawn after a duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    /// Seconds lived so far
    pub elapsed: f32,
    /// How long the entity should live; zero or less lives forever
    pub duration: f32,
}

impl Component for Lifetime {}

impl Lifetime {
    /// Create a new lifetime component
    pub fn new(duration: f32) -> Self {
        Self { elapsed: 0.0, duration }
    }

    /// Advance by `delta_time`, returning whether the lifetime has now expired
    pub fn advance(&mut self, delta_time: f32) -> bool {
        self.elapsed += delta_time;
        self.is_expired()
    }

    /// Check if this entity's lifetime has expired
    pub fn is_expired(&self) -> bool {
        self.duration > 0.0 && self.elapsed >= self.duration
    }

    /// Get remaining lifetime in seconds
    pub fn remaining(&self) -> f32 {
        if self.duration <= 0.0 {
            f32::INFINITY
        } else {
            (self.duration - self.elapsed).max(0.0)
        }
    }
}
