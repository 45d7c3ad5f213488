//! Health component

use crate::ecs::Component;

/// Hit points; an entity at zero is dead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthComponent {
    /// Current hit points, in `[0, max]`
    pub current: f32,
    /// Maximum hit points
    pub max: f32,
}

impl Component for HealthComponent {}

impl HealthComponent {
    /// Full health
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Lose `amount` hit points, not going below zero
    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    /// Regain `amount` hit points, not going above the maximum
    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    /// Whether hit points reached zero
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Remaining health as a fraction of the maximum
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

impl Default for HealthComponent {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_and_heal_are_clamped() {
        let mut health = HealthComponent::new(10.0);
        health.take_damage(4.0);
        assert_eq!(health.current, 6.0);
        health.heal(100.0);
        assert_eq!(health.current, 10.0);
        health.take_damage(25.0);
        assert_eq!(health.current, 0.0);
        assert!(health.is_dead());
        health.heal(1.0);
        assert!(!health.is_dead());
        assert_eq!(health.fraction(), 0.1);
    }
}
