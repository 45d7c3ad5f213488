//! Named actions bound to keys

use super::{InputSnapshot, KeyCode};
use crate::foundation::math::{Vec2, Vec2Ext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps action names to the keys that trigger them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionMap {
    bindings: BTreeMap<String, Vec<KeyCode>>,
}

impl ActionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: bind `keys` to `action`
    pub fn with_binding(mut self, action: impl Into<String>, keys: impl IntoIterator<Item = KeyCode>) -> Self {
        self.bind(action, keys);
        self
    }

    /// Add keys to an action, creating it if needed
    pub fn bind(&mut self, action: impl Into<String>, keys: impl IntoIterator<Item = KeyCode>) {
        let bound = self.bindings.entry(action.into()).or_default();
        for key in keys {
            if !bound.contains(&key) {
                bound.push(key);
            }
        }
    }

    /// Remove an action, returning its keys
    pub fn unbind(&mut self, action: &str) -> Option<Vec<KeyCode>> {
        self.bindings.remove(action)
    }

    /// Keys bound to an action
    pub fn keys(&self, action: &str) -> &[KeyCode] {
        self.bindings.get(action).map_or(&[], Vec::as_slice)
    }

    /// Action names in sorted order
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Whether any key of the action is held
    pub fn is_action_held(&self, input: &InputSnapshot, action: &str) -> bool {
        self.keys(action).iter().any(|&key| input.is_key_held(key))
    }

    /// Whether any key of the action went down this tick
    pub fn was_action_pressed(&self, input: &InputSnapshot, action: &str) -> bool {
        self.keys(action).iter().any(|&key| input.was_key_pressed(key))
    }

    /// Unit-length movement from the arrow keys, falling back to WASD
    ///
    /// Uses window coordinates: up is negative y.
    pub fn movement_vector(input: &InputSnapshot) -> Vec2 {
        let axis = |up, down, left, right| {
            let mut movement = Vec2::zeros();
            if input.is_key_held(up) {
                movement.y -= 1.0;
            }
            if input.is_key_held(down) {
                movement.y += 1.0;
            }
            if input.is_key_held(left) {
                movement.x -= 1.0;
            }
            if input.is_key_held(right) {
                movement.x += 1.0;
            }
            movement
        };

        let arrows = axis(KeyCode::Up, KeyCode::Down, KeyCode::Left, KeyCode::Right);
        let movement = if arrows == Vec2::zeros() {
            axis(KeyCode::W, KeyCode::S, KeyCode::A, KeyCode::D)
        } else {
            arrows
        };
        movement.normalize_or_zero()
    }
}
