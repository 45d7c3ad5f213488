//! Input state accumulation and per-tick snapshots

use super::{KeyCode, MouseButton};
use crate::foundation::math::Vec2;
use std::collections::HashSet;

/// Raw event delivered by a window or a script
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key went down
    KeyPressed(KeyCode),
    /// Key went up
    KeyReleased(KeyCode),
    /// Mouse button went down
    MousePressed(MouseButton),
    /// Mouse button went up
    MouseReleased(MouseButton),
    /// Pointer moved to a position in window coordinates
    MouseMoved(Vec2),
}

/// Immutable view of the input for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct InputSnapshot {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    buttons_held: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    pointer: Vec2,
}

impl InputSnapshot {
    /// Snapshot with nothing held and the pointer at the origin
    pub fn empty() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            keys_released: HashSet::new(),
            buttons_held: HashSet::new(),
            buttons_pressed: HashSet::new(),
            buttons_released: HashSet::new(),
            pointer: Vec2::zeros(),
        }
    }

    /// Whether `key` is currently held
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Whether `key` went down since the previous tick
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whether `key` went up since the previous tick
    pub fn was_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Whether a mouse button is currently held
    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    /// Whether a mouse button went down since the previous tick
    pub fn was_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Whether a mouse button went up since the previous tick
    pub fn was_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Pointer position in window coordinates
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    /// Keys currently held
    pub fn held_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys_held.iter().copied()
    }

    /// Whether any key is held
    pub fn any_key_held(&self) -> bool {
        !self.keys_held.is_empty()
    }
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Accumulates raw events between ticks
///
/// Held state persists across snapshots; pressed and released edges are
/// reported by exactly one snapshot, so a tap that begins and ends between
/// two ticks is still observed once.
#[derive(Debug, Clone)]
pub struct InputState {
    current: InputSnapshot,
}

impl InputState {
    /// Create an idle input state
    pub fn new() -> Self {
        Self { current: InputSnapshot::empty() }
    }

    /// Apply one raw event
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => self.handle_key(key, true),
            InputEvent::KeyReleased(key) => self.handle_key(key, false),
            InputEvent::MousePressed(button) => self.handle_mouse_button(button, true),
            InputEvent::MouseReleased(button) => self.handle_mouse_button(button, false),
            InputEvent::MouseMoved(position) => self.handle_mouse_move(position),
        }
    }

    /// Handle key input; repeated presses of a held key are ignored
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let state = &mut self.current;
        if pressed {
            if state.keys_held.insert(key) {
                state.keys_pressed.insert(key);
            }
        } else if state.keys_held.remove(&key) {
            state.keys_released.insert(key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        let state = &mut self.current;
        if pressed {
            if state.buttons_held.insert(button) {
                state.buttons_pressed.insert(button);
            }
        } else if state.buttons_held.remove(&button) {
            state.buttons_released.insert(button);
        }
    }

    /// Handle mouse movement
    pub fn handle_mouse_move(&mut self, position: Vec2) {
        self.current.pointer = position;
    }

    /// Current state without consuming edges
    pub fn peek(&self) -> &InputSnapshot {
        &self.current
    }

    /// Take the snapshot for the next tick, consuming pressed and released edges
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = self.current.clone();
        self.current.keys_pressed.clear();
        self.current.keys_released.clear();
        self.current.buttons_pressed.clear();
        self.current.buttons_released.clear();
        snapshot
    }

    /// Release everything
    pub fn reset(&mut self) {
        self.current = InputSnapshot::empty();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
