//! Input management system
//!
//! Raw key and mouse events are accumulated by an [`InputSource`] between
//! ticks. At the start of every tick the engine takes an [`InputSnapshot`],
//! which stays immutable for the duration of that tick.

pub mod state;
pub mod source;
pub mod actions;

pub use actions::ActionMap;
pub use source::{InputSource, ScriptedInput};
pub use state::{InputEvent, InputSnapshot, InputState};

use serde::{Deserialize, Serialize};

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyCode {
    /// A key
    A,
    /// B key
    B,
    /// C key
    C,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// G key
    G,
    /// H key
    H,
    /// I key
    I,
    /// J key
    J,
    /// K key
    K,
    /// L key
    L,
    /// M key
    M,
    /// N key
    N,
    /// O key
    O,
    /// P key
    P,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// T key
    T,
    /// U key
    U,
    /// V key
    V,
    /// W key
    W,
    /// X key
    X,
    /// Y key
    Y,
    /// Z key
    Z,
    /// Digit 0
    Digit0,
    /// Digit 1
    Digit1,
    /// Digit 2
    Digit2,
    /// Digit 3
    Digit3,
    /// Digit 4
    Digit4,
    /// Digit 5
    Digit5,
    /// Digit 6
    Digit6,
    /// Digit 7
    Digit7,
    /// Digit 8
    Digit8,
    /// Digit 9
    Digit9,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Tab key
    Tab,
    /// Either shift key
    Shift,
    /// Either control key
    Control,
    /// F11 key
    F11,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}
