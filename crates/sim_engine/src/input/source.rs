//! Input sources polled by the engine

use super::state::{InputEvent, InputSnapshot, InputState};
use std::collections::VecDeque;

/// Poll-based input collaborator
pub trait InputSource {
    /// Pull pending events from the platform; called once per frame before any tick
    fn pump(&mut self) {}

    /// Take the immutable snapshot for the next tick
    fn snapshot(&mut self) -> InputSnapshot;
}

impl InputSource for InputState {
    fn snapshot(&mut self) -> InputSnapshot {
        InputState::snapshot(self)
    }
}

/// Replays a fixed list of event batches, one batch per frame
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    state: InputState,
    frames: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    /// Create a script from per-frame event batches
    pub fn new(frames: impl IntoIterator<Item = Vec<InputEvent>>) -> Self {
        Self { state: InputState::new(), frames: frames.into_iter().collect() }
    }

    /// Append a batch for a later frame
    pub fn push_frame(&mut self, events: Vec<InputEvent>) {
        self.frames.push_back(events);
    }

    /// Batches not yet delivered
    pub fn remaining_frames(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn pump(&mut self) {
        if let Some(events) = self.frames.pop_front() {
            for event in events {
                self.state.handle_event(event);
            }
        }
    }

    fn snapshot(&mut self) -> InputSnapshot {
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn test_script_delivers_one_batch_per_pump() {
        let mut input = ScriptedInput::new([
            vec![InputEvent::KeyPressed(KeyCode::Up)],
            vec![],
            vec![InputEvent::KeyReleased(KeyCode::Up)],
        ]);

        input.pump();
        assert!(input.snapshot().was_key_pressed(KeyCode::Up));
        input.pump();
        let held = input.snapshot();
        assert!(held.is_key_held(KeyCode::Up) && !held.was_key_pressed(KeyCode::Up));
        input.pump();
        assert!(input.snapshot().was_key_released(KeyCode::Up));
        assert_eq!(input.remaining_frames(), 0);
    }
}
