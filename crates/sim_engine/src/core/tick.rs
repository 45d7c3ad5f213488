//! Per-tick context shared by scene components and ECS systems

use crate::audio::SoundQueue;
use crate::input::InputSnapshot;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Cloneable request to stop the engine loop
///
/// Requests take effect at the next frame boundary; the current tick and
/// flush always complete first.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Rc<Cell<bool>>,
}

impl StopHandle {
    /// Create a handle with no stop requested
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the engine to stop
    pub fn request_stop(&self) {
        self.requested.set(true);
    }

    /// Whether a stop was requested through any clone of this handle
    pub fn is_stop_requested(&self) -> bool {
        self.requested.get()
    }
}

/// What a tick may read and request
pub struct TickContext<'a> {
    /// Fixed step in seconds
    pub delta_time: f32,
    /// Tick number, starting at 0
    pub tick: u64,
    /// Input snapshot taken at the start of this tick
    pub input: &'a InputSnapshot,
    /// Sounds requested during this tick
    pub sounds: &'a mut SoundQueue,
    /// Stop request for the surrounding engine
    pub stop: &'a StopHandle,
}

impl<'a> TickContext<'a> {
    /// Create a context for one tick
    pub fn new(
        fixed_dt: Duration,
        tick: u64,
        input: &'a InputSnapshot,
        sounds: &'a mut SoundQueue,
        stop: &'a StopHandle,
    ) -> Self {
        sounds.begin_tick(tick);
        Self { delta_time: fixed_dt.as_secs_f32(), tick, input, sounds, stop }
    }

    /// Request a sound
    pub fn play_sound(&mut self, id: &str) {
        self.sounds.play(id);
    }

    /// Ask the engine to stop after this frame
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }
}

/// Owned resources for driving ticks outside an engine
///
/// Useful for tests and tools that step a scene or world by hand.
#[derive(Debug, Default)]
pub struct TickResources {
    /// Input presented to the next tick
    pub input: InputSnapshot,
    /// Sounds requested so far
    pub sounds: SoundQueue,
    /// Stop request
    pub stop: StopHandle,
    /// Next tick number
    pub next_tick: u64,
}

impl TickResources {
    /// Create idle resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the next tick, advancing the tick counter
    pub fn context(&mut self, fixed_dt: Duration) -> TickContext<'_> {
        let tick = self.next_tick;
        self.next_tick += 1;
        TickContext::new(fixed_dt, tick, &self.input, &mut self.sounds, &self.stop)
    }
}
