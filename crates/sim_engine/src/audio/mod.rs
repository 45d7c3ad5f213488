//! Audio hand-off
//!
//! Simulation code never talks to a sound device. A tick records `play`
//! requests in a [`SoundQueue`]; after the tick the engine drains the queue
//! into a fire-and-forget [`SoundPlayer`]. A sound is therefore never started
//! before the tick that requested it.

use std::fmt;

/// Name of a sound known to the player
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(String);

impl SoundId {
    /// Create a sound id
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Sound name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SoundId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SoundId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One request to play a sound
#[derive(Debug, Clone, PartialEq)]
pub struct SoundRequest {
    /// Sound to play
    pub id: SoundId,
    /// Linear volume in `[0, 1]`
    pub volume: f32,
    /// Tick that requested the sound
    pub tick: u64,
}

/// Requests collected during a tick
#[derive(Debug, Default)]
pub struct SoundQueue {
    tick: u64,
    requests: Vec<SoundRequest>,
}

impl SoundQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent requests with `tick`
    pub fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Request a sound at full volume
    pub fn play(&mut self, id: impl Into<SoundId>) {
        self.play_with_volume(id, 1.0);
    }

    /// Request a sound at a given volume, clamped to `[0, 1]`
    pub fn play_with_volume(&mut self, id: impl Into<SoundId>, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.requests.push(SoundRequest { id: id.into(), volume, tick: self.tick });
    }

    /// Pending requests
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Pending requests in submission order
    pub fn pending(&self) -> &[SoundRequest] {
        &self.requests
    }

    /// Remove and return every pending request
    pub fn drain(&mut self) -> impl Iterator<Item = SoundRequest> + '_ {
        self.requests.drain(..)
    }

    /// Hand every pending request to `player`, in submission order
    pub fn flush_into(&mut self, player: &mut dyn SoundPlayer) -> usize {
        let mut played = 0;
        for request in self.requests.drain(..) {
            player.play(&request);
            played += 1;
        }
        played
    }
}

/// Fire-and-forget playback collaborator
pub trait SoundPlayer {
    /// Start a sound; must not block the caller
    fn play(&mut self, request: &SoundRequest);
}

/// Player that discards every request
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSoundPlayer;

impl SoundPlayer for NullSoundPlayer {
    fn play(&mut self, _request: &SoundRequest) {}
}
