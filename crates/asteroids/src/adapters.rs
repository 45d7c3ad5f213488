//! Headless stand-ins for the window and the audio device
//!
//! Both collaborators only log what they would have done, so the demo runs
//! anywhere and its output can be diffed between runs.

use crate::config::AudioConfig;
use sim_engine::audio::{SoundPlayer, SoundRequest};
use sim_engine::core::WindowConfig;
use sim_engine::render::{RenderFrame, Renderer, Shape};
use sim_engine::transform::Pose2;
use std::collections::BTreeMap;

/// Renderer that summarizes frames in the log
#[derive(Debug)]
pub struct LoggingRenderer {
    every: u64,
    frames: u64,
    commands: usize,
}

impl LoggingRenderer {
    /// Log a summary of every `every`-th frame
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1), frames: 0, commands: 0 }
    }
}

impl Renderer<Pose2> for LoggingRenderer {
    fn configure(&mut self, window: &WindowConfig) {
        log::info!("Rendering '{}' headless at {}x{}", window.title, window.width, window.height);
    }

    fn submit(&mut self, frame: &RenderFrame<Pose2>) {
        self.frames += 1;
        self.commands += frame.len();
        if frame.frame % self.every != 0 {
            return;
        }
        let mut shapes: BTreeMap<&'static str, usize> = BTreeMap::new();
        for command in frame.commands() {
            let kind = match command.shape {
                Shape::Circle { .. } => "circle",
                Shape::Rectangle { .. } => "rectangle",
                Shape::Triangle { .. } => "triangle",
                Shape::Polygon { .. } => "polygon",
                Shape::Line { .. } => "line",
                Shape::Text { .. } => "text",
            };
            *shapes.entry(kind).or_default() += 1;
        }
        log::debug!("frame {} (alpha {:.2}): {shapes:?}", frame.frame, frame.alpha);
    }
}

impl Drop for LoggingRenderer {
    fn drop(&mut self) {
        log::debug!("Renderer drew {} frames, {} commands", self.frames, self.commands);
    }
}

impl Drop for LoggingSoundPlayer {
    fn drop(&mut self) {
        log::debug!("Sound player started {} sounds", self.played);
    }
}

/// Sound player that logs requests at the configured volume
#[derive(Debug)]
pub struct LoggingSoundPlayer {
    volume: f32,
    played: usize,
}

impl LoggingSoundPlayer {
    /// Player scaled by the audio settings
    pub fn new(config: &AudioConfig) -> Self {
        Self { volume: config.effective_volume(), played: 0 }
    }
}

impl SoundPlayer for LoggingSoundPlayer {
    fn play(&mut self, request: &SoundRequest) {
        let volume = request.volume * self.volume;
        if volume <= 0.0 {
            return;
        }
        self.played += 1;
        log::trace!("tick {}: play '{}' at {volume:.2}", request.tick, request.id);
    }
}
