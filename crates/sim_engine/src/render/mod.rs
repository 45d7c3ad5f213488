//! # Rendering interface
//!
//! The engine does not rasterize anything itself. Once per frame it collects
//! world-space draw commands from the scene and the ECS world, orders them by
//! depth and submits them to a [`Renderer`] collaborator. Nothing a renderer
//! does can change simulation state.

pub mod color;
pub mod commands;

pub use color::{Color, ColorParseError};
pub use commands::{DrawCommand, DrawList, RenderFrame, Shape};

use crate::core::config::WindowConfig;
use crate::transform::Pose;
use std::cell::RefCell;
use std::rc::Rc;

/// Drawing collaborator
pub trait Renderer<P: Pose> {
    /// Called once before the first frame
    fn configure(&mut self, _window: &WindowConfig) {}

    /// Draw one frame, in the frame's command order
    fn submit(&mut self, frame: &RenderFrame<P>);
}

/// Renderer that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl<P: Pose> Renderer<P> for NullRenderer {
    fn submit(&mut self, _frame: &RenderFrame<P>) {}
}

/// Renderer that keeps every submitted frame
///
/// Clones share the same storage, so a handle kept outside the engine can
/// inspect what was drawn.
#[derive(Debug)]
pub struct RecordingRenderer<P> {
    frames: Rc<RefCell<Vec<RenderFrame<P>>>>,
}

impl<P> RecordingRenderer<P> {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self { frames: Rc::new(RefCell::new(Vec::new())) }
    }

    /// Number of frames submitted
    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Copy of the most recent frame
    pub fn last_frame(&self) -> Option<RenderFrame<P>>
    where
        P: Clone,
    {
        self.frames.borrow().last().cloned()
    }

    /// Take every recorded frame
    pub fn take_frames(&self) -> Vec<RenderFrame<P>> {
        std::mem::take(&mut *self.frames.borrow_mut())
    }
}

impl<P> Clone for RecordingRenderer<P> {
    fn clone(&self) -> Self {
        Self { frames: Rc::clone(&self.frames) }
    }
}

impl<P> Default for RecordingRenderer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pose> Renderer<P> for RecordingRenderer<P> {
    fn submit(&mut self, frame: &RenderFrame<P>) {
        self.frames.borrow_mut().push(frame.clone());
    }
}
