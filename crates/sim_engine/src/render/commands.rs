//! Draw commands handed to the renderer
//!
//! The renderer is a passive collaborator: every command already carries its
//! world-space pose, so no transform logic happens on the other side. Commands
//! are collected into a [`DrawList`] and sealed into a [`RenderFrame`], which
//! orders them by depth.

use super::color::Color;
use crate::foundation::math::Vec2;
use crate::transform::Pose;
use serde::{Deserialize, Serialize};

/// Shape descriptor, in the drawable's local space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle centred on the pose
    Circle {
        /// Radius
        radius: f32,
    },
    /// Axis-aligned rectangle centred on the pose
    Rectangle {
        /// Width and height
        size: Vec2,
    },
    /// Isosceles triangle pointing along local +x
    Triangle {
        /// Length along +x and base width
        size: Vec2,
    },
    /// Closed polygon through local points
    Polygon {
        /// Vertices in winding order
        points: Vec<Vec2>,
    },
    /// Segment from the pose origin to a local point
    Line {
        /// End point
        end: Vec2,
        /// Stroke width
        width: f32,
    },
    /// Text anchored at the pose origin
    Text {
        /// Text to draw
        content: String,
        /// Font size in pixels
        size: f32,
    },
}

impl Shape {
    /// Radius of a circle around the local origin that contains the shape
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Circle { radius } => radius.abs(),
            Self::Rectangle { size } | Self::Triangle { size } => size.norm() * 0.5,
            Self::Polygon { points } => points.iter().map(Vec2::norm).fold(0.0, f32::max),
            Self::Line { end, .. } => end.norm(),
            Self::Text { content, size } => content.chars().count() as f32 * size * 0.5,
        }
    }
}

/// One drawable with its world pose
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand<P> {
    /// World-space pose
    pub pose: P,
    /// Shape to draw
    pub shape: Shape,
    /// Fill color
    pub color: Color,
    /// Draw order; lower depths are drawn first
    pub depth: i32,
}

/// Commands collected during a render pass
#[derive(Debug, Clone)]
pub struct DrawList<P> {
    commands: Vec<DrawCommand<P>>,
    depth: i32,
}

impl<P: Pose> DrawList<P> {
    /// Create an empty list drawing at depth 0
    pub fn new() -> Self {
        Self { commands: Vec::new(), depth: 0 }
    }

    /// Depth used by [`push`](Self::push)
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Change the depth used by subsequent [`push`](Self::push) calls
    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    /// Add a command at the current depth
    pub fn push(&mut self, pose: P, shape: Shape, color: Color) {
        let depth = self.depth;
        self.push_at_depth(pose, shape, color, depth);
    }

    /// Add a command at an explicit depth
    pub fn push_at_depth(&mut self, pose: P, shape: Shape, color: Color, depth: i32) {
        self.commands.push(DrawCommand { pose, shape, color, depth });
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was drawn
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in submission order
    pub fn commands(&self) -> &[DrawCommand<P>] {
        &self.commands
    }

    /// Seal the list into a frame
    pub fn into_frame(self, frame: u64, alpha: f32) -> RenderFrame<P> {
        RenderFrame::new(frame, self.commands, alpha)
    }
}

impl<P: Pose> Default for DrawList<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything drawn in one frame, ordered by depth
#[derive(Debug, Clone)]
pub struct RenderFrame<P> {
    /// Frame number, starting at 0
    pub frame: u64,
    /// Fraction of a tick accumulated but not yet simulated, in `[0, 1)`
    pub alpha: f32,
    commands: Vec<DrawCommand<P>>,
}

impl<P> RenderFrame<P> {
    /// Build a frame; commands with equal depth keep their submission order
    pub fn new(frame: u64, mut commands: Vec<DrawCommand<P>>, alpha: f32) -> Self {
        commands.sort_by_key(|command| command.depth);
        Self { frame, alpha, commands }
    }

    /// Commands in draw order
    pub fn commands(&self) -> &[DrawCommand<P>] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the frame draws nothing
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
