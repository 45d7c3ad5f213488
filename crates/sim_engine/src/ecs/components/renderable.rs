//! Sprite component for entities drawn by the ECS world

use crate::ecs::Component;
use crate::foundation::math::Vec2;
use crate::render::{Color, Shape};

/// Component for entities that can be rendered
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteComponent {
    /// Shape in the entity's local space
    pub shape: Shape,

    /// Fill color
    pub color: Color,

    /// Whether this sprite is drawn
    pub visible: bool,

    /// Draw depth; higher values are drawn on top
    pub depth: i32,
}

impl Component for SpriteComponent {}

impl SpriteComponent {
    /// Create a visible sprite at depth 0
    pub fn new(shape: Shape, color: Color) -> Self {
        Self { shape, color, visible: true, depth: 0 }
    }

    /// Circle of the given radius
    pub fn circle(radius: f32, color: Color) -> Self {
        Self::new(Shape::Circle { radius }, color)
    }

    /// Rectangle of the given size
    pub fn rectangle(size: Vec2, color: Color) -> Self {
        Self::new(Shape::Rectangle { size }, color)
    }

    /// Builder pattern: set depth
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Default for SpriteComponent {
    fn default() -> Self {
        Self::rectangle(Vec2::new(32.0, 32.0), Color::WHITE)
    }
}
