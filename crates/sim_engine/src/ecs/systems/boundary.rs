//! Keeps transforms inside a rectangle

use crate::core::tick::TickContext;
use crate::ecs::components::TransformComponent;
use crate::ecs::{System, SystemError, World};
use crate::foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// What happens at the edge of the bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Leaving one edge re-enters at the opposite edge
    Wrap,
    /// Positions are clamped to the bounds
    Clamp,
}

/// Wraps or clamps every transform to `[0, size]`
#[derive(Debug, Clone)]
pub struct BoundarySystem {
    size: Vec2,
    mode: BoundaryMode,
}

impl BoundarySystem {
    /// Bounds from the origin to `size`
    pub fn new(size: Vec2, mode: BoundaryMode) -> Self {
        Self { size, mode }
    }

    /// Bounds size
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Edge behaviour
    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    /// Apply the bounds to one position
    pub fn constrain(&self, position: Vec2) -> Vec2 {
        match self.mode {
            BoundaryMode::Wrap => Vec2::new(wrap(position.x, self.size.x), wrap(position.y, self.size.y)),
            BoundaryMode::Clamp => {
                Vec2::new(position.x.clamp(0.0, self.size.x), position.y.clamp(0.0, self.size.y))
            }
        }
    }
}

fn wrap(value: f32, extent: f32) -> f32 {
    if value < 0.0 {
        extent
    } else if value > extent {
        0.0
    } else {
        value
    }
}

impl Default for BoundarySystem {
    fn default() -> Self {
        Self::new(Vec2::new(800.0, 600.0), BoundaryMode::Wrap)
    }
}

impl System for BoundarySystem {
    fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
        let Some(storage) = world.storage_mut::<TransformComponent>() else {
            return Ok(());
        };
        for (_, transform) in storage.iter_mut() {
            transform.position = self.constrain(transform.position);
        }
        Ok(())
    }
}
