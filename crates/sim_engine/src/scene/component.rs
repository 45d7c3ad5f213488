//! Behaviour components attached to game objects
//!
//! Components are open for extension: any type implementing [`Component`] can
//! be attached, and lookups downcast by concrete type. A component is moved
//! into its owner when attached, so it can never have two owners, and it only
//! learns its owner's [`ObjectId`], which does not keep the owner alive.

use super::context::UpdateContext;
use super::game_object::ObjectId;
use super::SceneError;
use crate::render::DrawList;
use crate::transform::{Pose, TransformError};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Upcast to `Any` for downcasting trait objects
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Failure reported by a component during a tick
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// Logged; the tick carries on and the component's queued changes stand
    #[error("{0}")]
    Isolated(String),

    /// Logged; the structural changes the component queued this tick are rolled back
    #[error("structural failure: {0}")]
    Structural(String),
}

impl ComponentError {
    /// Failure confined to the component
    pub fn isolated(message: impl fmt::Display) -> Self {
        Self::Isolated(message.to_string())
    }

    /// Failure that invalidates the component's structural changes
    pub fn structural(message: impl fmt::Display) -> Self {
        Self::Structural(message.to_string())
    }

    /// Whether the failure requires a rollback
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}

impl From<TransformError> for ComponentError {
    fn from(error: TransformError) -> Self {
        Self::structural(error)
    }
}

impl From<SceneError> for ComponentError {
    fn from(error: SceneError) -> Self {
        Self::structural(error)
    }
}

/// Behaviour attached to a [`GameObject`](super::GameObject)
///
/// Every hook has a no-op default.
pub trait Component<P: Pose>: AsAny {
    /// Short name used in log messages
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Attached to `owner`; the component may keep the id
    fn on_attach(&mut self, _owner: ObjectId) {}

    /// Runs once, right before the first update after attaching
    fn on_start(&mut self, _ctx: &mut UpdateContext<'_, P>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Runs once per tick
    fn update(&mut self, _ctx: &mut UpdateContext<'_, P>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Emit draw commands for the owner's world pose
    fn draw(&self, _world: &P, _out: &mut DrawList<P>) {}

    /// Removed from its owner, or the owner was destroyed
    fn on_destroy(&mut self) {}
}

/// Identifier of an attached component, unique within a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// Lifecycle of an attached component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Attached, not yet started
    Attached,
    /// Started and updating
    Active,
    /// Marked for removal at the next flush
    Destroyed,
}

/// A component together with its id and lifecycle
pub struct ComponentSlot<P: Pose> {
    id: ComponentId,
    lifecycle: Lifecycle,
    component: Box<dyn Component<P>>,
}

impl<P: Pose> ComponentSlot<P> {
    pub(crate) fn new(id: ComponentId, component: Box<dyn Component<P>>) -> Self {
        Self { id, lifecycle: Lifecycle::Attached, component }
    }

    /// Component id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Lifecycle state
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether the component is attached and not marked for removal
    pub fn is_live(&self) -> bool {
        self.lifecycle != Lifecycle::Destroyed
    }

    /// The component as a trait object
    pub fn component(&self) -> &dyn Component<P> {
        &*self.component
    }

    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component<P>>(&self) -> Option<&T> {
        self.component().as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete component type
    pub fn downcast_mut<T: Component<P>>(&mut self) -> Option<&mut T> {
        let component: &mut dyn Component<P> = &mut *self.component;
        component.as_any_mut().downcast_mut::<T>()
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.lifecycle = Lifecycle::Destroyed;
    }

    pub(crate) fn run(&mut self, ctx: &mut UpdateContext<'_, P>) -> Result<(), ComponentError> {
        if self.lifecycle == Lifecycle::Attached {
            self.component.on_start(ctx)?;
            self.lifecycle = Lifecycle::Active;
        }
        self.component.update(ctx)
    }

    pub(crate) fn draw(&self, world: &P, out: &mut DrawList<P>) {
        self.component.draw(world, out);
    }

    pub(crate) fn replace(&mut self, owner: ObjectId, mut component: Box<dyn Component<P>>) -> Box<dyn Component<P>> {
        component.on_attach(owner);
        let mut old = std::mem::replace(&mut self.component, component);
        old.on_destroy();
        self.lifecycle = Lifecycle::Attached;
        old
    }

    pub(crate) fn destroy(mut self) {
        self.component.on_destroy();
    }
}

impl<P: Pose> fmt::Debug for ComponentSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("id", &self.id)
            .field("name", &self.component.name())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
