//! What a component can see and do while it updates
//!
//! The context exposes the tick (delta time, input snapshot, sound queue),
//! the owner's transform, read access to the rest of the scene and the
//! owner's other components, and a deferred command queue for structural
//! changes. Destroying objects, re-parenting, adding or removing components
//! and spawning objects never take effect before the end-of-tick flush.

use super::component::{Component, ComponentId, ComponentSlot};
use super::game_object::{GameObject, ObjectId};
use super::scene_manager::{Scene, SceneOp};
use super::SceneError;
use crate::audio::SoundQueue;
use crate::core::tick::StopHandle;
use crate::foundation::collections::DeferredQueue;
use crate::input::InputSnapshot;
use crate::transform::{Pose, TransformError, TransformId, TransformTree};
use slotmap::SlotMap;

/// Per-component view of the tick and the scene
pub struct UpdateContext<'a, P: Pose> {
    pub(crate) delta_time: f32,
    pub(crate) tick: u64,
    pub(crate) input: &'a InputSnapshot,
    pub(crate) sounds: &'a mut SoundQueue,
    pub(crate) stop: &'a StopHandle,
    pub(crate) owner: ObjectId,
    pub(crate) component: ComponentId,
    pub(crate) transform: TransformId,
    pub(crate) objects: &'a SlotMap<ObjectId, GameObject<P>>,
    pub(crate) order: &'a [ObjectId],
    pub(crate) earlier: &'a [ComponentSlot<P>],
    pub(crate) later: &'a [ComponentSlot<P>],
    pub(crate) transforms: &'a mut TransformTree<P>,
    pub(crate) queue: &'a mut DeferredQueue<SceneOp<P>>,
}

impl<'a, P: Pose> UpdateContext<'a, P> {
    /// Fixed step in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Tick number
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Input snapshot for this tick
    pub fn input(&self) -> &InputSnapshot {
        self.input
    }

    /// Request a sound
    pub fn play_sound(&mut self, id: &str) {
        self.sounds.play(id);
    }

    /// Request a sound at a volume in `[0, 1]`
    pub fn play_sound_with_volume(&mut self, id: &str, volume: f32) {
        self.sounds.play_with_volume(id, volume);
    }

    /// Ask the engine to stop after this frame
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// The object owning the running component
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    /// The running component
    pub fn component_id(&self) -> ComponentId {
        self.component
    }

    /// The owner's transform node
    pub fn transform_id(&self) -> TransformId {
        self.transform
    }

    /// The whole transform tree
    pub fn transforms(&self) -> &TransformTree<P> {
        self.transforms
    }

    /// Owner's local pose
    pub fn local_pose(&self) -> Result<P, TransformError> {
        self.transforms.local(self.transform).copied().ok_or(TransformError::UnknownNode(self.transform))
    }

    /// Owner's world pose
    pub fn world_pose(&self) -> Result<P, TransformError> {
        self.transforms.world(self.transform).ok_or(TransformError::UnknownNode(self.transform))
    }

    /// Replace the owner's local pose
    pub fn set_local_pose(&mut self, pose: P) -> Result<(), TransformError> {
        self.transforms.set_local(self.transform, pose)
    }

    /// Move the owner
    pub fn translate(&mut self, delta: P::Vector) -> Result<(), TransformError> {
        self.transforms.translate(self.transform, delta)
    }

    /// Rotate the owner
    pub fn rotate(&mut self, delta: P::Rotation) -> Result<(), TransformError> {
        self.transforms.rotate(self.transform, delta)
    }

    /// Scale the owner
    pub fn scale(&mut self, factor: P::Vector) -> Result<(), TransformError> {
        self.transforms.scale(self.transform, factor)
    }

    /// Set the owner's local position
    pub fn set_position(&mut self, position: P::Vector) -> Result<(), TransformError> {
        self.transforms.set_position(self.transform, position)
    }

    /// Set the owner's local rotation
    pub fn set_rotation(&mut self, rotation: P::Rotation) -> Result<(), TransformError> {
        self.transforms.set_rotation(self.transform, rotation)
    }

    /// Re-parent one object under another, or make it a root, at the end of the tick
    ///
    /// Cycles and depth overflows are reported by the flush.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> Result<(), SceneError> {
        self.live_object(child)?;
        if let Some(parent) = parent {
            self.live_object(parent)?;
        }
        self.queue.push(SceneOp::SetParent(child, parent));
        Ok(())
    }

    fn live_object(&self, id: ObjectId) -> Result<&GameObject<P>, SceneError> {
        let object = self.objects.get(id).ok_or(SceneError::UnknownObject(id))?;
        if object.is_destroyed() {
            return Err(SceneError::ObjectDestroyed(id));
        }
        Ok(object)
    }

    /// Another object in the scene
    ///
    /// The owner itself is visible, but its components are not listed while it updates;
    /// use [`sibling`](Self::sibling) for those.
    pub fn object(&self, id: ObjectId) -> Option<&GameObject<P>> {
        self.objects.get(id)
    }

    /// World pose of any object
    pub fn world_pose_of(&self, id: ObjectId) -> Option<P> {
        self.objects.get(id).and_then(|object| self.transforms.world(object.transform()))
    }

    /// First live object with the given name, in scene order
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.live_objects().find(|(_, object)| object.name() == name).map(|(id, _)| id)
    }

    /// Live objects carrying `tag`, in scene order
    pub fn find_with_tag<'s>(&'s self, tag: &'s str) -> impl Iterator<Item = ObjectId> + 's {
        self.live_objects().filter(move |(_, object)| object.has_tag(tag)).map(|(id, _)| id)
    }

    fn live_objects(&self) -> impl Iterator<Item = (ObjectId, &GameObject<P>)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.objects.get(id).map(|object| (id, object)))
            .filter(|(_, object)| !object.is_destroyed())
    }

    /// First other live component of type `T` on the owner
    pub fn sibling<T: Component<P>>(&self) -> Option<&T> {
        self.siblings().find_map(ComponentSlot::downcast_ref::<T>)
    }

    /// The owner's other live components, in insertion order
    pub fn siblings(&self) -> impl Iterator<Item = &ComponentSlot<P>> + '_ {
        self.earlier.iter().chain(self.later.iter()).filter(|slot| slot.is_live())
    }

    fn has_component(&self, object: ObjectId, component: ComponentId) -> bool {
        if object == self.owner {
            component == self.component || self.siblings().any(|slot| slot.id() == component)
        } else {
            self.objects.get(object).is_some_and(|target| target.component(component).is_some())
        }
    }

    /// Destroy an object at the end of the tick
    pub fn destroy(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let object = self.objects.get(id).ok_or(SceneError::UnknownObject(id))?;
        if !object.is_destroyed() {
            self.queue.push(SceneOp::Destroy(id));
        }
        Ok(())
    }

    /// Destroy the owner at the end of the tick
    pub fn destroy_owner(&mut self) -> Result<(), SceneError> {
        self.destroy(self.owner)
    }

    /// Remove a component at the end of the tick
    pub fn remove_component(&mut self, object: ObjectId, component: ComponentId) -> Result<(), SceneError> {
        if !self.objects.contains_key(object) {
            return Err(SceneError::UnknownObject(object));
        }
        if !self.has_component(object, component) {
            return Err(SceneError::UnknownComponent { object, component });
        }
        self.queue.push(SceneOp::RemoveComponent(object, component));
        Ok(())
    }

    /// Remove the running component at the end of the tick
    pub fn remove_self(&mut self) -> Result<(), SceneError> {
        self.remove_component(self.owner, self.component)
    }

    /// Attach a component at the end of the tick; it starts on the next tick
    pub fn add_component<C: Component<P>>(&mut self, object: ObjectId, component: C) -> Result<(), SceneError> {
        self.live_object(object)?;
        self.queue.push(SceneOp::AddComponent(object, Box::new(component)));
        Ok(())
    }

    /// Run `spawn` against the scene at the end of the tick
    pub fn spawn(&mut self, spawn: impl FnOnce(&mut Scene<P>) -> Result<(), SceneError> + 'static) {
        self.queue.push(SceneOp::Spawn(Box::new(spawn)));
    }
}
