//! Game objects: named owners of one transform and an ordered set of components

use super::component::{Component, ComponentId, ComponentSlot};
use crate::transform::{Pose, TransformId};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Handle to a game object in a [`Scene`](super::Scene)
    ///
    /// Handles are generational: once an object is destroyed, or recycled
    /// through the pool under a new handle, the old handle resolves to nothing.
    pub struct ObjectId;
}

/// A named container owning one transform and its components
pub struct GameObject<P: Pose> {
    name: String,
    tags: Vec<String>,
    active: bool,
    z_order: i32,
    transform: TransformId,
    archetype: Option<String>,
    pub(crate) destroyed: bool,
    pub(crate) components: Vec<ComponentSlot<P>>,
}

impl<P: Pose> GameObject<P> {
    pub(crate) fn new(name: String, transform: TransformId, archetype: Option<String>) -> Self {
        Self {
            name,
            tags: Vec::new(),
            active: true,
            z_order: 0,
            transform,
            archetype,
            destroyed: false,
            components: Vec::new(),
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Tags in the order they were added
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Add a tag if not already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.has_tag(&tag) {
            self.tags.push(tag);
        }
    }

    /// Remove a tag, returning whether it was present
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        self.tags.len() != before
    }

    /// Whether the object carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    /// Inactive objects are neither updated nor drawn
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable updates and drawing
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Draw depth; higher values are drawn on top
    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    /// Set the draw depth
    pub fn set_z_order(&mut self, z_order: i32) {
        self.z_order = z_order;
    }

    /// The object's transform node
    pub fn transform(&self) -> TransformId {
        self.transform
    }

    /// Pool archetype, for objects created through `instantiate`
    pub fn archetype(&self) -> Option<&str> {
        self.archetype.as_deref()
    }

    /// Whether the object is marked for destruction at the next flush
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Live components in insertion order
    pub fn components(&self) -> impl Iterator<Item = &ComponentSlot<P>> + Clone {
        self.components.iter().filter(|slot| slot.is_live())
    }

    /// Number of live components
    pub fn component_count(&self) -> usize {
        self.components().count()
    }

    /// First live component of type `T`
    pub fn get_component<T: Component<P>>(&self) -> Option<&T> {
        self.components().find_map(ComponentSlot::downcast_ref::<T>)
    }

    /// First live component of type `T`, mutably
    pub fn get_component_mut<T: Component<P>>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .filter(|slot| slot.is_live())
            .find_map(ComponentSlot::downcast_mut::<T>)
    }

    /// Every live component of type `T`, lazily and in insertion order
    ///
    /// The iterator is `Clone`, so the sequence can be restarted.
    pub fn get_components<T: Component<P>>(&self) -> impl Iterator<Item = &T> + Clone {
        self.components().filter_map(ComponentSlot::downcast_ref::<T>)
    }

    /// Whether a live component of type `T` is attached
    pub fn has_component<T: Component<P>>(&self) -> bool {
        self.get_component::<T>().is_some()
    }

    /// Live component with the given id
    pub fn component(&self, id: ComponentId) -> Option<&ComponentSlot<P>> {
        self.components().find(|slot| slot.id() == id)
    }

    /// Id of the first live component of type `T`
    pub fn component_id<T: Component<P>>(&self) -> Option<ComponentId> {
        self.components().find(|slot| slot.downcast_ref::<T>().is_some()).map(ComponentSlot::id)
    }

    pub(crate) fn slot_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot<P>> {
        self.components.iter_mut().find(|slot| slot.id() == id && slot.is_live())
    }

    /// Strip everything but the transform and archetype, ready for reuse
    pub(crate) fn reset_for_pool(&mut self) {
        for slot in self.components.drain(..) {
            slot.destroy();
        }
        self.tags.clear();
        self.active = true;
        self.z_order = 0;
        self.destroyed = false;
    }
}

impl<P: Pose> fmt::Debug for GameObject<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("active", &self.active)
            .field("z_order", &self.z_order)
            .field("transform", &self.transform)
            .field("archetype", &self.archetype)
            .field("destroyed", &self.destroyed)
            .field("components", &self.components)
            .finish()
    }
}
