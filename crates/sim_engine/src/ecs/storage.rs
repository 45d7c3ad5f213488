//! Per-type component storage
//!
//! Each component type lives in its own sparse set: a dense array of values,
//! a parallel array of owning entities, and a sparse index from entity slot
//! to dense position. Insert and remove are O(1); removal swaps the last
//! element into the hole.

use super::entity::Entity;
use super::Component;
use std::any::Any;

/// Sparse-set storage for one component type
#[derive(Debug)]
pub struct ComponentStorage<T> {
    dense: Vec<T>,
    entities: Vec<Entity>,
    sparse: Vec<Option<u32>>,
}

impl<T> ComponentStorage<T> {
    /// Create an empty storage
    pub fn new() -> Self {
        Self { dense: Vec::new(), entities: Vec::new(), sparse: Vec::new() }
    }

    fn position(&self, entity: Entity) -> Option<usize> {
        let position = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[position] == entity).then_some(position)
    }

    /// Insert or replace the component of `entity`, returning the old value
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, None);
        }
        if let Some(position) = self.sparse[slot].map(|position| position as usize) {
            self.entities[position] = entity;
            return Some(std::mem::replace(&mut self.dense[position], value));
        }
        self.sparse[slot] = Some(self.dense.len() as u32);
        self.dense.push(value);
        self.entities.push(entity);
        None
    }

    /// Component of `entity`
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.position(entity).map(|position| &self.dense[position])
    }

    /// Component of `entity`, mutably
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.position(entity).map(|position| &mut self.dense[position])
    }

    /// Remove the component of `entity`
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let position = self.position(entity)?;
        self.sparse[entity.index() as usize] = None;
        let value = self.dense.swap_remove(position);
        self.entities.swap_remove(position);
        if let Some(moved) = self.entities.get(position) {
            self.sparse[moved.index() as usize] = Some(position as u32);
        }
        Some(value)
    }

    /// Whether `entity` has a component here
    pub fn contains(&self, entity: Entity) -> bool {
        self.position(entity).is_some()
    }

    /// Number of components stored
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owning entities in dense order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity and component pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Entity and mutable component pairs in dense order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.dense.clear();
        self.entities.clear();
        self.sparse.clear();
    }
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentStorage`], held by the world per component type
pub trait ErasedStorage: Any {
    /// Borrow as `Any` for downcasting to the typed storage
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drop the component of `entity`, returning whether one was stored
    fn remove_entity(&mut self, entity: Entity) -> bool;
    /// Whether `entity` has a component here
    fn contains_entity(&self, entity: Entity) -> bool;
    /// Number of components stored
    fn len(&self) -> usize;
    /// Owning entities in dense order
    fn entities(&self) -> &[Entity];
    /// Component type name
    fn type_name(&self) -> &'static str;
    /// Remove everything
    fn clear(&mut self);
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn len(&self) -> usize {
        ComponentStorage::len(self)
    }

    fn entities(&self) -> &[Entity] {
        ComponentStorage::entities(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn clear(&mut self) {
        ComponentStorage::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    #[test]
    fn test_insert_get_replace() {
        let mut storage = ComponentStorage::new();
        assert_eq!(storage.insert(entity(3), "a"), None);
        assert_eq!(storage.insert(entity(3), "b"), Some("a"));
        assert_eq!(storage.get(entity(3)), Some(&"b"));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(entity(0)), None);
    }

    #[test]
    fn test_remove_swaps_last_into_hole() {
        let mut storage = ComponentStorage::new();
        for index in 0..4 {
            storage.insert(entity(index), index * 10);
        }
        assert_eq!(storage.remove(entity(1)), Some(10));
        assert_eq!(storage.entities(), &[entity(0), entity(3), entity(2)]);
        assert_eq!(storage.get(entity(3)), Some(&30));
        assert_eq!(storage.remove(entity(1)), None);

        // Removing the last element leaves nothing to patch
        assert_eq!(storage.remove(entity(2)), Some(20));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_other_generation_is_not_found() {
        let mut storage = ComponentStorage::new();
        storage.insert(Entity::new(0, 1), 5);
        assert!(!storage.contains(Entity::new(0, 0)));
        assert!(storage.get_mut(Entity::new(0, 1)).is_some());
    }

    #[test]
    fn test_iter_mut() {
        let mut storage = ComponentStorage::new();
        storage.insert(entity(0), 1);
        storage.insert(entity(5), 2);
        for (_, value) in storage.iter_mut() {
            *value *= 3;
        }
        assert_eq!(storage.iter().map(|(_, value)| *value).collect::<Vec<_>>(), vec![3, 6]);
    }
}
