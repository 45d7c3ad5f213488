//! Per-archetype pool of recycled game objects

use super::game_object::GameObject;
use crate::transform::Pose;
use std::collections::HashMap;

/// Recycled objects waiting to be instantiated again, keyed by archetype
///
/// Everything in the pool has already been reset: no components, no tags,
/// identity transform, no parent.
#[derive(Debug)]
pub struct ObjectPool<P: Pose> {
    capacity: usize,
    free: HashMap<String, Vec<GameObject<P>>>,
}

impl<P: Pose> ObjectPool<P> {
    /// Create a pool holding at most `capacity` objects per archetype
    pub fn new(capacity: usize) -> Self {
        Self { capacity, free: HashMap::new() }
    }

    /// Per-archetype capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take a pooled object of `archetype`, if any
    pub fn acquire(&mut self, archetype: &str) -> Option<GameObject<P>> {
        self.free.get_mut(archetype).and_then(Vec::pop)
    }

    /// Return a reset object to the pool
    ///
    /// Gives the object back when it has no archetype or its archetype is full.
    pub fn release(&mut self, object: GameObject<P>) -> Result<(), GameObject<P>> {
        let Some(archetype) = object.archetype() else {
            return Err(object);
        };
        let bucket = self.free.entry(archetype.to_string()).or_default();
        if bucket.len() >= self.capacity {
            return Err(object);
        }
        bucket.push(object);
        Ok(())
    }

    /// Pooled objects of `archetype`
    pub fn len(&self, archetype: &str) -> usize {
        self.free.get(archetype).map_or(0, Vec::len)
    }

    /// Pooled objects across all archetypes
    pub fn total(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Whether the pool holds nothing
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Empty the pool, returning everything it held
    pub fn clear(&mut self) -> Vec<GameObject<P>> {
        self.free.drain().flat_map(|(_, objects)| objects).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Pose2, TransformTree};

    fn object(tree: &mut TransformTree<Pose2>, archetype: Option<&str>) -> GameObject<Pose2> {
        GameObject::new("thing".into(), tree.create_identity(), archetype.map(str::to_string))
    }

    #[test]
    fn test_release_respects_capacity_per_archetype() {
        let mut tree = TransformTree::new();
        let mut pool = ObjectPool::new(1);

        assert!(pool.release(object(&mut tree, Some("rock"))).is_ok());
        assert!(pool.release(object(&mut tree, Some("rock"))).is_err());
        assert!(pool.release(object(&mut tree, Some("ship"))).is_ok());
        assert!(pool.release(object(&mut tree, None)).is_err());

        assert_eq!(pool.len("rock"), 1);
        assert_eq!(pool.total(), 2);
    }

    #[test]
    fn test_acquire_by_archetype() {
        let mut tree = TransformTree::new();
        let mut pool = ObjectPool::new(4);
        pool.release(object(&mut tree, Some("rock"))).ok();

        assert!(pool.acquire("ship").is_none());
        let rock = pool.acquire("rock");
        assert_eq!(rock.as_ref().and_then(GameObject::archetype), Some("rock"));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_clear_returns_everything() {
        let mut tree = TransformTree::new();
        let mut pool = ObjectPool::new(4);
        pool.release(object(&mut tree, Some("a"))).ok();
        pool.release(object(&mut tree, Some("b"))).ok();
        assert_eq!(pool.clear().len(), 2);
        assert_eq!(pool.total(), 0);
    }
}
