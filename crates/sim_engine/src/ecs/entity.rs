//! Entity implementation

use std::fmt;

/// Entity identifier
///
/// An index into the world's entity table plus the generation the slot had
/// when the handle was issued. Once the entity is destroyed the slot's
/// generation moves on, so old handles never alias the next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(super) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Issues entity handles and recycles freed slots
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    live: usize,
}

impl EntityAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle, reusing the most recently freed slot first
    pub fn allocate(&mut self) -> Entity {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::new(index, self.generations[slot]);
        }
        let index = u32::try_from(self.generations.len()).unwrap_or(u32::MAX);
        self.generations.push(0);
        self.alive.push(true);
        Entity::new(index, 0)
    }

    /// Release a live handle, bumping its slot's generation
    ///
    /// Returns `false` for stale or already freed handles.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(entity.index);
        self.live -= 1;
        true
    }

    /// Whether the handle refers to the current occupant of a live slot
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        self.alive.get(slot).copied().unwrap_or(false) && self.generations[slot] == entity.generation
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no entity is alive
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            .map(|(index, (_, generation))| Entity::new(index as u32, *generation))
    }

    /// Free every live entity
    pub fn clear(&mut self) {
        let live: Vec<Entity> = self.iter().collect();
        for entity in live {
            self.free(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recycled_slot_gets_new_generation() {
        let mut allocator = EntityAllocator::new();
        let first = allocator.allocate();
        assert!(allocator.free(first));
        let second = allocator.allocate();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(!allocator.is_alive(first));
        assert!(allocator.is_alive(second));
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut allocator = EntityAllocator::new();
        let entity = allocator.allocate();
        assert!(allocator.free(entity));
        assert!(!allocator.free(entity));
        assert!(allocator.is_empty());
    }

    #[test]
    fn test_iter_skips_freed() {
        let mut allocator = EntityAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        let c = allocator.allocate();
        allocator.free(b);
        assert_eq!(allocator.iter().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(allocator.len(), 2);

        allocator.clear();
        assert_eq!(allocator.iter().count(), 0);
    }

    #[test]
    fn test_display() {
        let mut allocator = EntityAllocator::new();
        let entity = allocator.allocate();
        allocator.free(entity);
        assert_eq!(allocator.allocate().to_string(), "0v1");
    }
}
