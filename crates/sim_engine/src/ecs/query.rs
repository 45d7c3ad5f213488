//! Query system for component access
//!
//! A query walks the entities of the smallest storage among the requested
//! component types and probes the other storages for membership, so a rare
//! component keeps the whole query cheap. Queries are lazy and `Clone`; a
//! clone starts over from the beginning.

use super::entity::Entity;
use super::world::World;
use super::Component;
use std::any::TypeId;
use std::marker::PhantomData;

/// A tuple of component types that can be fetched together
pub trait ComponentSet: 'static {
    /// Borrowed components for one entity
    type Item<'w>;

    /// Type ids of every member
    fn type_ids() -> Vec<TypeId>;

    /// Fetch every member for `entity`, or `None` if any is missing
    fn fetch(world: &World, entity: Entity) -> Option<Self::Item<'_>>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Item<'w> = ($(&'w $name,)+);

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn fetch(world: &World, entity: Entity) -> Option<Self::Item<'_>> {
                Some(($(world.get_component::<$name>(entity)?,)+))
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

/// Lazy iterator over entities holding every component in `Q`
pub struct Query<'w, Q: ComponentSet> {
    world: &'w World,
    driver: &'w [Entity],
    position: usize,
    _marker: PhantomData<fn() -> Q>,
}

impl<'w, Q: ComponentSet> Query<'w, Q> {
    pub(super) fn new(world: &'w World) -> Self {
        let mut driver: &'w [Entity] = &[];
        let mut smallest = usize::MAX;
        for type_id in Q::type_ids() {
            match world.storage_entities(type_id) {
                Some(entities) if entities.len() < smallest => {
                    smallest = entities.len();
                    driver = entities;
                }
                Some(_) => {}
                None => {
                    // A type nobody has means an empty result
                    driver = &[];
                    break;
                }
            }
        }
        Self { world, driver, position: 0, _marker: PhantomData }
    }

    /// Number of candidates the query walks: the size of its smallest storage
    pub fn candidates(&self) -> usize {
        self.driver.len()
    }

    /// Start again from the first candidate
    pub fn restart(&mut self) {
        self.position = 0;
    }

    /// Matching entities only
    pub fn entities(self) -> impl Iterator<Item = Entity> + 'w {
        self.map(|(entity, _)| entity)
    }
}

impl<'w, Q: ComponentSet> Iterator for Query<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&entity) = self.driver.get(self.position) {
            self.position += 1;
            if let Some(item) = Q::fetch(self.world, entity) {
                return Some((entity, item));
            }
        }
        None
    }
}

impl<Q: ComponentSet> Clone for Query<'_, Q> {
    fn clone(&self) -> Self {
        Self { world: self.world, driver: self.driver, position: 0, _marker: PhantomData }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::logging::Logger;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Marker;
    impl Component for Marker {}

    struct Unused;
    impl Component for Unused {}

    #[test]
    fn test_query_intersects_and_drives_from_smallest() {
        let mut world = World::new(Logger::disabled());
        let mut marked = Vec::new();
        for index in 0..10 {
            let entity = world.create_entity();
            world.add_component(entity, Position(index)).unwrap();
            if index % 5 == 0 {
                world.add_component(entity, Marker).unwrap();
                marked.push(entity);
            }
        }

        let query = world.query::<(Position, Marker)>();
        assert_eq!(query.candidates(), 2);
        let found: Vec<Entity> = query.clone().entities().collect();
        assert_eq!(found, marked);
        assert_eq!(query.map(|(_, (position, _))| position.0).collect::<Vec<_>>(), vec![0, 5]);
    }

    #[test]
    fn test_query_is_restartable() {
        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, Position(1)).unwrap();

        let mut query = world.query::<(Position,)>();
        assert_eq!(query.next().map(|(found, _)| found), Some(entity));
        assert!(query.next().is_none());
        query.restart();
        assert_eq!(query.count(), 1);
    }

    #[test]
    fn test_missing_storage_yields_nothing() {
        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, Position(1)).unwrap();
        assert_eq!(world.query::<(Position, Unused)>().count(), 0);
    }
}
