//! ECS World implementation
//!
//! The world owns the entity allocator, one sparse-set storage per component
//! type, and the ordered system list. Structural changes requested while a
//! system runs are queued and applied at the post-tick flush, and the changes
//! a system queued are rolled back if it fails structurally.

use super::entity::{Entity, EntityAllocator};
use super::query::{ComponentSet, Query};
use super::storage::{ComponentStorage, ErasedStorage};
use super::system::System;
use super::{Component, EcsError};
use crate::core::tick::TickContext;
use crate::foundation::collections::{DeferredQueue, DeferredTarget, FlushOutcome};
use crate::foundation::logging::Logger;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Deferred component insertion
pub type InsertFn = Box<dyn FnOnce(&mut World, Entity) -> Result<(), EcsError>>;

/// Structural change waiting for the post-tick flush
pub enum WorldOp {
    /// Entity reserved mid-tick; released again if its system is rolled back
    Spawn(Entity),
    /// Insert a component
    Insert(Entity, InsertFn),
    /// Remove the component with the given type id
    Remove(Entity, TypeId),
    /// Destroy the entity and purge its components
    Despawn(Entity),
}

impl fmt::Debug for WorldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(entity) => f.debug_tuple("Spawn").field(entity).finish(),
            Self::Insert(entity, _) => f.debug_tuple("Insert").field(entity).finish(),
            Self::Remove(entity, type_id) => f.debug_tuple("Remove").field(entity).field(type_id).finish(),
            Self::Despawn(entity) => f.debug_tuple("Despawn").field(entity).finish(),
        }
    }
}

/// What happened during one [`World::update`]
#[derive(Debug, Default)]
pub struct WorldTickReport {
    /// Systems that completed without error
    pub systems_run: usize,
    /// Isolated system failures, logged and skipped
    pub isolated_errors: usize,
    /// Structural system failures, rolled back
    pub structural_errors: usize,
    /// Queued operations discarded by rollbacks
    pub rolled_back: usize,
    /// Result of the post-tick flush
    pub flush: FlushOutcome<EcsError>,
}

struct SystemEntry {
    system: Box<dyn System>,
    enabled: bool,
}

/// ECS World containing all entities, components and systems
pub struct World {
    entities: EntityAllocator,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    systems: Vec<SystemEntry>,
    queue: DeferredQueue<WorldOp>,
    pending_despawn: HashSet<Entity>,
    iterating: bool,
    logger: Logger,
}

impl World {
    /// Create an empty world
    pub fn new(logger: Logger) -> Self {
        Self {
            entities: EntityAllocator::new(),
            storages: HashMap::new(),
            systems: Vec::new(),
            queue: DeferredQueue::new(),
            pending_despawn: HashSet::new(),
            iterating: false,
            logger,
        }
    }

    /// Logging handle
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Whether a system is currently running
    pub fn is_iterating(&self) -> bool {
        self.iterating
    }

    /// Queued structural changes
    pub fn pending_changes(&self) -> usize {
        self.queue.len()
    }

    // ---- entities ----

    /// Create a new entity
    ///
    /// The handle is usable immediately, even from inside a system.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.allocate();
        if self.iterating {
            self.queue.push(WorldOp::Spawn(entity));
        }
        entity
    }

    /// Destroy an entity and every component it holds
    ///
    /// Deferred to the flush while a system runs.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        if self.iterating {
            if self.pending_despawn.insert(entity) {
                self.queue.push(WorldOp::Despawn(entity));
            }
            return Ok(());
        }
        self.despawn_now(entity)
    }

    fn despawn_now(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        self.entities.free(entity);
        Ok(())
    }

    fn check_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(entity))
        }
    }

    /// Whether the handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in slot order
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    // ---- components ----

    /// Add or replace a component
    ///
    /// Deferred to the flush while a system runs.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        if self.iterating {
            let insert: InsertFn = Box::new(move |world: &mut World, entity: Entity| world.insert_now(entity, component));
            self.queue.push(WorldOp::Insert(entity, insert));
            return Ok(());
        }
        self.insert_now(entity, component)
    }

    fn insert_now<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.storage_or_insert::<T>().insert(entity, component);
        Ok(())
    }

    /// Remove a component, returning whether the entity had one
    ///
    /// While a system runs the removal is queued and the result reports
    /// whether the component is present now.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<bool, EcsError> {
        self.check_alive(entity)?;
        if self.iterating {
            self.queue.push(WorldOp::Remove(entity, TypeId::of::<T>()));
            return Ok(self.has_component::<T>(entity));
        }
        Ok(self.storage_mut::<T>().and_then(|storage| storage.remove(entity)).is_some())
    }

    /// Component of a live entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity)
    }

    /// Component of a live entity, mutably
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Whether a live entity has a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Number of stored components of type `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    /// Typed storage for `T`, if any component of that type was ever added
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages.get(&TypeId::of::<T>())?.as_any().downcast_ref()
    }

    /// Typed storage for `T`, mutably
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages.get_mut(&TypeId::of::<T>())?.as_any_mut().downcast_mut()
    }

    fn storage_or_insert<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()));
        match storage.as_any_mut().downcast_mut() {
            Some(storage) => storage,
            // Keys are the TypeId of the stored type
            None => unreachable!("storage registered under a foreign type id"),
        }
    }

    pub(super) fn storage_entities(&self, type_id: TypeId) -> Option<&[Entity]> {
        self.storages.get(&type_id).map(|storage| storage.entities())
    }

    /// Lazy query over entities holding every component in `Q`
    pub fn query<Q: ComponentSet>(&self) -> Query<'_, Q> {
        Query::new(self)
    }

    // ---- systems ----

    /// Append a system; systems run in registration order
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.add_boxed_system(Box::new(system));
    }

    /// Append a boxed system
    ///
    /// A system added while systems run starts on the next tick.
    pub fn add_boxed_system(&mut self, mut system: Box<dyn System>) {
        system.on_added(self);
        self.logger.debug(format_args!("added system {}", system.name()));
        self.systems.push(SystemEntry { system, enabled: true });
    }

    fn system_position(&self, name: &str) -> Result<usize, EcsError> {
        self.systems
            .iter()
            .position(|entry| entry.system.name() == name)
            .ok_or_else(|| EcsError::UnknownSystem(name.to_string()))
    }

    /// Remove a system by name
    pub fn remove_system(&mut self, name: &str) -> Result<Box<dyn System>, EcsError> {
        if self.iterating {
            return Err(EcsError::MutationDuringIteration);
        }
        let position = self.system_position(name)?;
        let mut system = self.systems.remove(position).system;
        system.on_removed(self);
        Ok(system)
    }

    /// Swap a system for a new one in the same position, returning the old one
    pub fn replace_system(&mut self, name: &str, mut replacement: Box<dyn System>) -> Result<Box<dyn System>, EcsError> {
        if self.iterating {
            return Err(EcsError::MutationDuringIteration);
        }
        let position = self.system_position(name)?;
        replacement.on_added(self);
        let mut old = std::mem::replace(&mut self.systems[position].system, replacement);
        old.on_removed(self);
        self.logger.debug(format_args!("replaced system {name}"));
        Ok(old)
    }

    /// Enable or disable a system without changing the order
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> Result<(), EcsError> {
        if self.iterating {
            return Err(EcsError::MutationDuringIteration);
        }
        let position = self.system_position(name)?;
        self.systems[position].enabled = enabled;
        Ok(())
    }

    /// Whether the named system is registered and enabled
    pub fn is_system_enabled(&self, name: &str) -> bool {
        self.system_position(name).is_ok_and(|position| self.systems[position].enabled)
    }

    /// Registered system names in execution order
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|entry| entry.system.name()).collect()
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    // ---- tick ----

    /// Run every enabled system once, in order, then flush
    pub fn update(&mut self, tick: &mut TickContext<'_>) -> Result<WorldTickReport, EcsError> {
        if self.iterating {
            return Err(EcsError::MutationDuringIteration);
        }
        let mut report = WorldTickReport::default();
        let mut systems = std::mem::take(&mut self.systems);
        self.iterating = true;

        for entry in systems.iter_mut().filter(|entry| entry.enabled) {
            let checkpoint = self.queue.checkpoint();
            match entry.system.update(self, tick) {
                Ok(()) => report.systems_run += 1,
                Err(error) if error.is_structural() => {
                    let discarded = self.queue.rollback_to(checkpoint);
                    let count = discarded.len();
                    self.discard(discarded);
                    self.logger.error(format_args!(
                        "system {} failed, rolled back {count} change(s): {error}",
                        entry.system.name()
                    ));
                    report.structural_errors += 1;
                    report.rolled_back += count;
                }
                Err(error) => {
                    self.logger.warn(format_args!("system {} failed: {error}", entry.system.name()));
                    report.isolated_errors += 1;
                }
            }
        }

        self.iterating = false;
        let added = std::mem::replace(&mut self.systems, systems);
        self.systems.extend(added);
        report.flush = self.flush()?;
        Ok(report)
    }

    /// Undo the bookkeeping of operations dropped by a rollback
    fn discard(&mut self, ops: Vec<WorldOp>) {
        for op in ops {
            match op {
                WorldOp::Spawn(entity) => {
                    self.entities.free(entity);
                }
                WorldOp::Despawn(entity) => {
                    self.pending_despawn.remove(&entity);
                }
                WorldOp::Insert(..) | WorldOp::Remove(..) => {}
            }
        }
    }

    /// Apply every queued structural change
    pub fn flush(&mut self) -> Result<FlushOutcome<EcsError>, EcsError> {
        if self.iterating {
            return Err(EcsError::MutationDuringIteration);
        }
        if self.queue.is_empty() {
            return Ok(FlushOutcome::default());
        }
        let outcome = self.flush_deferred();
        self.pending_despawn.clear();
        for error in &outcome.errors {
            self.logger.warn(format_args!("world flush: {error}"));
        }
        self.logger.trace(format_args!(
            "world flushed {} change(s), {} entities",
            outcome.applied,
            self.entities.len()
        ));
        Ok(outcome)
    }

    /// Destroy every entity and drop every storage; systems stay registered
    pub fn clear(&mut self) -> Result<(), EcsError> {
        if self.iterating {
            return Err(EcsError::MutationDuringIteration);
        }
        self.queue.clear();
        self.pending_despawn.clear();
        self.storages.clear();
        self.entities.clear();
        Ok(())
    }
}

impl DeferredTarget for World {
    type Op = WorldOp;
    type Error = EcsError;

    fn deferred_queue(&mut self) -> &mut DeferredQueue<WorldOp> {
        &mut self.queue
    }

    fn apply_deferred(&mut self, op: WorldOp) -> Result<(), EcsError> {
        match op {
            WorldOp::Spawn(_) => Ok(()),
            WorldOp::Insert(entity, insert) => insert(self, entity),
            WorldOp::Remove(entity, type_id) => {
                self.check_alive(entity)?;
                if let Some(storage) = self.storages.get_mut(&type_id) {
                    storage.remove_entity(entity);
                }
                Ok(())
            }
            WorldOp::Despawn(entity) => {
                self.pending_despawn.remove(&entity);
                self.despawn_now(entity)
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Logger::new("sim_engine::ecs", crate::foundation::logging::LevelFilter::Info))
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("storages", &self.storages.values().map(|storage| storage.type_name()).collect::<Vec<_>>())
            .field("systems", &self.system_names())
            .field("pending", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tick::TickResources;
    use crate::ecs::SystemError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    const DT: Duration = Duration::from_millis(10);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Counter(u32);
    impl Component for Counter {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Doomed;
    impl Component for Doomed {}

    struct CountUp;

    impl System for CountUp {
        fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
            let entities: Vec<Entity> = world.query::<(Counter,)>().entities().collect();
            for entity in entities {
                if let Some(counter) = world.get_component_mut::<Counter>(entity) {
                    counter.0 += 1;
                }
            }
            Ok(())
        }
    }

    /// Destroys every `Doomed` entity and checks the storage has not changed yet
    struct Reaper {
        seen_during_run: usize,
    }

    impl System for Reaper {
        fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
            let doomed: Vec<Entity> = world.query::<(Doomed,)>().entities().collect();
            for entity in &doomed {
                world.destroy_entity(*entity)?;
                world.destroy_entity(*entity)?;
            }
            self.seen_during_run = world.query::<(Doomed,)>().count();
            Ok(())
        }
    }

    struct Saboteur;

    impl System for Saboteur {
        fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
            let spawned = world.create_entity();
            world.add_component(spawned, Counter(100))?;
            let victims: Vec<Entity> = world.query::<(Counter,)>().entities().collect();
            for victim in victims {
                world.destroy_entity(victim)?;
            }
            Err(SystemError::structural("corrupt"))
        }
    }

    fn run(world: &mut World, resources: &mut TickResources) -> WorldTickReport {
        let mut tick = resources.context(DT);
        world.update(&mut tick).expect("world update")
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut world = World::new(Logger::disabled());
        let old = world.create_entity();
        world.add_component(old, Counter(1)).unwrap();
        world.destroy_entity(old).unwrap();
        let new = world.create_entity();

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert_eq!(world.add_component(old, Counter(2)), Err(EcsError::StaleEntity(old)));
        assert_eq!(world.remove_component::<Counter>(old), Err(EcsError::StaleEntity(old)));
        assert_eq!(world.destroy_entity(old), Err(EcsError::StaleEntity(old)));
        assert!(world.get_component::<Counter>(old).is_none());
        // Purged before reuse
        assert!(!world.has_component::<Counter>(new));
    }

    #[test]
    fn test_add_remove_query() {
        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, Counter(0)).unwrap();
        world.add_component(entity, Doomed).unwrap();
        assert_eq!(world.query::<(Counter, Doomed)>().entities().collect::<Vec<_>>(), vec![entity]);

        assert_eq!(world.remove_component::<Doomed>(entity), Ok(true));
        assert_eq!(world.remove_component::<Doomed>(entity), Ok(false));
        assert_eq!(world.query::<(Counter, Doomed)>().count(), 0);
        assert_eq!(world.component_count::<Counter>(), 1);
    }

    #[test]
    fn test_systems_run_in_order_and_defer_destroys() {
        let mut world = World::new(Logger::disabled());
        let keeper = world.create_entity();
        world.add_component(keeper, Counter(0)).unwrap();
        let doomed = world.create_entity();
        world.add_component(doomed, Doomed).unwrap();
        world.add_system(Reaper { seen_during_run: 0 });
        world.add_system(CountUp);
        assert_eq!(world.system_names(), vec!["Reaper", "CountUp"]);

        let mut resources = TickResources::new();
        let report = run(&mut world, &mut resources);
        assert_eq!(report.systems_run, 2);
        assert_eq!(report.flush.applied, 1);
        assert!(!world.is_alive(doomed));
        assert_eq!(world.get_component::<Counter>(keeper), Some(&Counter(1)));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_structural_failure_rolls_back_queued_changes() {
        let mut world = World::new(Logger::disabled());
        let survivor = world.create_entity();
        world.add_component(survivor, Counter(0)).unwrap();
        world.add_system(Saboteur);

        let mut resources = TickResources::new();
        let report = run(&mut world, &mut resources);
        assert_eq!(report.structural_errors, 1);
        assert_eq!(report.rolled_back, 3);
        assert!(report.flush.is_clean());
        assert!(world.is_alive(survivor));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.component_count::<Counter>(), 1);
    }

    #[test]
    fn test_structure_is_locked_while_iterating() {
        struct Meddler {
            results: Rc<RefCell<Vec<EcsError>>>,
        }

        impl System for Meddler {
            fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
                let mut results = self.results.borrow_mut();
                results.extend(world.flush().err());
                results.extend(world.update(ctx).err());
                results.extend(world.remove_system("CountUp").err());
                results.extend(world.set_system_enabled("CountUp", false).err());
                results.extend(world.clear().err());
                Ok(())
            }
        }

        let results = Rc::new(RefCell::new(Vec::new()));
        let mut world = World::new(Logger::disabled());
        world.add_system(Meddler { results: results.clone() });
        world.add_system(CountUp);
        let mut resources = TickResources::new();
        run(&mut world, &mut resources);

        assert_eq!(*results.borrow(), vec![EcsError::MutationDuringIteration; 5]);
        assert_eq!(world.system_names(), vec!["Meddler", "CountUp"]);
        assert!(world.is_system_enabled("CountUp"));
    }

    #[test]
    fn test_deferred_insert_applies_after_tick() {
        struct Tagger;

        impl System for Tagger {
            fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
                let entities: Vec<Entity> = world.query::<(Counter,)>().entities().collect();
                for entity in entities {
                    world.add_component(entity, Doomed)?;
                    assert!(!world.has_component::<Doomed>(entity));
                }
                let fresh = world.create_entity();
                world.add_component(fresh, Counter(7))?;
                Ok(())
            }
        }

        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, Counter(0)).unwrap();
        world.add_system(Tagger);
        let mut resources = TickResources::new();
        let report = run(&mut world, &mut resources);

        assert_eq!(report.flush.applied, 3);
        assert!(world.has_component::<Doomed>(entity));
        assert_eq!(world.component_count::<Counter>(), 2);
    }

    #[test]
    fn test_flush_reports_stale_operations() {
        struct DestroyThenTag;

        impl System for DestroyThenTag {
            fn update(&mut self, world: &mut World, _ctx: &mut TickContext<'_>) -> Result<(), SystemError> {
                let entities: Vec<Entity> = world.query::<(Counter,)>().entities().collect();
                for entity in entities {
                    world.destroy_entity(entity)?;
                    world.add_component(entity, Doomed)?;
                }
                Ok(())
            }
        }

        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, Counter(0)).unwrap();
        world.add_system(DestroyThenTag);
        let mut resources = TickResources::new();
        let report = run(&mut world, &mut resources);

        assert_eq!(report.flush.errors, vec![EcsError::StaleEntity(entity)]);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.component_count::<Doomed>(), 0);
    }

    #[test]
    fn test_replace_and_disable_systems() {
        let mut world = World::new(Logger::disabled());
        let entity = world.create_entity();
        world.add_component(entity, Counter(0)).unwrap();
        world.add_system(CountUp);

        world.set_system_enabled("CountUp", false).unwrap();
        assert!(!world.is_system_enabled("CountUp"));
        let mut resources = TickResources::new();
        run(&mut world, &mut resources);
        assert_eq!(world.get_component::<Counter>(entity), Some(&Counter(0)));

        world.set_system_enabled("CountUp", true).unwrap();
        let old = world.replace_system("CountUp", Box::new(CountUp)).unwrap();
        assert_eq!(old.name(), "CountUp");
        run(&mut world, &mut resources);
        assert_eq!(world.get_component::<Counter>(entity), Some(&Counter(1)));
        assert!(matches!(world.remove_system("Missing"), Err(EcsError::UnknownSystem(_))));
    }

    #[test]
    fn test_clear() {
        let mut world = World::new(Logger::disabled());
        for _ in 0..3 {
            let entity = world.create_entity();
            world.add_component(entity, Counter(0)).unwrap();
        }
        world.add_system(CountUp);
        world.clear().unwrap();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.component_count::<Counter>(), 0);
        assert_eq!(world.system_count(), 1);
    }
}
