//! Scene: ordered, pooled collection of game objects
//!
//! The scene owns every object, its transform node and its components. Each
//! tick it updates live objects in scene order and their components in
//! insertion order, then flushes the structural changes marked during the
//! tick. Destroyed objects are unlinked at the flush, reset, and returned to
//! their archetype's pool when there is room.

use super::component::{Component, ComponentId, ComponentSlot};
use super::context::UpdateContext;
use super::game_object::{GameObject, ObjectId};
use super::pool::ObjectPool;
use super::SceneError;
use crate::core::config::SceneConfig;
use crate::core::tick::TickContext;
use crate::foundation::collections::{DeferredQueue, DeferredTarget, FlushOutcome};
use crate::foundation::logging::Logger;
use crate::render::DrawList;
use crate::transform::{Pose, Pose2, TransformId, TransformTree};
use slotmap::{SecondaryMap, SlotMap};
use std::fmt;

/// Deferred closure run against the scene at the flush
pub type SpawnFn<P> = Box<dyn FnOnce(&mut Scene<P>) -> Result<(), SceneError>>;

/// Structural change waiting for the end-of-tick flush
pub enum SceneOp<P: Pose> {
    /// Unlink the object and recycle it
    Destroy(ObjectId),
    /// Detach one component
    RemoveComponent(ObjectId, ComponentId),
    /// Attach a component
    AddComponent(ObjectId, Box<dyn Component<P>>),
    /// Re-parent the first object under the second, or make it a root
    SetParent(ObjectId, Option<ObjectId>),
    /// Run a closure against the scene
    Spawn(SpawnFn<P>),
}

impl<P: Pose> fmt::Debug for SceneOp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroy(id) => f.debug_tuple("Destroy").field(id).finish(),
            Self::RemoveComponent(id, component) => {
                f.debug_tuple("RemoveComponent").field(id).field(component).finish()
            }
            Self::AddComponent(id, component) => {
                f.debug_tuple("AddComponent").field(id).field(&component.name()).finish()
            }
            Self::SetParent(child, parent) => f.debug_tuple("SetParent").field(child).field(parent).finish(),
            Self::Spawn(_) => f.write_str("Spawn(..)"),
        }
    }
}

/// What happened during one [`Scene::update`]
#[derive(Debug, Default)]
pub struct SceneTickReport {
    /// Component updates run
    pub components_updated: usize,
    /// Isolated component failures, logged and skipped
    pub isolated_errors: usize,
    /// Structural component failures, rolled back
    pub structural_errors: usize,
    /// Queued operations discarded by rollbacks
    pub rolled_back: usize,
    /// Result of the end-of-tick flush
    pub flush: FlushOutcome<SceneError>,
}

/// Ordered, pooled collection of game objects
pub struct Scene<P: Pose = Pose2> {
    name: String,
    objects: SlotMap<ObjectId, GameObject<P>>,
    order: Vec<ObjectId>,
    transforms: TransformTree<P>,
    owners: SecondaryMap<TransformId, ObjectId>,
    pool: ObjectPool<P>,
    queue: DeferredQueue<SceneOp<P>>,
    next_component: u64,
    flushing: bool,
    logger: Logger,
}

impl<P: Pose> Scene<P> {
    /// Create an empty scene with default limits
    pub fn new(name: impl Into<String>, logger: Logger) -> Self {
        Self::with_config(name, &SceneConfig::default(), logger)
    }

    /// Create an empty scene with the given pool capacity and hierarchy depth
    pub fn with_config(name: impl Into<String>, config: &SceneConfig, logger: Logger) -> Self {
        Self {
            name: name.into(),
            objects: SlotMap::with_key(),
            order: Vec::new(),
            transforms: TransformTree::with_max_depth(config.max_hierarchy_depth),
            owners: SecondaryMap::new(),
            pool: ObjectPool::new(config.pool_capacity),
            queue: DeferredQueue::new(),
            next_component: 0,
            flushing: false,
            logger,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logging handle
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    // ---- objects ----

    /// Create an object with an identity transform
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        self.spawn_at(name, P::identity())
    }

    /// Create an object at a local pose
    pub fn spawn_at(&mut self, name: impl Into<String>, pose: P) -> ObjectId {
        let transform = self.transforms.create(pose);
        self.link(GameObject::new(name.into(), transform, None))
    }

    /// Create an object of `archetype`, reusing a pooled one when available
    pub fn instantiate(&mut self, archetype: &str, name: impl Into<String>) -> ObjectId {
        match self.pool.acquire(archetype) {
            Some(mut object) => {
                object.set_name(name);
                self.logger.trace(format_args!("reused pooled '{archetype}'"));
                self.link(object)
            }
            None => {
                let transform = self.transforms.create_identity();
                self.link(GameObject::new(name.into(), transform, Some(archetype.to_string())))
            }
        }
    }

    /// [`instantiate`](Self::instantiate) and place the object at `pose`
    pub fn instantiate_at(&mut self, archetype: &str, name: impl Into<String>, pose: P) -> ObjectId {
        let id = self.instantiate(archetype, name);
        if let Some(object) = self.objects.get(id) {
            // The transform was just created or reset, so it exists
            self.transforms.set_local(object.transform(), pose).ok();
        }
        id
    }

    fn link(&mut self, object: GameObject<P>) -> ObjectId {
        let transform = object.transform();
        let id = self.objects.insert(object);
        self.owners.insert(transform, id);
        self.order.push(id);
        id
    }

    /// Mark an object for destruction at the next flush
    ///
    /// Destroying an already destroyed object is a no-op.
    pub fn destroy(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let object = self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))?;
        if !object.destroyed {
            object.destroyed = true;
            self.queue.push(SceneOp::Destroy(id));
        }
        Ok(())
    }

    /// Object by handle, including objects awaiting the flush
    pub fn get(&self, id: ObjectId) -> Option<&GameObject<P>> {
        self.objects.get(id)
    }

    /// Object by handle, mutably
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject<P>> {
        self.objects.get_mut(id)
    }

    /// Whether the handle refers to a linked object
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Objects not marked for destruction, in update order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &GameObject<P>)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.objects.get(id).map(|object| (id, object)))
            .filter(|(_, object)| !object.is_destroyed())
    }

    /// First live object named `name`
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects().find(|(_, object)| object.name() == name).map(|(id, _)| id)
    }

    /// Live objects tagged `tag`, in update order
    pub fn find_with_tag<'s>(&'s self, tag: &'s str) -> impl Iterator<Item = ObjectId> + 's {
        self.objects().filter(move |(_, object)| object.has_tag(tag)).map(|(id, _)| id)
    }

    /// Linked objects, including those marked for destruction
    pub fn object_count(&self) -> usize {
        self.order.len()
    }

    /// Objects that will update next tick
    pub fn active_object_count(&self) -> usize {
        self.objects().filter(|(_, object)| object.is_active()).count()
    }

    /// Objects waiting in the pool
    pub fn pooled_count(&self) -> usize {
        self.pool.total()
    }

    /// Pooled objects of one archetype
    pub fn pooled_count_of(&self, archetype: &str) -> usize {
        self.pool.len(archetype)
    }

    /// Queued structural changes
    pub fn pending_changes(&self) -> usize {
        self.queue.len()
    }

    // ---- components ----

    /// Attach a component; it starts on its first update
    pub fn add_component<C: Component<P>>(&mut self, id: ObjectId, component: C) -> Result<ComponentId, SceneError> {
        self.add_boxed_component(id, Box::new(component))
    }

    /// Attach a boxed component
    pub fn add_boxed_component(
        &mut self,
        id: ObjectId,
        mut component: Box<dyn Component<P>>,
    ) -> Result<ComponentId, SceneError> {
        let object = self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))?;
        if object.destroyed {
            return Err(SceneError::ObjectDestroyed(id));
        }
        let component_id = ComponentId(self.next_component);
        self.next_component += 1;
        component.on_attach(id);
        object.components.push(ComponentSlot::new(component_id, component));
        Ok(component_id)
    }

    /// Mark a component for removal at the next flush
    pub fn remove_component(&mut self, id: ObjectId, component: ComponentId) -> Result<(), SceneError> {
        let object = self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))?;
        let slot = object
            .slot_mut(component)
            .ok_or(SceneError::UnknownComponent { object: id, component })?;
        slot.mark_destroyed();
        self.queue.push(SceneOp::RemoveComponent(id, component));
        Ok(())
    }

    /// Swap a component's behaviour in place, returning the old one
    ///
    /// The replacement keeps the slot's id and position in the update order and
    /// is started again on its next update. Either the swap happens or nothing changes.
    pub fn replace_component(
        &mut self,
        id: ObjectId,
        component: ComponentId,
        replacement: Box<dyn Component<P>>,
    ) -> Result<Box<dyn Component<P>>, SceneError> {
        let object = self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))?;
        if object.destroyed {
            return Err(SceneError::ObjectDestroyed(id));
        }
        let slot = object
            .slot_mut(component)
            .ok_or(SceneError::UnknownComponent { object: id, component })?;
        Ok(slot.replace(id, replacement))
    }

    /// First live component of type `T` on an object
    pub fn get_component<T: Component<P>>(&self, id: ObjectId) -> Option<&T> {
        self.objects.get(id)?.get_component::<T>()
    }

    /// First live component of type `T` on an object, mutably
    pub fn get_component_mut<T: Component<P>>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.objects.get_mut(id)?.get_component_mut::<T>()
    }

    // ---- transforms ----

    /// The scene's transform tree
    pub fn transforms(&self) -> &TransformTree<P> {
        &self.transforms
    }

    /// The scene's transform tree, mutably
    pub fn transforms_mut(&mut self) -> &mut TransformTree<P> {
        &mut self.transforms
    }

    /// Parent one object's transform under another's, or make it a root
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> Result<(), SceneError> {
        let child = self.objects.get(child).ok_or(SceneError::UnknownObject(child))?.transform();
        let parent = parent
            .map(|parent| self.objects.get(parent).map(GameObject::transform).ok_or(SceneError::UnknownObject(parent)))
            .transpose()?;
        Ok(self.transforms.set_parent(child, parent)?)
    }

    /// Parent object of an object, if its transform has one
    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        let parent = self.transforms.parent(self.objects.get(id)?.transform())?;
        self.owners.get(parent).copied()
    }

    /// Local pose of an object
    pub fn local_pose(&self, id: ObjectId) -> Option<P> {
        self.transforms.local(self.objects.get(id)?.transform()).copied()
    }

    /// World pose of an object
    pub fn world_pose(&self, id: ObjectId) -> Option<P> {
        self.transforms.world(self.objects.get(id)?.transform())
    }

    // ---- tick ----

    /// Update every live object once, then flush
    ///
    /// Component failures never abort the tick. An isolated failure is logged;
    /// a structural one also discards what the component queued during this
    /// update and restores its owner's local pose.
    pub fn update(&mut self, tick: &mut TickContext<'_>) -> Result<SceneTickReport, SceneError> {
        if self.flushing {
            return Err(SceneError::FlushInProgress);
        }
        let mut report = SceneTickReport::default();
        // Spawns are deferred, so the order cannot grow while iterating
        for index in 0..self.order.len() {
            let id = self.order[index];
            self.update_object(id, tick, &mut report);
        }
        report.flush = self.flush()?;
        Ok(report)
    }

    fn update_object(&mut self, id: ObjectId, tick: &mut TickContext<'_>, report: &mut SceneTickReport) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        if object.destroyed || !object.is_active() {
            return;
        }
        let transform = object.transform();
        let mut components = std::mem::take(&mut object.components);

        for index in 0..components.len() {
            if self.objects.get(id).map_or(true, GameObject::is_destroyed) {
                break;
            }
            if !components[index].is_live() {
                continue;
            }
            let checkpoint = self.queue.checkpoint();
            let saved_pose = self.transforms.local(transform).copied();

            let (earlier, rest) = components.split_at_mut(index);
            let Some((slot, later)) = rest.split_first_mut() else {
                break;
            };
            let mut ctx = UpdateContext {
                delta_time: tick.delta_time,
                tick: tick.tick,
                input: tick.input,
                sounds: &mut *tick.sounds,
                stop: tick.stop,
                owner: id,
                component: slot.id(),
                transform,
                objects: &self.objects,
                order: &self.order,
                earlier: &*earlier,
                later: &*later,
                transforms: &mut self.transforms,
                queue: &mut self.queue,
            };
            let result = slot.run(&mut ctx);
            report.components_updated += 1;

            match result {
                Err(error) if error.is_structural() => {
                    let discarded = self.queue.rollback_to(checkpoint);
                    if let Some(pose) = saved_pose {
                        self.transforms.set_local(transform, pose).ok();
                    }
                    self.logger.error(format_args!(
                        "{} on '{}' failed, rolled back {} change(s): {}",
                        components[index].component().name(),
                        self.objects.get(id).map_or("?", GameObject::name),
                        discarded.len(),
                        error
                    ));
                    report.structural_errors += 1;
                    report.rolled_back += discarded.len();
                    continue;
                }
                Err(error) => {
                    self.logger.warn(format_args!(
                        "{} on '{}' failed: {}",
                        components[index].component().name(),
                        self.objects.get(id).map_or("?", GameObject::name),
                        error
                    ));
                    report.isolated_errors += 1;
                }
                Ok(()) => {}
            }
            self.apply_marks(checkpoint, id, &mut components);
        }

        if let Some(object) = self.objects.get_mut(id) {
            object.components = components;
        }
    }

    /// Flag what a component queued, so later updates in the same tick skip it
    fn apply_marks(&mut self, checkpoint: usize, owner: ObjectId, owner_components: &mut [ComponentSlot<P>]) {
        for op in self.queue.since(checkpoint) {
            match op {
                SceneOp::Destroy(target) => {
                    if let Some(object) = self.objects.get_mut(*target) {
                        object.destroyed = true;
                    }
                }
                SceneOp::RemoveComponent(target, component) if *target == owner => {
                    if let Some(slot) = owner_components.iter_mut().find(|slot| slot.id() == *component) {
                        slot.mark_destroyed();
                    }
                }
                SceneOp::RemoveComponent(target, component) => {
                    if let Some(slot) = self.objects.get_mut(*target).and_then(|object| object.slot_mut(*component)) {
                        slot.mark_destroyed();
                    }
                }
                SceneOp::AddComponent(..) | SceneOp::SetParent(..) | SceneOp::Spawn(_) => {}
            }
        }
    }

    /// Apply every queued structural change
    pub fn flush(&mut self) -> Result<FlushOutcome<SceneError>, SceneError> {
        if self.flushing {
            return Err(SceneError::FlushInProgress);
        }
        if self.queue.is_empty() {
            return Ok(FlushOutcome::default());
        }
        self.flushing = true;
        let outcome = self.flush_deferred();
        self.flushing = false;

        self.order.retain(|id| self.objects.contains_key(*id));
        for error in &outcome.errors {
            self.logger.warn(format_args!("scene '{}' flush: {}", self.name, error));
        }
        self.logger.trace(format_args!(
            "scene '{}' flushed {} change(s), {} object(s), {} pooled",
            self.name,
            outcome.applied,
            self.order.len(),
            self.pool.total()
        ));
        Ok(outcome)
    }

    fn unlink(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let Some(mut object) = self.objects.remove(id) else {
            return Ok(());
        };
        let transform = object.transform();
        self.owners.remove(transform);
        object.reset_for_pool();
        self.transforms.reset(transform)?;
        if let Err(object) = self.pool.release(object) {
            self.transforms.remove(object.transform());
        }
        Ok(())
    }

    /// Emit draw commands for every live, active object, at its `z_order`
    pub fn draw(&self, out: &mut DrawList<P>) {
        let base_depth = out.depth();
        for (_, object) in self.objects() {
            if !object.is_active() {
                continue;
            }
            let Some(world) = self.transforms.world(object.transform()) else {
                continue;
            };
            out.set_depth(object.z_order());
            for slot in object.components() {
                slot.draw(&world, out);
            }
        }
        out.set_depth(base_depth);
    }

    /// Destroy every object and empty the pool
    pub fn clear(&mut self) -> Result<(), SceneError> {
        if self.flushing {
            return Err(SceneError::FlushInProgress);
        }
        let ids: Vec<ObjectId> = self.order.clone();
        for id in ids {
            self.destroy(id)?;
        }
        self.flush()?;
        for object in self.pool.clear() {
            self.transforms.remove(object.transform());
        }
        self.logger.debug(format_args!("scene '{}' cleared", self.name));
        Ok(())
    }
}

impl<P: Pose> DeferredTarget for Scene<P> {
    type Op = SceneOp<P>;
    type Error = SceneError;

    fn deferred_queue(&mut self) -> &mut DeferredQueue<SceneOp<P>> {
        &mut self.queue
    }

    fn apply_deferred(&mut self, op: SceneOp<P>) -> Result<(), SceneError> {
        match op {
            SceneOp::Destroy(id) => self.unlink(id),
            SceneOp::RemoveComponent(id, component) => {
                let Some(object) = self.objects.get_mut(id) else {
                    return Ok(());
                };
                if let Some(index) = object.components.iter().position(|slot| slot.id() == component) {
                    object.components.remove(index).destroy();
                }
                Ok(())
            }
            SceneOp::AddComponent(id, component) => self.add_boxed_component(id, component).map(|_| ()),
            SceneOp::SetParent(child, parent) => {
                if !self.objects.contains_key(child) {
                    return Ok(());
                }
                self.set_parent(child, parent)
            }
            SceneOp::Spawn(spawn) => spawn(self),
        }
    }
}

impl<P: Pose> fmt::Debug for Scene<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("objects", &self.order.len())
            .field("pooled", &self.pool.total())
            .field("pending", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tick::TickResources;
    use crate::foundation::math::Vec2;
    use crate::render::{Color, Shape};
    use crate::scene::{ComponentError, Lifecycle};
    use approx::assert_relative_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    const DT: Duration = Duration::from_millis(16);

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        label: &'static str,
        log: Log,
    }

    impl Component<Pose2> for Recorder {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            self.log.borrow_mut().push(format!("{}@{}", self.label, ctx.tick()));
            Ok(())
        }
    }

    struct Destroyer {
        target: Option<ObjectId>,
    }

    impl Component<Pose2> for Destroyer {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            if let Some(target) = self.target.take() {
                ctx.destroy(target)?;
            }
            Ok(())
        }
    }

    struct Mover {
        step: Vec2,
    }

    impl Component<Pose2> for Mover {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            ctx.translate(self.step)?;
            Ok(())
        }

        fn draw(&self, world: &Pose2, out: &mut DrawList<Pose2>) {
            out.push(*world, Shape::Circle { radius: 1.0 }, Color::WHITE);
        }
    }

    /// Moves, queues a destroy, then fails structurally
    struct Saboteur {
        victim: ObjectId,
    }

    impl Component<Pose2> for Saboteur {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            ctx.translate(Vec2::new(100.0, 0.0))?;
            ctx.destroy(self.victim)?;
            Err(ComponentError::structural("bad state"))
        }
    }

    /// Adopts `child` under its owner, optionally failing afterwards
    struct Adopter {
        child: ObjectId,
        fail: bool,
    }

    impl Component<Pose2> for Adopter {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            let owner = ctx.owner();
            ctx.set_parent(self.child, Some(owner))?;
            if self.fail {
                return Err(ComponentError::structural("adoption refused"));
            }
            Ok(())
        }
    }

    struct Flaky;

    impl Component<Pose2> for Flaky {
        fn update(&mut self, _ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            Err(ComponentError::isolated("flaky"))
        }
    }

    fn scene() -> Scene<Pose2> {
        Scene::new("test", Logger::disabled())
    }

    fn step(scene: &mut Scene<Pose2>, resources: &mut TickResources) -> SceneTickReport {
        let mut tick = resources.context(DT);
        scene.update(&mut tick).expect("update")
    }

    #[test]
    fn test_update_order_is_scene_then_insertion_order() {
        let mut scene = scene();
        let log = Log::default();
        let first = scene.spawn("first");
        let second = scene.spawn("second");
        scene.add_component(second, Recorder { label: "b1", log: log.clone() }).unwrap();
        scene.add_component(first, Recorder { label: "a1", log: log.clone() }).unwrap();
        scene.add_component(first, Recorder { label: "a2", log: log.clone() }).unwrap();

        let mut resources = TickResources::new();
        let report = step(&mut scene, &mut resources);

        assert_eq!(*log.borrow(), vec!["a1@0", "a2@0", "b1@0"]);
        assert_eq!(report.components_updated, 3);
    }

    #[test]
    fn test_destroy_during_update_is_deferred() {
        let mut scene = scene();
        let log = Log::default();
        let a = scene.spawn("a");
        let b = scene.spawn("b");
        let c = scene.spawn("c");
        scene.add_component(a, Destroyer { target: Some(c) }).unwrap();
        scene.add_component(a, Destroyer { target: Some(a) }).unwrap();
        scene.add_component(a, Recorder { label: "a", log: log.clone() }).unwrap();
        scene.add_component(b, Recorder { label: "b", log: log.clone() }).unwrap();
        scene.add_component(c, Recorder { label: "c", log: log.clone() }).unwrap();

        let mut resources = TickResources::new();
        let mut tick = resources.context(DT);
        let mut report = SceneTickReport::default();
        for index in 0..scene.order.len() {
            let id = scene.order[index];
            scene.update_object(id, &mut tick, &mut report);
            // Nothing leaves the live collection mid-iteration
            assert_eq!(scene.object_count(), 3);
        }
        // a destroyed itself, so its recorder never ran; c was skipped once marked
        assert_eq!(*log.borrow(), vec!["b@0"]);
        assert!(scene.get(c).is_some_and(GameObject::is_destroyed));

        scene.flush().unwrap();
        assert_eq!(scene.object_count(), 1);
        assert!(scene.get(a).is_none());
        assert!(scene.get(c).is_none());
        assert_eq!(scene.find_by_name("b"), Some(b));
    }

    #[test]
    fn test_structural_failure_rolls_back() {
        let mut scene = scene();
        let victim = scene.spawn("victim");
        let actor = scene.spawn_at("actor", Pose2::from_position(Vec2::new(1.0, 2.0)));
        scene.add_component(actor, Saboteur { victim }).unwrap();

        let mut resources = TickResources::new();
        let report = step(&mut scene, &mut resources);

        assert_eq!(report.structural_errors, 1);
        assert_eq!(report.rolled_back, 1);
        assert!(scene.get(victim).is_some_and(|object| !object.is_destroyed()));
        let pose = scene.local_pose(actor).unwrap();
        assert_relative_eq!(pose.position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_isolated_failure_keeps_tick_going() {
        let mut scene = scene();
        let log = Log::default();
        let object = scene.spawn("object");
        scene.add_component(object, Flaky).unwrap();
        scene.add_component(object, Recorder { label: "after", log: log.clone() }).unwrap();

        let mut resources = TickResources::new();
        let report = step(&mut scene, &mut resources);
        assert_eq!(report.isolated_errors, 1);
        assert_eq!(*log.borrow(), vec!["after@0"]);
    }

    #[test]
    fn test_pooled_object_is_fully_reset() {
        let mut scene = scene();
        let parent = scene.spawn("parent");
        let rock = scene.instantiate("rock", "rock-1");
        scene.add_component(rock, Mover { step: Vec2::new(1.0, 0.0) }).unwrap();
        scene.get_mut(rock).unwrap().add_tag("hazard");
        scene.set_parent(rock, Some(parent)).unwrap();
        let transform = scene.get(rock).unwrap().transform();
        scene.transforms_mut().rotate(transform, 1.0).unwrap();

        scene.destroy(rock).unwrap();
        scene.flush().unwrap();
        assert_eq!(scene.pooled_count_of("rock"), 1);
        assert!(scene.get(rock).is_none());

        let reused = scene.instantiate("rock", "rock-2");
        assert_ne!(reused, rock);
        assert_eq!(scene.pooled_count(), 0);
        let object = scene.get(reused).unwrap();
        assert_eq!(object.name(), "rock-2");
        assert_eq!(object.component_count(), 0);
        assert!(object.tags().is_empty());
        assert_eq!(scene.transforms().parent(object.transform()), None);
        assert_eq!(scene.local_pose(reused), Some(Pose2::identity()));
    }

    #[test]
    fn test_pool_capacity_drops_excess() {
        let config = SceneConfig { pool_capacity: 1, ..SceneConfig::default() };
        let mut scene: Scene<Pose2> = Scene::with_config("small", &config, Logger::disabled());
        let a = scene.instantiate("bullet", "a");
        let b = scene.instantiate("bullet", "b");
        scene.destroy(a).unwrap();
        scene.destroy(b).unwrap();
        scene.flush().unwrap();
        assert_eq!(scene.pooled_count(), 1);
        // One pooled transform survives, the other was released
        assert_eq!(scene.transforms().len(), 1);
    }

    #[test]
    fn test_destroying_parent_detaches_children() {
        let mut scene = scene();
        let parent = scene.spawn_at("parent", Pose2::from_position(Vec2::new(10.0, 0.0)));
        let child = scene.spawn_at("child", Pose2::from_position(Vec2::new(1.0, 0.0)));
        scene.set_parent(child, Some(parent)).unwrap();
        assert_eq!(scene.parent_of(child), Some(parent));

        scene.destroy(parent).unwrap();
        scene.flush().unwrap();
        assert_eq!(scene.parent_of(child), None);
        assert_relative_eq!(scene.world_pose(child).unwrap().position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_set_parent_during_update_waits_for_flush() {
        let mut scene = scene();
        let parent = scene.spawn("parent");
        let child = scene.spawn("child");
        scene.add_component(parent, Adopter { child, fail: false }).unwrap();

        let mut resources = TickResources::new();
        let mut tick = resources.context(DT);
        let mut report = SceneTickReport::default();
        scene.update_object(parent, &mut tick, &mut report);
        assert_eq!(scene.parent_of(child), None);

        let outcome = scene.flush().unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(scene.parent_of(child), Some(parent));
    }

    #[test]
    fn test_structural_failure_discards_queued_set_parent() {
        let mut scene = scene();
        let owner = scene.spawn("owner");
        let victim = scene.spawn("victim");
        scene.add_component(owner, Adopter { child: victim, fail: true }).unwrap();

        let mut resources = TickResources::new();
        let report = step(&mut scene, &mut resources);
        assert_eq!(report.structural_errors, 1);
        assert_eq!(report.rolled_back, 1);
        assert_eq!(scene.parent_of(victim), None);
    }

    #[test]
    fn test_cyclic_set_parent_is_reported_by_flush() {
        let mut scene = scene();
        let parent = scene.spawn("parent");
        let child = scene.spawn("child");
        scene.set_parent(child, Some(parent)).unwrap();
        // The child tries to adopt its own parent
        scene.add_component(child, Adopter { child: parent, fail: false }).unwrap();

        let mut resources = TickResources::new();
        let report = step(&mut scene, &mut resources);
        assert_eq!(report.flush.errors.len(), 1);
        assert_eq!(scene.parent_of(child), Some(parent));
        assert_eq!(scene.parent_of(parent), None);
    }

    #[test]
    fn test_parent_of_follows_pooled_objects() {
        let mut scene = scene();
        let anchor = scene.instantiate("anchor", "anchor");
        let child = scene.spawn("child");
        scene.set_parent(child, Some(anchor)).unwrap();
        assert_eq!(scene.parent_of(child), Some(anchor));

        scene.destroy(anchor).unwrap();
        scene.flush().unwrap();
        assert_eq!(scene.pooled_count(), 1);
        assert_eq!(scene.parent_of(child), None);

        let reused = scene.instantiate("anchor", "anchor again");
        assert_ne!(reused, anchor);
        scene.set_parent(child, Some(reused)).unwrap();
        assert_eq!(scene.parent_of(child), Some(reused));
    }

    #[test]
    fn test_remove_component_is_deferred() {
        let mut scene = scene();
        let object = scene.spawn("object");
        let id = scene.add_component(object, Flaky).unwrap();
        scene.remove_component(object, id).unwrap();
        assert!(!scene.get(object).unwrap().has_component::<Flaky>());
        assert_eq!(scene.get(object).unwrap().components.len(), 1);

        scene.flush().unwrap();
        assert!(scene.get(object).unwrap().components.is_empty());
        assert_eq!(
            scene.remove_component(object, id),
            Err(SceneError::UnknownComponent { object, component: id })
        );
    }

    #[test]
    fn test_deferred_spawn_and_add() {
        struct Spawner {
            done: bool,
        }

        impl Component<Pose2> for Spawner {
            fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
                if !self.done {
                    self.done = true;
                    ctx.spawn(|scene| {
                        let child = scene.spawn("spawned");
                        scene.add_component(child, Flaky)?;
                        Ok(())
                    });
                    let owner = ctx.owner();
                    ctx.add_component(owner, Mover { step: Vec2::new(0.0, 1.0) })?;
                    assert!(ctx.find_by_name("spawned").is_none());
                }
                Ok(())
            }
        }

        let mut scene = scene();
        let owner = scene.spawn("owner");
        scene.add_component(owner, Spawner { done: false }).unwrap();

        let mut resources = TickResources::new();
        let report = step(&mut scene, &mut resources);
        assert_eq!(report.flush.applied, 2);
        let spawned = scene.find_by_name("spawned").unwrap();
        assert!(scene.get(spawned).unwrap().has_component::<Flaky>());
        assert!(scene.get(owner).unwrap().has_component::<Mover>());

        // The added mover starts on the next tick
        step(&mut scene, &mut resources);
        assert_relative_eq!(scene.local_pose(owner).unwrap().position, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_flush_is_not_reentrant() {
        let mut scene = scene();
        let observed = Rc::new(Cell::new(false));
        let seen = observed.clone();
        scene.queue.push(SceneOp::Spawn(Box::new(move |scene: &mut Scene<Pose2>| {
            seen.set(scene.flush().is_err_and(|error| error == SceneError::FlushInProgress));
            Ok(())
        })));
        scene.flush().unwrap();
        assert!(observed.get());
    }

    #[test]
    fn test_sibling_lookup() {
        struct Speed(f32);
        impl Component<Pose2> for Speed {}

        struct UsesSpeed {
            seen: Rc<Cell<f32>>,
        }
        impl Component<Pose2> for UsesSpeed {
            fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
                let speed = ctx.sibling::<Speed>().ok_or_else(|| ComponentError::isolated("no speed"))?;
                self.seen.set(speed.0);
                Ok(())
            }
        }

        let mut scene = scene();
        let seen = Rc::new(Cell::new(0.0));
        let object = scene.spawn("object");
        scene.add_component(object, UsesSpeed { seen: seen.clone() }).unwrap();
        scene.add_component(object, Speed(3.5)).unwrap();

        let mut resources = TickResources::new();
        step(&mut scene, &mut resources);
        assert_relative_eq!(seen.get(), 3.5);
        assert_eq!(scene.get_component::<Speed>(object).map(|speed| speed.0), Some(3.5));
    }

    #[test]
    fn test_replace_component_restarts_slot() {
        let mut scene = scene();
        let object = scene.spawn("object");
        let id = scene.add_component(object, Mover { step: Vec2::new(1.0, 0.0) }).unwrap();
        let mut resources = TickResources::new();
        step(&mut scene, &mut resources);
        assert_eq!(scene.get(object).unwrap().component(id).map(ComponentSlot::lifecycle), Some(Lifecycle::Active));

        let old = scene.replace_component(object, id, Box::new(Mover { step: Vec2::new(0.0, 2.0) })).unwrap();
        assert!((*old).as_any().downcast_ref::<Mover>().is_some());
        assert_eq!(scene.get(object).unwrap().component(id).map(ComponentSlot::lifecycle), Some(Lifecycle::Attached));

        step(&mut scene, &mut resources);
        assert_relative_eq!(scene.local_pose(object).unwrap().position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_draw_uses_z_order_and_skips_inactive() {
        let mut scene = scene();
        let top = scene.spawn_at("top", Pose2::from_position(Vec2::new(5.0, 0.0)));
        let bottom = scene.spawn("bottom");
        let hidden = scene.spawn("hidden");
        for id in [top, bottom, hidden] {
            scene.add_component(id, Mover { step: Vec2::zeros() }).unwrap();
        }
        scene.get_mut(top).unwrap().set_z_order(10);
        scene.get_mut(hidden).unwrap().set_active(false);

        let mut list = DrawList::new();
        scene.draw(&mut list);
        let frame = list.into_frame(0, 0.0);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.commands()[0].depth, 0);
        assert_eq!(frame.commands()[1].depth, 10);
        assert_relative_eq!(frame.commands()[1].pose.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_clear_empties_scene_and_pool() {
        let mut scene = scene();
        scene.instantiate("rock", "a");
        scene.spawn("b");
        scene.clear().unwrap();
        assert_eq!(scene.object_count(), 0);
        assert_eq!(scene.pooled_count(), 0);
        assert!(scene.transforms().is_empty());
    }

    #[test]
    fn test_unknown_and_destroyed_objects() {
        let mut scene = scene();
        let object = scene.spawn("object");
        scene.destroy(object).unwrap();
        // Second destroy before the flush is a no-op
        scene.destroy(object).unwrap();
        assert_eq!(scene.pending_changes(), 1);
        assert_eq!(scene.add_component(object, Flaky), Err(SceneError::ObjectDestroyed(object)));
        scene.flush().unwrap();
        assert_eq!(scene.destroy(object), Err(SceneError::UnknownObject(object)));
    }
}
