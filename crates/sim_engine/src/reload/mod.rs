//! Hot reload between frames
//!
//! A [`ChangeSource`] reports which reloadable units changed since the last
//! poll. [`HotReload`] polls it at the start of a frame, before any tick, and
//! hands each change to the registered [`ReloadHandler`]s. A handler that
//! fails is logged and skipped; the other handlers and the remaining changes
//! still run.
//!
//! How new behaviour arrives is up to the handler. The usual pattern is to
//! build the replacement first and then swap it in with
//! [`Scene::replace_component`] or [`World::replace_system`], both of which
//! either succeed or leave the scene and world untouched.

mod watcher;

pub use watcher::FileWatcher;

use crate::ecs::{EcsError, World};
use crate::foundation::logging::Logger;
use crate::scene::{Scene, SceneError};
use crate::transform::{Pose, Pose2};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised while detecting or applying a reload
#[derive(Error, Debug)]
pub enum ReloadError {
    /// The watched location could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A handler rejected a change
    #[error("reload of '{id}' failed: {message}")]
    Handler {
        /// Unit being reloaded
        id: String,
        /// Reason given by the handler
        message: String,
    },

    /// The swap was rejected by the scene
    #[error("scene rejected reload: {0}")]
    Scene(#[from] SceneError),

    /// The swap was rejected by the world
    #[error("world rejected reload: {0}")]
    Ecs(#[from] EcsError),
}

impl ReloadError {
    /// Handler failure for one unit
    pub fn handler(id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Handler { id: id.into(), message: message.to_string() }
    }
}

/// What happened to a reloadable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The unit appeared
    Created,
    /// The unit's contents changed
    Modified,
    /// The unit disappeared
    Removed,
}

/// One changed unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Identifier of the unit, e.g. a path relative to the watched root
    pub id: String,
    /// Kind of change
    pub kind: ChangeKind,
}

impl Change {
    /// Create a change record
    pub fn new(id: impl Into<String>, kind: ChangeKind) -> Self {
        Self { id: id.into(), kind }
    }
}

/// Reports changed units since the previous poll
pub trait ChangeSource {
    /// Changes since the last call, in a stable order
    fn poll_changes(&mut self) -> Result<Vec<Change>, ReloadError>;
}

/// Change source fed by hand
///
/// Clones share one queue, so a caller can keep a handle after moving the
/// source into an engine.
#[derive(Debug, Clone, Default)]
pub struct ManualChanges {
    pending: Rc<RefCell<VecDeque<Change>>>,
}

impl ManualChanges {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a change for the next poll
    pub fn push(&self, change: Change) {
        self.pending.borrow_mut().push_back(change);
    }

    /// Changes not yet polled
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl ChangeSource for ManualChanges {
    fn poll_changes(&mut self) -> Result<Vec<Change>, ReloadError> {
        Ok(self.pending.borrow_mut().drain(..).collect())
    }
}

/// Applies changes to the scene and world
pub trait ReloadHandler<P: Pose = Pose2> {
    /// Name used in log messages
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Whether this handler cares about `change`
    fn handles(&self, _change: &Change) -> bool {
        true
    }

    /// Apply one change
    ///
    /// Must either complete or leave the scene and world as they were.
    fn apply(&mut self, change: &Change, scene: &mut Scene<P>, world: &mut World) -> Result<(), ReloadError>;
}

/// Outcome of one reload pass
#[derive(Debug, Default)]
pub struct ReloadReport {
    /// Changes reported by the source
    pub changes: usize,
    /// Successful handler applications
    pub applied: usize,
    /// Failed handler applications, with the change they failed on
    pub failures: Vec<(Change, ReloadError)>,
}

impl ReloadReport {
    /// Whether every handler succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A change source plus the handlers that act on it
pub struct HotReload<P: Pose = Pose2> {
    source: Box<dyn ChangeSource>,
    handlers: Vec<Box<dyn ReloadHandler<P>>>,
    logger: Logger,
}

impl<P: Pose> HotReload<P> {
    /// Create with no handlers
    pub fn new(source: impl ChangeSource + 'static, logger: Logger) -> Self {
        Self { source: Box::new(source), handlers: Vec::new(), logger }
    }

    /// Register a handler; handlers run in registration order
    pub fn with_handler(mut self, handler: impl ReloadHandler<P> + 'static) -> Self {
        self.add_handler(handler);
        self
    }

    /// Register a handler
    pub fn add_handler(&mut self, handler: impl ReloadHandler<P> + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Number of handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Poll the source and apply every change
    ///
    /// Must be called between ticks. A source error is returned; handler
    /// errors are collected in the report.
    pub fn apply_pending(&mut self, scene: &mut Scene<P>, world: &mut World) -> Result<ReloadReport, ReloadError> {
        let changes = self.source.poll_changes()?;
        let mut report = ReloadReport { changes: changes.len(), ..ReloadReport::default() };

        for change in changes {
            self.logger.debug(format_args!("reload {:?} '{}'", change.kind, change.id));
            for handler in &mut self.handlers {
                if !handler.handles(&change) {
                    continue;
                }
                match handler.apply(&change, scene, world) {
                    Ok(()) => {
                        report.applied += 1;
                        self.logger.info(format_args!("{} reloaded '{}'", handler.name(), change.id));
                    }
                    Err(error) => {
                        self.logger.warn(format_args!("{} failed to reload '{}': {error}", handler.name(), change.id));
                        report.failures.push((change.clone(), error));
                    }
                }
            }
        }
        Ok(report)
    }
}

impl<P: Pose> fmt::Debug for HotReload<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotReload")
            .field("handlers", &self.handlers.iter().map(|handler| handler.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Component, ComponentId, ObjectId};

    struct Speed(f32);
    impl Component<Pose2> for Speed {}

    struct SwapSpeed {
        object: ObjectId,
        component: ComponentId,
    }

    impl ReloadHandler for SwapSpeed {
        fn handles(&self, change: &Change) -> bool {
            change.id.starts_with("speed")
        }

        fn apply(&mut self, change: &Change, scene: &mut Scene, _world: &mut World) -> Result<(), ReloadError> {
            let value: f32 = change
                .id
                .trim_start_matches("speed=")
                .parse()
                .map_err(|error| ReloadError::handler(&change.id, error))?;
            scene.replace_component(self.object, self.component, Box::new(Speed(value)))?;
            Ok(())
        }
    }

    struct AlwaysFails;

    impl ReloadHandler for AlwaysFails {
        fn apply(&mut self, change: &Change, _scene: &mut Scene, _world: &mut World) -> Result<(), ReloadError> {
            Err(ReloadError::handler(&change.id, "broken"))
        }
    }

    #[test]
    fn test_failed_unit_is_isolated() {
        let mut scene: Scene = Scene::new("reload", Logger::disabled());
        let mut world = World::new(Logger::disabled());
        let object = scene.spawn("ship");
        let component = scene.add_component(object, Speed(1.0)).unwrap();

        let changes = ManualChanges::new();
        let mut reload = HotReload::new(changes.clone(), Logger::disabled())
            .with_handler(AlwaysFails)
            .with_handler(SwapSpeed { object, component });

        changes.push(Change::new("speed=oops", ChangeKind::Modified));
        changes.push(Change::new("speed=4.5", ChangeKind::Modified));
        let report = reload.apply_pending(&mut scene, &mut world).unwrap();

        assert_eq!(report.changes, 2);
        assert_eq!(report.applied, 1);
        assert_eq!(report.failures.len(), 3);
        assert!(changes.is_empty());
        assert_eq!(scene.get_component::<Speed>(object).map(|speed| speed.0), Some(4.5));
    }

    #[test]
    fn test_rejected_swap_leaves_scene_alone() {
        let mut scene: Scene = Scene::new("reload", Logger::disabled());
        let mut world = World::new(Logger::disabled());
        let object = scene.spawn("ship");
        let component = scene.add_component(object, Speed(1.0)).unwrap();
        let other = scene.spawn("other");

        let changes = ManualChanges::new();
        let mut reload = HotReload::new(changes.clone(), Logger::disabled())
            .with_handler(SwapSpeed { object: other, component });
        changes.push(Change::new("speed=2", ChangeKind::Modified));
        let report = reload.apply_pending(&mut scene, &mut world).unwrap();

        assert!(!report.is_clean());
        assert!(matches!(report.failures[0].1, ReloadError::Scene(SceneError::UnknownComponent { .. })));
        assert_eq!(scene.get_component::<Speed>(object).map(|speed| speed.0), Some(1.0));
    }
}
