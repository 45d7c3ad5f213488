//! Core engine implementation
//!
//! The engine owns the scene, the ECS world and the collaborators, and drives
//! them from a fixed-timestep loop. Each frame:
//!
//! 1. pending hot reloads are applied;
//! 2. the input source is pumped and the clock is read;
//! 3. the accumulator is advanced and pays for a whole number of ticks, capped
//!    per frame;
//! 4. each tick takes an input snapshot, runs the application, the scene
//!    (then its flush) and the world (then its flush), and hands the tick's
//!    sounds to the player;
//! 5. the current state is rendered once.

use crate::application::{AppError, Application};
use crate::audio::{NullSoundPlayer, SoundPlayer, SoundQueue};
use crate::config::ConfigError;
use crate::core::config::EngineConfig;
use crate::core::tick::{StopHandle, TickContext};
use crate::ecs::systems::collect_sprites;
use crate::ecs::{EcsError, World};
use crate::foundation::logging::Logger;
use crate::foundation::time::{Clock, FixedTimestep, FrameStats, SystemClock, TickPlan};
use crate::input::{InputSource, InputState};
use crate::reload::HotReload;
use crate::render::{DrawList, NullRenderer, Renderer};
use crate::scene::{Scene, SceneError};
use crate::transform::{Pose, Pose2};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle of an [`Engine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Built, not yet started
    Idle,
    /// Running frames
    Running,
    /// Terminal; no further ticks or renders
    Stopped,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Frame number, starting at 0
    pub frame: u64,
    /// Wall time reported by the clock
    pub elapsed: Duration,
    /// Ticks the accumulator paid for
    pub plan: TickPlan,
    /// Ticks actually run; fewer than planned if a stop was requested
    pub ticks_run: u32,
    /// Interpolation factor handed to the renderer
    pub alpha: f32,
    /// Draw commands submitted
    pub draw_commands: usize,
    /// Isolated component and system failures
    pub isolated_errors: usize,
    /// Structural component and system failures that were rolled back
    pub structural_errors: usize,
    /// Hot reload units that failed
    pub reload_failures: usize,
}

/// Builder for [`Engine`]
///
/// Collaborators default to headless stand-ins: no rendering, no input, no
/// sound and the system clock.
pub struct EngineBuilder<P: Pose = Pose2> {
    config: EngineConfig,
    logger: Option<Logger>,
    renderer: Box<dyn Renderer<P>>,
    input: Box<dyn InputSource>,
    audio: Box<dyn SoundPlayer>,
    clock: Box<dyn Clock>,
    hot_reload: Option<HotReload<P>>,
}

impl<P: Pose> EngineBuilder<P> {
    /// Start from a configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            logger: None,
            renderer: Box::new(NullRenderer),
            input: Box::new(InputState::new()),
            audio: Box::new(NullSoundPlayer),
            clock: Box::new(SystemClock::new()),
            hot_reload: None,
        }
    }

    /// Use an explicit logger for the engine loop
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set the renderer
    pub fn with_renderer(mut self, renderer: impl Renderer<P> + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Set the input source
    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Set the sound player
    pub fn with_audio(mut self, audio: impl SoundPlayer + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Set the wall clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Apply reloads from this source at the start of every frame
    pub fn with_hot_reload(mut self, hot_reload: HotReload<P>) -> Self {
        self.hot_reload = Some(hot_reload);
        self
    }

    /// Validate the configuration and build an idle engine
    pub fn build(self) -> Result<Engine<P>, EngineError> {
        self.config.validate()?;
        let level = self.config.level_filter();
        let logger = self.logger.unwrap_or_else(|| Logger::new("sim_engine::engine", level));
        let scene = Scene::with_config("main", &self.config.scene, Logger::new("sim_engine::scene", level));
        let world = World::new(Logger::new("sim_engine::ecs", level));

        let mut renderer = self.renderer;
        renderer.configure(&self.config.window);

        logger.info(format_args!(
            "engine ready: {} Hz, at most {} ticks per frame",
            self.config.tick_rate, self.config.max_ticks_per_frame
        ));

        Ok(Engine {
            timestep: self.config.timestep(),
            config: self.config,
            state: EngineState::Idle,
            scene,
            world,
            renderer,
            input: self.input,
            audio: self.audio,
            clock: self.clock,
            hot_reload: self.hot_reload,
            sounds: SoundQueue::new(),
            stop: StopHandle::new(),
            stats: FrameStats::default(),
            next_tick: 0,
            logger,
        })
    }
}

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine<P: Pose = Pose2> {
    config: EngineConfig,
    state: EngineState,
    scene: Scene<P>,
    world: World,
    renderer: Box<dyn Renderer<P>>,
    input: Box<dyn InputSource>,
    audio: Box<dyn SoundPlayer>,
    clock: Box<dyn Clock>,
    hot_reload: Option<HotReload<P>>,
    timestep: FixedTimestep,
    sounds: SoundQueue,
    stop: StopHandle,
    stats: FrameStats,
    next_tick: u64,
    logger: Logger,
}

impl<P: Pose> Engine<P> {
    /// Builder with headless default collaborators
    pub fn builder(config: EngineConfig) -> EngineBuilder<P> {
        EngineBuilder::new(config)
    }

    /// Headless engine from a configuration
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        EngineBuilder::new(config).build()
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Engine logger
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The GameObject scene
    pub fn scene(&self) -> &Scene<P> {
        &self.scene
    }

    /// The GameObject scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene<P> {
        &mut self.scene
    }

    /// The ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The ECS world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Scene and world together, for setup code that touches both
    pub fn scene_and_world_mut(&mut self) -> (&mut Scene<P>, &mut World) {
        (&mut self.scene, &mut self.world)
    }

    /// Frame and tick counters
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.next_tick
    }

    /// Fixed simulation step
    pub fn fixed_dt(&self) -> Duration {
        self.timestep.fixed_dt()
    }

    /// Handle for requesting a stop from anywhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Move from `Idle` to `Running`
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::InvalidState { operation: "start", state: self.state });
        }
        self.timestep.reset();
        self.state = EngineState::Running;
        self.logger.info(format_args!("engine running"));
        Ok(())
    }

    /// Stop the engine
    ///
    /// Pending destroys in the scene and the world are flushed first, so no
    /// object or entity is left half-destroyed. Stopping a stopped engine does
    /// nothing.
    pub fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }
        if let Err(error) = self.scene.flush() {
            self.logger.error(format_args!("scene flush on stop failed: {error}"));
        }
        if let Err(error) = self.world.flush() {
            self.logger.error(format_args!("world flush on stop failed: {error}"));
        }
        self.state = EngineState::Stopped;
        self.logger.info(format_args!(
            "engine stopped after {} frames, {} ticks ({} discarded)",
            self.stats.frames, self.stats.ticks, self.stats.discarded_ticks
        ));
    }

    /// Run one frame: reloads, ticks, then a single render
    ///
    /// Any error stops the engine before it is returned. A stop request made
    /// during a tick skips the frame's remaining ticks; the frame is still
    /// rendered and the engine then stops.
    pub fn run_frame<A>(&mut self, app: &mut A) -> Result<FrameReport, EngineError>
    where
        A: Application<P> + ?Sized,
    {
        if self.state != EngineState::Running {
            return Err(EngineError::InvalidState { operation: "run_frame", state: self.state });
        }
        match self.frame(app) {
            Ok(report) => {
                if self.stop.is_stop_requested() {
                    self.logger.info(format_args!("stop requested"));
                    self.stop();
                }
                Ok(report)
            }
            Err(error) => {
                self.logger.error(format_args!("frame {} failed: {error}", self.stats.frames));
                self.stop();
                Err(error)
            }
        }
    }

    fn frame<A>(&mut self, app: &mut A) -> Result<FrameReport, EngineError>
    where
        A: Application<P> + ?Sized,
    {
        let mut report = FrameReport { frame: self.stats.frames, ..FrameReport::default() };

        if let Some(reload) = &mut self.hot_reload {
            match reload.apply_pending(&mut self.scene, &mut self.world) {
                Ok(outcome) => report.reload_failures = outcome.failures.len(),
                Err(error) => self.logger.warn(format_args!("hot reload poll failed: {error}")),
            }
        }

        self.input.pump();
        report.elapsed = self.clock.elapsed();
        report.plan = self.timestep.advance(report.elapsed);
        if report.plan.discarded_ticks > 0 {
            self.logger.warn(format_args!(
                "frame {} fell behind, discarding {} ticks",
                report.frame, report.plan.discarded_ticks
            ));
        }

        let fixed_dt = self.timestep.fixed_dt();
        for _ in 0..report.plan.ticks {
            let snapshot = self.input.snapshot();
            let mut ctx = TickContext::new(fixed_dt, self.next_tick, &snapshot, &mut self.sounds, &self.stop);

            app.fixed_update(&mut self.scene, &mut self.world, &mut ctx)?;
            let scene_report = self.scene.update(&mut ctx)?;
            let world_report = self.world.update(&mut ctx)?;

            report.isolated_errors += scene_report.isolated_errors + world_report.isolated_errors;
            report.structural_errors += scene_report.structural_errors + world_report.structural_errors;

            let played = self.sounds.flush_into(self.audio.as_mut());
            if played > 0 {
                self.logger.trace(format_args!("tick {} played {played} sounds", self.next_tick));
            }
            self.next_tick += 1;
            report.ticks_run += 1;

            if self.stop.is_stop_requested() {
                break;
            }
        }

        let mut draw_list = DrawList::new();
        self.scene.draw(&mut draw_list);
        collect_sprites(&self.world, &mut draw_list);
        report.alpha = self.timestep.alpha();
        let frame = draw_list.into_frame(report.frame, report.alpha);
        report.draw_commands = frame.len();
        self.renderer.submit(&frame);

        self.stats.record_frame(report.elapsed, &report.plan, report.ticks_run);
        app.on_frame(self, &report)?;
        Ok(report)
    }

    /// Initialize the application and run until a stop is requested
    ///
    /// With a clock that never advances and nothing requesting a stop this
    /// does not return; use [`Engine::run_frames`] for bounded runs.
    pub fn run<A>(&mut self, app: &mut A) -> Result<(), EngineError>
    where
        A: Application<P> + ?Sized,
    {
        self.drive(app, None)
    }

    /// Initialize the application and run at most `frames` frames, then stop
    pub fn run_frames<A>(&mut self, app: &mut A, frames: u64) -> Result<(), EngineError>
    where
        A: Application<P> + ?Sized,
    {
        self.drive(app, Some(frames))
    }

    fn drive<A>(&mut self, app: &mut A, limit: Option<u64>) -> Result<(), EngineError>
    where
        A: Application<P> + ?Sized,
    {
        if self.state != EngineState::Idle {
            return Err(EngineError::InvalidState { operation: "run", state: self.state });
        }
        if let Err(error) = app.initialize(self) {
            self.logger.error(format_args!("application failed to initialize: {error}"));
            self.stop();
            return Err(EngineError::Initialization(error.to_string()));
        }
        self.start()?;

        let mut result = Ok(());
        let mut frames = 0;
        while self.state == EngineState::Running && limit.map_or(true, |limit| frames < limit) {
            if let Err(error) = self.run_frame(app) {
                result = Err(error);
                break;
            }
            frames += 1;
        }

        self.stop();
        app.cleanup(self);
        result
    }
}

impl<P: Pose> fmt::Debug for Engine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("next_tick", &self.next_tick)
            .field("stats", &self.stats)
            .field("scene", &self.scene)
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The operation is not valid in the engine's current state
    #[error("cannot {operation} while the engine is {state}")]
    InvalidState {
        /// Operation attempted
        operation: &'static str,
        /// State the engine was in
        state: EngineState,
    },

    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// Application error
    #[error("Application error: {0}")]
    Application(#[from] AppError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene error that could not be isolated
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// World error that could not be isolated
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundRequest;
    use crate::ecs::components::{SpriteComponent, TransformComponent};
    use crate::foundation::time::ManualClock;
    use crate::render::{Color, RecordingRenderer};
    use crate::scene::{Component, ComponentError, UpdateContext};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn config() -> EngineConfig {
        EngineConfig::default().with_tick_rate(100.0).with_max_ticks_per_frame(4).with_max_frame_time(0.0)
    }

    #[derive(Default)]
    struct Counting {
        ticks: u32,
        frames: u32,
        cleaned: bool,
        stop_after_ticks: Option<u32>,
    }

    impl Application for Counting {
        fn fixed_update(&mut self, _scene: &mut Scene, _world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), AppError> {
            self.ticks += 1;
            if self.stop_after_ticks == Some(self.ticks) {
                ctx.request_stop();
            }
            Ok(())
        }

        fn on_frame(&mut self, _engine: &mut Engine, _frame: &FrameReport) -> Result<(), AppError> {
            self.frames += 1;
            Ok(())
        }

        fn cleanup(&mut self, _engine: &mut Engine) {
            self.cleaned = true;
        }
    }

    #[test]
    fn test_state_machine() {
        let mut engine: Engine = Engine::new(config()).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        let mut app = Counting::default();
        assert!(matches!(engine.run_frame(&mut app), Err(EngineError::InvalidState { .. })));

        engine.start().unwrap();
        assert!(matches!(engine.start(), Err(EngineError::InvalidState { .. })));
        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(matches!(engine.run_frame(&mut app), Err(EngineError::InvalidState { .. })));
        assert_eq!(app.ticks, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Engine::<Pose2>::new(EngineConfig::default().with_tick_rate(0.0));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_ticks_follow_the_accumulator() {
        let clock = ManualClock::from_frames([ms(25), ms(5), ms(100)]);
        let mut engine: Engine = Engine::builder(config()).with_clock(clock).build().unwrap();
        let mut app = Counting::default();
        engine.start().unwrap();

        let first = engine.run_frame(&mut app).unwrap();
        assert_eq!(first.ticks_run, 2);
        assert_eq!(engine.run_frame(&mut app).unwrap().ticks_run, 1);
        let capped = engine.run_frame(&mut app).unwrap();
        assert_eq!(capped.ticks_run, 4);
        assert_eq!(capped.plan.discarded_ticks, 6);

        assert_eq!(app.ticks, 7);
        assert_eq!(engine.tick_count(), 7);
        assert_eq!(engine.stats().frames, 3);
        assert_eq!(engine.stats().discarded_ticks, 6);
    }

    #[test]
    fn test_stop_request_ends_the_run() {
        let clock = ManualClock::new();
        for _ in 0..100 {
            clock.push(ms(30));
        }
        let mut engine: Engine = Engine::builder(config()).with_clock(clock).build().unwrap();
        let mut app = Counting { stop_after_ticks: Some(5), ..Counting::default() };
        engine.run(&mut app).unwrap();

        assert_eq!(engine.state(), EngineState::Stopped);
        // Three ticks per frame; the request in the second frame skips its last tick
        assert_eq!(app.ticks, 5);
        assert_eq!(app.frames, 2);
        assert!(app.cleaned);
    }

    struct Failing;

    impl Application for Failing {
        fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
            Err(AppError::Custom("no assets".to_string()))
        }
    }

    #[test]
    fn test_initialization_failure_stops() {
        let mut engine: Engine = Engine::new(config()).unwrap();
        let result = engine.run(&mut Failing);
        assert!(matches!(result, Err(EngineError::Initialization(_))));
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    struct Beeper;

    impl Component<Pose2> for Beeper {
        fn update(&mut self, ctx: &mut UpdateContext<'_, Pose2>) -> Result<(), ComponentError> {
            ctx.play_sound("beep");
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct SharedPlayer(Rc<RefCell<Vec<SoundRequest>>>);

    impl SoundPlayer for SharedPlayer {
        fn play(&mut self, request: &SoundRequest) {
            self.0.borrow_mut().push(request.clone());
        }
    }

    #[test]
    fn test_frame_renders_scene_and_world_after_ticks() {
        let clock = ManualClock::from_frames([ms(20)]);
        let renderer = RecordingRenderer::new();
        let player = SharedPlayer::default();
        let mut engine: Engine = Engine::builder(config())
            .with_clock(clock)
            .with_renderer(renderer.clone())
            .with_audio(player.clone())
            .build()
            .unwrap();

        let object = engine.scene_mut().spawn("beeper");
        engine.scene_mut().add_component(object, Beeper).unwrap();
        let entity = engine.world_mut().create_entity();
        engine.world_mut().add_component(entity, TransformComponent::default()).unwrap();
        engine.world_mut().add_component(entity, SpriteComponent::circle(1.0, Color::WHITE)).unwrap();

        engine.start().unwrap();
        let report = engine.run_frame(&mut Counting::default()).unwrap();

        assert_eq!(report.ticks_run, 2);
        assert_eq!(renderer.frame_count(), 1);
        assert_eq!(report.draw_commands, 1);
        let ticks: Vec<u64> = player.0.borrow().iter().map(|request| request.tick).collect();
        assert_eq!(ticks, vec![0, 1]);
    }

    #[test]
    fn test_stop_flushes_pending_destroys() {
        let mut engine: Engine = Engine::new(config()).unwrap();
        engine.start().unwrap();
        let object = engine.scene_mut().spawn("doomed");
        engine.scene_mut().destroy(object).unwrap();
        assert_eq!(engine.scene().pending_changes(), 1);

        engine.stop();
        assert_eq!(engine.scene().pending_changes(), 0);
        assert!(!engine.scene().contains(object));
    }
}
