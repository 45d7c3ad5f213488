//! Time management utilities
//!
//! Wall-clock sources, the fixed-timestep accumulator and frame statistics.
//! All accumulation is done on integer nanoseconds (`Duration`) so the number
//! of ticks produced depends only on the total elapsed time, never on how that
//! time was split across frames.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of elapsed wall-clock time between frames
pub trait Clock {
    /// Time elapsed since the previous call (or since creation on the first call)
    fn elapsed(&mut self) -> Duration;
}

/// Clock backed by `std::time::Instant`
pub struct SystemClock {
    last_frame: Instant,
}

impl SystemClock {
    /// Create a clock starting now
    pub fn new() -> Self {
        Self { last_frame: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        elapsed
    }
}

/// Scripted clock for tests and headless runs
///
/// Clones share the same queue, so a test can keep a handle and feed frame
/// times after the clock has been moved into an engine. An empty queue reports
/// zero elapsed time.
#[derive(Clone, Default)]
pub struct ManualClock {
    frames: Rc<RefCell<VecDeque<Duration>>>,
}

impl ManualClock {
    /// Create an empty manual clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock that will report the given frame times in order
    pub fn from_frames(frames: impl IntoIterator<Item = Duration>) -> Self {
        let clock = Self::new();
        clock.frames.borrow_mut().extend(frames);
        clock
    }

    /// Queue another frame time
    pub fn push(&self, frame: Duration) {
        self.frames.borrow_mut().push_back(frame);
    }

    /// Number of frame times not yet consumed
    pub fn remaining(&self) -> usize {
        self.frames.borrow().len()
    }
}

impl Clock for ManualClock {
    fn elapsed(&mut self) -> Duration {
        self.frames.borrow_mut().pop_front().unwrap_or(Duration::ZERO)
    }
}

/// Step used when a configured tick rate is unusable (60 Hz)
pub const DEFAULT_FIXED_DT: Duration = Duration::from_nanos(16_666_667);

/// How many simulation ticks one frame should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickPlan {
    /// Ticks to execute this frame
    pub ticks: u32,
    /// Whole ticks dropped because the per-frame cap was hit
    pub discarded_ticks: u32,
    /// Wall time dropped by the frame-time clamp before accumulation
    pub clamped: Duration,
}

/// Fixed-timestep accumulator
///
/// Wall time is accumulated and converted into whole ticks of `fixed_dt`.
/// At most `max_ticks_per_frame` ticks run per frame; whole ticks beyond that
/// are discarded rather than carried forward, so a slow tick cannot snowball.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
    max_frame_time: Option<Duration>,
    accumulator: Duration,
}

impl FixedTimestep {
    /// Create an accumulator for the given step and per-frame tick cap
    pub fn new(fixed_dt: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(Duration::from_nanos(1)),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            max_frame_time: None,
            accumulator: Duration::ZERO,
        }
    }

    /// Create an accumulator ticking at `rate` Hz
    ///
    /// A rate that is not a positive, representable frequency falls back to 60 Hz.
    pub fn from_rate(rate: f64, max_ticks_per_frame: u32) -> Self {
        let fixed_dt = if rate.is_finite() && rate > 0.0 {
            Duration::try_from_secs_f64(rate.recip()).unwrap_or(DEFAULT_FIXED_DT)
        } else {
            DEFAULT_FIXED_DT
        };
        Self::new(fixed_dt, max_ticks_per_frame)
    }

    /// Builder pattern: clamp any single wall-clock delta to `limit`
    pub fn with_max_frame_time(mut self, limit: Duration) -> Self {
        self.max_frame_time = Some(limit);
        self
    }

    /// Fixed simulation step
    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    /// Per-frame tick cap
    pub fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Time accumulated but not yet consumed by a tick
    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.fixed_dt.as_secs_f64()) as f32
    }

    /// Add one frame's elapsed time and plan the ticks it pays for
    pub fn advance(&mut self, elapsed: Duration) -> TickPlan {
        let (elapsed, clamped) = match self.max_frame_time {
            Some(limit) if elapsed > limit => (limit, elapsed - limit),
            _ => (elapsed, Duration::ZERO),
        };

        self.accumulator += elapsed;

        let step = self.fixed_dt.as_nanos();
        let available = self.accumulator.as_nanos() / step;
        let ticks = available.min(u128::from(self.max_ticks_per_frame));
        let discarded = available - ticks;

        // available * step <= accumulator, so the remainder is always < step
        let remainder = self.accumulator.as_nanos() - available * step;
        self.accumulator = Duration::from_nanos(u64::try_from(remainder).unwrap_or(u64::MAX));

        TickPlan {
            ticks: u32::try_from(ticks).unwrap_or(u32::MAX),
            discarded_ticks: u32::try_from(discarded).unwrap_or(u32::MAX),
            clamped,
        }
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

/// Running frame and tick counters
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Frames rendered
    pub frames: u64,
    /// Simulation ticks executed
    pub ticks: u64,
    /// Ticks discarded by the per-frame cap
    pub discarded_ticks: u64,
    /// Wall time dropped by the frame-time clamp
    pub clamped_time: Duration,
    /// Frames per second measured over the last full second
    pub fps: f32,
    fps_window: Duration,
    fps_frames: u32,
}

impl FrameStats {
    /// Record one finished frame
    pub fn record_frame(&mut self, elapsed: Duration, plan: &TickPlan, ticks_run: u32) {
        self.frames += 1;
        self.ticks += u64::from(ticks_run);
        self.discarded_ticks += u64::from(plan.discarded_ticks);
        self.clamped_time += plan.clamped;

        self.fps_window += elapsed;
        self.fps_frames += 1;
        if self.fps_window >= Duration::from_secs(1) {
            self.fps = self.fps_frames as f32 / self.fps_window.as_secs_f32();
            self.fps_window = Duration::ZERO;
            self.fps_frames = 0;
        }
    }
}
