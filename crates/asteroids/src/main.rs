//! Asteroids - headless demo of the simulation engine
//!
//! Usage: `asteroids [config.toml|config.ron]`
//!
//! Runs a scripted pilot for a fixed number of frames against a simulated
//! clock and logs what a window and an audio device would have received.

mod adapters;
mod components;
mod config;
mod game;

use adapters::{LoggingRenderer, LoggingSoundPlayer};
use config::GameConfig;
use game::{autopilot, AsteroidsGame};
use sim_engine::config::Config;
use sim_engine::foundation::logging;
use sim_engine::foundation::time::ManualClock;
use sim_engine::input::ScriptedInput;
use sim_engine::Engine;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load_from_file(&path)?,
        None => GameConfig::load_or_default("asteroids.toml")?,
    };
    logging::init_with_filter(&config.engine.log_level);
    config.validate()?;

    let frames = config.demo.frames;
    let frame_time = Duration::from_secs_f64(config.demo.frame_time_ms / 1000.0);
    let clock = ManualClock::from_frames(std::iter::repeat(frame_time).take(usize::try_from(frames)?));

    let mut engine: Engine = Engine::builder(config.engine.clone())
        .with_renderer(LoggingRenderer::new(config.demo.report_every))
        .with_audio(LoggingSoundPlayer::new(&config.audio))
        .with_input(ScriptedInput::new(autopilot(frames)))
        .with_clock(clock)
        .build()?;

    let mut game = AsteroidsGame::new(config);
    engine.run_frames(&mut game, frames)?;

    let stats = engine.stats();
    log::info!(
        "Ran {} frames, {} ticks ({} discarded): score {}, wave {}, {} asteroids destroyed, {} lives left, game over: {}",
        stats.frames,
        stats.ticks,
        stats.discarded_ticks,
        game.score(),
        game.wave() + 1,
        game.asteroids_destroyed(),
        game.lives(),
        game.is_game_over()
    );
    Ok(())
}
