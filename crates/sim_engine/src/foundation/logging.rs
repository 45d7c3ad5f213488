//! Logging utilities
//!
//! The engine logs through the `log` facade but never installs a logger or
//! keeps process-wide state of its own. Each subsystem is handed a [`Logger`]
//! at construction: a target name plus a minimum level, filtered locally
//! before anything reaches the facade. Binaries install `env_logger` via
//! [`init`] or [`init_with_filter`].

use std::fmt;

pub use log::{Level, LevelFilter};

/// Initialize `env_logger` from `RUST_LOG`
pub fn init() {
    // A second initialization is harmless; the first logger stays installed
    let _ = env_logger::try_init();
}

/// Initialize `env_logger` with a default filter such as `"info"` or `"sim_engine=debug"`
///
/// `RUST_LOG` still takes precedence when it is set.
pub fn init_with_filter(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Parse a level name (`"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`, `"off"`)
///
/// Unknown names fall back to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Explicit logging handle passed into engine subsystems
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    target: String,
    level: LevelFilter,
}

impl Logger {
    /// Create a handle logging under `target` at `level` and above
    pub fn new(target: impl Into<String>, level: LevelFilter) -> Self {
        Self { target: target.into(), level }
    }

    /// Handle that drops every message
    pub fn disabled() -> Self {
        Self::new("sim_engine", LevelFilter::Off)
    }

    /// Derive a handle for a child subsystem sharing this handle's level
    pub fn child(&self, suffix: &str) -> Self {
        Self::new(format!("{}::{}", self.target, suffix), self.level)
    }

    /// Builder pattern: change the minimum level
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Log target of this handle
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Minimum level of this handle
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Whether a message at `level` would be forwarded
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Forward a message to the `log` facade if this handle's level allows it
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: self.target.as_str(), level, "{}", args);
        }
    }

    /// Log at error level
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Log at warn level
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    /// Log at info level
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    /// Log at debug level
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    /// Log at trace level
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("sim_engine", LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filtering() {
        let logger = Logger::new("test", LevelFilter::Warn);
        assert!(logger.enabled(Level::Error));
        assert!(logger.enabled(Level::Warn));
        assert!(!logger.enabled(Level::Info));
        assert!(!Logger::disabled().enabled(Level::Error));
    }

    #[test]
    fn test_child_target() {
        let logger = Logger::new("sim_engine", LevelFilter::Debug);
        let child = logger.child("scene");
        assert_eq!(child.target(), "sim_engine::scene");
        assert_eq!(child.level(), LevelFilter::Debug);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" WARN "), LevelFilter::Warn);
        assert_eq!(parse_level("nonsense"), LevelFilter::Info);
    }

    #[test]
    fn test_logging_without_installed_logger_is_harmless() {
        let logger = Logger::new("test", LevelFilter::Trace);
        logger.error(format_args!("no logger installed: {}", 42));
    }
}
