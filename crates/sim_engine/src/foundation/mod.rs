//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Deferred-mutation collections
//! - Time management and the fixed-timestep accumulator
//! - Logging handles

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
