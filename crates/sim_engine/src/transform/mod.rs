//! Transform hierarchy
//!
//! Parent/child spatial relationships with lazily composed world poses.
//! A tree's pose type fixes its mode for its whole lifetime: planar trees use
//! [`Pose2`], spatial trees use [`Pose3`].

pub mod pose;
pub mod hierarchy;

pub use pose::{Pose, Pose2, Pose3};
pub use hierarchy::{TransformError, TransformId, TransformTree, DEFAULT_MAX_DEPTH};
