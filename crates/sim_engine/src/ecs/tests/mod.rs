//! Cross-module ECS tests

mod stale_handles;
