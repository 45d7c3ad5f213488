//! Component trait

/// Marker trait for data stored in the ECS world
///
/// Implement it for plain data types; behaviour belongs in systems.
pub trait Component: 'static + Send + Sync {}
