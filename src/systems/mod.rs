//! Systems module - ECS glue between the engine and a running app.

#[cfg(any(feature = "dim3", feature = "dim2"))]
pub mod collision;
pub mod debug;
pub mod playback;
pub mod prediction;
