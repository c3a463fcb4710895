//! Messages produced by path playback.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::ecs::message::Message;
use bevy::prelude::*;

use crate::types::Vector;

/// Playback reached a bounce recorded in the prediction.
///
/// Sent once per bounce, at the moment playback passes the impact time,
/// not when the prediction was computed.
///
/// # Fields
/// * `projectile` - Entity being played back
/// * `obstacle` - Entity that was hit
/// * `position` - Impact position
/// * `velocity` - Incoming velocity at the impact
#[derive(Message, Clone, Debug)]
pub struct ObstacleImpact<V: Vector> {
    pub projectile: Entity,
    pub obstacle: Entity,
    pub position: V,
    pub velocity: V,
}

/// Playback reached the end of the prediction.
///
/// `velocity` is the exact terminal velocity of the path; the physics body
/// resumes from it.
#[derive(Message, Clone, Debug)]
pub struct PathCompleted<V: Vector> {
    pub projectile: Entity,
    pub position: V,
    pub velocity: V,
}
