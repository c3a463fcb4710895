//! Playback systems - move entities along recorded paths.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::log::debug;
use bevy::prelude::*;

use crate::components::PathPlayback;
use crate::events::{ObstacleImpact, PathCompleted};
use crate::types::Vector;

/// Advance every [`PathPlayback`] by the frame's delta time.
///
/// Sets the entity translation from the interpolated path (2D keeps the
/// entity's Z), sends an [`ObstacleImpact`] for every bounce reached this
/// frame and, once the path is over, sends [`PathCompleted`] and removes
/// the playback component.
pub fn advance_path_playback<V: Vector>(
    mut commands: Commands,
    time: Res<Time>,
    mut impacts: MessageWriter<ObstacleImpact<V>>,
    mut completions: MessageWriter<PathCompleted<V>>,
    mut playbacks: Query<(Entity, &mut Transform, &mut PathPlayback<V>)>,
) {
    let delta = time.delta_secs();
    for (entity, mut transform, mut playback) in playbacks.iter_mut() {
        playback.elapsed += delta;
        let elapsed = playback.elapsed;
        let Some(frame) = playback.player.advance(elapsed) else {
            commands.entity(entity).remove::<PathPlayback<V>>();
            continue;
        };

        transform.translation = frame.state.position.to_translation(transform.translation.z);

        for impact in &frame.impacts {
            impacts.write(ObstacleImpact {
                projectile: entity,
                obstacle: impact.obstacle,
                position: impact.position,
                velocity: impact.velocity,
            });
        }

        if let Some(end) = frame.completed {
            debug!("{:?} finished its path after {} s", entity, end.time);
            completions.write(PathCompleted {
                projectile: entity,
                position: end.position,
                velocity: end.velocity,
            });
            commands.entity(entity).remove::<PathPlayback<V>>();
        }
    }
}

/// Resume avian3d dynamics from the exact terminal velocity of a path.
#[cfg(feature = "dim3")]
pub fn hand_off_linear_velocity_3d(
    mut completions: MessageReader<PathCompleted<Vec3>>,
    mut bodies: Query<&mut avian3d::prelude::LinearVelocity>,
) {
    for completed in completions.read() {
        if let Ok(mut velocity) = bodies.get_mut(completed.projectile) {
            velocity.0 = completed.velocity;
        }
    }
}

/// Resume avian2d dynamics from the exact terminal velocity of a path.
#[cfg(feature = "dim2")]
pub fn hand_off_linear_velocity_2d(
    mut completions: MessageReader<PathCompleted<Vec2>>,
    mut bodies: Query<&mut avian2d::prelude::LinearVelocity>,
) {
    for completed in completions.read() {
        if let Ok(mut velocity) = bodies.get_mut(completed.projectile) {
            velocity.0 = completed.velocity;
        }
    }
}
