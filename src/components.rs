//! Components attaching predictions and playback to entities.

use bevy::prelude::*;

use crate::path::{PathPlayer, TrajectoryPrediction};
use crate::types::Vector;

/// Launch parameters of an entity whose trajectory should be previewed.
///
/// Whenever this component (or the entity's transform, its
/// [`LocalForces`], the config or the environment) changes, the predictor
/// rebuilds the entity's [`PredictedTrajectory`]. The entity's own collider
/// is excluded from the prediction.
///
/// # Fields
/// * `velocity` - Launch velocity
/// * `radius` - Projectile radius; 0 predicts with rays
/// * `layers` - Collision layer bits the prediction can hit
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_trajectory::components::TrajectoryAim;
///
/// let aim = TrajectoryAim::new(Vec3::new(4.0, 8.0, 0.0)).with_radius(0.1);
/// assert_eq!(aim.layers, u32::MAX);
/// ```
#[derive(Component, Clone, Debug, PartialEq)]
pub struct TrajectoryAim<V: Vector> {
    /// Launch velocity
    pub velocity: V,
    /// Projectile radius
    pub radius: f32,
    /// Collision layer bits
    pub layers: u32,
}

impl<V: Vector> TrajectoryAim<V> {
    /// Aim with a point-sized projectile that hits every layer.
    pub fn new(velocity: V) -> Self {
        Self {
            velocity,
            radius: 0.0,
            layers: u32::MAX,
        }
    }

    /// Builder pattern: set the projectile radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Builder pattern: restrict the layers the prediction can hit.
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }
}

/// Body-local accelerations (thrusters and the like), rotated by the
/// entity's orientation and added to the environment's world forces.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct LocalForces<V: Vector>(pub Vec<V>);

/// The latest prediction for an entity's [`TrajectoryAim`].
#[derive(Component, Clone, Debug, Deref)]
pub struct PredictedTrajectory<V: Vector>(pub TrajectoryPrediction<V, Entity>);

/// Scripted motion along a prediction.
///
/// While present, the entity's translation follows the recorded path
/// instead of the physics engine. Impacts are reported as they are reached;
/// when the path ends the component removes itself and the terminal
/// velocity is handed back to the physics body.
#[derive(Component, Clone, Debug)]
pub struct PathPlayback<V: Vector> {
    /// Cursor over the prediction
    pub player: PathPlayer<V, Entity>,
    /// Accumulated playback time (seconds)
    pub elapsed: f32,
}

impl<V: Vector> PathPlayback<V> {
    /// Start playing `prediction` from its beginning.
    pub fn new(prediction: TrajectoryPrediction<V, Entity>) -> Self {
        Self {
            player: PathPlayer::new(prediction),
            elapsed: 0.0,
        }
    }
}
