//! Global resources for trajectory prediction.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bounce::{BudgetPolicy, PredictSettings};
use crate::march::{Integrator, MarchSettings};
use crate::types::{net_acceleration, Vector};

/// World forces acting on every predicted projectile.
///
/// Vectors are stored in 3D; 2D predictions use their X/Y components.
///
/// # Fields
/// * `gravity` - Gravity vector in meters per second squared
/// * `forces` - Additional world-space accelerations (wind, tilted arenas)
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_trajectory::resources::TrajectoryEnvironment;
///
/// let env = TrajectoryEnvironment {
///     gravity: Vec3::new(0.0, -9.81, 0.0),
///     forces: vec![Vec3::new(1.5, 0.0, 0.0)],
/// };
/// let acceleration: Vec3 = env.acceleration(Quat::IDENTITY, &[]);
/// assert_eq!(acceleration, Vec3::new(1.5, -9.81, 0.0));
/// ```
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
pub struct TrajectoryEnvironment {
    /// Gravity vector (m/s²)
    pub gravity: Vec3,
    /// Extra global accelerations (m/s²)
    pub forces: Vec<Vec3>,
}

impl Default for TrajectoryEnvironment {
    /// Earth gravity (9.81 m/s² downward), no extra forces.
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            forces: Vec::new(),
        }
    }
}

impl TrajectoryEnvironment {
    /// Creates an environment for 2D scenes, where gravity is usually
    /// expressed in pixels per second squared.
    ///
    /// # Arguments
    /// * `gravity` - Downward gravity magnitude
    pub fn new_2d(gravity: f32) -> Self {
        Self {
            gravity: Vec3::new(0.0, -gravity, 0.0),
            forces: Vec::new(),
        }
    }

    /// Builder pattern: add a global force.
    pub fn with_force(mut self, force: Vec3) -> Self {
        self.forces.push(force);
        self
    }

    /// Net constant acceleration for a body with the given orientation and
    /// body-local forces.
    pub fn acceleration<V: Vector>(&self, orientation: V::Rotation, local: &[V]) -> V {
        let global = std::iter::once(self.gravity)
            .chain(self.forces.iter().copied())
            .map(V::from_translation);
        net_acceleration(global, orientation, local.iter().copied())
    }
}

/// Global configuration for trajectory prediction.
///
/// # Fields
/// * `step_resolution` - Spatial length of each marched step (meters)
/// * `max_arc_length` - Distance budget of a prediction (meters)
/// * `max_bounces` - Bounce limit of a prediction
/// * `damping` - Fraction of speed lost per bounce
/// * `budget` - Whether the distance budget covers the whole chain or each bounce
/// * `integrator` - Integration law used while marching
/// * `max_step_time` - Longest single step (seconds)
/// * `debug_draw` - Whether to draw predicted paths with gizmos
///
/// # Example
/// ```
/// use bevy_trajectory::resources::TrajectoryConfig;
///
/// let config = TrajectoryConfig {
///     step_resolution: 0.05,
///     max_bounces: 1,
///     debug_draw: true,
///     ..Default::default()
/// };
/// assert_eq!(config.predict_settings(0.1).max_bounces, 1);
/// ```
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
pub struct TrajectoryConfig {
    /// Step length (m)
    pub step_resolution: f32,
    /// Distance budget (m)
    pub max_arc_length: f32,
    /// Bounce limit
    pub max_bounces: u32,
    /// Speed fraction lost per bounce, in [0, 1]
    pub damping: f32,
    /// Budget sharing policy
    pub budget: BudgetPolicy,
    /// Integration law
    pub integrator: Integrator,
    /// Step duration cap (s)
    pub max_step_time: f32,
    /// Debug visualization
    pub debug_draw: bool,
}

impl Default for TrajectoryConfig {
    /// Default values:
    /// - 0.1 m steps over a 50 m budget
    /// - 3 bounces losing 30% speed each
    /// - Total budget policy, kinematic integration
    /// - 0.1 s step cap
    /// - Debug drawing disabled
    fn default() -> Self {
        Self {
            step_resolution: 0.1,
            max_arc_length: 50.0,
            max_bounces: 3,
            damping: 0.3,
            budget: BudgetPolicy::Total,
            integrator: Integrator::Kinematic,
            max_step_time: 0.1,
            debug_draw: false,
        }
    }
}

impl TrajectoryConfig {
    /// Predictor settings for a projectile of the given radius.
    pub fn predict_settings(&self, radius: f32) -> PredictSettings {
        let march = MarchSettings::default()
            .with_step_resolution(self.step_resolution)
            .with_max_arc_length(self.max_arc_length)
            .with_max_step_time(self.max_step_time)
            .with_radius(radius)
            .with_integrator(self.integrator);
        PredictSettings {
            march,
            max_bounces: self.max_bounces,
            damping: self.damping.clamp(0.0, 1.0),
            budget: self.budget,
        }
    }
}
