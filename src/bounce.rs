//! Bounce chain predictor.
//!
//! Chains marches together: every impact reflects the velocity about the
//! surface normal, damps it, and launches a new segment from the impact
//! point.

use bevy::log::debug;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::march::{march, Launch, MarchSettings};
use crate::path::TrajectoryPrediction;
use crate::types::{CollisionWorld, ExclusionSet, Vector};

/// Upper bound on segments reserved up front.
const MAX_PREALLOCATED_SEGMENTS: usize = 64;

/// How the distance budget is shared between bounces.
///
/// # Variants
/// * `Total` - `max_arc_length` covers the whole chain; each segment gets
///   whatever is left
/// * `PerBounce` - every segment gets the full `max_arc_length`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum BudgetPolicy {
    #[default]
    Total,
    PerBounce,
}

/// Bounce chain parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictSettings {
    /// Marching parameters; `max_arc_length` is the distance budget
    pub march: MarchSettings,
    /// Maximum number of bounces (segments = bounces + 1)
    pub max_bounces: u32,
    /// Fraction of speed lost per bounce, in `[0, 1]`
    pub damping: f32,
    /// Budget sharing policy
    pub budget: BudgetPolicy,
}

impl Default for PredictSettings {
    fn default() -> Self {
        Self {
            march: MarchSettings::default(),
            max_bounces: 3,
            damping: 0.3,
            budget: BudgetPolicy::default(),
        }
    }
}

impl PredictSettings {
    /// Builder pattern: set the marching parameters.
    pub fn with_march(mut self, march: MarchSettings) -> Self {
        self.march = march;
        self
    }

    /// Builder pattern: set the bounce limit.
    pub fn with_max_bounces(mut self, max_bounces: u32) -> Self {
        self.max_bounces = max_bounces;
        self
    }

    /// Builder pattern: set the damping factor (clamped to `[0, 1]`).
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: set the budget policy.
    pub fn with_budget(mut self, budget: BudgetPolicy) -> Self {
        self.budget = budget;
        self
    }
}

/// Reflect `velocity` about the unit `normal` and scale by `1 - damping`.
pub fn reflect_velocity<V: Vector>(velocity: V, normal: V, damping: f32) -> V {
    velocity.reflect(normal) * (1.0 - damping.clamp(0.0, 1.0))
}

/// Predict a full bounce chain.
///
/// The first segment starts from `launch`. After each impact the velocity
/// at the impact is reflected and damped, and the next segment starts at
/// the impact point with the hit obstacle skipped for its first probe.
/// The chain stops at a segment without impact, after `max_bounces`
/// bounces, or once the distance budget is used up. At most
/// `max_bounces + 1` segments are produced.
///
/// # Arguments
/// * `world` - Collision query backend (should be stateless between calls
///   for reproducible results)
/// * `filter` - Collision filter set
/// * `launch` - Initial conditions; `launch.ignore` stays excluded for
///   every segment
/// * `settings` - Chain parameters
/// * `exclusions` - Caller-owned exclusion set, restored on return
pub fn predict<V, W>(
    world: &W,
    filter: &W::Filter,
    launch: Launch<V, W::Obstacle>,
    settings: &PredictSettings,
    exclusions: &mut ExclusionSet<W::Obstacle>,
) -> TrajectoryPrediction<V, W::Obstacle>
where
    V: Vector,
    W: CollisionWorld<V>,
{
    let segment_count = (settings.max_bounces as usize)
        .saturating_add(1)
        .min(MAX_PREALLOCATED_SEGMENTS);
    let mut segments = Vec::with_capacity(segment_count);
    let mut current = launch;
    let mut travelled = 0.0;

    for bounce in 0..=settings.max_bounces {
        let budget = match settings.budget {
            BudgetPolicy::Total => settings.march.max_arc_length - travelled,
            BudgetPolicy::PerBounce => settings.march.max_arc_length,
        };
        let march_settings = settings.march.with_max_arc_length(budget.max(0.0));

        let segment = march(world, filter, current, &march_settings, exclusions);
        travelled += segment.distance();
        let impact = segment.impact().copied();
        let end = segment.end_state();
        segments.push(segment);

        let Some(impact) = impact else {
            break;
        };
        if bounce == settings.max_bounces {
            break;
        }
        if settings.budget == BudgetPolicy::Total && travelled >= settings.march.max_arc_length {
            debug!("bounce chain budget used up after {} segments", segments.len());
            break;
        }

        let velocity = reflect_velocity(end.velocity, impact.normal, settings.damping);
        debug!(
            "bounce {} off {:?} at {:?}, speed {} -> {}",
            bounce + 1,
            impact.obstacle,
            impact.position,
            end.velocity.length(),
            velocity.length()
        );

        current = Launch {
            position: impact.position,
            velocity,
            acceleration: launch.acceleration,
            ignore: launch.ignore,
            skip_first: Some(impact.obstacle),
        };
    }

    TrajectoryPrediction::new(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacles::{LayerMask, ObstacleField};

    fn floor() -> ObstacleField<Vec2> {
        let mut world = ObstacleField::new();
        world.add_plane(Vec2::ZERO, Vec2::Y);
        world
    }

    #[test]
    fn test_reflect_velocity_damps() {
        let v = reflect_velocity(Vec2::new(3.0, -4.0), Vec2::Y, 0.5);
        assert_eq!(v, Vec2::new(1.5, 2.0));
        assert_eq!(reflect_velocity(Vec2::new(3.0, -4.0), Vec2::Y, 1.0), Vec2::ZERO);
    }

    #[test]
    fn test_zero_bounces_gives_one_segment() {
        let world = floor();
        let launch = Launch::new(Vec2::new(0.0, 2.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, -9.8));
        let settings = PredictSettings::default()
            .with_march(MarchSettings::new(0.1, 100.0))
            .with_max_bounces(0);
        let prediction = predict(&world, &LayerMask::ALL, launch, &settings, &mut ExclusionSet::new());

        assert_eq!(prediction.len(), 1);
        assert!(prediction.segments()[0].impact().is_some());
    }

    #[test]
    fn test_bounce_chain_halves_speed() {
        let world = floor();
        let launch = Launch::new(Vec2::new(0.0, 2.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, -9.8));
        let settings = PredictSettings::default()
            .with_march(MarchSettings::new(0.05, 1000.0))
            .with_max_bounces(2)
            .with_damping(0.5);
        let prediction = predict(&world, &LayerMask::ALL, launch, &settings, &mut ExclusionSet::new());

        assert_eq!(prediction.len(), 3);
        for pair in prediction.segments().windows(2) {
            let impact_speed = pair[0].end_state().velocity.length();
            let launch_speed = pair[1].start_state().velocity.length();
            assert!((launch_speed - 0.5 * impact_speed).abs() < 1e-4);
            // Each bounce starts where the previous segment hit.
            assert_eq!(pair[1].start_state().position, pair[0].impact().unwrap().position);
        }
    }

    #[test]
    fn test_total_budget_is_shared() {
        let world = ObstacleField::<Vec2>::new();
        let launch = Launch::new(Vec2::ZERO, Vec2::X * 10.0, Vec2::ZERO);
        let settings = PredictSettings::default().with_march(MarchSettings::new(0.5, 5.0));
        let prediction = predict(&world, &LayerMask::ALL, launch, &settings, &mut ExclusionSet::new());

        assert_eq!(prediction.len(), 1);
        assert!((prediction.distance() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_per_bounce_budget_restarts() {
        // Ping-pong between two walls 2 m apart.
        let mut world = ObstacleField::<Vec2>::new();
        world.add_plane(Vec2::new(1.0, 0.0), Vec2::NEG_X);
        world.add_plane(Vec2::new(-1.0, 0.0), Vec2::X);
        let launch = Launch::new(Vec2::ZERO, Vec2::X * 4.0, Vec2::ZERO);

        let per_bounce = PredictSettings::default()
            .with_march(MarchSettings::new(0.1, 2.5))
            .with_max_bounces(3)
            .with_damping(0.0)
            .with_budget(BudgetPolicy::PerBounce);
        let prediction = predict(&world, &LayerMask::ALL, launch, &per_bounce, &mut ExclusionSet::new());
        assert_eq!(prediction.len(), 4);

        let total = per_bounce.with_budget(BudgetPolicy::Total);
        let prediction = predict(&world, &LayerMask::ALL, launch, &total, &mut ExclusionSet::new());
        assert_eq!(prediction.len(), 2);
        assert!(prediction.segments()[1].impact().is_none());
    }

    #[test]
    fn test_fully_damped_bounce_ends_with_empty_segment() {
        let world = floor();
        let launch = Launch::new(Vec2::new(0.0, 1.0), Vec2::new(0.0, -2.0), Vec2::new(0.0, -9.8));
        let settings = PredictSettings::default()
            .with_march(MarchSettings::new(0.1, 100.0))
            .with_damping(1.0);
        let prediction = predict(&world, &LayerMask::ALL, launch, &settings, &mut ExclusionSet::new());

        assert_eq!(prediction.len(), 2);
        assert!(prediction.segments()[1].is_empty());
    }

    #[test]
    fn test_ignored_obstacle_excluded_for_whole_chain() {
        let mut world = floor();
        let own = world.add_ball(Vec2::new(0.0, 2.0), 0.5);
        let mut exclusions = ExclusionSet::new();
        let launch = Launch::new(Vec2::new(0.0, 2.0), Vec2::new(0.0, -1.0), Vec2::new(0.0, -9.8))
            .ignoring(own);
        let settings = PredictSettings::default().with_march(MarchSettings::new(0.1, 100.0));
        let prediction = predict(&world, &LayerMask::ALL, launch, &settings, &mut exclusions);

        assert!(prediction
            .segments()
            .iter()
            .filter_map(|segment| segment.impact())
            .all(|impact| impact.obstacle != own));
        assert!(exclusions.is_empty());
    }
}
