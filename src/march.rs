//! Trajectory marcher - fixed-distance stepping against a collision world.

use bevy::log::{debug, trace, warn};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::path::PathSegment;
use crate::types::{CollisionWorld, ExclusionSet, KinematicState, Probe, Vector};

/// Smallest accepted step resolution; smaller requests are clamped up.
pub const MIN_STEP_RESOLUTION: f32 = 1e-3;

/// Below this speed the step time is taken from `max_step_time` instead of
/// `step_resolution / speed`.
const MIN_MARCH_SPEED: f32 = 1e-4;

/// Ceiling on the short steps a single march may take near an apex.
const MAX_SHORT_STEPS: usize = 1 << 16;

/// Integration law applied between recorded steps.
///
/// # Variants
/// * `Euler` - Semi-implicit Euler: `v += a·dt`, then `p += v·dt`
/// * `Kinematic` - Closed-form constant acceleration:
///   `p += v·dt + ½·a·dt²`, then `v += a·dt`. Every recorded step lies
///   exactly on the analytic parabola.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum Integrator {
    /// Semi-implicit Euler (matches most engines' fixed-step integration)
    Euler,
    /// Exact update for constant acceleration
    #[default]
    Kinematic,
}

impl Integrator {
    /// Advance `state` by `dt` under constant `acceleration`.
    pub fn advance<V: Vector>(
        self,
        state: &KinematicState<V>,
        acceleration: V,
        dt: f32,
    ) -> KinematicState<V> {
        let velocity = state.velocity + acceleration * dt;
        let position = match self {
            Integrator::Euler => state.position + velocity * dt,
            Integrator::Kinematic => {
                state.position + state.velocity * dt + acceleration * (0.5 * dt * dt)
            }
        };
        KinematicState {
            position,
            velocity,
            time: state.time + dt,
        }
    }
}

/// Per-call marching parameters.
///
/// # Fields
/// * `step_resolution` - Spatial length of each step (clamped to
///   [`MIN_STEP_RESOLUTION`])
/// * `max_arc_length` - Distance budget for this march. A negative or
///   non-finite budget marches nothing; there is no unbounded mode.
/// * `radius` - Projectile radius; 0 probes with rays, otherwise swept
///   circles/spheres
/// * `integrator` - Integration law between steps
/// * `max_step_time` - Upper bound on a single step's duration while
///   accelerating, so the apex of a vertical throw passes in finite time
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarchSettings {
    pub step_resolution: f32,
    pub max_arc_length: f32,
    pub radius: f32,
    pub integrator: Integrator,
    pub max_step_time: f32,
}

impl Default for MarchSettings {
    fn default() -> Self {
        Self {
            step_resolution: 0.1,
            max_arc_length: 50.0,
            radius: 0.0,
            integrator: Integrator::default(),
            max_step_time: 0.1,
        }
    }
}

impl MarchSettings {
    /// Settings with the given resolution and distance budget.
    pub fn new(step_resolution: f32, max_arc_length: f32) -> Self {
        Self {
            step_resolution,
            max_arc_length,
            ..Default::default()
        }
    }

    /// Builder pattern: set the spatial step length.
    pub fn with_step_resolution(mut self, step_resolution: f32) -> Self {
        self.step_resolution = step_resolution;
        self
    }

    /// Builder pattern: set the longest single step while accelerating.
    pub fn with_max_step_time(mut self, max_step_time: f32) -> Self {
        self.max_step_time = max_step_time;
        self
    }

    /// Builder pattern: set the projectile radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    /// Builder pattern: set the integration law.
    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Builder pattern: set the distance budget.
    pub fn with_max_arc_length(mut self, max_arc_length: f32) -> Self {
        self.max_arc_length = max_arc_length;
        self
    }

    /// Step resolution after clamping to a positive floor.
    pub fn effective_step(&self) -> f32 {
        if self.step_resolution.is_nan() {
            return MIN_STEP_RESOLUTION;
        }
        self.step_resolution.max(MIN_STEP_RESOLUTION)
    }

    /// Distance budget, with negative and non-finite values read as 0.
    pub fn effective_arc_length(&self) -> f32 {
        if self.max_arc_length.is_finite() {
            self.max_arc_length.max(0.0)
        } else {
            0.0
        }
    }

    /// Hard bound on the number of marched steps under an acceleration of
    /// the given magnitude.
    ///
    /// A step whose chord covers at least half the resolution uses up
    /// budget, so at most `2·L/step` of those fit. A shorter chord needs the
    /// speed to be below `s = max(step / max_step_time, √(2·|a|·step))`,
    /// which holds for at most `2·s/|a|` seconds, and each such step lasts
    /// at least `min(max_step_time, √(step / (2·|a|)))`.
    pub fn max_steps(&self, acceleration: f32) -> usize {
        let step = self.effective_step();
        let full = (2.0 * self.effective_arc_length() / step).ceil() as usize + 1;
        if !(acceleration > 0.0 && acceleration.is_finite()) {
            return full;
        }

        let cap = self.step_time_cap();
        let slow_speed = (step / cap).max((2.0 * acceleration * step).sqrt());
        let slow_time = (step / (2.0 * acceleration)).sqrt().min(cap);
        let short = (2.0 * slow_speed / (acceleration * slow_time)).ceil() as usize + 1;
        full + short.min(MAX_SHORT_STEPS)
    }

    fn step_time_cap(&self) -> f32 {
        if self.max_step_time > 0.0 {
            self.max_step_time
        } else {
            MarchSettings::default().max_step_time
        }
    }

    // Without acceleration the speed is constant and every chord is one
    // full step long.
    fn step_time(&self, speed: f32, step: f32, accelerating: bool) -> f32 {
        if !accelerating {
            return step / speed;
        }
        let cap = self.step_time_cap();
        if speed > MIN_MARCH_SPEED {
            (step / speed).min(cap)
        } else {
            cap
        }
    }
}

/// Initial conditions of a march.
///
/// # Fields
/// * `position` - Launch point
/// * `velocity` - Launch velocity
/// * `acceleration` - Constant acceleration for the whole march
/// * `ignore` - The caster's own obstacle, excluded for the whole march
/// * `skip_first` - Obstacle excluded from the first probe only (the
///   surface a bounce starts on)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Launch<V, O> {
    pub position: V,
    pub velocity: V,
    pub acceleration: V,
    pub ignore: Option<O>,
    pub skip_first: Option<O>,
}

impl<V: Vector, O: Copy> Launch<V, O> {
    /// Launch with no exclusions.
    pub fn new(position: V, velocity: V, acceleration: V) -> Self {
        Self {
            position,
            velocity,
            acceleration,
            ignore: None,
            skip_first: None,
        }
    }

    /// Builder pattern: exclude the caster's own obstacle.
    pub fn ignoring(mut self, obstacle: O) -> Self {
        self.ignore = Some(obstacle);
        self
    }

    /// Builder pattern: exclude an obstacle from the first probe.
    pub fn skipping_first(mut self, obstacle: O) -> Self {
        self.skip_first = Some(obstacle);
        self
    }
}

/// March a projectile forward in fixed spatial steps until it hits an
/// obstacle or the distance budget runs out.
///
/// Each step integrates the state by `step_resolution / speed` seconds and
/// probes the chord between the old and new position. On a hit the
/// impact point is appended as the final sample, with time and velocity
/// interpolated by the hit's fraction of the chord. A launch with zero
/// velocity returns the canonical empty segment without probing.
///
/// `launch.ignore` is added to `exclusions` for the duration of the march
/// and removed again on every exit path.
///
/// # Arguments
/// * `world` - Collision query backend
/// * `filter` - Collision filter set passed through to every probe
/// * `launch` - Initial conditions and exclusions
/// * `settings` - Resolution, budget, radius and integration law
/// * `exclusions` - Caller-owned exclusion set, restored on return
pub fn march<V, W>(
    world: &W,
    filter: &W::Filter,
    launch: Launch<V, W::Obstacle>,
    settings: &MarchSettings,
    exclusions: &mut ExclusionSet<W::Obstacle>,
) -> PathSegment<V, W::Obstacle>
where
    V: Vector,
    W: CollisionWorld<V>,
{
    if launch.velocity.length_squared() == 0.0 {
        return PathSegment::empty(launch.position);
    }

    let step = settings.effective_step();
    if step != settings.step_resolution {
        debug!(
            "step resolution {} clamped to {}",
            settings.step_resolution, step
        );
    }

    let budget = settings.effective_arc_length();
    if !settings.max_arc_length.is_finite() {
        warn!(
            "distance budget {} is not finite, marching nothing",
            settings.max_arc_length
        );
    }
    let accelerating = launch.acceleration.length_squared() > 0.0;
    let max_steps = settings.max_steps(launch.acceleration.length());

    let mut scope = exclusions.scope(launch.ignore);
    let mut skip_first = launch.skip_first;
    let mut state = KinematicState::launch(launch.position, launch.velocity);
    let mut steps = vec![state];
    let mut distance = 0.0;

    for _ in 0..max_steps {
        if distance >= budget {
            break;
        }

        let dt = settings.step_time(state.velocity.length(), step, accelerating);
        let next = settings.integrator.advance(&state, launch.acceleration, dt);
        let chord = next.position - state.position;
        let chord_length = chord.length();
        if !chord_length.is_finite() {
            break;
        }

        if chord_length > 0.0 {
            let probe = Probe {
                origin: state.position,
                direction: chord / chord_length,
                max_distance: chord_length,
                radius: settings.radius,
            };
            let hit = {
                let first_probe = scope.nested(skip_first.take());
                world.cast(&probe, filter, first_probe.as_slice())
            };

            if let Some(hit) = hit {
                let fraction = (hit.distance / chord_length).clamp(0.0, 1.0);
                steps.push(KinematicState {
                    position: hit.position,
                    velocity: state.velocity.lerp(next.velocity, fraction),
                    time: state.time + dt * fraction,
                });
                distance += hit.distance.max(0.0);
                trace!(
                    "march hit {:?} at {:?} after {} steps, {} m",
                    hit.obstacle,
                    hit.position,
                    steps.len() - 1,
                    distance
                );
                return PathSegment::from_steps(steps, distance, Some(hit));
            }
        }

        distance += chord_length;
        state = next;
        steps.push(state);
    }

    PathSegment::from_steps(steps, distance, None)
}
