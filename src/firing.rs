//! Closed-form firing solutions.
//!
//! Given a launch point and a target, find the launch velocity that makes a
//! projectile under constant acceleration pass through the target. Every
//! solver is pure; "no trajectory exists" is an ordinary
//! [`FiringSolution::None`] (or `Option::None`) result.
//!
//! Based on <https://www.forrestthewoods.com/blog/solving_ballistic_trajectories/>

use serde::{Deserialize, Serialize};

use crate::polynomial::{solve_quadratic, solve_quartic};
use crate::types::Vector;

/// Horizontal distances below this count as "directly above/below".
const MIN_GROUND_DISTANCE: f32 = 1e-3;

/// Intercept times closer than this are the same (double) root.
const SAME_TIME_EPSILON: f64 = 1e-6;

/// Up to two launch velocities reaching a target.
///
/// For a static target `low` is the flatter arc and `high` the lobbed one;
/// for a moving target `low` arrives first. A `Single` solution is both the
/// low and the high arc.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FiringSolution<V> {
    /// Target unreachable
    #[default]
    None,
    /// Exactly one solution (grazing shot or double root)
    Single(V),
    /// Two distinct solutions
    Pair { low: V, high: V },
}

impl<V: Copy> FiringSolution<V> {
    /// Number of solutions (0, 1 or 2).
    pub fn count(&self) -> usize {
        match self {
            FiringSolution::None => 0,
            FiringSolution::Single(_) => 1,
            FiringSolution::Pair { .. } => 2,
        }
    }

    /// Whether no solution exists.
    pub fn is_empty(&self) -> bool {
        matches!(self, FiringSolution::None)
    }

    /// Low arc (or earliest arrival).
    pub fn low(&self) -> Option<V> {
        match *self {
            FiringSolution::None => None,
            FiringSolution::Single(v) => Some(v),
            FiringSolution::Pair { low, .. } => Some(low),
        }
    }

    /// High arc (or latest arrival).
    pub fn high(&self) -> Option<V> {
        match *self {
            FiringSolution::None => None,
            FiringSolution::Single(v) => Some(v),
            FiringSolution::Pair { high, .. } => Some(high),
        }
    }

    /// Iterate over the distinct solutions, low first.
    pub fn iter(&self) -> impl Iterator<Item = V> {
        let (first, second) = match *self {
            FiringSolution::None => (None, None),
            FiringSolution::Single(v) => (Some(v), None),
            FiringSolution::Pair { low, high } => (Some(low), Some(high)),
        };
        first.into_iter().chain(second)
    }

    /// Apply `f` to every solution.
    pub fn map<U>(self, mut f: impl FnMut(V) -> U) -> FiringSolution<U> {
        match self {
            FiringSolution::None => FiringSolution::None,
            FiringSolution::Single(v) => FiringSolution::Single(f(v)),
            FiringSolution::Pair { low, high } => FiringSolution::Pair {
                low: f(low),
                high: f(high),
            },
        }
    }

    fn from_slice(values: &[V]) -> Self {
        match *values {
            [] => FiringSolution::None,
            [single] => FiringSolution::Single(single),
            [low, high, ..] => FiringSolution::Pair { low, high },
        }
    }
}

/// Which two intercept times a moving-target solve keeps when more than
/// two exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterceptPreference {
    /// The two smallest positive times
    #[default]
    EarliestArrival,
    /// The two largest positive times
    LatestArrival,
}

/// Result of an arc-height solve.
///
/// # Fields
/// * `velocity` - Launch velocity
/// * `gravity` - Gravity magnitude (pointing along `-UP`) that makes the
///   arc work
/// * `impact_point` - Where the projectile meets the target
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LateralSolution<V> {
    pub velocity: V,
    pub gravity: f32,
    pub impact_point: V,
}

/// Launch angle above the horizontal plane, in radians.
pub fn elevation<V: Vector>(velocity: V) -> f32 {
    velocity.height().atan2(velocity.ground().length())
}

/// Fire at a static target with a fixed speed under gravity along `-UP`.
///
/// # Arguments
/// * `start` - Launch point
/// * `speed` - Launch speed (must be > 0)
/// * `target` - Point to hit
/// * `gravity` - Gravity magnitude (must be > 0)
///
/// # Returns
/// Up to two velocities; `low` is the flatter arc.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_trajectory::firing::solve_static;
///
/// let solution = solve_static(Vec2::ZERO, 20.0, Vec2::new(10.0, 0.0), 9.8);
/// assert_eq!(solution.count(), 2);
/// ```
pub fn solve_static<V: Vector>(start: V, speed: f32, target: V, gravity: f32) -> FiringSolution<V> {
    if !(speed > 0.0 && gravity > 0.0 && speed.is_finite() && gravity.is_finite()) {
        return FiringSolution::None;
    }
    let diff = target - start;
    if diff == V::ZERO || !diff.is_finite_vector() {
        return FiringSolution::None;
    }

    let ground = diff.ground();
    let x = ground.length();
    let y = diff.height();
    let ground_dir = ground.normalize_or_zero();

    let speed2 = speed * speed;
    let root = speed2 * speed2 - gravity * (gravity * x * x + 2.0 * y * speed2);
    if root < 0.0 {
        return FiringSolution::None;
    }
    let root = root.sqrt();
    let gx = gravity * x;
    let low_angle = (speed2 - root).atan2(gx);
    let high_angle = (speed2 + root).atan2(gx);

    let velocity = |angle: f32| {
        ground_dir * (angle.cos() * speed) + V::UP * (angle.sin() * speed)
    };
    if low_angle == high_angle {
        FiringSolution::Single(velocity(low_angle))
    } else {
        FiringSolution::Pair {
            low: velocity(low_angle),
            high: velocity(high_angle),
        }
    }
}

/// Fire at a static target under an arbitrary constant acceleration.
///
/// The problem is rotated into a frame where `acceleration` points along
/// `-UP`, solved there and rotated back.
pub fn solve_static_accel<V: Vector>(
    start: V,
    speed: f32,
    target: V,
    acceleration: V,
) -> FiringSolution<V> {
    let gravity = acceleration.length();
    if !(gravity > 0.0) {
        return FiringSolution::None;
    }
    let to_local = V::rotation_arc(acceleration, -V::UP);
    let to_world = V::inverse_rotation(to_local);
    let local_target = V::rotate(to_local, target - start);
    solve_static(V::ZERO, speed, local_target, gravity).map(|v| V::rotate(to_world, v))
}

/// Fire at a target moving with constant velocity.
///
/// Solves the quartic in intercept time
/// `|D + V·t - ½·a·t²|² = s²·t²` (`D` relative displacement, `V` target
/// velocity, `a` acceleration), keeps positive finite roots and converts
/// the two chosen by `preference` to launch velocities. Zero acceleration
/// degenerates to a first-order intercept.
///
/// # Returns
/// Up to two velocities; `low` always arrives first.
pub fn solve_moving<V: Vector>(
    start: V,
    speed: f32,
    target: V,
    target_velocity: V,
    acceleration: V,
    preference: InterceptPreference,
) -> FiringSolution<V> {
    if !(speed > 0.0 && speed.is_finite()) {
        return FiringSolution::None;
    }
    let displacement = target - start;
    let half_accel = acceleration * -0.5;

    let d = |a: V, b: V| f64::from(a.dot(b));
    let s = f64::from(speed);
    let c0 = d(half_accel, half_accel);
    let c1 = 2.0 * d(target_velocity, half_accel);
    let c2 = d(target_velocity, target_velocity) + 2.0 * d(displacement, half_accel) - s * s;
    let c3 = 2.0 * d(displacement, target_velocity);
    let c4 = d(displacement, displacement);

    let roots = solve_quartic(c0, c1, c2, c3, c4).sorted();
    let velocities: Vec<V> = intercept_times(roots.as_slice(), preference)
        .into_iter()
        .map(|t| {
            let t = t as f32;
            (displacement + target_velocity * t + half_accel * (t * t)) / t
        })
        .filter(|v| v.is_finite_vector())
        .collect();
    FiringSolution::from_slice(&velocities)
}

/// Pick at most two intercept times from ascending `roots`.
///
/// Non-positive, non-finite and near-duplicate roots are dropped first.
fn intercept_times(roots: &[f64], preference: InterceptPreference) -> Vec<f64> {
    let mut times: Vec<f64> = Vec::with_capacity(roots.len());
    for &t in roots {
        if !(t > 0.0 && t.is_finite()) {
            continue;
        }
        if times.last().is_some_and(|&last| (t - last).abs() < SAME_TIME_EPSILON) {
            continue;
        }
        times.push(t);
    }

    match preference {
        InterceptPreference::EarliestArrival => times.truncate(2),
        InterceptPreference::LatestArrival => {
            let skip = times.len().saturating_sub(2);
            times.drain(..skip);
        }
    }
    times
}

/// Fire at a static target with a fixed horizontal speed, choosing gravity
/// so that the arc passes through `peak_height`.
///
/// Heights are modelled as a quadratic Bezier between start height, peak
/// height and target height over the flight time `ground distance /
/// lateral_speed`.
///
/// Returns `None` when the target is directly above/below the start, the
/// speed is not positive, or the peak does not rise above the start.
pub fn solve_lateral<V: Vector>(
    start: V,
    lateral_speed: f32,
    target: V,
    peak_height: f32,
) -> Option<LateralSolution<V>> {
    if !(lateral_speed > 0.0) || start == target || peak_height <= start.height() {
        return None;
    }
    let ground = (target - start).ground();
    let distance = ground.length();
    if distance <= MIN_GROUND_DISTANCE {
        return None;
    }
    let time = distance / lateral_speed;

    let a = start.height();
    let b = peak_height;
    let c = target.height();
    let gravity = -4.0 * (a - 2.0 * b + c) / (time * time);
    if !(gravity > 0.0 && gravity.is_finite()) {
        return None;
    }
    let vertical = -(3.0 * a - 4.0 * b + c) / time;

    Some(LateralSolution {
        velocity: V::from_ground_and_height(ground.normalize_or_zero() * lateral_speed, vertical),
        gravity,
        impact_point: target,
    })
}

/// Moving-target version of [`solve_lateral`].
///
/// The intercept time comes from the ground-plane quadratic (target ground
/// velocity against the fixed lateral speed); the peak is placed
/// `arc_height` above the higher of the start and the impact point.
pub fn solve_lateral_moving<V: Vector>(
    start: V,
    lateral_speed: f32,
    target: V,
    target_velocity: V,
    arc_height: f32,
) -> Option<LateralSolution<V>> {
    if !(lateral_speed > 0.0) || start == target {
        return None;
    }
    let ground_diff = (target - start).ground();
    let ground_velocity = target_velocity.ground();

    let d = |a: V, b: V| f64::from(a.dot(b));
    let s = f64::from(lateral_speed);
    let c0 = d(ground_velocity, ground_velocity) - s * s;
    let c1 = 2.0 * d(ground_diff, ground_velocity);
    let c2 = d(ground_diff, ground_diff);

    let time = solve_quadratic(c0, c1, c2)
        .iter()
        .filter(|t| *t > 0.0 && t.is_finite())
        .reduce(f64::min)? as f32;

    let impact_point = target + target_velocity * time;
    let peak = start.height().max(impact_point.height()) + arc_height;
    let solution = solve_lateral(start, lateral_speed, impact_point, peak)?;
    Some(LateralSolution {
        impact_point,
        ..solution
    })
}

/// Launch speed needed to hit `target` at a fixed launch `angle` (radians
/// above horizontal) under gravity along `-UP`.
///
/// Returns `None` when the target cannot be reached at that angle.
pub fn solve_speed_for_angle<V: Vector>(start: V, target: V, angle: f32, gravity: f32) -> Option<f32> {
    if !(gravity > 0.0) {
        return None;
    }
    let diff = target - start;
    let x = diff.ground().length();
    let y = diff.height();
    if x <= MIN_GROUND_DISTANCE {
        return None;
    }
    let cos = angle.cos();
    let denominator = 2.0 * cos * cos * (y - x * angle.tan());
    if !(denominator < 0.0) {
        return None;
    }
    let speed = (-gravity * x * x / denominator).sqrt();
    speed.is_finite().then_some(speed)
}

/// Maximum horizontal range over flat ground from `initial_height`,
/// reached at a 45° launch. Returns 0 for invalid input.
pub fn ballistic_range(speed: f32, gravity: f32, initial_height: f32) -> f32 {
    if !(speed > 0.0 && gravity > 0.0 && initial_height >= 0.0) {
        return 0.0;
    }
    let angle = std::f32::consts::FRAC_PI_4;
    let (sin, cos) = angle.sin_cos();
    (speed * cos / gravity)
        * (speed * sin + (speed * speed * sin * sin + 2.0 * gravity * initial_height).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    /// Position after `t` seconds of free flight.
    fn fly<V: Vector>(start: V, velocity: V, acceleration: V, t: f32) -> V {
        start + velocity * t + acceleration * (0.5 * t * t)
    }

    #[test]
    fn test_static_two_solutions_with_expected_range() {
        let solution = solve_static(Vec2::ZERO, 20.0, Vec2::new(10.0, 0.0), 9.8);
        assert_eq!(solution.count(), 2);
        for velocity in solution.iter() {
            let angle = elevation(velocity);
            let range = 20.0 * 20.0 * (2.0 * angle).sin() / 9.8;
            assert!((range - 10.0).abs() < 1e-3, "range {range}");
        }
        let low = solution.low().unwrap();
        let high = solution.high().unwrap();
        assert!(elevation(low) < elevation(high));
    }

    #[test]
    fn test_static_out_of_range() {
        let solution = solve_static(Vec3::ZERO, 5.0, Vec3::new(100.0, 0.0, 0.0), 9.8);
        assert!(solution.is_empty());
        assert_eq!(solution.low(), None);
    }

    #[test]
    fn test_static_invalid_inputs() {
        let target = Vec2::new(10.0, 0.0);
        assert!(solve_static(Vec2::ZERO, 0.0, target, 9.8).is_empty());
        assert!(solve_static(Vec2::ZERO, 20.0, target, 0.0).is_empty());
        assert!(solve_static(Vec2::ZERO, 20.0, target, -9.8).is_empty());
        assert!(solve_static(target, 20.0, target, 9.8).is_empty());
    }

    #[test]
    fn test_static_3d_keeps_ground_direction() {
        let target = Vec3::new(0.0, 1.0, -8.0);
        let low = solve_static(Vec3::ZERO, 15.0, target, 9.8).low().unwrap();
        assert!(low.x.abs() < 1e-5);
        assert!(low.z < 0.0);
        assert!((low.length() - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_static_accel_matches_scalar_gravity() {
        let target = Vec3::new(12.0, 2.0, 3.0);
        let scalar = solve_static(Vec3::ZERO, 18.0, target, 9.8);
        let vector = solve_static_accel(Vec3::ZERO, 18.0, target, Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(vector.count(), scalar.count());
        for (a, b) in scalar.iter().zip(vector.iter()) {
            assert!((a - b).length() < 1e-3);
        }
    }

    #[test]
    fn test_static_accel_sideways_force_hits_target() {
        let acceleration = Vec2::new(-9.8, 0.0);
        let target = Vec2::new(0.0, 10.0);
        let solution = solve_static_accel(Vec2::ZERO, 20.0, target, acceleration);
        assert_eq!(solution.count(), 2);
        for velocity in solution.iter() {
            // Find the time at which the projectile crosses y = 10.
            let t = 10.0 / velocity.y;
            let end = fly(Vec2::ZERO, velocity, acceleration, t);
            assert!((end - target).length() < 1e-2, "{end:?}");
        }
    }

    #[test]
    fn test_moving_with_still_target_matches_static() {
        let target = Vec2::new(10.0, 0.0);
        let gravity = Vec2::new(0.0, -9.8);
        let moving = solve_moving(
            Vec2::ZERO,
            20.0,
            target,
            Vec2::ZERO,
            gravity,
            InterceptPreference::EarliestArrival,
        );
        let still = solve_static(Vec2::ZERO, 20.0, target, 9.8);
        assert_eq!(moving.count(), 2);
        assert!((moving.low().unwrap() - still.low().unwrap()).length() < 1e-2);
        assert!((moving.high().unwrap() - still.high().unwrap()).length() < 1e-2);
    }

    #[test]
    fn test_moving_target_is_intercepted() {
        let target = Vec3::new(20.0, 0.0, 5.0);
        let target_velocity = Vec3::new(-2.0, 0.0, 1.0);
        let gravity = Vec3::new(0.0, -9.8, 0.0);
        let solution = solve_moving(
            Vec3::ZERO,
            25.0,
            target,
            target_velocity,
            gravity,
            InterceptPreference::EarliestArrival,
        );
        let velocity = solution.low().expect("target is in range");
        assert!((velocity.length() - 25.0).abs() < 1e-2);

        // Time of flight from the ground-plane closing speed.
        let relative = velocity - target_velocity;
        let t = (target - Vec3::ZERO).x / relative.x;
        let projectile = fly(Vec3::ZERO, velocity, gravity, t);
        let predicted = target + target_velocity * t;
        assert!((projectile - predicted).length() < 1e-2);
    }

    #[test]
    fn test_moving_first_order_intercept_without_gravity() {
        let solution = solve_moving(
            Vec2::ZERO,
            10.0,
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 6.0),
            Vec2::ZERO,
            InterceptPreference::EarliestArrival,
        );
        // 8-6-10 triangle: t = 1.25
        let velocity = solution.low().unwrap();
        assert_eq!(solution.count(), 1);
        assert!((velocity - Vec2::new(8.0, 6.0)).length() < 1e-3);
    }

    #[test]
    fn test_moving_preference_orders_by_arrival() {
        let gravity = Vec2::new(0.0, -9.8);
        let earliest = solve_moving(
            Vec2::ZERO,
            20.0,
            Vec2::new(10.0, 0.0),
            Vec2::ZERO,
            gravity,
            InterceptPreference::EarliestArrival,
        );
        let latest = solve_moving(
            Vec2::ZERO,
            20.0,
            Vec2::new(10.0, 0.0),
            Vec2::ZERO,
            gravity,
            InterceptPreference::LatestArrival,
        );
        // Only two positive times exist, so both preferences agree.
        assert_eq!(earliest, latest);
    }

    #[test]
    fn test_intercept_times_follow_preference() {
        let roots = [-2.0, 0.0, 0.5, 1.5, 1.5 + 1e-9, 3.0, 4.0, f64::INFINITY];

        let earliest = intercept_times(&roots, InterceptPreference::EarliestArrival);
        assert_eq!(earliest, vec![0.5, 1.5]);

        let latest = intercept_times(&roots, InterceptPreference::LatestArrival);
        assert_eq!(latest, vec![3.0, 4.0]);

        let single = intercept_times(&[-1.0, 2.0], InterceptPreference::LatestArrival);
        assert_eq!(single, vec![2.0]);
        assert!(intercept_times(&[-1.0, 0.0], InterceptPreference::EarliestArrival).is_empty());
    }

    #[test]
    fn test_moving_unreachable() {
        let solution = solve_moving(
            Vec2::ZERO,
            1.0,
            Vec2::new(50.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, -9.8),
            InterceptPreference::EarliestArrival,
        );
        assert!(solution.is_empty());
    }

    #[test]
    fn test_lateral_reaches_peak_and_target() {
        let start = Vec3::new(0.0, 1.0, 0.0);
        let target = Vec3::new(8.0, 0.0, 6.0);
        let solution = solve_lateral(start, 5.0, target, 6.0).unwrap();

        let ground_speed = Vector::ground(solution.velocity).length();
        assert!((ground_speed - 5.0).abs() < 1e-4);

        let gravity = Vec3::new(0.0, -solution.gravity, 0.0);
        let t = 10.0 / 5.0;
        let end = fly(start, solution.velocity, gravity, t);
        assert!((end - target).length() < 1e-3);
    }

    #[test]
    fn test_lateral_rejects_degenerate_input() {
        let start = Vec2::ZERO;
        assert!(solve_lateral(start, 5.0, Vec2::new(0.0, 3.0), 6.0).is_none());
        assert!(solve_lateral(start, 0.0, Vec2::new(4.0, 0.0), 6.0).is_none());
        assert!(solve_lateral(start, 5.0, Vec2::new(4.0, 0.0), -1.0).is_none());
    }

    #[test]
    fn test_lateral_moving_hits_moving_target() {
        let start = Vec2::ZERO;
        let target = Vec2::new(10.0, 0.0);
        let target_velocity = Vec2::new(2.0, 0.0);
        let solution = solve_lateral_moving(start, 6.0, target, target_velocity, 3.0).unwrap();

        // Closing speed 4 m/s over 10 m.
        assert!((solution.impact_point - Vec2::new(15.0, 0.0)).length() < 1e-3);
        let gravity = Vec2::new(0.0, -solution.gravity);
        let end = fly(start, solution.velocity, gravity, 2.5);
        assert!((end - solution.impact_point).length() < 1e-3);
    }

    #[test]
    fn test_speed_for_angle() {
        let angle = std::f32::consts::FRAC_PI_4;
        let speed = solve_speed_for_angle(Vec2::ZERO, Vec2::new(10.0, 0.0), angle, 9.8).unwrap();
        // Flat ground at 45°: range = v²/g
        assert!((speed * speed / 9.8 - 10.0).abs() < 1e-3);

        // Target above the line of fire is unreachable.
        assert!(solve_speed_for_angle(Vec2::ZERO, Vec2::new(1.0, 5.0), angle, 9.8).is_none());
    }

    #[test]
    fn test_ballistic_range() {
        assert!((ballistic_range(10.0, 10.0, 0.0) - 10.0).abs() < 1e-4);
        assert!(ballistic_range(10.0, 10.0, 5.0) > 10.0);
        assert_eq!(ballistic_range(0.0, 9.8, 0.0), 0.0);
        assert_eq!(ballistic_range(10.0, 9.8, -1.0), 0.0);
    }

    #[test]
    fn test_solution_helpers() {
        let pair = FiringSolution::Pair { low: 1, high: 2 };
        assert_eq!(pair.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pair.map(|v| v * 10).high(), Some(20));
        assert_eq!(FiringSolution::Single(3).count(), 1);
        assert_eq!(FiringSolution::<i32>::None.iter().count(), 0);
    }
}
