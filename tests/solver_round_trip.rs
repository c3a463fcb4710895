//! Firing solutions flown through the marcher.

use bevy::prelude::*;
use bevy_trajectory::polynomial::{solve_cubic, solve_quadratic};
use bevy_trajectory::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GRAVITY: f32 = 9.8;
const STEP: f32 = 0.05;

fn fly_to_floor(velocity: Vec2) -> PathSegment<Vec2, ObstacleId> {
    let mut field = ObstacleField::new();
    field.add_plane(Vec2::ZERO, Vec2::Y);
    let launch = Launch::new(Vec2::ZERO, velocity, Vec2::new(0.0, -GRAVITY));
    march(
        &field,
        &LayerMask::ALL,
        launch,
        &MarchSettings::new(STEP, 200.0),
        &mut ExclusionSet::new(),
    )
}

#[test]
fn test_low_and_high_arcs_land_on_target() {
    let target = Vec2::new(10.0, 0.0);
    let solution = solve_static(Vec2::ZERO, 20.0, target, GRAVITY);
    assert_eq!(solution.count(), 2);

    let low = fly_to_floor(solution.low().unwrap());
    let high = fly_to_floor(solution.high().unwrap());

    for segment in [&low, &high] {
        assert!(segment.impact().is_some());
        let landing = segment.end_state().position;
        assert!((landing - target).length() < 0.05, "landed at {landing:?}");
    }
    assert!(high.flight_time() > low.flight_time());
}

#[test]
fn test_solution_passes_through_elevated_target_in_open_air() {
    let target = Vec3::new(6.0, 3.0, -4.0);
    let solution = solve_static(Vec3::ZERO, 15.0, target, GRAVITY);
    let field = ObstacleField::<Vec3>::new();

    for velocity in solution.iter() {
        let launch = Launch::new(Vec3::ZERO, velocity, Vec3::new(0.0, -GRAVITY, 0.0));
        let segment = march(
            &field,
            &LayerMask::ALL,
            launch,
            &MarchSettings::new(STEP, 100.0),
            &mut ExclusionSet::new(),
        );
        let closest = segment
            .steps()
            .iter()
            .map(|step| (step.position - target).length())
            .fold(f32::INFINITY, f32::min);
        assert!(closest < STEP, "closest approach {closest}");
    }
}

#[test]
fn test_moving_target_is_met_at_some_step() {
    let target = Vec2::new(12.0, 2.0);
    let target_velocity = Vec2::new(-3.0, 1.0);
    let acceleration = Vec2::new(0.0, -GRAVITY);
    let solution = solve_moving(
        Vec2::ZERO,
        18.0,
        target,
        target_velocity,
        acceleration,
        InterceptPreference::EarliestArrival,
    );
    assert!(!solution.is_empty());

    let field = ObstacleField::<Vec2>::new();
    for velocity in solution.iter() {
        let launch = Launch::new(Vec2::ZERO, velocity, acceleration);
        let segment = march(
            &field,
            &LayerMask::ALL,
            launch,
            &MarchSettings::new(STEP, 150.0),
            &mut ExclusionSet::new(),
        );
        let closest = segment
            .steps()
            .iter()
            .map(|step| (step.position - (target + target_velocity * step.time)).length())
            .fold(f32::INFINITY, f32::min);
        assert!(closest < 2.0 * STEP, "closest approach {closest}");
    }
}

#[test]
fn test_solution_against_tilted_acceleration() {
    let acceleration = Vec3::new(2.0, -9.0, 1.0);
    let target = Vec3::new(8.0, 1.0, 5.0);
    let solution = solve_static_accel(Vec3::ZERO, 16.0, target, acceleration);
    assert_eq!(solution.count(), 2);

    let field = ObstacleField::<Vec3>::new();
    for velocity in solution.iter() {
        assert!((velocity.length() - 16.0).abs() < 1e-3);
        let launch = Launch::new(Vec3::ZERO, velocity, acceleration);
        let segment = march(
            &field,
            &LayerMask::ALL,
            launch,
            &MarchSettings::new(STEP, 120.0),
            &mut ExclusionSet::new(),
        );
        let closest = segment
            .steps()
            .iter()
            .map(|step| (step.position - target).length())
            .fold(f32::INFINITY, f32::min);
        assert!(closest < STEP, "closest approach {closest}");
    }
}

#[test]
fn test_randomized_quadratics_recover_their_roots() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let a = [1.0, 2.0, 4.0, -0.5, -8.0][rng.random_range(0..5)];
        let r1: f64 = rng.random_range(-50.0..50.0);
        let r2: f64 = rng.random_range(-50.0..50.0);
        if (r1 - r2).abs() < 1e-3 {
            continue;
        }
        let roots = solve_quadratic(a, -a * (r1 + r2), a * r1 * r2).sorted();
        let expected = if r1 < r2 { [r1, r2] } else { [r2, r1] };
        assert_eq!(roots.len(), 2, "{r1} {r2}");
        for (root, expected) in roots.iter().zip(expected) {
            assert!((root - expected).abs() < 1e-5, "{root} vs {expected}");
        }
    }

    for k in -5..=5 {
        let k = f64::from(k);
        let roots = solve_quadratic(2.0, -4.0 * k, 2.0 * k * k);
        assert_eq!(roots.as_slice(), &[k]);
    }

    for _ in 0..100 {
        let a: f64 = rng.random_range(0.1..10.0);
        let c: f64 = rng.random_range(0.1..10.0);
        assert!(solve_quadratic(a, 0.0, c).is_empty());
    }
}

#[test]
fn test_cube_root_of_eight() {
    let roots = solve_cubic(1.0, 0.0, 0.0, -8.0);
    assert_eq!(roots.len(), 1);
    assert!((roots.as_slice()[0] - 2.0).abs() < 1e-9);
}
