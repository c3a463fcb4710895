//! Benchmark for solver and predictor performance.

use bevy::prelude::*;
use bevy_trajectory::polynomial::solve_quartic;
use bevy_trajectory::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn benchmark_solvers(c: &mut Criterion) {
    c.bench_function("Quartic Solve", |b| {
        b.iter(|| solve_quartic(black_box(1.0), 1.0, -7.0, -1.0, black_box(6.0)));
    });

    c.bench_function("Static Firing Solution", |b| {
        b.iter(|| solve_static(Vec3::ZERO, black_box(40.0), Vec3::new(60.0, 4.0, -20.0), 9.81));
    });

    c.bench_function("Moving Firing Solution", |b| {
        b.iter(|| {
            solve_moving(
                Vec3::ZERO,
                black_box(40.0),
                Vec3::new(60.0, 4.0, -20.0),
                Vec3::new(-3.0, 0.0, 5.0),
                Vec3::new(0.0, -9.81, 0.0),
                InterceptPreference::EarliestArrival,
            )
        });
    });
}

fn benchmark_prediction(c: &mut Criterion) {
    let mut field = ObstacleField::<Vec3>::new();
    field.add_plane(Vec3::ZERO, Vec3::Y);
    field.add_plane(Vec3::new(0.0, 0.0, -30.0), Vec3::Z);
    for i in 0..16 {
        field.add_ball(Vec3::new(i as f32 * 3.0 - 24.0, 1.0, -15.0), 0.75);
    }
    let launch = Launch::new(
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(3.0, 8.0, -12.0),
        Vec3::new(0.0, -9.81, 0.0),
    );

    let mut group = c.benchmark_group("Bounce Prediction");
    for resolution in [0.5, 0.1, 0.02].iter() {
        let settings = PredictSettings::default()
            .with_march(MarchSettings::new(*resolution, 60.0).with_radius(0.1))
            .with_max_bounces(4);

        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &settings,
            |b, settings| {
                let mut exclusions = ExclusionSet::new();
                b.iter(|| predict(&field, &LayerMask::ALL, launch, settings, &mut exclusions));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_solvers, benchmark_prediction);
criterion_main!(benches);
