//! Headless trajectory prediction.
//!
//! Solves a firing solution against a target, predicts the bounce chain in
//! a small arena and replays it at 60 Hz, printing each bounce.

use bevy::prelude::*;
use bevy_trajectory::prelude::*;

fn main() {
    let gravity = Vec3::new(0.0, -9.81, 0.0);
    let start = Vec3::new(0.0, 1.5, 0.0);
    let target = Vec3::new(14.0, 0.0, -6.0);

    let mut arena = ObstacleField::<Vec3>::new();
    let floor = arena.add_plane(Vec3::ZERO, Vec3::Y);
    let wall = arena.add_plane(Vec3::new(18.0, 0.0, 0.0), Vec3::NEG_X);
    let pillar = arena.add_ball(Vec3::new(9.0, 0.5, -3.0), 0.6);
    println!("arena: floor {floor:?}, wall {wall:?}, pillar {pillar:?}");

    let solution = solve_static(start, 16.0, target, -gravity.y);
    println!(
        "{} firing solution(s), range on flat ground {:.1} m",
        solution.count(),
        ballistic_range(16.0, -gravity.y, start.y)
    );
    let Some(velocity) = solution.high() else {
        println!("target out of reach");
        return;
    };
    println!(
        "lobbing at {:.1} deg: {velocity:?}",
        elevation(velocity).to_degrees()
    );

    let settings = PredictSettings::default()
        .with_march(MarchSettings::new(0.05, 80.0).with_radius(0.1))
        .with_max_bounces(4)
        .with_damping(0.35);
    let prediction = predict(
        &arena,
        &LayerMask::ALL,
        Launch::new(start, velocity, gravity),
        &settings,
        &mut ExclusionSet::new(),
    );
    println!(
        "{} segment(s), {:.2} m over {:.2} s",
        prediction.len(),
        prediction.distance(),
        prediction.duration()
    );

    let mut player = PathPlayer::new(prediction);
    let mut elapsed = 0.0;
    loop {
        elapsed += 1.0 / 60.0;
        let Some(frame) = player.advance(elapsed) else {
            break;
        };
        for impact in &frame.impacts {
            println!(
                "t={:.2}s bounce off {:?} at {:.2?} ({:.1} m/s)",
                impact.time,
                impact.obstacle,
                impact.position,
                impact.velocity.length()
            );
        }
        if let Some(end) = frame.completed {
            println!("path complete at {:.2?}, hand off {:.2?}", end.position, end.velocity);
            break;
        }
    }
}
