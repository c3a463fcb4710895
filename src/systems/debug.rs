use bevy::prelude::*;

use crate::components::PredictedTrajectory;
use crate::resources::TrajectoryConfig;

const PATH_COLOR: Color = Color::srgb(0.2, 0.9, 0.3);
const IMPACT_COLOR: Color = Color::srgb(1.0, 0.3, 0.1);

// 3D sizes are in metres, 2D sizes in world units of a pixel-scale camera.
const IMPACT_RADIUS_3D: f32 = 0.05;
const NORMAL_LENGTH_3D: f32 = 0.25;
const IMPACT_RADIUS_2D: f32 = 4.0;
const NORMAL_LENGTH_2D: f32 = 16.0;

/// Draw predicted 3D paths as polylines with a marker at each impact.
pub fn draw_predicted_trajectories_3d(
    mut gizmos: Gizmos,
    query: Query<&PredictedTrajectory<Vec3>>,
    config: Res<TrajectoryConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for prediction in query.iter() {
        gizmos.linestrip(prediction.points(), PATH_COLOR);
        for impact in prediction.segments().iter().filter_map(|segment| segment.impact()) {
            gizmos.sphere(impact.position, IMPACT_RADIUS_3D, IMPACT_COLOR);
            gizmos.line(impact.position, impact.position + impact.normal * NORMAL_LENGTH_3D, IMPACT_COLOR);
        }
    }
}

/// Draw predicted 2D paths as polylines with a marker at each impact.
pub fn draw_predicted_trajectories_2d(
    mut gizmos: Gizmos,
    query: Query<&PredictedTrajectory<Vec2>>,
    config: Res<TrajectoryConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for prediction in query.iter() {
        gizmos.linestrip_2d(prediction.points(), PATH_COLOR);
        for impact in prediction.segments().iter().filter_map(|segment| segment.impact()) {
            gizmos.circle_2d(impact.position, IMPACT_RADIUS_2D, IMPACT_COLOR);
            gizmos.line_2d(impact.position, impact.position + impact.normal * NORMAL_LENGTH_2D, IMPACT_COLOR);
        }
    }
}
