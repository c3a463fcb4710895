//! Prediction systems - rebuild previews when an aim changes.
//!
//! Each prediction costs `max_arc_length / step_resolution` collision
//! queries, so it only runs for entities whose inputs changed.

use bevy::log::trace;
use bevy::prelude::*;

use crate::bounce::predict;
use crate::components::{LocalForces, PredictedTrajectory, TrajectoryAim};
use crate::march::Launch;
use crate::path::TrajectoryPrediction;
use crate::resources::{TrajectoryConfig, TrajectoryEnvironment};
use crate::types::{CollisionWorld, ExclusionSet, Vector};

/// Predict the bounce chain for one aiming entity.
///
/// The entity itself is excluded from every probe so that its own collider
/// does not block the launch.
///
/// # Arguments
/// * `world` - Collision backend
/// * `filter` - Filter built from the aim's layers
/// * `entity` - The aiming entity
/// * `transform` - Its transform (launch point and orientation)
/// * `aim` - Launch velocity and radius
/// * `forces` - Optional body-local forces
/// * `config` - Prediction settings
/// * `environment` - World forces
#[allow(clippy::too_many_arguments)]
pub fn predict_aim<V, W>(
    world: &W,
    filter: &W::Filter,
    entity: Entity,
    transform: &Transform,
    aim: &TrajectoryAim<V>,
    forces: Option<&LocalForces<V>>,
    config: &TrajectoryConfig,
    environment: &TrajectoryEnvironment,
) -> TrajectoryPrediction<V, Entity>
where
    V: Vector,
    W: CollisionWorld<V, Obstacle = Entity>,
{
    let local = forces.map(|forces| forces.0.as_slice()).unwrap_or_default();
    let acceleration = environment.acceleration(V::orientation(transform), local);
    let launch = Launch::new(V::from_translation(transform.translation), aim.velocity, acceleration)
        .ignoring(entity);
    let settings = config.predict_settings(aim.radius);
    predict(world, filter, launch, &settings, &mut ExclusionSet::new())
}

fn needs_refresh<V: Vector>(
    transform: &Ref<Transform>,
    aim: &Ref<TrajectoryAim<V>>,
    forces: Option<&Ref<LocalForces<V>>>,
    has_prediction: bool,
    settings_changed: bool,
) -> bool {
    !has_prediction
        || settings_changed
        || transform.is_changed()
        || aim.is_changed()
        || forces.is_some_and(|forces| forces.is_changed())
}

/// Rebuild 3D previews using avian3d's spatial query.
#[cfg(feature = "dim3")]
pub fn update_predicted_trajectories_3d(
    mut commands: Commands,
    config: Res<TrajectoryConfig>,
    environment: Res<TrajectoryEnvironment>,
    spatial_query: avian3d::prelude::SpatialQuery,
    aims: Query<(
        Entity,
        Ref<Transform>,
        Ref<TrajectoryAim<Vec3>>,
        Option<Ref<LocalForces<Vec3>>>,
        Has<PredictedTrajectory<Vec3>>,
    )>,
) {
    use avian3d::prelude::{LayerMask, SpatialQueryFilter};

    let settings_changed = config.is_changed() || environment.is_changed();
    for (entity, transform, aim, forces, has_prediction) in aims.iter() {
        if !needs_refresh(&transform, &aim, forces.as_ref(), has_prediction, settings_changed) {
            continue;
        }
        let filter = SpatialQueryFilter::from_mask(LayerMask(aim.layers));
        let prediction = predict_aim(
            &spatial_query,
            &filter,
            entity,
            &transform,
            &aim,
            forces.as_deref(),
            &config,
            &environment,
        );
        trace!(
            "predicted {} segments for {:?} ({} m)",
            prediction.len(),
            entity,
            prediction.distance()
        );
        commands.entity(entity).insert(PredictedTrajectory(prediction));
    }
}

/// Rebuild 2D previews using avian2d's spatial query.
#[cfg(feature = "dim2")]
pub fn update_predicted_trajectories_2d(
    mut commands: Commands,
    config: Res<TrajectoryConfig>,
    environment: Res<TrajectoryEnvironment>,
    spatial_query: avian2d::prelude::SpatialQuery,
    aims: Query<(
        Entity,
        Ref<Transform>,
        Ref<TrajectoryAim<Vec2>>,
        Option<Ref<LocalForces<Vec2>>>,
        Has<PredictedTrajectory<Vec2>>,
    )>,
) {
    use avian2d::prelude::{LayerMask, SpatialQueryFilter};

    let settings_changed = config.is_changed() || environment.is_changed();
    for (entity, transform, aim, forces, has_prediction) in aims.iter() {
        if !needs_refresh(&transform, &aim, forces.as_ref(), has_prediction, settings_changed) {
            continue;
        }
        let filter = SpatialQueryFilter::from_mask(LayerMask(aim.layers));
        let prediction = predict_aim(
            &spatial_query,
            &filter,
            entity,
            &transform,
            &aim,
            forces.as_deref(),
            &config,
            &environment,
        );
        trace!(
            "predicted {} segments for {:?} ({} m)",
            prediction.len(),
            entity,
            prediction.distance()
        );
        commands.entity(entity).insert(PredictedTrajectory(prediction));
    }
}
