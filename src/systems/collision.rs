//! Avian spatial queries as collision backends for the marcher.
//!
//! Probes with a zero radius become ray casts; otherwise a sphere (3D) or
//! circle (2D) of that radius is shape cast along the probe. Excluded
//! obstacles are merged into the query filter's excluded entities.

use std::borrow::Cow;

use bevy::prelude::*;

use crate::types::{CollisionWorld, Impact, Probe};

#[cfg(feature = "dim3")]
impl CollisionWorld<Vec3> for avian3d::prelude::SpatialQuery<'_, '_> {
    type Obstacle = Entity;
    type Filter = avian3d::prelude::SpatialQueryFilter;

    fn cast(
        &self,
        probe: &Probe<Vec3>,
        filter: &Self::Filter,
        excluded: &[Entity],
    ) -> Option<Impact<Vec3, Entity>> {
        use avian3d::prelude::{Collider, ShapeCastConfig};

        let direction = Dir3::new(probe.direction).ok()?;
        let filter = with_exclusions_3d(filter, excluded);

        if probe.radius > 0.0 {
            let hit = self.cast_shape(
                &Collider::sphere(probe.radius),
                probe.origin,
                Quat::IDENTITY,
                direction,
                &ShapeCastConfig::from_max_distance(probe.max_distance),
                &filter,
            )?;
            Some(Impact {
                position: probe.point_at(hit.distance),
                normal: hit.normal1,
                obstacle: hit.entity,
                distance: hit.distance,
            })
        } else {
            let hit = self.cast_ray(probe.origin, direction, probe.max_distance, true, &filter)?;
            Some(Impact {
                position: probe.point_at(hit.distance),
                normal: hit.normal,
                obstacle: hit.entity,
                distance: hit.distance,
            })
        }
    }
}

#[cfg(feature = "dim3")]
fn with_exclusions_3d<'a>(
    filter: &'a avian3d::prelude::SpatialQueryFilter,
    excluded: &[Entity],
) -> Cow<'a, avian3d::prelude::SpatialQueryFilter> {
    if excluded.is_empty() {
        return Cow::Borrowed(filter);
    }
    let mut filter = filter.clone();
    filter.excluded_entities.extend(excluded.iter().copied());
    Cow::Owned(filter)
}

#[cfg(feature = "dim2")]
impl CollisionWorld<Vec2> for avian2d::prelude::SpatialQuery<'_, '_> {
    type Obstacle = Entity;
    type Filter = avian2d::prelude::SpatialQueryFilter;

    fn cast(
        &self,
        probe: &Probe<Vec2>,
        filter: &Self::Filter,
        excluded: &[Entity],
    ) -> Option<Impact<Vec2, Entity>> {
        use avian2d::prelude::{Collider, ShapeCastConfig};

        let direction = Dir2::new(probe.direction).ok()?;
        let filter = with_exclusions_2d(filter, excluded);

        if probe.radius > 0.0 {
            let hit = self.cast_shape(
                &Collider::circle(probe.radius),
                probe.origin,
                0.0,
                direction,
                &ShapeCastConfig::from_max_distance(probe.max_distance),
                &filter,
            )?;
            Some(Impact {
                position: probe.point_at(hit.distance),
                normal: hit.normal1,
                obstacle: hit.entity,
                distance: hit.distance,
            })
        } else {
            let hit = self.cast_ray(probe.origin, direction, probe.max_distance, true, &filter)?;
            Some(Impact {
                position: probe.point_at(hit.distance),
                normal: hit.normal,
                obstacle: hit.entity,
                distance: hit.distance,
            })
        }
    }
}

#[cfg(feature = "dim2")]
fn with_exclusions_2d<'a>(
    filter: &'a avian2d::prelude::SpatialQueryFilter,
    excluded: &[Entity],
) -> Cow<'a, avian2d::prelude::SpatialQueryFilter> {
    if excluded.is_empty() {
        return Cow::Borrowed(filter);
    }
    let mut filter = filter.clone();
    filter.excluded_entities.extend(excluded.iter().copied());
    Cow::Owned(filter)
}
