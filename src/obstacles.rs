//! Built-in analytic obstacle field.
//!
//! A small collision backend made of infinite planes and balls
//! (circles in 2D, spheres in 3D). Useful for headless prediction, tests
//! and benchmarks where no physics engine is running.

use serde::{Deserialize, Serialize};

use crate::types::{CollisionWorld, Impact, Probe, Vector};

/// Probes starting this far behind a plane still register a contact.
const CONTACT_SLOP: f32 = 1e-4;

/// Handle of an obstacle inside an [`ObstacleField`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

/// Collision layer bits. A probe sees an obstacle when the filter mask and
/// the obstacle's layers share at least one bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Every layer.
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    /// No layer.
    pub const NONE: LayerMask = LayerMask(0);

    /// Whether the two masks share a layer.
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

/// Obstacle geometry.
///
/// # Variants
/// * `Plane` - Solid half-space behind `point` facing `normal`
/// * `Ball` - Circle (2D) or sphere (3D)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape<V> {
    Plane { point: V, normal: V },
    Ball { center: V, radius: f32 },
}

/// An obstacle registered in the field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle<V> {
    pub id: ObstacleId,
    pub shape: Shape<V>,
    pub layers: LayerMask,
}

/// Collection of analytic obstacles answering [`CollisionWorld`] queries.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_trajectory::prelude::*;
///
/// let mut field = ObstacleField::<Vec2>::new();
/// let ground = field.add_plane(Vec2::ZERO, Vec2::Y);
/// let probe = Probe {
///     origin: Vec2::new(0.0, 2.0),
///     direction: Vec2::NEG_Y,
///     max_distance: 5.0,
///     radius: 0.0,
/// };
/// let hit = field.cast(&probe, &LayerMask::ALL, &[]).unwrap();
/// assert_eq!(hit.obstacle, ground);
/// assert_eq!(hit.distance, 2.0);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObstacleField<V> {
    obstacles: Vec<Obstacle<V>>,
    next_id: u32,
}

impl<V: Vector> ObstacleField<V> {
    /// Creates an empty field.
    pub fn new() -> Self {
        Self {
            obstacles: Vec::new(),
            next_id: 0,
        }
    }

    /// Add an obstacle on the given layers and return its handle.
    pub fn add(&mut self, shape: Shape<V>, layers: LayerMask) -> ObstacleId {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;
        let shape = match shape {
            Shape::Plane { point, normal } => Shape::Plane {
                point,
                normal: normal.normalize_or_zero(),
            },
            ball => ball,
        };
        self.obstacles.push(Obstacle { id, shape, layers });
        id
    }

    /// Add a plane on every layer.
    pub fn add_plane(&mut self, point: V, normal: V) -> ObstacleId {
        self.add(Shape::Plane { point, normal }, LayerMask::ALL)
    }

    /// Add a ball on every layer.
    pub fn add_ball(&mut self, center: V, radius: f32) -> ObstacleId {
        self.add(Shape::Ball { center, radius }, LayerMask::ALL)
    }

    /// Remove an obstacle. Returns whether it existed.
    pub fn remove(&mut self, id: ObstacleId) -> bool {
        let before = self.obstacles.len();
        self.obstacles.retain(|obstacle| obstacle.id != id);
        self.obstacles.len() != before
    }

    /// Look an obstacle up by handle.
    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle<V>> {
        self.obstacles.iter().find(|obstacle| obstacle.id == id)
    }

    /// All registered obstacles.
    pub fn obstacles(&self) -> &[Obstacle<V>] {
        &self.obstacles
    }
}

impl<V: Vector> CollisionWorld<V> for ObstacleField<V> {
    type Obstacle = ObstacleId;
    type Filter = LayerMask;

    fn cast(
        &self,
        probe: &Probe<V>,
        filter: &LayerMask,
        excluded: &[ObstacleId],
    ) -> Option<Impact<V, ObstacleId>> {
        self.obstacles
            .iter()
            .filter(|obstacle| filter.intersects(obstacle.layers))
            .filter(|obstacle| !excluded.contains(&obstacle.id))
            .filter_map(|obstacle| {
                let (distance, normal) = match obstacle.shape {
                    Shape::Plane { point, normal } => cast_plane(probe, point, normal)?,
                    Shape::Ball { center, radius } => cast_ball(probe, center, radius)?,
                };
                (distance <= probe.max_distance).then(|| Impact {
                    position: probe.point_at(distance),
                    normal,
                    obstacle: obstacle.id,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Plane inflated by the probe radius; only front-face approaches count.
fn cast_plane<V: Vector>(probe: &Probe<V>, point: V, normal: V) -> Option<(f32, V)> {
    let approach = probe.direction.dot(normal);
    if approach >= 0.0 {
        return None;
    }
    let separation = (probe.origin - point).dot(normal) - probe.radius;
    if separation < -CONTACT_SLOP {
        return None;
    }
    Some((separation.max(0.0) / -approach, normal))
}

/// Ball inflated by the probe radius. Probes starting inside only hit when
/// heading further in.
fn cast_ball<V: Vector>(probe: &Probe<V>, center: V, radius: f32) -> Option<(f32, V)> {
    let reach = radius + probe.radius;
    let offset = probe.origin - center;
    let b = offset.dot(probe.direction);
    let c = offset.length_squared() - reach * reach;

    if c <= 0.0 {
        if b >= 0.0 {
            return None;
        }
        return Some((0.0, offset.normalize_or_zero()));
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let distance = -b - discriminant.sqrt();
    let contact = probe.point_at(distance);
    Some((distance, (contact - center).normalize_or_zero()))
}
