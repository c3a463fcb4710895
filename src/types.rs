//! Common types for the trajectory engine: the dimension-generic vector
//! abstraction, kinematic samples, impacts and the collision query seam.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Small vector-algebra capability set shared by the 2D and 3D engines.
///
/// Every solver, the marcher, the bounce predictor and the path player are
/// written once against this trait and instantiated for [`Vec2`] and
/// [`Vec3`]. "Up" is the positive Y axis in both dimensions; gravity points
/// along `-UP` unless a full acceleration vector is supplied.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_trajectory::types::Vector;
///
/// let v = Vec3::new(3.0, -4.0, 0.0);
/// let bounced = Vector::reflect(v, Vec3::Y);
/// assert_eq!(bounced, Vec3::new(3.0, 4.0, 0.0));
/// assert_eq!(Vector::height(v), -4.0);
/// ```
pub trait Vector:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + Div<f32, Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
{
    /// Orientation type of this dimension (`Rot2` or `Quat`).
    type Rotation: Copy + fmt::Debug + Send + Sync + 'static;

    /// The zero vector.
    const ZERO: Self;
    /// Unit vector pointing "up" (against gravity).
    const UP: Self;

    /// Dot product.
    fn dot(self, rhs: Self) -> f32;

    /// Squared length.
    fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length.
    fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero when the length is zero
    /// or not finite.
    fn normalize_or_zero(self) -> Self {
        let length = self.length();
        if length > 0.0 && length.is_finite() {
            self * (1.0 / length)
        } else {
            Self::ZERO
        }
    }

    /// Mirror `self` about the plane with the given unit `normal`.
    fn reflect(self, normal: Self) -> Self {
        self - normal * (2.0 * self.dot(normal))
    }

    /// Linear interpolation, `t = 0` yields `self`.
    fn lerp(self, rhs: Self, t: f32) -> Self {
        self + (rhs - self) * t
    }

    /// Component along [`Vector::UP`].
    fn height(self) -> f32 {
        self.dot(Self::UP)
    }

    /// Projection onto the ground plane (vertical component removed).
    fn ground(self) -> Self {
        self - Self::UP * self.height()
    }

    /// Recombine a ground-plane vector with a vertical component.
    fn from_ground_and_height(ground: Self, height: f32) -> Self {
        ground.ground() + Self::UP * height
    }

    /// Whether every component is finite.
    fn is_finite_vector(self) -> bool;

    /// Identity orientation.
    fn identity_rotation() -> Self::Rotation;

    /// Apply `rotation` to `vector`.
    fn rotate(rotation: Self::Rotation, vector: Self) -> Self;

    /// Inverse of `rotation`.
    fn inverse_rotation(rotation: Self::Rotation) -> Self::Rotation;

    /// Shortest rotation taking direction `from` onto direction `to`.
    /// Zero inputs yield the identity.
    fn rotation_arc(from: Self, to: Self) -> Self::Rotation;

    /// Read this vector from a Bevy translation.
    fn from_translation(translation: Vec3) -> Self;

    /// Write this vector as a Bevy translation; 2D uses `depth` for Z.
    fn to_translation(self, depth: f32) -> Vec3;

    /// Orientation of a Bevy transform in this dimension.
    fn orientation(transform: &Transform) -> Self::Rotation;
}

impl Vector for Vec3 {
    type Rotation = Quat;

    const ZERO: Self = Vec3::ZERO;
    const UP: Self = Vec3::Y;

    fn dot(self, rhs: Self) -> f32 {
        Vec3::dot(self, rhs)
    }

    fn length(self) -> f32 {
        Vec3::length(self)
    }

    fn normalize_or_zero(self) -> Self {
        Vec3::normalize_or_zero(self)
    }

    fn lerp(self, rhs: Self, t: f32) -> Self {
        Vec3::lerp(self, rhs, t)
    }

    fn is_finite_vector(self) -> bool {
        self.is_finite()
    }

    fn identity_rotation() -> Quat {
        Quat::IDENTITY
    }

    fn rotate(rotation: Quat, vector: Self) -> Self {
        rotation * vector
    }

    fn inverse_rotation(rotation: Quat) -> Quat {
        rotation.inverse()
    }

    fn rotation_arc(from: Self, to: Self) -> Quat {
        let from = Vec3::normalize_or_zero(from);
        let to = Vec3::normalize_or_zero(to);
        if from == Vec3::ZERO || to == Vec3::ZERO {
            return Quat::IDENTITY;
        }
        Quat::from_rotation_arc(from, to)
    }

    fn from_translation(translation: Vec3) -> Self {
        translation
    }

    fn to_translation(self, _depth: f32) -> Vec3 {
        self
    }

    fn orientation(transform: &Transform) -> Quat {
        transform.rotation
    }
}

impl Vector for Vec2 {
    type Rotation = Rot2;

    const ZERO: Self = Vec2::ZERO;
    const UP: Self = Vec2::Y;

    fn dot(self, rhs: Self) -> f32 {
        Vec2::dot(self, rhs)
    }

    fn length(self) -> f32 {
        Vec2::length(self)
    }

    fn normalize_or_zero(self) -> Self {
        Vec2::normalize_or_zero(self)
    }

    fn lerp(self, rhs: Self, t: f32) -> Self {
        Vec2::lerp(self, rhs, t)
    }

    fn is_finite_vector(self) -> bool {
        self.is_finite()
    }

    fn identity_rotation() -> Rot2 {
        Rot2::IDENTITY
    }

    fn rotate(rotation: Rot2, vector: Self) -> Self {
        rotation * vector
    }

    fn inverse_rotation(rotation: Rot2) -> Rot2 {
        rotation.inverse()
    }

    fn rotation_arc(from: Self, to: Self) -> Rot2 {
        if from == Vec2::ZERO || to == Vec2::ZERO {
            return Rot2::IDENTITY;
        }
        Rot2::radians(from.perp_dot(to).atan2(Vec2::dot(from, to)))
    }

    fn from_translation(translation: Vec3) -> Self {
        translation.truncate()
    }

    fn to_translation(self, depth: f32) -> Vec3 {
        self.extend(depth)
    }

    fn orientation(transform: &Transform) -> Rot2 {
        let (angle, _, _) = transform.rotation.to_euler(EulerRot::ZYX);
        Rot2::radians(angle)
    }
}

/// Sum world forces and body-local forces rotated by `orientation`.
///
/// Constant acceleration for a prediction is assembled fresh per request
/// from its contributing sources; nothing accumulates between calls.
pub fn net_acceleration<V: Vector>(
    global: impl IntoIterator<Item = V>,
    orientation: V::Rotation,
    local: impl IntoIterator<Item = V>,
) -> V {
    let world = global.into_iter().fold(V::ZERO, |sum, force| sum + force);
    let body = local.into_iter().fold(V::ZERO, |sum, force| sum + force);
    world + V::rotate(orientation, body)
}

/// A single recorded sample of a marched path.
///
/// `time` is measured from the start of the segment that owns the sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KinematicState<V> {
    /// Position at `time`
    pub position: V,
    /// Velocity at `time`
    pub velocity: V,
    /// Elapsed time since segment launch (seconds, ≥ 0)
    pub time: f32,
}

impl<V: Vector> KinematicState<V> {
    /// Launch sample at time zero.
    pub fn launch(position: V, velocity: V) -> Self {
        Self {
            position,
            velocity,
            time: 0.0,
        }
    }
}

/// First hit reported by a collision query.
///
/// # Fields
/// * `position` - Where the probe centre stopped (for swept probes, the
///   centre of the swept volume at contact)
/// * `normal` - Unit surface normal at the hit
/// * `obstacle` - Opaque handle of the hit obstacle
/// * `distance` - Distance travelled along the probe before the hit
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Impact<V, O> {
    pub position: V,
    pub normal: V,
    pub obstacle: O,
    pub distance: f32,
}

/// A bounded cast: a ray when `radius` is zero, otherwise a swept
/// circle/sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Probe<V> {
    /// Start of the cast
    pub origin: V,
    /// Unit direction of the cast
    pub direction: V,
    /// Maximum distance to test
    pub max_distance: f32,
    /// Radius of the swept volume (0 for a ray)
    pub radius: f32,
}

impl<V: Vector> Probe<V> {
    /// Point reached after travelling `distance` along the probe.
    pub fn point_at(&self, distance: f32) -> V {
        self.origin + self.direction * distance
    }
}

/// Collision query abstraction consumed by the marcher.
///
/// Implemented by the built-in [`ObstacleField`](crate::obstacles::ObstacleField)
/// and, behind the `dim3`/`dim2` features, by avian's `SpatialQuery`.
/// Implementations must return the closest hit within
/// `probe.max_distance`, skipping every obstacle listed in `excluded` and
/// every obstacle rejected by `filter`.
pub trait CollisionWorld<V: Vector> {
    /// Opaque obstacle handle.
    type Obstacle: Copy + PartialEq + fmt::Debug;
    /// Collision filter set (layer masks and the like).
    type Filter;

    /// Cast `probe` and return the first hit, if any.
    fn cast(
        &self,
        probe: &Probe<V>,
        filter: &Self::Filter,
        excluded: &[Self::Obstacle],
    ) -> Option<Impact<V, Self::Obstacle>>;
}

/// Obstacles temporarily removed from collision queries.
///
/// Entries are only ever added through an [`ExclusionScope`], which
/// removes them again when dropped, so the set is restored on every exit
/// path of the code holding the scope.
#[derive(Clone, Debug, Default)]
pub struct ExclusionSet<O> {
    entries: Vec<O>,
}

impl<O: Copy> ExclusionSet<O> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Currently excluded obstacles.
    pub fn as_slice(&self) -> &[O] {
        &self.entries
    }

    /// Number of excluded obstacles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exclude `obstacle` (if any) until the returned scope is dropped.
    pub fn scope(&mut self, obstacle: Option<O>) -> ExclusionScope<'_, O> {
        let restore_len = self.entries.len();
        self.entries.extend(obstacle);
        ExclusionScope {
            set: self,
            restore_len,
        }
    }
}

/// Guard returned by [`ExclusionSet::scope`].
pub struct ExclusionScope<'a, O: Copy> {
    set: &'a mut ExclusionSet<O>,
    restore_len: usize,
}

impl<O: Copy> ExclusionScope<'_, O> {
    /// Open a narrower scope on top of this one.
    pub fn nested(&mut self, obstacle: Option<O>) -> ExclusionScope<'_, O> {
        self.set.scope(obstacle)
    }

    /// Obstacles excluded while this scope is open.
    pub fn as_slice(&self) -> &[O] {
        self.set.as_slice()
    }
}

impl<O: Copy> Drop for ExclusionScope<'_, O> {
    fn drop(&mut self) {
        self.set.entries.truncate(self.restore_len);
    }
}
