//! # Bevy Trajectory
//!
//! Ballistic trajectory engine for Bevy 0.18.
//!
//! ## Features
//! - Closed-form firing solutions: static and moving targets, arbitrary
//!   constant acceleration, fixed arc height, fixed launch angle
//! - Real-root polynomial solvers up to degree four
//! - Fixed-distance trajectory marching against any collision backend
//! - Bounce chains with reflection and damping
//! - Deterministic path playback with per-bounce impact messages
//! - One generic engine for 2D and 3D via feature flags
//!
//! ## Quick Start
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_trajectory::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TrajectoryPluginGroup)
//!         .run();
//! }
//! ```
//!
//! The numeric core needs no running app:
//! ```
//! use bevy::prelude::*;
//! use bevy_trajectory::prelude::*;
//!
//! let mut field = ObstacleField::<Vec2>::new();
//! field.add_plane(Vec2::ZERO, Vec2::Y);
//!
//! let velocity = solve_static(Vec2::new(0.0, 1.0), 12.0, Vec2::new(8.0, 0.0), 9.8)
//!     .low()
//!     .unwrap();
//! let launch = Launch::new(Vec2::new(0.0, 1.0), velocity, Vec2::new(0.0, -9.8));
//! let prediction = predict(
//!     &field,
//!     &LayerMask::ALL,
//!     launch,
//!     &PredictSettings::default(),
//!     &mut ExclusionSet::new(),
//! );
//! assert!(prediction.len() > 1);
//! ```

pub mod bounce;
pub mod components;
pub mod events;
pub mod firing;
pub mod march;
pub mod obstacles;
pub mod path;
pub mod polynomial;
pub mod resources;
pub mod systems;
pub mod types;

pub mod prelude {
    pub use crate::bounce::{predict, reflect_velocity, BudgetPolicy, PredictSettings};
    pub use crate::components::*;
    pub use crate::events::*;
    pub use crate::firing::*;
    pub use crate::march::{march, Integrator, Launch, MarchSettings};
    pub use crate::obstacles::{LayerMask, ObstacleField, ObstacleId, Shape};
    pub use crate::path::*;
    pub use crate::resources::*;
    pub use crate::types::*;
    pub use crate::TrajectoryPluginGroup;
    pub use crate::{TrajectoryDebugPlugin, TrajectoryPlugin};
}

use bevy::prelude::*;

/// Main plugin group that includes all trajectory subsystems.
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use bevy_trajectory::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(TrajectoryPluginGroup)
///         .run();
/// }
/// ```
#[derive(Default)]
pub struct TrajectoryPluginGroup;

impl PluginGroup for TrajectoryPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(TrajectoryPlugin)
            .add(TrajectoryDebugPlugin)
    }
}

/// Core plugin: configuration, messages, prediction and playback.
///
/// # Systems
/// - `advance_path_playback` - Moves entities along their recorded paths
///   and sends impact/completion messages (2D and 3D)
/// - `update_predicted_trajectories_3d` / `_2d` - Rebuilds previews for
///   changed aims using the avian spatial query
/// - `hand_off_linear_velocity_3d` / `_2d` - Restores the physics body's
///   velocity when playback ends
pub struct TrajectoryPlugin;

impl Plugin for TrajectoryPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<resources::TrajectoryConfig>()
            .register_type::<resources::TrajectoryEnvironment>()
            .init_resource::<resources::TrajectoryConfig>()
            .init_resource::<resources::TrajectoryEnvironment>()
            .add_message::<events::ObstacleImpact<Vec3>>()
            .add_message::<events::PathCompleted<Vec3>>()
            .add_message::<events::ObstacleImpact<Vec2>>()
            .add_message::<events::PathCompleted<Vec2>>()
            .add_systems(
                FixedUpdate,
                (
                    systems::playback::advance_path_playback::<Vec3>,
                    systems::playback::advance_path_playback::<Vec2>,
                ),
            );

        // 3D Physics Systems
        #[cfg(feature = "dim3")]
        {
            use avian3d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                (
                    systems::prediction::update_predicted_trajectories_3d
                        .run_if(resource_exists::<SpatialQueryPipeline>),
                    systems::playback::hand_off_linear_velocity_3d
                        .after(systems::playback::advance_path_playback::<Vec3>),
                ),
            );
        }

        // 2D Physics Systems
        #[cfg(feature = "dim2")]
        {
            use avian2d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                (
                    systems::prediction::update_predicted_trajectories_2d
                        .run_if(resource_exists::<SpatialQueryPipeline>),
                    systems::playback::hand_off_linear_velocity_2d
                        .after(systems::playback::advance_path_playback::<Vec2>),
                ),
            );
        }
    }
}

/// Debug plugin for trajectory visualization.
pub struct TrajectoryDebugPlugin;

impl Plugin for TrajectoryDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                systems::debug::draw_predicted_trajectories_3d,
                systems::debug::draw_predicted_trajectories_2d,
            ),
        );
    }
}
