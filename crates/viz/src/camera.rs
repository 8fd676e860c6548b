//! Camera: the rendered view follows the engine's camera rig.

use bevy::prelude::*;
use journey_core::CameraRig;

use crate::tour::{TourSet, TourState};

/// Far clip plane, wide enough to keep the Sun in view from beyond the planet.
const FAR_PLANE: f32 = 10_000.0;
const NEAR_PLANE: f32 = 0.5;

/// Plugin for the main 3D camera.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(Update, apply_rig_to_camera.in_set(TourSet::Sync));
    }
}

/// Marker component for the main camera.
#[derive(Component)]
pub struct MainCamera;

/// Transform of the rendered camera for the rig's current pose.
pub fn rig_transform(rig: &CameraRig) -> Transform {
    Transform::from_translation(rig.position()).looking_at(rig.look_at(), Vec3::Y)
}

fn perspective(rig: &CameraRig) -> PerspectiveProjection {
    PerspectiveProjection {
        fov: rig.fov_radians(),
        near: NEAR_PLANE,
        far: FAR_PLANE,
        ..default()
    }
}

fn setup_camera(mut commands: Commands, tour: Res<TourState>) {
    let rig = tour.context.camera();
    commands.spawn((
        Camera3dBundle {
            transform: rig_transform(rig),
            projection: Projection::Perspective(perspective(rig)),
            ..default()
        },
        MainCamera,
    ));
}

fn apply_rig_to_camera(
    tour: Res<TourState>,
    mut camera: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
) {
    let rig = tour.context.camera();
    for (mut transform, mut projection) in camera.iter_mut() {
        *transform = rig_transform(rig);
        if let Projection::Perspective(p) = projection.as_mut() {
            if p.fov != rig.fov_radians() {
                p.fov = rig.fov_radians();
            }
        }
    }
}
