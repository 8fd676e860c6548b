//! Scene rendering: bodies, lights and aurora ribbons.
//!
//! Meshes are built from the same seeded catalog the engine registered, so
//! catalog order lines up with the engine's scene bodies.

use bevy::prelude::*;
use journey_core::scene::{
    default_catalog, BodyKind, BodySpec, CME_MAJOR_RADIUS, CME_MINOR_RADIUS, EARTH_POSITION,
    EARTH_RADIUS, MAGNETOSPHERE_RADIUS, MARS_RADIUS, SUN_RADIUS,
};
use journey_core::{InteractableId, VisualState};

use crate::tour::{TourSet, TourState};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
            .insert_resource(AmbientLight {
                color: Color::srgb(0.6, 0.7, 1.0),
                brightness: 120.0,
            })
            .add_systems(Startup, (spawn_bodies, spawn_lights, spawn_aurora))
            .add_systems(
                Update,
                (sync_bodies, sync_aurora).chain().in_set(TourSet::Sync),
            );
    }
}

/// Links a root entity to its engine interactable.
#[derive(Component, Debug, Clone, Copy)]
pub struct BodyMarker {
    pub id: InteractableId,
    pub kind: BodyKind,
}

/// Material whose emissive follows the hover state.
#[derive(Component, Clone)]
pub struct BodyMaterial(pub Handle<StandardMaterial>);

/// Per-frame self rotation, radians per 60 Hz frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct Spin(pub f32);

#[derive(Component)]
pub struct AuroraRibbon;

#[derive(Component)]
pub struct AuroraLight;

const AURORA_LIGHT_INTENSITY: f32 = 2.0e7;

/// Linear emissive colour for a visual state.
pub fn emissive_color(visual: &VisualState) -> LinearRgba {
    let [r, g, b] = visual.emissive;
    let i = visual.emissive_intensity;
    LinearRgba::rgb(r * i, g * i, b * i)
}

fn body_material(body: &BodySpec) -> StandardMaterial {
    let emissive = emissive_color(&body.visual);
    match body.kind {
        BodyKind::Sun => StandardMaterial {
            base_color: Color::srgb(1.0, 0.6, 0.1),
            emissive,
            ..default()
        },
        BodyKind::Earth => StandardMaterial {
            base_color: Color::srgb(0.15, 0.35, 0.8),
            emissive,
            perceptual_roughness: 0.8,
            ..default()
        },
        BodyKind::Mars => StandardMaterial {
            base_color: Color::srgb(0.75, 0.3, 0.15),
            emissive,
            perceptual_roughness: 0.9,
            ..default()
        },
        BodyKind::CmeShock => StandardMaterial {
            base_color: Color::srgba(1.0, 0.69, 0.0, 0.55),
            emissive,
            alpha_mode: AlphaMode::Blend,
            ..default()
        },
        BodyKind::DebrisField => StandardMaterial {
            base_color: Color::srgb(0.45, 0.42, 0.4),
            emissive,
            perceptual_roughness: 1.0,
            ..default()
        },
        BodyKind::Magnetosphere => StandardMaterial {
            base_color: Color::srgba(0.0, 0.7, 1.0, 0.12),
            emissive,
            alpha_mode: AlphaMode::Blend,
            double_sided: true,
            cull_mode: None,
            ..default()
        },
        BodyKind::Satellite(class) => StandardMaterial {
            base_color: Color::srgb_u8(
                (class.color() >> 16) as u8,
                (class.color() >> 8) as u8,
                class.color() as u8,
            ),
            emissive,
            metallic: 0.6,
            ..default()
        },
    }
}

fn spawn_bodies(
    mut commands: Commands,
    tour: Res<TourState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let catalog = default_catalog(tour.context.config().particles.seed);
    let rock = meshes.add(Cuboid::new(1.6, 1.6, 1.6));

    for (spec, body) in catalog.iter().zip(tour.context.bodies()) {
        let material = materials.add(body_material(spec));
        let marker = BodyMarker {
            id: body.id,
            kind: body.kind,
        };
        let transform = Transform::from_translation(spec.position);

        let mesh = match spec.kind {
            BodyKind::Sun => Some(meshes.add(Sphere::new(SUN_RADIUS).mesh().uv(48, 24))),
            BodyKind::Earth => Some(meshes.add(Sphere::new(EARTH_RADIUS).mesh().uv(48, 24))),
            BodyKind::Mars => Some(meshes.add(Sphere::new(MARS_RADIUS).mesh().uv(32, 16))),
            BodyKind::Magnetosphere => {
                Some(meshes.add(Sphere::new(MAGNETOSPHERE_RADIUS).mesh().uv(32, 16)))
            }
            BodyKind::CmeShock => Some(meshes.add(Torus {
                minor_radius: CME_MINOR_RADIUS,
                major_radius: CME_MAJOR_RADIUS,
            })),
            BodyKind::DebrisField | BodyKind::Satellite(_) => None,
        };

        let mut root = match mesh {
            Some(mesh) => commands.spawn(PbrBundle {
                mesh,
                material: material.clone(),
                transform,
                ..default()
            }),
            None => commands.spawn(SpatialBundle::from_transform(transform)),
        };
        root.insert((marker, BodyMaterial(material.clone())));

        match spec.kind {
            BodyKind::DebrisField => {
                root.with_children(|parent| {
                    for part in &spec.parts {
                        parent.spawn(PbrBundle {
                            mesh: rock.clone(),
                            material: material.clone(),
                            transform: Transform::from_translation(part.offset)
                                .with_scale(Vec3::splat(part.scale)),
                            ..default()
                        });
                    }
                });
            }
            BodyKind::Satellite(class) => {
                let size = class.size();
                let hull = meshes.add(Cuboid::new(size, size, size * 1.5));
                let panel = meshes.add(Cuboid::new(size * 1.5, size * 0.1, size));
                let antenna = meshes.add(Cylinder::new(size * 0.1, size * 0.8));
                root.insert(Spin(spec.orbit.map(|o| o.spin_speed).unwrap_or(0.0)));
                root.with_children(|parent| {
                    for (index, part) in spec.parts.iter().enumerate() {
                        let mesh = match index {
                            0 => hull.clone(),
                            1 | 2 => panel.clone(),
                            _ => antenna.clone(),
                        };
                        parent.spawn(PbrBundle {
                            mesh,
                            material: material.clone(),
                            transform: Transform::from_translation(part.offset),
                            ..default()
                        });
                    }
                });
            }
            _ => {}
        }
    }

    tracing::info!("Spawned {} scene bodies", catalog.len());
}

fn spawn_lights(mut commands: Commands) {
    commands.spawn(PointLightBundle {
        point_light: PointLight {
            color: Color::srgb(1.0, 0.9, 0.75),
            intensity: 4.0e9,
            range: 6000.0,
            shadows_enabled: false,
            ..default()
        },
        transform: Transform::from_translation(Vec3::ZERO),
        ..default()
    });

    commands.spawn((
        PointLightBundle {
            point_light: PointLight {
                color: Color::srgb(0.3, 1.0, 0.6),
                intensity: 0.0,
                range: 600.0,
                ..default()
            },
            transform: Transform::from_translation(EARTH_POSITION + Vec3::new(0.0, 60.0, 0.0)),
            ..default()
        },
        AuroraLight,
    ));
}

fn spawn_aurora(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Two rings over the poles, tilted slightly
    for (pole, tilt) in [(1.0f32, 0.15f32), (-1.0, -0.15)] {
        let material = materials.add(StandardMaterial {
            base_color: Color::srgba(0.2, 1.0, 0.6, 0.0),
            emissive: LinearRgba::rgb(0.2, 1.6, 0.8),
            alpha_mode: AlphaMode::Add,
            unlit: true,
            ..default()
        });
        let mesh = meshes.add(Torus {
            minor_radius: 1.6,
            major_radius: EARTH_RADIUS * 0.55,
        });
        commands.spawn((
            PbrBundle {
                mesh,
                material,
                transform: Transform::from_translation(
                    EARTH_POSITION + Vec3::new(0.0, pole * EARTH_RADIUS * 0.85, 0.0),
                )
                .with_rotation(Quat::from_rotation_x(tilt)),
                visibility: Visibility::Hidden,
                ..default()
            },
            AuroraRibbon,
        ));
    }
}

fn sync_bodies(
    tour: Res<TourState>,
    time: Res<Time>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut bodies: Query<(
        &BodyMarker,
        &BodyMaterial,
        &mut Transform,
        &mut Visibility,
        Option<&Spin>,
    )>,
) {
    let frames = time.delta_seconds() * 60.0;
    for (marker, material, mut transform, mut visibility, spin) in bodies.iter_mut() {
        let Some(record) = tour.context.picker().get(marker.id) else {
            continue;
        };

        *visibility = if record.visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };

        transform.translation = record.world_position;
        transform.scale = Vec3::splat(record.visual.scale);
        if let Some(Spin(speed)) = spin {
            transform.rotate_y(speed * frames);
        }

        if let Some(mat) = materials.get_mut(&material.0) {
            let emissive = emissive_color(&record.visual);
            if mat.emissive != emissive {
                mat.emissive = emissive;
            }
        }
    }
}

fn sync_aurora(
    tour: Res<TourState>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ribbons: Query<(&Handle<StandardMaterial>, &mut Visibility), With<AuroraRibbon>>,
    mut lights: Query<&mut PointLight, With<AuroraLight>>,
) {
    let toggles = tour.context.scene_toggles();

    for (handle, mut visibility) in ribbons.iter_mut() {
        *visibility = if toggles.aurora_opacity > 0.0 {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if let Some(mat) = materials.get_mut(handle) {
            mat.base_color = Color::srgba(0.2, 1.0, 0.6, toggles.aurora_opacity);
        }
    }

    for mut light in lights.iter_mut() {
        light.intensity = if toggles.aurora_light {
            AURORA_LIGHT_INTENSITY
        } else {
            0.0
        };
    }
}
