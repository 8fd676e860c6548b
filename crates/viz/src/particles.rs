//! Solar wind particles: one small glowing sphere per simulated particle.

use bevy::prelude::*;

use crate::tour::{TourSet, TourState};

pub struct ParticlePlugin;

impl Plugin for ParticlePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_particles)
            .add_systems(Update, sync_particles.in_set(TourSet::Sync));
    }
}

/// Index into the engine's particle field.
#[derive(Component, Debug, Clone, Copy)]
pub struct ParticleDot(pub usize);

/// Colour of a particle at full glow.
const PARTICLE_COLOR: LinearRgba = LinearRgba::rgb(1.0, 0.82, 0.45);

fn spawn_particles(
    mut commands: Commands,
    tour: Res<TourState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let field = tour.context.particles();
    let mesh = meshes.add(Sphere::new(1.0).mesh().uv(6, 4));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 0.85, 0.5, 0.8),
        emissive: PARTICLE_COLOR,
        alpha_mode: AlphaMode::Add,
        unlit: true,
        ..default()
    });

    let dots: Vec<_> = field
        .instances()
        .iter()
        .enumerate()
        .map(|(index, instance)| {
            (
                PbrBundle {
                    mesh: mesh.clone(),
                    material: material.clone(),
                    transform: Transform::from_translation(instance.translation)
                        .with_scale(Vec3::splat(instance.scale)),
                    ..default()
                },
                ParticleDot(index),
            )
        })
        .collect();

    tracing::info!("Spawning {} particle dots", dots.len());
    commands.spawn_batch(dots);
}

fn sync_particles(
    tour: Res<TourState>,
    mut dots: Query<(&ParticleDot, &mut Transform, &mut Visibility)>,
) {
    let field = tour.context.particles();
    let visible = tour.context.view().particles;
    let instances = field.instances();

    for (dot, mut transform, mut visibility) in dots.iter_mut() {
        let wanted = if visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *visibility != wanted {
            *visibility = wanted;
        }
        if !visible {
            continue;
        }

        if let Some(instance) = instances.get(dot.0) {
            transform.translation = instance.translation;
            transform.scale = Vec3::splat(instance.scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::{LaunchOptions, TourPlugin};

    #[test]
    fn test_particle_dots_follow_the_field() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .insert_resource(LaunchOptions {
                auto_play: true,
                ..Default::default()
            })
            .add_event::<AppExit>()
            .add_plugins((TourPlugin, ParticlePlugin));

        app.update();
        app.update();

        let expected = app.world().resource::<TourState>().context.particles().len();
        let world = app.world_mut();
        let mut query = world.query::<(&ParticleDot, &Transform)>();
        let dots: Vec<_> = query.iter(world).map(|(d, t)| (d.0, t.translation)).collect();
        assert_eq!(dots.len(), expected);

        let tour = world.resource::<TourState>();
        let instances = tour.context.particles().instances();
        for (index, translation) in dots {
            assert_eq!(translation, instances[index].translation);
        }
    }
}
