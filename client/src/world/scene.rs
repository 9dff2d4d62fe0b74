//! Demo scene: a frozen pond surrounded by props, viewed by an orbiting camera.

use bevy::{prelude::*, render::view::RenderLayers};
use rand::Rng;

use crate::config::DemoConfig;
use crate::world::rendering::{IceSettings, IceSurfaceSpawner, IceViewer, ICE_SURFACE_LAYER, SCENE_LAYER};

#[derive(Component)]
pub struct OrbitCamera {
    pub angle: f32,
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<DemoConfig>,
    mut spawner: IceSurfaceSpawner,
) {
    let ground_size = config.surface_size * 4.0;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(ground_size, ground_size))),
        MeshMaterial3d(materials.add(Color::srgb(0.35, 0.3, 0.25))),
        Transform::from_xyz(0.0, -1.5, 0.0),
    ));

    let mut rng = rand::thread_rng();
    let prop_mesh = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    for _ in 0..config.props {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = rng.gen_range(config.surface_size * 0.6..config.surface_size * 1.4);
        let height = rng.gen_range(1.0..6.0);
        let material = materials.add(Color::hsl(rng.gen_range(0.0..360.0), 0.5, 0.5));
        commands.spawn((
            Mesh3d(prop_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_xyz(angle.cos() * distance, height / 2.0 - 1.5, angle.sin() * distance)
                .with_scale(Vec3::new(1.5, height, 1.5)),
        ));
    }

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let projection = Projection::default();
    commands.spawn((
        Camera3d::default(),
        projection.clone(),
        Transform::from_xyz(config.orbit_radius, config.orbit_height, 0.0).looking_at(Vec3::ZERO, Vec3::Y),
        RenderLayers::from_layers(&[SCENE_LAYER, ICE_SURFACE_LAYER]),
        IceViewer,
        OrbitCamera { angle: 0.0 },
    ));

    let surface_mesh = meshes.add(Plane3d::default().mesh().size(config.surface_size, config.surface_size));
    if let Err(err) = spawner.spawn(
        surface_mesh,
        Transform::IDENTITY,
        &projection,
        config.ice.clone(),
    ) {
        error!("Could not create the ice surface: {err}");
    }
}

pub fn orbit_camera(
    time: Res<Time>,
    config: Res<DemoConfig>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    for (mut orbit, mut transform) in &mut cameras {
        orbit.angle += config.orbit_speed * time.delta_secs();
        let position = Vec3::new(
            orbit.angle.cos() * config.orbit_radius,
            config.orbit_height,
            orbit.angle.sin() * config.orbit_radius,
        );
        *transform = Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y);
    }
}

pub fn toggle_pause(keyboard_input: Res<ButtonInput<KeyCode>>, mut settings: ResMut<IceSettings>) {
    if keyboard_input.just_pressed(KeyCode::KeyP) {
        settings.paused = !settings.paused;
        info!("Ice flow {}", if settings.paused { "paused" } else { "resumed" });
    }
}
