//! Ice surfaces in the Bevy world.
//!
//! An ice surface is a mesh entity carrying an [`IceSurface`] and an
//! [`IceMaterial`]. Every frame, after transforms are propagated:
//!
//! ```text
//!   IceViewer camera ──► drive_ice_surfaces ──► IceMaterial uniform
//!                              │
//!                              ▼
//!                      CaptureRig poses ──► apply_capture_poses ──► capture cameras
//! ```
//!
//! Capture cameras render before the main camera (negative order), so the
//! material samples this frame's captures.

use bevy::{
    ecs::system::SystemParam,
    image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor},
    prelude::*,
    render::{
        camera::CameraProjection, renderer::RenderDevice, view::RenderLayers,
        view::VisibilitySystems,
    },
};
use shared::ice::{
    CameraView, CaptureKind, EffectConfiguration, FrameInput, IceError, IceOptions, Renderable,
    Surface, SurfaceVisibility,
};
use shared::{DEFAULT_NORMAL_MAP_PATH, SURFACE_NAME};

use super::capture::{
    capture_target, spawn_capture_camera, CaptureCamera, CaptureRig, ICE_SURFACE_LAYER,
};
use super::ice_material::{IceMaterial, IceMaterialUniform};

pub struct IcePlugin;

impl Plugin for IcePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<IceMaterial>::default())
            .init_resource::<IceSettings>()
            .register_type::<IceSettings>()
            .add_systems(
                PostUpdate,
                (drive_ice_surfaces, apply_capture_poses)
                    .chain()
                    .after(TransformSystem::TransformPropagate)
                    .before(VisibilitySystems::UpdateFrusta),
            );
    }
}

/// Global controls for every ice surface.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct IceSettings {
    /// Freezes the flow animation; captures keep updating
    pub paused: bool,
    /// Multiplier on the frame delta fed to the flow cycle
    pub time_scale: f32,
}

impl Default for IceSettings {
    fn default() -> Self {
        Self {
            paused: false,
            time_scale: 1.0,
        }
    }
}

/// The camera ice surfaces are drawn for. Exactly one is expected.
#[derive(Component, Debug, Default)]
pub struct IceViewer;

pub type IceSurfaceState = Surface<CaptureRig, CaptureRig, Handle<Image>>;

#[derive(Component)]
pub struct IceSurface(pub IceSurfaceState);

/// Hides a surface entity and restores its previous visibility afterwards.
pub struct VisibilityGuard<'a> {
    visibility: &'a mut Visibility,
    previous: Visibility,
}

impl<'a> VisibilityGuard<'a> {
    pub fn new(visibility: &'a mut Visibility) -> Self {
        let previous = *visibility;
        Self {
            visibility,
            previous,
        }
    }
}

impl SurfaceVisibility for VisibilityGuard<'_> {
    fn set_visible(&mut self, visible: bool) {
        let next = if visible {
            self.previous
        } else {
            Visibility::Hidden
        };
        if *self.visibility != next {
            *self.visibility = next;
        }
    }
}

/// Builds ice surfaces: validates options, allocates both capture targets and
/// cameras, loads textures and spawns the surface entity.
#[derive(SystemParam)]
pub struct IceSurfaceSpawner<'w, 's> {
    commands: Commands<'w, 's>,
    images: ResMut<'w, Assets<Image>>,
    materials: ResMut<'w, Assets<IceMaterial>>,
    asset_server: Res<'w, AssetServer>,
    render_device: Option<Res<'w, RenderDevice>>,
}

impl IceSurfaceSpawner<'_, '_> {
    /// `projection` should match the [`IceViewer`] camera.
    pub fn spawn(
        &mut self,
        mesh: Handle<Mesh>,
        transform: Transform,
        projection: &Projection,
        options: IceOptions<String>,
    ) -> Result<Entity, IceError> {
        let config = EffectConfiguration::from_options(options)?;
        let settings = config.capture_settings();

        if let Some(device) = &self.render_device {
            let max = device.limits().max_texture_dimension_2d;
            if settings.width > max || settings.height > max {
                return Err(IceError::invalid(format!(
                    "capture size {}x{} exceeds the device limit of {max}",
                    settings.width, settings.height
                )));
            }
        }

        // Without a render device there is nothing to capture into
        let rigs = self.render_device.is_some().then(|| {
            [CaptureKind::Reflection, CaptureKind::Refraction].map(|kind| {
                let target = self.images.add(capture_target(&settings));
                let camera =
                    spawn_capture_camera(&mut self.commands, kind, target.clone(), projection.clone());
                CaptureRig::new(kind, camera, target, settings.clip_bias)
            })
        });
        let (reflector, refractor) = match rigs {
            Some([reflector, refractor]) => (Some(reflector), Some(refractor)),
            None => (None, None),
        };

        let asset_server = self.asset_server.clone();
        let config = config.map_textures(|path| load_linear_repeating(&asset_server, path));
        let surface = Surface::new(config, reflector, refractor)?;

        let config = surface.config();
        let [normal_map0, normal_map1] = config.normal_maps().clone().map(|map| {
            map.unwrap_or_else(|| load_linear_repeating(&asset_server, DEFAULT_NORMAL_MAP_PATH))
        });
        let material = self.materials.add(IceMaterial {
            uniform: IceMaterialUniform::from(surface.uniforms()),
            reflection_map: surface.reflection_target(),
            refraction_map: surface.refraction_target(),
            normal_map0,
            normal_map1,
            flow_map: config.flow().flow_map().cloned(),
            shader: config.shader().map(|path| asset_server.load(path.to_owned())),
        });

        info!(
            "Spawning ice surface ({}x{} captures, flow map: {})",
            settings.width,
            settings.height,
            config.flow().uses_flow_map()
        );

        let entity = self
            .commands
            .spawn((
                Name::new(SURFACE_NAME),
                Mesh3d(mesh),
                MeshMaterial3d(material),
                transform,
                RenderLayers::layer(ICE_SURFACE_LAYER),
                IceSurface(surface),
            ))
            .id();
        Ok(entity)
    }
}

fn load_linear_repeating(asset_server: &AssetServer, path: impl Into<String>) -> Handle<Image> {
    asset_server.load_with_settings(path.into(), |settings: &mut ImageLoaderSettings| {
        settings.is_srgb = false;
        settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            address_mode_u: ImageAddressMode::Repeat,
            address_mode_v: ImageAddressMode::Repeat,
            ..ImageSamplerDescriptor::linear()
        });
    })
}

/// Runs the per-frame sequence of every ice surface and uploads the result.
pub fn drive_ice_surfaces(
    time: Res<Time>,
    settings: Res<IceSettings>,
    viewer: Query<(&GlobalTransform, &Projection), With<IceViewer>>,
    mut surfaces: Query<(
        &mut IceSurface,
        &GlobalTransform,
        &MeshMaterial3d<IceMaterial>,
        &mut Visibility,
    )>,
    mut materials: ResMut<Assets<IceMaterial>>,
) {
    let Ok((camera_transform, projection)) = viewer.single() else {
        return;
    };
    let delta_seconds = if settings.paused {
        0.0
    } else {
        time.delta_secs() * settings.time_scale
    };

    for (mut surface, surface_transform, material, mut visibility) in &mut surfaces {
        // Match the projection the capture cameras get for their target size
        let (width, height) = surface.0.config().texture_size();
        let mut capture_projection = projection.clone();
        capture_projection.update(width as f32, height as f32);
        let camera = CameraView::new(
            capture_projection.get_clip_from_view(),
            camera_transform.compute_matrix(),
        );

        // Hide and restore leave the value unchanged, so skip change detection
        let mut guard = VisibilityGuard::new(visibility.bypass_change_detection());
        let report = surface.0.before_frame(FrameInput {
            camera: &camera,
            surface_world: surface_transform.compute_matrix(),
            delta_seconds,
            visibility: &mut guard,
        });
        if !report.is_clean() {
            debug!("Ice surface frame had {} failed captures", report.failures.len());
        }

        if let Some(material) = materials.get_mut(&material.0) {
            material.uniform = IceMaterialUniform::from(surface.0.uniforms());
        }
    }
}

/// Moves capture cameras to the poses computed this frame.
///
/// A capture that failed this frame has its camera deactivated, so its target
/// keeps the previous contents. Runs after transform propagation, so the
/// global transform is written too.
pub fn apply_capture_poses(
    surfaces: Query<&IceSurface>,
    viewer: Query<Ref<Projection>, (With<IceViewer>, Without<CaptureCamera>)>,
    mut cameras: Query<
        (&mut Camera, &mut Transform, &mut GlobalTransform, &mut Projection),
        With<CaptureCamera>,
    >,
) {
    let viewer_projection = viewer.single().ok().filter(|projection| projection.is_changed());

    for surface in &surfaces {
        for rig in [surface.0.reflector(), surface.0.refractor()] {
            let Ok((mut camera, mut transform, mut global, mut projection)) =
                cameras.get_mut(rig.camera())
            else {
                continue;
            };
            let active = rig.pose().is_some();
            if camera.is_active != active {
                camera.is_active = active;
            }
            if let Some(pose) = rig.pose() {
                *transform = pose;
                *global = GlobalTransform::from(pose);
            }
            if let Some(viewer_projection) = &viewer_projection {
                *projection = Projection::clone(viewer_projection);
            }
        }
    }
}
