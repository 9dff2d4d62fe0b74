//! Render-to-texture captures backing an ice surface.
//!
//! Each capture is a secondary camera that renders into an image before the
//! main camera. The reflection camera is mirrored across the surface plane,
//! the refraction camera follows the viewer unchanged. Capture cameras only
//! see [`SCENE_LAYER`]; the ice mesh lives on [`ICE_SURFACE_LAYER`], so it
//! never shows up in its own captures.

use bevy::{
    asset::RenderAssetUsages,
    prelude::*,
    render::{
        camera::RenderTarget,
        render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages},
        view::RenderLayers,
    },
};
use shared::ice::config::CaptureSettings;
use shared::ice::{CameraView, CaptureKind, ColorEncoding, IceError, RenderToTexture};

pub const SCENE_LAYER: usize = 0;
pub const ICE_SURFACE_LAYER: usize = 1;

/// Marker for cameras owned by an ice surface.
#[derive(Component, Debug)]
pub struct CaptureCamera {
    pub kind: CaptureKind,
}

/// One capture as seen by the surface coordinator.
///
/// `on_before_render` computes the capture camera pose; the pose is written
/// to the camera entity by `apply_capture_poses` in the same frame.
#[derive(Debug, Clone)]
pub struct CaptureRig {
    kind: CaptureKind,
    camera: Entity,
    target: Handle<Image>,
    clip_bias: f32,
    surface_world: Mat4,
    pose: Option<Transform>,
}

impl CaptureRig {
    pub fn new(kind: CaptureKind, camera: Entity, target: Handle<Image>, clip_bias: f32) -> Self {
        Self {
            kind,
            camera,
            target,
            clip_bias,
            surface_world: Mat4::IDENTITY,
            pose: None,
        }
    }

    pub fn camera(&self) -> Entity {
        self.camera
    }

    /// Pose computed this frame, if the last capture succeeded.
    pub fn pose(&self) -> Option<Transform> {
        self.pose
    }
}

impl RenderToTexture for CaptureRig {
    type Target = Handle<Image>;

    fn render_target(&self) -> Handle<Image> {
        self.target.clone()
    }

    fn set_world_transform(&mut self, world_from_local: Mat4) {
        self.surface_world = world_from_local;
    }

    fn on_before_render(&mut self, camera: &CameraView) -> Result<(), IceError> {
        self.pose = None;
        if !camera.is_finite() {
            return Err(IceError::render_step(self.kind, "camera transform is not finite"));
        }
        let pose = match self.kind {
            CaptureKind::Refraction => Transform::from_matrix(camera.world_from_view),
            CaptureKind::Reflection => {
                mirrored_pose(camera, self.surface_world, self.clip_bias).ok_or_else(|| {
                    IceError::render_step(self.kind, "surface plane is degenerate")
                })?
            }
        };
        self.pose = Some(pose);
        Ok(())
    }
}

/// Mirrors the camera across the surface plane (local +Y is the normal).
///
/// The up vector is mirrored too, which leaves the capture horizontally
/// flipped compared to a true mirror image; the shader undoes it by sampling
/// at `1 - u`.
pub fn mirrored_pose(camera: &CameraView, surface_world: Mat4, clip_bias: f32) -> Option<Transform> {
    let normal = surface_world.y_axis.truncate().try_normalize()?;
    let origin = surface_world.w_axis.truncate() + normal * clip_bias;

    let reflect_point = |p: Vec3| p - 2.0 * (p - origin).dot(normal) * normal;
    let reflect_dir = |d: Vec3| d - 2.0 * d.dot(normal) * normal;

    let position = reflect_point(camera.position());
    let forward = reflect_dir(camera.forward()).try_normalize()?;
    let up = reflect_dir(camera.up()).try_normalize()?;
    if forward.cross(up).length_squared() < 1e-8 {
        return None;
    }
    Some(Transform::from_translation(position).looking_to(forward, up))
}

/// Allocates the color target a capture camera renders into.
pub fn capture_target(settings: &CaptureSettings) -> Image {
    let size = Extent3d {
        width: settings.width,
        height: settings.height,
        depth_or_array_layers: 1,
    };
    let format = match settings.encoding {
        ColorEncoding::Linear => TextureFormat::Rgba8Unorm,
        ColorEncoding::Srgb => TextureFormat::Rgba8UnormSrgb,
    };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[0, 0, 0, 255],
        format,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::RENDER_ATTACHMENT;
    image
}

/// Spawns a capture camera rendering into `target` before the main pass.
pub fn spawn_capture_camera(
    commands: &mut Commands,
    kind: CaptureKind,
    target: Handle<Image>,
    projection: Projection,
) -> Entity {
    let order = match kind {
        CaptureKind::Reflection => -2,
        CaptureKind::Refraction => -1,
    };
    commands
        .spawn((
            Name::new(format!("ice {kind} capture")),
            Camera3d::default(),
            Camera {
                target: RenderTarget::Image(target.into()),
                order,
                ..default()
            },
            projection,
            Transform::default(),
            RenderLayers::layer(SCENE_LAYER),
            CaptureCamera { kind },
        ))
        .id()
}
