//! Projective texture mapping from surface space into capture-target space.

use bevy::math::{Mat4, Vec3, Vec4};

/// Maps clip space `[-1, 1]` onto texture space `[0, 1]` on every axis.
pub const TEXTURE_BIAS: Mat4 = Mat4::from_cols_array(&[
    0.5, 0.0, 0.0, 0.0, //
    0.0, 0.5, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.5, 0.5, 0.5, 1.0,
]);

/// The parts of a camera the effect needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub clip_from_view: Mat4,
    pub world_from_view: Mat4,
}

impl CameraView {
    pub fn new(clip_from_view: Mat4, world_from_view: Mat4) -> Self {
        Self {
            clip_from_view,
            world_from_view,
        }
    }

    pub fn view_from_world(&self) -> Mat4 {
        self.world_from_view.inverse()
    }

    pub fn position(&self) -> Vec3 {
        self.world_from_view.w_axis.truncate()
    }

    /// Viewing direction (the camera looks down its local -Z).
    pub fn forward(&self) -> Vec3 {
        -self.world_from_view.z_axis.truncate().normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.world_from_view.y_axis.truncate().normalize_or_zero()
    }

    pub fn is_finite(&self) -> bool {
        self.clip_from_view.is_finite() && self.world_from_view.is_finite()
    }
}

/// Builds the per-frame texture matrix.
///
/// Nothing is cached: the matrix must be rebuilt every frame from the same
/// camera state used for the main draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionMatrixBuilder {
    bias: Mat4,
}

impl Default for ProjectionMatrixBuilder {
    fn default() -> Self {
        Self { bias: TEXTURE_BIAS }
    }
}

impl ProjectionMatrixBuilder {
    /// `bias * clip_from_view * view_from_world * world_from_surface`
    pub fn build(&self, camera: &CameraView, surface_world: Mat4) -> Mat4 {
        self.bias * camera.clip_from_view * camera.view_from_world() * surface_world
    }
}

/// Applies a texture matrix to a surface-local point, keeping `w` for the
/// per-pixel perspective division.
pub fn project(texture_matrix: Mat4, local_position: Vec3) -> Vec4 {
    texture_matrix * local_position.extend(1.0)
}

/// Projects and divides by `w`.
pub fn project_point(texture_matrix: Mat4, local_position: Vec3) -> Vec3 {
    let coord = project(texture_matrix, local_position);
    coord.truncate() / coord.w
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Quat;

    const EPSILON: f32 = 1e-4;

    fn camera_at(eye: Vec3, target: Vec3) -> CameraView {
        let world_from_view = Mat4::look_at_rh(eye, target, Vec3::Y).inverse();
        let clip_from_view = Mat4::perspective_rh_gl(50f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        CameraView::new(clip_from_view, world_from_view)
    }

    #[test]
    fn test_bias_maps_clip_corners() {
        let low = TEXTURE_BIAS.transform_point3(Vec3::splat(-1.0));
        let high = TEXTURE_BIAS.transform_point3(Vec3::splat(1.0));
        assert!(low.abs_diff_eq(Vec3::ZERO, EPSILON), "got {low}");
        assert!(high.abs_diff_eq(Vec3::ONE, EPSILON), "got {high}");
    }

    #[test]
    fn test_focal_point_projects_to_center() {
        let cameras = [
            camera_at(Vec3::new(0.0, 5.0, 8.0), Vec3::ZERO),
            camera_at(Vec3::new(-3.0, 2.0, -4.0), Vec3::new(1.0, 0.0, 2.0)),
            camera_at(Vec3::new(10.0, 0.5, 0.0), Vec3::new(0.0, 0.2, 0.0)),
        ];
        let surfaces = [
            Mat4::IDENTITY,
            Mat4::from_scale_rotation_translation(
                Vec3::new(4.0, 1.0, 4.0),
                Quat::from_rotation_y(0.7),
                Vec3::new(2.0, -1.0, 0.5),
            ),
            Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        ];
        let builder = ProjectionMatrixBuilder::default();

        for camera in &cameras {
            for surface in &surfaces {
                for distance in [0.5, 3.0, 20.0] {
                    let focal_world = camera.position() + camera.forward() * distance;
                    let focal_local = surface.inverse().transform_point3(focal_world);
                    let matrix = builder.build(camera, *surface);
                    let projected = project_point(matrix, focal_local);
                    assert!(
                        (projected.x - 0.5).abs() < EPSILON && (projected.y - 0.5).abs() < EPSILON,
                        "focal point at distance {distance} projected to {projected}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_right_of_view_maps_right_of_center() {
        let camera = camera_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let matrix = ProjectionMatrixBuilder::default().build(&camera, Mat4::IDENTITY);
        let right = project_point(matrix, Vec3::new(1.0, 0.0, 0.0));
        let up = project_point(matrix, Vec3::new(0.0, 1.0, 0.0));
        assert!(right.x > 0.5, "got {right}");
        assert!(up.y > 0.5, "got {up}");
    }

    #[test]
    fn test_surface_transform_is_applied() {
        let camera = camera_at(Vec3::new(0.0, 4.0, 4.0), Vec3::ZERO);
        let offset = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let builder = ProjectionMatrixBuilder::default();
        let moved = project_point(builder.build(&camera, offset), Vec3::ZERO);
        let direct = project_point(builder.build(&camera, Mat4::IDENTITY), Vec3::X);
        assert!(moved.abs_diff_eq(direct, EPSILON), "{moved} != {direct}");
    }

    #[test]
    fn test_camera_view_accessors() {
        let camera = camera_at(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 3.0, -1.0));
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), EPSILON));
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.up().abs_diff_eq(Vec3::Y, EPSILON));
        assert!(camera.is_finite());
    }
}
