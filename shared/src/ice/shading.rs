//! Per-pixel flow shading.
//!
//! CPU reference of the fragment stage in `ice.wgsl`. Every function here is
//! pure: the cycle offsets and texture matrix arrive through
//! [`ShadingUniforms`], textures through [`ShadingTextures`].

use bevy::math::{Mat4, Vec2, Vec3, Vec4};

use super::flow_cycle::flow_blend_weight;
use super::projection::project;
use super::{EffectConfiguration, FlowCycleState, FlowMode};

/// Something that can be sampled at a texture coordinate.
pub trait TextureSampler {
    fn sample(&self, uv: Vec2) -> Vec4;
}

impl<F> TextureSampler for F
where
    F: Fn(Vec2) -> Vec4,
{
    fn sample(&self, uv: Vec2) -> Vec4 {
        self(uv)
    }
}

/// A texture with the same color everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidTexture(pub Vec4);

impl TextureSampler for SolidTexture {
    fn sample(&self, _uv: Vec2) -> Vec4 {
        self.0
    }
}

/// Normal-map color of an undisturbed, upward-facing surface.
pub const FLAT_NORMAL_COLOR: Vec4 = Vec4::new(0.5, 0.5, 1.0, 1.0);

/// Values published by the coordinator once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingUniforms {
    /// Linear RGB tint
    pub color: Vec3,
    pub reflectivity: f32,
    pub refraction_index: f32,
    pub texture_matrix: Mat4,
    pub offset_a: f32,
    pub offset_b: f32,
    pub half_cycle: f32,
    pub scale: f32,
    /// Unused when the surface samples a flow map
    pub flow_direction: Vec2,
}

impl ShadingUniforms {
    pub fn new<T>(config: &EffectConfiguration<T>, cycle: &FlowCycleState) -> Self {
        let mut uniforms = Self {
            color: config.color(),
            reflectivity: config.reflectivity(),
            refraction_index: config.refraction_index(),
            texture_matrix: Mat4::IDENTITY,
            offset_a: 0.0,
            offset_b: 0.0,
            half_cycle: 0.0,
            scale: config.scale(),
            flow_direction: config.flow().direction().unwrap_or(Vec2::ZERO),
        };
        uniforms.set_cycle(cycle);
        uniforms
    }

    pub fn set_cycle(&mut self, cycle: &FlowCycleState) {
        self.offset_a = cycle.offset_a();
        self.offset_b = cycle.offset_b();
        self.half_cycle = cycle.half_cycle();
    }

    /// `(offset_a, offset_b, half_cycle, scale)`, the packed shader layout.
    pub fn config(&self) -> Vec4 {
        Vec4::new(self.offset_a, self.offset_b, self.half_cycle, self.scale)
    }
}

/// Flow source resolved for one draw.
#[derive(Clone, Copy)]
pub enum FlowSource<'a> {
    Constant(Vec2),
    Map(&'a dyn TextureSampler),
}

impl<'a> FlowSource<'a> {
    /// Resolves a configured flow mode, given a way to turn its texture into a
    /// sampler.
    pub fn from_mode<T>(
        mode: &FlowMode<T>,
        sampler: impl FnOnce(&T) -> &'a dyn TextureSampler,
    ) -> Self {
        match mode {
            FlowMode::ConstantDirection(direction) => FlowSource::Constant(*direction),
            FlowMode::FlowMapTexture(texture) => FlowSource::Map(sampler(texture)),
        }
    }
}

pub struct ShadingTextures<'a> {
    pub reflection: &'a dyn TextureSampler,
    pub refraction: &'a dyn TextureSampler,
    pub normal_map0: &'a dyn TextureSampler,
    pub normal_map1: &'a dyn TextureSampler,
    pub flow: FlowSource<'a>,
}

/// Interpolated vertex outputs reaching one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelInput {
    /// Projective coordinate, not yet divided by `w`
    pub coord: Vec4,
    pub uv: Vec2,
    /// Unnormalized vector from the surface point to the eye
    pub to_eye: Vec3,
}

impl PixelInput {
    /// Vertex stage: what the shader hands the fragment stage for one vertex.
    pub fn from_vertex(
        texture_matrix: Mat4,
        surface_world: Mat4,
        local_position: Vec3,
        uv: Vec2,
        camera_position: Vec3,
    ) -> Self {
        let world_position = surface_world.transform_point3(local_position);
        Self {
            coord: project(texture_matrix, local_position),
            uv,
            to_eye: camera_position - world_position,
        }
    }
}

/// Flow direction at `uv`, with x negated as the normal maps expect.
pub fn flow_vector(flow: &FlowSource<'_>, uv: Vec2) -> Vec2 {
    let flow = match flow {
        FlowSource::Constant(direction) => *direction,
        FlowSource::Map(map) => {
            let texel = map.sample(uv);
            Vec2::new(texel.x, texel.y) * 2.0 - Vec2::ONE
        }
    };
    Vec2::new(-flow.x, flow.y)
}

/// Samples both normal maps along the flow and cross-fades them.
pub fn blended_normal_color(
    uniforms: &ShadingUniforms,
    textures: &ShadingTextures<'_>,
    uv: Vec2,
) -> Vec4 {
    let flow = flow_vector(&textures.flow, uv);
    let base = uv * uniforms.scale;
    let color0 = textures.normal_map0.sample(base + flow * uniforms.offset_a);
    let color1 = textures.normal_map1.sample(base + flow * uniforms.offset_b);
    let weight = flow_blend_weight(uniforms.offset_a, uniforms.half_cycle);
    color0.lerp(color1, weight)
}

/// Red is x, blue is the up axis (kept in [0, 1]), green is z.
pub fn decode_normal(color: Vec4) -> Vec3 {
    let normal = Vec3::new(color.x * 2.0 - 1.0, color.z, color.y * 2.0 - 1.0).normalize_or_zero();
    if normal == Vec3::ZERO {
        Vec3::Y
    } else {
        normal
    }
}

/// Schlick-style reflectance. `view_dir` and `normal` are unit vectors.
pub fn fresnel(view_dir: Vec3, normal: Vec3, reflectivity: f32) -> f32 {
    let theta = view_dir.dot(normal).max(0.0);
    reflectivity + (1.0 - reflectivity) * (1.0 - theta).powi(5)
}

/// Perspective-divides the projective coordinate and shifts it by the normal,
/// scaled with depth.
pub fn perturbed_uv(coord: Vec4, normal: Vec3, refraction_index: f32) -> Vec2 {
    let coord = coord.truncate() / coord.w;
    Vec2::new(coord.x, coord.y) + coord.z * Vec2::new(normal.x, normal.z) * refraction_index
}

/// Final surface color for one pixel.
pub fn shade(input: &PixelInput, uniforms: &ShadingUniforms, textures: &ShadingTextures<'_>) -> Vec4 {
    let to_eye = input.to_eye.normalize_or_zero();
    let normal = decode_normal(blended_normal_color(uniforms, textures, input.uv));
    let reflectance = fresnel(to_eye, normal, uniforms.reflectivity);

    let uv = perturbed_uv(input.coord, normal, uniforms.refraction_index);
    // Reflection captures are horizontally mirrored
    let reflect_color = textures.reflection.sample(Vec2::new(1.0 - uv.x, uv.y));
    let refract_color = textures.refraction.sample(uv);

    uniforms.color.extend(1.0) * refract_color.lerp(reflect_color, reflectance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ice::IceOptions;

    const EPSILON: f32 = 1e-5;

    fn uniforms() -> ShadingUniforms {
        let config = EffectConfiguration::<()>::from_options(IceOptions::default()).unwrap();
        ShadingUniforms::new(&config, &FlowCycleState::default())
    }

    fn flat() -> SolidTexture {
        SolidTexture(FLAT_NORMAL_COLOR)
    }

    #[test]
    fn test_flat_normal_decodes_up() {
        assert_eq!(decode_normal(FLAT_NORMAL_COLOR), Vec3::Y);
    }

    #[test]
    fn test_decode_normal_channel_layout() {
        let tilted = decode_normal(Vec4::new(1.0, 0.5, 0.0, 1.0));
        assert!(tilted.abs_diff_eq(Vec3::X, EPSILON), "got {tilted}");
        let forward = decode_normal(Vec4::new(0.5, 1.0, 0.0, 1.0));
        assert!(forward.abs_diff_eq(Vec3::Z, EPSILON), "got {forward}");
    }

    #[test]
    fn test_degenerate_normal_falls_back_up() {
        assert_eq!(decode_normal(Vec4::new(0.5, 0.5, 0.0, 1.0)), Vec3::Y);
    }

    #[test]
    fn test_fresnel_head_on_equals_reflectivity() {
        assert_eq!(fresnel(Vec3::Y, Vec3::Y, 0.02), 0.02);
    }

    #[test]
    fn test_fresnel_grazing_is_one() {
        assert!((fresnel(Vec3::X, Vec3::Y, 0.02) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_fresnel_monotonic_with_angle() {
        let mut previous = fresnel(Vec3::Y, Vec3::Y, 0.02);
        for step in 1..=90 {
            let angle = (step as f32).to_radians();
            let view = Vec3::new(angle.sin(), angle.cos(), 0.0);
            let value = fresnel(view, Vec3::Y, 0.02);
            assert!(value >= previous, "fresnel dropped at {step} degrees");
            previous = value;
        }
    }

    #[test]
    fn test_fresnel_back_facing_clamped() {
        assert!((fresnel(Vec3::NEG_Y, Vec3::Y, 0.3) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_constant_flow_negates_x() {
        let flow = flow_vector(&FlowSource::Constant(Vec2::new(1.0, 0.5)), Vec2::ZERO);
        assert_eq!(flow, Vec2::new(-1.0, 0.5));
    }

    #[test]
    fn test_flow_map_remaps_channels() {
        let map = SolidTexture(Vec4::new(1.0, 0.25, 0.0, 1.0));
        let flow = flow_vector(&FlowSource::Map(&map), Vec2::ZERO);
        assert!(flow.abs_diff_eq(Vec2::new(-1.0, -0.5), EPSILON), "got {flow}");
    }

    #[test]
    fn test_flow_source_from_mode() {
        let map = SolidTexture(Vec4::ONE);
        let constant: FlowMode<u32> = FlowMode::ConstantDirection(Vec2::Y);
        assert!(matches!(
            FlowSource::from_mode(&constant, |_| &map as &dyn TextureSampler),
            FlowSource::Constant(direction) if direction == Vec2::Y
        ));
        let textured = FlowMode::FlowMapTexture(7u32);
        assert!(matches!(
            FlowSource::from_mode(&textured, |_| &map as &dyn TextureSampler),
            FlowSource::Map(_)
        ));
    }

    #[test]
    fn test_blend_uses_sample_b_at_cycle_start() {
        let uniforms = uniforms();
        let map0 = SolidTexture(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let map1 = SolidTexture(Vec4::new(0.0, 1.0, 0.0, 1.0));
        let textures = ShadingTextures {
            reflection: &flat(),
            refraction: &flat(),
            normal_map0: &map0,
            normal_map1: &map1,
            flow: FlowSource::Constant(Vec2::X),
        };
        // offset_a == 0 gives weight 1
        let color = blended_normal_color(&uniforms, &textures, Vec2::ZERO);
        assert_eq!(color, map1.0);
    }

    #[test]
    fn test_blended_normal_continuous_across_wraps() {
        // A normal map that varies smoothly along u
        let ripples = |uv: Vec2| {
            Vec4::new(0.5 + 0.4 * (uv.x * 9.0).sin(), 0.5 + 0.4 * (uv.y * 7.0).cos(), 1.0, 1.0)
        };
        let textures = ShadingTextures {
            reflection: &flat(),
            refraction: &flat(),
            normal_map0: &ripples,
            normal_map1: &ripples,
            flow: FlowSource::Constant(Vec2::new(1.0, 0.3)),
        };
        let mut cycle = FlowCycleState::default();
        let mut uniforms = uniforms();
        let delta = 1.0 / 2400.0;
        let uv = Vec2::new(0.3, 0.7);
        let mut previous = decode_normal(blended_normal_color(&uniforms, &textures, uv));

        // Long enough to cross several wraps of both offsets
        for _ in 0..1600 {
            cycle.advance(delta);
            uniforms.set_cycle(&cycle);
            let normal = decode_normal(blended_normal_color(&uniforms, &textures, uv));
            assert!(
                normal.distance(previous) < 0.05,
                "normal jumped from {previous} to {normal} at offset {}",
                cycle.offset_a()
            );
            previous = normal;
        }
    }

    #[test]
    fn test_perturbed_uv_divides_then_offsets() {
        let coord = Vec4::new(1.0, 2.0, 1.0, 2.0);
        let uv = perturbed_uv(coord, Vec3::new(1.0, 0.0, -1.0), 0.1);
        assert!(uv.abs_diff_eq(Vec2::new(0.55, 0.95), EPSILON), "got {uv}");
        let still = perturbed_uv(coord, Vec3::Y, 0.1);
        assert!(still.abs_diff_eq(Vec2::new(0.5, 1.0), EPSILON), "got {still}");
    }

    #[test]
    fn test_reflection_is_sampled_mirrored() {
        let mut uniforms = uniforms();
        uniforms.reflectivity = 1.0;
        uniforms.color = Vec3::ONE;
        let reflection = |uv: Vec2| Vec4::new(uv.x, uv.y, 0.0, 1.0);
        let textures = ShadingTextures {
            reflection: &reflection,
            refraction: &SolidTexture(Vec4::ZERO),
            normal_map0: &flat(),
            normal_map1: &flat(),
            flow: FlowSource::Constant(Vec2::X),
        };
        let input = PixelInput {
            coord: Vec4::new(0.2, 0.6, 0.0, 1.0),
            uv: Vec2::ZERO,
            to_eye: Vec3::Y,
        };
        let color = shade(&input, &uniforms, &textures);
        assert!((color.x - 0.8).abs() < EPSILON, "got {color}");
        assert!((color.y - 0.6).abs() < EPSILON, "got {color}");
    }

    #[test]
    fn test_tint_multiplies_and_alpha_comes_from_blend() {
        let mut uniforms = uniforms();
        uniforms.color = Vec3::new(0.5, 1.0, 0.25);
        uniforms.reflectivity = 0.0;
        let textures = ShadingTextures {
            reflection: &SolidTexture(Vec4::ZERO),
            refraction: &SolidTexture(Vec4::new(1.0, 1.0, 1.0, 0.8)),
            normal_map0: &flat(),
            normal_map1: &flat(),
            flow: FlowSource::Constant(Vec2::X),
        };
        let input = PixelInput {
            coord: Vec4::new(0.5, 0.5, 0.5, 1.0),
            uv: Vec2::splat(0.5),
            to_eye: Vec3::Y * 3.0,
        };
        let color = shade(&input, &uniforms, &textures);
        assert_eq!(color, Vec4::new(0.5, 1.0, 0.25, 0.8));
    }
}
