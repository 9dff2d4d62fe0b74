//! Ice material: the GPU side of the surface.
//!
//! The material binds the two capture targets, both normal maps and an
//! optional flow map. `ice.wgsl` evaluates the same shading as
//! `shared::ice::shading::shade`.

use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey},
    prelude::*,
    render::{
        mesh::MeshVertexBufferLayoutRef,
        render_resource::{
            AsBindGroup, RenderPipelineDescriptor, ShaderRef, ShaderType,
            SpecializedMeshPipelineError,
        },
    },
};
use shared::ice::ShadingUniforms;

use crate::shaders::paths::ICE_SHADER;

/// Shader define that switches the flow source to the flow map.
pub const FLOW_MAP_DEF: &str = "USE_FLOWMAP";

/// Uniform data for the ice shader (matches WGSL `IceUniform`).
#[derive(Clone, Copy, Debug, ShaderType)]
pub struct IceMaterialUniform {
    /// Linear tint, alpha unused
    pub color: Vec4,
    /// Surface space to capture-target texture space
    pub texture_matrix: Mat4,
    /// (offset_a, offset_b, half_cycle, scale)
    pub config: Vec4,
    pub flow_direction: Vec2,
    pub reflectivity: f32,
    pub refraction_index: f32,
}

impl From<&ShadingUniforms> for IceMaterialUniform {
    fn from(uniforms: &ShadingUniforms) -> Self {
        Self {
            color: uniforms.color.extend(1.0),
            texture_matrix: uniforms.texture_matrix,
            config: uniforms.config(),
            flow_direction: uniforms.flow_direction,
            reflectivity: uniforms.reflectivity,
            refraction_index: uniforms.refraction_index,
        }
    }
}

#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
#[bind_group_data(IceMaterialKey)]
pub struct IceMaterial {
    #[uniform(0)]
    pub uniform: IceMaterialUniform,

    #[texture(1)]
    #[sampler(2)]
    pub reflection_map: Handle<Image>,

    #[texture(3)]
    #[sampler(4)]
    pub refraction_map: Handle<Image>,

    #[texture(5)]
    #[sampler(6)]
    pub normal_map0: Handle<Image>,

    #[texture(7)]
    #[sampler(8)]
    pub normal_map1: Handle<Image>,

    /// Only read when the pipeline is specialized with [`FLOW_MAP_DEF`]
    #[texture(9)]
    #[sampler(10)]
    pub flow_map: Option<Handle<Image>>,

    /// Replaces `ice.wgsl` for both stages
    pub shader: Option<Handle<Shader>>,
}

/// Pipeline key: which flow branch to compile and which shader to use.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IceMaterialKey {
    use_flow_map: bool,
    shader: Option<Handle<Shader>>,
}

impl From<&IceMaterial> for IceMaterialKey {
    fn from(material: &IceMaterial) -> Self {
        Self {
            use_flow_map: material.flow_map.is_some(),
            shader: material.shader.clone(),
        }
    }
}

impl Material for IceMaterial {
    fn vertex_shader() -> ShaderRef {
        ICE_SHADER.into()
    }

    fn fragment_shader() -> ShaderRef {
        ICE_SHADER.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        if let Some(shader) = &key.bind_group_data.shader {
            descriptor.vertex.shader = shader.clone();
        }
        if let Some(fragment) = &mut descriptor.fragment {
            if let Some(shader) = &key.bind_group_data.shader {
                fragment.shader = shader.clone();
            }
            if key.bind_group_data.use_flow_map {
                fragment.shader_defs.push(FLOW_MAP_DEF.into());
            }
        }
        Ok(())
    }
}
