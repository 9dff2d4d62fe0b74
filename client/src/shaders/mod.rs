//! Shader assets used by the client.
//!
//! ## Ice Shader
//! The ice shader (`data/shaders/ice.wgsl`) projects the surface into the
//! reflection and refraction captures, perturbs the lookup with two scrolling
//! normal map samples and blends the captures by a Schlick Fresnel term.
//! Compiling with `USE_FLOWMAP` reads the flow from a texture instead of the
//! uniform direction.

/// Shader asset paths, relative to the asset folder
pub mod paths {
    /// Default ice surface shader (vertex and fragment)
    pub const ICE_SHADER: &str = "shaders/ice.wgsl";
}
