//! Ice surface effect: reflection/refraction compositing over flow-animated
//! normal maps.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              SurfaceRenderCoordinator (per frame)            │
//! │  1. projection matrix   2. flow cycle   3. sync transforms   │
//! │  4. hide surface  5. reflection, refraction  6. show surface │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ ShadingUniforms
//!           ┌───────────────┴───────────────┐
//!           ▼                               ▼
//!   ┌───────────────┐               ┌───────────────┐
//!   │ CPU reference │               │  GPU Shader   │
//!   │ (shading.rs)  │               │  (ice.wgsl)   │
//!   └───────────────┘               └───────────────┘
//! ```
//!
//! The render-to-texture captures themselves are provided by the host through
//! the [`RenderToTexture`] trait.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod flow_cycle;
pub mod projection;
pub mod shading;

pub use config::{ColorEncoding, EffectConfiguration, FlowMode, IceOptions};
pub use coordinator::{
    CaptureKind, FrameInput, FrameReport, RenderToTexture, Renderable, Surface,
    SurfaceRenderCoordinator, SurfaceVisibility,
};
pub use error::IceError;
pub use flow_cycle::FlowCycleState;
pub use projection::{CameraView, ProjectionMatrixBuilder};
pub use shading::{PixelInput, ShadingTextures, ShadingUniforms, TextureSampler};
