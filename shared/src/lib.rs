//! Core of the icefloe surface effect: flow animation, projective texture
//! mapping, the per-frame capture sequence and a CPU reference of the
//! per-pixel shading that the GPU shader mirrors.

pub mod constants;
pub mod ice;

pub use constants::*;
