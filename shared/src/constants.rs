/// Length of one full flow-map phase, in seconds of elapsed time.
pub const FLOW_CYCLE: f32 = 0.15;
pub const FLOW_HALF_CYCLE: f32 = FLOW_CYCLE * 0.5;

pub const DEFAULT_TEXTURE_SIZE: u32 = 512;
pub const DEFAULT_REFLECTIVITY: f32 = 0.02;
/// Artistic distortion strength, not a physical index of refraction.
pub const DEFAULT_REFRACTION_INDEX: f32 = 0.06;
pub const DEFAULT_SCALE: f32 = 1.0;
pub const DEFAULT_CLIP_BIAS: f32 = 0.0;
/// Pale cyan tint, sRGB bytes (`#c9eefb`).
pub const DEFAULT_ICE_COLOR: [u8; 3] = [0xc9, 0xee, 0xfb];

pub const DEFAULT_NORMAL_MAP_PATH: &str = "textures/ice/ice_normal.png";

pub const SURFACE_NAME: &str = "ice";
pub const REFLECTOR_NAME: &str = "reflector";
pub const REFRACTOR_NAME: &str = "refractor";
