//! Ice effect configuration.
//!
//! [`IceOptions`] is the user-facing, serializable option set where every
//! field may be omitted. [`EffectConfiguration`] is the validated, immutable
//! bundle a surface owns for its whole life.

use bevy::color::{LinearRgba, Srgba};
use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::IceError;
use crate::constants::*;

/// Color encoding of the capture render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorEncoding {
    #[default]
    Linear,
    Srgb,
}

/// Where the per-pixel scroll direction of the normal maps comes from.
///
/// Chosen once at configuration time; the shader compiles exactly one branch.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowMode<T> {
    ConstantDirection(Vec2),
    /// Red/green channels encode the direction, remapped from [0, 1] to [-1, 1].
    FlowMapTexture(T),
}

impl<T> FlowMode<T> {
    pub fn uses_flow_map(&self) -> bool {
        matches!(self, FlowMode::FlowMapTexture(_))
    }

    pub fn direction(&self) -> Option<Vec2> {
        match self {
            FlowMode::ConstantDirection(direction) => Some(*direction),
            FlowMode::FlowMapTexture(_) => None,
        }
    }

    pub fn flow_map(&self) -> Option<&T> {
        match self {
            FlowMode::ConstantDirection(_) => None,
            FlowMode::FlowMapTexture(texture) => Some(texture),
        }
    }

    pub fn map<U>(self, load: impl FnOnce(T) -> U) -> FlowMode<U> {
        match self {
            FlowMode::ConstantDirection(direction) => FlowMode::ConstantDirection(direction),
            FlowMode::FlowMapTexture(texture) => FlowMode::FlowMapTexture(load(texture)),
        }
    }
}

impl<T> Default for FlowMode<T> {
    fn default() -> Self {
        FlowMode::ConstantDirection(Vec2::X)
    }
}

/// Construction options for an ice surface.
///
/// `T` is the host's texture reference: asset paths when read from a RON file,
/// image handles once loaded. Unknown fields in option files are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IceOptions<T> {
    /// Tint as sRGB bytes
    pub color: Option<[u8; 3]>,
    pub texture_width: Option<u32>,
    pub texture_height: Option<u32>,
    /// Offset of the mirror plane along the surface normal, see
    /// [`CaptureSettings::clip_bias`]
    pub clip_bias: Option<f32>,
    pub flow_direction: Option<Vec2>,
    pub reflectivity: Option<f32>,
    pub refraction_index: Option<f32>,
    pub scale: Option<f32>,
    /// Replacement shader for both vertex and fragment stages
    pub shader: Option<String>,
    pub encoding: Option<ColorEncoding>,
    pub flow_map: Option<T>,
    pub normal_map0: Option<T>,
    pub normal_map1: Option<T>,
}

impl<T> Default for IceOptions<T> {
    fn default() -> Self {
        Self {
            color: None,
            texture_width: None,
            texture_height: None,
            clip_bias: None,
            flow_direction: None,
            reflectivity: None,
            refraction_index: None,
            scale: None,
            shader: None,
            encoding: None,
            flow_map: None,
            normal_map0: None,
            normal_map1: None,
        }
    }
}

impl<T> IceOptions<T> {
    /// Converts every texture reference, e.g. paths into loaded handles.
    pub fn map_textures<U>(self, mut load: impl FnMut(T) -> U) -> IceOptions<U> {
        IceOptions {
            color: self.color,
            texture_width: self.texture_width,
            texture_height: self.texture_height,
            clip_bias: self.clip_bias,
            flow_direction: self.flow_direction,
            reflectivity: self.reflectivity,
            refraction_index: self.refraction_index,
            scale: self.scale,
            shader: self.shader,
            encoding: self.encoding,
            flow_map: self.flow_map.map(&mut load),
            normal_map0: self.normal_map0.map(&mut load),
            normal_map1: self.normal_map1.map(&mut load),
        }
    }
}

/// Render target settings handed to both capture collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    /// Moves the mirror plane itself along the surface normal; there is no
    /// separate clip plane. Reflected geometry therefore shifts by
    /// `2 * clip_bias`, and small values (around 0.003) are enough to hide
    /// seams at the waterline.
    pub clip_bias: f32,
    pub encoding: ColorEncoding,
}

/// Validated, immutable ice parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfiguration<T> {
    color: Vec3,
    reflectivity: f32,
    refraction_index: f32,
    texture_width: u32,
    texture_height: u32,
    clip_bias: f32,
    scale: f32,
    encoding: ColorEncoding,
    flow: FlowMode<T>,
    normal_maps: [Option<T>; 2],
    shader: Option<String>,
}

impl<T> EffectConfiguration<T> {
    pub fn from_options(options: IceOptions<T>) -> Result<Self, IceError> {
        let texture_width = options.texture_width.unwrap_or(DEFAULT_TEXTURE_SIZE);
        let texture_height = options.texture_height.unwrap_or(DEFAULT_TEXTURE_SIZE);
        if texture_width == 0 || texture_height == 0 {
            return Err(IceError::invalid(format!(
                "texture size must be positive, got {texture_width}x{texture_height}"
            )));
        }

        let reflectivity = options.reflectivity.unwrap_or(DEFAULT_REFLECTIVITY);
        if !(0.0..=1.0).contains(&reflectivity) {
            return Err(IceError::invalid(format!(
                "reflectivity must be within [0, 1], got {reflectivity}"
            )));
        }

        let refraction_index = options
            .refraction_index
            .unwrap_or(DEFAULT_REFRACTION_INDEX);
        let scale = options.scale.unwrap_or(DEFAULT_SCALE);
        let clip_bias = options.clip_bias.unwrap_or(DEFAULT_CLIP_BIAS);
        for (name, value) in [
            ("refraction_index", refraction_index),
            ("scale", scale),
            ("clip_bias", clip_bias),
        ] {
            if !value.is_finite() {
                return Err(IceError::invalid(format!("{name} must be finite")));
            }
        }

        let flow = match (options.flow_map, options.flow_direction) {
            (Some(flow_map), direction) => {
                if direction.is_some() {
                    log::debug!("Flow map supplied, ignoring the constant flow direction");
                }
                FlowMode::FlowMapTexture(flow_map)
            }
            (None, Some(direction)) => {
                if !direction.is_finite() || direction.length_squared() == 0.0 {
                    return Err(IceError::invalid(format!(
                        "flow direction must be a finite non-zero vector, got {direction}"
                    )));
                }
                FlowMode::ConstantDirection(direction)
            }
            (None, None) => FlowMode::default(),
        };

        let [r, g, b] = options.color.unwrap_or(DEFAULT_ICE_COLOR);
        let linear = LinearRgba::from(Srgba::rgb_u8(r, g, b));

        Ok(Self {
            color: Vec3::new(linear.red, linear.green, linear.blue),
            reflectivity,
            refraction_index,
            texture_width,
            texture_height,
            clip_bias,
            scale,
            encoding: options.encoding.unwrap_or_default(),
            flow,
            normal_maps: [options.normal_map0, options.normal_map1],
            shader: options.shader,
        })
    }

    /// Linear RGB tint.
    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn reflectivity(&self) -> f32 {
        self.reflectivity
    }

    pub fn refraction_index(&self) -> f32 {
        self.refraction_index
    }

    pub fn texture_size(&self) -> (u32, u32) {
        (self.texture_width, self.texture_height)
    }

    pub fn clip_bias(&self) -> f32 {
        self.clip_bias
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn encoding(&self) -> ColorEncoding {
        self.encoding
    }

    pub fn flow(&self) -> &FlowMode<T> {
        &self.flow
    }

    /// Explicit normal maps; `None` entries fall back to
    /// [`DEFAULT_NORMAL_MAP_PATH`].
    pub fn normal_maps(&self) -> &[Option<T>; 2] {
        &self.normal_maps
    }

    pub fn shader(&self) -> Option<&str> {
        self.shader.as_deref()
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            width: self.texture_width,
            height: self.texture_height,
            clip_bias: self.clip_bias,
            encoding: self.encoding,
        }
    }

    /// Converts the texture references of an already validated configuration.
    pub fn map_textures<U>(self, mut load: impl FnMut(T) -> U) -> EffectConfiguration<U> {
        let [normal_map0, normal_map1] = self.normal_maps;
        EffectConfiguration {
            color: self.color,
            reflectivity: self.reflectivity,
            refraction_index: self.refraction_index,
            texture_width: self.texture_width,
            texture_height: self.texture_height,
            clip_bias: self.clip_bias,
            scale: self.scale,
            encoding: self.encoding,
            flow: self.flow.map(&mut load),
            normal_maps: [normal_map0.map(&mut load), normal_map1.map(&mut load)],
            shader: self.shader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> EffectConfiguration<String> {
        EffectConfiguration::from_options(IceOptions::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = default_config();
        assert_eq!(config.reflectivity(), 0.02);
        assert_eq!(config.refraction_index(), 0.06);
        assert_eq!(config.scale(), 1.0);
        assert_eq!(config.texture_size(), (512, 512));
        assert_eq!(config.encoding(), ColorEncoding::Linear);
        assert_eq!(config.flow(), &FlowMode::ConstantDirection(Vec2::new(1.0, 0.0)));
        assert!(config.normal_maps().iter().all(Option::is_none));
    }

    #[test]
    fn test_default_tint_is_pale_cyan() {
        let color = default_config().color();
        assert!(color.z > color.y && color.y > color.x, "got {color}");
        assert!(color.x > 0.5, "tint should be pale, got {color}");
    }

    #[test]
    fn test_flow_map_takes_precedence() {
        let options = IceOptions {
            flow_map: Some("flow.png".to_string()),
            flow_direction: Some(Vec2::new(0.0, 1.0)),
            ..Default::default()
        };
        let config = EffectConfiguration::from_options(options).unwrap();
        assert!(config.flow().uses_flow_map());
        assert_eq!(config.flow().flow_map().map(String::as_str), Some("flow.png"));
        assert_eq!(config.flow().direction(), None);
    }

    #[test]
    fn test_zero_reflectivity_is_kept() {
        let options = IceOptions::<String> {
            reflectivity: Some(0.0),
            ..Default::default()
        };
        let config = EffectConfiguration::from_options(options).unwrap();
        assert_eq!(config.reflectivity(), 0.0);
    }

    #[test]
    fn test_zero_texture_size_rejected() {
        let options = IceOptions::<String> {
            texture_height: Some(0),
            ..Default::default()
        };
        let err = EffectConfiguration::from_options(options).unwrap_err();
        assert!(matches!(err, IceError::InvalidConfiguration(_)), "got {err:?}");
    }

    #[test]
    fn test_zero_flow_direction_rejected() {
        let options = IceOptions::<String> {
            flow_direction: Some(Vec2::ZERO),
            ..Default::default()
        };
        assert!(EffectConfiguration::from_options(options).is_err());
    }

    #[test]
    fn test_out_of_range_reflectivity_rejected() {
        let options = IceOptions::<String> {
            reflectivity: Some(1.5),
            ..Default::default()
        };
        assert!(EffectConfiguration::from_options(options).is_err());
    }

    #[test]
    fn test_map_textures_keeps_scalars() {
        let options = IceOptions {
            scale: Some(4.0),
            normal_map0: Some("a.png".to_string()),
            ..Default::default()
        };
        let mapped = options.map_textures(|path| path.len());
        assert_eq!(mapped.scale, Some(4.0));
        assert_eq!(mapped.normal_map0, Some(5));
        assert_eq!(mapped.normal_map1, None);
    }

    #[test]
    fn test_options_from_ron_ignore_unknown_fields() {
        let source = r#"(
            texture_width: Some(256),
            reflectivity: Some(0.1),
            flow_map: Some("textures/ice/flow.png"),
            foam_amount: 3.0,
        )"#;
        let options: IceOptions<String> = ron::de::from_str(source).unwrap();
        assert_eq!(options.texture_width, Some(256));
        assert_eq!(options.texture_height, None);
        let config = EffectConfiguration::from_options(options).unwrap();
        assert_eq!(config.texture_size(), (256, 512));
        assert!(config.flow().uses_flow_map());
    }

    #[test]
    fn test_validated_config_maps_flow_and_normal_maps() {
        let config = EffectConfiguration::from_options(IceOptions {
            flow_map: Some("flow.png".to_string()),
            normal_map1: Some("n1.png".to_string()),
            reflectivity: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        let mapped = config.map_textures(|path| path.len());
        assert_eq!(mapped.flow().flow_map(), Some(&8));
        assert_eq!(mapped.normal_maps(), &[None, Some(6)]);
        assert_eq!(mapped.reflectivity(), 0.5);
    }
}
