use bevy::prelude::*;
use ron::de::from_str;
use serde::{Deserialize, Serialize};
use shared::ice::IceOptions;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "../data/ice.ron";

/// Demo scene settings, read from a RON file.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub ice: IceOptions<String>,
    /// Side length of the square ice plane
    pub surface_size: f32,
    pub orbit_radius: f32,
    pub orbit_height: f32,
    /// Radians per second
    pub orbit_speed: f32,
    /// Number of props scattered around the surface
    pub props: u32,
    /// Multiplier on elapsed time fed to the flow cycle; below 1 slows it down
    pub flow_speed: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            ice: IceOptions::default(),
            surface_size: 20.0,
            orbit_radius: 18.0,
            orbit_height: 7.0,
            orbit_speed: 0.15,
            props: 24,
            flow_speed: 1.0,
        }
    }
}

/// Reads the demo config, falling back to defaults when the file is absent.
pub fn load_demo_config(path: &Path) -> Result<DemoConfig, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!("Config file not found: {}. Using defaults.", path.display());
        return Ok(DemoConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: DemoConfig = from_str(&contents)?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_demo_config(Path::new("does/not/exist.ron")).unwrap();
        assert_eq!(config.props, 24);
        assert_eq!(config.flow_speed, 1.0);
        assert!(config.ice.reflectivity.is_none());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let source = r#"(
            orbit_speed: 0.5,
            flow_speed: 0.25,
            ice: (
                reflectivity: Some(0.3),
                normal_map0: Some("textures/ice/ice_normal.png"),
            ),
        )"#;
        let config: DemoConfig = from_str(source).unwrap();
        assert_eq!(config.orbit_speed, 0.5);
        assert_eq!(config.flow_speed, 0.25);
        assert_eq!(config.surface_size, 20.0);
        assert_eq!(config.ice.reflectivity, Some(0.3));
        assert_eq!(
            config.ice.normal_map0.as_deref(),
            Some("textures/ice/ice_normal.png")
        );
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = load_demo_config(&path).unwrap();
        assert!(config.ice.texture_width.is_some());
    }
}
