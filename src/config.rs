use std::{
    env, fs,
    path::{Path, PathBuf},
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{color::Color, error::ConfigError};

pub const CONFIG_ENV_VAR: &str = "PORTAL_SCENE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "portal.toml";

/// Start-up configuration. Every section falls back to the stock portal scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub assets: AssetsConfig,
    pub camera: CameraConfig,
    pub fireflies: FirefliesConfig,
    pub portal: PortalConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Portal".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub scene: PathBuf,
    pub baked_texture: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            scene: PathBuf::from("assets/portal.glb"),
            baked_texture: PathBuf::from("assets/baked.jpg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.,
            near: 0.1,
            far: 100.,
            position: [4., 2., 4.],
            target: [0., 0., 0.],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirefliesConfig {
    pub count: usize,
    pub size: f32,
}

impl Default for FirefliesConfig {
    fn default() -> Self {
        Self {
            count: 100,
            size: 80.,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub color_start: Color,
    pub color_end: Color,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            color_start: Color::from_u32(0x23cdca),
            color_end: Color::from_u32(0xffffff),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub clear_color: Color,
    pub pole_light_color: Color,
    pub msaa_samples: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::from_u32(0x1a1f32),
            pole_light_color: Color::from_u32(0xffffe5),
            msaa_samples: 4,
        }
    }
}

impl Config {
    /// Reads `$PORTAL_SCENE_CONFIG`, then `./portal.toml`, then falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            return Self::from_file(DEFAULT_CONFIG_PATH);
        }
        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        info!("Loading config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_stock_scene() {
        let config = Config::default();
        assert_eq!(config.fireflies.count, 100);
        assert_eq!(config.fireflies.size, 80.);
        assert_eq!(config.portal.color_start.to_string(), "#23cdca");
        assert_eq!(config.portal.color_end.to_string(), "#ffffff");
        assert_eq!(config.renderer.clear_color.to_string(), "#1a1f32");
        assert_eq!(config.camera.position, [4., 2., 4.]);
        assert_eq!(config.camera.fov, 45.);
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r##"
            [portal]
            color_start = "#ff0000"

            [fireflies]
            size = 120.0
            "##,
        )
        .unwrap();
        assert_eq!(config.portal.color_start, Color::from_u32(0xff0000));
        assert_eq!(config.portal.color_end, Color::from_u32(0xffffff));
        assert_eq!(config.fireflies.size, 120.);
        assert_eq!(config.fireflies.count, 100);
    }

    #[test]
    fn invalid_color_is_rejected() {
        let result = Config::from_toml_str(
            r#"
            [renderer]
            clear_color = "blue"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = Config::default();
        config.renderer.msaa_samples = 1;
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("#1a1f32"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ntitle = \"Fireflies\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.window.title, "Fireflies");
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
