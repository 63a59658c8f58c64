//! Viewer configuration
//!
//! Everything the viewer reads once at startup. Two profiles ship with the
//! binary: [`ViewerConfig::default`] (LDR equirectangular map, background
//! intensity 1) and [`ViewerConfig::hdr_profile`] (Radiance HDR with a
//! ground-projected skybox, background intensity 5).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::tuning::{BACKGROUND_BLURRINESS_RANGE, BACKGROUND_INTENSITY_RANGE, ENV_MAP_INTENSITY_RANGE};
use super::{Config, ConfigError};

/// Top-level viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Default log level; `RUST_LOG` overrides it
    pub log_level: String,

    /// Window settings
    pub window: WindowConfig,

    /// Frame cap; `None` runs as fast as the loop allows
    pub target_fps: Option<u32>,

    /// Initial scene tuning values
    pub scene: SceneConfig,

    /// Where the environment map comes from
    pub environment: EnvironmentSource,

    /// The asynchronously loaded model
    pub model: ModelConfig,

    /// The procedural torus knot
    pub torus_knot: TorusKnotConfig,

    /// Camera settings
    pub camera: CameraConfig,

    /// Orbit controls settings
    pub controls: ControlsConfig,

    /// Asset loader settings
    pub assets: AssetConfig,
}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
}

/// Initial scene tuning values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Background blur, [0, 1]
    pub background_blurriness: f32,
    /// Background brightness multiplier, [0, 10]
    pub background_intensity: f32,
    /// Environment reflection multiplier for standard materials, [0, 10]
    pub environment_map_intensity: f32,
}

/// Environment map source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EnvironmentSource {
    /// LDR equirectangular image (sRGB)
    Equirectangular {
        /// Image path relative to the asset root
        path: String,
    },
    /// Radiance HDR equirectangular image, optionally shown through a
    /// ground-projected skybox instead of the plain background
    Hdr {
        /// Image path relative to the asset root
        path: String,
        /// Skybox settings; `None` uses the map as the background
        skybox: Option<SkyboxConfig>,
    },
    /// OpenEXR equirectangular image
    Exr {
        /// Image path relative to the asset root
        path: String,
    },
    /// Six cube faces in +X, -X, +Y, -Y, +Z, -Z order
    Cube {
        /// Face paths relative to the asset root
        faces: [String; 6],
    },
    /// No environment map
    None,
}

/// Ground-projected skybox settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SkyboxConfig {
    /// Uniform node scale
    pub scale: f32,
    /// Projection sphere radius, [1, 200]
    pub radius: f32,
    /// Camera height above the projected ground, [1, 100]
    pub height: f32,
}

/// Loaded model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// glTF path relative to the asset root; empty disables the model
    pub path: String,
    /// Uniform scale applied to the model root
    pub scale: f32,
}

/// Torus knot geometry and material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TorusKnotConfig {
    /// Knot radius
    pub radius: f32,
    /// Tube radius
    pub tube: f32,
    /// Segments along the knot
    pub tubular_segments: u32,
    /// Segments around the tube
    pub radial_segments: u32,
    /// Winds around the axis of rotational symmetry
    pub p: u32,
    /// Winds around the interior circle
    pub q: u32,
    /// Node position
    pub position: [f32; 3],
    /// Material roughness
    pub roughness: f32,
    /// Material metalness
    pub metalness: f32,
    /// Linear RGB base colour
    pub color: [f32; 3],
}

/// Camera settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Initial position
    pub position: [f32; 3],
}

/// Orbit controls settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Orbit target
    pub target: [f32; 3],
    /// Smooth rotation and dolly over several frames
    pub enable_damping: bool,
    /// Fraction of the remaining motion applied per frame
    pub damping_factor: f32,
}

/// Asset loader settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory every asset path is resolved against
    pub root: PathBuf,
    /// Background loader threads
    pub worker_threads: usize,
    /// Attempts per load for transient I/O failures
    pub max_attempts: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            target_fps: Some(60),
            scene: SceneConfig::default(),
            environment: EnvironmentSource::Equirectangular {
                path: "environmentMaps/coksi.jpg".to_string(),
            },
            model: ModelConfig::default(),
            torus_knot: TorusKnotConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            assets: AssetConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Environment Map Viewer".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background_blurriness: 0.0,
            background_intensity: 1.0,
            environment_map_intensity: 1.0,
        }
    }
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            scale: 50.0,
            radius: 120.0,
            height: 11.0,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/FlightHelmet/glTF/FlightHelmet.gltf".to_string(),
            scale: 10.0,
        }
    }
}

impl Default for TorusKnotConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            tubular_segments: 100,
            radial_segments: 16,
            p: 2,
            q: 3,
            position: [-4.0, 4.0, 0.0],
            roughness: 0.3,
            metalness: 1.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [4.0, 5.0, 4.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target: [0.0, 3.5, 0.0],
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            worker_threads: 2,
            max_attempts: 3,
        }
    }
}

impl Config for ViewerConfig {}

impl ViewerConfig {
    /// Radiance HDR map shown through a ground-projected skybox
    pub fn hdr_profile() -> Self {
        Self {
            scene: SceneConfig {
                background_intensity: 5.0,
                ..SceneConfig::default()
            },
            environment: EnvironmentSource::Hdr {
                path: "environmentMaps/2/2k.hdr".to_string(),
                skybox: Some(SkyboxConfig::default()),
            },
            ..Self::default()
        }
    }

    /// Look up a built-in profile by name
    pub fn profile(name: &str) -> Option<Self> {
        match name {
            "ldr" => Some(Self::default()),
            "hdr" => Some(Self::hdr_profile()),
            _ => None,
        }
    }

    /// Resolve an asset path against the configured root
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.assets.root.join(relative.trim_start_matches('/'))
    }

    /// Check every value against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("scene.background_blurriness", self.scene.background_blurriness, BACKGROUND_BLURRINESS_RANGE)?;
        check_range("scene.background_intensity", self.scene.background_intensity, BACKGROUND_INTENSITY_RANGE)?;
        check_range(
            "scene.environment_map_intensity",
            self.scene.environment_map_intensity,
            ENV_MAP_INTENSITY_RANGE,
        )?;

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".to_string()));
        }

        let camera = &self.camera;
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::Invalid(format!("camera.fov {} outside (0, 180)", camera.fov)));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far (near {}, far {})",
                camera.near, camera.far
            )));
        }

        if !(0.0..=1.0).contains(&self.controls.damping_factor) {
            return Err(ConfigError::Invalid(format!(
                "controls.damping_factor {} outside [0, 1]",
                self.controls.damping_factor
            )));
        }

        let knot = &self.torus_knot;
        if knot.tubular_segments < 3 || knot.radial_segments < 3 {
            return Err(ConfigError::Invalid("torus knot needs at least 3 segments each way".to_string()));
        }
        if knot.p == 0 || knot.q == 0 {
            return Err(ConfigError::Invalid("torus knot p and q must be non-zero".to_string()));
        }

        if let EnvironmentSource::Hdr { skybox: Some(skybox), .. } = &self.environment {
            check_range("skybox.radius", skybox.radius, (1.0, 200.0))?;
            check_range("skybox.height", skybox.height, (1.0, 100.0))?;
        }

        if self.assets.worker_threads == 0 {
            return Err(ConfigError::Invalid("assets.worker_threads must be at least 1".to_string()));
        }
        if self.assets.max_attempts == 0 {
            return Err(ConfigError::Invalid("assets.max_attempts must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Load from `path`, or fall back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config = Self::load_from_file(path)?;
            config.validate()?;
            Ok(config)
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

fn check_range(name: &str, value: f32, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} {value} outside [{min}, {max}]")))
    }
}
