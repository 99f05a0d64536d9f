//! # Application Configuration
//!
//! Typed configuration for every subsystem, grouped under
//! [`ApplicationConfig`]. All structs are serde types with defaults, so a
//! configuration file only needs the fields it changes. Loading and saving go
//! through the [`Config`] trait (TOML or RON by file extension).
//!
//! ## Configuration Categories
//!
//! - **Engine**: logging and frame loop behavior
//! - **Window**: output size
//! - **Camera**: initial eye position and projection
//! - **Input**: camera step sizes and limits
//! - **Post**: bloom and clear color
//! - **Assets**: where scene files and assets live

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// # Engine Configuration
///
/// Core engine behavior: logging and the frame loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Stop after this many frames (headless runs)
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_frames: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Stop after `frames` frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(invalid("log level cannot be empty"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Output surface size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl WindowConfig {
    /// Width over height
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Initial camera placement and projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Eye position
    pub eye: [f32; 3],
    /// Point the camera looks at
    pub look: [f32; 3],
    /// Up direction
    pub up: [f32; 3],
}

impl CameraConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(invalid(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(invalid(format!(
                "clip planes must satisfy 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        if self.eye == self.look {
            return Err(invalid("camera eye and look target coincide"));
        }
        if self.up == [0.0; 3] {
            return Err(invalid("camera up vector is zero"));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            eye: [0.0, 2.0, -5.0],
            look: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// Camera input step sizes and clamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Radians per rotate step
    pub rotation_step: f32,
    /// Rotation is clamped to `[-max_rotation, max_rotation]`
    pub max_rotation: f32,
    /// Distance per zoom step
    pub zoom_step: f32,
    /// Lowest zoom offset
    pub min_zoom: f32,
    /// Highest zoom offset
    pub max_zoom: f32,
}

impl InputConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_step <= 0.0 || self.zoom_step <= 0.0 {
            return Err(invalid("input step sizes must be positive"));
        }
        if self.max_rotation < 0.0 {
            return Err(invalid("maximum rotation cannot be negative"));
        }
        if self.min_zoom > self.max_zoom {
            return Err(invalid(format!(
                "zoom range is empty: [{}, {}]",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rotation_step: std::f32::consts::PI / 128.0,
            max_rotation: 2.0 * std::f32::consts::PI,
            zoom_step: 0.1,
            min_zoom: -6.0,
            max_zoom: 1.0,
        }
    }
}

/// Bloom and final composite settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// Blur passes per frame
    pub blur_passes: u32,
    /// Clear color for the scene and final passes
    pub clear_color: [f32; 4],
}

impl PostConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(invalid(format!(
                "clear color components must be in [0, 1], got {:?}",
                self.clear_color
            )));
        }
        Ok(())
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            blur_passes: crate::render::post::DEFAULT_BLUR_PASSES,
            clear_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// # Asset Configuration
///
/// Where the scene description and the assets it names live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for assets; scene paths resolve against it
    pub assets_dir: PathBuf,
    /// Scene description file, relative to `assets_dir`
    pub scene_file: PathBuf,
}

impl AssetConfig {
    /// Set assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Full path of the scene description
    pub fn scene_path(&self) -> PathBuf {
        self.assets_dir.join(&self.scene_file)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            scene_file: PathBuf::from("scene.ron"),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Output surface
    pub window: WindowConfig,
    /// Initial camera
    pub camera: CameraConfig,
    /// Camera input
    pub input: InputConfig,
    /// Post-processing
    pub post: PostConfig,
    /// Asset locations
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.window.validate()?;
        self.camera.validate()?;
        self.input.validate()?;
        self.post.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
