//! Viewer configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) gives
//! the stock viewer:
//!
//! ```
//! # use dicom_dualview::config::ViewerConfig;
//! let config: ViewerConfig = toml::from_str("playback_fps = 20").unwrap();
//! assert_eq!(config.playback_fps, 20);
//! assert_eq!(config.default_window.center(), 40.0);
//! ```

use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

use crate::{
    canvas::Size, enums::Plane, metadata::MetadataExtractor, window_level::WindowLevel,
};

pub const DEFAULT_PLAYBACK_FPS: u32 = 10;
/// Highest rate with a non-zero millisecond period.
pub const MAX_PLAYBACK_FPS: u32 = 1000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
/// Soft-tissue window used when an image carries no window of its own.
pub const DEFAULT_WINDOW_CENTER: f64 = 40.0;
pub const DEFAULT_WINDOW_WIDTH: f64 = 400.0;
/// Placeholder dimensions for images that do not report rows/columns.
pub const DEFAULT_IMAGE_DIMENSION: u32 = 512;
pub const DEFAULT_VIEWPORT_SIZE: u32 = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrosshairStyle {
    pub color: [u8; 4],
    pub line_width: u32,
    pub dash: u32,
    pub gap: u32,
}

impl Default for CrosshairStyle {
    fn default() -> Self {
        Self {
            color: [0, 255, 0, 255],
            line_width: 2,
            dash: 5,
            gap: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub playback_fps: u32,
    pub playback_plane: Plane,
    pub settle_delay_ms: u64,
    pub default_window: WindowLevel,
    pub default_rows: u32,
    pub default_columns: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub crosshair: CrosshairStyle,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            playback_fps: DEFAULT_PLAYBACK_FPS,
            playback_plane: Plane::Axial,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            default_window: WindowLevel::new(DEFAULT_WINDOW_CENTER, DEFAULT_WINDOW_WIDTH),
            default_rows: DEFAULT_IMAGE_DIMENSION,
            default_columns: DEFAULT_IMAGE_DIMENSION,
            viewport_width: DEFAULT_VIEWPORT_SIZE,
            viewport_height: DEFAULT_VIEWPORT_SIZE,
            crosshair: CrosshairStyle::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: ViewerConfig = toml::from_str(&content)?;
        Ok(config.sanitized())
    }

    /// Clamp values that would stall playback or draw nothing.
    pub fn sanitized(mut self) -> Self {
        self.playback_fps = self.playback_fps.clamp(1, MAX_PLAYBACK_FPS);
        self.default_rows = self.default_rows.max(1);
        self.default_columns = self.default_columns.max(1);
        self.viewport_width = self.viewport_width.max(1);
        self.viewport_height = self.viewport_height.max(1);
        self.crosshair.line_width = self.crosshair.line_width.max(1);
        self.crosshair.dash = self.crosshair.dash.max(1);
        self
    }

    /// Interval between playback steps, never shorter than one millisecond.
    pub fn playback_period(&self) -> Duration {
        let fps = self.playback_fps.clamp(1, MAX_PLAYBACK_FPS);
        Duration::from_millis(1000 / u64::from(fps))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn metadata_extractor(&self) -> MetadataExtractor {
        MetadataExtractor::new(self.default_rows, self.default_columns)
    }

    pub fn viewport_size(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }
}
