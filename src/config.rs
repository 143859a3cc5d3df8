// src/config.rs
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub camera: CameraConfig,
    pub viewer: ViewerConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.camera.validate()?;
        self.viewer.validate()
    }
}

/// Settings forwarded to the hand landmark model.
#[derive(Debug, Clone, Serialize)]
pub struct DetectorConfig {
    pub static_image_mode: bool,
    pub max_num_hands: usize,
    pub model_complexity: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Program (and arguments) of the external landmarker process.
    #[serde(skip)]
    pub command: Vec<String>,
    /// How long the landmarker may take to load its model and answer `READY`.
    #[serde(skip)]
    pub ready_timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            max_num_hands: 2,
            model_complexity: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
            command: vec![
                "python3".to_string(),
                "scripts/hand_landmarker.py".to_string(),
            ],
            ready_timeout: Duration::from_secs(30),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_num_hands < 1 {
            return Err(Error::InvalidConfig(
                "max_num_hands must be at least 1".to_string(),
            ));
        }
        if self.model_complexity > 1 {
            return Err(Error::InvalidConfig(format!(
                "model_complexity must be 0 or 1, got {}",
                self.model_complexity
            )));
        }
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.ready_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "ready_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "camera resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Hands drawn by the annotator and plotted by the 3D renderer.
    pub max_hands: usize,
    /// The 3D plot is refreshed once every `render_every` frames.
    pub render_every: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_hands: 2,
            render_every: 2,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.render_every == 0 {
            return Err(Error::InvalidConfig(
                "render_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
