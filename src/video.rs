// src/video.rs - Camera capture
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use tracing::{debug, info};

use crate::config::CameraConfig;
use crate::error::{Error, Result};

/// A device producing a stream of frames.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<RgbImage>;

    /// Frame rate reported by the device.
    fn fps(&self) -> f64;

    /// Stops the stream. Further reads fail; calling this twice is harmless.
    fn release(&mut self);
}

pub struct VideoSource {
    camera: Option<Camera>,
}

impl VideoSource {
    pub fn new_camera(config: &CameraConfig) -> Result<Self> {
        config.validate()?;
        debug!("Attempting to open camera index {}", config.index);

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(config.index), requested)
            .map_err(|e| Error::Camera(format!("failed to open camera {}: {}", config.index, e)))?;
        camera
            .open_stream()
            .map_err(|e| Error::Camera(format!("failed to open camera stream: {}", e)))?;

        let resolution = camera.resolution();
        info!(
            "Camera {} streaming at {}x{} @ {} fps",
            config.index,
            resolution.width(),
            resolution.height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera: Some(camera),
        })
    }
}

impl FrameSource for VideoSource {
    fn read_frame(&mut self) -> Result<RgbImage> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| Error::Camera("camera has been released".to_string()))?;

        let frame = camera
            .frame()
            .map_err(|e| Error::Camera(format!("failed to capture frame: {}", e)))?;

        frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::Camera(format!("failed to decode frame: {}", e)))
    }

    fn fps(&self) -> f64 {
        self.camera
            .as_ref()
            .map_or(0.0, |camera| camera.frame_rate() as f64)
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            info!("Releasing camera");
            let _ = camera.stop_stream();
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.release();
    }
}
