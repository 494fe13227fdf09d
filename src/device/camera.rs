//! Hardware camera source (feature `camera`)

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, ControlValueSetter, FrameFormat, KnownCameraControl,
    RequestedFormat, RequestedFormatType, Resolution as CamResolution,
};
use nokhwa::Camera;

use super::config::DeviceConfig;
use super::error::CaptureError;
use super::source::{CaptureSource, SourceKind};

fn camera_err(e: nokhwa::NokhwaError) -> CaptureError {
    CaptureError::Camera(e.to_string())
}

/// Live camera opened through the platform camera stack
pub struct CameraSource {
    camera: Camera,
    index: u32,
}

impl CameraSource {
    /// Open, configure and start streaming from the camera at `capture_port`
    pub fn open(config: &DeviceConfig) -> Result<Self, CaptureError> {
        let format = CameraFormat::new(
            CamResolution::new(config.resolution.width, config.resolution.height),
            FrameFormat::MJPEG,
            config.fps.max(1),
        );
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera =
            Camera::new(CameraIndex::Index(config.capture_port), requested).map_err(camera_err)?;

        // Continuous autofocus where the driver exposes it
        if let Err(e) =
            camera.set_camera_control(KnownCameraControl::Focus, ControlValueSetter::Boolean(true))
        {
            tracing::debug!(error = %e, "Continuous autofocus not available");
        }

        camera.open_stream().map_err(camera_err)?;

        Ok(Self {
            camera,
            index: config.capture_port,
        })
    }
}

impl CaptureSource for CameraSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let buffer = self.camera.frame().map_err(camera_err)?;
        let decoded = buffer.decode_image::<RgbFormat>().map_err(camera_err)?;
        let (width, height) = (decoded.width(), decoded.height());

        RgbImage::from_raw(width, height, decoded.into_raw())
            .map(Some)
            .ok_or_else(|| CaptureError::Camera("frame buffer size mismatch".into()))
    }

    fn rewind(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Camera
    }

    fn describe(&self) -> String {
        format!("camera #{}", self.index)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(camera = self.index, error = %e, "Failed to stop camera stream");
        }
    }
}
