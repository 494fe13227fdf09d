//! Adaptive JPEG compression
//!
//! Quality follows the frame's overall energy: dark or flat frames are
//! encoded at the floor quality (small payloads), bright and busy frames get
//! proportionally more. The policy is
//!
//! ```text
//! energy  = ‖frame‖₂ / √3            (all channel values of all pixels)
//! quality = max(min_quality, ⌊energy / 1000⌋)
//! ```
//!
//! The policy value is only bounded from below; the encoder itself accepts
//! 1..=100 so the value is clamped when it is handed over.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageResult, RgbImage};

use super::config::Resolution;

/// Result of compressing one raw frame
#[derive(Debug, Clone)]
pub struct Encoded {
    /// JPEG bytes
    pub data: Bytes,
    /// Quality chosen by the policy (before clamping for the encoder)
    pub quality: u32,
}

/// Euclidean norm of the whole frame divided by √3
pub fn frame_energy(image: &RgbImage) -> f64 {
    let sum_sq: u64 = image
        .as_raw()
        .iter()
        .map(|&v| u64::from(v) * u64::from(v))
        .sum();

    (sum_sq as f64 / 3.0).sqrt()
}

/// Quality for a frame of the given energy
pub fn quality_for(energy: f64, min_quality: u8) -> u32 {
    ((energy / 1000.0).floor() as u32).max(u32::from(min_quality))
}

/// Compress a raw RGB frame with the adaptive quality policy
pub fn compress(image: &RgbImage, min_quality: u8) -> ImageResult<Encoded> {
    let quality = quality_for(frame_energy(image), min_quality);
    let data = encode_jpeg(image, quality.clamp(1, 100) as u8)?;

    Ok(Encoded { data, quality })
}

/// Encoded black frame shown while the device is stopped
pub fn placeholder(resolution: Resolution, min_quality: u8) -> ImageResult<Bytes> {
    let blank = RgbImage::new(resolution.width.max(1), resolution.height.max(1));
    compress(&blank, min_quality).map(|encoded| encoded.data)
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> ImageResult<Bytes> {
    let mut out = Cursor::new(Vec::with_capacity(image.as_raw().len() / 8));
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(image)?;
    Ok(Bytes::from(out.into_inner()))
}
