pub mod background;
pub mod enhance;
pub mod quality;

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::media::detect_mime_type;
use crate::settings::BackgroundMode;

pub use background::{detect_and_fix_background, BackgroundFix};
pub use enhance::enhance;
pub use quality::{validate_quality, QualityReport};

pub const TARGET_DIMENSION: u32 = 1024;
pub const UPSCALE_DIMENSION: u32 = 2048;

#[derive(Debug, Error)]
pub enum EnhancementError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image has zero width or height")]
    EmptyImage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceOptions {
    /// Unsharp-mask intensity in `[0, 1]`.
    pub sharpen: f32,
    pub upscale: bool,
    /// Output is always re-encoded as PNG; kept so callers can state the intent explicitly.
    pub force_png: bool,
    pub background: BackgroundMode,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            sharpen: 0.5,
            upscale: false,
            force_png: false,
            background: BackgroundMode::Transparent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancementStatus {
    Enhanced,
    FallbackRaw,
}

#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub status: EnhancementStatus,
    pub background_corrected: bool,
}

pub(crate) fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, EnhancementError> {
    let image = image::load_from_memory(bytes).map_err(EnhancementError::Decode)?;
    let rgba = image.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(EnhancementError::EmptyImage);
    }
    Ok(rgba)
}

pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EnhancementError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(EnhancementError::Encode)?;
    Ok(buffer.into_inner())
}

pub(crate) fn has_transparency(image: &RgbaImage) -> bool {
    image.pixels().any(|pixel| pixel[3] < u8::MAX)
}

/// Draws `image` over an opaque white canvas of the same size.
pub(crate) fn composite_on_white(image: &RgbaImage) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, image, 0, 0);
    canvas
}

pub fn enhance_or_original(bytes: &[u8], options: &EnhanceOptions) -> (Vec<u8>, EnhancementStatus) {
    match enhance(bytes, options) {
        Ok(enhanced) => (enhanced, EnhancementStatus::Enhanced),
        Err(err) => {
            warn!("Image enhancement failed, keeping original: {err}");
            (bytes.to_vec(), EnhancementStatus::FallbackRaw)
        }
    }
}

/// Enhancement followed by the background correction. Never fails; the worst case is the raw input.
/// The opaque-output correction only runs when transparency was requested.
pub fn post_process(raw: &[u8], options: &EnhanceOptions) -> ProcessedImage {
    let (enhanced, status) = enhance_or_original(raw, options);

    let (bytes, background_corrected) = match options.background {
        BackgroundMode::White => (enhanced, false),
        BackgroundMode::Transparent => match detect_and_fix_background(&enhanced) {
            Ok(BackgroundFix::AlreadyTransparent) => (enhanced, false),
            Ok(BackgroundFix::WhiteComposited(fixed)) => (fixed, true),
            Err(err) => {
                warn!("Background detection failed, keeping image as is: {err}");
                (enhanced, false)
            }
        },
    };

    let mime_type = detect_mime_type(&bytes).unwrap_or_else(|| "image/png".to_string());
    debug!(
        "Post-processed image: status={:?} background_corrected={} mime={} bytes={}",
        status,
        background_corrected,
        mime_type,
        bytes.len()
    );

    ProcessedImage {
        bytes,
        mime_type,
        status,
        background_corrected,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{Rgba, RgbaImage};

    use super::encode_png;

    pub fn checkerboard(width: u32, height: u32, alpha: u8) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([20, 40, 60, alpha])
            } else {
                Rgba([220, 200, 180, alpha])
            }
        })
    }

    pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
        encode_png(image).expect("encode test png")
    }
}
