use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use super::{
    composite_on_white, decode_rgba, encode_png, EnhanceOptions, EnhancementError,
    TARGET_DIMENSION, UPSCALE_DIMENSION,
};
use crate::settings::BackgroundMode;

pub fn enhance(bytes: &[u8], options: &EnhanceOptions) -> Result<Vec<u8>, EnhancementError> {
    let source = decode_rgba(bytes)?;

    // White fill goes underneath the source so transparent pixels end up white.
    let canvas = match options.background {
        BackgroundMode::White => composite_on_white(&source),
        BackgroundMode::Transparent => source,
    };

    let needs_upscale = canvas.width() < TARGET_DIMENSION || canvas.height() < TARGET_DIMENSION;
    let intensity = options.sharpen.clamp(0.0, 1.0);
    let output = if options.upscale && needs_upscale {
        let enlarged = imageops::resize(
            &canvas,
            UPSCALE_DIMENSION,
            UPSCALE_DIMENSION,
            FilterType::Nearest,
        );
        imageops::resize(
            &enlarged,
            TARGET_DIMENSION,
            TARGET_DIMENSION,
            FilterType::Lanczos3,
        )
    } else if intensity > 0.0 {
        unsharp_mask(&canvas, intensity)
    } else {
        canvas
    };

    // PNG is the only exit path, requested or not.
    debug!(
        "Encoding enhanced image as PNG: {}x{} force_png={}",
        output.width(),
        output.height(),
        options.force_png
    );
    encode_png(&output)
}

/// 4-neighbour sharpen on RGB. Alpha and the 1-pixel border are copied as is.
pub fn unsharp_mask(image: &RgbaImage, intensity: f32) -> RgbaImage {
    let mut sharpened = image.clone();
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return sharpened;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let up = image.get_pixel(x, y - 1);
            let down = image.get_pixel(x, y + 1);
            let left = image.get_pixel(x - 1, y);
            let right = image.get_pixel(x + 1, y);
            let current = image.get_pixel(x, y);
            let target = sharpened.get_pixel_mut(x, y);

            for channel in 0..3 {
                let average = (f32::from(up[channel])
                    + f32::from(down[channel])
                    + f32::from(left[channel])
                    + f32::from(right[channel]))
                    / 4.0;
                let original = f32::from(current[channel]);
                let value = original + (original - average) * intensity;
                target[channel] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    sharpened
}
