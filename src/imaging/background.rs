use tracing::info;

use super::{composite_on_white, decode_rgba, encode_png, has_transparency, EnhancementError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundFix {
    /// At least one pixel has alpha below 255; the input is kept as is.
    AlreadyTransparent,
    /// The input was fully opaque and has been re-rendered over solid white.
    WhiteComposited(Vec<u8>),
}

// A single non-opaque pixel counts as honoring the transparency request.
pub fn detect_and_fix_background(bytes: &[u8]) -> Result<BackgroundFix, EnhancementError> {
    let image = decode_rgba(bytes)?;
    if has_transparency(&image) {
        return Ok(BackgroundFix::AlreadyTransparent);
    }

    info!(
        "Generated image is fully opaque ({}x{}); compositing over white",
        image.width(),
        image.height()
    );
    let composited = composite_on_white(&image);
    Ok(BackgroundFix::WhiteComposited(encode_png(&composited)?))
}
