use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::OnceCell;
use tracing::warn;

use crate::settings::SettingsError;

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    infer::get(data).map(|kind| kind.mime_type().to_string())
}

/// Maps a caller-declared MIME type onto what the generator accepts, falling back to PNG.
pub fn normalize_image_mime(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => "image/png",
        "image/jpeg" | "image/jpg" => "image/jpeg",
        "image/webp" => "image/webp",
        _ => DEFAULT_IMAGE_MIME,
    }
}

fn is_supported_image_mime(mime_type: &str) -> bool {
    matches!(
        mime_type.trim().to_ascii_lowercase().as_str(),
        "image/png" | "image/jpeg" | "image/jpg" | "image/webp"
    )
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match normalize_image_mime(mime_type) {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Drops a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    }
}

/// Caller-owned reference picture shared read-only by every call of a batch.
#[derive(Debug)]
pub struct ReferenceImage {
    bytes: Vec<u8>,
    mime_type: String,
    dimensions: OnceCell<Option<(u32, u32)>>,
}

impl ReferenceImage {
    pub fn from_bytes(
        bytes: Vec<u8>,
        declared_mime: Option<&str>,
        max_bytes: usize,
    ) -> Result<Self, SettingsError> {
        if bytes.is_empty() {
            return Err(SettingsError::EmptyImage);
        }
        if bytes.len() > max_bytes {
            return Err(SettingsError::ImageTooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }

        let detected = detect_mime_type(&bytes);
        let declared = declared_mime
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let mime_type = match (declared, detected.as_deref()) {
            (Some(declared), _) if is_supported_image_mime(declared) => {
                if let Some(detected) = detected.as_deref() {
                    if normalize_image_mime(detected) != normalize_image_mime(declared) {
                        warn!(
                            "Declared reference MIME {} differs from detected {}",
                            declared, detected
                        );
                    }
                }
                normalize_image_mime(declared)
            }
            (Some(declared), _) => return Err(SettingsError::UnsupportedMime(declared.to_string())),
            (None, Some(detected)) if is_supported_image_mime(detected) => {
                normalize_image_mime(detected)
            }
            (None, Some(detected)) => {
                return Err(SettingsError::UnsupportedMime(detected.to_string()))
            }
            (None, None) => return Err(SettingsError::UnsupportedMime("unknown".to_string())),
        };

        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
            dimensions: OnceCell::new(),
        })
    }

    pub fn from_base64(
        payload: &str,
        declared_mime: Option<&str>,
        max_bytes: usize,
    ) -> Result<Self, SettingsError> {
        let encoded = strip_data_url_prefix(payload.trim());
        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|err| SettingsError::InvalidEncoding(err.to_string()))?;
        Self::from_bytes(bytes, declared_mime, max_bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Decoded pixel size, computed on first use. `None` when the header cannot be read.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        *self.dimensions.get_or_init(|| {
            image::ImageReader::new(std::io::Cursor::new(&self.bytes))
                .with_guessed_format()
                .ok()
                .and_then(|reader| reader.into_dimensions().ok())
        })
    }
}
