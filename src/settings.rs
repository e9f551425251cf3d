use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::catalog::CatalogId;
use crate::presets::{default_palette, default_style, PalettePreset, StylePreset};
use crate::utils::validation::{contrast_ratio, is_valid_hex, normalize_hex};

const LOW_CONTRAST_THRESHOLD: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("custom style text must not be empty")]
    EmptyCustomStyle,
    #[error("custom palette slot '{slot}' is not a valid hex color: {value:?}")]
    InvalidHex { slot: &'static str, value: String },
    #[error("image category must not be empty")]
    EmptyCategory,
    #[error("unknown {kind} preset '{name}'")]
    UnknownPreset { kind: &'static str, name: String },
    #[error("unsupported background mode '{0}' (expected transparent or white)")]
    UnknownBackground(String),
    #[error("unsupported image type '{0}' (expected PNG, JPEG or WebP)")]
    UnsupportedMime(String),
    #[error("reference image is empty")]
    EmptyImage,
    #[error("reference image is {size} bytes, above the {limit} byte limit")]
    ImageTooLarge { size: usize, limit: usize },
    #[error("reference image payload is not valid base64: {0}")]
    InvalidEncoding(String),
}

/// Either a named preset or caller-supplied free-form data.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<P, C> {
    Preset(P),
    Custom(C),
}

pub type StyleSetting = Selection<&'static StylePreset, String>;
pub type PaletteSetting = Selection<&'static PalettePreset, CustomPalette>;

impl StyleSetting {
    pub fn custom(text: &str) -> Result<Self, SettingsError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::EmptyCustomStyle);
        }
        Ok(Selection::Custom(trimmed.to_string()))
    }

    pub fn display_name(&self) -> &str {
        match self {
            Selection::Preset(preset) => preset.name,
            Selection::Custom(_) => "Custom",
        }
    }

    pub fn rule_text(&self) -> &str {
        match self {
            Selection::Preset(preset) => preset.rule,
            Selection::Custom(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub neutral: String,
}

impl CustomPalette {
    pub fn new(
        primary: &str,
        secondary: &str,
        accent: &str,
        neutral: &str,
    ) -> Result<Self, SettingsError> {
        fn slot(name: &'static str, value: &str) -> Result<String, SettingsError> {
            let trimmed = value.trim();
            let candidate = if trimmed.starts_with('#') {
                trimmed.to_string()
            } else {
                format!("#{trimmed}")
            };
            if !is_valid_hex(&candidate) {
                return Err(SettingsError::InvalidHex {
                    slot: name,
                    value: value.to_string(),
                });
            }
            Ok(normalize_hex(&candidate))
        }

        Ok(Self {
            primary: slot("primary", primary)?,
            secondary: slot("secondary", secondary)?,
            accent: slot("accent", accent)?,
            neutral: slot("neutral", neutral)?,
        })
    }

    /// Parses `primary,secondary,accent,neutral`.
    pub fn parse_csv(value: &str) -> Result<Self, SettingsError> {
        let slots: Vec<&str> = value.split(',').map(str::trim).collect();
        match slots.as_slice() {
            [primary, secondary, accent, neutral] => {
                Self::new(primary, secondary, accent, neutral)
            }
            _ => Err(SettingsError::InvalidHex {
                slot: "palette",
                value: value.to_string(),
            }),
        }
    }
}

impl PaletteSetting {
    pub fn display_name(&self) -> &str {
        match self {
            Selection::Preset(preset) => preset.name,
            Selection::Custom(_) => "Custom",
        }
    }

    pub fn is_auto(&self) -> bool {
        match self {
            Selection::Preset(preset) => preset.is_auto(),
            Selection::Custom(_) => false,
        }
    }

    /// Defined color slots in role order, skipping empty ones.
    pub fn slots(&self) -> Vec<(&'static str, String)> {
        let raw: [(&'static str, Option<&str>); 4] = match self {
            Selection::Preset(preset) => [
                ("primary", preset.primary),
                ("secondary", preset.secondary),
                ("accent", preset.accent),
                ("neutral", preset.neutral),
            ],
            Selection::Custom(custom) => [
                ("primary", Some(custom.primary.as_str())),
                ("secondary", Some(custom.secondary.as_str())),
                ("accent", Some(custom.accent.as_str())),
                ("neutral", Some(custom.neutral.as_str())),
            ],
        };

        raw.into_iter()
            .filter_map(|(role, value)| {
                let value = value?.trim();
                if value.is_empty() {
                    None
                } else {
                    Some((role, value.to_string()))
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    #[default]
    Transparent,
    White,
}

impl BackgroundMode {
    pub fn parse(value: &str) -> Result<Self, SettingsError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transparent" => Ok(BackgroundMode::Transparent),
            "white" => Ok(BackgroundMode::White),
            other => Err(SettingsError::UnknownBackground(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundMode::Transparent => "transparent",
            BackgroundMode::White => "white",
        }
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a batch needs besides the reference image. Not mutated once a batch starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub category: String,
    pub style: StyleSetting,
    pub palette: PaletteSetting,
    pub background: BackgroundMode,
    pub catalog: CatalogId,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            category: "Character".to_string(),
            style: Selection::Preset(default_style()),
            palette: Selection::Preset(default_palette()),
            background: BackgroundMode::default(),
            catalog: CatalogId::default(),
        }
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.category.trim().is_empty() {
            return Err(SettingsError::EmptyCategory);
        }

        if let Selection::Custom(text) = &self.style {
            if text.trim().is_empty() {
                return Err(SettingsError::EmptyCustomStyle);
            }
        }

        if let Selection::Custom(custom) = &self.palette {
            for (slot, value) in self.palette.slots() {
                if !is_valid_hex(&value) {
                    return Err(SettingsError::InvalidHex { slot, value });
                }
            }
            let ratio = contrast_ratio(&custom.primary, &custom.neutral);
            if ratio < LOW_CONTRAST_THRESHOLD {
                warn!(
                    "Custom palette primary {} and neutral {} have low contrast (ratio {:.2})",
                    custom.primary, custom.neutral, ratio
                );
            }
        }

        Ok(())
    }
}
