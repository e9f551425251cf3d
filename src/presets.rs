use crate::utils::validation::create_slug;

pub const DEFAULT_PRESET_NAME: &str = "Default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub name: &'static str,
    pub rule: &'static str,
}

/// Named palette. The `Default` entry has no slots and means "keep the reference colors".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalettePreset {
    pub name: &'static str,
    pub primary: Option<&'static str>,
    pub secondary: Option<&'static str>,
    pub accent: Option<&'static str>,
    pub neutral: Option<&'static str>,
}

impl PalettePreset {
    pub fn is_auto(&self) -> bool {
        self.name == DEFAULT_PRESET_NAME
    }
}

pub static STYLE_PRESETS: [StylePreset; 4] = [
    StylePreset {
        name: DEFAULT_PRESET_NAME,
        rule: "natural style matching the reference image, preserve original art style, maintain consistent proportions and character identity, subtle enhancements only",
    },
    StylePreset {
        name: "Flat Vector",
        rule: "flat vector, bold uniform outline (~3px feel), minimal shading, high-contrast color blocks, clean sticker edges",
    },
    StylePreset {
        name: "Soft Pastel",
        rule: "soft pastel tones, subtle soft shadows, gentle gradients, thin outline (~1-2px), low contrast, cute chibi vibe",
    },
    StylePreset {
        name: "3D Glossy",
        rule: "semi-3D glossy sticker, soft specular highlights, gentle rim light, rounded forms, smooth shading, clean cutout",
    },
];

pub static PALETTE_PRESETS: [PalettePreset; 4] = [
    PalettePreset {
        name: DEFAULT_PRESET_NAME,
        primary: None,
        secondary: None,
        accent: None,
        neutral: None,
    },
    PalettePreset {
        name: "Sunset Pop",
        primary: Some("#FF6B6B"),
        secondary: Some("#FFD166"),
        accent: Some("#4ECDC4"),
        neutral: Some("#2B2D42"),
    },
    PalettePreset {
        name: "Mint Soda",
        primary: Some("#00C2A8"),
        secondary: Some("#9AE6B4"),
        accent: Some("#5AA9E6"),
        neutral: Some("#2F3E46"),
    },
    PalettePreset {
        name: "Mono Ink",
        primary: Some("#111111"),
        secondary: Some("#444444"),
        accent: Some("#777777"),
        // outlines and shadows carry the black/white contrast
        neutral: Some("#FFFFFF"),
    },
];

pub static IMAGE_CATEGORIES: [&str; 8] = [
    "Character",
    "Animal",
    "Robot",
    "Fantasy",
    "Anime",
    "Cartoon",
    "Realistic",
    "Abstract",
];

fn matches_name(candidate: &str, query: &str) -> bool {
    let query = query.trim();
    candidate.eq_ignore_ascii_case(query) || create_slug(candidate) == create_slug(query)
}

pub fn find_style(name: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS
        .iter()
        .find(|preset| matches_name(preset.name, name))
}

pub fn find_palette(name: &str) -> Option<&'static PalettePreset> {
    PALETTE_PRESETS
        .iter()
        .find(|preset| matches_name(preset.name, name))
}

pub fn default_style() -> &'static StylePreset {
    &STYLE_PRESETS[0]
}

pub fn default_palette() -> &'static PalettePreset {
    &PALETTE_PRESETS[0]
}
