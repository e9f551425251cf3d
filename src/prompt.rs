use crate::presets::DEFAULT_PRESET_NAME;
use crate::settings::{BackgroundMode, GenerationSettings, PaletteSetting, Selection, StyleSetting};
use crate::utils::validation::create_slug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    /// User instruction for a single generation call. The action text is appended untouched.
    pub fn user_for_action(&self, action: &str) -> String {
        format!("{}\n\nSpecific action: {}", self.user, action)
    }
}

fn background_clause(mode: BackgroundMode) -> String {
    let lines: [&str; 5] = match mode {
        BackgroundMode::Transparent => [
            "- Background: strictly transparent alpha (true PNG transparency).",
            "- Do NOT add any background colors, gradients, patterns, or checkerboard-like tiles.",
            "- No drop shadows, outer glows, or faux transparency effects.",
            "- No checkerboard patterns, no grid lines, no texture overlays.",
            "- Pure transparency only - no semi-transparent backgrounds.",
        ],
        BackgroundMode::White => [
            "- Background: solid pure white only.",
            "- Do NOT use gradients, textures, patterns, or checkerboard-like tiles.",
            "- No drop shadows or outer glows.",
            "- No checkerboard patterns, no grid lines, no texture overlays.",
            "- Pure white background only - no off-white or tinted backgrounds.",
        ],
    };
    lines.join("\n")
}

fn quality_clause() -> String {
    [
        "- Resolution: 4k high-quality upscaled pixels.",
        "- Anti-aliasing: crisp, sharp outlines with smooth edges.",
        "- No blur, no noise, no compression artifacts.",
        "- Line quality: consistent thickness, no broken or jagged lines.",
        "- Color fidelity: no color bleeding, no banding, no dithering.",
        "- Sharpness: maximum detail preservation, no soft or fuzzy areas.",
    ]
    .join("\n")
}

fn palette_clause(palette: &PaletteSetting) -> String {
    if palette.is_auto() {
        return "Use colors that naturally complement the reference image. Preserve the original color harmony and mood. Avoid drastic color changes that would alter the character's established appearance.".to_string();
    }

    let mut parts = vec![format!("Use the palette \"{}\"", palette.display_name())];
    parts.extend(
        palette
            .slots()
            .into_iter()
            .map(|(role, value)| format!("{role} {value}")),
    );

    format!(
        "{}. Prefer on-palette tones; avoid off-palette hues. Use primary for outfit main blocks, secondary for cheeks/accents, accent for props, neutral for outlines/shadows.",
        parts.join(", ")
    )
}

fn style_clause(style: &StyleSetting) -> String {
    match style {
        Selection::Preset(preset) if preset.name == DEFAULT_PRESET_NAME => {
            "Preserve the original art style and technique from the reference image. Make minimal style adjustments to maintain consistency.".to_string()
        }
        Selection::Preset(_) | Selection::Custom(_) => {
            format!("Lock art style to: {}.", style.rule_text())
        }
    }
}

const FALLBACK_CATEGORY_SLUG: &str = "emoji";

/// Non-Latin labels such as Hangul slug to nothing; those fall back to a fixed token.
pub(crate) fn category_slug(category: &str) -> String {
    let slug = create_slug(category);
    if slug.is_empty() {
        FALLBACK_CATEGORY_SLUG.to_string()
    } else {
        slug
    }
}

pub(crate) fn style_slug(style: &StyleSetting) -> String {
    match style {
        Selection::Preset(preset) => create_slug(preset.name),
        Selection::Custom(_) => "custom".to_string(),
    }
}

pub(crate) fn palette_slug(palette: &PaletteSetting) -> String {
    create_slug(palette.display_name())
}

/// `<category>_<style>_<palette>_v{index}.png`, with `{index}` left for the packager.
pub fn file_name_template(settings: &GenerationSettings) -> String {
    format!(
        "{}_{}_{}_v{{index}}.png",
        category_slug(&settings.category),
        style_slug(&settings.style),
        palette_slug(&settings.palette)
    )
}

pub fn build_prompt(settings: &GenerationSettings) -> PromptPair {
    let system = [
        "You are an advanced image editor/generator producing a consistent character emoji set.".to_string(),
        "Hard constraints:".to_string(),
        "- Keep identity: face shape, hairstyle, outfit, proportions.".to_string(),
        format!("- {}", style_clause(&settings.style)),
        format!("- {}", palette_clause(&settings.palette)),
        format!("- Match thematic category: {}.", settings.category.trim()),
        background_clause(settings.background),
        quality_clause(),
        "- Output format: PNG (lossless, no compression artifacts).".to_string(),
        "- Composition: centered character with a 6–8% safe margin on all sides.".to_string(),
        "- For each variation, only change expression/pose/small props.".to_string(),
        "- Quality priority: sharpness and clarity over artistic effects.".to_string(),
    ]
    .join("\n");

    let entries = settings.catalog.entries();
    let variations = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("{}) {}", index + 1, entry))
        .collect::<Vec<_>>()
        .join("\n");

    let user = [
        "Reference image: <uploaded_image>".to_string(),
        format!(
            "Generate {} high-quality PNGs following the constraints above.",
            entries.len()
        ),
        "Keep the same outfit silhouette, hair length, and base colors.".to_string(),
        "Ensure consistent line thickness, lighting, and shading per the locked style.".to_string(),
        "Focus on maximum sharpness and clarity - avoid any blur or noise.".to_string(),
        String::new(),
        format!("Variations to render ({} total):", entries.len()),
        variations,
        String::new(),
        "File names:".to_string(),
        file_name_template(settings),
    ]
    .join("\n");

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogId;
    use crate::presets::{find_palette, find_style};
    use crate::settings::CustomPalette;
    use regex::Regex;

    fn settings_with(style: &str, palette: &str, background: BackgroundMode) -> GenerationSettings {
        GenerationSettings {
            category: "Animal".to_string(),
            style: Selection::Preset(find_style(style).unwrap()),
            palette: Selection::Preset(find_palette(palette).unwrap()),
            background,
            catalog: CatalogId::Emoji16,
        }
    }

    #[test]
    fn default_palette_leaves_no_hex_codes() {
        let hex = Regex::new(r"#[0-9A-Fa-f]{3,6}\b").unwrap();
        for background in [BackgroundMode::Transparent, BackgroundMode::White] {
            let prompt = build_prompt(&settings_with("Flat Vector", "Default", background));
            assert!(!hex.is_match(&prompt.system), "{}", prompt.system);
            assert!(prompt.system.contains("Preserve the original color harmony"));
        }
    }

    #[test]
    fn explicit_palette_lists_every_slot_and_role_mapping() {
        let prompt = build_prompt(&settings_with(
            "Default",
            "Sunset Pop",
            BackgroundMode::Transparent,
        ));
        for hex in ["#FF6B6B", "#FFD166", "#4ECDC4", "#2B2D42"] {
            assert!(prompt.system.contains(hex), "missing {hex}");
        }
        assert!(prompt.system.contains("primary #FF6B6B, secondary #FFD166"));
        assert!(prompt.system.contains(
            "Use primary for outfit main blocks, secondary for cheeks/accents, accent for props, neutral for outlines/shadows."
        ));
    }

    #[test]
    fn build_is_deterministic() {
        let settings = settings_with("Soft Pastel", "Mint Soda", BackgroundMode::White);
        assert_eq!(build_prompt(&settings), build_prompt(&settings));
    }

    #[test]
    fn background_blocks_are_exclusive() {
        let transparent = build_prompt(&settings_with("Default", "Default", BackgroundMode::Transparent));
        let white = build_prompt(&settings_with("Default", "Default", BackgroundMode::White));
        assert!(transparent.system.contains("strictly transparent alpha"));
        assert!(!transparent.system.contains("solid pure white"));
        assert!(white.system.contains("no off-white or tinted backgrounds"));
        assert!(!white.system.contains("strictly transparent alpha"));
    }

    #[test]
    fn default_style_preserves_reference_and_presets_lock() {
        let default = build_prompt(&settings_with("Default", "Default", BackgroundMode::White));
        assert!(default.system.contains("Preserve the original art style"));

        let glossy = build_prompt(&settings_with("3D Glossy", "Default", BackgroundMode::White));
        assert!(glossy
            .system
            .contains("Lock art style to: semi-3D glossy sticker, soft specular highlights"));
    }

    #[test]
    fn custom_style_and_palette_use_custom_slugs() {
        let settings = GenerationSettings {
            category: "Fantasy Hero".to_string(),
            style: StyleSetting::custom("ink wash, loose brush strokes").unwrap(),
            palette: Selection::Custom(CustomPalette::new("#123", "#456", "#789", "#abc").unwrap()),
            background: BackgroundMode::Transparent,
            catalog: CatalogId::Emoji16,
        };
        let prompt = build_prompt(&settings);
        assert!(prompt
            .system
            .contains("Lock art style to: ink wash, loose brush strokes."));
        assert!(prompt.system.contains("neutral #AABBCC"));
        assert!(prompt.user.ends_with("fantasy-hero_custom_custom_v{index}.png"));
    }

    #[test]
    fn hangul_category_keeps_a_usable_file_name_template() {
        let settings = GenerationSettings {
            category: "캐릭터".to_string(),
            ..settings_with("Default", "Default", BackgroundMode::Transparent)
        };
        assert_eq!(
            file_name_template(&settings),
            "emoji_default_default_v{index}.png"
        );
    }

    #[test]
    fn user_instruction_numbers_the_catalog() {
        let prompt = build_prompt(&settings_with("Default", "Default", BackgroundMode::Transparent));
        assert!(prompt.user.contains("Generate 16 high-quality PNGs"));
        assert!(prompt.user.contains("1) Smiling face with thumbs up"));
        assert!(prompt.user.contains("16) Sending finger heart with one hand"));
        assert!(prompt.user.ends_with("animal_default_default_v{index}.png"));
    }

    #[test]
    fn korean_fragments_pass_through_untouched() {
        let mut settings = settings_with("Default", "Default", BackgroundMode::Transparent);
        settings.catalog = CatalogId::KoreanText35;
        let prompt = build_prompt(&settings);
        let action = CatalogId::KoreanText35.entries()[26];
        assert!(prompt.user.contains(action));
        let item = prompt.user_for_action(action);
        assert!(item.ends_with(&format!("Specific action: {action}")));
        assert!(item.contains("'잘부탁드립니다'"));
    }
}
