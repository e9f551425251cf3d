use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::info;

use crate::generation::GeneratedEmoji;
use crate::llm::media::extension_for_mime;
use crate::prompt::{category_slug, palette_slug, style_slug};
use crate::settings::{GenerationSettings, PaletteSetting, StyleSetting};

/// `<category>_<style>_<palette>_v<n>.<ext>` where `n` is `index + 1`.
pub fn output_file_name(
    category: &str,
    style: &StyleSetting,
    palette: &PaletteSetting,
    index: usize,
    mime_type: &str,
) -> String {
    format!(
        "{}_{}_{}_v{}.{}",
        category_slug(category),
        style_slug(style),
        palette_slug(palette),
        index + 1,
        extension_for_mime(mime_type)
    )
}

pub fn write_batch(
    dir: &Path,
    settings: &GenerationSettings,
    emojis: &[GeneratedEmoji],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .map_err(|err| anyhow!("Failed to create output directory {}: {err}", dir.display()))?;

    let mut written = Vec::with_capacity(emojis.len());
    for emoji in emojis {
        let name = output_file_name(
            &settings.category,
            &settings.style,
            &settings.palette,
            emoji.index,
            &emoji.image.mime_type,
        );
        let path = dir.join(name);
        fs::write(&path, &emoji.image.bytes)
            .map_err(|err| anyhow!("Failed to write {}: {err}", path.display()))?;
        written.push(path);
    }

    info!("Wrote {} emoji files to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{EnhancementStatus, ProcessedImage};
    use crate::presets::{find_palette, find_style};
    use crate::settings::{CustomPalette, Selection};

    fn emoji(index: usize, mime_type: &str) -> GeneratedEmoji {
        GeneratedEmoji {
            index,
            action: format!("action {index}"),
            image: ProcessedImage {
                bytes: vec![index as u8; 4],
                mime_type: mime_type.to_string(),
                status: EnhancementStatus::Enhanced,
                background_corrected: false,
            },
        }
    }

    #[test]
    fn file_names_follow_the_naming_convention() {
        let style = Selection::Preset(find_style("Default").unwrap());
        let palette = Selection::Preset(find_palette("Default").unwrap());
        assert_eq!(
            output_file_name("Fantasy Hero!", &style, &palette, 0, "image/png"),
            "fantasy-hero_default_default_v1.png"
        );
        assert_eq!(
            output_file_name("Character", &style, &palette, 11, "image/jpeg"),
            "character_default_default_v12.jpg"
        );
    }

    #[test]
    fn hangul_only_category_gets_a_fallback_slug() {
        let style = Selection::Preset(find_style("Default").unwrap());
        let palette = Selection::Preset(find_palette("Default").unwrap());
        assert_eq!(
            output_file_name("캐릭터", &style, &palette, 0, "image/png"),
            "emoji_default_default_v1.png"
        );
    }

    #[test]
    fn custom_selections_use_custom_slug() {
        let style = StyleSetting::custom("Pixel art with bold outlines").unwrap();
        let palette: PaletteSetting = Selection::Custom(
            CustomPalette::new("#112233", "#445566", "#778899", "#AABBCC").unwrap(),
        );
        assert_eq!(
            output_file_name("Pet", &style, &palette, 2, "image/webp"),
            "pet_custom_custom_v3.webp"
        );
    }

    #[test]
    fn writes_every_emoji_under_its_source_index() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let settings = GenerationSettings::default();
        let emojis = vec![emoji(4, "image/png"), emoji(0, "image/png")];

        let written = write_batch(&out, &settings, &emojis).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("character_default_default_v5.png"));
        assert_eq!(fs::read(&written[1]).unwrap(), vec![0u8; 4]);
    }
}
