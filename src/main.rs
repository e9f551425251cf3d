use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod catalog;
mod config;
mod export;
mod generation;
mod imaging;
mod llm;
mod presets;
mod prompt;
mod settings;
mod utils;

use catalog::CatalogId;
use config::{log_level_from_env, Config};
use export::write_batch;
use generation::{generate_batch, BatchResult, GeneratedEmoji};
use imaging::{validate_quality, EnhancementStatus, QualityReport};
use llm::media::ReferenceImage;
use llm::GeminiEmojiClient;
use presets::{find_palette, find_style, IMAGE_CATEGORIES, PALETTE_PRESETS, STYLE_PRESETS};
use settings::{
    BackgroundMode, CustomPalette, GenerationSettings, Selection, SettingsError, StyleSetting,
};
use utils::logging::init_logging;

enum ImageSource {
    File(PathBuf),
    /// Text file holding raw base64 or a `data:` URL.
    Base64File(PathBuf),
}

impl ImageSource {
    fn path(&self) -> &Path {
        match self {
            ImageSource::File(path) | ImageSource::Base64File(path) => path,
        }
    }
}

struct GenerateArgs {
    image: ImageSource,
    settings: GenerationSettings,
    limit: Option<usize>,
    out: Option<PathBuf>,
}

fn usage() -> &'static str {
    "Usage:\n  emoji-forge presets\n  emoji-forge generate (--image <path> | --image-base64 <path>) [--category <label>] [--style <name> | --custom-style <text>] [--palette <name> | --custom-palette <primary,secondary,accent,neutral>] [--background transparent|white] [--catalog emoji_16|emoji_24|emoji_32|korean_text_35|emoji_32_korean] [--limit <n>] [--out <dir>]"
}

fn next_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_generate_args(args: &[String]) -> anyhow::Result<Option<GenerateArgs>> {
    if args.get(1).map(|value| value.as_str()) != Some("generate") {
        return Ok(None);
    }

    let mut image: Option<ImageSource> = None;
    let mut settings = GenerationSettings::default();
    let mut style_given = false;
    let mut palette_given = false;
    let mut limit = None;
    let mut out = None;

    let mut index = 2;
    while index < args.len() {
        let flag = args[index].as_str();
        let mut value = || next_value(args, &mut index, flag);
        match flag {
            "--image" | "--image-base64" => {
                if image.is_some() {
                    return Err(anyhow!("Use only one of --image or --image-base64"));
                }
                let path = PathBuf::from(value()?);
                image = Some(if flag == "--image" {
                    ImageSource::File(path)
                } else {
                    ImageSource::Base64File(path)
                });
            }
            "--category" => {
                settings.category = value()?.trim().to_string();
            }
            "--style" | "--custom-style" => {
                if style_given {
                    return Err(anyhow!("Use only one of --style or --custom-style"));
                }
                style_given = true;
                let value = value()?;
                settings.style = if flag == "--style" {
                    let preset = find_style(value).ok_or_else(|| SettingsError::UnknownPreset {
                        kind: "style",
                        name: value.to_string(),
                    })?;
                    Selection::Preset(preset)
                } else {
                    StyleSetting::custom(value)?
                };
            }
            "--palette" | "--custom-palette" => {
                if palette_given {
                    return Err(anyhow!("Use only one of --palette or --custom-palette"));
                }
                palette_given = true;
                let value = value()?;
                settings.palette = if flag == "--palette" {
                    let preset =
                        find_palette(value).ok_or_else(|| SettingsError::UnknownPreset {
                            kind: "palette",
                            name: value.to_string(),
                        })?;
                    Selection::Preset(preset)
                } else {
                    Selection::Custom(CustomPalette::parse_csv(value)?)
                };
            }
            "--background" => {
                settings.background = BackgroundMode::parse(value()?)?;
            }
            "--catalog" => {
                let value = value()?;
                settings.catalog = CatalogId::parse(value)
                    .ok_or_else(|| anyhow!("Unknown catalog: {value}\n{}", usage()))?;
            }
            "--limit" => {
                let value = value()?;
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Invalid --limit value: {value}"))?;
                limit = Some(parsed.max(1));
            }
            "--out" => {
                out = Some(PathBuf::from(value()?));
            }
            "--help" | "-h" => {
                return Err(anyhow!(usage()));
            }
            other => {
                return Err(anyhow!(
                    "Unknown generate argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    let image =
        image.ok_or_else(|| anyhow!("--image or --image-base64 is required\n{}", usage()))?;
    settings.validate()?;

    Ok(Some(GenerateArgs {
        image,
        settings,
        limit,
        out,
    }))
}

fn print_presets() {
    println!("Styles:");
    for style in STYLE_PRESETS.iter() {
        println!("  {:<12} {}", style.name, style.rule);
    }
    println!("Palettes:");
    for palette in PALETTE_PRESETS.iter() {
        let slots = [
            palette.primary,
            palette.secondary,
            palette.accent,
            palette.neutral,
        ]
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
        let slots = if slots.is_empty() {
            "(keeps reference colors)".to_string()
        } else {
            slots
        };
        println!("  {:<12} {}", palette.name, slots);
    }
    println!("Categories:");
    for category in IMAGE_CATEGORIES.iter() {
        println!("  {category}");
    }
    println!("Catalogs:");
    for catalog in CatalogId::ALL {
        println!(
            "  {:<15} {} entries, {}",
            catalog.id(),
            catalog.entries().len(),
            catalog.label()
        );
    }
}

fn load_reference(source: &ImageSource, max_bytes: usize) -> anyhow::Result<ReferenceImage> {
    let path = source.path();
    let reference = match source {
        ImageSource::File(_) => {
            let bytes = std::fs::read(path)
                .map_err(|err| anyhow!("Failed to read {}: {err}", path.display()))?;
            ReferenceImage::from_bytes(bytes, None, max_bytes)?
        }
        ImageSource::Base64File(_) => {
            let payload = std::fs::read_to_string(path)
                .map_err(|err| anyhow!("Failed to read {}: {err}", path.display()))?;
            ReferenceImage::from_base64(&payload, None, max_bytes)?
        }
    };

    match reference.dimensions() {
        Some((width, height)) => info!(
            "Reference image: {} ({}x{}, {}, {} bytes)",
            path.display(),
            width,
            height,
            reference.mime_type(),
            reference.bytes().len()
        ),
        None => warn!(
            "Reference image {} could not be measured; sending it as {}",
            path.display(),
            reference.mime_type()
        ),
    }
    Ok(reference)
}

fn log_quality(emoji: &GeneratedEmoji, path: &Path, report: &QualityReport) {
    if report.is_valid {
        info!("{} (\"{}\") passed quality checks", path.display(), emoji.action);
    } else {
        warn!(
            "{} (\"{}\") quality issues: {}; recommendations: {}",
            path.display(),
            emoji.action,
            report.issues.join("; "),
            report.recommendations.join("; ")
        );
    }
}

fn log_outputs(batch: &BatchResult, written: &[PathBuf]) {
    for (emoji, path) in batch.emojis.iter().zip(written.iter()) {
        if emoji.image.status == EnhancementStatus::FallbackRaw {
            warn!("{} kept the unenhanced generator output", path.display());
        }
        if emoji.image.background_corrected {
            info!("{} was composited onto white", path.display());
        }
        log_quality(emoji, path, &validate_quality(&emoji.image.bytes));
    }
}

async fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let reference = load_reference(&args.image, config.max_reference_image_bytes)?;

    let settings = args.settings;
    let entries = settings.catalog.entries();
    let take = args.limit.unwrap_or(entries.len()).min(entries.len());
    let actions: Vec<String> = entries[..take].iter().map(|entry| entry.to_string()).collect();

    let client = Arc::new(GeminiEmojiClient::from_config(&config));
    info!(
        "Generating {} emojis with {} (category={}, style={}, palette={}, background={}, catalog={})",
        actions.len(),
        client.model(),
        settings.category,
        settings.style.display_name(),
        settings.palette.display_name(),
        settings.background,
        settings.catalog
    );

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received; cancelling in-flight generations");
            ctrl_c_token.cancel();
        }
    });

    let settings = Arc::new(settings);
    let batch = generate_batch(
        client,
        Arc::new(reference),
        &actions,
        Arc::clone(&settings),
        |percent| info!("Progress: {:.0}%", percent),
        Some(&cancel),
    )
    .await
    .map_err(|err| {
        error!("Emoji batch failed: {err}");
        err
    })?;

    let out_dir = args.out.unwrap_or_else(|| config.output_dir.clone());
    let written = write_batch(&out_dir, &settings, &batch.emojis)?;

    log_outputs(&batch, &written);

    info!(
        "Done: {} of {} emojis written to {} ({} failed)",
        batch.succeeded(),
        batch.total,
        out_dir.display(),
        batch.failed
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging(&log_level_from_env());

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|value| value.as_str()) == Some("presets") {
        print_presets();
        return Ok(());
    }

    match parse_generate_args(&args)? {
        Some(generate_args) => run_generate(generate_args).await,
        None => Err(anyhow!(usage())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("emoji-forge")
            .chain(items.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn other_subcommands_are_not_generate() {
        assert!(parse_generate_args(&argv(&["presets"])).unwrap().is_none());
    }

    #[test]
    fn parses_full_generate_invocation() {
        let parsed = parse_generate_args(&argv(&[
            "generate",
            "--image",
            "me.png",
            "--category",
            "Pet",
            "--style",
            "flat vector",
            "--custom-palette",
            "f60,#00AAFF,#ffcc00,#222",
            "--background",
            "white",
            "--catalog",
            "16",
            "--limit",
            "4",
        ]))
        .unwrap()
        .unwrap();

        assert!(matches!(parsed.image, ImageSource::File(ref path) if path == Path::new("me.png")));
        assert_eq!(parsed.settings.category, "Pet");
        assert_eq!(parsed.settings.style.display_name(), "Flat Vector");
        assert_eq!(parsed.settings.palette.display_name(), "Custom");
        assert_eq!(parsed.settings.background, BackgroundMode::White);
        assert_eq!(parsed.settings.catalog, CatalogId::Emoji16);
        assert_eq!(parsed.limit, Some(4));
        assert!(parsed.out.is_none());
    }

    #[test]
    fn rejects_bad_input_before_any_work() {
        assert!(parse_generate_args(&argv(&["generate"])).is_err());
        assert!(parse_generate_args(&argv(&["generate", "--image", "a.png", "--palette", "Neon"])).is_err());
        assert!(parse_generate_args(&argv(&[
            "generate",
            "--image",
            "a.png",
            "--custom-palette",
            "#12,#000,#fff,#abc"
        ]))
        .is_err());
        assert!(parse_generate_args(&argv(&[
            "generate",
            "--image",
            "a.png",
            "--style",
            "Default",
            "--custom-style",
            "ink"
        ]))
        .is_err());
        assert!(parse_generate_args(&argv(&["generate", "--image", "a.png", "--background", "grey"])).is_err());
        assert!(parse_generate_args(&argv(&["generate", "--image"])).is_err());
    }

    #[test]
    fn base64_reference_input_is_exclusive_with_image() {
        let parsed = parse_generate_args(&argv(&["generate", "--image-base64", "ref.txt"]))
            .unwrap()
            .unwrap();
        assert!(matches!(parsed.image, ImageSource::Base64File(_)));
        assert!(parse_generate_args(&argv(&[
            "generate",
            "--image",
            "a.png",
            "--image-base64",
            "ref.txt"
        ]))
        .is_err());
    }

    #[test]
    fn loads_reference_from_data_url_file() {
        use base64::{engine::general_purpose, Engine as _};
        use imaging::test_support::{checkerboard, png_bytes};

        let png = png_bytes(&checkerboard(12, 9, 255));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.txt");
        std::fs::write(
            &path,
            format!("data:image/png;base64,{}\n", general_purpose::STANDARD.encode(&png)),
        )
        .unwrap();

        let reference = load_reference(&ImageSource::Base64File(path), 1 << 20).unwrap();
        assert_eq!(reference.bytes(), png.as_slice());
        assert_eq!(reference.mime_type(), "image/png");
        assert_eq!(reference.dimensions(), Some((12, 9)));

        let oversized = dir.path().join("big.png");
        std::fs::write(&oversized, &png).unwrap();
        assert!(load_reference(&ImageSource::File(oversized), 16).is_err());
    }
}
