use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub gemini_safety_settings: String,
    pub gemini_request_timeout_seconds: u64,
    pub gemini_max_attempts: usize,
    pub max_reference_image_bytes: usize,
    pub enhance_sharpen: f32,
    pub enhance_upscale: bool,
    pub output_dir: PathBuf,
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

fn clamp_sharpen(value: f32) -> f32 {
    if value.is_nan() {
        return 0.5;
    }
    value.clamp(0.0, 1.0)
}

impl Config {
    pub fn load() -> Result<Self> {
        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "GEMINI_API_KEY is required. Create a .env file with GEMINI_API_KEY=<your key> and restart."
            ));
        }

        Ok(Config {
            gemini_api_key: gemini_api_key.trim().to_string(),
            gemini_base_url: env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image-preview"),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "permissive",
            )),
            gemini_request_timeout_seconds: env_u64("GEMINI_REQUEST_TIMEOUT_SECONDS", 120),
            gemini_max_attempts: env_usize("GEMINI_MAX_ATTEMPTS", 2).max(1),
            max_reference_image_bytes: env_usize("MAX_REFERENCE_IMAGE_BYTES", 4 * 1024 * 1024),
            enhance_sharpen: clamp_sharpen(env_f32("ENHANCE_SHARPEN", 0.5)),
            enhance_upscale: env_bool("ENHANCE_UPSCALE", false),
            output_dir: PathBuf::from(env_string("OUTPUT_DIR", "output")),
        })
    }
}

/// Readable before the rest of the configuration so logging can come up first.
pub fn log_level_from_env() -> String {
    env_string("LOG_LEVEL", "info").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_profile_aliases() {
        assert_eq!(normalize_gemini_safety_settings("OFF".into()), "permissive");
        assert_eq!(normalize_gemini_safety_settings(" standard ".into()), "standard");
        assert_eq!(normalize_gemini_safety_settings("strict".into()), "permissive");
        assert_eq!(normalize_gemini_safety_settings(String::new()), "permissive");
    }

    #[test]
    fn sharpen_is_clamped() {
        assert_eq!(clamp_sharpen(3.0), 1.0);
        assert_eq!(clamp_sharpen(-1.0), 0.0);
        assert_eq!(clamp_sharpen(f32::NAN), 0.5);
    }
}
