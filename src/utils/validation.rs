use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9A-Fa-f]{6}|[0-9A-Fa-f]{3})$").expect("valid hex regex"));

static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

pub fn is_valid_hex(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

/// Adds a missing `#`, expands `#RGB` to `#RRGGBB` and upper-cases the result.
pub fn normalize_hex(value: &str) -> String {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    let expanded = if digits.chars().count() == 3 {
        digits.chars().flat_map(|ch| [ch, ch]).collect::<String>()
    } else {
        digits.to_string()
    };

    format!("#{}", expanded.to_uppercase())
}

pub fn create_slug(value: &str) -> String {
    let lowered = value.to_lowercase();
    let replaced = SLUG_SEPARATOR_RE.replace_all(&lowered, "-");
    replaced.trim_matches('-').to_string()
}

fn relative_luminance(hex: &str) -> f64 {
    let normalized = normalize_hex(hex);
    let digits = &normalized[1..];
    let channel = |offset: usize| -> f64 {
        let raw = digits
            .get(offset..offset + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0);
        let value = f64::from(raw) / 255.0;
        if value <= 0.03928 {
            value / 12.92
        } else {
            ((value + 0.055) / 1.055).powf(2.4)
        }
    };

    0.2126 * channel(0) + 0.7152 * channel(2) + 0.0722 * channel(4)
}

/// WCAG contrast ratio between two hex colors, in `[1, 21]`.
pub fn contrast_ratio(first: &str, second: &str) -> f64 {
    let a = relative_luminance(first);
    let b = relative_luminance(second);
    let (brightest, darkest) = if a >= b { (a, b) } else { (b, a) };
    (brightest + 0.05) / (darkest + 0.05)
}
