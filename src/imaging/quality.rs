use image::{GrayImage, RgbaImage};
use serde::Serialize;

use super::{decode_rgba, has_transparency, TARGET_DIMENSION};

const EDGE_DELTA_THRESHOLD: i16 = 30;
const MIN_EDGE_DENSITY: f64 = 0.01;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

fn edge_density(image: &RgbaImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let gray: GrayImage = image::imageops::grayscale(image);
    let mut edges = 0u64;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let current = i16::from(gray.get_pixel(x, y)[0]);
            let right = i16::from(gray.get_pixel(x + 1, y)[0]);
            let down = i16::from(gray.get_pixel(x, y + 1)[0]);
            if (current - right).abs() > EDGE_DELTA_THRESHOLD
                || (current - down).abs() > EDGE_DELTA_THRESHOLD
            {
                edges += 1;
            }
        }
    }

    let interior = u64::from(width - 2) * u64::from(height - 2);
    edges as f64 / interior as f64
}

/// Diagnostic only; callers log the report and never gate on it.
pub fn validate_quality(bytes: &[u8]) -> QualityReport {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let image = match decode_rgba(bytes) {
        Ok(image) => image,
        Err(err) => {
            issues.push(format!("Validation error: {err}"));
            return QualityReport {
                is_valid: false,
                issues,
                recommendations,
            };
        }
    };

    let (width, height) = image.dimensions();
    if width != TARGET_DIMENSION || height != TARGET_DIMENSION {
        issues.push(format!(
            "Invalid resolution: {width}x{height} (expected {TARGET_DIMENSION}x{TARGET_DIMENSION})"
        ));
        recommendations.push(format!(
            "Use exact {TARGET_DIMENSION}x{TARGET_DIMENSION} resolution"
        ));
    }

    if edge_density(&image) < MIN_EDGE_DENSITY {
        issues.push("Image appears too blurry or lacks sharp edges".to_string());
        recommendations.push("Apply sharpening filter".to_string());
    }

    if !has_transparency(&image) {
        recommendations.push("Consider adding transparency for better integration".to_string());
    }

    QualityReport {
        is_valid: issues.is_empty(),
        issues,
        recommendations,
    }
}
