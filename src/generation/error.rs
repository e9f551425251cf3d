use thiserror::Error;

use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid input for \"{action}\": {message}")]
    InvalidInput { action: String, message: String },
    #[error("API key configuration error for \"{action}\": {message}")]
    AuthConfig { action: String, message: String },
    #[error("Generator returned text instead of an image for \"{action}\": {excerpt}")]
    GeneratorRefused { action: String, excerpt: String },
    #[error("No image data returned for \"{action}\"")]
    NoImageReturned { action: String },
    #[error("Failed to generate emoji for \"{action}\": {message}")]
    GenerationFailed { action: String, message: String },
    #[error("All {attempted} emoji generation attempts failed. The API might be unavailable or the input image may be unsuitable.")]
    BatchExhausted { attempted: usize },
    #[error("Batch cancelled after {settled} of {total} generations settled")]
    Cancelled { settled: usize, total: usize },
}

impl GenerationError {
    pub fn invalid_settings(err: SettingsError) -> Self {
        GenerationError::InvalidInput {
            action: String::new(),
            message: err.to_string(),
        }
    }

    /// Action text of the variation this error belongs to, if it is a per-item error.
    pub fn action(&self) -> Option<&str> {
        match self {
            GenerationError::InvalidInput { action, .. }
            | GenerationError::AuthConfig { action, .. }
            | GenerationError::GeneratorRefused { action, .. }
            | GenerationError::NoImageReturned { action }
            | GenerationError::GenerationFailed { action, .. } => Some(action),
            GenerationError::BatchExhausted { .. } | GenerationError::Cancelled { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::InvalidInput { .. } => "invalid_input",
            GenerationError::AuthConfig { .. } => "auth_config",
            GenerationError::GeneratorRefused { .. } => "generator_refused",
            GenerationError::NoImageReturned { .. } => "no_image_returned",
            GenerationError::GenerationFailed { .. } => "generation_failed",
            GenerationError::BatchExhausted { .. } => "batch_exhausted",
            GenerationError::Cancelled { .. } => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_item_errors_carry_action_text() {
        let err = GenerationError::NoImageReturned {
            action: "Waving hand hello".to_string(),
        };
        assert_eq!(err.action(), Some("Waving hand hello"));
        assert!(err.to_string().contains("Waving hand hello"));
        assert_eq!(GenerationError::BatchExhausted { attempted: 3 }.action(), None);
    }

    #[test]
    fn settings_errors_become_invalid_input() {
        let err = GenerationError::invalid_settings(SettingsError::EmptyCustomStyle);
        assert_eq!(err.kind(), "invalid_input");
        assert!(err.to_string().contains("custom style"));
    }
}
