use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::generation::{EmojiGenerator, GenerationError};
use crate::imaging::{post_process, EnhanceOptions, ProcessedImage};
use crate::llm::media::{normalize_image_mime, ReferenceImage};
use crate::prompt::build_prompt;
use crate::settings::GenerationSettings;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const GEMINI_RETRY_BASE_DELAY_MS: u64 = 900;
const REFUSAL_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    #[allow(dead_code)]
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: Option<String>,
    data: String,
}

/// Failure of one HTTP exchange, before it is tied to a variation.
#[derive(Debug)]
enum ApiFailure {
    Transport(String),
    Status {
        status: StatusCode,
        message: Option<String>,
        body: String,
    },
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct GeminiEmojiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    safety_profile: String,
    request_timeout: Duration,
    max_attempts: usize,
    enhance: EnhanceOptions,
}

impl GeminiEmojiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: get_http_client().clone(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            safety_profile: "permissive".to_string(),
            request_timeout: Duration::from_secs(120),
            max_attempts: 2,
            enhance: EnhanceOptions::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
            config.gemini_image_model.clone(),
        )
        .with_max_attempts(config.gemini_max_attempts);
        client.safety_profile = config.gemini_safety_settings.clone();
        client.request_timeout = Duration::from_secs(config.gemini_request_timeout_seconds);
        client.enhance = EnhanceOptions {
            sharpen: config.enhance_sharpen,
            upscale: config.enhance_upscale,
            force_png: true,
            ..EnhanceOptions::default()
        };
        client
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn redact(&self, text: &str) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return text.to_string();
        }
        text.replace(key, "[redacted]")
    }

    async fn call_generate_content(&self, payload: &Value) -> Result<GeminiResponse, ApiFailure> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(target: "llm.gemini", model = %self.model, payload = %summarize_gemini_payload(payload));
        }

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match self
                .http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.request_timeout)
                .json(payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    let err_text = self.redact(&err.to_string());
                    let should_retry = gemini_should_retry_error(&err) && attempt < self.max_attempts;
                    warn!(
                        "Gemini request failed to send: {} (timeout={}, connect={}, retrying={})",
                        err_text,
                        err.is_timeout(),
                        err.is_connect(),
                        should_retry
                    );
                    if should_retry {
                        tokio::time::sleep(gemini_retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(ApiFailure::Transport(err_text));
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let (message, body_summary) = summarize_error_body(&self.redact(&body));
                let should_retry = gemini_should_retry_status(status) && attempt < self.max_attempts;
                warn!(
                    "Gemini API error: status={}, body={}, retrying={}",
                    status, body_summary, should_retry
                );
                if should_retry {
                    tokio::time::sleep(gemini_retry_delay(attempt)).await;
                    continue;
                }
                return Err(ApiFailure::Status {
                    status,
                    message,
                    body: body_summary,
                });
            }

            let value = response
                .json::<GeminiResponse>()
                .await
                .map_err(|err| ApiFailure::Decode(self.redact(&err.to_string())))?;
            if tracing::enabled!(tracing::Level::DEBUG) {
                debug!(target: "llm.gemini", model = %self.model, response = %summarize_gemini_response(&value));
            }
            return Ok(value);
        }
    }
}

#[async_trait]
impl EmojiGenerator for GeminiEmojiClient {
    async fn generate_one(
        &self,
        reference: &ReferenceImage,
        action: &str,
        settings: &GenerationSettings,
    ) -> Result<ProcessedImage, GenerationError> {
        settings.validate().map_err(|err| GenerationError::InvalidInput {
            action: action.to_string(),
            message: err.to_string(),
        })?;

        let prompt = build_prompt(settings);
        let instruction = format!("{}\n\n{}", prompt.system, prompt.user_for_action(action));
        let mime_type = normalize_image_mime(reference.mime_type());
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": reference.to_base64() } },
                    { "text": instruction },
                ]
            }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
            "safetySettings": build_safety_settings(&self.safety_profile),
        });

        let metadata = json!({ "action": action, "mimeType": mime_type });
        let response = log_llm_timing("gemini", &self.model, "generate_emoji", Some(metadata), || {
            self.call_generate_content(&payload)
        })
        .await
        .map_err(|failure| classify_failure(failure, action))?;

        let raw = extract_first_image(response, action)?;
        let options = EnhanceOptions {
            background: settings.background,
            ..self.enhance
        };
        Ok(post_process(&raw, &options))
    }
}

fn gemini_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn gemini_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn gemini_retry_delay(attempt: usize) -> Duration {
    let attempt = attempt.max(1) as u64;
    Duration::from_millis(GEMINI_RETRY_BASE_DELAY_MS.saturating_mul(attempt))
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "OFF",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using permissive defaults.",
                profile
            );
            "OFF"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
    ]
}

fn classify_failure(failure: ApiFailure, action: &str) -> GenerationError {
    let action = action.to_string();
    match failure {
        ApiFailure::Status {
            status,
            message,
            body,
        } => {
            let detail = message.unwrap_or_else(|| body.clone());
            let auth_problem = status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || body.contains("API_KEY")
                || detail.contains("API key");
            if auth_problem {
                GenerationError::AuthConfig {
                    action,
                    message: format!("check GEMINI_API_KEY ({status}: {detail})"),
                }
            } else if body.contains("INVALID_ARGUMENT") || status == StatusCode::BAD_REQUEST {
                GenerationError::InvalidInput {
                    action,
                    message: format!(
                        "invalid image format or data; use a valid PNG, JPEG, or WebP file ({detail})"
                    ),
                }
            } else {
                GenerationError::GenerationFailed {
                    action,
                    message: format!("status {status}: {detail}"),
                }
            }
        }
        ApiFailure::Transport(message) => GenerationError::GenerationFailed { action, message },
        ApiFailure::Decode(message) => GenerationError::GenerationFailed {
            action,
            message: format!("unreadable response: {message}"),
        },
    }
}

fn extract_first_image(response: GeminiResponse, action: &str) -> Result<Vec<u8>, GenerationError> {
    let mut first_text: Option<String> = None;

    let parts = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .filter_map(|content| content.parts)
        .flatten();

    for part in parts {
        match part {
            GeminiPart::InlineData { inline_data } => {
                let is_image = inline_data
                    .mime_type
                    .as_deref()
                    .map(|mime| mime.starts_with("image/"))
                    .unwrap_or(true);
                if !is_image {
                    continue;
                }
                return general_purpose::STANDARD
                    .decode(inline_data.data.trim())
                    .map_err(|err| GenerationError::GenerationFailed {
                        action: action.to_string(),
                        message: format!("image payload is not valid base64: {err}"),
                    });
            }
            GeminiPart::Text { text } => {
                if first_text.is_none() && !text.trim().is_empty() {
                    first_text = Some(text);
                }
            }
            GeminiPart::Other(_) => {}
        }
    }

    match first_text {
        Some(text) => {
            warn!("Gemini answered with text instead of an image for \"{}\"", action);
            Err(GenerationError::GeneratorRefused {
                action: action.to_string(),
                excerpt: truncate_for_log(&text, REFUSAL_EXCERPT_CHARS),
            })
        }
        None => Err(GenerationError::NoImageReturned {
            action: action.to_string(),
        }),
    }
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let summarized_contents: Vec<Value> = contents
            .iter()
            .map(|content| {
                let role = content
                    .get("role")
                    .and_then(|value| value.as_str())
                    .unwrap_or("user");
                let parts = content
                    .get("parts")
                    .and_then(|value| value.as_array())
                    .map(|parts| summarize_gemini_parts(parts))
                    .unwrap_or_default();
                json!({ "role": role, "parts": parts })
            })
            .collect();
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    if let Some(safety) = payload
        .get("safetySettings")
        .and_then(|value| value.as_array())
    {
        summary.insert("safetySettingsCount".to_string(), json!(safety.len()));
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    let candidates = response.candidates.as_deref().unwrap_or(&[]);
    for part in candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .filter_map(|content| content.parts.as_ref())
        .flatten()
    {
        match part {
            GeminiPart::Text { text } => {
                text_parts += 1;
                if text_preview.is_none() && !text.trim().is_empty() {
                    text_preview = Some(truncate_for_log(text, 200));
                }
            }
            GeminiPart::InlineData { .. } => image_parts += 1,
            GeminiPart::Other(_) => {}
        }
    }

    json!({
        "candidates": candidates.len(),
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::imaging::test_support::{checkerboard, png_bytes};
    use crate::imaging::EnhancementStatus;

    const MODEL: &str = "test-image-model";
    const ENDPOINT: &str = "/v1beta/models/test-image-model:generateContent";

    fn reference() -> ReferenceImage {
        ReferenceImage::from_bytes(png_bytes(&checkerboard(8, 8, 255)), Some("image/jpg"), 1 << 20)
            .unwrap()
    }

    fn client_for(server: &MockServer) -> GeminiEmojiClient {
        GeminiEmojiClient::new("secret-key", format!("{}/v1beta", server.uri()), MODEL)
            .with_max_attempts(1)
    }

    fn image_body(bytes: &[u8]) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here is your sticker." },
                        { "inlineData": { "mimeType": "image/png", "data": general_purpose::STANDARD.encode(bytes) } }
                    ]
                },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn returns_post_processed_image() {
        let server = MockServer::start().await;
        let mut generated = checkerboard(8, 8, 255);
        generated.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "secret-key"))
            .and(body_string_contains("\"responseModalities\":[\"TEXT\",\"IMAGE\"]"))
            .and(body_string_contains("\"mimeType\":\"image/jpeg\""))
            .and(body_string_contains("Specific action: Waving hand hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_body(&png_bytes(&generated))))
            .expect(1)
            .mount(&server)
            .await;

        let image = client_for(&server)
            .generate_one(&reference(), "Waving hand hello", &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(image.status, EnhancementStatus::Enhanced);
        assert_eq!(image.mime_type, "image/png");
        assert!(!image.background_corrected);
    }

    #[tokio::test]
    async fn text_only_answer_is_a_refusal() {
        let server = MockServer::start().await;
        let long_text = "I can't draw that. ".repeat(20);
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": long_text }] } }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate_one(&reference(), "Facepalm pose", &GenerationSettings::default())
            .await
            .unwrap_err();
        match err {
            GenerationError::GeneratorRefused { action, excerpt } => {
                assert_eq!(action, "Facepalm pose");
                assert!(excerpt.ends_with("... (truncated)"));
                assert!(excerpt.chars().count() < long_text.chars().count());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_answer_is_no_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate_one(&reference(), "OK hand sign", &GenerationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoImageReturned { ref action } if action == "OK hand sign"));
    }

    #[tokio::test]
    async fn api_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_string_contains("Specific action: Sleeping with Z icon above head"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT",
                           "details": [{ "reason": "API_KEY_INVALID" }] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_string_contains("Specific action: Cheering with a small flag"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "Unable to process input image.", "status": "INVALID_ARGUMENT" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_string_contains("Specific action: Crossed arms NO gesture"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let settings = GenerationSettings::default();
        let reference = reference();

        let auth = client
            .generate_one(&reference, "Sleeping with Z icon above head", &settings)
            .await
            .unwrap_err();
        assert_eq!(auth.kind(), "auth_config");
        assert!(!auth.to_string().contains("secret-key"));

        let invalid = client
            .generate_one(&reference, "Cheering with a small flag", &settings)
            .await
            .unwrap_err();
        assert_eq!(invalid.kind(), "invalid_input");

        let failed = client
            .generate_one(&reference, "Crossed arms NO gesture", &settings)
            .await
            .unwrap_err();
        assert_eq!(failed.kind(), "generation_failed");
        assert_eq!(failed.action(), Some("Crossed arms NO gesture"));
    }

    #[tokio::test]
    async fn transient_status_is_retried_within_one_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(image_body(&png_bytes(&checkerboard(4, 4, 255)))),
            )
            .mount(&server)
            .await;

        let image = client_for(&server)
            .with_max_attempts(2)
            .generate_one(&reference(), "Winking with a playful smile", &GenerationSettings::default())
            .await
            .unwrap();
        assert!(image.background_corrected);
    }

    #[test]
    fn payload_summary_hides_image_data() {
        let payload = json!({
            "contents": [{ "role": "user", "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "QUJDRA==" } },
                { "text": "hello" }
            ]}]
        });
        let summary = summarize_gemini_payload(&payload).to_string();
        assert!(!summary.contains("QUJDRA=="));
        assert!(summary.contains("\"dataLen\":8"));
    }
}
