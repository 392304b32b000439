//! Gemini (Google) studio shot generation client.

use crate::config::Settings;
use crate::error::{parse_retry_after, sanitize_error_message, Result, StudioError};
use crate::image::client::GenerationClient;
use crate::image::types::{decode_base64_lenient, EncodedImage, DEFAULT_MEDIA_TYPE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Instruction sent alongside every product photo.
pub const DEFAULT_STUDIO_PROMPT: &str = "Recreate this exact product as a professional \
e-commerce studio photograph. Keep the product itself identical: same shape, colors, \
labels and proportions. Isolate it on a pure white (#FDFDFD) seamless background, \
light it with soft diffused softbox lighting, and add a subtle natural shadow on the \
ground plane. Center the product with balanced margins. Output a single photorealistic image.";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    #[serde(rename = "gemini-2.5-flash-image", alias = "nano-banana")]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    #[serde(rename = "nano-banana-pro-preview", alias = "nano-banana-pro")]
    NanoBananaPro,
}

impl GeminiModel {
    /// All known models.
    pub const ALL: [GeminiModel; 2] = [Self::NanoBanana, Self::NanoBananaPro];

    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeminiModel {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "gemini-2.5-flash-image" | "nano-banana" => Ok(Self::NanoBanana),
            "nano-banana-pro-preview" | "nano-banana-pro" => Ok(Self::NanoBananaPro),
            other => Err(StudioError::InvalidRequest(format!(
                "unknown Gemini model: {other}"
            ))),
        }
    }
}

/// Builder for GeminiClient.
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    prompt: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model,
            prompt: settings.prompt.clone(),
            base_url: settings.base_url.clone(),
            timeout: settings.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Replaces the studio instruction sent with each photo.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Points the client at a different endpoint (proxies, tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets a transport-level timeout. None by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                StudioError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(GeminiClient {
            client: http.build()?,
            api_key,
            model: self.model,
            prompt: self
                .prompt
                .unwrap_or_else(|| DEFAULT_STUDIO_PROMPT.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Gemini studio shot client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    prompt: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// The model this client calls.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn generate_impl(&self, source: &EncodedImage, media_type: &str) -> Result<EncodedImage> {
        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::new(source, media_type, &self.prompt);

        tracing::debug!(
            model = self.model.as_str(),
            media_type,
            source_bytes = source.len(),
            "sending studio shot request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let bytes = response.bytes().await?;
        let gemini_response: GeminiResponse = serde_json::from_slice(&bytes).map_err(|err| {
            tracing::debug!(
                body = %sanitize_error_message(&String::from_utf8_lossy(&bytes)),
                "undecodable generateContent body"
            );
            StudioError::Json(err)
        })?;
        let image = gemini_response.into_image()?;

        tracing::debug!(
            model = self.model.as_str(),
            media_type = image.media_type(),
            bytes = image.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "studio shot received"
        );

        Ok(image)
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> StudioError {
        let text = extract_api_message(text);
        if status == 402 {
            return StudioError::Billing(
                "Gemini billing issue: enable billing at https://aistudio.google.com".into(),
            );
        }
        if status == 404 {
            return StudioError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            );
        }
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            return StudioError::RateLimited { retry_after };
        }
        if status == 401 || status == 403 {
            return StudioError::Auth(text);
        }
        let lower = text.to_lowercase();
        if lower.contains("safety")
            || lower.contains("blocked")
            || lower.contains("content_policy")
            || lower.contains("prohibited")
        {
            return StudioError::ContentBlocked(text);
        }
        StudioError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, source: &EncodedImage, media_type: &str) -> Result<EncodedImage> {
        self.generate_impl(source, media_type).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StudioError::Auth("Invalid API key".into())),
            404 => Err(StudioError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(StudioError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Pulls `error.message` out of a Gemini error body, falling back to the raw text.
fn extract_api_message(text: &str) -> String {
    let message = serde_json::from_str::<GeminiErrorBody>(text)
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| text.to_string());
    sanitize_error_message(&message)
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn new(source: &EncodedImage, media_type: &str, prompt: &str) -> Self {
        let mime_type = if media_type.trim().is_empty() {
            source.media_type()
        } else {
            media_type
        };

        // Image first, then the instruction.
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: source.to_base64(),
                },
            },
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GeminiResponse {
    fn into_image(self) -> Result<EncodedImage> {
        // Blocked prompts still come back as HTTP 200
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(StudioError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            StudioError::UnexpectedResponse("No candidates in Gemini response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "IMAGE_RECITATION"
                | "RECITATION"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST" => {
                    return Err(StudioError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                "IMAGE_OTHER" | "NO_IMAGE" => {
                    return Err(StudioError::UnexpectedResponse(format!(
                        "Generation failed: {}. Try a different photo.",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let parts = candidate
            .content
            .ok_or_else(|| StudioError::UnexpectedResponse("No content in Gemini candidate".into()))?
            .parts;

        let mut model_text = Vec::new();
        for part in parts {
            if let Some(inline) = part.inline_data {
                let data = decode_base64_lenient(&inline.data)
                    .map_err(|e| StudioError::Decode(e.to_string()))?;
                let mime_type = if inline.mime_type.trim().is_empty() {
                    DEFAULT_MEDIA_TYPE.to_string()
                } else {
                    inline.mime_type
                };
                return EncodedImage::new(mime_type, data);
            }
            if let Some(text) = part.text {
                model_text.push(text);
            }
        }

        let message = if model_text.is_empty() {
            "No image data in Gemini response".to_string()
        } else {
            format!(
                "No image data in Gemini response: {}",
                sanitize_error_message(&model_text.join(" "))
            )
        };
        Err(StudioError::UnexpectedResponse(message))
    }
}
