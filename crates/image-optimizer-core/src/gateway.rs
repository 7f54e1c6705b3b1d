//! AI augmentation gateway.
//!
//! Wraps the external generative-image service behind the `Enhance` trait so
//! the batch orchestrator can be exercised without a network. The production
//! implementation talks to the Gemini `generateContent` endpoint and
//! normalizes its response into the same `OptimizationResult` shape the
//! deterministic engine produces.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::codec;
use crate::config::Config;
use crate::engine;
use crate::error::{Error, Result};
use crate::types::{OptimizationOptions, OptimizationResult, SourceImage};

/// Produce an enhanced variant of an image.
///
/// Implementations perform no retries; on the first failure the orchestrator
/// falls back to the deterministic path.
pub trait Enhance {
    fn enhance(
        &self,
        image: &SourceImage,
        options: &OptimizationOptions,
    ) -> Result<OptimizationResult>;
}

/// Client for the Gemini image generation API
pub struct GeminiGateway {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Configuration("no API key configured".to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_payload(&self, image: &SourceImage, options: &OptimizationOptions) -> Value {
        let prompt = format!(
            "Enhance this image for web delivery: improve sharpness and color \
             balance without altering the content. Return a single {} image.",
            options.format.extension()
        );

        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": image.mime_type,
                            "data": BASE64.encode(&image.data),
                        }
                    },
                    { "text": prompt },
                ],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
            },
        })
    }

    /// Pull the first inline image out of a `generateContent` response.
    /// A text-only payload is a generation failure; the text is carried in
    /// the error for diagnostics.
    fn extract_image(payload: &Value) -> Result<Vec<u8>> {
        let mut text_parts = Vec::new();

        let candidates = payload
            .get("candidates")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for candidate in &candidates {
            let parts = candidate
                .pointer("/content/parts")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for part in &parts {
                let inline = part
                    .get("inlineData")
                    .or_else(|| part.get("inline_data"))
                    .and_then(Value::as_object);

                if let Some(inline) = inline {
                    if let Some(data) = inline.get("data").and_then(Value::as_str) {
                        if !data.is_empty() {
                            return BASE64.decode(data.as_bytes()).map_err(|e| {
                                Error::InvalidResponse(format!("image payload not base64: {}", e))
                            });
                        }
                    }
                }

                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    text_parts.push(text.to_string());
                }
            }
        }

        if text_parts.is_empty() {
            Err(Error::InvalidResponse(
                "response contained no image payload".to_string(),
            ))
        } else {
            Err(Error::InvalidResponse(text_parts.join(" ")))
        }
    }

    fn map_status(status: StatusCode) -> Option<Error> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized,
            other => Error::ServiceUnavailable(format!("service returned HTTP {}", other)),
        })
    }
}

impl Enhance for GeminiGateway {
    fn enhance(
        &self,
        image: &SourceImage,
        options: &OptimizationOptions,
    ) -> Result<OptimizationResult> {
        let endpoint = self.endpoint();
        debug!("{}: requesting enhancement from {}", image.file_name, endpoint);

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.build_payload(image, options))
            .send()
            .map_err(|e| Error::ServiceUnavailable(e.to_string()))?;

        if let Some(err) = Self::map_status(response.status()) {
            return Err(err);
        }

        let payload: Value = response
            .json()
            .map_err(|e| Error::InvalidResponse(format!("malformed JSON body: {}", e)))?;

        let bytes = Self::extract_image(&payload)?;
        normalize_enhanced(image, bytes, options)
    }
}

/// Turn a raw enhanced payload into the same shape the deterministic engine
/// produces: decodable, constrained to the configured bounds, encoded in the
/// target format. A payload the codec cannot use is an `InvalidResponse` so
/// the orchestrator falls back.
fn normalize_enhanced(
    image: &SourceImage,
    bytes: Vec<u8>,
    options: &OptimizationOptions,
) -> Result<OptimizationResult> {
    let format = codec::detect_format(&bytes)
        .map_err(|e| Error::InvalidResponse(format!("undecodable image payload: {}", e)))?;
    let decoded = codec::decode(&bytes, format.mime_type())
        .map_err(|e| Error::InvalidResponse(format!("undecodable image payload: {}", e)))?;

    engine::conform(&image.file_name, decoded, image.len(), options)
        .map_err(|e| Error::InvalidResponse(format!("unusable image payload: {}", e)))
}
