//! Google Gemini `generateContent` backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::{ModelBackend, ModelCall};
use crate::errors::GenerationError;
use linguaflow_common::ModelTier;

/// Connection settings for [`GeminiBackend`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub fast_model: String,
    pub quality_model: String,
    pub timeout: Duration,
}

/// Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Upstream("GEMINI_API_KEY is not set".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.config.fast_model,
            ModelTier::Quality => &self.config.quality_model,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

fn build_body(call: &ModelCall) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user"),
            parts: vec![GeminiPart {
                text: call.contents.clone(),
            }],
        }],
        system_instruction: call.system_instruction.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: text.clone() }],
        }),
        generation_config: GeminiGenerationConfig {
            temperature: call.temperature,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GeminiResponse) -> Result<String, GenerationError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Upstream("No candidates in response".to_string()))?;
    let parts = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default();
    if parts.is_empty() {
        return Err(GenerationError::Upstream("No parts in candidate".to_string()));
    }
    Ok(parts.into_iter().filter_map(|p| p.text).collect())
}

/// Best-effort extraction of the upstream error message.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => format!("HTTP {}: {}", status, envelope.error.message),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    async fn complete(&self, call: &ModelCall) -> Result<String, GenerationError> {
        let model = self.model_for(call.tier);
        debug!(
            model,
            tier = %call.tier,
            temperature = call.temperature,
            contents_chars = call.contents.chars().count(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&build_body(call))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            error!(model, "Gemini API error: {}", message);
            return Err(GenerationError::Upstream(message));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            GenerationError::Upstream(format!("Malformed response from model: {}", e))
        })?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                prompt_tokens = ?usage.prompt_token_count,
                response_tokens = ?usage.candidates_token_count,
                "Gemini usage"
            );
        }

        extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            fast_model: "gemini-2.5-flash-lite".to_string(),
            quality_model: "gemini-2.5-pro".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let mut config = test_config();
        config.api_key = "  ".to_string();
        assert!(matches!(
            GeminiBackend::new(config),
            Err(GenerationError::Upstream(_))
        ));
    }

    #[test]
    fn test_tier_selects_model() {
        let backend = GeminiBackend::new(test_config()).unwrap();
        assert_eq!(backend.model_for(ModelTier::Fast), "gemini-2.5-flash-lite");
        assert_eq!(backend.model_for(ModelTier::Quality), "gemini-2.5-pro");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = GeminiBackend::new(test_config()).unwrap();
        assert_eq!(
            backend.endpoint("gemini-2.5-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_body_carries_system_instruction_and_temperature() {
        let call = ModelCall {
            tier: ModelTier::Quality,
            system_instruction: Some("Be precise.".to_string()),
            contents: "Hello".to_string(),
            temperature: 0.3,
        };
        let json = serde_json::to_value(build_body(&call)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be precise.");
        assert!(json["systemInstruction"].get("role").is_none());
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_body_without_instruction_omits_field() {
        let call = ModelCall {
            tier: ModelTier::Quality,
            system_instruction: None,
            contents: "Doc".to_string(),
            temperature: 0.5,
        };
        let json = serde_json::to_value(build_body(&call)).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}],
                "usageMetadata":{"promptTokenCount":3,"candidatesTokenCount":2}}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello, world");
    }

    #[test]
    fn test_extract_text_without_candidates_is_upstream_error() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        let err = extract_text(response).unwrap_err();
        assert_eq!(err, GenerationError::Upstream("No candidates in response".into()));
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let msg = error_message(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert!(msg.contains("429"));
        assert!(msg.contains("Quota exceeded"));

        let raw = error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down\n");
        assert!(raw.ends_with("upstream down"));
    }
}
