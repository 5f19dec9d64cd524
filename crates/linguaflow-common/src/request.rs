use serde::{Deserialize, Serialize};

use crate::{Mode, Purpose};

/// A complete, self-describing unit of generation work.
///
/// Serialises to the `POST /api/generate` body:
/// `{ text, mode, targetAudience?, context?, purpose? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub text: String,
    pub mode: Mode,
    #[serde(default, rename = "targetAudience", skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
}

impl GenerationRequest {
    pub fn new(mode: Mode, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode,
            audience: None,
            context: None,
            purpose: None,
        }
    }

    /// Attach an audience. Blank values are treated as absent.
    pub fn with_audience(mut self, audience: Option<&str>) -> Self {
        self.audience = non_blank(audience);
        self
    }

    /// Attach grounding context. Blank values are treated as absent.
    pub fn with_context(mut self, context: Option<&str>) -> Self {
        self.context = non_blank(context);
        self
    }

    pub fn with_purpose(mut self, purpose: Option<Purpose>) -> Self {
        self.purpose = purpose;
        self
    }
}

/// Text produced by the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(rename = "result")]
    pub text: String,
}

impl GenerationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// `POST /api/context` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRequest {
    #[serde(default, rename = "fullText")]
    pub full_text: Option<String>,
}

/// `POST /api/context` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextResponse {
    pub context: String,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
