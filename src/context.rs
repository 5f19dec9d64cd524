//! Document-level context inference.
//!
//! Turns an arbitrarily large document into one short background paragraph
//! (topic, document type, audience, tone) that can seed the `context` of
//! later generation requests.

use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{GenerationError, TruncationNotice};
use crate::generation::{ModelBackend, ModelCall};
use crate::prompt;
use linguaflow_common::ModelTier;

/// Hard upper bound on the characters submitted for inference.
pub const MAX_SAMPLE_CHARS: usize = 50_000;

/// Result of a context inference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InferredContext {
    pub summary: String,
    /// Set when the document was cut to [`MAX_SAMPLE_CHARS`].
    pub truncation: Option<TruncationNotice>,
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, Option<TruncationNotice>) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (
            &text[..byte_idx],
            Some(TruncationNotice {
                original_chars: text.chars().count(),
                kept_chars: max_chars,
            }),
        ),
        None => (text, None),
    }
}

pub struct ContextInferenceService {
    backend: Arc<dyn ModelBackend>,
}

impl ContextInferenceService {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Build the backend call for a document, applying the sample limit.
    pub fn plan_call(full_text: &str) -> (ModelCall, Option<TruncationNotice>) {
        let (sample, truncation) = truncate_chars(full_text, MAX_SAMPLE_CHARS);
        let call = ModelCall {
            tier: ModelTier::Quality,
            system_instruction: None,
            contents: prompt::build_context_inference_contents(sample),
            temperature: prompt::CONTEXT_INFERENCE_TEMPERATURE,
        };
        (call, truncation)
    }

    /// Summarise a document. Blank input returns an empty summary without
    /// calling the backend.
    ///
    /// A blank backend reply is an empty summary rather than an upstream
    /// error: the context is optional grounding, not a generated artifact.
    pub async fn infer(&self, full_text: &str) -> Result<InferredContext, GenerationError> {
        if full_text.trim().is_empty() {
            debug!("Empty document; skipping context inference");
            return Ok(InferredContext::default());
        }

        let (call, truncation) = Self::plan_call(full_text);
        if let Some(notice) = &truncation {
            info!("{}", notice);
        }

        let summary = self.backend.complete(&call).await?;
        Ok(InferredContext {
            summary: summary.trim().to_string(),
            truncation,
        })
    }
}
