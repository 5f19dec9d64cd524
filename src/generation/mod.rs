//! Text generation: one request in, generated text or a typed error out.
//!
//! ## Module Map
//!
//! | Module   | Responsibility                                              |
//! |----------|-------------------------------------------------------------|
//! | `client` | `GenerationClient`: mode → prompt → tier → backend call(s)  |
//! | `gemini` | `GeminiBackend`: the `generateContent` REST call (reqwest)  |
//!
//! Two seams keep the layers testable:
//!
//! - [`ModelBackend`] is a single raw model call (tier, instruction,
//!   contents, temperature). Real implementation: `GeminiBackend`.
//! - [`TextGenerator`] is a whole [`GenerationRequest`]. Implementations:
//!   `GenerationClient` (in-process) and `crate::remote::RemoteGenerator`
//!   (over HTTP). The workflow controller only sees this trait.
//!
//! Nothing here retries or caches; failures surface to the caller.

pub mod client;
pub mod gemini;

pub use client::{GenerationClient, tier_for};
pub use gemini::{GeminiBackend, GeminiConfig};

use async_trait::async_trait;
use linguaflow_common::{GenerationRequest, GenerationResult, ModelTier};

use crate::errors::GenerationError;

/// One raw call against a model tier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub tier: ModelTier,
    pub system_instruction: Option<String>,
    pub contents: String,
    pub temperature: f32,
}

/// Abstraction over the text-generation backend.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(&self, call: &ModelCall) -> Result<String, GenerationError>;
}

/// Abstraction over executing a complete generation request.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError>;
}
