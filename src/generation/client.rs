use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ModelBackend, ModelCall, TextGenerator};
use crate::errors::GenerationError;
use crate::prompt::{self, PromptOptions};
use linguaflow_common::{GenerationRequest, GenerationResult, Mode, ModelTier};

/// Model tier a mode runs on.
///
/// For [`Mode::Proofread`] this is the tier of the final polishing pass;
/// its draft pass always runs on [`ModelTier::Fast`].
pub fn tier_for(mode: Mode) -> ModelTier {
    match mode {
        Mode::Translate => ModelTier::Fast,
        Mode::Proofread
        | Mode::Polish
        | Mode::BackgroundSummary
        | Mode::Deconstruct
        | Mode::Reconstruct => ModelTier::Quality,
    }
}

/// Executes [`GenerationRequest`]s against a [`ModelBackend`].
pub struct GenerationClient {
    backend: Arc<dyn ModelBackend>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn ModelBackend> {
        Arc::clone(&self.backend)
    }

    /// Build the backend call for a single pass of `mode`.
    pub fn plan_call(mode: Mode, text: &str, request: &GenerationRequest) -> ModelCall {
        let options = PromptOptions::new(
            request.purpose,
            request.audience.as_deref(),
            request.context.as_deref(),
        );
        let instruction = prompt::build_instruction(mode, &options);
        ModelCall {
            tier: tier_for(mode),
            system_instruction: Some(instruction.text),
            contents: prompt::build_contents(mode, text),
            temperature: instruction.temperature,
        }
    }

    async fn run(&self, call: ModelCall) -> Result<String, GenerationError> {
        debug!(tier = %call.tier, temperature = call.temperature, "Dispatching generation call");
        let text = self.backend.complete(&call).await?;
        if text.trim().is_empty() {
            warn!(tier = %call.tier, "Backend returned no text");
            return Err(GenerationError::Upstream("Generation returned no text".to_string()));
        }
        Ok(text)
    }

    /// Literal draft on the fast tier, then a polish of that draft.
    async fn proofread(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let draft_call = Self::plan_call(Mode::Translate, &request.text, request);
        let draft = self.backend.complete(&draft_call).await?;
        if draft.trim().is_empty() {
            debug!("Empty draft; skipping polish pass");
            return Ok(String::new());
        }
        self.run(Self::plan_call(Mode::Polish, &draft, request)).await
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        if request.text.trim().is_empty() {
            return Err(GenerationError::Validation("Missing text".to_string()));
        }

        let text = match request.mode {
            Mode::Proofread => self.proofread(request).await?,
            Mode::Translate
            | Mode::Polish
            | Mode::BackgroundSummary
            | Mode::Deconstruct
            | Mode::Reconstruct => {
                self.run(Self::plan_call(request.mode, &request.text, request))
                    .await?
            }
        };

        Ok(GenerationResult::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::ScriptedBackend;
    use linguaflow_common::Purpose;

    fn client_with(backend: Arc<ScriptedBackend>) -> GenerationClient {
        GenerationClient::new(backend)
    }

    #[test]
    fn test_tier_selection() {
        assert_eq!(tier_for(Mode::Translate), ModelTier::Fast);
        for mode in [
            Mode::Proofread,
            Mode::Polish,
            Mode::BackgroundSummary,
            Mode::Deconstruct,
            Mode::Reconstruct,
        ] {
            assert_eq!(tier_for(mode), ModelTier::Quality, "{mode}");
        }
    }

    #[tokio::test]
    async fn test_translate_uses_fast_tier_and_raw_text() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok("Hello".into())]));
        let client = client_with(backend.clone());

        let result = client
            .generate(&GenerationRequest::new(Mode::Translate, "你好"))
            .await
            .unwrap();

        assert_eq!(result.text, "Hello");
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tier, ModelTier::Fast);
        assert_eq!(calls[0].contents, "你好");
        assert_eq!(calls[0].temperature, 0.3);
    }

    #[tokio::test]
    async fn test_empty_text_is_validation_error_without_backend_call() {
        let backend = Arc::new(ScriptedBackend::default());
        let client = client_with(backend.clone());

        let err = client
            .generate(&GenerationRequest::new(Mode::Polish, "   "))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Validation(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_proofread_drafts_then_polishes_draft() {
        let backend = Arc::new(ScriptedBackend::replying(vec![
            Ok("literal draft".into()),
            Ok("polished text".into()),
        ]));
        let client = client_with(backend.clone());
        let request = GenerationRequest::new(Mode::Proofread, "源文本")
            .with_audience(Some("Investors"))
            .with_purpose(Some(Purpose::Operative));

        let result = client.generate(&request).await.unwrap();

        assert_eq!(result.text, "polished text");
        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].tier, ModelTier::Fast);
        assert_eq!(calls[0].contents, "源文本");
        assert_eq!(calls[1].tier, ModelTier::Quality);
        assert!(calls[1].contents.contains("literal draft"));
        assert!(!calls[1].contents.contains("源文本"));
        assert_eq!(calls[1].temperature, 0.7);
        assert!(calls[1].system_instruction.as_ref().unwrap().contains("Investors"));
    }

    #[tokio::test]
    async fn test_proofread_empty_draft_short_circuits() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok("  ".into())]));
        let client = client_with(backend.clone());

        let result = client
            .generate(&GenerationRequest::new(Mode::Proofread, "text"))
            .await
            .unwrap();

        assert_eq!(result.text, "");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reconstruct_never_forwards_caller_text() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok("final".into())]));
        let client = client_with(backend.clone());
        let request = GenerationRequest::new(Mode::Reconstruct, "ORIGINAL SOURCE PASSAGE")
            .with_context(Some("VERIFIED LOGIC:\nmeaning"));

        client.generate(&request).await.unwrap();

        let call = &backend.calls()[0];
        assert_eq!(call.contents, prompt::RECONSTRUCT_DIRECTIVE);
        assert!(!call.system_instruction.as_ref().unwrap().contains("ORIGINAL SOURCE PASSAGE"));
        assert!(call.system_instruction.as_ref().unwrap().contains("meaning"));
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_preserved() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Err(GenerationError::Upstream(
            "HTTP 500: internal".into(),
        ))]));
        let client = client_with(backend);

        let err = client
            .generate(&GenerationRequest::new(Mode::Deconstruct, "text"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "HTTP 500: internal");
    }

    #[tokio::test]
    async fn test_blank_backend_output_is_upstream_error() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok("\n".into())]));
        let client = client_with(backend);

        let err = client
            .generate(&GenerationRequest::new(Mode::BackgroundSummary, "text"))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Upstream(_)));
    }
}
