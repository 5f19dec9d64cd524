use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::session::{Session, SessionEdits, SessionField};
use super::store::SessionStore;
use crate::errors::GenerationError;
use crate::generation::TextGenerator;
use crate::prompt;
use linguaflow_common::{GenerationRequest, GenerationResult, Mode, Purpose, Stage};

/// What an `advance` or `polish` call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step ran and the session moved to `stage`.
    Advanced { stage: Stage },
    /// The target text was replaced by its polished version.
    Polished,
    /// Preconditions were not met; nothing was sent.
    Skipped { reason: String },
    /// The generation call failed; the session kept its previous artifacts.
    Failed { message: String },
}

impl StepOutcome {
    fn skipped(reason: &str) -> Self {
        StepOutcome::Skipped {
            reason: reason.to_string(),
        }
    }
}

/// A session together with the outcome of the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StepOutcome>,
}

/// Which generation step to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Advance,
    Polish,
}

/// What a finished step writes back into the session.
#[derive(Debug)]
enum Commit {
    Advance {
        from: Stage,
        next: Stage,
        /// The edited target text, committed as the previous stage's artifact.
        committed_edit: Option<String>,
    },
    Polish,
}

/// A step that has been started with [`WorkflowController::begin`].
///
/// The session stays `is_loading` until the step is handed back to
/// [`WorkflowController::finish`] together with the generation result.
#[derive(Debug)]
pub struct PendingStep {
    request: GenerationRequest,
    commit: Commit,
}

impl PendingStep {
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

/// Drives the insight → logic → reconstruction workflow over one
/// [`Session`].
///
/// Every step reads the *current* `target_text`, so user edits between
/// steps flow into the next request.
pub struct WorkflowController {
    session: Session,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn SessionStore>,
}

impl WorkflowController {
    pub fn new(generator: Arc<dyn TextGenerator>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            session: Session::default(),
            generator,
            store,
        }
    }

    /// Restore the last persisted session. A store that cannot be read
    /// yields a fresh session.
    pub fn restore(generator: Arc<dyn TextGenerator>, store: Arc<dyn SessionStore>) -> Self {
        let session = match store.load() {
            Ok(fields) => Session::from_stored(&fields),
            Err(e) => {
                warn!("Could not restore session, starting fresh: {}", e);
                Session::default()
            }
        };
        debug!(stage = %session.stage, "Session restored");
        Self {
            session,
            generator,
            store,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self, outcome: Option<StepOutcome>) -> WorkflowSnapshot {
        WorkflowSnapshot {
            session: self.session.clone(),
            outcome,
        }
    }

    pub fn can_advance(&self) -> bool {
        !self.session.source_text.trim().is_empty()
            && !self.session.stage.is_terminal()
            && !self.session.is_loading
    }

    pub fn set_source_text(&mut self, text: impl Into<String>) {
        self.session.source_text = text.into();
        self.persist(SessionField::SourceText, &self.session.source_text);
    }

    pub fn set_target_text(&mut self, text: impl Into<String>) {
        self.session.target_text = text.into();
        self.persist(SessionField::TargetText, &self.session.target_text);
    }

    pub fn set_audience(&mut self, audience: impl Into<String>) {
        self.session.target_audience = audience.into();
        self.persist(SessionField::TargetAudience, &self.session.target_audience);
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        self.session.global_context = context.into();
        self.persist(SessionField::Context, &self.session.global_context);
    }

    pub fn set_purpose(&mut self, purpose: Option<Purpose>) {
        self.session.text_purpose = purpose;
        match purpose {
            Some(p) => self.persist(SessionField::TextPurpose, p.wire_name()),
            None => self.persist(SessionField::TextPurpose, ""),
        }
    }

    pub fn apply_edits(&mut self, edits: SessionEdits) {
        if let Some(text) = edits.source_text {
            self.set_source_text(text);
        }
        if let Some(text) = edits.target_text {
            self.set_target_text(text);
        }
        if let Some(audience) = edits.audience {
            self.set_audience(audience);
        }
        if let Some(context) = edits.context {
            self.set_context(context);
        }
        if let Some(purpose) = edits.purpose {
            self.set_purpose(purpose);
        }
    }

    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        Arc::clone(&self.generator)
    }

    fn plan_advance(&self) -> Option<PendingStep> {
        let s = &self.session;
        let from = s.stage;
        let next = from.next()?;
        let (request, committed_edit) = match from {
            Stage::Idle => (
                GenerationRequest::new(Mode::BackgroundSummary, s.source_text.as_str())
                    .with_context(s.context()),
                None,
            ),
            Stage::InsightDone => (
                GenerationRequest::new(Mode::Deconstruct, s.source_text.as_str())
                    .with_context(Some(s.target_text.as_str()))
                    .with_audience(s.audience()),
                Some(s.target_text.clone()),
            ),
            Stage::Deconstructed => {
                let combined = prompt::combined_context(&s.background_summary, &s.target_text);
                (
                    GenerationRequest::new(Mode::Reconstruct, prompt::RECONSTRUCT_DIRECTIVE)
                        .with_context(Some(combined.as_str()))
                        .with_audience(s.audience())
                        .with_purpose(s.text_purpose),
                    Some(s.target_text.clone()),
                )
            }
            Stage::Reconstructed => return None,
        };
        Some(PendingStep {
            request,
            commit: Commit::Advance {
                from,
                next,
                committed_edit,
            },
        })
    }

    fn plan_polish(&self) -> PendingStep {
        let s = &self.session;
        PendingStep {
            request: GenerationRequest::new(Mode::Polish, s.target_text.as_str())
                .with_audience(s.audience())
                .with_context(s.context())
                .with_purpose(s.text_purpose),
            commit: Commit::Polish,
        }
    }

    /// Start a step: check its preconditions, build its request and mark
    /// the session as loading.
    ///
    /// Returns the outcome to report instead when the step cannot run.
    /// The caller must hand the step back to [`Self::finish`].
    pub fn begin(&mut self, kind: StepKind) -> Result<PendingStep, StepOutcome> {
        if self.session.is_loading {
            return Err(StepOutcome::skipped("A generation step is already running"));
        }
        let step = match kind {
            StepKind::Advance => {
                if self.session.source_text.trim().is_empty() {
                    return Err(StepOutcome::skipped("Source text is empty"));
                }
                self.plan_advance()
                    .ok_or_else(|| StepOutcome::skipped("Workflow is complete"))?
            }
            StepKind::Polish => {
                if self.session.target_text.trim().is_empty() {
                    return Err(StepOutcome::skipped("Target text is empty"));
                }
                self.plan_polish()
            }
        };

        match &step.commit {
            Commit::Advance { from, next, .. } => {
                info!(from = %from, to = %next, mode = %step.request.mode, "Advancing workflow");
            }
            Commit::Polish => info!(stage = %self.session.stage, "Polishing target text"),
        }
        self.session.is_loading = true;
        self.session.last_error = None;
        Ok(step)
    }

    /// Complete a step started with [`Self::begin`]. On failure the stage
    /// and all artifacts are left as they were and `last_error` carries
    /// the message.
    pub fn finish(
        &mut self,
        step: PendingStep,
        result: Result<GenerationResult, GenerationError>,
    ) -> StepOutcome {
        self.session.is_loading = false;
        let text = match result {
            Ok(generated) => generated.text,
            Err(e) => return self.fail(e),
        };

        match step.commit {
            Commit::Advance {
                from,
                next,
                committed_edit,
            } => {
                if self.session.stage != from {
                    warn!(expected = %from, actual = %self.session.stage, "Session moved during step; result discarded");
                    return StepOutcome::skipped("Session changed while the step was running");
                }
                self.commit_advance(from, next, committed_edit, text);
                StepOutcome::Advanced { stage: next }
            }
            Commit::Polish => {
                self.set_target_text(text);
                StepOutcome::Polished
            }
        }
    }

    /// Run the generation step for the current stage.
    ///
    /// Skips when the source is empty, the workflow is complete, or a step
    /// is already in flight.
    pub async fn advance(&mut self) -> StepOutcome {
        self.run(StepKind::Advance).await
    }

    /// Refine the current target text, at any stage.
    pub async fn polish(&mut self) -> StepOutcome {
        self.run(StepKind::Polish).await
    }

    async fn run(&mut self, kind: StepKind) -> StepOutcome {
        let step = match self.begin(kind) {
            Ok(step) => step,
            Err(outcome) => return outcome,
        };
        let result = self.generator.generate(step.request()).await;
        self.finish(step, result)
    }

    fn commit_advance(
        &mut self,
        from: Stage,
        next: Stage,
        committed_edit: Option<String>,
        output: String,
    ) {
        match from {
            Stage::Idle => {
                self.session.background_summary = output.clone();
                self.session.global_context = output.clone();
                self.persist(SessionField::BackgroundSummary, &output);
                self.persist(SessionField::Context, &output);
            }
            Stage::InsightDone => {
                let summary = committed_edit.unwrap_or_default();
                self.session.background_summary = summary.clone();
                self.session.global_context = summary.clone();
                self.session.layman_logic = output.clone();
                self.persist(SessionField::BackgroundSummary, &summary);
                self.persist(SessionField::Context, &summary);
                self.persist(SessionField::LaymanLogic, &output);
            }
            Stage::Deconstructed => {
                let logic = committed_edit.unwrap_or_default();
                self.session.layman_logic = logic.clone();
                self.persist(SessionField::LaymanLogic, &logic);
            }
            Stage::Reconstructed => {}
        }
        self.session.target_text = output;
        self.session.stage = next;
        self.persist(SessionField::TargetText, &self.session.target_text);
        self.persist(SessionField::Stage, &next.to_string());
    }

    /// Clear the session and its persisted fields. Credentials survive.
    pub fn reset(&mut self) {
        self.session = Session::default();
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
        info!("Session reset");
    }

    fn fail(&mut self, error: GenerationError) -> StepOutcome {
        let message = error.to_string();
        warn!(stage = %self.session.stage, "Generation step failed: {}", message);
        self.session.last_error = Some(message.clone());
        StepOutcome::Failed { message }
    }

    fn persist(&self, field: SessionField, value: &str) {
        if let Err(e) = self.store.save(field, value) {
            warn!(field = field.key(), "Failed to persist session field: {}", e);
        }
    }
}
