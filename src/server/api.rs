use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::context::ContextInferenceService;
use crate::errors::GenerationError;
use crate::generation::TextGenerator;
use crate::workflow::{SessionEdits, StepKind, WorkflowController, WorkflowSnapshot};
use linguaflow_common::{
    ContextRequest, ContextResponse, GenerationRequest, GenerationResult, Mode, Purpose,
};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub context: ContextInferenceService,
    pub workflow: Mutex<WorkflowController>,
    /// `None` disables authentication.
    pub passphrase: Option<String>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

/// `POST /api/generate` body. Fields are loosely typed so that missing or
/// unknown values produce a 400 with a useful message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub text: Option<String>,
    pub mode: Option<String>,
    pub target_audience: Option<String>,
    pub context: Option<String>,
    pub purpose: Option<String>,
}

impl GenerateBody {
    fn into_request(self) -> Result<GenerationRequest, ApiError> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Missing text".into()))?;
        let mode = self
            .mode
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Invalid mode".into()))
            .and_then(|m| {
                Mode::from_wire(m).ok_or_else(|| ApiError::BadRequest(format!("Invalid mode: {}", m)))
            })?;
        let purpose = match self.purpose.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(p) => Some(
                Purpose::from_str(p)
                    .map_err(|_| ApiError::BadRequest(format!("Invalid purpose: {}", p)))?,
            ),
        };
        Ok(GenerationRequest::new(mode, text)
            .with_audience(self.target_audience.as_deref())
            .with_context(self.context.as_deref())
            .with_purpose(purpose))
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    /// Upstream failure: a fixed summary plus the underlying message.
    Upstream { message: &'static str, detail: String },
}

impl ApiError {
    fn from_generation(summary: &'static str, err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(msg) => ApiError::BadRequest(msg),
            GenerationError::Auth(_) => ApiError::Unauthorized,
            GenerationError::Upstream(detail) => ApiError::Upstream {
                message: summary,
                detail,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({"message": msg}))
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({"message": "Unauthorized"}),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({"message": msg})),
            ApiError::Upstream { message, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"message": message, "error": detail}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

/// Routes mounted under `/api`. Authentication is layered on by the caller.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/context", post(infer_context))
        .route("/verify", post(verify))
        .route("/workflow", get(workflow_status).put(workflow_edit))
        .route("/workflow/advance", post(workflow_advance))
        .route("/workflow/polish", post(workflow_polish))
        .route("/workflow/reset", post(workflow_reset))
}

pub async fn health_check() -> &'static str {
    "ok"
}

// ── Generation ────────────────────────────────────────────────────────

async fn generate(
    State(state): State<SharedState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerationResult>, ApiError> {
    let Json(body) = body?;
    let request = body.into_request()?;
    debug!(mode = %request.mode, chars = request.text.chars().count(), "Generate request");

    state.generator.generate(&request).await.map(Json).map_err(|e| {
        error!(mode = %request.mode, "Generation failed: {}", e);
        ApiError::from_generation("Failed to generate translation", e)
    })
}

async fn infer_context(
    State(state): State<SharedState>,
    body: Result<Json<ContextRequest>, JsonRejection>,
) -> Result<Json<ContextResponse>, ApiError> {
    let Json(body) = body?;
    let full_text = body.full_text.unwrap_or_default();

    let inferred = state.context.infer(&full_text).await.map_err(|e| {
        error!("Context inference failed: {}", e);
        ApiError::from_generation("Failed to infer context", e)
    })?;
    Ok(Json(ContextResponse {
        context: inferred.summary,
    }))
}

async fn verify() -> Json<serde_json::Value> {
    Json(serde_json::json!({"valid": true}))
}

// ── Workflow ──────────────────────────────────────────────────────────

async fn workflow_status(State(state): State<SharedState>) -> Json<WorkflowSnapshot> {
    let controller = state.workflow.lock().await;
    Json(controller.snapshot(None))
}

async fn workflow_edit(
    State(state): State<SharedState>,
    body: Result<Json<SessionEdits>, JsonRejection>,
) -> Result<Json<WorkflowSnapshot>, ApiError> {
    let Json(edits) = body?;
    let mut controller = state.workflow.lock().await;
    ensure_idle(&controller)?;
    controller.apply_edits(edits);
    Ok(Json(controller.snapshot(None)))
}

async fn workflow_advance(
    State(state): State<SharedState>,
) -> Result<Json<WorkflowSnapshot>, ApiError> {
    run_step(state, StepKind::Advance).await
}

async fn workflow_polish(
    State(state): State<SharedState>,
) -> Result<Json<WorkflowSnapshot>, ApiError> {
    run_step(state, StepKind::Polish).await
}

async fn workflow_reset(State(state): State<SharedState>) -> Result<Json<WorkflowSnapshot>, ApiError> {
    let mut controller = state.workflow.lock().await;
    ensure_idle(&controller)?;
    controller.reset();
    Ok(Json(controller.snapshot(None)))
}

/// Start a step under the lock, generate without it, then commit under
/// the lock again. Status reads in between see `isLoading: true`.
///
/// The generation and commit run on their own task and complete even if
/// the client disconnects.
async fn run_step(state: SharedState, kind: StepKind) -> Result<Json<WorkflowSnapshot>, ApiError> {
    let (step, generator) = {
        let mut controller = state.workflow.lock().await;
        ensure_idle(&controller)?;
        match controller.begin(kind) {
            Ok(step) => (step, controller.generator()),
            Err(outcome) => return Ok(Json(controller.snapshot(Some(outcome)))),
        }
    };

    let task_state = Arc::clone(&state);
    let task = tokio::spawn(async move {
        let result = generator.generate(step.request()).await;
        let mut controller = task_state.workflow.lock().await;
        let outcome = controller.finish(step, result);
        controller.snapshot(Some(outcome))
    });

    task.await.map(Json).map_err(|e| {
        error!("Workflow step task failed: {}", e);
        ApiError::Upstream {
            message: "Workflow step did not complete",
            detail: e.to_string(),
        }
    })
}

/// Generation steps never queue behind one another, and the session is
/// not edited while one is in flight.
fn ensure_idle(controller: &WorkflowController) -> Result<(), ApiError> {
    if controller.session().is_loading {
        return Err(ApiError::Conflict("A generation step is already running".into()));
    }
    Ok(())
}
