//! HTTP client for a running linguaflow server.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::errors::GenerationError;
use crate::generation::TextGenerator;
use crate::workflow::{SessionEdits, WorkflowSnapshot};
use linguaflow_common::{ContextRequest, ContextResponse, GenerationRequest, GenerationResult};

/// Error body returned by the server: `{ message, error? }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// A [`TextGenerator`] backed by `POST /api/generate` on a remote server.
#[derive(Debug, Clone)]
pub struct RemoteGenerator {
    client: Client,
    base_url: String,
    passphrase: Option<String>,
}

impl RemoteGenerator {
    pub fn new(
        base_url: impl Into<String>,
        passphrase: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linguaflow/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            passphrase: passphrase.filter(|p| !p.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send<B, R>(&self, method: reqwest::Method, path: &str, body: Option<&B>) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%method, url, "Calling linguaflow server");

        let mut builder = self.client.request(method, &url);
        if let Some(passphrase) = &self.passphrase {
            builder = builder.header("Authorization", format!("Bearer {}", passphrase));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &text);
            error!(url, %status, "Server call failed: {}", err);
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| {
            GenerationError::Upstream(format!("Malformed response from server: {}", e))
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    /// Infer a background paragraph for a document via `POST /api/context`.
    pub async fn infer_context(&self, full_text: &str) -> Result<String, GenerationError> {
        let request = ContextRequest {
            full_text: Some(full_text.to_string()),
        };
        let response: ContextResponse = self.post("context", &request).await?;
        Ok(response.context)
    }

    /// Check the passphrase against `POST /api/verify`.
    ///
    /// A rejected passphrase is `Ok(false)`; transport failures are errors.
    pub async fn verify_passphrase(&self) -> Result<bool, GenerationError> {
        match self.post::<_, VerifyResponse>("verify", &serde_json::json!({})).await {
            Ok(response) => Ok(response.valid),
            Err(e) if e.is_auth() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn workflow_status(&self) -> Result<WorkflowSnapshot, GenerationError> {
        self.send::<(), _>(reqwest::Method::GET, "workflow", None).await
    }

    pub async fn workflow_edit(&self, edits: &SessionEdits) -> Result<WorkflowSnapshot, GenerationError> {
        self.send(reqwest::Method::PUT, "workflow", Some(edits)).await
    }

    /// Run `advance`, `polish` or `reset` on the server-held session.
    pub async fn workflow_action(&self, action: &str) -> Result<WorkflowSnapshot, GenerationError> {
        self.post(&format!("workflow/{}", action), &serde_json::json!({}))
            .await
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        self.post("generate", request).await
    }
}

/// Map a non-2xx server response onto the error taxonomy.
fn error_from_response(status: StatusCode, body: &str) -> GenerationError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message,
            error: Some(detail),
        }) => format!("{}: {}", message, detail),
        Ok(ErrorBody { message, error: None }) => message,
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    };
    match status {
        StatusCode::UNAUTHORIZED => GenerationError::Auth(message),
        StatusCode::BAD_REQUEST => GenerationError::Validation(message),
        _ => GenerationError::Upstream(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_auth() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, r#"{"message":"Unauthorized"}"#);
        assert_eq!(err, GenerationError::Auth("Unauthorized".into()));
        assert!(err.is_auth());
    }

    #[test]
    fn test_bad_request_maps_to_validation() {
        let err = error_from_response(StatusCode::BAD_REQUEST, r#"{"message":"Missing text"}"#);
        assert_eq!(err, GenerationError::Validation("Missing text".into()));
    }

    #[test]
    fn test_server_error_keeps_upstream_detail() {
        let err = error_from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"Failed to generate translation","error":"quota exceeded"}"#,
        );
        assert_eq!(
            err,
            GenerationError::Upstream("Failed to generate translation: quota exceeded".into())
        );
    }

    #[test]
    fn test_non_json_body_falls_back_to_status() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err, GenerationError::Upstream("HTTP 502 Bad Gateway".into()));

        let err = error_from_response(StatusCode::BAD_GATEWAY, "proxy down");
        assert_eq!(
            err,
            GenerationError::Upstream("HTTP 502 Bad Gateway: proxy down".into())
        );
    }

    #[test]
    fn test_url_joins_api_prefix() {
        let remote =
            RemoteGenerator::new("http://localhost:8080/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(remote.url("generate"), "http://localhost:8080/api/generate");
        assert_eq!(remote.url("workflow/advance"), "http://localhost:8080/api/workflow/advance");
    }

    #[test]
    fn test_empty_passphrase_is_not_sent() {
        let remote = RemoteGenerator::new(
            "http://localhost:8080",
            Some(String::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(remote.passphrase.is_none());
    }
}
