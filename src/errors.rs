//! Typed error hierarchy for LinguaFlow.
//!
//! Three top-level enums cover the three subsystems:
//! - `GenerationError`: validation, credential and upstream backend failures
//! - `StoreError`: session persistence failures
//! - `ConfigError`: invalid configuration values
//!
//! Oversized document input is not an error: see [`TruncationNotice`].

use thiserror::Error;

/// Errors from building or executing a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Missing or empty required input. Never reaches the backend.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The credential was missing or rejected.
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// The backend call failed or returned no usable text.
    #[error("{0}")]
    Upstream(String),
}

impl GenerationError {
    pub fn is_auth(&self) -> bool {
        matches!(self, GenerationError::Auth(_))
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Upstream(err.to_string())
    }
}

/// Errors from the session persistence port.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access session file at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file at {path} is not valid JSON: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session store lock poisoned")]
    LockPoisoned,
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

/// Informational: the document handed to context inference was cut down to
/// the sample limit before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationNotice {
    pub original_chars: usize,
    pub kept_chars: usize,
}

impl std::fmt::Display for TruncationNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Document truncated from {} to {} characters for context inference",
            self.original_chars, self.kept_chars
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_preserves_message_verbatim() {
        let err = GenerationError::Upstream("HTTP 503: model overloaded".into());
        assert_eq!(err.to_string(), "HTTP 503: model overloaded");
    }

    #[test]
    fn generation_error_variants_are_distinct() {
        let auth = GenerationError::Auth("Invalid passphrase".into());
        let validation = GenerationError::Validation("Missing text".into());
        assert!(auth.is_auth());
        assert!(!validation.is_auth());
        assert!(matches!(validation, GenerationError::Validation(_)));
        assert!(!matches!(auth, GenerationError::Upstream(_)));
    }

    #[test]
    fn store_error_io_carries_path() {
        let path = std::path::PathBuf::from("/tmp/.linguaflow/session.json");
        let err = StoreError::Io {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        match &err {
            StoreError::Io { path: p, source } => {
                assert_eq!(p, &path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Io"),
        }
        assert!(err.to_string().contains("session.json"));
    }

    #[test]
    fn config_error_invalid_value_names_key() {
        let err = ConfigError::InvalidValue {
            key: "server.port".into(),
            message: "must be non-zero".into(),
        };
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn truncation_notice_reports_both_lengths() {
        let notice = TruncationNotice {
            original_chars: 60_000,
            kept_chars: 50_000,
        };
        let text = notice.to_string();
        assert!(text.contains("60000"));
        assert!(text.contains("50000"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&GenerationError::Upstream("x".into()));
        assert_std_error(&StoreError::LockPoisoned);
        assert_std_error(&ConfigError::MissingApiKey);
    }
}
