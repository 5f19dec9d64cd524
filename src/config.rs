//! Layered configuration for LinguaFlow.
//!
//! Settings are read from `.linguaflow/linguaflow.toml` in the project
//! directory, then overridden by environment variables, then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! body_limit_bytes = 10485760
//!
//! [generation]
//! base_url = "https://generativelanguage.googleapis.com/v1beta"
//! fast_model = "gemini-2.5-flash-lite"
//! quality_model = "gemini-2.5-pro"
//! timeout_secs = 120
//!
//! [workflow]
//! session_file = "session.json"
//! debounce_ms = 1000
//! ```
//!
//! Secrets never live in the file: `GEMINI_API_KEY` and `PASSPHRASE` come
//! from the environment (a `.env` file is honoured by the binary).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::generation::GeminiConfig;
use linguaflow_common::ModelTier;

pub const CONFIG_DIR: &str = ".linguaflow";
pub const CONFIG_FILE: &str = "linguaflow.toml";

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body; whole documents are posted for
    /// context inference.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for literal translation drafts
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Model used for polishing, insight, deconstruction and reconstruction
    #[serde(default = "default_quality_model")]
    pub quality_model: String,
    /// Transport timeout for a single backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_fast_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_quality_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fast_model: default_fast_model(),
            quality_model: default_quality_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Workflow session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSection {
    /// Session file name, relative to the `.linguaflow` directory
    #[serde(default = "default_session_file")]
    pub session_file: String,
    /// Debounce window for the live one-shot mode
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_session_file() -> String {
    "session.json".to_string()
}

fn default_debounce_ms() -> u64 {
    1000
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// The complete linguaflow.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinguaToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub generation: GenerationSection,
    #[serde(default)]
    pub workflow: WorkflowSection,
}

impl LinguaToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `<dir>/linguaflow.toml`, or defaults when the file is absent.
    pub fn load_or_default(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize linguaflow.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Port, with `PORT` taking precedence over the file.
    pub fn port(&self) -> u16 {
        std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.server.port)
    }

    /// Model name for a tier (env → file → default).
    pub fn model_for(&self, tier: ModelTier) -> String {
        match tier {
            ModelTier::Fast => std::env::var("LINGUAFLOW_FAST_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.generation.fast_model.clone()),
            ModelTier::Quality => std::env::var("LINGUAFLOW_QUALITY_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.generation.quality_model.clone()),
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; the OS will pick a random port".to_string());
        }
        if !(800..=1000).contains(&self.workflow.debounce_ms) {
            warnings.push(format!(
                "workflow.debounce_ms = {} is outside the recommended 800-1000 ms window",
                self.workflow.debounce_ms
            ));
        }

        warnings
    }

    /// Reject values no command can run with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.generation.timeout_secs == 0 {
            return Err(invalid("generation.timeout_secs", "must be at least 1 second"));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(invalid("server.body_limit_bytes", "must be non-zero"));
        }
        if !self.generation.base_url.starts_with("http://")
            && !self.generation.base_url.starts_with("https://")
        {
            return Err(invalid(
                "generation.base_url",
                &format!("'{}' is not an http(s) URL", self.generation.base_url),
            ));
        }
        if self.workflow.session_file.trim().is_empty() {
            return Err(invalid("workflow.session_file", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Effective configuration: linguaflow.toml merged with environment and CLI.
#[derive(Debug, Clone)]
pub struct LinguaConfig {
    pub project_dir: PathBuf,
    /// The `.linguaflow` directory
    pub config_dir: PathBuf,
    pub toml: LinguaToml,
    cli_port: Option<u16>,
    cli_host: Option<String>,
}

impl LinguaConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = LinguaToml::load_or_default(&config_dir)?;
        toml.check()?;
        Ok(Self {
            project_dir,
            config_dir,
            toml,
            cli_port: None,
            cli_host: None,
        })
    }

    /// Apply CLI overrides for the server address.
    pub fn with_server_args(mut self, port: Option<u16>, host: Option<String>) -> Self {
        self.cli_port = port;
        self.cli_host = host;
        self
    }

    /// Port (CLI → env → file → default).
    pub fn port(&self) -> u16 {
        self.cli_port.unwrap_or_else(|| self.toml.port())
    }

    pub fn host(&self) -> String {
        self.cli_host
            .clone()
            .unwrap_or_else(|| self.toml.server.host.clone())
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn session_file(&self) -> PathBuf {
        self.config_dir.join(&self.toml.workflow.session_file)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.toml.workflow.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.generation.timeout_secs)
    }

    /// API key for the generation backend.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Connection settings for the Gemini backend.
    pub fn gemini_config(&self) -> Result<GeminiConfig, ConfigError> {
        Ok(GeminiConfig {
            api_key: self.api_key()?,
            base_url: self.toml.generation.base_url.clone(),
            fast_model: self.toml.model_for(ModelTier::Fast),
            quality_model: self.toml.model_for(ModelTier::Quality),
            timeout: self.request_timeout(),
        })
    }

    /// Server passphrase. `None` disables authentication.
    pub fn passphrase(&self) -> Option<String> {
        std::env::var("PASSPHRASE").ok().filter(|p| !p.is_empty())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if self.api_key().is_err() {
            warnings.push("GEMINI_API_KEY is not set; local generation will fail".to_string());
        }
        if self.passphrase().is_none() {
            warnings.push("PASSPHRASE is not set; the server will accept unauthenticated requests".to_string());
        }
        warnings
    }
}

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
