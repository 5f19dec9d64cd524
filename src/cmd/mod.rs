//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                               |
//! |-------------|------------------------------------------------|
//! | `serve`     | `Serve`                                        |
//! | `translate` | `Translate`, `InferContext`, `Audiences`       |
//! | `workflow`  | `Workflow`                                     |
//! | `live`      | `Live`                                         |
//! | `auth`      | `Verify`, `Logout`                             |
//! | `config`    | `Config`                                       |

pub mod auth;
pub mod config;
pub mod live;
pub mod serve;
pub mod translate;
pub mod workflow;

pub use auth::{cmd_logout, cmd_verify};
pub use config::cmd_config;
pub use live::cmd_live;
pub use serve::cmd_serve;
pub use translate::{cmd_audiences, cmd_infer_context, cmd_translate};
pub use workflow::cmd_workflow;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use linguaflow::config::LinguaConfig;
use linguaflow::errors::GenerationError;
use linguaflow::generation::{GeminiBackend, GenerationClient, TextGenerator};
use linguaflow::remote::RemoteGenerator;
use linguaflow::workflow::{FileSessionStore, SessionField, SessionStore};
use linguaflow::{GenerationRequest, GenerationResult, Mode};

use super::RemoteArgs;

/// Extensions read as plain text. Anything else is refused.
const TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "markdown", "text"];

pub(crate) fn load_config(project_dir: &Path) -> Result<LinguaConfig> {
    let config = LinguaConfig::new(project_dir.to_path_buf())?;
    for warning in config.toml.validate() {
        tracing::warn!("{}", warning);
    }
    Ok(config)
}

pub(crate) fn session_store(config: &LinguaConfig) -> FileSessionStore {
    FileSessionStore::new(config.session_file())
}

/// Read a document as plain text.
pub(crate) fn read_document(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if let Some(ext) = extension.as_deref()
        && !TEXT_EXTENSIONS.contains(&ext)
    {
        bail!(GenerationError::Validation(format!(
            "Unsupported document format '.{}'; only plain-text files are accepted",
            ext
        )));
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Restrict a mode to the one-shot pathways.
pub(crate) fn one_shot_mode(mode: Mode) -> Result<Mode> {
    match mode {
        Mode::Translate | Mode::Proofread | Mode::Polish => Ok(mode),
        other => bail!(GenerationError::Validation(format!(
            "{} is a workflow stage; use `linguaflow workflow advance`",
            other
        ))),
    }
}

pub(crate) fn remote_generator(
    config: &LinguaConfig,
    server: &str,
    passphrase: Option<&str>,
) -> Result<RemoteGenerator> {
    let passphrase = match passphrase {
        Some(p) => Some(p.to_string()),
        None => session_store(config)
            .load()
            .ok()
            .and_then(|fields| fields.get(&SessionField::Passphrase).cloned()),
    };
    RemoteGenerator::new(server, passphrase, config.request_timeout())
        .context("Failed to create server client")
}

/// Pick the generator: a remote server when `--server` is given, the local
/// Gemini backend otherwise.
pub(crate) fn generator_for(
    config: &LinguaConfig,
    remote: &RemoteArgs,
) -> Result<Arc<dyn TextGenerator>> {
    if let Some(server) = &remote.server {
        return Ok(Arc::new(remote_generator(
            config,
            server,
            remote.passphrase.as_deref(),
        )?));
    }
    match config.gemini_config() {
        Ok(gemini) => {
            let backend = GeminiBackend::new(gemini).context("Failed to create Gemini client")?;
            Ok(Arc::new(GenerationClient::new(Arc::new(backend))))
        }
        Err(e) => Ok(Arc::new(UnconfiguredGenerator {
            reason: e.to_string(),
        })),
    }
}

/// Stands in for the backend when no API key is configured, so commands
/// that never generate (status, set, reset) still work.
struct UnconfiguredGenerator {
    reason: String,
}

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResult, GenerationError> {
        Err(GenerationError::Upstream(self.reason.clone()))
    }
}
