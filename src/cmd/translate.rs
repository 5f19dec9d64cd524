//! One-shot commands: `linguaflow translate`, `infer-context`, `audiences`.

use anyhow::{Context, Result, bail};
use console::style;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;

use linguaflow::AUDIENCE_SUGGESTIONS;
use linguaflow::context::ContextInferenceService;
use linguaflow::errors::GenerationError;
use linguaflow::generation::GeminiBackend;
use linguaflow::workflow::{SessionEdits, WorkflowController};
use linguaflow::{GenerationRequest, Mode, Purpose};

use super::{generator_for, load_config, one_shot_mode, read_document, remote_generator, session_store};
use crate::{RemoteArgs, StyleArgs};

pub async fn cmd_translate(
    project_dir: &Path,
    text: Option<&str>,
    file: Option<&Path>,
    mode: Mode,
    style_args: &StyleArgs,
    remote: &RemoteArgs,
) -> Result<()> {
    let mode = one_shot_mode(mode)?;
    let config = load_config(project_dir)?;

    let input = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => read_document(path)?,
        (None, None) => read_stdin()?,
    };
    if input.trim().is_empty() {
        bail!(GenerationError::Validation("Missing text".to_string()));
    }

    let generator = generator_for(&config, remote)?;
    let request = GenerationRequest::new(mode, input)
        .with_audience(style_args.audience.as_deref())
        .with_context(style_args.context.as_deref())
        .with_purpose(Some(style_args.purpose.unwrap_or_default()));

    let result = generator.generate(&request).await?;
    println!("{}", result.text);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}

pub async fn cmd_infer_context(
    project_dir: &Path,
    file: &Path,
    save: bool,
    remote: &RemoteArgs,
) -> Result<()> {
    let config = load_config(project_dir)?;
    let document = read_document(file)?;

    let summary = match &remote.server {
        Some(server) => {
            remote_generator(&config, server, remote.passphrase.as_deref())?
                .infer_context(&document)
                .await?
        }
        None => {
            let backend = GeminiBackend::new(config.gemini_config()?)
                .context("Failed to create Gemini client")?;
            let inferred = ContextInferenceService::new(Arc::new(backend))
                .infer(&document)
                .await?;
            if let Some(notice) = inferred.truncation {
                eprintln!("{} {}", style("note:").yellow(), notice);
            }
            inferred.summary
        }
    };

    println!("{}", summary);

    if save {
        let edits = SessionEdits {
            context: Some(summary),
            ..SessionEdits::default()
        };
        match &remote.server {
            Some(server) => {
                remote_generator(&config, server, remote.passphrase.as_deref())?
                    .workflow_edit(&edits)
                    .await?;
            }
            None => {
                let generator = generator_for(&config, remote)?;
                let mut controller =
                    WorkflowController::restore(generator, Arc::new(session_store(&config)));
                controller.apply_edits(edits);
            }
        }
        eprintln!("{} Saved as workflow context", style("✓").green());
    }
    Ok(())
}

pub fn cmd_audiences() {
    println!("{}", style("Suggested audiences").bold());
    for audience in AUDIENCE_SUGGESTIONS {
        println!("  - {}", audience);
    }
    println!();
    println!("{}", style("Purposes").bold());
    for purpose in Purpose::ALL {
        println!(
            "  {:<12} {}",
            purpose.wire_name().to_ascii_lowercase(),
            style(purpose.description()).dim()
        );
    }
}
