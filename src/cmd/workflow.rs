//! Workflow commands: `linguaflow workflow`.

use anyhow::{Result, bail};
use console::style;
use std::path::Path;
use std::sync::Arc;

use linguaflow::workflow::{SessionEdits, StepOutcome, WorkflowController, WorkflowSnapshot};

use super::{generator_for, load_config, read_document, remote_generator, session_store};
use crate::{RemoteArgs, WorkflowCommands};

pub async fn cmd_workflow(
    project_dir: &Path,
    command: WorkflowCommands,
    remote: &RemoteArgs,
) -> Result<()> {
    let config = load_config(project_dir)?;

    let snapshot = match &remote.server {
        Some(server) => {
            let client = remote_generator(&config, server, remote.passphrase.as_deref())?;
            match command {
                WorkflowCommands::Status => client.workflow_status().await?,
                WorkflowCommands::Advance => client.workflow_action("advance").await?,
                WorkflowCommands::Polish => client.workflow_action("polish").await?,
                WorkflowCommands::Reset => client.workflow_action("reset").await?,
                set @ WorkflowCommands::Set { .. } => client.workflow_edit(&edits_from(set)?).await?,
            }
        }
        None => {
            let generator = generator_for(&config, &RemoteArgs::default())?;
            let mut controller =
                WorkflowController::restore(generator, Arc::new(session_store(&config)));
            match command {
                WorkflowCommands::Status => controller.snapshot(None),
                WorkflowCommands::Advance => {
                    let outcome = controller.advance().await;
                    controller.snapshot(Some(outcome))
                }
                WorkflowCommands::Polish => {
                    let outcome = controller.polish().await;
                    controller.snapshot(Some(outcome))
                }
                WorkflowCommands::Reset => {
                    controller.reset();
                    controller.snapshot(None)
                }
                set @ WorkflowCommands::Set { .. } => {
                    controller.apply_edits(edits_from(set)?);
                    controller.snapshot(None)
                }
            }
        }
    };

    print_snapshot(&snapshot);

    if let Some(StepOutcome::Failed { message }) = snapshot.outcome {
        bail!("Workflow step failed: {}", message);
    }
    Ok(())
}

fn edits_from(command: WorkflowCommands) -> Result<SessionEdits> {
    let WorkflowCommands::Set {
        source_file,
        source,
        target_file,
        style,
        no_purpose,
    } = command
    else {
        return Ok(SessionEdits::default());
    };

    let source_text = match (source_file, source) {
        (Some(path), _) => Some(read_document(&path)?),
        (None, source) => source,
    };
    let target_text = target_file.map(|path| read_document(&path)).transpose()?;
    let purpose = if no_purpose {
        Some(None)
    } else {
        style.purpose.map(Some)
    };

    let edits = SessionEdits {
        source_text,
        target_text,
        audience: style.audience,
        context: style.context,
        purpose,
    };
    if edits.is_empty() {
        bail!("Nothing to set; pass at least one field (see `linguaflow workflow set --help`)");
    }
    Ok(edits)
}

fn print_snapshot(snapshot: &WorkflowSnapshot) {
    let session = &snapshot.session;

    match &snapshot.outcome {
        Some(StepOutcome::Advanced { stage }) => {
            println!("{} Advanced to {}", style("✓").green(), style(stage).cyan());
        }
        Some(StepOutcome::Polished) => println!("{} Target text polished", style("✓").green()),
        Some(StepOutcome::Skipped { reason }) => {
            println!("{} Skipped: {}", style("!").yellow(), reason);
        }
        Some(StepOutcome::Failed { message }) => {
            println!("{} {}", style("✗").red(), style(message).red());
        }
        None => {}
    }

    println!(
        "Stage {}/3  {}  {}",
        session.stage.step(),
        style(session.stage).cyan().bold(),
        style(format!("next: {}", session.stage.next_action())).dim()
    );
    println!(
        "Audience: {}   Purpose: {}",
        session.audience().unwrap_or("(none)"),
        session.text_purpose.map(|p| p.label()).unwrap_or("(none)")
    );
    println!(
        "Source:  {}",
        preview(&session.source_text).unwrap_or_else(|| "(empty)".to_string())
    );
    if let Some(context) = preview(&session.global_context) {
        println!("Context: {}", context);
    }
    if let Some(error) = &session.last_error {
        println!("{} {}", style("Last error:").red(), error);
    }

    if !session.target_text.trim().is_empty() {
        println!();
        println!("{}", style("── Target ──").bold());
        println!("{}", session.target_text);
    }
}

/// First line, cut to 72 characters.
fn preview(text: &str) -> Option<String> {
    let line = text.lines().find(|l| !l.trim().is_empty())?.trim();
    let mut short: String = line.chars().take(72).collect();
    if short.len() < line.len() {
        short.push('…');
    }
    Some(short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StyleArgs;
    use linguaflow::Purpose;

    #[test]
    fn test_preview_cuts_long_first_line() {
        let long = "x".repeat(100);
        let shown = preview(&format!("\n{}\nsecond", long)).unwrap();
        assert_eq!(shown.chars().count(), 73);
        assert!(shown.ends_with('…'));
        assert_eq!(preview("  \n "), None);
    }

    #[test]
    fn test_edits_from_set_requires_a_field() {
        let empty = WorkflowCommands::Set {
            source_file: None,
            source: None,
            target_file: None,
            style: StyleArgs::default(),
            no_purpose: false,
        };
        assert!(edits_from(empty).is_err());
    }

    #[test]
    fn test_edits_from_set_maps_purpose() {
        let set = WorkflowCommands::Set {
            source_file: None,
            source: Some("原文".into()),
            target_file: None,
            style: StyleArgs {
                purpose: Some(Purpose::Expressive),
                ..StyleArgs::default()
            },
            no_purpose: false,
        };
        let edits = edits_from(set).unwrap();
        assert_eq!(edits.source_text.as_deref(), Some("原文"));
        assert_eq!(edits.purpose, Some(Some(Purpose::Expressive)));

        let cleared = WorkflowCommands::Set {
            source_file: None,
            source: None,
            target_file: None,
            style: StyleArgs::default(),
            no_purpose: true,
        };
        assert_eq!(edits_from(cleared).unwrap().purpose, Some(None));
    }
}
