//! Debounced live mode: `linguaflow live`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use linguaflow::Mode;
use linguaflow::debounce::{LiveInput, LiveTranslator, LiveUpdate};

use super::{generator_for, load_config, one_shot_mode};
use crate::{RemoteArgs, StyleArgs};

pub async fn cmd_live(
    project_dir: &Path,
    mode: Mode,
    style_args: &StyleArgs,
    remote: &RemoteArgs,
) -> Result<()> {
    let mode = one_shot_mode(mode)?;
    let config = load_config(project_dir)?;
    let generator = generator_for(&config, remote)?;
    let (mut live, mut updates) = LiveTranslator::new(generator, mode, config.debounce_window())?;

    eprintln!(
        "{}",
        style(format!(
            "{} live mode: each line replaces the input; Ctrl+D to finish",
            mode
        ))
        .dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let mut awaiting = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.context("Failed to read stdin")? {
                    Some(text) => {
                        live.edit(LiveInput {
                            text,
                            audience: style_args.audience.clone(),
                            context: style_args.context.clone(),
                            purpose: Some(style_args.purpose.unwrap_or_default()),
                        });
                        awaiting = true;
                    }
                    None => {
                        input_open = false;
                        if !awaiting {
                            break;
                        }
                    }
                }
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                let is_latest = update.seq == live.last_seq();
                print_update(update);
                if is_latest {
                    awaiting = false;
                    if !input_open {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_update(update: LiveUpdate) {
    match update.result {
        Ok(text) if text.is_empty() => eprintln!("{}", style("(cleared)").dim()),
        Ok(text) => {
            eprintln!("{}", style(format!("── #{} ──", update.seq)).dim());
            println!("{}", text);
        }
        Err(e) => eprintln!("{} {}", style("✗").red(), e),
    }
}
