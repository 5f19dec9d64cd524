//! Configuration view and validation commands: `linguaflow config`.

use anyhow::Result;
use console::style;
use std::path::Path;

use linguaflow::ModelTier;
use linguaflow::config::{LinguaConfig, LinguaToml};

use crate::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config = LinguaConfig::new(project_dir.to_path_buf())?;
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", style("LinguaFlow Configuration").bold());
            println!("========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No linguaflow.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[server]");
            println!("  host = \"{}\"", toml.server.host);
            println!("  port = {}", toml.server.port);
            println!("  body_limit_bytes = {}", toml.server.body_limit_bytes);
            println!();
            println!("[generation]");
            println!("  base_url = \"{}\"", toml.generation.base_url);
            println!("  fast_model = \"{}\"", toml.generation.fast_model);
            println!("  quality_model = \"{}\"", toml.generation.quality_model);
            println!("  timeout_secs = {}", toml.generation.timeout_secs);
            println!();
            println!("[workflow]");
            println!("  session_file = \"{}\"", toml.workflow.session_file);
            println!("  debounce_ms = {}", toml.workflow.debounce_ms);
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  address = {}:{}", config.host(), config.port());
            println!("  fast_model = \"{}\"", toml.model_for(ModelTier::Fast));
            println!("  quality_model = \"{}\"", toml.model_for(ModelTier::Quality));
            println!("  session_file = {}", config.session_file().display());
            println!("  GEMINI_API_KEY = {}", mask(config.api_key().ok().as_deref()));
            println!("  PASSPHRASE = {}", mask(config.passphrase().as_deref()));
            println!();

            if !config_path.exists() {
                println!("Run 'linguaflow config init' to create a linguaflow.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("linguaflow.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config.config_dir)?;
            LinguaToml::default().save(&config_path)?;

            println!("Created linguaflow.toml at {}", config_path.display());
            println!();
            println!("Secrets stay in the environment (or .env):");
            println!("  - GEMINI_API_KEY for the generation backend");
            println!("  - PASSPHRASE to require authentication on the server");
            println!();
        }
    }

    Ok(())
}

/// Show whether a secret is set without revealing it.
fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(s) if s.chars().count() > 4 => {
            let tail: String = s.chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
        Some(_) => "****".to_string(),
        None => "(not set)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_secret() {
        assert_eq!(mask(None), "(not set)");
        assert_eq!(mask(Some("abc")), "****");
        assert_eq!(mask(Some("sk-123456")), "****56");
    }
}
