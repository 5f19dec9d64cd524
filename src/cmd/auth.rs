//! Server credential commands: `linguaflow verify`, `linguaflow logout`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::Path;

use linguaflow::remote::RemoteGenerator;
use linguaflow::workflow::{SessionField, SessionStore};

use super::{load_config, session_store};

pub async fn cmd_verify(project_dir: &Path, server: &str, passphrase: &str) -> Result<()> {
    let config = load_config(project_dir)?;
    let client = RemoteGenerator::new(server, Some(passphrase.to_string()), config.request_timeout())
        .context("Failed to create server client")?;

    if !client.verify_passphrase().await? {
        bail!("Passphrase rejected by {}", server);
    }

    session_store(&config)
        .save(SessionField::Passphrase, passphrase)
        .context("Failed to save passphrase")?;
    println!("{} Passphrase accepted by {}", style("✓").green(), server);
    Ok(())
}

pub fn cmd_logout(project_dir: &Path) -> Result<()> {
    let config = load_config(project_dir)?;
    session_store(&config)
        .remove(SessionField::Passphrase)
        .context("Failed to remove saved passphrase")?;
    println!("Saved passphrase removed.");
    Ok(())
}
