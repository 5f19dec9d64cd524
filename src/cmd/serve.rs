//! HTTP server command: `linguaflow serve`.

use anyhow::Result;
use std::path::Path;

use linguaflow::server::{self, ServerConfig};

pub async fn cmd_serve(project_dir: &Path, port: Option<u16>, host: Option<String>) -> Result<()> {
    let config = super::load_config(project_dir)?.with_server_args(port, host);
    let state = server::build_state(&config)?;
    server::start_server(ServerConfig::from(&config), state).await
}
