//! The `quizrunner serve` command.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::load_config_from;
use crate::server;

pub async fn execute(
    root: Option<PathBuf>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let root = root.unwrap_or(config.server.root);
    let port = port.unwrap_or(config.server.port);
    server::serve(root, port).await
}
