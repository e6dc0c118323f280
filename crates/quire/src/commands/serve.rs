//! Development server command.

use std::path::PathBuf;

use anyhow::Result;
use quire_server::{DevServer, DevServerConfig};

/// Run the serve command.
pub async fn run(
    source: PathBuf,
    destination: PathBuf,
    host: String,
    port: u16,
    live_reload: bool,
) -> Result<()> {
    tracing::info!("Starting development server on port {}", port);

    let config = DevServerConfig {
        source_dir: source,
        output_dir: destination,
        port,
        host,
        live_reload,
    };

    DevServer::new(config).start().await?;

    Ok(())
}
