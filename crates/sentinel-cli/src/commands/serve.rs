//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use sentinel_core::Config;
use sentinel_server::AppState;

use super::load_seed;

pub async fn cmd_serve(
    config: Config,
    host: &str,
    port: u16,
    seed: Option<&Path>,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Sentinel web server...");
    println!("   Listening: http://{}:{}", host, port);
    if let Some(path) = seed {
        println!("   Seed data: {}", path.display());
    }
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    println!(
        "   Session TTL: {}s (header {})",
        config.server.session_ttl_secs,
        sentinel_server::SESSION_HEADER
    );
    if config.server.allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!("   CORS: {}", config.server.allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let seed = seed.map(load_seed).transpose()?;
    let state = AppState::from_config(config, seed).context("Failed to set up bank providers")?;

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    sentinel_server::serve(state, host, port, static_dir_str).await?;

    Ok(())
}
