//! Config command implementation

use std::path::Path;

use anyhow::Result;
use sentinel_core::config::default_config_path;
use sentinel_core::Config;

pub fn cmd_config(config: &Config, explicit_path: Option<&Path>) -> Result<()> {
    let source = match explicit_path {
        Some(p) => p.display().to_string(),
        None => match default_config_path() {
            Some(p) if p.exists() => p.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };

    println!("# Source: {} (plus environment overrides)", source);
    print!("{}", config.masked().to_toml()?);
    Ok(())
}
