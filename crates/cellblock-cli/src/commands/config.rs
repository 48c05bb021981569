//! Configuration management commands

use anyhow::{Context, Result, bail};
use cellblock_core::ExecutionConfig;
use std::path::Path;

/// Print the effective configuration as TOML
pub fn show(config_file: &Path) -> Result<()> {
    if !config_file.exists() {
        tracing::info!(
            "Configuration file not found: {}, using defaults",
            config_file.display()
        );
    }
    let config = ExecutionConfig::load_or_default(config_file)?;
    print!("{}", render(&config)?);
    Ok(())
}

/// Validate a configuration file
pub fn validate(config_file: &Path) -> Result<()> {
    if !config_file.exists() {
        bail!("Configuration file not found: {}", config_file.display());
    }

    let config = ExecutionConfig::load(config_file)?;
    println!("Configuration is valid: {}", config_file.display());
    println!("  rule set: {}", config.analysis.rule_set.as_str());
    println!("  wall time: {:?}", config.max_wall_time);
    println!("  blocked modules: {}", config.analysis.blocked_modules.len());
    println!("  blocked callables: {}", config.analysis.blocked_callables.len());
    Ok(())
}

fn render(config: &ExecutionConfig) -> Result<String> {
    toml::to_string_pretty(config).context("serializing configuration")
}
