//! CLI commands

pub mod config;
pub mod examples;
pub mod run;
pub mod serve;

use anyhow::{Context, Result};
use cellblock_core::{ExecutionConfig, ExecutionService};
use std::io::Read;
use std::path::Path;

/// Load the configuration file (defaults when missing) and build a service
pub fn load_service(config_file: &Path) -> Result<ExecutionService> {
    let config = ExecutionConfig::load_or_default(config_file)
        .with_context(|| format!("loading {}", config_file.display()))?;
    Ok(ExecutionService::new(config)?)
}

/// Read source from a file, or from stdin when `file` is `-`
pub fn read_source(file: &str) -> Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("reading source from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file))
}

/// Print a value as one line of JSON, or indented when `pretty`
pub fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_service_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let service = load_service(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(service.config().history_capacity, 100);
    }

    #[test]
    fn test_load_service_rejects_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cellblock.toml");
        std::fs::write(&path, "max_wall_time = \"1ms\"\n").unwrap();
        assert!(load_service(&path).is_err());
    }

    #[test]
    fn test_read_source_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "print(1)\n").unwrap();
        assert_eq!(read_source(path.to_str().unwrap()).unwrap(), "print(1)\n");
        assert!(read_source("/nonexistent/main.py").is_err());
    }
}
