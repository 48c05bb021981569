//! One-shot execution and analysis commands

use anyhow::Result;
use std::path::Path;

use super::{load_service, print_json, read_source};

/// Execute a source file and print the result
pub async fn run(config_file: &Path, file: &str, stdin: &str, user: &str, pretty: bool) -> Result<()> {
    let service = load_service(config_file)?;
    let source = read_source(file)?;

    let result = service.execute(&source, stdin, user).await;
    print_json(&result, pretty)
}

/// Print the static analyzer verdict for a source file
pub fn check(config_file: &Path, file: &str) -> Result<()> {
    let service = load_service(config_file)?;
    let source = read_source(file)?;

    let verdict = service.check(&source);
    print_json(&verdict, true)
}
