//! Line-delimited JSON front end
//!
//! Each stdin line is an `ExecutionPayload`; each stdout line is the matching
//! `ExecutionResult`. Malformed lines produce an error result instead of
//! stopping the loop. A security report is logged at end of input.

use anyhow::Result;
use cellblock_core::service::ANONYMOUS_USER;
use cellblock_core::{ExecutionPayload, ExecutionResult, ExecutionService};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::load_service;

pub async fn serve_json(config_file: &Path) -> Result<()> {
    let service = load_service(config_file)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = handle_line(&service, &line).await;
        let mut encoded = serde_json::to_string(&result)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    let report = service.reporter().report(None);
    tracing::info!(
        total_executions = report.total_executions,
        violation_count = report.violation_count,
        blocked_count = report.blocked_count,
        risk_level = ?report.risk_level,
        "Session security report"
    );
    Ok(())
}

async fn handle_line(service: &ExecutionService, line: &str) -> ExecutionResult {
    match serde_json::from_str::<ExecutionPayload>(line) {
        Ok(payload) => service.execute_payload(&payload).await,
        Err(e) => {
            tracing::warn!("Rejected malformed request: {}", e);
            ExecutionResult::error(ANONYMOUS_USER, 0, format!("Invalid request: {}", e))
        }
    }
}
