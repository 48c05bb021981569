//! Tests for the process runner, driven through `sh`.

use super::*;
use crate::limits::{ResourceLimiter, ResourceLimits};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn sh(dir: &TempDir, script: &str) -> RunSpec {
    RunSpec {
        program: "/bin/sh".into(),
        args: vec!["-c".to_string(), script.to_string()],
        env: vec![("PATH".to_string(), "/usr/bin:/bin".to_string())],
        working_dir: dir.path().to_path_buf(),
        stdin: String::new(),
        timeout: Duration::from_secs(10),
        max_output_bytes: 64 * 1024,
        limits: Default::default(),
    }
}

#[tokio::test]
async fn test_captures_stdout() {
    let dir = TempDir::new().unwrap();
    let output = ProcessRunner::new().run(sh(&dir, "printf hello")).await;

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.stdout, "hello");
    assert!(output.succeeded());
    assert!(!output.truncated);
}

#[tokio::test]
async fn test_forwards_stdin() {
    let dir = TempDir::new().unwrap();
    let spec = sh(&dir, "cat").with_stdin("line one\nline two\n");
    let output = ProcessRunner::new().run(spec).await;

    assert_eq!(output.stdout, "line one\nline two\n");
}

#[tokio::test]
async fn test_child_ignoring_stdin_still_finishes() {
    let dir = TempDir::new().unwrap();
    let spec = sh(&dir, "echo done").with_stdin("x".repeat(256 * 1024));
    let output = ProcessRunner::new().run(spec).await;

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.stdout, "done\n");
}

#[tokio::test]
async fn test_nonzero_exit_and_stderr() {
    let dir = TempDir::new().unwrap();
    let output = ProcessRunner::new()
        .run(sh(&dir, "echo oops >&2; exit 3"))
        .await;

    assert_eq!(output.exit_code, 3);
    assert_eq!(output.stderr, "oops\n");
    assert!(!output.succeeded());
    assert!(output.error.is_none());
}

#[tokio::test]
async fn test_timeout_kills_child() {
    let dir = TempDir::new().unwrap();
    let mut spec = sh(&dir, "echo started; sleep 30");
    spec.timeout = Duration::from_millis(300);

    let start = Instant::now();
    let output = ProcessRunner::new().run(spec).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(output.timed_out);
    assert_eq!(output.exit_code, -1);
    assert_eq!(output.stderr, "Code execution timed out after 0.3 seconds");
    assert_eq!(output.stdout, "started\n");
}

#[tokio::test]
async fn test_timeout_kills_background_descendants() {
    let dir = TempDir::new().unwrap();
    // The background sleep inherits the output pipes
    let mut spec = sh(&dir, "sleep 30 & sleep 30");
    spec.timeout = Duration::from_millis(300);

    let start = Instant::now();
    let output = ProcessRunner::new().run(spec).await;

    assert!(output.timed_out);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_output_is_bounded() {
    let dir = TempDir::new().unwrap();
    let script = "i=0; while [ $i -lt 2000 ]; do echo 0123456789012345678901234567890123456789; i=$((i+1)); done";
    let mut spec = sh(&dir, script);
    spec.max_output_bytes = 1000;

    let output = ProcessRunner::new().run(spec).await;

    assert_eq!(output.exit_code, 0);
    assert!(output.truncated);
    assert_eq!(output.stdout.len(), 1000);
    // 2000 lines of 40 digits and a newline
    assert_eq!(output.stdout_bytes, 82_000);
    assert_eq!(output.stderr_bytes, 0);
}

#[tokio::test]
async fn test_signal_exit() {
    let dir = TempDir::new().unwrap();
    let output = ProcessRunner::new().run(sh(&dir, "kill -9 $$")).await;

    assert_eq!(output.exit_code, -9);
    assert!(output.stderr.contains("Terminated by signal 9"));
}

#[tokio::test]
async fn test_file_size_limit_applies() {
    let dir = TempDir::new().unwrap();
    let limits = ResourceLimits {
        max_file_size_bytes: Some(4096),
        ..ResourceLimits::unlimited()
    };
    let spec = sh(&dir, "head -c 100000 /dev/zero > big.bin")
        .with_limits(ResourceLimiter::plan(&limits));

    let output = ProcessRunner::new().run(spec).await;

    assert_ne!(output.exit_code, 0);
    let written = std::fs::metadata(dir.path().join("big.bin"))
        .map(|m| m.len())
        .unwrap_or(0);
    assert!(written <= 4096);
}

#[tokio::test]
async fn test_environment_is_cleared() {
    let dir = TempDir::new().unwrap();
    let output = ProcessRunner::new()
        .run(sh(&dir, "echo ${HOME:-unset}"))
        .await;

    assert_eq!(output.stdout, "unset\n");
}

#[tokio::test]
async fn test_runs_in_working_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let output = ProcessRunner::new().run(sh(&dir, "cat marker.txt")).await;

    assert_eq!(output.stdout, "here");
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut spec = sh(&dir, "true");
    spec.program = "/nonexistent/cellblock-interpreter".into();

    let output = ProcessRunner::new().run(spec).await;

    assert_eq!(output.exit_code, -1);
    assert!(output.error.is_some());
    assert!(output.stderr.starts_with("Execution error: "));
}

#[tokio::test]
async fn test_mock_runner() {
    let mut runner = MockCodeRunner::new();
    runner.expect_run().times(1).returning(|spec| RunOutput {
        stdout: spec.stdin,
        ..Default::default()
    });

    let dir = TempDir::new().unwrap();
    let output = runner.run(sh(&dir, "ignored").with_stdin("echo")).await;
    assert_eq!(output.stdout, "echo");
}
