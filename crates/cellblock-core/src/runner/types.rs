//! Types for running the child interpreter

use std::path::PathBuf;
use std::time::Duration;

use crate::environment::Entrypoint;
use crate::limits::LimitPlan;

/// Everything needed to run one child process
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Interpreter executable
    pub program: PathBuf,
    /// Interpreter arguments
    pub args: Vec<String>,
    /// Complete child environment
    pub env: Vec<(String, String)>,
    /// Child working directory
    pub working_dir: PathBuf,
    /// Text written to the child's stdin
    pub stdin: String,
    /// Wall-clock timeout
    pub timeout: Duration,
    /// Maximum bytes kept per output stream
    pub max_output_bytes: usize,
    /// OS limits applied in the child
    pub limits: LimitPlan,
}

impl RunSpec {
    /// Build a spec from a prepared entrypoint
    pub fn new(entrypoint: Entrypoint, timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            program: entrypoint.program,
            args: entrypoint.args,
            env: entrypoint.env,
            working_dir: entrypoint.working_dir,
            stdin: String::new(),
            timeout,
            max_output_bytes,
            limits: LimitPlan::default(),
        }
    }

    /// Set the stdin text
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Set the limit plan
    pub fn with_limits(mut self, limits: LimitPlan) -> Self {
        self.limits = limits;
        self
    }
}

/// Outcome of one child process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutput {
    /// Exit code; -1 on timeout or host failure, -signal when killed by a signal
    pub exit_code: i32,
    /// Captured stdout, at most `max_output_bytes`
    pub stdout: String,
    /// Captured stderr, at most `max_output_bytes` plus any appended notice
    pub stderr: String,
    /// The wall-clock timeout fired
    pub timed_out: bool,
    /// Output beyond the bound was discarded
    pub truncated: bool,
    /// Bytes the child wrote to stdout, including discarded ones
    pub stdout_bytes: usize,
    /// Bytes the child wrote to stderr, including discarded ones
    pub stderr_bytes: usize,
    /// Host-side failure (spawn, pipe I/O); the child may never have run
    pub error: Option<String>,
    /// Time from spawn to reap
    pub duration: Duration,
}

impl RunOutput {
    /// Output for a run that failed on the host side
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            exit_code: -1,
            stderr: format!("Execution error: {}", message),
            error: Some(message),
            ..Default::default()
        }
    }

    /// Whether the child exited with status 0
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out && self.error.is_none()
    }
}
