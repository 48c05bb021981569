//! Request and result types of the execution service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User id recorded when the caller supplies none
pub const ANONYMOUS_USER: &str = "anonymous";

/// Overall safety assessment of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// Ran with no warnings
    Safe,
    /// Ran with one or two warnings
    Warning,
    /// Ran with three or more warnings
    HighRisk,
    /// Rejected before running
    Blocked,
    /// The host failed to run it
    Error,
}

impl SecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Safe => "safe",
            SecurityLevel::Warning => "warning",
            SecurityLevel::HighRisk => "high_risk",
            SecurityLevel::Blocked => "blocked",
            SecurityLevel::Error => "error",
        }
    }
}

/// Wire form of an execution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    /// Source to run
    pub code: String,
    /// Text fed to the program's stdin
    #[serde(default)]
    pub inputs: String,
    /// Submitting user
    #[serde(default = "anonymous_user")]
    pub user_id: String,
}

fn anonymous_user() -> String {
    ANONYMOUS_USER.to_string()
}

impl ExecutionPayload {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            inputs: String::new(),
            user_id: anonymous_user(),
        }
    }
}

/// Outcome of one execution request, immutable once returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Unique id of this execution
    pub id: Uuid,
    /// The code ran and exited with status 0
    pub success: bool,
    /// Captured stdout, bounded by `max_output_bytes`
    pub stdout: String,
    /// Captured stderr, or the reason the code did not run
    pub stderr: String,
    /// Process exit code; -1 when the code did not run to completion
    pub exit_code: i32,
    /// Wall-clock seconds spent on the whole request
    pub execution_time_seconds: f64,
    /// Safety assessment
    pub security_level: SecurityLevel,
    /// Analyzer or input rejection message
    pub violation: Option<String>,
    /// The wall-clock timeout fired
    pub timed_out: bool,
    /// Post-execution warnings
    pub warnings: Vec<String>,
    /// When the result was produced
    pub timestamp: DateTime<Utc>,
    /// Submitting user
    pub user_id: String,
    /// Length of the submitted source in bytes
    pub code_length: usize,
    /// Time and output volume of the run
    #[serde(default)]
    pub resource_usage: ResourceUsage,
}

/// Resources consumed by one run
///
/// Sizes count every byte the child wrote, including bytes dropped by the
/// output bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Seconds from spawn to reap
    pub execution_time: f64,
    /// Bytes written to stdout
    pub output_size: usize,
    /// Bytes written to stderr
    pub error_size: usize,
}

impl ExecutionResult {
    fn base(user_id: &str, code_length: usize, security_level: SecurityLevel) -> Self {
        Self {
            id: Uuid::new_v4(),
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: -1,
            execution_time_seconds: 0.0,
            security_level,
            violation: None,
            timed_out: false,
            warnings: Vec::new(),
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
            code_length,
            resource_usage: ResourceUsage::default(),
        }
    }

    /// Result for code rejected before execution
    pub fn blocked(user_id: &str, code_length: usize, violation: impl Into<String>) -> Self {
        let violation = violation.into();
        Self {
            stderr: format!("Security violation: {}", violation),
            violation: Some(violation),
            ..Self::base(user_id, code_length, SecurityLevel::Blocked)
        }
    }

    /// Result for a request the host could not carry out
    pub fn error(user_id: &str, code_length: usize, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            ..Self::base(user_id, code_length, SecurityLevel::Error)
        }
    }

    /// Result for code that ran
    pub fn completed(user_id: &str, code_length: usize) -> Self {
        Self::base(user_id, code_length, SecurityLevel::Safe)
    }

    /// Set the elapsed time
    pub fn with_elapsed(mut self, elapsed: std::time::Duration) -> Self {
        self.execution_time_seconds = elapsed.as_secs_f64();
        self
    }

    /// Whether the code was rejected before running
    pub fn is_blocked(&self) -> bool {
        self.security_level == SecurityLevel::Blocked
    }
}

/// How far along a learner should be for an example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
}

/// A built-in example program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    pub title: String,
    pub description: String,
    pub code: String,
    pub difficulty: Difficulty,
}
