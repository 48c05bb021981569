//! Cellblock Core Library
//!
//! Runs untrusted Python source in a child interpreter with a denylist
//! analyzer in front, a stripped builtin namespace inside, OS resource limits
//! around it and a wall-clock timeout enforced by killing the process group.
//!
//! This is not an isolation boundary. Hostile input should additionally be
//! confined by the operating system (containers, seccomp, namespaces).

pub mod analyzer;
pub mod config;
pub mod environment;
pub mod error;
pub mod history;
pub mod limits;
pub mod report;
pub mod runner;
pub mod service;
pub mod violations;

// Re-export commonly used types
pub use analyzer::{SecurityVerdict, StaticAnalyzer};
pub use config::{AnalysisConfig, EnvironmentConfig, ExecutionConfig, RuleSet};
pub use environment::{SandboxEnvironment, SandboxHandle};
pub use error::{CellblockError, CellblockResult};
pub use history::{HistoryStore, InMemoryHistory, SharedHistory};
pub use limits::{LimitPlan, ResourceLimiter, ResourceLimits};
pub use report::{RiskLevel, SecurityReport, SecurityReporter};
pub use runner::{CodeRunner, ProcessRunner, RunOutput, RunSpec};
pub use service::{
    CodeExample, ExecutionPayload, ExecutionResult, ExecutionService, ExecutionServiceBuilder,
    ResourceUsage, SecurityLevel,
};
pub use violations::{Severity, Violation, ViolationStore, ViolationType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
