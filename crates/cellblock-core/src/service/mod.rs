//! Execution service.
//!
//! [`ExecutionService`] is the public entry point. Each request passes
//! through input checks and the static analyzer, then gets its own scratch
//! directory and child process, and ends as an [`ExecutionResult`] appended
//! to the history store. `execute` never returns an error: every failure is
//! encoded in the result.

mod analysis;
mod examples;
mod types;

pub use examples::code_examples;
pub use types::{
    ANONYMOUS_USER, CodeExample, Difficulty, ExecutionPayload, ExecutionResult, ResourceUsage,
    SecurityLevel,
};

use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

use crate::analyzer::{SecurityVerdict, StaticAnalyzer};
use crate::config::ExecutionConfig;
use crate::environment::SandboxEnvironment;
use crate::error::CellblockResult;
use crate::history::{InMemoryHistory, SharedHistory};
use crate::limits::ResourceLimiter;
use crate::report::SecurityReporter;
use crate::runner::{CodeRunner, ProcessRunner, RunOutput, RunSpec, truncate_utf8};
use crate::violations::{SharedViolationStore, Violation, ViolationStore, ViolationType};

/// Runs untrusted code and keeps a bounded history of the results
pub struct ExecutionService {
    config: Arc<ExecutionConfig>,
    analyzer: StaticAnalyzer,
    environment: SandboxEnvironment,
    runner: Arc<dyn CodeRunner>,
    history: SharedHistory,
    violations: SharedViolationStore,
}

impl std::fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionService")
            .field("rule_set", &self.config.analysis.rule_set)
            .field("interpreter", &self.environment.interpreter())
            .field("history_len", &self.history.len())
            .field("violations", &self.violations.total_count())
            .finish()
    }
}

impl ExecutionService {
    /// Create a service with the default runner and in-memory stores
    pub fn new(config: ExecutionConfig) -> CellblockResult<Self> {
        Self::builder(config).build()
    }

    /// Start building a service with injected collaborators
    pub fn builder(config: ExecutionConfig) -> ExecutionServiceBuilder {
        ExecutionServiceBuilder::new(config)
    }

    /// Shared configuration
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Violation store fed by rejected requests
    pub fn violations(&self) -> &SharedViolationStore {
        &self.violations
    }

    /// Reporter over this service's history and violations
    pub fn reporter(&self) -> SecurityReporter {
        SecurityReporter::new(Arc::clone(&self.history), Arc::clone(&self.violations))
    }

    /// Run the static analyzer only
    pub fn check(&self, source: &str) -> SecurityVerdict {
        self.analyzer.check(source)
    }

    /// Execute a wire payload
    pub async fn execute_payload(&self, payload: &ExecutionPayload) -> ExecutionResult {
        self.execute(&payload.code, &payload.inputs, &payload.user_id)
            .await
    }

    /// Execute untrusted source with the given stdin on behalf of a user
    #[instrument(skip(self, source, stdin), fields(code_length = source.len()))]
    pub async fn execute(&self, source: &str, stdin: &str, user_id: &str) -> ExecutionResult {
        let start = Instant::now();
        tracing::info!("Code execution requested");

        let result = self
            .execute_inner(source, stdin, user_id)
            .await
            .with_elapsed(start.elapsed());

        tracing::info!(
            success = result.success,
            exit_code = result.exit_code,
            security_level = result.security_level.as_str(),
            execution_time = result.execution_time_seconds,
            "Code execution finished"
        );
        self.history.append(result.clone());
        result
    }

    async fn execute_inner(&self, source: &str, stdin: &str, user_id: &str) -> ExecutionResult {
        let code_length = source.len();

        if source.trim().is_empty() {
            return ExecutionResult::error(user_id, code_length, "No code provided");
        }

        if stdin.len() > self.config.max_stdin_bytes {
            let message = format!(
                "Input too large: {} bytes exceeds limit of {} bytes",
                stdin.len(),
                self.config.max_stdin_bytes
            );
            tracing::warn!("{}", message);
            self.violations.record(Violation::new(
                ViolationType::OversizedInput,
                message.clone(),
                format!("{} bytes", stdin.len()),
                user_id,
            ));
            return ExecutionResult::blocked(user_id, code_length, message);
        }

        let verdict = self.analyzer.check(source);
        if !verdict.safe {
            let message = verdict.message().to_string();
            tracing::warn!(severity = verdict.severity.as_str(), "Security violation: {}", message);
            if let Some(violation_type) = verdict.violation_type {
                self.violations.record(
                    Violation::new(
                        violation_type,
                        message.clone(),
                        verdict.trigger.clone().unwrap_or_default(),
                        user_id,
                    )
                    .with_severity(verdict.severity),
                );
            }
            return ExecutionResult::blocked(user_id, code_length, message);
        }

        let output = match self.run_sandboxed(source, stdin).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Sandbox setup failed: {}", e);
                return ExecutionResult::error(
                    user_id,
                    code_length,
                    format!("Execution failed: {}", e),
                );
            }
        };

        if let Some(error) = &output.error {
            tracing::error!("Sandboxed process failed: {}", error);
            return ExecutionResult {
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
                ..ExecutionResult::error(user_id, code_length, String::new())
            };
        }

        self.complete(output, user_id, code_length)
    }

    /// Scratch directory, launcher, limits and child process for one request
    async fn run_sandboxed(&self, source: &str, stdin: &str) -> CellblockResult<RunOutput> {
        let handle = self.environment.create()?;
        self.environment.write_source(&handle, source).await?;
        self.environment.write_launcher(&handle).await?;

        let plan = ResourceLimiter::plan(&self.config.limits);
        let spec = RunSpec::new(
            self.environment.entrypoint(&handle),
            self.config.max_wall_time,
            self.config.max_output_bytes,
        )
        .with_stdin(stdin)
        .with_limits(plan);

        let output = self.runner.run(spec).await;
        handle.cleanup();
        Ok(output)
    }

    fn complete(&self, mut output: RunOutput, user_id: &str, code_length: usize) -> ExecutionResult {
        let resource_usage = ResourceUsage {
            execution_time: output.duration.as_secs_f64(),
            output_size: output.stdout_bytes.max(output.stdout.len()),
            error_size: output.stderr_bytes.max(output.stderr.len()),
        };
        let max = self.config.max_output_bytes;
        output.truncated |= truncate_utf8(&mut output.stdout, max);
        output.truncated |= truncate_utf8(&mut output.stderr, max);

        let warnings = analysis::warnings(&output, output.duration, self.config.max_wall_time);
        if output.timed_out {
            tracing::warn!("Code execution timed out");
        }

        ExecutionResult {
            success: output.succeeded(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            security_level: analysis::level(&warnings),
            timed_out: output.timed_out,
            warnings,
            resource_usage,
            ..ExecutionResult::completed(user_id, code_length)
        }
    }

    /// Results of one user, most recent first, at most `limit`
    pub fn history(&self, user_id: &str, limit: usize) -> Vec<ExecutionResult> {
        self.history.query_by_user(user_id, limit)
    }

    /// Results of all users, most recent first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<ExecutionResult> {
        self.history.recent(limit)
    }

    /// Built-in example programs
    pub fn code_examples(&self) -> Vec<CodeExample> {
        code_examples()
    }
}

/// Builder for [`ExecutionService`]
pub struct ExecutionServiceBuilder {
    config: ExecutionConfig,
    runner: Option<Arc<dyn CodeRunner>>,
    history: Option<SharedHistory>,
    violations: Option<SharedViolationStore>,
}

impl ExecutionServiceBuilder {
    fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            runner: None,
            history: None,
            violations: None,
        }
    }

    /// Use a different code runner
    pub fn runner(mut self, runner: Arc<dyn CodeRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Use a different history store
    pub fn history(mut self, history: SharedHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Use a different violation store
    pub fn violations(mut self, violations: SharedViolationStore) -> Self {
        self.violations = Some(violations);
        self
    }

    /// Validate the configuration and build the service
    pub fn build(self) -> CellblockResult<ExecutionService> {
        self.config.validate()?;
        let analyzer = StaticAnalyzer::new(&self.config)?;
        let environment = SandboxEnvironment::new(&self.config);

        let history = self
            .history
            .unwrap_or_else(|| Arc::new(InMemoryHistory::new(self.config.history_capacity)));
        let violations = self
            .violations
            .unwrap_or_else(|| ViolationStore::shared(self.config.max_violations));
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(ProcessRunner::new()));

        tracing::debug!(
            rule_set = self.config.analysis.rule_set.as_str(),
            interpreter = ?environment.interpreter(),
            "execution service ready"
        );

        Ok(ExecutionService {
            config: Arc::new(self.config),
            analyzer,
            environment,
            runner,
            history,
            violations,
        })
    }
}
