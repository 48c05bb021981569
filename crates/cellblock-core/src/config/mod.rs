//! Execution configuration.
//!
//! One `ExecutionConfig` is built per service instance and shared read-only
//! by every concurrent execution.

mod defaults;
mod mode;

pub use mode::RuleSet;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CellblockError, CellblockResult};
use crate::limits::ResourceLimits;
use defaults::{
    default_blocked_callables, default_blocked_modules, default_blocked_text_patterns,
    default_preload_modules, default_stripped_builtins, default_suspicious_patterns,
};

/// Smallest accepted wall-clock timeout
pub const MIN_WALL_TIME: Duration = Duration::from_millis(100);

/// Complete configuration of the execution service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Wall-clock timeout for one execution
    #[serde(with = "humantime_serde")]
    pub max_wall_time: Duration,

    /// OS-level limits applied to the child process
    pub limits: ResourceLimits,

    /// Maximum bytes kept per output stream
    pub max_output_bytes: usize,

    /// Maximum accepted source size in bytes
    pub max_source_bytes: usize,

    /// Maximum accepted stdin size in bytes
    pub max_stdin_bytes: usize,

    /// Static analysis rules
    pub analysis: AnalysisConfig,

    /// Child interpreter and launcher settings
    pub environment: EnvironmentConfig,

    /// Number of results kept in the execution history
    pub history_capacity: usize,

    /// Number of violations kept for reporting
    pub max_violations: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_wall_time: Duration::from_secs(5),
            limits: ResourceLimits::default(),
            max_output_bytes: 5 * 1024 * 1024,
            max_source_bytes: 64 * 1024,
            max_stdin_bytes: 64 * 1024,
            analysis: AnalysisConfig::default(),
            environment: EnvironmentConfig::default(),
            history_capacity: 100,
            max_violations: 1000,
        }
    }
}

/// Static analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Which layers run
    pub rule_set: RuleSet,

    /// Modules whose import is rejected
    pub blocked_modules: Vec<String>,

    /// Builtins whose call is rejected
    pub blocked_callables: Vec<String>,

    /// Additional regexes rejected anywhere in the source
    pub blocked_text_patterns: Vec<String>,

    /// Deepest accepted leading whitespace, in columns
    pub max_indent_columns: usize,

    /// Longest accepted line, in characters
    pub max_line_length: usize,

    /// Most accepted `def` statements
    pub max_function_defs: usize,

    /// Suspicious-content heuristics
    pub suspicious_patterns: Vec<SuspiciousPattern>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rule_set: RuleSet::default(),
            blocked_modules: default_blocked_modules(),
            blocked_callables: default_blocked_callables(),
            blocked_text_patterns: default_blocked_text_patterns(),
            max_indent_columns: 20,
            max_line_length: 200,
            max_function_defs: 10,
            suspicious_patterns: default_suspicious_patterns(),
        }
    }
}

/// A heuristic regex with the message reported when it matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousPattern {
    pub pattern: String,
    pub message: String,
}

impl SuspiciousPattern {
    pub fn new(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// Child interpreter and restricted launcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Interpreter executable, resolved through PATH when not absolute
    pub interpreter: String,

    /// Directory under which scratch directories are created (system temp when unset)
    pub scratch_root: Option<PathBuf>,

    /// Recursion limit set inside the child before user code runs
    pub recursion_limit: u32,

    /// Builtins removed from the user namespace
    pub stripped_builtins: Vec<String>,

    /// Modules imported before the module table is neutered
    pub preload_modules: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            scratch_root: None,
            recursion_limit: 100,
            stripped_builtins: default_stripped_builtins(),
            preload_modules: default_preload_modules(),
        }
    }
}

impl EnvironmentConfig {
    /// Root directory for scratch directories
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl ExecutionConfig {
    /// Configuration with only the denylist layers enabled
    pub fn basic() -> Self {
        let mut config = Self::default();
        config.analysis.rule_set = RuleSet::Basic;
        config
    }

    /// Set the wall-clock timeout
    pub fn with_wall_time(mut self, timeout: Duration) -> Self {
        self.max_wall_time = timeout;
        self
    }

    /// Set the per-stream output bound
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Set the scratch root
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.environment.scratch_root = Some(root.into());
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.environment.interpreter = interpreter.into();
        self
    }

    /// Load configuration from a file
    ///
    /// TOML, YAML and JSON are selected by file extension (JSON otherwise).
    /// The result is validated before it is returned.
    pub fn load(path: &Path) -> CellblockResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CellblockError::config_at(format!("Failed to read config file: {}", e), path)
        })?;

        let config: ExecutionConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                CellblockError::config_at(format!("Failed to parse TOML config: {}", e), path)
            })?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                CellblockError::config_at(format!("Failed to parse YAML config: {}", e), path)
            })?,
            _ => serde_json::from_str(&content).map_err(|e| {
                CellblockError::config_at(format!("Failed to parse JSON config: {}", e), path)
            })?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file is missing
    pub fn load_or_default(path: &Path) -> CellblockResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Check configuration invariants
    pub fn validate(&self) -> CellblockResult<()> {
        if self.max_wall_time < MIN_WALL_TIME {
            return Err(CellblockError::InvalidConfig(format!(
                "max_wall_time must be at least {:?}, got {:?}",
                MIN_WALL_TIME, self.max_wall_time
            )));
        }

        let sizes = [
            ("max_output_bytes", self.max_output_bytes),
            ("max_source_bytes", self.max_source_bytes),
            ("max_stdin_bytes", self.max_stdin_bytes),
            ("history_capacity", self.history_capacity),
            ("max_violations", self.max_violations),
            ("analysis.max_indent_columns", self.analysis.max_indent_columns),
            ("analysis.max_line_length", self.analysis.max_line_length),
            ("analysis.max_function_defs", self.analysis.max_function_defs),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(CellblockError::InvalidConfig(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        self.limits.validate()?;

        if self.environment.recursion_limit == 0 {
            return Err(CellblockError::InvalidConfig(
                "environment.recursion_limit must be greater than zero".to_string(),
            ));
        }
        if self.environment.interpreter.trim().is_empty() {
            return Err(CellblockError::InvalidConfig(
                "environment.interpreter must not be empty".to_string(),
            ));
        }

        // Names are rendered into the launcher script verbatim
        let names = self
            .analysis
            .blocked_modules
            .iter()
            .chain(&self.environment.stripped_builtins)
            .chain(&self.environment.preload_modules);
        for name in names {
            if !is_python_name(name) {
                return Err(CellblockError::InvalidConfig(format!(
                    "'{}' is not a valid Python module or builtin name",
                    name
                )));
            }
        }

        if let Some(name) = self
            .analysis
            .blocked_callables
            .iter()
            .find(|name| name.trim().is_empty())
        {
            return Err(CellblockError::InvalidConfig(format!(
                "blocked callable '{}' must not be blank",
                name
            )));
        }

        for pattern in &self.analysis.blocked_text_patterns {
            regex::Regex::new(pattern)?;
        }
        for heuristic in &self.analysis.suspicious_patterns {
            regex::Regex::new(&heuristic.pattern)?;
        }

        Ok(())
    }
}

/// Dotted Python identifier, e.g. `os` or `os.path`
fn is_python_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        })
}
