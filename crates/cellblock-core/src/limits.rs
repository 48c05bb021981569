//! OS resource limits for the sandboxed child process
//!
//! Limits are planned in the parent, where failures can be logged, and
//! applied in the child between fork and exec, so they bind the child only.
//! This is a cooperative control: a child can still burn wall-clock time
//! until the runner's timeout fires.

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{CellblockError, CellblockResult};

/// Resource limits for sandboxed execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Address-space ceiling in bytes (RLIMIT_AS)
    pub max_memory_bytes: Option<u64>,

    /// CPU time ceiling in seconds (RLIMIT_CPU)
    pub max_cpu_seconds: Option<u64>,

    /// Largest file the child may create in bytes (RLIMIT_FSIZE)
    pub max_file_size_bytes: Option<u64>,

    /// Process ceiling for the child's user (RLIMIT_NPROC)
    pub max_processes: Option<u64>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_memory_bytes: Some(128 * 1024 * 1024),   // 128 MB
            max_cpu_seconds: Some(10),                   // 10 seconds
            max_file_size_bytes: Some(10 * 1024 * 1024), // 10 MB
            max_processes: Some(64),
        }
    }
}

impl ResourceLimits {
    /// Create strict resource limits
    pub fn strict() -> Self {
        Self {
            max_memory_bytes: Some(64 * 1024 * 1024), // 64 MB
            max_cpu_seconds: Some(2),
            max_file_size_bytes: Some(1024 * 1024), // 1 MB
            max_processes: Some(16),
        }
    }

    /// Create unlimited resource limits (no restrictions)
    pub fn unlimited() -> Self {
        Self {
            max_memory_bytes: None,
            max_cpu_seconds: None,
            max_file_size_bytes: None,
            max_processes: None,
        }
    }

    /// Reject zero-valued limits
    pub fn validate(&self) -> CellblockResult<()> {
        let fields = [
            ("limits.max_memory_bytes", self.max_memory_bytes),
            ("limits.max_cpu_seconds", self.max_cpu_seconds),
            ("limits.max_file_size_bytes", self.max_file_size_bytes),
            ("limits.max_processes", self.max_processes),
        ];
        for (name, value) in fields {
            if value == Some(0) {
                return Err(CellblockError::InvalidConfig(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// A resource the limiter knows how to cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedResource {
    AddressSpace,
    CpuTime,
    FileSize,
    Processes,
}

impl LimitedResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitedResource::AddressSpace => "address_space",
            LimitedResource::CpuTime => "cpu_time",
            LimitedResource::FileSize => "file_size",
            LimitedResource::Processes => "processes",
        }
    }

    #[cfg(unix)]
    fn raw(&self) -> RawResource {
        match self {
            LimitedResource::AddressSpace => libc::RLIMIT_AS,
            LimitedResource::CpuTime => libc::RLIMIT_CPU,
            LimitedResource::FileSize => libc::RLIMIT_FSIZE,
            LimitedResource::Processes => libc::RLIMIT_NPROC,
        }
    }
}

#[cfg(all(unix, target_os = "linux", target_env = "gnu"))]
type RawResource = libc::__rlimit_resource_t;
#[cfg(all(unix, not(all(target_os = "linux", target_env = "gnu"))))]
type RawResource = libc::c_int;

/// One limit that will be set in the child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLimit {
    pub resource: LimitedResource,
    pub value: u64,
}

/// Limits to apply to one child, plus warnings for limits that could not be honoured
#[derive(Debug, Clone, Default)]
pub struct LimitPlan {
    pub limits: Vec<PlannedLimit>,
    pub warnings: Vec<String>,
}

impl LimitPlan {
    /// Value planned for a resource, if any
    pub fn get(&self, resource: LimitedResource) -> Option<u64> {
        self.limits
            .iter()
            .find(|l| l.resource == resource)
            .map(|l| l.value)
    }

    /// Install the pre-exec hook on a command
    ///
    /// The hook makes the child a session leader, so the whole tree can be
    /// killed as one process group, then sets each planned limit.
    #[cfg(unix)]
    pub fn apply(&self, cmd: &mut Command) {
        let limits: Vec<(RawResource, u64)> = self
            .limits
            .iter()
            .map(|l| (l.resource.raw(), l.value))
            .collect();

        // SAFETY: pre_exec runs between fork() and exec() in the child process.
        // The closure only calls async-signal-safe libc functions (setsid,
        // setrlimit) and reads a Vec that was allocated before the fork.
        // The parent process is not affected by these limit changes.
        unsafe {
            cmd.pre_exec(move || {
                libc::setsid();
                for (resource, value) in &limits {
                    let limit = libc::rlimit {
                        rlim_cur: *value as libc::rlim_t,
                        rlim_max: *value as libc::rlim_t,
                    };
                    // A refused limit was already reported by the planner
                    libc::setrlimit(*resource, &limit);
                }
                Ok(())
            });
        }
    }

    /// No-op for non-Unix platforms
    #[cfg(not(unix))]
    pub fn apply(&self, _cmd: &mut Command) {}
}

/// Computes the OS limits for a child process
pub struct ResourceLimiter;

impl ResourceLimiter {
    /// Plan the limits for a child process
    ///
    /// Each requested limit is checked against the current hard limit. A
    /// resource the platform does not support is skipped and a request above
    /// the hard limit is clamped; both cases are logged at warn and recorded in
    /// the plan, and execution proceeds with the reduced guarantee.
    pub fn plan(limits: &ResourceLimits) -> LimitPlan {
        let requested = [
            (LimitedResource::AddressSpace, limits.max_memory_bytes),
            (LimitedResource::CpuTime, limits.max_cpu_seconds),
            (LimitedResource::FileSize, limits.max_file_size_bytes),
            (LimitedResource::Processes, limits.max_processes),
        ];

        let mut plan = LimitPlan::default();
        for (resource, value) in requested {
            let Some(value) = value else { continue };
            match Self::hard_limit(resource) {
                Ok(Some(hard)) if value > hard => {
                    let warning = format!(
                        "{} limit {} exceeds hard limit {}; clamped",
                        resource.as_str(),
                        value,
                        hard
                    );
                    tracing::warn!("{}", warning);
                    plan.warnings.push(warning);
                    plan.limits.push(PlannedLimit {
                        resource,
                        value: hard,
                    });
                }
                Ok(_) => plan.limits.push(PlannedLimit { resource, value }),
                Err(reason) => {
                    let warning = format!(
                        "Failed to set {} limit: {}",
                        resource.as_str(),
                        reason
                    );
                    tracing::warn!("{}", warning);
                    plan.warnings.push(warning);
                }
            }
        }
        plan
    }

    /// Current hard limit, `None` when unlimited
    #[cfg(unix)]
    fn hard_limit(resource: LimitedResource) -> Result<Option<u64>, String> {
        let mut current = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: getrlimit only writes into the struct we pass it.
        let rc = unsafe { libc::getrlimit(resource.raw(), &mut current) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().to_string());
        }
        if current.rlim_max == libc::RLIM_INFINITY {
            Ok(None)
        } else {
            Ok(Some(current.rlim_max as u64))
        }
    }

    #[cfg(not(unix))]
    fn hard_limit(_resource: LimitedResource) -> Result<Option<u64>, String> {
        Err("resource limits are not supported on this platform".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.max_memory_bytes, Some(128 * 1024 * 1024));
        assert_eq!(limits.max_cpu_seconds, Some(10));
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let limits = ResourceLimits {
            max_cpu_seconds: Some(0),
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_unlimited_plans_nothing() {
        let plan = ResourceLimiter::plan(&ResourceLimits::unlimited());
        assert!(plan.limits.is_empty());
        assert!(plan.warnings.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_covers_requested_limits() {
        let plan = ResourceLimiter::plan(&ResourceLimits::strict());

        // Every requested limit is either planned or reported
        assert_eq!(plan.limits.len() + plan.warnings.len(), 4);
        if let Some(cpu) = plan.get(LimitedResource::CpuTime) {
            assert!(cpu <= 2);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_clamps_to_hard_limit() {
        let limits = ResourceLimits {
            max_memory_bytes: None,
            max_cpu_seconds: None,
            max_file_size_bytes: Some(u64::MAX - 1),
            max_processes: None,
        };
        let plan = ResourceLimiter::plan(&limits);
        let planned = plan.get(LimitedResource::FileSize);
        assert!(planned.is_some() || !plan.warnings.is_empty());
        assert!(planned.unwrap_or(0) <= u64::MAX - 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_limits_bind_child_only() {
        let limits = ResourceLimits {
            max_memory_bytes: None,
            max_cpu_seconds: None,
            max_file_size_bytes: Some(4096),
            max_processes: None,
        };
        let plan = ResourceLimiter::plan(&limits);

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("ulimit -f");
        plan.apply(&mut cmd);
        let output = cmd.output().await.unwrap();
        let reported = String::from_utf8_lossy(&output.stdout);

        if plan.get(LimitedResource::FileSize).is_some() {
            // 512-byte blocks in POSIX shells, 1024-byte blocks in bash
            assert!(matches!(reported.trim(), "8" | "4"), "got {}", reported);
        }

        // The parent keeps its own limits
        let parent = ResourceLimiter::hard_limit(LimitedResource::FileSize).unwrap();
        assert_ne!(parent, Some(4096));
    }
}
