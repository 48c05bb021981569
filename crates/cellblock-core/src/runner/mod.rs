//! Running the child interpreter.
//!
//! [`CodeRunner`] is the seam between orchestration and the OS. The
//! production [`ProcessRunner`] spawns one process per call, feeds stdin,
//! drains output within bounds and enforces the wall-clock timeout by killing
//! the child's whole process group. It never fails: host-side problems come
//! back as a [`RunOutput`] with `exit_code = -1` and `error` set.

mod output;
mod process;
mod types;

pub use output::truncate_utf8;
pub use process::ProcessRunner;
pub use types::{RunOutput, RunSpec};

use async_trait::async_trait;

/// Executes a prepared child process
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Run the child described by `spec` to completion or timeout
    async fn run(&self, spec: RunSpec) -> RunOutput;
}

#[cfg(test)]
mod tests;
