//! Child process runner

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::output::{Captured, read_bounded};
use super::types::{RunOutput, RunSpec};
use super::CodeRunner;

/// How long output readers may take after the child has been reaped
const READER_GRACE: Duration = Duration::from_secs(2);

/// Runs the interpreter as a fresh OS process per call
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    async fn run_child(&self, spec: RunSpec) -> RunOutput {
        let start = Instant::now();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .env_clear()
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&spec.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        spec.limits.apply(&mut cmd);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to spawn {:?}: {}", spec.program, e);
                return RunOutput::failed(e.to_string());
            }
        };
        let mut group = ProcessGroup::new(child.id());
        tracing::debug!(pid = ?child.id(), "spawned sandboxed interpreter");

        // Stdin is written from its own task so a child that never reads
        // cannot block the timeout
        let stdin_task = child.stdin.take().map(|mut pipe| {
            let input = spec.stdin.clone();
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    tracing::debug!("Child stdin closed early: {}", e);
                }
                // Dropping the pipe sends EOF
            })
        });

        let max = spec.max_output_bytes;
        let stdout_task = child
            .stdout
            .take()
            .map(|pipe| tokio::spawn(read_bounded(pipe, max)));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(read_bounded(pipe, max)));

        let (status, timed_out, wait_error) = match timeout(spec.timeout, child.wait()).await {
            Ok(Ok(status)) => (Some(status), false, None),
            Ok(Err(e)) => {
                group.kill();
                let _ = child.start_kill();
                (child.wait().await.ok(), false, Some(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = spec.timeout.as_secs_f64(),
                    "sandboxed code timed out, killing process group"
                );
                group.kill();
                let _ = child.start_kill();
                (child.wait().await.ok(), true, None)
            }
        };
        group.reaped();
        let duration = start.elapsed();

        if let Some(task) = stdin_task {
            task.abort();
        }

        // Descendants that outlive the leader keep the pipes open; they are
        // killed once the grace period runs out
        let stdout = join_reader(stdout_task).await;
        let stderr = join_reader(stderr_task).await;
        if stdout.is_none() || stderr.is_none() {
            group.kill_remaining();
        }
        let stdout = stdout.unwrap_or_default();
        let stderr = stderr.unwrap_or_default();

        let truncated = stdout.truncated || stderr.truncated;
        let (stdout_bytes, stderr_bytes) = (stdout.total, stderr.total);
        let stdout = stdout.into_string(max);
        let mut stderr = stderr.into_string(max);

        if let Some(message) = wait_error {
            return RunOutput {
                stdout,
                duration,
                truncated,
                stdout_bytes,
                stderr_bytes,
                ..RunOutput::failed(message)
            };
        }

        if timed_out {
            return RunOutput {
                exit_code: -1,
                stdout,
                stderr: format!(
                    "Code execution timed out after {} seconds",
                    spec.timeout.as_secs_f64()
                ),
                timed_out: true,
                truncated,
                stdout_bytes,
                stderr_bytes,
                error: None,
                duration,
            };
        }

        let exit_code = match status {
            Some(status) => exit_code(status, &mut stderr),
            None => -1,
        };

        RunOutput {
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            truncated,
            stdout_bytes,
            stderr_bytes,
            error: None,
            duration,
        }
    }
}

#[async_trait]
impl CodeRunner for ProcessRunner {
    async fn run(&self, spec: RunSpec) -> RunOutput {
        self.run_child(spec).await
    }
}

/// Map an exit status, noting signal deaths in stderr
#[cfg_attr(not(unix), allow(unused_variables))]
fn exit_code(status: ExitStatus, stderr: &mut String) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!("Terminated by signal {}", signal));
            return -signal;
        }
    }

    -1
}

async fn join_reader(task: Option<JoinHandle<Captured>>) -> Option<Captured> {
    let Some(mut task) = task else {
        return Some(Captured::default());
    };
    match timeout(READER_GRACE, &mut task).await {
        Ok(Ok(captured)) => Some(captured),
        Ok(Err(e)) => {
            tracing::debug!("Output reader failed: {}", e);
            Some(Captured::default())
        }
        Err(_) => {
            task.abort();
            None
        }
    }
}

/// The child's process group
///
/// The child calls `setsid` before exec, so its pid is also its process group
/// id. Dropping an unreaped group kills it, which covers a cancelled caller.
#[derive(Debug)]
struct ProcessGroup {
    pgid: Option<u32>,
    reaped: bool,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid,
            reaped: false,
        }
    }

    /// Kill the group before the leader is reaped
    fn kill(&mut self) {
        if !self.reaped {
            self.signal_group();
        }
    }

    /// Kill descendants left behind after the leader was reaped
    fn kill_remaining(&mut self) {
        self.signal_group();
    }

    fn reaped(&mut self) {
        self.reaped = true;
    }

    #[cfg(unix)]
    fn signal_group(&self) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let Some(pgid) = self.pgid else { return };
        match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
            Err(e) => tracing::warn!("Failed to SIGKILL process group {}: {}", pgid, e),
        }
    }

    #[cfg(not(unix))]
    fn signal_group(&self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.reaped {
            self.signal_group();
        }
    }
}
