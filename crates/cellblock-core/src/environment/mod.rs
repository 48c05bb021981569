//! Per-execution scratch directories and the restricted child entrypoint.

mod launcher;

pub use launcher::{LAUNCHER_FILE, SOURCE_FILE};

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

use crate::config::ExecutionConfig;
use crate::error::{CellblockError, CellblockResult};

/// Scratch directory name prefix; the rest of the name is random
const SCRATCH_PREFIX: &str = "cellblock_";

/// Minimal PATH handed to the child
const CHILD_PATH: &str = "/usr/bin:/bin";

/// A uniquely named scratch directory owned by one execution
///
/// The directory is removed by [`SandboxHandle::cleanup`] or, failing that,
/// when the handle is dropped. Removal errors are logged and never raised.
#[derive(Debug)]
pub struct SandboxHandle {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl SandboxHandle {
    /// Path of the scratch directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the scratch directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Remove the scratch directory now
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => tracing::debug!("Removed scratch directory {:?}", self.root),
                Err(e) => tracing::warn!(
                    "Failed to remove scratch directory {:?}: {}",
                    self.root,
                    e
                ),
            }
        }
    }
}

impl Drop for SandboxHandle {
    fn drop(&mut self) {
        self.remove();
    }
}

/// How to start the child interpreter for one handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrypoint {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: PathBuf,
}

/// Creates scratch directories and writes the restricted launcher
#[derive(Debug, Clone)]
pub struct SandboxEnvironment {
    scratch_root: PathBuf,
    interpreter: PathBuf,
    launcher: String,
}

impl SandboxEnvironment {
    /// Prepare the environment for a configuration
    ///
    /// The interpreter is resolved against the parent's PATH once; if that
    /// fails the configured name is kept and spawning reports the error.
    pub fn new(config: &ExecutionConfig) -> Self {
        let configured = &config.environment.interpreter;
        let interpreter = match which::which(configured) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Interpreter '{}' not found on PATH: {}", configured, e);
                PathBuf::from(configured)
            }
        };

        Self {
            scratch_root: config.environment.scratch_root(),
            interpreter,
            launcher: launcher::render(&config.analysis, &config.environment),
        }
    }

    /// Resolved interpreter path
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Root under which scratch directories are created
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Create a fresh scratch directory
    pub fn create(&self) -> CellblockResult<SandboxHandle> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.scratch_root)
            .map_err(|e| {
                CellblockError::ScratchDir(format!(
                    "Failed to create scratch directory in {:?}: {}",
                    self.scratch_root, e
                ))
            })?;
        let root = dir.path().to_path_buf();
        tracing::debug!("Created scratch directory {:?}", root);

        Ok(SandboxHandle {
            dir: Some(dir),
            root,
        })
    }

    /// Write the user source into the scratch directory
    pub async fn write_source(&self, handle: &SandboxHandle, source: &str) -> CellblockResult<PathBuf> {
        write_file(handle, SOURCE_FILE, source).await
    }

    /// Write the restricted launcher into the scratch directory
    pub async fn write_launcher(&self, handle: &SandboxHandle) -> CellblockResult<PathBuf> {
        write_file(handle, LAUNCHER_FILE, &self.launcher).await
    }

    /// Command line, environment and working directory for the child
    ///
    /// The environment is built from scratch; nothing is inherited from the
    /// parent. `-I -S -B -u` selects isolated mode, skips `site`, disables
    /// bytecode writing and unbuffers the standard streams.
    pub fn entrypoint(&self, handle: &SandboxHandle) -> Entrypoint {
        let home = handle.path().to_string_lossy().into_owned();
        Entrypoint {
            program: self.interpreter.clone(),
            args: ["-I", "-S", "-B", "-u", LAUNCHER_FILE, SOURCE_FILE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            env: vec![
                ("PATH".to_string(), CHILD_PATH.to_string()),
                ("HOME".to_string(), home),
                ("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()),
                ("PYTHONIOENCODING".to_string(), "utf-8".to_string()),
            ],
            working_dir: handle.path().to_path_buf(),
        }
    }
}

async fn write_file(handle: &SandboxHandle, name: &str, content: &str) -> CellblockResult<PathBuf> {
    let path = handle.file(name);
    fs::write(&path, content).await.map_err(|e| {
        CellblockError::ScratchDir(format!("Failed to write {:?}: {}", path, e))
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(root: &Path) -> SandboxEnvironment {
        SandboxEnvironment::new(&ExecutionConfig::default().with_scratch_root(root))
    }

    #[test]
    fn test_create_unique_directories() {
        let root = TempDir::new().unwrap();
        let env = environment(root.path());

        let a = env.create().unwrap();
        let b = env.create().unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(root.path()));
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
    }

    #[tokio::test]
    async fn test_write_files() {
        let root = TempDir::new().unwrap();
        let env = environment(root.path());
        let handle = env.create().unwrap();

        let source = env.write_source(&handle, "print('hi')").await.unwrap();
        let launcher = env.write_launcher(&handle).await.unwrap();

        assert_eq!(std::fs::read_to_string(source).unwrap(), "print('hi')");
        let script = std::fs::read_to_string(launcher).unwrap();
        assert!(script.contains("def guarded_import"));
    }

    #[tokio::test]
    async fn test_cleanup_removes_directory() {
        let root = TempDir::new().unwrap();
        let env = environment(root.path());
        let handle = env.create().unwrap();
        env.write_source(&handle, "x = 1").await.unwrap();
        std::fs::create_dir(handle.file("nested")).unwrap();
        std::fs::write(handle.file("nested/out.txt"), "data").unwrap();

        let path = handle.path().to_path_buf();
        handle.cleanup();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let root = TempDir::new().unwrap();
        let env = environment(root.path());
        let path = {
            let handle = env.create().unwrap();
            handle.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_after_external_removal_does_not_panic() {
        let root = TempDir::new().unwrap();
        let env = environment(root.path());
        let handle = env.create().unwrap();
        std::fs::remove_dir_all(handle.path()).unwrap();
        handle.cleanup();
    }

    #[test]
    fn test_create_fails_for_missing_root() {
        let root = TempDir::new().unwrap();
        let env = environment(&root.path().join("missing"));
        assert!(matches!(env.create(), Err(CellblockError::ScratchDir(_))));
    }

    #[test]
    fn test_entrypoint() {
        let root = TempDir::new().unwrap();
        let env = environment(root.path());
        let handle = env.create().unwrap();
        let entry = env.entrypoint(&handle);

        assert_eq!(entry.working_dir, handle.path());
        assert_eq!(entry.args, ["-I", "-S", "-B", "-u", "launcher.py", "code.py"]);
        assert!(entry.env.iter().any(|(k, v)| k == "PATH" && v == CHILD_PATH));
        assert!(!entry.env.iter().any(|(k, _)| k == "PYTHONPATH"));
    }

    #[test]
    fn test_unknown_interpreter_kept_verbatim() {
        let config = ExecutionConfig::default().with_interpreter("no-such-python-xyz");
        let env = SandboxEnvironment::new(&config);
        assert_eq!(env.interpreter(), Path::new("no-such-python-xyz"));
    }
}
