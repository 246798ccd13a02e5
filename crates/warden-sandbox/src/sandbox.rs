// sandbox.rs — SandboxManager and the scoped SandboxGuard.
//
// A sandbox is a fresh directory under the sandbox root, optionally seeded
// with a filtered snapshot of the project. It exists exactly as long as its
// guard: dropping the guard (normal return, early return, `?`, or panic
// unwinding) removes the directory and deregisters it.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use warden_workspace::{copy_tree, ExcludePatterns};

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::limits::{self, ResourceLimits};

/// How often a timed run checks whether its child has exited.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Environment variable set in every sandboxed child.
pub const SANDBOX_ENV: &str = "WARDEN_SANDBOX";

type Registry = Arc<Mutex<HashMap<String, Sandbox>>>;

/// A live sandbox. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sandbox {
    pub sandbox_id: String,
    pub agent_id: String,
    pub root_path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Files copied from the project snapshot (0 for an empty sandbox).
    pub files_copied: u64,
}

/// The outcome of a command run to completion inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedExecution {
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl SandboxedExecution {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Allocates sandboxes and tracks which ones are live.
pub struct SandboxManager {
    config: SandboxConfig,
    registry: Registry,
}

impl SandboxManager {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Allocate a fresh sandbox for `agent_id`, seeded with a filtered copy
    /// of `project` when given.
    ///
    /// The project copy honours `.wardenignore` in the project, falling back
    /// to the default excludes (VCS metadata, caches, build output,
    /// dependency directories).
    pub fn create_sandbox(
        &self,
        agent_id: &str,
        project: Option<&Path>,
    ) -> Result<SandboxGuard, SandboxError> {
        if let Some(project) = project {
            if !project.is_dir() {
                return Err(SandboxError::ProjectNotFound {
                    path: project.to_path_buf(),
                });
            }
        }

        let root = &self.config.root;
        std::fs::create_dir_all(root).map_err(|source| SandboxError::Io {
            path: root.clone(),
            source,
        })?;

        let sandbox_id = Uuid::new_v4().to_string();
        let root_path = root.join(format!("{}-{}", dir_safe(agent_id), sandbox_id));
        std::fs::create_dir(&root_path).map_err(|source| SandboxError::Io {
            path: root_path.clone(),
            source,
        })?;

        let files_copied = match project {
            Some(project) => {
                match copy_tree(project, &root_path, &ExcludePatterns::load(project)) {
                    Ok(stats) => stats.file_count,
                    Err(e) => {
                        if let Err(cleanup) = std::fs::remove_dir_all(&root_path) {
                            tracing::warn!(
                                path = %root_path.display(),
                                error = %cleanup,
                                "failed to remove partially seeded sandbox"
                            );
                        }
                        return Err(e.into());
                    }
                }
            }
            None => 0,
        };

        let sandbox = Sandbox {
            sandbox_id: sandbox_id.clone(),
            agent_id: agent_id.to_string(),
            root_path,
            created_at: Utc::now(),
            files_copied,
        };
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(sandbox_id.clone(), sandbox.clone());

        tracing::info!(
            agent_id,
            sandbox_id = %sandbox_id,
            path = %sandbox.root_path.display(),
            files_copied,
            "sandbox created"
        );

        Ok(SandboxGuard {
            sandbox,
            registry: Arc::clone(&self.registry),
            limits: self.config.limits(),
            released: false,
        })
    }

    /// Run `f` inside a fresh sandbox; the sandbox is torn down afterwards
    /// whatever `f` does, including panicking.
    ///
    /// Teardown errors after a normal return are reported as the result.
    pub fn with_sandbox<T>(
        &self,
        agent_id: &str,
        project: Option<&Path>,
        f: impl FnOnce(&SandboxGuard) -> T,
    ) -> Result<T, SandboxError> {
        let guard = self.create_sandbox(agent_id, project)?;
        let value = f(&guard);
        guard.close()?;
        Ok(value)
    }

    /// Live sandboxes, oldest first.
    pub fn active_sandboxes(&self) -> Vec<Sandbox> {
        let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let mut sandboxes: Vec<Sandbox> = registry.values().cloned().collect();
        sandboxes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sandboxes
    }

    pub fn active_count(&self) -> usize {
        self.registry.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for SandboxManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxManager")
            .field("config", &self.config)
            .field("active", &self.active_count())
            .finish()
    }
}

/// Owns one live sandbox. Dropping it tears the sandbox down.
#[derive(Debug)]
pub struct SandboxGuard {
    sandbox: Sandbox,
    registry: Registry,
    limits: ResourceLimits,
    released: bool,
}

impl SandboxGuard {
    pub fn id(&self) -> &str {
        &self.sandbox.sandbox_id
    }

    pub fn path(&self) -> &Path {
        &self.sandbox.root_path
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// A `Command` that runs `program` in the sandbox directory with the
    /// sandbox's resource ceilings installed in the child.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(self.path()).env(SANDBOX_ENV, self.path());
        own_process_group(&mut cmd);
        limits::apply(&mut cmd, &self.limits);
        cmd
    }

    /// Run `program` to completion, capturing its output. With a timeout,
    /// the child's whole process group is killed once it elapses, so
    /// background grandchildren cannot hold the output pipes open.
    pub fn run<S: AsRef<OsStr>>(
        &self,
        program: &str,
        args: &[S],
        timeout: Option<Duration>,
    ) -> Result<SandboxedExecution, SandboxError> {
        let start = Instant::now();
        let wait_err = |source| SandboxError::Wait {
            program: program.to_string(),
            source,
        };

        let mut child = self
            .command(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let (status, timed_out) = match timeout {
            None => (Some(child.wait().map_err(wait_err)?), false),
            Some(limit) => loop {
                if let Some(status) = child.try_wait().map_err(wait_err)? {
                    break (Some(status), false);
                }
                if start.elapsed() >= limit {
                    kill_process_group(&mut child);
                    child.wait().map_err(wait_err)?;
                    break (None, true);
                }
                std::thread::sleep(POLL_INTERVAL);
            },
        };

        let execution = SandboxedExecution {
            exit_code: status.and_then(|s| s.code()),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
            duration: start.elapsed(),
            timed_out,
        };
        tracing::debug!(
            sandbox_id = %self.id(),
            program,
            exit_code = ?execution.exit_code,
            timed_out,
            "sandboxed command finished"
        );
        Ok(execution)
    }

    /// Tear the sandbox down now, reporting any removal error.
    pub fn close(mut self) -> Result<(), SandboxError> {
        self.released = true;
        self.teardown()
    }

    fn teardown(&self) -> Result<(), SandboxError> {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.sandbox.sandbox_id);

        match std::fs::remove_dir_all(self.path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SandboxError::Io {
                    path: self.path().to_path_buf(),
                    source,
                })
            }
        }
        tracing::info!(
            agent_id = %self.sandbox.agent_id,
            sandbox_id = %self.sandbox.sandbox_id,
            "sandbox destroyed"
        );
        Ok(())
    }
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.teardown() {
            tracing::warn!(sandbox_id = %self.sandbox.sandbox_id, error = %e, "sandbox cleanup failed");
        }
    }
}

/// Start the child as the leader of a new process group.
#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    match libc::pid_t::try_from(child.id()) {
        // SAFETY: killpg only sends a signal. The group id is the child's
        // pid, which stays reserved until we reap the child below.
        Ok(pgid) if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 => {}
        _ => kill_child(child),
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    kill_child(child);
}

fn kill_child(child: &mut Child) {
    // The child may exit between try_wait and kill.
    if let Err(e) = child.kill() {
        tracing::debug!(error = %e, "kill after timeout failed");
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf) {
            tracing::debug!(error = %e, "reading sandboxed output failed");
        }
        buf
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Agent ids become part of a directory name; keep them to a safe alphabet.
fn dir_safe(agent_id: &str) -> String {
    let safe: String = agent_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    if safe.is_empty() {
        "agent".to_string()
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn manager(root: &TempDir) -> SandboxManager {
        SandboxManager::new(SandboxConfig::with_root(root.path().join("sandboxes")))
    }

    fn create_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/app.py"), "print(1)\n").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        dir
    }

    #[test]
    fn guard_registers_and_drop_cleans_up() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);

        let path = {
            let guard = manager.create_sandbox("agent-1", None).unwrap();
            assert!(guard.path().is_dir());
            assert_eq!(manager.active_count(), 1);
            assert_eq!(manager.active_sandboxes()[0].agent_id, "agent-1");
            guard.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn project_snapshot_excludes_vcs_metadata() {
        let root = TempDir::new().unwrap();
        let project = create_project();
        let manager = manager(&root);

        let guard = manager.create_sandbox("a", Some(project.path())).unwrap();
        assert!(guard.path().join("src/app.py").exists());
        assert!(!guard.path().join(".git").exists());
        assert_eq!(guard.sandbox().files_copied, 1);
        guard.close().unwrap();
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn missing_project_fails_without_leaking() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let err = manager
            .create_sandbox("a", Some(&root.path().join("nope")))
            .unwrap_err();
        assert!(matches!(err, SandboxError::ProjectNotFound { .. }));
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn with_sandbox_cleans_up_on_success_and_error() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);

        let path = manager
            .with_sandbox("a", None, |guard| guard.path().to_path_buf())
            .unwrap();
        assert!(!path.exists());

        let result: Result<Result<(), String>, SandboxError> =
            manager.with_sandbox("a", None, |_| Err("task failed".to_string()));
        assert_eq!(result.unwrap(), Err("task failed".to_string()));
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn panic_inside_sandbox_still_cleans_up() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let seen = Mutex::new(None);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            manager.with_sandbox("a", None, |guard| {
                *seen.lock().unwrap() = Some(guard.path().to_path_buf());
                panic!("agent task blew up");
            })
        }));

        assert!(outcome.is_err());
        let path = seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn concurrent_sandboxes_are_independent() {
        let root = TempDir::new().unwrap();
        let manager = Arc::new(manager(&root));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let guard = manager.create_sandbox(&format!("agent-{}", i), None).unwrap();
                    fs::write(guard.path().join("marker"), i.to_string()).unwrap();
                    let id = guard.id().to_string();
                    guard.close().unwrap();
                    id
                })
            })
            .collect();

        let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn agent_ids_are_made_directory_safe() {
        assert_eq!(dir_safe("agent/../x"), "agent____x");
        assert_eq!(dir_safe(""), "agent");
        assert_eq!(dir_safe("ok-id_1"), "ok-id_1");
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_output_in_sandbox_dir() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let guard = manager.create_sandbox("a", None).unwrap();
        fs::write(guard.path().join("hello.txt"), "hi there").unwrap();

        let execution = guard
            .run("sh", &["-c", "cat hello.txt; echo oops >&2; exit 3"], None)
            .unwrap();
        assert_eq!(execution.exit_code, Some(3));
        assert_eq!(execution.stdout, "hi there");
        assert_eq!(execution.stderr.trim(), "oops");
        assert!(!execution.success());
        assert!(!execution.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn run_kills_on_timeout() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let guard = manager.create_sandbox("a", None).unwrap();

        let execution = guard
            .run("sleep", &["5"], Some(Duration::from_millis(200)))
            .unwrap();
        assert!(execution.timed_out);
        assert_eq!(execution.exit_code, None);
        assert!(execution.duration < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_also_kills_background_grandchildren() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let guard = manager.create_sandbox("a", None).unwrap();

        // The grandchild `sleep` inherits the output pipes.
        let execution = guard
            .run("sh", &["-c", "sleep 4; echo done"], Some(Duration::from_millis(200)))
            .unwrap();
        assert!(execution.timed_out);
        assert!(!execution.stdout.contains("done"));
        assert!(execution.duration < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn children_get_configured_cpu_ceiling() {
        let root = TempDir::new().unwrap();
        let config = SandboxConfig {
            cpu_seconds: 9,
            ..SandboxConfig::with_root(root.path().join("sandboxes"))
        };
        let manager = SandboxManager::new(config);
        let guard = manager.create_sandbox("a", None).unwrap();

        let execution = guard.run("sh", &["-c", "ulimit -t"], None).unwrap();
        assert_eq!(execution.stdout.trim(), "9");
    }

    #[cfg(unix)]
    #[test]
    fn children_see_sandbox_env() {
        let root = TempDir::new().unwrap();
        let manager = manager(&root);
        let guard = manager.create_sandbox("a", None).unwrap();

        let execution = guard
            .run("sh", &["-c", "printf %s \"$WARDEN_SANDBOX\""], None)
            .unwrap();
        assert_eq!(Path::new(&execution.stdout), guard.path());
    }
}
