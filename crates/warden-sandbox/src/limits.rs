// limits.rs — Per-child resource ceilings.
//
// Limits are installed in the child between fork() and exec(), never in the
// governor itself. Each sandboxed process carries its own ceilings, so
// concurrent sandboxes cannot clobber one another and there is nothing to
// restore in the parent afterwards.

use std::process::Command;

use serde::{Deserialize, Serialize};

/// CPU-time and address-space ceilings for sandboxed children.
///
/// `None` leaves the inherited limit in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// RLIMIT_CPU, in seconds.
    pub cpu_seconds: Option<u64>,
    /// RLIMIT_AS, in bytes.
    pub memory_bytes: Option<u64>,
}

impl ResourceLimits {
    pub fn new(cpu_seconds: u64, memory_mb: u64) -> Self {
        Self {
            cpu_seconds: Some(cpu_seconds),
            memory_bytes: Some(memory_mb.saturating_mul(1024 * 1024)),
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// Install `limits` in the child that `cmd` will spawn.
#[cfg(unix)]
pub fn apply(cmd: &mut Command, limits: &ResourceLimits) {
    use std::os::unix::process::CommandExt;

    if limits.cpu_seconds.is_none() && limits.memory_bytes.is_none() {
        return;
    }
    let cpu = limits.cpu_seconds;
    let memory = limits.memory_bytes;

    // SAFETY: pre_exec runs between fork() and exec() in the child process.
    // The closure only calls setrlimit, which is async-signal-safe, and
    // captures Copy values, so no shared state is touched. The parent's
    // limits are unaffected.
    unsafe {
        cmd.pre_exec(move || {
            if let Some(secs) = cpu {
                if libc::setrlimit(libc::RLIMIT_CPU, &rlimit(secs)) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
            }
            if let Some(bytes) = memory {
                if libc::setrlimit(libc::RLIMIT_AS, &rlimit(bytes)) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
            }
            Ok(())
        });
    }
}

#[cfg(unix)]
fn rlimit(value: u64) -> libc::rlimit {
    libc::rlimit {
        rlim_cur: value as libc::rlim_t,
        rlim_max: value as libc::rlim_t,
    }
}

/// No-op on non-Unix platforms.
#[cfg(not(unix))]
pub fn apply(_cmd: &mut Command, _limits: &ResourceLimits) {}
