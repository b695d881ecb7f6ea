//! Advisory run lock
//!
//! A lock file created with `create_new` next to the snapshot. Holding the
//! [`RunLock`] value means no other run can enter the read-diff-write
//! sequence; dropping it removes the file.
//!
//! The file holds the owner's pid. A lock whose owner is no longer running
//! (killed, crashed, host rebooted) is stale and gets reclaimed once.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, lock_held, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock at `path`
    ///
    /// # Errors
    ///
    /// - `Concurrency` if the lock file exists and its owner may still be running
    /// - `Io` if the lock file cannot be created or a stale one removed
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_error("create_lock_dir", e))?;
            }
        }

        let mut file = match create(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let Some(pid) = stale_owner(&path) else {
                    return Err(lock_held(&path));
                };
                tracing::warn!(path = %path.display(), pid, "reclaiming stale run lock");
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(io_error("remove_stale_lock", e)),
                }
                // A run that reclaimed it first wins.
                match create(&path) {
                    Ok(file) => file,
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(lock_held(&path)),
                    Err(e) => return Err(io_error("acquire_run_lock", e)),
                }
            }
            Err(e) => return Err(io_error("acquire_run_lock", e)),
        };
        let _ = writeln!(file, "{}", std::process::id());
        tracing::debug!(path = %path.display(), "run lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}

fn create(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Pid recorded in an existing lock file, if that process is gone
///
/// An empty or unreadable file may belong to a run that has not written its
/// pid yet, so it counts as held.
fn stale_owner(path: &Path) -> Option<u32> {
    let pid: u32 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
    (pid != std::process::id() && !process_alive(pid)).then_some(pid)
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // EPERM: the process exists but belongs to another user.
    !matches!(kill(Pid::from_raw(raw), None), Err(Errno::ESRCH))
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use daadwatch_core::errors::ExErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("programmes.json.lock");

        let held = RunLock::acquire(&path).unwrap();
        let err = RunLock::acquire(&path).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Concurrency);

        drop(held);
        assert!(!path.exists());
        assert!(RunLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_lock_file_records_pid() {
        let dir = TempDir::new().unwrap();
        let lock = RunLock::acquire(dir.path().join("run.lock")).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_left_by_dead_process_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.lock");
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let dead_pid = child.id();
        child.wait().unwrap();
        fs::write(&path, format!("{}\n", dead_pid)).unwrap();

        let lock = RunLock::acquire(&path).unwrap();

        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_lock_without_pid_counts_as_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.lock");
        fs::write(&path, "").unwrap();

        let err = RunLock::acquire(&path).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Concurrency);
        assert!(path.exists());
    }
}
