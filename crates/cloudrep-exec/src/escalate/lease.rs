use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{ExecError, ExecResult};

/// Exclusive claim on the escalation run, backed by a pid marker file.
///
/// The marker is created atomically; a second instance finds it and refuses to
/// start unless forced. Dropping the lease removes the marker, so every exit
/// path of the owning scope (success, error, cancellation, unwinding) releases it.
#[derive(Debug)]
pub struct RunLease {
    path: PathBuf,
    pid: u32,
}

impl RunLease {
    /// Claim the marker at `path` for the current process.
    ///
    /// With `force`, an existing marker is overwritten regardless of its holder.
    pub fn acquire(path: &Path, force: bool) -> ExecResult<Self> {
        Self::acquire_for(path, force, std::process::id())
    }

    pub(crate) fn acquire_for(path: &Path, force: bool, pid: u32) -> ExecResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut opts = OpenOptions::new();
        opts.write(true);
        if force {
            opts.create(true).truncate(true);
        } else {
            opts.create_new(true);
        }

        let mut file = match opts.open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ExecError::LeaseHeld {
                    path: path.to_path_buf(),
                    pid: read_holder(path),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let lease = Self {
            path: path.to_path_buf(),
            pid,
        };
        // From here on `Drop` cleans up even if the write fails.
        writeln!(file, "{pid}")?;
        debug!(path = %lease.path.display(), pid, force, "run lease acquired");
        Ok(lease)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "run lease released"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove run marker"),
        }
    }
}

/// Pid recorded in a marker file, if any.
pub fn read_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Whether a process with `pid` exists (signal 0 probe).
#[cfg(unix)]
pub fn pid_alive(pid: u32) -> bool {
    // 0 and values past pid_t would address process groups.
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    let rc = unsafe { libc::kill(raw, 0) };
    if rc == 0 {
        return true;
    }
    // Exists but owned by someone else.
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn pid_alive(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_and_names_holder() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tpcc.pid");

        let lease = RunLease::acquire_for(&marker, false, 4242).unwrap();
        assert_eq!(read_holder(&marker), Some(4242));

        let err = RunLease::acquire_for(&marker, false, 1).unwrap_err();
        assert!(matches!(err, ExecError::LeaseHeld { pid: Some(4242), .. }));

        drop(lease);
        assert!(!marker.exists());
    }

    #[test]
    fn force_takes_over_existing_marker() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("nested/tpcc.pid");
        fs::create_dir_all(marker.parent().unwrap()).unwrap();
        fs::write(&marker, "999999\n").unwrap();

        let lease = RunLease::acquire_for(&marker, true, 77).unwrap();
        assert_eq!(lease.pid(), 77);
        assert_eq!(read_holder(&marker), Some(77));
        drop(lease);
        assert!(!marker.exists());
    }

    #[test]
    fn release_tolerates_removed_marker() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tpcc.pid");
        let lease = RunLease::acquire(&marker, false).unwrap();
        fs::remove_file(lease.path()).unwrap();
        drop(lease);
    }

    #[test]
    fn lease_is_released_on_unwind() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tpcc.pid");
        let path = marker.clone();

        let res = std::panic::catch_unwind(move || {
            let _lease = RunLease::acquire(&path, false).unwrap();
            panic!("boom");
        });
        assert!(res.is_err());
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn liveness_probe() {
        assert!(pid_alive(std::process::id()));
        assert!(!pid_alive(0));
        assert!(!pid_alive(u32::MAX));
    }

    #[test]
    fn garbage_marker_has_no_holder() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("tpcc.pid");
        fs::write(&marker, "not-a-pid").unwrap();
        assert_eq!(read_holder(&marker), None);
    }
}
