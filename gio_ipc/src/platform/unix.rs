//! Unix byte-range locks and process queries.
//!
//! Linux and Android use open-file-description locks, which belong to the
//! open file rather than the process. Two store handles in one process then
//! exclude each other the same way two processes do. Other Unix systems
//! fall back to classic POSIX record locks.

use crate::error::{IpcError, IpcResult, LockRegion};
use crate::liveness::Pid;
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, fcntl};
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::ops::Range;
use tracing::{trace, warn};

/// Issues blocking exclusive locks on byte ranges of the shared file.
pub struct RangeLocker {
    file: File,
}

impl RangeLocker {
    /// Wrap the open shared file.
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Block until `range` is exclusively locked.
    ///
    /// The lock is released when the returned guard is dropped. Locks are
    /// not re-entrant; callers must not lock overlapping ranges twice.
    pub fn lock(&self, range: Range<usize>, region: LockRegion) -> IpcResult<RangeGuard<'_>> {
        let request = flock_request(libc::F_WRLCK, &range);
        loop {
            match fcntl(&self.file, set_lock_wait(&request)) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(source) => {
                    warn!("Failed to lock {:?} {:?}: {}", region, range, source);
                    return Err(IpcError::LockAcquisitionFailed { region, source });
                }
            }
        }
        trace!("Locked {:?} {:?}", region, range);
        Ok(RangeGuard {
            locker: self,
            range,
            region,
        })
    }

    fn unlock(&self, range: &Range<usize>) -> nix::Result<()> {
        let request = flock_request(libc::F_UNLCK, range);
        fcntl(&self.file, set_lock(&request)).map(drop)
    }
}

/// Held byte-range lock, released on drop.
#[must_use]
pub struct RangeGuard<'a> {
    locker: &'a RangeLocker,
    range: Range<usize>,
    region: LockRegion,
}

impl RangeGuard<'_> {
    /// Locked region.
    pub fn region(&self) -> LockRegion {
        self.region
    }
}

impl Drop for RangeGuard<'_> {
    fn drop(&mut self) {
        match self.locker.unlock(&self.range) {
            Ok(()) => trace!("Unlocked {:?} {:?}", self.region, self.range),
            Err(e) => warn!("Failed to unlock {:?} {:?}: {}", self.region, self.range, e),
        }
    }
}

fn flock_request(kind: libc::c_int, range: &Range<usize>) -> libc::flock {
    libc::flock {
        l_type: kind as libc::c_short,
        l_whence: libc::SEEK_SET as libc::c_short,
        l_start: range.start as libc::off_t,
        l_len: range.len() as libc::off_t,
        // Must be zero for open-file-description locks.
        l_pid: 0,
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_lock_wait(request: &libc::flock) -> FcntlArg<'_> {
    FcntlArg::F_OFD_SETLKW(request)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_lock(request: &libc::flock) -> FcntlArg<'_> {
    FcntlArg::F_OFD_SETLK(request)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_lock_wait(request: &libc::flock) -> FcntlArg<'_> {
    FcntlArg::F_SETLKW(request)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_lock(request: &libc::flock) -> FcntlArg<'_> {
    FcntlArg::F_SETLK(request)
}

/// PID of the calling process.
pub fn current_pid() -> Pid {
    nix::unistd::getpid().as_raw()
}

/// Check whether `pid` is running using a null signal.
pub fn pid_is_running(pid: Pid) -> bool {
    use nix::sys::signal::kill;

    if pid <= 0 {
        return false;
    }
    match kill(nix::unistd::Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // Exists, owned by someone else
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// PIDs of all running processes owned by the current user.
///
/// Scans `/proc`; entries that vanish mid-scan are skipped.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn running_processes_same_user() -> io::Result<HashSet<Pid>> {
    use std::os::unix::fs::MetadataExt;

    let uid = nix::unistd::getuid().as_raw();
    let mut pids = HashSet::new();
    for entry in std::fs::read_dir("/proc")? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<Pid>().ok()) else {
            continue;
        };
        match entry.metadata() {
            Ok(meta) if meta.uid() == uid => {
                pids.insert(pid);
            }
            _ => {}
        }
    }
    Ok(pids)
}

/// PIDs of all running processes owned by the current user.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn running_processes_same_user() -> io::Result<HashSet<Pid>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "process enumeration requires /proc",
    ))
}
