//! Advisory file locking.
//!
//! RAII guard over `flock(2)`: shared for cache reads, exclusive for
//! entry creation. Locks are advisory (only cooperating processes honor
//! them), and the kernel drops them when the file handle closes, so an
//! early return can never leak one.

use std::fs::File;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Lock flavor for [`FileLock::acquire`] and the handler `lock` op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Holds an advisory lock on a file until dropped.
pub struct FileLock<'a> {
    file: &'a File,
    held: bool,
}

impl<'a> FileLock<'a> {
    /// Blockingly acquire `mode` on `file`.
    ///
    /// Returns the guard even when the underlying lock call fails (for
    /// example on filesystems without flock support); the lock is
    /// best-effort and [`held`](Self::held) reports what happened.
    pub fn acquire(file: &'a File, mode: LockMode) -> Self {
        let held = lock_file(file, mode);
        Self { file, held }
    }

    /// Whether the advisory lock was actually taken.
    pub fn held(&self) -> bool {
        self.held
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        if self.held {
            unlock_file(self.file);
        }
    }
}

#[cfg(unix)]
pub(crate) fn lock_file(file: &File, mode: LockMode) -> bool {
    let op = match mode {
        LockMode::Shared => libc::LOCK_SH,
        LockMode::Exclusive => libc::LOCK_EX,
    };
    // Safety: the fd is valid for the lifetime of `file`.
    unsafe { libc::flock(file.as_raw_fd(), op) == 0 }
}

#[cfg(unix)]
fn unlock_file(file: &File) {
    // Safety: as above. Errors are ignored; close releases regardless.
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
pub(crate) fn lock_file(_file: &File, _mode: LockMode) -> bool {
    false
}

#[cfg(not(unix))]
fn unlock_file(_file: &File) {}
