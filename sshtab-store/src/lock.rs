use crate::error::{StoreError, StoreResult};
use nix::errno::Errno;
use nix::fcntl::{FlockArg, flock};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::MetadataExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockMode {
    Shared,
    Exclusive,
}

impl LockMode {
    fn arg(self) -> FlockArg {
        match self {
            LockMode::Shared => FlockArg::LockShared,
            LockMode::Exclusive => FlockArg::LockExclusive,
        }
    }
}

/// An open file holding an advisory `flock` for the lifetime of the guard.
///
/// The lock is released on drop, before the file is closed.
pub(crate) struct LockGuard {
    file: File,
}

impl LockGuard {
    fn acquire(file: File, mode: LockMode) -> io::Result<Self> {
        loop {
            match flock(file.as_raw_fd(), mode.arg()) {
                Ok(()) => return Ok(LockGuard { file }),
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(io::Error::from(errno)),
            }
        }
    }

    pub(crate) fn file(&self) -> &File {
        &self.file
    }

    /// Read the whole file from the current offset.
    pub(crate) fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        (&self.file).read_to_end(&mut content)?;
        Ok(content)
    }

    /// Whether the locked inode is still the one linked at `path`.
    fn is_current(&self, path: &Path) -> io::Result<bool> {
        let held = self.file.metadata()?;
        match fs::metadata(path) {
            Ok(linked) => Ok(held.dev() == linked.dev() && held.ino() == linked.ino()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(errno) = flock(self.file.as_raw_fd(), FlockArg::Unlock) {
            debug!("flock unlock failed: {}", errno);
        }
    }
}

/// Open `path` with `options` and lock it.
///
/// A writer may rename a new file over `path` while we wait for the lock,
/// leaving us locked on an unlinked inode. In that case the lock is dropped
/// and the path reopened, so the returned guard always covers the live file.
///
/// Returns `Ok(None)` when `path` does not exist and `options` does not
/// create it.
pub(crate) fn open_locked(
    path: &Path,
    options: &OpenOptions,
    mode: LockMode,
) -> StoreResult<Option<LockGuard>> {
    loop {
        let file = match options.open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io("open")(err)),
        };
        let guard = LockGuard::acquire(file, mode).map_err(StoreError::io("flock"))?;
        if guard.is_current(path).map_err(StoreError::io("stat"))? {
            return Ok(Some(guard));
        }
        debug!("{} was replaced while locking, reopening", path.display());
    }
}
