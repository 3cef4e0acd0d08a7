//! Directory-wide reader/writer lock backed by an OS file lock.
//!
//! Every operation opens its own handle on the lock file, so the lock
//! serializes threads of one process as well as separate processes.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{TipsError, TipsResult};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Shared,
    Exclusive,
}

/// Held lock; released on drop.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
    kind: LockKind,
}

impl DirLock {
    /// Acquire `kind` on the lock file at `path`.
    ///
    /// With `timeout == None` this blocks until the lock is free. Otherwise it
    /// polls and gives up with `ConcurrentWriteConflict` once `timeout` passes.
    pub fn acquire(path: &Path, kind: LockKind, timeout: Option<Duration>) -> TipsResult<Self> {
        let file = open_lock_file(path)?;

        match timeout {
            None => {
                let res = match kind {
                    LockKind::Shared => file.lock_shared(),
                    LockKind::Exclusive => file.lock(),
                };
                res.map_err(|e| TipsError::storage(path, e))?;
            }
            Some(limit) => {
                let started = Instant::now();
                loop {
                    let attempt = match kind {
                        LockKind::Shared => file.try_lock_shared(),
                        LockKind::Exclusive => file.try_lock(),
                    };
                    match attempt {
                        Ok(()) => break,
                        Err(TryLockError::WouldBlock) => {
                            let waited = started.elapsed();
                            if waited >= limit {
                                warn!(?kind, waited_ms = %waited.as_millis(), "gave up waiting for state lock");
                                return Err(TipsError::ConcurrentWriteConflict {
                                    waited_ms: waited.as_millis(),
                                });
                            }
                            std::thread::sleep(POLL_INTERVAL.min(limit - waited));
                        }
                        Err(TryLockError::Error(e)) => return Err(TipsError::storage(path, e)),
                    }
                }
            }
        }

        debug!(?kind, path = %path.display(), "acquired state lock");
        Ok(DirLock {
            file,
            path: path.to_path_buf(),
            kind,
        })
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        // Closing the handle would release it too.
        if self.file.unlock().is_ok() {
            debug!(kind = ?self.kind, path = %self.path.display(), "released state lock");
        }
    }
}

pub(crate) fn open_lock_file(path: &Path) -> TipsResult<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| TipsError::storage(path, e))
}
