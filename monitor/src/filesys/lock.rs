//! Advisory locks for files shared between monitor processes
//!
//! The lock lives in a sibling `{file}.lock` so that replacing the target file
//! (temp file + rename) never drops a lock another process is holding.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// An exclusive advisory lock beside a shared file
#[derive(Debug, Clone)]
pub struct FileLock {
    lock_path: PathBuf,
}

impl FileLock {
    /// Lock for `path`; the parent directory is created if missing
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        let lock_path = path.with_file_name(name);

        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { lock_path })
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Block until the exclusive lock is held
    pub fn exclusive(&self) -> io::Result<LockGuard> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;

        #[cfg(unix)]
        {
            use nix::fcntl::{Flock, FlockArg};

            match Flock::lock(file, FlockArg::LockExclusive) {
                Ok(flock) => Ok(LockGuard { _flock: flock }),
                Err((_, errno)) => Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("flock failed: {}", errno),
                )),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = file;
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "File locking not supported on this platform",
            ))
        }
    }
}

/// Holds the lock until dropped
#[derive(Debug)]
pub struct LockGuard {
    #[cfg(unix)]
    _flock: nix::fcntl::Flock<File>,
}
