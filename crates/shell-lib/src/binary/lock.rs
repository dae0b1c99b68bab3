//! Cross-process lock serializing downloads of one kubectl version
//!
//! Lock file: `<cache_root>/<version>.lock`. It is never deleted, so every
//! process contends on the same inode. The lock is released when the guard
//! is dropped (the file handle is closed).

use crate::error::{Result, ShellError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CacheLock {
    _file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Block (off the async runtime) until the exclusive lock is held
    pub async fn acquire(path: &Path) -> Result<Self> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(owned))
            .await
            .map_err(|e| ShellError::cache(path, std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    fn acquire_blocking(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .map_err(|e| ShellError::cache(&path, e))?;

        if file.try_lock_exclusive().is_err() {
            debug!(path = %path.display(), "Waiting for another download of this version");
            file.lock_exclusive().map_err(|e| ShellError::cache(&path, e))?;
        }

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("v1.29.3.lock");

        let first = CacheLock::acquire(&path).await.unwrap();
        assert!(path.exists());

        let contender_path = path.clone();
        let contender = tokio::spawn(async move { CacheLock::acquire(&contender_path).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!contender.is_finished());

        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(5), contender)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(second.path(), path.as_path());
    }
}
