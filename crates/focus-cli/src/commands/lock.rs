//! Exclusive lock held while a command changes timer state.
//!
//! `focus run` keeps its lock for the whole countdown, so `stop`, `reset`
//! and `configure` from another terminal fail fast instead of overwriting
//! progress the running process is about to persist.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

/// Lock file living next to the database.
#[must_use]
pub fn lock_path(database_path: &Path) -> PathBuf {
    database_path.with_extension("lock")
}

/// Released when dropped.
#[derive(Debug)]
pub struct TimerLock {
    file: File,
    path: PathBuf,
}

impl TimerLock {
    /// Takes the lock without waiting.
    ///
    /// # Errors
    ///
    /// Fails if another process holds the lock or the lock file cannot be created.
    pub fn acquire(database_path: &Path) -> Result<Self> {
        let path = lock_path(database_path);
        let file = File::create(&path)
            .with_context(|| format!("failed to create lock file {}", path.display()))?;

        if let Err(err) = file.try_lock_exclusive() {
            if err.kind() == fs2::lock_contended_error().kind() {
                anyhow::bail!("timer is running in another process");
            }
            return Err(err).context("failed to acquire timer lock");
        }

        tracing::debug!(path = %path.display(), "acquired timer lock");
        Ok(Self { file, path })
    }
}

impl Drop for TimerLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), %err, "failed to release timer lock");
        }
    }
}
