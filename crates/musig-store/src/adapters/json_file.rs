//! # JSON File Snapshot Store
//!
//! One flat JSON file per network mode, guarded by an advisory lock.
//!
//! ```text
//! <data_dir>/
//! ├── <mode>.json        snapshot, object keyed by canonical id
//! ├── <mode>.json.lock   exclusive lock, holds the owner's PID
//! └── <mode>.json.tmp    transient, renamed over the snapshot
//! ```
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use crate::domain::{SnapshotCodec, StoreError, StoreTransaction, EMPTY_SNAPSHOT};
use crate::ports::outbound::SnapshotStore;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exclusive lock on a snapshot file.
///
/// Held for the lifetime of the owning store, released on drop. The lock
/// file itself persists; the next owner truncates it and writes its PID.
#[derive(Debug)]
pub struct SnapshotLock {
    /// Kept open to maintain the lock.
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Acquires the lock without blocking.
    pub fn acquire(path: &Path) -> Result<Self, StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            let mut owner = String::new();
            let _ = file.read_to_string(&mut owner);
            let owner = owner.trim();
            return Err(StoreError::internal(if owner.is_empty() {
                format!("snapshot already in use ({})", path.display())
            } else {
                format!(
                    "snapshot already in use by process {} ({})",
                    owner,
                    path.display()
                )
            }));
        }

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    /// Unlocks but leaves the file in place. Removing it would let two
    /// owners lock different inodes at the same path.
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Snapshot store backed by `<data_dir>/<mode>.json`.
#[derive(Debug)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
    codec: SnapshotCodec,
    _lock: SnapshotLock,
}

impl JsonFileSnapshotStore {
    /// Opens the snapshot for `mode`, creating the directory and an empty
    /// snapshot if needed.
    ///
    /// # Errors
    /// `Internal` if the directory cannot be created or another process
    /// holds the lock.
    pub fn open(data_dir: &Path, mode: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;

        let path = data_dir.join(format!("{}.json", mode));
        let lock = SnapshotLock::acquire(&data_dir.join(format!("{}.json.lock", mode)))?;

        if !path.exists() {
            Self::write_atomic(&path, EMPTY_SNAPSHOT.as_bytes())?;
            info!(path = %path.display(), "Created empty snapshot");
        }

        Ok(Self {
            path,
            codec: SnapshotCodec::new(),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes via a temp file, fsync, then rename over the target.
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Vec<StoreTransaction>, StoreError> {
        let bytes = std::fs::read(&self.path)?;
        let records = self.codec.decode(&bytes)?;
        debug!(path = %self.path.display(), count = records.len(), "Read snapshot");
        Ok(records)
    }

    fn replace_all(&self, records: &[StoreTransaction]) -> Result<(), StoreError> {
        let bytes = self.codec.encode(records)?;
        Self::write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), count = records.len(), "Wrote snapshot");
        Ok(())
    }
}
