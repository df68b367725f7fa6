//! Directory and database locking primitives.
//!
//! `DirLock` guards a directory with a sibling `.lock` file taken via
//! `fs2`'s advisory file locking, matching the acquire-then-use pattern the
//! teacher relies on in `Cache::load`/`Cache::checkout_build` (the actual
//! `DirLock` type lived in `util::lock` there too, just never made it into
//! the retrieved slice). `DbLock` is the analogous guard used by the
//! configuration store and the fetch cache for their `EXCLUSIVE` SQLite
//! locking mode (spec §4.1, §4.4).

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::util::errors::{ErrorKind, Res};

/// An acquired, exclusive lock on a directory. The directory is created if
/// missing. Dropping the guard releases the lock.
pub struct DirLock {
    path: PathBuf,
    _file: File,
}

impl DirLock {
    pub fn acquire(path: &Path) -> Res<Self> {
        fs::create_dir_all(path).map_err(|_| ErrorKind::Io(path.to_path_buf()))?;

        let lock_path = path.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|_| ErrorKind::Io(lock_path.clone()))?;

        file.try_lock_exclusive()
            .map_err(|_| ErrorKind::ConfigBusy(path.to_path_buf()))?;

        Ok(DirLock {
            path: path.to_path_buf(),
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self._file.unlock();
    }
}

/// Exclusive lock on a single file (used for the configuration's and the
/// fetch cache's SQLite databases, in addition to SQLite's own
/// `locking_mode=EXCLUSIVE`, so that two `bpkg` processes poll-fail fast
/// with a "busy" diagnostic rather than blocking indefinitely inside
/// SQLite).
pub struct DbLock {
    file: File,
}

impl DbLock {
    pub fn try_acquire(db_path: &Path) -> Res<Self> {
        let lock_path = Self::lock_path(db_path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|_| ErrorKind::Io(lock_path.clone()))?;

        file.try_lock_exclusive()
            .map_err(|_| ErrorKind::ConfigBusy(db_path.to_path_buf()))?;

        Ok(DbLock { file })
    }

    fn lock_path(db_path: &Path) -> PathBuf {
        let mut s = db_path.as_os_str().to_owned();
        s.push(".lock");
        PathBuf::from(s)
    }
}

impl Drop for DbLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
