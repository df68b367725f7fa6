//! Garbage collection over the fetch cache (spec §4.4 "Garbage
//! collection"): LRU eviction driven by `access_time`, run while the
//! exclusive lock on `fetch-cache.sqlite3` is held so no concurrent
//! fetch can race a reclaim.

use rusqlite::params;
use slog::{info, Logger};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::store::{FetchCache, SharedSourceDirectory};
use crate::util::errors::{ErrorKind, Res};

/// What a GC pass decided to remove, before anything on disk is
/// actually touched — callers apply it, then erase the rows in the
/// same pass (spec §4.2/§5 crash-safety discipline: compute first,
/// mutate state last).
#[derive(Debug, Default)]
pub struct GcPlan {
    pub pkg_metadata_dirs: Vec<(String, PathBuf)>,
    pub pkg_package_archives: Vec<(String, PathBuf)>,
    pub git_state_dirs: Vec<(String, PathBuf)>,
    pub shared_src_dirs: Vec<((String, String), PathBuf)>,
}

impl GcPlan {
    pub fn is_empty(&self) -> bool {
        self.pkg_metadata_dirs.is_empty()
            && self.pkg_package_archives.is_empty()
            && self.git_state_dirs.is_empty()
            && self.shared_src_dirs.is_empty()
    }
}

/// Plan eviction of everything older than `max_age`, honoring the
/// shared-src gate (a source directory with a non-empty
/// `configurations` list is still referenced by a live configuration
/// and must not be reclaimed regardless of age).
pub fn plan(cache: &FetchCache, max_age: Duration) -> Res<GcPlan> {
    let cutoff = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
        - max_age.as_secs() as i64;

    let mut gc = GcPlan::default();
    let conn = cache.connection();

    {
        let mut stmt = conn
            .prepare("SELECT url, dir FROM pkg_repository_metadata WHERE access_time < ?1")
            .map_err(|_| ErrorKind::Logic("unable to scan pkg_repository_metadata".to_string()))?;
        let rows = stmt
            .query_map(params![cutoff], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|_| ErrorKind::Logic("unable to scan pkg_repository_metadata".to_string()))?;
        for row in rows {
            let (url, dir) = row.map_err(|_| ErrorKind::Logic("corrupt pkg_repository_metadata row".to_string()))?;
            gc.pkg_metadata_dirs.push((url, cache.root.join("pkg/metadata").join(dir)));
        }
    }

    {
        let mut stmt = conn
            .prepare("SELECT package_id, archive FROM pkg_repository_package WHERE access_time < ?1")
            .map_err(|_| ErrorKind::Logic("unable to scan pkg_repository_package".to_string()))?;
        let rows = stmt
            .query_map(params![cutoff], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|_| ErrorKind::Logic("unable to scan pkg_repository_package".to_string()))?;
        for row in rows {
            let (id, archive) = row.map_err(|_| ErrorKind::Logic("corrupt pkg_repository_package row".to_string()))?;
            gc.pkg_package_archives.push((id, PathBuf::from(archive)));
        }
    }

    {
        let mut stmt = conn
            .prepare("SELECT url, dir FROM git_repository_state WHERE access_time < ?1")
            .map_err(|_| ErrorKind::Logic("unable to scan git_repository_state".to_string()))?;
        let rows = stmt
            .query_map(params![cutoff], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|_| ErrorKind::Logic("unable to scan git_repository_state".to_string()))?;
        for row in rows {
            let (url, dir) = row.map_err(|_| ErrorKind::Logic("corrupt git_repository_state row".to_string()))?;
            gc.git_state_dirs.push((url, cache.root.join("git").join(dir)));
        }
    }

    {
        let mut stmt = conn
            .prepare("SELECT package_id, version, directory, configurations FROM shared_source_directory WHERE access_time < ?1")
            .map_err(|_| ErrorKind::Logic("unable to scan shared_source_directory".to_string()))?;
        let rows = stmt
            .query_map(params![cutoff], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
            })
            .map_err(|_| ErrorKind::Logic("unable to scan shared_source_directory".to_string()))?;
        for row in rows {
            let (package_id, version, directory, configs) =
                row.map_err(|_| ErrorKind::Logic("corrupt shared_source_directory row".to_string()))?;
            if SharedSourceDirectory::parse(&configs).evictable() {
                gc.shared_src_dirs.push(((package_id, version), PathBuf::from(directory)));
            }
        }
    }

    Ok(gc)
}

/// Apply a previously computed plan: remove directories/files on disk,
/// then erase the corresponding rows. Best-effort on the filesystem
/// side — a missing directory is not an error, since a prior crashed
/// GC pass may already have removed it.
pub fn apply(cache: &FetchCache, gc: &GcPlan, log: &Logger) -> Res<()> {
    let conn = cache.connection();

    for (url, dir) in &gc.pkg_metadata_dirs {
        remove_path(dir)?;
        conn.execute("DELETE FROM pkg_repository_metadata WHERE url = ?1", params![url])
            .map_err(|_| ErrorKind::Logic("unable to delete pkg_repository_metadata row".to_string()))?;
        info!(log, "gc: reclaimed repository metadata"; "url" => url.as_str());
    }

    for (id, archive) in &gc.pkg_package_archives {
        remove_path(archive)?;
        conn.execute("DELETE FROM pkg_repository_package WHERE package_id = ?1", params![id])
            .map_err(|_| ErrorKind::Logic("unable to delete pkg_repository_package row".to_string()))?;
        info!(log, "gc: reclaimed package archive"; "package_id" => id.as_str());
    }

    for (url, dir) in &gc.git_state_dirs {
        remove_path(dir)?;
        conn.execute("DELETE FROM git_repository_state WHERE url = ?1", params![url])
            .map_err(|_| ErrorKind::Logic("unable to delete git_repository_state row".to_string()))?;
        info!(log, "gc: reclaimed git repository state"; "url" => url.as_str());
    }

    for ((id, version), dir) in &gc.shared_src_dirs {
        remove_path(dir)?;
        conn.execute(
            "DELETE FROM shared_source_directory WHERE package_id = ?1 AND version = ?2",
            params![id, version],
        )
        .map_err(|_| ErrorKind::Logic("unable to delete shared_source_directory row".to_string()))?;
        info!(log, "gc: reclaimed shared source directory"; "package_id" => id.as_str(), "version" => version.as_str());
    }

    Ok(())
}

fn remove_path(path: &PathBuf) -> Res<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path).map_err(|_| ErrorKind::Io(path.clone()))?;
    } else if path.exists() {
        std::fs::remove_file(path).map_err(|_| ErrorKind::Io(path.clone()))?;
    }
    Ok(())
}
