//! `fetch-cache.sqlite3` (spec §4.4): de-duplicates downloads across
//! runs and tracks session-scoped revalidation.

use rusqlite::{Connection, OptionalExtension};
use slog::Logger;
use std::path::{Path, PathBuf};

use crate::repository::auth::{TrustCache, TrustDecision};
use crate::types::SessionId;
use crate::util::errors::{ErrorKind, Res};
use crate::util::lock::DbLock;

pub struct FetchCache {
    pub root: PathBuf,
    conn: Connection,
    _lock: DbLock,
    pub log: Logger,
}

/// Result of `load_pkg_repository_metadata` (spec §4.4 "Lookup"): either
/// cold (nothing cached), needs revalidation (cached but from a
/// different session, carrying the expected checksums to compare
/// against a fresh fetch), or already validated this session.
pub enum MetadataLookup {
    Cold,
    NeedsRevalidation { repositories_checksum: String, packages_checksum: String },
    Validated { repositories_path: PathBuf, packages_path: PathBuf },
}

impl FetchCache {
    pub fn open(root: &Path, log: Logger) -> Res<Self> {
        std::fs::create_dir_all(root).map_err(|_| ErrorKind::Io(root.to_path_buf()))?;
        let db_path = root.join("fetch-cache.sqlite3");
        let lock = DbLock::try_acquire(&db_path)?;
        let conn = Connection::open(&db_path).map_err(|_| ErrorKind::ConfigBusy(root.to_path_buf()))?;
        conn.pragma_update(None, "locking_mode", "EXCLUSIVE")
            .map_err(|_| ErrorKind::ConfigBusy(root.to_path_buf()))?;

        create_schema(&conn)?;

        for dir in ["pkg/metadata", "pkg/packages", "git", "src"] {
            std::fs::create_dir_all(root.join(dir)).map_err(|_| ErrorKind::Io(root.join(dir)))?;
        }

        Ok(FetchCache { root: root.to_path_buf(), conn, _lock: lock, log })
    }

    pub fn load_pkg_repository_metadata(&self, url: &str, session: &SessionId) -> Res<MetadataLookup> {
        let row: Option<(String, String, String, String, String)> = self
            .conn
            .query_row(
                "SELECT session, repositories_path, repositories_checksum, packages_path, packages_checksum \
                 FROM pkg_repository_metadata WHERE url = ?1",
                [url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
            .map_err(|_| ErrorKind::Logic("unable to query fetch cache".to_string()))?;

        Ok(match row {
            None => MetadataLookup::Cold,
            Some((cached_session, repos_path, repos_cksum, pkgs_path, pkgs_cksum)) => {
                if cached_session == session.0 {
                    MetadataLookup::Validated {
                        repositories_path: PathBuf::from(repos_path),
                        packages_path: PathBuf::from(pkgs_path),
                    }
                } else {
                    MetadataLookup::NeedsRevalidation {
                        repositories_checksum: repos_cksum,
                        packages_checksum: pkgs_cksum,
                    }
                }
            }
        })
    }

    /// Atomically (create-or-update) record a validated fetch (spec
    /// §4.4: "creates or updates the entry atomically and removes any
    /// partial artifacts").
    #[allow(clippy::too_many_arguments)]
    pub fn save_pkg_repository_metadata(
        &self,
        url: &str,
        dir: &str,
        session: &SessionId,
        repositories_path: &Path,
        repositories_checksum: &str,
        packages_path: &Path,
        packages_checksum: &str,
    ) -> Res<()> {
        self.conn
            .execute(
                "INSERT INTO pkg_repository_metadata \
                 (url, dir, session, access_time, repositories_path, repositories_checksum, packages_path, packages_checksum) \
                 VALUES (?1, ?2, ?3, strftime('%s','now'), ?4, ?5, ?6, ?7) \
                 ON CONFLICT(url) DO UPDATE SET \
                 dir = excluded.dir, session = excluded.session, access_time = excluded.access_time, \
                 repositories_path = excluded.repositories_path, repositories_checksum = excluded.repositories_checksum, \
                 packages_path = excluded.packages_path, packages_checksum = excluded.packages_checksum",
                rusqlite::params![
                    url,
                    dir,
                    session.0,
                    repositories_path.to_string_lossy().to_string(),
                    repositories_checksum,
                    packages_path.to_string_lossy().to_string(),
                    packages_checksum,
                ],
            )
            .map_err(|_| ErrorKind::Logic("unable to write fetch cache entry".to_string()))?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn create_schema(conn: &Connection) -> Res<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pkg_repository_metadata (
            url TEXT PRIMARY KEY,
            dir TEXT NOT NULL,
            session TEXT NOT NULL,
            access_time INTEGER NOT NULL,
            repositories_path TEXT NOT NULL,
            repositories_checksum TEXT NOT NULL,
            packages_path TEXT NOT NULL,
            packages_checksum TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS pkg_repository_package (
            package_id TEXT PRIMARY KEY,
            version TEXT NOT NULL,
            access_time INTEGER NOT NULL,
            archive TEXT NOT NULL,
            checksum TEXT NOT NULL,
            repository TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS git_repository_state (
            url TEXT PRIMARY KEY,
            dir TEXT NOT NULL,
            session TEXT NOT NULL,
            access_time INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS shared_source_directory (
            package_id TEXT NOT NULL,
            version TEXT NOT NULL,
            access_time INTEGER NOT NULL,
            directory TEXT NOT NULL,
            repository TEXT NOT NULL,
            origin_id TEXT NOT NULL,
            src_root_marker TEXT NOT NULL,
            configurations TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (package_id, version)
        );
        CREATE TABLE IF NOT EXISTS pkg_repository_auth (
            fingerprint TEXT PRIMARY KEY,
            cn TEXT NOT NULL,
            expiry INTEGER NOT NULL,
            dummy INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
    .map_err(|_| ErrorKind::Logic("unable to create fetch cache schema".to_string()))?;
    Ok(())
}

/// Adapts `FetchCache`'s `pkg_repository_auth` table to the
/// `repository::auth::TrustCache` seam.
impl TrustCache for FetchCache {
    fn lookup(&self, fingerprint: &str) -> Option<TrustDecision> {
        self.conn
            .query_row(
                "SELECT dummy FROM pkg_repository_auth WHERE fingerprint = ?1",
                [fingerprint],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .ok()
            .flatten()
            .map(|dummy| if dummy != 0 { TrustDecision::Dummy } else { TrustDecision::Trusted })
    }

    fn record(&mut self, fingerprint: &str, cn: &str, expiry: chrono::DateTime<chrono::Utc>, decision: TrustDecision) {
        let dummy = matches!(decision, TrustDecision::Dummy) as i64;
        let _ = self.conn.execute(
            "INSERT OR REPLACE INTO pkg_repository_auth (fingerprint, cn, expiry, dummy) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![fingerprint, cn, expiry.timestamp(), dummy],
        );
    }
}

/// The list of configurations referencing a shared source directory
/// (spec §4.4 "Shared-src mode"): each entry is a `src-root.build` path.
/// Eviction is gated on this list being empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharedSourceDirectory {
    pub configurations: Vec<PathBuf>,
}

impl SharedSourceDirectory {
    pub fn parse(raw: &str) -> Self {
        SharedSourceDirectory {
            configurations: raw.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect(),
        }
    }

    pub fn render(&self) -> String {
        self.configurations
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }

    pub fn add(&mut self, config_path: &Path) {
        if !self.configurations.iter().any(|p| p == config_path) {
            self.configurations.push(config_path.to_path_buf());
        }
    }

    pub fn remove(&mut self, config_path: &Path) {
        self.configurations.retain(|p| p != config_path);
    }

    pub fn evictable(&self) -> bool {
        self.configurations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_source_directory_roundtrips() {
        let mut s = SharedSourceDirectory::default();
        s.add(Path::new("/cfg1/src-root.build"));
        s.add(Path::new("/cfg2/src-root.build"));
        let rendered = s.render();
        let parsed = SharedSourceDirectory::parse(&rendered);
        assert_eq!(parsed.configurations.len(), 2);
        assert!(!parsed.evictable());
    }

    #[test]
    fn empty_list_is_evictable() {
        let s = SharedSourceDirectory::default();
        assert!(s.evictable());
    }

    #[test]
    fn cold_lookup_when_nothing_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::open(dir.path(), Logger::root(slog::Discard, slog::o!())).unwrap();
        let session = SessionId::generate();
        let lookup = cache.load_pkg_repository_metadata("https://example.org/repo", &session).unwrap();
        assert!(matches!(lookup, MetadataLookup::Cold));
    }
}
