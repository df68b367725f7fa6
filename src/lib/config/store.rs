//! Opening a configuration (spec §4.1): creates or attaches
//! `<cfg>/.bpkg/bpkg.sqlite3`, takes an exclusive lock, verifies/migrates
//! the schema, and caches the self-row for logging.

use rusqlite::Connection;
use slog::Logger;
use std::path::{Path, PathBuf};

use super::schema;
use crate::types::ConfigUuid;
use crate::util::errors::{ErrorKind, Res};
use crate::util::lock::DbLock;

/// An open, locked configuration database (spec §3/§4.1).
pub struct Config {
    pub directory: PathBuf,
    pub uuid: ConfigUuid,
    pub name: Option<String>,
    pub type_: String,
    pub(crate) conn: Connection,
    /// Held for the lifetime of `Config`; released on drop.
    _lock: DbLock,
    pub log: Logger,
}

fn db_path(directory: &Path) -> PathBuf {
    directory.join(".bpkg").join("bpkg.sqlite3")
}

impl Config {
    /// Create a brand new configuration at `directory` (must not already
    /// contain a `.bpkg` directory — spec §4.1's precondition is enforced
    /// by the caller, typically `command::create`).
    pub fn create(directory: &Path, type_: &str, name: Option<String>, log: Logger) -> Res<Self> {
        let bpkg_dir = directory.join(".bpkg");
        if bpkg_dir.exists() {
            return Err(ErrorKind::ConfigDirNotEmpty(directory.to_path_buf()).into());
        }
        std::fs::create_dir_all(&bpkg_dir).map_err(|_| ErrorKind::Io(bpkg_dir.clone()))?;

        let uuid = ConfigUuid::generate();
        let mut cfg = Self::open_internal(directory, log)?;
        cfg.conn
            .execute(
                "INSERT INTO config (id, uuid, name, type) VALUES (0, ?1, ?2, ?3)",
                rusqlite::params![uuid.to_string(), name, type_],
            )
            .map_err(|_| ErrorKind::Logic("unable to write self-row".to_string()))?;
        cfg.uuid = uuid;
        cfg.name = name;
        cfg.type_ = type_.to_string();
        Ok(cfg)
    }

    /// Open an existing configuration, acquiring the exclusive lock and
    /// running schema migration if needed (spec §4.1 steps a-c).
    pub fn open(directory: &Path, log: Logger) -> Res<Self> {
        let mut cfg = Self::open_internal(directory, log)?;
        cfg.load_self_row()?;
        Ok(cfg)
    }

    fn open_internal(directory: &Path, log: Logger) -> Res<Self> {
        let path = db_path(directory);
        let lock = DbLock::try_acquire(&path)?;

        let conn = Connection::open(&path)
            .map_err(|_| ErrorKind::ConfigBusy(directory.to_path_buf()))?;
        conn.pragma_update(None, "locking_mode", "EXCLUSIVE")
            .map_err(|_| ErrorKind::ConfigBusy(directory.to_path_buf()))?;
        // Force SQLite to actually take the exclusive lock now rather
        // than lazily on first write (spec §4.1 step a).
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")
            .map_err(|_| ErrorKind::ConfigBusy(directory.to_path_buf()))?;

        schema::open_and_migrate(&conn)?;

        let child_log = log.new(slog::o!("configuration" => directory.display().to_string()));

        Ok(Config {
            directory: directory.to_path_buf(),
            uuid: ConfigUuid::generate(),
            name: None,
            type_: String::new(),
            conn,
            _lock: lock,
            log: child_log,
        })
    }

    fn load_self_row(&mut self) -> Res<()> {
        let (uuid_s, name, type_): (String, Option<String>, String) = self
            .conn
            .query_row("SELECT uuid, name, type FROM config WHERE id = 0", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|_| ErrorKind::Logic("missing configuration self-row".to_string()))?;

        self.uuid = ConfigUuid::parse(&uuid_s)
            .ok_or_else(|| ErrorKind::Logic("malformed configuration uuid".to_string()))?;
        self.name = name;
        self.type_ = type_;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
