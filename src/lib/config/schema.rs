//! Schema versioning and migration (spec §4.1: "verifies that schema
//! version is within `[base, current]` ... and runs monotonic migrations
//! otherwise").

use rusqlite::{Connection, OptionalExtension};

use crate::util::errors::{ErrorKind, Res};

/// The oldest schema version this build still knows how to migrate from.
pub const BASE_SCHEMA_VERSION: u32 = 1;
/// The schema version this build writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// One monotonic migration step, `from -> from + 1`.
type Migration = fn(&Connection) -> Res<()>;

fn migrations() -> Vec<Migration> {
    vec![migrate_v1_to_v2, migrate_v2_to_v3]
}

pub fn schema_version(conn: &Connection) -> Res<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map(|v| v as u32)
        .map_err(|_| ErrorKind::Logic("unable to read schema version".to_string()).into())
}

fn set_schema_version(conn: &Connection, version: u32) -> Res<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {}", version))
        .map_err(|_| ErrorKind::Logic("unable to write schema version".to_string()).into())
}

/// Create the schema fresh at `CURRENT_SCHEMA_VERSION` for a brand new
/// configuration database.
pub fn create_fresh(conn: &Connection) -> Res<()> {
    conn.execute_batch(
        "
        CREATE TABLE config (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            uuid TEXT NOT NULL,
            name TEXT,
            type TEXT NOT NULL
        );
        CREATE TABLE config_link (
            name TEXT NOT NULL,
            uuid TEXT NOT NULL,
            path TEXT NOT NULL,
            relative INTEGER NOT NULL,
            explicit INTEGER NOT NULL,
            PRIMARY KEY (name)
        );
        CREATE TABLE selected_package (
            name TEXT NOT NULL,
            version TEXT NOT NULL,
            state TEXT NOT NULL,
            substate TEXT NOT NULL,
            hold_package INTEGER NOT NULL,
            hold_version INTEGER NOT NULL,
            repository_fragment TEXT,
            archive TEXT,
            purge_archive INTEGER NOT NULL,
            src_root TEXT,
            purge_src INTEGER NOT NULL,
            out_root TEXT,
            manifest_checksum TEXT,
            buildfiles_checksum TEXT,
            PRIMARY KEY (name)
        );
        CREATE TABLE prerequisite (
            dependent_name TEXT NOT NULL,
            prerequisite_name TEXT NOT NULL,
            database_path TEXT NOT NULL,
            object_id INTEGER NOT NULL,
            constraint_text TEXT
        );
        ",
    )
    .map_err(|_| ErrorKind::Logic("unable to create schema".to_string()).into())
}

/// Verify the database's schema version is in `[BASE, CURRENT]`, and if
/// it's below `CURRENT`, run migrations one step at a time.
pub fn open_and_migrate(conn: &Connection) -> Res<()> {
    let is_fresh = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'config'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|_| ErrorKind::Logic("unable to probe schema".to_string()))?
        .is_none();

    if is_fresh {
        create_fresh(conn)?;
        set_schema_version(conn, CURRENT_SCHEMA_VERSION)?;
        return Ok(());
    }

    let found = schema_version(conn)?;
    if found < BASE_SCHEMA_VERSION || found > CURRENT_SCHEMA_VERSION {
        return Err(ErrorKind::SchemaVersionUnsupported {
            found,
            base: BASE_SCHEMA_VERSION,
            current: CURRENT_SCHEMA_VERSION,
        }
        .into());
    }

    let steps = migrations();
    let mut version = found;
    while version < CURRENT_SCHEMA_VERSION {
        let step = steps
            .get((version - BASE_SCHEMA_VERSION) as usize)
            .ok_or_else(|| ErrorKind::Logic("missing migration step".to_string()))?;
        step(conn)?;
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Adds the `substate` column (introduced to distinguish `system`
/// packages from ordinary ones).
fn migrate_v1_to_v2(conn: &Connection) -> Res<()> {
    conn.execute_batch("ALTER TABLE selected_package ADD COLUMN substate TEXT NOT NULL DEFAULT 'none'")
        .map_err(|_| ErrorKind::Logic("migration v1->v2 failed".to_string()))?;
    Ok(())
}

/// Purges dangling implicit links whose target directory no longer
/// exists (spec §3 invariant (e): "purged on schema migration").
fn migrate_v2_to_v3(conn: &Connection) -> Res<()> {
    let mut stmt = conn
        .prepare("SELECT name, path FROM config_link WHERE explicit = 0")
        .map_err(|_| ErrorKind::Logic("migration v2->v3 failed".to_string()))?;
    let dangling: Vec<String> = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let path: String = row.get(1)?;
            Ok((name, path))
        })
        .map_err(|_| ErrorKind::Logic("migration v2->v3 failed".to_string()))?
        .filter_map(|r| r.ok())
        .filter(|(_, path)| !std::path::Path::new(path).exists())
        .map(|(name, _)| name)
        .collect();
    drop(stmt);

    for name in dangling {
        conn.execute("DELETE FROM config_link WHERE name = ?1", [name])
            .map_err(|_| ErrorKind::Logic("migration v2->v3 failed".to_string()))?;
    }
    Ok(())
}
