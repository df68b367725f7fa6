//! Selected packages and lazy cross-configuration pointers (spec §3).

use indexmap::IndexMap;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::str::FromStr;

use super::state::{PackageState, Substate};
use crate::config::store::Config;
use crate::types::{ConfigUuid, Name, Version, VersionConstraint};
use crate::util::errors::{ErrorKind, Res};

/// A `(database, object-id)` pair referencing a selected package,
/// possibly in another configuration's database (spec §3 "Lazy
/// pointer"). Resolving one requires that database to be attached
/// (`config::link::attach_closure`). Comparison is first by object id,
/// then by database identity, per spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LazyPointer {
    pub database: ConfigUuid,
    pub object_id: i64,
}

impl PartialOrd for LazyPointer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LazyPointer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.object_id
            .cmp(&other.object_id)
            .then_with(|| self.database.0.cmp(&other.database.0))
    }
}

/// A per-prerequisite constraint recorded alongside a lazy pointer (spec
/// §3: "map of lazy pointers to selected packages ... with per-
/// prerequisite constraint").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prerequisite {
    pub pointer: LazyPointer,
    pub constraint: VersionConstraint,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectedPackage {
    pub object_id: i64,
    pub name: Name,
    pub version: Version,
    pub state: PackageState,
    pub substate: Substate,
    pub hold_package: bool,
    pub hold_version: bool,
    pub repository_fragment: Option<String>,
    pub archive: Option<PathBuf>,
    pub purge_archive: bool,
    pub src_root: Option<PathBuf>,
    pub purge_src: bool,
    pub out_root: Option<PathBuf>,
    pub manifest_checksum: Option<String>,
    pub buildfiles_checksum: Option<String>,
    pub prerequisites: IndexMap<Name, Prerequisite>,
}

impl SelectedPackage {
    pub fn new(object_id: i64, name: Name, version: Version) -> Self {
        SelectedPackage {
            object_id,
            name,
            version,
            state: PackageState::Transient,
            substate: Substate::None,
            hold_package: false,
            hold_version: false,
            repository_fragment: None,
            archive: None,
            purge_archive: true,
            src_root: None,
            purge_src: true,
            out_root: None,
            manifest_checksum: None,
            buildfiles_checksum: None,
            prerequisites: IndexMap::new(),
        }
    }

    pub fn pointer(&self, database: ConfigUuid) -> LazyPointer {
        LazyPointer {
            database,
            object_id: self.object_id,
        }
    }
}

/// Load the `selected_package` row named `name` from `config` (spec §3:
/// `name` is the table's primary key). Prerequisite rows are loaded
/// alongside from `prerequisite`, keyed by `dependent_name`.
pub fn load(config: &Config, name: &Name) -> Res<Option<SelectedPackage>> {
    let row = config
        .connection()
        .query_row(
            "SELECT rowid, name, version, state, substate, hold_package, hold_version, \
                    repository_fragment, archive, purge_archive, src_root, purge_src, \
                    out_root, manifest_checksum, buildfiles_checksum \
             FROM selected_package WHERE name = ?1",
            [name.as_str()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, i64>(9)?,
                    row.get::<_, Option<String>>(10)?,
                    row.get::<_, i64>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, Option<String>>(13)?,
                    row.get::<_, Option<String>>(14)?,
                ))
            },
        )
        .optional()
        .map_err(|_| ErrorKind::Logic("unable to read selected_package row".to_string()))?;

    let (
        object_id,
        name_s,
        version_s,
        state_s,
        substate_s,
        hold_package,
        hold_version,
        repository_fragment,
        archive,
        purge_archive,
        src_root,
        purge_src,
        out_root,
        manifest_checksum,
        buildfiles_checksum,
    ) = match row {
        Some(r) => r,
        None => return Ok(None),
    };

    let mut selected = SelectedPackage {
        object_id,
        name: Name::from_str(&name_s).map_err(|_| ErrorKind::Logic("malformed package name".to_string()))?,
        version: Version::from_str(&version_s).map_err(|_| ErrorKind::Logic("malformed package version".to_string()))?,
        state: PackageState::from_str(&state_s)?,
        substate: Substate::from_str(&substate_s)?,
        hold_package: hold_package != 0,
        hold_version: hold_version != 0,
        repository_fragment,
        archive: archive.map(PathBuf::from),
        purge_archive: purge_archive != 0,
        src_root: src_root.map(PathBuf::from),
        purge_src: purge_src != 0,
        out_root: out_root.map(PathBuf::from),
        manifest_checksum,
        buildfiles_checksum,
        prerequisites: IndexMap::new(),
    };

    let mut stmt = config
        .connection()
        .prepare("SELECT prerequisite_name, database_path, object_id, constraint_text FROM prerequisite WHERE dependent_name = ?1")
        .map_err(|_| ErrorKind::Logic("unable to read prerequisite rows".to_string()))?;
    let rows = stmt
        .query_map([name.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })
        .map_err(|_| ErrorKind::Logic("unable to read prerequisite rows".to_string()))?;
    for prereq_row in rows {
        let (prereq_name, database_path, object_id, constraint_text) =
            prereq_row.map_err(|_| ErrorKind::Logic("corrupt prerequisite row".to_string()))?;
        let prereq_name = Name::from_str(&prereq_name).map_err(|_| ErrorKind::Logic("malformed prerequisite name".to_string()))?;
        let database = ConfigUuid::parse(&database_path)
            .ok_or_else(|| ErrorKind::Logic("malformed prerequisite database uuid".to_string()))?;
        let constraint = match constraint_text {
            Some(text) => VersionConstraint::from_str(&text).map_err(|_| ErrorKind::Logic("malformed prerequisite constraint".to_string()))?,
            None => VersionConstraint::any(),
        };
        selected.prerequisites.insert(prereq_name, Prerequisite { pointer: LazyPointer { database, object_id }, constraint });
    }

    Ok(Some(selected))
}

/// Insert or replace `selected`'s row (spec §3/§4.2): the package-state
/// operations each mutate an in-memory `SelectedPackage` and the caller
/// persists it with this function inside the same transaction.
pub fn save(config: &Config, selected: &SelectedPackage) -> Res<()> {
    // An upsert rather than `INSERT OR REPLACE`: the latter deletes and
    // re-inserts the conflicting row, which would reassign its SQLite
    // rowid and silently invalidate every `LazyPointer::object_id` other
    // configurations hold to this package (spec §3 "Lazy pointer").
    config
        .connection()
        .execute(
            "INSERT INTO selected_package \
             (name, version, state, substate, hold_package, hold_version, repository_fragment, \
              archive, purge_archive, src_root, purge_src, out_root, manifest_checksum, buildfiles_checksum) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
             ON CONFLICT(name) DO UPDATE SET \
                version = excluded.version, \
                state = excluded.state, \
                substate = excluded.substate, \
                hold_package = excluded.hold_package, \
                hold_version = excluded.hold_version, \
                repository_fragment = excluded.repository_fragment, \
                archive = excluded.archive, \
                purge_archive = excluded.purge_archive, \
                src_root = excluded.src_root, \
                purge_src = excluded.purge_src, \
                out_root = excluded.out_root, \
                manifest_checksum = excluded.manifest_checksum, \
                buildfiles_checksum = excluded.buildfiles_checksum",
            rusqlite::params![
                selected.name.as_str(),
                selected.version.to_string(),
                selected.state.to_string(),
                selected.substate.to_string(),
                selected.hold_package as i64,
                selected.hold_version as i64,
                selected.repository_fragment,
                selected.archive.as_ref().map(|p| p.to_string_lossy().to_string()),
                selected.purge_archive as i64,
                selected.src_root.as_ref().map(|p| p.to_string_lossy().to_string()),
                selected.purge_src as i64,
                selected.out_root.as_ref().map(|p| p.to_string_lossy().to_string()),
                selected.manifest_checksum,
                selected.buildfiles_checksum,
            ],
        )
        .map_err(|_| ErrorKind::Logic("unable to write selected_package row".to_string()))?;

    config
        .connection()
        .execute("DELETE FROM prerequisite WHERE dependent_name = ?1", [selected.name.as_str()])
        .map_err(|_| ErrorKind::Logic("unable to clear prerequisite rows".to_string()))?;
    for (prereq_name, prereq) in &selected.prerequisites {
        config
            .connection()
            .execute(
                "INSERT INTO prerequisite (dependent_name, prerequisite_name, database_path, object_id, constraint_text) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    selected.name.as_str(),
                    prereq_name.as_str(),
                    prereq.pointer.database.to_string(),
                    prereq.pointer.object_id,
                    prereq.constraint.to_string(),
                ],
            )
            .map_err(|_| ErrorKind::Logic("unable to write prerequisite row".to_string()))?;
    }

    Ok(())
}

/// Erase `name`'s row and its prerequisite rows (spec §4.2 "Purge").
pub fn erase(config: &Config, name: &Name) -> Res<()> {
    config
        .connection()
        .execute("DELETE FROM prerequisite WHERE dependent_name = ?1", [name.as_str()])
        .map_err(|_| ErrorKind::Logic("unable to clear prerequisite rows".to_string()))?;
    config
        .connection()
        .execute("DELETE FROM selected_package WHERE name = ?1", [name.as_str()])
        .map_err(|_| ErrorKind::Logic("unable to erase selected_package row".to_string()))?;
    Ok(())
}

/// Every selected package in `config`, ordered by name.
pub fn load_all(config: &Config) -> Res<Vec<SelectedPackage>> {
    let names: Vec<String> = {
        let mut stmt = config
            .connection()
            .prepare("SELECT name FROM selected_package ORDER BY name")
            .map_err(|_| ErrorKind::Logic("unable to list selected packages".to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|_| ErrorKind::Logic("unable to list selected packages".to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|_| ErrorKind::Logic("corrupt selected_package row".to_string()))?
    };

    let mut out = Vec::with_capacity(names.len());
    for name_s in names {
        let name = Name::from_str(&name_s).map_err(|_| ErrorKind::Logic("malformed package name".to_string()))?;
        if let Some(selected) = load(config, &name)? {
            out.push(selected);
        }
    }
    Ok(out)
}
