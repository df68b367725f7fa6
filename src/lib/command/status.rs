//! `bpkg status` — list selected packages in a configuration (spec §4.3
//! "Status").

use crate::config::store::Config;
use crate::package::state::{PackageState, Substate};
use crate::types::{Name, Version};
use crate::util::errors::{ErrorKind, Res};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRow {
    pub name: Name,
    pub version: Version,
    pub state: PackageState,
    pub substate: Substate,
    pub hold_package: bool,
    pub hold_version: bool,
}

/// One row per package selected in `config`, ordered by name (spec
/// §4.3: status is a read-only projection of `selected_package`).
pub fn run(config: &Config) -> Res<Vec<StatusRow>> {
    let mut stmt = config
        .connection()
        .prepare(
            "SELECT name, version, state, substate, hold_package, hold_version \
             FROM selected_package ORDER BY name",
        )
        .map_err(|_| ErrorKind::Logic("unable to read selected packages".to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let version: String = row.get(1)?;
            let state: String = row.get(2)?;
            let substate: String = row.get(3)?;
            let hold_package: i64 = row.get(4)?;
            let hold_version: i64 = row.get(5)?;
            Ok((name, version, state, substate, hold_package, hold_version))
        })
        .map_err(|_| ErrorKind::Logic("unable to read selected packages".to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (name, version, state, substate, hold_package, hold_version) =
            row.map_err(|_| ErrorKind::Logic("corrupt selected_package row".to_string()))?;
        out.push(StatusRow {
            name: name.parse().map_err(|_| ErrorKind::Logic("malformed package name".to_string()))?,
            version: version.parse().map_err(|_| ErrorKind::Logic("malformed package version".to_string()))?,
            state: state.parse().map_err(|_| ErrorKind::Logic("malformed package state".to_string()))?,
            substate: substate.parse().map_err(|_| ErrorKind::Logic("malformed package substate".to_string()))?,
            hold_package: hold_package != 0,
            hold_version: hold_version != 0,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_has_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = slog::Logger::root(slog::Discard, slog::o!());
        let cfg = Config::create(dir.path(), "target", None, log).unwrap();
        let rows = run(&cfg).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn lists_inserted_package_ordered_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let log = slog::Logger::root(slog::Discard, slog::o!());
        let cfg = Config::create(dir.path(), "target", None, log).unwrap();
        cfg.connection()
            .execute(
                "INSERT INTO selected_package \
                 (name, version, state, substate, hold_package, hold_version, purge_archive, purge_src) \
                 VALUES ('libfoo', '1.0.0', 'configured', 'none', 0, 0, 1, 1)",
                [],
            )
            .unwrap();
        let rows = run(&cfg).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.to_string(), "libfoo");
        assert_eq!(rows[0].state, PackageState::Configured);
    }
}
