//! Configuration links (spec §3, §4.1): explicit links used for
//! dependency resolution, and their implicit back-links.
//!
//! `dependency_configs`/`dependent_configs` are the two typed graph
//! walks used to find where a package's build-time or run-time
//! prerequisites may live, exactly as `database.hxx` describes them in
//! the original (worked example: `cfg1(this) -> cfg2(host) ->
//! cfg3(target)`, carried into the tests below).

use std::path::{Path, PathBuf};

use super::store::Config;
use crate::types::ConfigUuid;
use crate::types::Name;
use crate::util::errors::{ErrorKind, Res};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Explicit,
    Implicit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigLink {
    pub name: String,
    pub uuid: ConfigUuid,
    pub path: PathBuf,
    pub relative: bool,
    pub kind: LinkKind,
}

fn read_links(config: &Config) -> Res<Vec<ConfigLink>> {
    let mut stmt = config
        .connection()
        .prepare("SELECT name, uuid, path, relative, explicit FROM config_link")
        .map_err(|_| ErrorKind::Logic("unable to read links".to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let uuid_s: String = row.get(1)?;
            let path: String = row.get(2)?;
            let relative: i64 = row.get(3)?;
            let explicit: i64 = row.get(4)?;
            Ok((name, uuid_s, path, relative, explicit))
        })
        .map_err(|_| ErrorKind::Logic("unable to read links".to_string()))?;

    let mut out = Vec::new();
    for row in rows {
        let (name, uuid_s, path, relative, explicit) =
            row.map_err(|_| ErrorKind::Logic("unable to read links".to_string()))?;
        let uuid = ConfigUuid::parse(&uuid_s)
            .ok_or_else(|| ErrorKind::Logic("malformed link uuid".to_string()))?;
        out.push(ConfigLink {
            name,
            uuid,
            path: PathBuf::from(path),
            relative: relative != 0,
            kind: if explicit != 0 {
                LinkKind::Explicit
            } else {
                LinkKind::Implicit
            },
        });
    }
    Ok(out)
}

fn write_link(config: &Config, link: &ConfigLink) -> Res<()> {
    config
        .connection()
        .execute(
            "INSERT OR REPLACE INTO config_link (name, uuid, path, relative, explicit) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                link.name,
                link.uuid.to_string(),
                link.path.to_string_lossy().to_string(),
                link.relative as i64,
                matches!(link.kind, LinkKind::Explicit) as i64,
            ],
        )
        .map_err(|_| ErrorKind::Logic("unable to write link".to_string()))?;
    Ok(())
}

fn remove_link(config: &Config, name: &str) -> Res<()> {
    config
        .connection()
        .execute("DELETE FROM config_link WHERE name = ?1", [name])
        .map_err(|_| ErrorKind::Logic("unable to remove link".to_string()))?;
    Ok(())
}

fn relative_path(from: &Path, to: &Path) -> PathBuf {
    pathdiff(to, from).unwrap_or_else(|| to.to_path_buf())
}

/// Minimal two-directory relative-path diff; both inputs are assumed
/// already normalized/absolute.
fn pathdiff(path: &Path, base: &Path) -> Option<PathBuf> {
    let path_comps: Vec<_> = path.components().collect();
    let base_comps: Vec<_> = base.components().collect();
    let common = path_comps
        .iter()
        .zip(base_comps.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut result = PathBuf::new();
    for _ in common..base_comps.len() {
        result.push("..");
    }
    for comp in &path_comps[common..] {
        result.push(comp.as_os_str());
    }
    Some(result)
}

/// `link(A, B, name?)` (spec §4.1 "Linking"). `a_dir`/`b_dir` are
/// absolute, normalized directories. `use_relative` mirrors the
/// original's `--relative` flag; paths are stored relative whenever
/// either side requests it.
pub fn link(a: &mut Config, a_dir: &Path, b: &Config, b_dir: &Path, name: Option<String>, use_relative: bool) -> Res<()> {
    if a.uuid == b.uuid {
        return Err(ErrorKind::Logic("cannot link a configuration to itself".to_string()).into());
    }

    let existing = read_links(a)?;
    let link_name = name.unwrap_or_else(|| b.type_.clone());

    if let Some(other) = existing.iter().find(|l| l.name == link_name) {
        if other.uuid != b.uuid {
            return Err(ErrorKind::Logic(format!(
                "link name `{}` already used by a different configuration",
                link_name
            ))
            .into());
        }
    }

    let relative = use_relative;
    let stored_path = if relative { relative_path(a_dir, b_dir) } else { b_dir.to_path_buf() };

    write_link(
        a,
        &ConfigLink {
            name: link_name.clone(),
            uuid: b.uuid,
            path: stored_path,
            relative,
            kind: LinkKind::Explicit,
        },
    )?;

    // Mirror side: promote an existing implicit row if present, else
    // insert a fresh implicit row (spec §4.1: "or promotes an existing
    // implicit row in A to explicit" — here mirrored for B's side).
    let b_links = read_links(b)?;
    let back_name = a.name.clone().unwrap_or_else(|| a.type_.clone());
    let already_mutual = b_links
        .iter()
        .any(|l| l.uuid == a.uuid && matches!(l.kind, LinkKind::Explicit));

    if !already_mutual {
        let stored_back_path = if relative { relative_path(b_dir, a_dir) } else { a_dir.to_path_buf() };
        write_link(
            b,
            &ConfigLink {
                name: back_name,
                uuid: a.uuid,
                path: stored_back_path,
                relative,
                kind: LinkKind::Implicit,
            },
        )?;
    }

    Ok(())
}

/// Unlink the explicit link named `name` from `a` (spec §4.1
/// "Unlinking"). `private` mirrors the original's handling of private
/// configurations: both sides removed and the directory deleted instead
/// of demoted to implicit.
pub fn unlink(a: &mut Config, b: &mut Config, name: &str, private: bool) -> Res<()> {
    let a_links = read_links(a)?;
    let link = a_links
        .iter()
        .find(|l| l.name == name)
        .ok_or_else(|| ErrorKind::Logic(format!("no such link `{}`", name)))?;
    if !matches!(link.kind, LinkKind::Explicit) {
        return Err(ErrorKind::Logic(format!("link `{}` is not explicit", name)).into());
    }

    remove_link(a, name)?;

    let b_links = read_links(b)?;
    if let Some(mirror) = b_links.iter().find(|l| l.uuid == a.uuid) {
        if private || !matches!(mirror.kind, LinkKind::Explicit) {
            remove_link(b, &mirror.name)?;
        } else {
            // Mutual explicit link: demote B's side to implicit rather
            // than removing it (spec §4.1).
            write_link(
                b,
                &ConfigLink {
                    kind: LinkKind::Implicit,
                    ..mirror.clone()
                },
            )?;
        }
    }

    Ok(())
}

fn resolve_link_dir(base_dir: &Path, link: &ConfigLink) -> PathBuf {
    if link.relative {
        base_dir.join(&link.path)
    } else {
        link.path.clone()
    }
}

/// Attach every configuration reachable from `root` via explicit links,
/// recursively (spec §4.1 "Pre-attachment"): opens each linked
/// configuration in turn and follows its own explicit links in the same
/// way, guarding against cycles with a UUID-keyed visited set. A link
/// whose target directory no longer exists is a dangling link (spec §3
/// invariant (e)) and is included in the result but not descended into.
pub fn attach_closure(root: &Config) -> Res<Vec<ConfigLink>> {
    let mut visited = std::collections::HashSet::new();
    visited.insert(root.uuid);
    let mut out = Vec::new();

    let mut frontier: Vec<(PathBuf, ConfigLink)> = read_links(root)?
        .into_iter()
        .filter(|l| matches!(l.kind, LinkKind::Explicit))
        .map(|l| (root.directory.clone(), l))
        .collect();

    while let Some((base_dir, link)) = frontier.pop() {
        if !visited.insert(link.uuid) {
            continue;
        }

        let target_dir = resolve_link_dir(&base_dir, &link);
        out.push(link.clone());

        if !target_dir.is_dir() {
            continue;
        }

        let child = Config::open(&target_dir, root.log.clone())?;
        for child_link in read_links(&child)?.into_iter().filter(|l| matches!(l.kind, LinkKind::Explicit)) {
            frontier.push((target_dir.clone(), child_link));
        }
    }

    Ok(out)
}

/// `dependency_configs(D, P, buildtime)` (spec §4.1). `buildtime` is
/// `None` for "unspecified".
pub fn dependency_configs<'a>(
    d_type: &str,
    links: &'a [ConfigLink],
    link_types: impl Fn(&ConfigLink) -> &'a str,
    package_name: &Name,
    buildtime: Option<bool>,
) -> Vec<&'a ConfigLink> {
    let is_build2_module = package_name.is_build2_module();

    links
        .iter()
        .filter(|l| {
            let t = link_types(l);
            match buildtime {
                Some(false) => t == d_type,
                Some(true) => {
                    if is_build2_module {
                        t == "build2"
                    } else {
                        t == "host"
                    }
                }
                None => t == d_type || t == "host" || t == "build2",
            }
        })
        .collect()
}

/// `dependent_configs(D)` (spec §4.1): the transitive closure in the
/// implicit-link direction, including a link iff its type matches `D`'s
/// or `D` is `host`/`build2`.
pub fn dependent_configs<'a>(d_type: &str, links: &'a [ConfigLink], link_types: impl Fn(&ConfigLink) -> &'a str) -> Vec<&'a ConfigLink> {
    links
        .iter()
        .filter(|l| matches!(l.kind, LinkKind::Implicit))
        .filter(|l| {
            let t = link_types(l);
            t == d_type || d_type == "host" || d_type == "build2"
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_link(name: &str, kind: LinkKind) -> ConfigLink {
        ConfigLink {
            name: name.to_string(),
            uuid: ConfigUuid::generate(),
            path: PathBuf::from("/tmp/x"),
            relative: false,
            kind,
        }
    }

    #[test]
    fn dependency_configs_buildtime_picks_host_for_non_build2_module() {
        let links = vec![fake_link("host", LinkKind::Explicit), fake_link("target", LinkKind::Explicit)];
        let types: std::collections::HashMap<&str, &str> =
            [("host", "host"), ("target", "target")].into_iter().collect();
        let name: Name = "libfoo".parse().unwrap();

        let result = dependency_configs("target", &links, |l| types[l.name.as_str()], &name, Some(true));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "host");
    }

    #[test]
    fn dependency_configs_buildtime_picks_build2_for_build2_module() {
        let links = vec![fake_link("build2", LinkKind::Explicit), fake_link("host", LinkKind::Explicit)];
        let types: std::collections::HashMap<&str, &str> =
            [("build2", "build2"), ("host", "host")].into_iter().collect();
        let name: Name = "libbuild2-foo".parse().unwrap();

        let result = dependency_configs("target", &links, |l| types[l.name.as_str()], &name, Some(true));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "build2");
    }

    #[test]
    fn dependent_configs_only_walks_implicit_links() {
        let links = vec![fake_link("a", LinkKind::Explicit), fake_link("b", LinkKind::Implicit)];
        let types: std::collections::HashMap<&str, &str> = [("a", "target"), ("b", "target")].into_iter().collect();
        let result = dependent_configs("target", &links, |l| types[l.name.as_str()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "b");
    }

    fn log() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn attach_closure_follows_explicit_links_transitively() {
        let root = tempfile::tempdir().unwrap();
        let dir1 = root.path().join("cfg1");
        let dir2 = root.path().join("cfg2");
        let dir3 = root.path().join("cfg3");
        std::fs::create_dir_all(&dir1).unwrap();
        std::fs::create_dir_all(&dir2).unwrap();
        std::fs::create_dir_all(&dir3).unwrap();

        let mut cfg1 = Config::create(&dir1, "target", None, log()).unwrap();
        let mut cfg2 = Config::create(&dir2, "host", None, log()).unwrap();
        let cfg3 = Config::create(&dir3, "build2", None, log()).unwrap();
        let cfg2_uuid = cfg2.uuid;
        let cfg3_uuid = cfg3.uuid;

        link(&mut cfg2, &dir2, &cfg3, &dir3, Some("c3".to_string()), false).unwrap();
        // Drop both sides so `attach_closure` can open each database (an
        // exclusive `DbLock`) fresh, the way separate command invocations
        // would.
        drop(cfg2);
        drop(cfg3);

        let cfg2 = Config::open(&dir2, log()).unwrap();
        link(&mut cfg1, &dir1, &cfg2, &dir2, Some("c2".to_string()), false).unwrap();
        drop(cfg2);

        let attached = attach_closure(&cfg1).unwrap();
        let uuids: std::collections::HashSet<_> = attached.iter().map(|l| l.uuid).collect();
        assert!(uuids.contains(&cfg2_uuid));
        assert!(uuids.contains(&cfg3_uuid));
    }
}
