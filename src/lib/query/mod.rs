//! C6 — package query and availability layer (spec §4.5): answers
//! "given a package name and a constraint, which `available_package`
//! candidates may be used?" against a set of repository-information
//! configurations plus the imaginary set (existing packages, stubs).

pub mod imaginary;

use std::cmp::Ordering;

use self::imaginary::{ExistingPackage, ImaginaryRegistry};
use crate::repository::fragment::{FragmentId, RepositoryGraph};
use crate::types::{ConfigUuid, Name, Version, VersionConstraint};

pub use imaginary::{ExistingPackage as Existing, StubPackage};

/// Where a candidate was found: a real repository fragment, an
/// existing-packages registry entry, or a synthetic stub (spec §4.5).
#[derive(Clone, Debug)]
pub enum AvailableOrigin {
    Repository {
        fragment: FragmentId,
        repository: String,
    },
    Existing(std::path::PathBuf),
    Stub,
}

/// A candidate `available_package` returned by `find_available`, scoped
/// to the configuration database it was found through.
#[derive(Clone, Debug)]
pub struct AvailableCandidate {
    pub database: ConfigUuid,
    pub name: Name,
    pub version: Version,
    pub origin: AvailableOrigin,
}

impl AvailableCandidate {
    /// The lazy pointer to the originating fragment, if this candidate
    /// came from a real repository (spec §4.5: "`find_available_one`
    /// returns the best candidate together with its originating
    /// fragment as a lazy pointer"). Deliberately distinct from
    /// `package::selected::LazyPointer`, which addresses a *selected
    /// package row* in another configuration's database, not a
    /// repository fragment within this one.
    pub fn fragment_pointer(&self) -> Option<AvailableLocation> {
        match &self.origin {
            AvailableOrigin::Repository { fragment, repository } => Some(AvailableLocation {
                fragment: *fragment,
                repository: repository.clone(),
            }),
            _ => None,
        }
    }
}

/// A repository fragment reference (spec §4.5), intentionally separate
/// from `package::selected::LazyPointer` — see
/// `AvailableCandidate::fragment_pointer`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailableLocation {
    pub fragment: FragmentId,
    pub repository: String,
}

/// One database searched by `find_available`: its identity, the
/// repository graph it indexes, and the root fragment queries are
/// filtered through (spec §4.5: "filtered through each database's root
/// fragment").
pub struct QueryDatabase<'a> {
    pub uuid: ConfigUuid,
    pub graph: &'a RepositoryGraph,
    pub root_fragment: FragmentId,
}

fn existing_matches(pkg: &ExistingPackage, name: &Name, constraint: Option<&VersionConstraint>) -> bool {
    &pkg.name == name
        && constraint
            .map(|c| crate::types::satisfies_version(&pkg.version, c))
            .unwrap_or(true)
}

/// `find_available(dbs, name, constraint?)` (spec §4.5): matching
/// candidates from every passed database, filtered through each
/// database's root fragment, merged, sorted by version descending, and
/// de-duplicated, with the imaginary existing-packages registry queried
/// first and stubs used only once nothing else matches.
pub fn find_available(
    dbs: &[QueryDatabase],
    imaginary: &ImaginaryRegistry,
    name: &Name,
    constraint: Option<&VersionConstraint>,
) -> Vec<AvailableCandidate> {
    let mut out = Vec::new();

    for pkg in imaginary.existing_matching(name) {
        if existing_matches(pkg, name, constraint) {
            out.push(AvailableCandidate {
                database: ConfigUuid::generate(),
                name: pkg.name.clone(),
                version: pkg.version.clone(),
                origin: AvailableOrigin::Existing(pkg.source.clone()),
            });
        }
    }

    for db in dbs {
        let visible = db.graph.visible_fragments(db.root_fragment);
        for fid in visible {
            let fragment = match db.graph.fragment(fid) {
                Some(f) => f,
                None => continue,
            };
            for key in &fragment.packages {
                if &key.name != name {
                    continue;
                }
                if let Some(c) = constraint {
                    if !crate::types::satisfies_version(&key.version, c) {
                        continue;
                    }
                }
                let repository = fragment.repositories.iter().next().cloned().unwrap_or_default();
                out.push(AvailableCandidate {
                    database: db.uuid,
                    name: key.name.clone(),
                    version: key.version.clone(),
                    origin: AvailableOrigin::Repository { fragment: fid, repository },
                });
            }
        }
    }

    if out.is_empty() {
        if let Some(stub) = imaginary.stub_matching(name) {
            out.push(AvailableCandidate {
                database: ConfigUuid::generate(),
                name: stub.name.clone(),
                version: stub.version(),
                origin: AvailableOrigin::Stub,
            });
        }
    }

    out.sort_by(|a, b| b.version.compare(&a.version, true, true));
    out.dedup_by(|a, b| a.version.compare(&b.version, true, true) == Ordering::Equal && a.name == b.name);
    out
}

/// `find_available_one` (spec §4.5): the best (highest-version)
/// candidate, or `None` if nothing matches.
pub fn find_available_one(
    dbs: &[QueryDatabase],
    imaginary: &ImaginaryRegistry,
    name: &Name,
    constraint: Option<&VersionConstraint>,
) -> Option<AvailableCandidate> {
    find_available(dbs, imaginary, name, constraint).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fragment::Fragment;
    use crate::types::PackageKey;
    use indexmap::IndexSet;

    fn graph_with_packages(versions: &[&str]) -> (RepositoryGraph, FragmentId) {
        let mut g = RepositoryGraph::new();
        let fid = FragmentId(0);
        let mut repos = IndexSet::new();
        repos.insert("example".to_string());
        let mut f = Fragment {
            id: fid,
            repositories: repos,
            commit: None,
            friendly_name: None,
            complements: IndexSet::new(),
            prerequisites: IndexSet::new(),
            packages: vec![],
        };
        let name: Name = "libfoo".parse().unwrap();
        for v in versions {
            f.packages.push(PackageKey::new(name.clone(), v.parse().unwrap()));
        }
        g.add_fragment(f);
        (g, fid)
    }

    #[test]
    fn sorts_descending_and_dedups() {
        let (g, fid) = graph_with_packages(&["1.0", "2.0", "1.0+1"]);
        let db = QueryDatabase { uuid: ConfigUuid::generate(), graph: &g, root_fragment: fid };
        let imaginary = ImaginaryRegistry::new();
        let name: Name = "libfoo".parse().unwrap();
        let result = find_available(&[db], &imaginary, &name, None);
        // "1.0" and "1.0+1" compare equal under default (revision-ignoring)
        // ordering, so they dedup to one entry; "2.0" sorts first.
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].version.to_string(), "2.0");
    }

    #[test]
    fn existing_packages_are_queried_first() {
        let (g, fid) = graph_with_packages(&["1.0"]);
        let db = QueryDatabase { uuid: ConfigUuid::generate(), graph: &g, root_fragment: fid };
        let mut imaginary = ImaginaryRegistry::new();
        let name: Name = "libfoo".parse().unwrap();
        imaginary.add_existing(ExistingPackage {
            name: name.clone(),
            version: "9.0".parse().unwrap(),
            depends: vec![],
            source: "/tmp/libfoo".into(),
        });
        let result = find_available(&[db], &imaginary, &name, None);
        assert!(matches!(result[0].origin, AvailableOrigin::Existing(_)));
    }

    #[test]
    fn stub_used_only_when_nothing_else_matches() {
        let g = RepositoryGraph::new();
        let name: Name = "libsystem".parse().unwrap();
        let mut imaginary = ImaginaryRegistry::new();
        imaginary.add_stub(name.clone());
        let db = QueryDatabase { uuid: ConfigUuid::generate(), graph: &g, root_fragment: FragmentId(0) };
        let result = find_available(&[db], &imaginary, &name, None);
        assert_eq!(result.len(), 1);
        assert!(matches!(result[0].origin, AvailableOrigin::Stub));
    }
}
