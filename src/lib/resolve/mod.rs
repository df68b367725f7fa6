//! C7 — dependency resolver and configuration negotiator (spec §4.6).
//! The hardest component: for each root and each newly discovered
//! dependency, picks a version, selects an alternative, folds
//! `reflect`, negotiates configuration, detects oscillation and
//! backtracks or fails, and finally produces a topologically ordered
//! plan for C3.

pub mod cycle;
pub mod negotiate;
pub mod plan;
pub mod skeleton;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use slog::Logger;

use crate::driver::BuildSystemDriver;
use crate::manifest::package::{Alternative, DependsEntry, PackageManifest};
use crate::package::configure::ConfigSource;
use crate::package::selected::LazyPointer;
use crate::query::{find_available_one, ImaginaryRegistry, QueryDatabase};
use crate::types::{satisfies_version, ConfigUuid, Name, Version, VersionConstraint};
use crate::util::errors::{ErrorKind, Res};

use self::cycle::{detect_oscillation, oscillating_dependents, ChangeEvent};
use self::negotiate::{negotiate, NegotiationClause, NegotiationOutcome};
use self::plan::{Plan, PlannedPackage};
use self::skeleton::PackageSkeleton;

/// A build-to-hold root the user asked for (spec §4.6 "Input").
pub struct Root {
    pub name: Name,
    pub constraint: VersionConstraint,
    pub held: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SelectionOrigin {
    AlreadySelected,
    New,
}

struct SelectedVersion {
    version: Version,
    database: ConfigUuid,
    origin: SelectionOrigin,
}

/// Toolchain build-time pseudo-dependencies (spec §2, §4.6 step 2):
/// satisfied by checking the running driver's version; they never
/// become selected packages.
fn is_toolchain_pseudo_dependency(name: &Name) -> bool {
    matches!(name.as_str(), "build2" | "bpkg")
}

/// Drives the C7 algorithm against a set of query databases, the
/// imaginary registry, and a build-system driver (for the toolchain
/// pseudo-dependency check).
pub struct Resolver<'a> {
    dbs: &'a [QueryDatabase<'a>],
    imaginary: &'a ImaginaryRegistry,
    driver: &'a dyn BuildSystemDriver,
    log: &'a Logger,

    selections: HashMap<Name, SelectedVersion>,
    configurations: HashMap<Name, skeleton::PackageConfiguration>,
    history: Vec<ChangeEvent>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        dbs: &'a [QueryDatabase<'a>],
        imaginary: &'a ImaginaryRegistry,
        driver: &'a dyn BuildSystemDriver,
        log: &'a Logger,
    ) -> Self {
        Resolver {
            dbs,
            imaginary,
            driver,
            log,
            selections: HashMap::new(),
            configurations: HashMap::new(),
            history: Vec::new(),
        }
    }

    fn check_toolchain(&self, name: &Name, constraint: &VersionConstraint) -> Res<()> {
        let v = self.driver.version(self.log)?;
        if satisfies_version(&v, constraint) {
            Ok(())
        } else {
            Err(ErrorKind::UnsatisfiableDepends(format!("{} {}", name, constraint)).into())
        }
    }

    /// Step 1 (spec §4.6): pick a version satisfying `constraint`,
    /// preferring an already-selected version over a fresh lookup and
    /// never downgrading a held version without consent.
    fn pick_version(&mut self, name: &Name, constraint: &VersionConstraint, held: bool) -> Res<(Version, ConfigUuid)> {
        if let Some(existing) = self.selections.get(name) {
            if satisfies_version(&existing.version, constraint) {
                return Ok((existing.version.clone(), existing.database));
            }
            if held {
                return Err(ErrorKind::UnsatisfiableDepends(format!(
                    "held version of {} does not satisfy {}",
                    name, constraint
                ))
                .into());
            }
        }

        let candidate = find_available_one(self.dbs, self.imaginary, name, Some(constraint))
            .ok_or_else(|| ErrorKind::UnknownPackage(name.to_string()))?;

        self.selections.insert(
            name.clone(),
            SelectedVersion {
                version: candidate.version.clone(),
                database: candidate.database,
                origin: SelectionOrigin::New,
            },
        );

        Ok((candidate.version, candidate.database))
    }

    /// Step 2: the first not-yet-tried alternative of `entry` whose
    /// `enable` clause evaluates true and whose package references are
    /// all satisfiable.
    fn select_alternative<'e>(
        &mut self,
        dependent_skeleton: &dyn PackageSkeleton,
        entry: &'e DependsEntry,
        tried: &HashSet<usize>,
    ) -> Res<(usize, &'e Alternative)> {
        let empty = skeleton::PackageConfiguration::new();

        for (idx, alt) in entry.alternatives.iter().enumerate() {
            if tried.contains(&idx) {
                continue;
            }
            if let Some(enable) = &alt.clauses.enable {
                if !dependent_skeleton.evaluate_enable(enable, &empty)? {
                    continue;
                }
            }

            let mut satisfiable = true;
            for r in &alt.refs {
                if is_toolchain_pseudo_dependency(&r.name) {
                    if self.check_toolchain(&r.name, &r.constraint).is_err() {
                        satisfiable = false;
                        break;
                    }
                    continue;
                }
                if find_available_one(self.dbs, self.imaginary, &r.name, Some(&r.constraint)).is_none() {
                    satisfiable = false;
                    break;
                }
            }

            if satisfiable {
                return Ok((idx, alt));
            }
        }

        Err(ErrorKind::UnsatisfiableDepends(format!(
            "{}: no alternative satisfies its dependency references",
            entry.line
        ))
        .into())
    }

    /// Resolves every depends entry of `dependent`, negotiating
    /// configuration where the chosen alternative carries
    /// `prefer+accept`/`require` (spec §4.6 steps 2-5). Returns the
    /// chosen alternative index per depends entry (keyed by source
    /// line) and the resolved prerequisite lazy pointers.
    fn resolve_depends(
        &mut self,
        dependent: &Name,
        dependent_skeleton: &dyn PackageSkeleton,
        depends: &[DependsEntry],
        skeleton_for: &dyn Fn(&Name) -> Res<Box<dyn PackageSkeleton>>,
    ) -> Res<(IndexMap<usize, usize>, IndexMap<Name, (LazyPointer, VersionConstraint)>)> {
        let mut chosen = IndexMap::new();
        let mut prerequisites = IndexMap::new();

        for entry in depends {
            let mut tried = HashSet::new();

            loop {
                let (idx, alt) = self.select_alternative(dependent_skeleton, entry, &tried)?;
                chosen.insert(entry.line, idx);

                let mut dep_names = Vec::new();
                for r in &alt.refs {
                    if is_toolchain_pseudo_dependency(&r.name) {
                        continue;
                    }
                    let (version, db) = self.pick_version(&r.name, &r.constraint, false)?;
                    prerequisites.insert(
                        r.name.clone(),
                        (LazyPointer { database: db, object_id: 0 }, r.constraint.clone()),
                    );
                    dep_names.push((r.name.clone(), version));
                }

                if let Some(reflect) = &alt.clauses.reflect {
                    let config = self.configurations.entry(dependent.clone()).or_default().clone();
                    let bindings = dependent_skeleton.evaluate_reflect(reflect, &config)?;
                    self.configurations.entry(dependent.clone()).or_default().extend(bindings);
                }

                if alt.clauses.has_prefer_accept() || alt.clauses.has_require() {
                    let clause = NegotiationClause {
                        prefer: alt.clauses.prefer.as_deref(),
                        accept: alt.clauses.accept.as_deref(),
                        require: alt.clauses.require.as_deref(),
                    };

                    let mut skeletons = Vec::new();
                    for (name, _version) in &dep_names {
                        skeletons.push((name.clone(), skeleton_for(name)?));
                    }
                    let deps_refs: Vec<(Name, &dyn PackageSkeleton, bool)> =
                        skeletons.iter().map(|(n, sk)| (n.clone(), sk.as_ref(), false)).collect();

                    match negotiate(dependent, dependent_skeleton, &deps_refs, &clause, &self.configurations)? {
                        NegotiationOutcome::Unchanged => {}
                        NegotiationOutcome::Committed(new) => self.configurations.extend(new),
                        NegotiationOutcome::Overridden { old, new } => {
                            for (name, _) in &dep_names {
                                self.history.push(ChangeEvent {
                                    dependent: dependent.clone(),
                                    dependency: name.clone(),
                                    old: old.get(name).cloned().unwrap_or_default(),
                                    new: new.get(name).cloned().unwrap_or_default(),
                                });
                            }

                            if let Some((start, d)) = detect_oscillation(&self.history) {
                                if tried.len() + 1 < entry.alternatives.len() {
                                    tried.insert(idx);
                                    continue;
                                }
                                let names = oscillating_dependents(&self.history, start, d);
                                let a = names.first().cloned().unwrap_or_else(|| dependent.clone());
                                let b = names.get(1).cloned().unwrap_or_else(|| dependent.clone());
                                return Err(ErrorKind::NegotiationCycle(a.to_string(), b.to_string()).into());
                            }

                            self.configurations.extend(new);
                        }
                    }
                }

                break;
            }
        }

        Ok((chosen, prerequisites))
    }

    /// Drives resolution for `roots`, recursing into newly discovered
    /// dependencies depth-first so each package's prerequisites are
    /// resolved (and appended to the plan) before the package itself
    /// (spec §4.6 "Output": a topologically ordered plan).
    pub fn resolve(
        &mut self,
        roots: &[Root],
        manifest_for: &dyn Fn(&Name) -> Res<PackageManifest>,
        skeleton_for: &dyn Fn(&Name) -> Res<Box<dyn PackageSkeleton>>,
    ) -> Res<Plan> {
        let mut plan = Plan::new();
        let mut visited = HashSet::new();

        for root in roots {
            self.resolve_one(&root.name, &root.constraint, root.held, manifest_for, skeleton_for, &mut visited, &mut plan)?;
        }

        Ok(plan)
    }

    fn resolve_one(
        &mut self,
        name: &Name,
        constraint: &VersionConstraint,
        held: bool,
        manifest_for: &dyn Fn(&Name) -> Res<PackageManifest>,
        skeleton_for: &dyn Fn(&Name) -> Res<Box<dyn PackageSkeleton>>,
        visited: &mut HashSet<Name>,
        plan: &mut Plan,
    ) -> Res<()> {
        if !visited.insert(name.clone()) {
            return Ok(());
        }

        let (version, _db) = self.pick_version(name, constraint, held)?;
        let manifest = manifest_for(name)?;
        let skeleton = skeleton_for(name)?;

        for entry in &manifest.depends {
            for alt in &entry.alternatives {
                for r in &alt.refs {
                    if !is_toolchain_pseudo_dependency(&r.name) {
                        self.resolve_one(&r.name, &r.constraint, false, manifest_for, skeleton_for, visited, plan)?;
                    }
                }
            }
        }

        let (chosen, prerequisites) = self.resolve_depends(name, skeleton.as_ref(), &manifest.depends, skeleton_for)?;

        let config_variables = self.configurations.get(name).cloned().unwrap_or_default();
        let config_sources: IndexMap<String, ConfigSource> =
            config_variables.iter().map(|(k, v)| (k.clone(), v.source)).collect();

        plan.push(PlannedPackage {
            name: name.clone(),
            version,
            chosen_alternatives: chosen,
            prerequisites,
            config_variables,
            config_sources,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fragment::{Fragment, FragmentId, RepositoryGraph};
    use crate::types::PackageKey;
    use indexmap::IndexSet;

    struct FakeDriver;
    impl BuildSystemDriver for FakeDriver {
        fn configure(&self, _: &std::path::Path, _: &std::path::Path, _: &Logger) -> Res<()> {
            Ok(())
        }
        fn disfigure(&self, _: &std::path::Path, _: bool, _: &Logger) -> Res<()> {
            Ok(())
        }
        fn info(&self, _: &std::path::Path, _: &Logger) -> Res<crate::driver::PackageBuildInfo> {
            Ok(crate::driver::PackageBuildInfo::default())
        }
        fn version(&self, _: &Logger) -> Res<Version> {
            "0.15.0".parse()
        }
    }

    struct FakeSkeleton;
    impl PackageSkeleton for FakeSkeleton {
        fn reload_defaults(&self) -> Res<skeleton::PackageConfiguration> {
            Ok(skeleton::PackageConfiguration::new())
        }
        fn evaluate_enable(&self, _: &str, _: &skeleton::PackageConfiguration) -> Res<bool> {
            Ok(true)
        }
        fn evaluate_reflect(&self, _: &str, _: &skeleton::PackageConfiguration) -> Res<skeleton::PackageConfiguration> {
            Ok(skeleton::PackageConfiguration::new())
        }
        fn evaluate_prefer_accept(
            &self,
            _: &str,
            _: &str,
            _: &mut HashMap<Name, skeleton::PackageConfiguration>,
        ) -> Res<bool> {
            Ok(true)
        }
        fn evaluate_require(&self, _: &str, _: &mut HashMap<Name, skeleton::PackageConfiguration>, _: bool) -> Res<()> {
            Ok(())
        }
    }

    fn graph_with(name: &str, version: &str) -> (RepositoryGraph, FragmentId) {
        let mut g = RepositoryGraph::new();
        let fid = FragmentId(0);
        let mut repos = IndexSet::new();
        repos.insert("example".to_string());
        let key = PackageKey::new(name.parse().unwrap(), version.parse().unwrap());
        g.add_fragment(Fragment {
            id: fid,
            repositories: repos,
            commit: None,
            friendly_name: None,
            complements: IndexSet::new(),
            prerequisites: IndexSet::new(),
            packages: vec![key],
        });
        (g, fid)
    }

    #[test]
    fn resolves_a_single_root_with_no_dependencies() {
        let (g, fid) = graph_with("libfoo", "1.0");
        let db = QueryDatabase { uuid: ConfigUuid::generate(), graph: &g, root_fragment: fid };
        let imaginary = ImaginaryRegistry::new();
        let driver = FakeDriver;
        let log = Logger::root(slog::Discard, slog::o!());
        let mut resolver = Resolver::new(&[db], &imaginary, &driver, &log);

        let roots = vec![Root { name: "libfoo".parse().unwrap(), constraint: VersionConstraint::any(), held: false }];
        let manifest_for = |n: &Name| -> Res<PackageManifest> {
            Ok(PackageManifest {
                name: n.clone(),
                version: "1.0".parse().unwrap(),
                project: None,
                summary: None,
                depends: vec![],
                languages: vec![],
            })
        };
        let skeleton_for = |_: &Name| -> Res<Box<dyn PackageSkeleton>> { Ok(Box::new(FakeSkeleton)) };

        let plan = resolver.resolve(&roots, &manifest_for, &skeleton_for).unwrap();
        assert_eq!(plan.packages.len(), 1);
        assert!(plan.is_topologically_ordered());
    }

    #[test]
    fn toolchain_pseudo_dependency_never_becomes_a_selected_package() {
        assert!(is_toolchain_pseudo_dependency(&"build2".parse().unwrap()));
        assert!(is_toolchain_pseudo_dependency(&"bpkg".parse().unwrap()));
        assert!(!is_toolchain_pseudo_dependency(&"libfoo".parse().unwrap()));
    }
}
