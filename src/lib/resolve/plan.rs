//! The resolver's output: a topologically ordered plan of
//! `(selected_package, chosen_alternative_index_per_depends,
//! resolved_prerequisite_lazy_pointers, config_variables,
//! config_sources)` tuples passed to C3 for materialization (spec §4.6
//! "Output").

use indexmap::{IndexMap, IndexSet};

use crate::package::configure::ConfigSource;
use crate::package::selected::LazyPointer;
use crate::types::{Name, Version, VersionConstraint};

use super::skeleton::PackageConfiguration;

#[derive(Clone, Debug)]
pub struct PlannedPackage {
    pub name: Name,
    pub version: Version,
    /// Depends-entry source line to chosen alternative index.
    pub chosen_alternatives: IndexMap<usize, usize>,
    pub prerequisites: IndexMap<Name, (LazyPointer, VersionConstraint)>,
    pub config_variables: PackageConfiguration,
    /// Per variable, whether its value came from a dependent or the
    /// user (spec §4.2 "Configure").
    pub config_sources: IndexMap<String, ConfigSource>,
}

#[derive(Clone, Debug, Default)]
pub struct Plan {
    pub packages: Vec<PlannedPackage>,
}

impl Plan {
    pub fn new() -> Self {
        Plan::default()
    }

    pub fn push(&mut self, pkg: PlannedPackage) {
        self.packages.push(pkg);
    }

    /// `true` iff every package's prerequisites already appear earlier
    /// in the plan. Used by tests to assert the resolver's topological
    /// ordering guarantee.
    pub fn is_topologically_ordered(&self) -> bool {
        let mut seen: IndexSet<Name> = IndexSet::new();
        for pkg in &self.packages {
            for dep in pkg.prerequisites.keys() {
                if !seen.contains(dep) {
                    return false;
                }
            }
            seen.insert(pkg.name.clone());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(name: &str, prereqs: &[&str]) -> PlannedPackage {
        use crate::types::ConfigUuid;
        PlannedPackage {
            name: name.parse().unwrap(),
            version: "1.0".parse().unwrap(),
            chosen_alternatives: IndexMap::new(),
            prerequisites: prereqs
                .iter()
                .map(|p| {
                    (
                        p.parse().unwrap(),
                        (
                            LazyPointer { database: ConfigUuid::generate(), object_id: 0 },
                            VersionConstraint::any(),
                        ),
                    )
                })
                .collect(),
            config_variables: PackageConfiguration::new(),
            config_sources: IndexMap::new(),
        }
    }

    #[test]
    fn detects_out_of_order_plan() {
        let mut plan = Plan::new();
        plan.push(planned("app", &["libfoo"]));
        plan.push(planned("libfoo", &[]));
        assert!(!plan.is_topologically_ordered());
    }

    #[test]
    fn accepts_prerequisite_first_plan() {
        let mut plan = Plan::new();
        plan.push(planned("libfoo", &[]));
        plan.push(planned("app", &["libfoo"]));
        assert!(plan.is_topologically_ordered());
    }
}
