//! Configuration negotiation (spec §4.6 step 4): up-negotiates the
//! joint configuration of a dependent and the dependencies named by one
//! chosen alternative, following the snapshot/unset-reload,
//! require-or-prefer-accept, commit-or-record sequence.

use std::collections::HashMap;

use crate::package::configure::ConfigSource;
use crate::types::Name;
use crate::util::errors::{ErrorKind, Res};

use super::skeleton::{PackageConfiguration, PackageSkeleton};

#[derive(Clone, Debug, PartialEq)]
pub enum NegotiationOutcome {
    /// `new == old`: no-op, nothing to commit or record (spec §4.6
    /// step 4c).
    Unchanged,
    /// No override event: the new joint configuration commits directly.
    Committed(HashMap<Name, PackageConfiguration>),
    /// An override event occurred: the caller must record `(old, new)`
    /// in the change history before committing (spec §4.6 step 4d).
    Overridden {
        old: HashMap<Name, PackageConfiguration>,
        new: HashMap<Name, PackageConfiguration>,
    },
}

pub struct NegotiationClause<'a> {
    pub prefer: Option<&'a str>,
    pub accept: Option<&'a str>,
    pub require: Option<&'a str>,
}

fn retained_overrides(config: &PackageConfiguration) -> PackageConfiguration {
    config
        .iter()
        .filter(|(_, v)| v.source == ConfigSource::Override)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Runs one negotiation round for `dependent`'s chosen alternative
/// against `dependencies` (spec §4.6 step 4). `current` is the
/// resolver's present per-package configuration map. `prefer`/`accept`
/// and `require` are clauses written by `dependent`'s buildfile, so
/// they are evaluated against `dependent_skeleton`, not a dependency's.
pub fn negotiate(
    dependent: &Name,
    dependent_skeleton: &dyn PackageSkeleton,
    dependencies: &[(Name, &dyn PackageSkeleton, bool)],
    clause: &NegotiationClause,
    current: &HashMap<Name, PackageConfiguration>,
) -> Res<NegotiationOutcome> {
    if clause.require.is_none() && !(clause.prefer.is_some() && clause.accept.is_some()) {
        return Ok(NegotiationOutcome::Unchanged);
    }

    // Step a: snapshot old, unset and reload defaults, unless `require`
    // targets a system package (lax mode: overrides only, no reload).
    let mut old = HashMap::new();
    let mut joint = HashMap::new();
    for (name, skeleton, is_system) in dependencies {
        let existing = current.get(name).cloned().unwrap_or_default();
        old.insert(name.clone(), existing.clone());

        let lax = clause.require.is_some() && *is_system;
        let mut entry = if lax {
            retained_overrides(&existing)
        } else {
            skeleton.reload_defaults()?
        };
        if !lax {
            for (k, v) in retained_overrides(&existing) {
                entry.insert(k, v);
            }
        }
        joint.insert(name.clone(), entry);
    }

    // Step b: require (sets variables) or prefer+accept (sets then
    // validates).
    if let Some(require) = clause.require {
        let lax = dependencies.iter().any(|(_, _, system)| *system);
        dependent_skeleton.evaluate_require(require, &mut joint, lax)?;
    } else if let (Some(prefer), Some(accept)) = (clause.prefer, clause.accept) {
        if !dependent_skeleton.evaluate_prefer_accept(prefer, accept, &mut joint)? {
            return Err(ErrorKind::UnsatisfiableDepends(format!(
                "accept rejected the joint configuration proposed for {}",
                dependent
            ))
            .into());
        }
    }

    // Step c: compute new, compare to old.
    let new = joint;
    if new == old {
        return Ok(NegotiationOutcome::Unchanged);
    }

    let mut override_event = false;
    'outer: for (name, vars) in &new {
        if let Some(old_vars) = old.get(name) {
            for (key, var) in vars {
                if let Some(old_var) = old_vars.get(key) {
                    if old_var.value != var.value {
                        if let (Some(prev_owner), Some(new_owner)) = (&old_var.origin, &var.origin) {
                            if prev_owner != new_owner {
                                override_event = true;
                                break 'outer;
                            }
                        }
                    }
                }
            }
        }
    }

    if override_event {
        Ok(NegotiationOutcome::Overridden { old, new })
    } else {
        Ok(NegotiationOutcome::Committed(new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSkeleton {
        defaults: PackageConfiguration,
        accept: bool,
    }

    impl PackageSkeleton for FakeSkeleton {
        fn reload_defaults(&self) -> Res<PackageConfiguration> {
            Ok(self.defaults.clone())
        }
        fn evaluate_enable(&self, _expr: &str, _config: &PackageConfiguration) -> Res<bool> {
            Ok(true)
        }
        fn evaluate_reflect(&self, _expr: &str, _config: &PackageConfiguration) -> Res<PackageConfiguration> {
            Ok(PackageConfiguration::new())
        }
        fn evaluate_prefer_accept(
            &self,
            _prefer: &str,
            _accept: &str,
            joint: &mut HashMap<Name, PackageConfiguration>,
        ) -> Res<bool> {
            for cfg in joint.values_mut() {
                cfg.insert(
                    "x".to_string(),
                    super::super::skeleton::ConfigVariable {
                        value: super::super::skeleton::ConfigValue::Bool(true),
                        source: ConfigSource::Buildfile,
                        origin: None,
                    },
                );
            }
            Ok(self.accept)
        }
        fn evaluate_require(&self, _expr: &str, _joint: &mut HashMap<Name, PackageConfiguration>, _lax: bool) -> Res<()> {
            Ok(())
        }
    }

    #[test]
    fn no_clause_is_unchanged() {
        let dependent: Name = "libfoo".parse().unwrap();
        let dependent_skeleton = FakeSkeleton { defaults: PackageConfiguration::new(), accept: true };
        let clause = NegotiationClause { prefer: None, accept: None, require: None };
        let result = negotiate(&dependent, &dependent_skeleton, &[], &clause, &HashMap::new()).unwrap();
        assert_eq!(result, NegotiationOutcome::Unchanged);
    }

    #[test]
    fn prefer_accept_commits_when_no_prior_owner_conflict() {
        let dependent: Name = "libfoo".parse().unwrap();
        let dependent_skeleton = FakeSkeleton { defaults: PackageConfiguration::new(), accept: true };
        let dep: Name = "libbar".parse().unwrap();
        let skeleton = FakeSkeleton { defaults: PackageConfiguration::new(), accept: true };
        let deps: Vec<(Name, &dyn PackageSkeleton, bool)> = vec![(dep, &skeleton, false)];
        let clause = NegotiationClause { prefer: Some("p"), accept: Some("a"), require: None };
        let result = negotiate(&dependent, &dependent_skeleton, &deps, &clause, &HashMap::new()).unwrap();
        assert!(matches!(result, NegotiationOutcome::Committed(_)));
    }

    #[test]
    fn accept_false_is_a_hard_failure() {
        let dependent: Name = "libfoo".parse().unwrap();
        let dependent_skeleton = FakeSkeleton { defaults: PackageConfiguration::new(), accept: false };
        let dep: Name = "libbar".parse().unwrap();
        let skeleton = FakeSkeleton { defaults: PackageConfiguration::new(), accept: false };
        let deps: Vec<(Name, &dyn PackageSkeleton, bool)> = vec![(dep, &skeleton, false)];
        let clause = NegotiationClause { prefer: Some("p"), accept: Some("a"), require: None };
        assert!(negotiate(&dependent, &dependent_skeleton, &deps, &clause, &HashMap::new()).is_err());
    }
}
