//! Disfigure: undo configure, subject to the dependent-prerequisite
//! guard (spec §4.2 "Disfigure").

use slog::Logger;

use super::selected::SelectedPackage;
use super::state::{PackageState, Transition};
use crate::driver::BuildSystemDriver;
use crate::util::errors::{ErrorKind, Res};

/// Is `name` still a prerequisite of any package in `others` (spec
/// §4.2: "fails if any other package in any linked configuration still
/// has this package as a prerequisite")? `others` ranges over every
/// selected package in every linked configuration, including this one.
pub fn has_dependents<'a>(name: &str, others: impl Iterator<Item = &'a SelectedPackage>) -> bool {
    others.flat_map(|p| p.prerequisites.keys()).any(|n| n.as_str() == name)
}

/// Disfigure `selected` (spec §4.2). On build-system failure the row is
/// marked `broken` and the original error is re-raised so the caller's
/// transaction still commits the broken state.
pub fn disfigure<'a>(
    selected: &mut SelectedPackage,
    driver: &dyn BuildSystemDriver,
    others: impl Iterator<Item = &'a SelectedPackage>,
    clean: bool,
    log: &Logger,
) -> Res<()> {
    if has_dependents(selected.name.as_str(), others) {
        return Err(ErrorKind::Logic(format!(
            "{} is still a prerequisite of another configured package",
            selected.name
        ))
        .into());
    }

    let from_state = selected.state;
    super::state::check_transition(selected.name.as_str(), from_state, Transition::Disfigure, PackageState::Unpacked)?;

    let out_root = selected
        .out_root
        .clone()
        .ok_or_else(|| ErrorKind::Logic("no out_root to disfigure".to_string()))?;

    match driver.disfigure(&out_root, clean, log) {
        Ok(()) => {
            selected.out_root = None;
            selected.state = PackageState::Unpacked;
            Ok(())
        }
        Err(e) => {
            selected.state = PackageState::Broken;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::selected::Prerequisite;
    use crate::types::{ConfigUuid, Name, Version, VersionConstraint};
    use std::str::FromStr;

    fn pkg(name: &str) -> SelectedPackage {
        SelectedPackage::new(1, Name::from_str(name).unwrap(), Version::from_str("1.0.0").unwrap())
    }

    #[test]
    fn detects_dependent_prerequisite() {
        let mut dependent = pkg("libbar");
        dependent.prerequisites.insert(
            Name::from_str("libfoo").unwrap(),
            Prerequisite {
                pointer: crate::package::selected::LazyPointer { database: ConfigUuid::generate(), object_id: 1 },
                constraint: VersionConstraint::any(),
            },
        );
        let others = vec![dependent];
        assert!(has_dependents("libfoo", others.iter()));
    }

    #[test]
    fn no_dependents_when_nothing_references_it() {
        let others = vec![pkg("libbar")];
        assert!(!has_dependents("libfoo", others.iter()));
    }
}
