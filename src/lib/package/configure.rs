//! Configure: materialize C7's resolution decision against the build
//! system (spec §4.2 "Configure").

use indexmap::IndexMap;
use slog::Logger;
use std::path::Path;

use super::selected::{LazyPointer, Prerequisite, SelectedPackage};
use super::state::{PackageState, Transition};
use crate::driver::BuildSystemDriver;
use crate::types::{ConfigUuid, Name, VersionConstraint};
use crate::util::errors::Res;

/// Where a configuration variable's value came from (spec §4.6): used
/// to record which variables were set by the dependent vs. the user,
/// for display and for later negotiation rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    Buildfile,
    Override,
    Undefined,
}

#[derive(Clone, Debug)]
pub struct ConfigSourceMap {
    pub sources: IndexMap<String, ConfigSource>,
}

/// Configure `selected` into `out_root`, recording the prerequisite
/// lazy-pointer decisions C7 already made (spec §4.2: "this component
/// only materializes the decision").
pub fn configure(
    selected: &mut SelectedPackage,
    driver: &dyn BuildSystemDriver,
    out_root: &Path,
    prerequisites: IndexMap<Name, (ConfigUuid, i64, VersionConstraint)>,
    log: &Logger,
) -> Res<()> {
    let from_state = selected.state;
    super::state::check_transition(selected.name.as_str(), from_state, Transition::Configure, PackageState::Configured)?;

    let src_root = selected
        .src_root
        .clone()
        .ok_or_else(|| crate::util::errors::ErrorKind::Logic("no src_root to configure".to_string()))?;

    driver.configure(&src_root, out_root, log)?;

    selected.out_root = Some(out_root.to_path_buf());
    selected.state = PackageState::Configured;
    selected.prerequisites = prerequisites
        .into_iter()
        .map(|(name, (db, id, constraint))| {
            (
                name,
                Prerequisite {
                    pointer: LazyPointer { database: db, object_id: id },
                    constraint,
                },
            )
        })
        .collect();

    Ok(())
}
