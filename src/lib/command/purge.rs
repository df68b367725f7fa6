//! `bpkg purge` — remove on-disk artifacts and erase the selected-package
//! row (spec §4.2 "Purge").

use crate::package::purge::{self, PurgeActions};
use crate::package::selected::SelectedPackage;
use crate::util::errors::Res;

pub fn run(selected: &SelectedPackage, force: bool) -> Res<PurgeActions> {
    purge::purge(selected, force)
}

pub fn apply(actions: &PurgeActions, selected: &SelectedPackage) -> Res<()> {
    actions.apply(selected)
}
