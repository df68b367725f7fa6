//! `bpkg drop` — disfigure-then-purge a package and its transitive
//! dependents (spec §4.2 "Drop"), with a confirmation prompt over
//! dependents that would also be removed.

use crate::package::drop::{self, DropConfirm};
use crate::package::selected::SelectedPackage;
use crate::types::Name;
use crate::util::errors::Res;

pub fn run(root: &Name, universe: &[SelectedPackage], assume_yes: bool, confirm: &mut dyn DropConfirm) -> Res<Vec<Name>> {
    drop::plan_drop(root, universe, assume_yes, confirm)
}
