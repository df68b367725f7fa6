//! Drop: disfigure-then-purge a package and its transitive dependents
//! (spec §4.2 "Drop").

use indexmap::IndexSet;

use super::selected::SelectedPackage;
use crate::types::Name;
use crate::util::errors::Res;

/// Confirms a drop that would also remove dependents (spec §4.2:
/// "prompting unless `--drop-dependent --yes`"). The external
/// collaborator is the interactive prompt UI (spec §1).
pub trait DropConfirm {
    fn confirm(&mut self, root: &Name, dependents: &[Name]) -> bool;
}

pub struct AlwaysYes;
impl DropConfirm for AlwaysYes {
    fn confirm(&mut self, _root: &Name, _dependents: &[Name]) -> bool {
        true
    }
}

/// The transitive dependent closure of `root` within `universe` (every
/// package whose prerequisite set includes `root`, recursively).
pub fn transitive_dependents(root: &Name, universe: &[SelectedPackage]) -> IndexSet<Name> {
    let mut closure = IndexSet::new();
    let mut frontier = vec![root.clone()];

    while let Some(current) = frontier.pop() {
        for pkg in universe {
            if pkg.prerequisites.contains_key(&current) && closure.insert(pkg.name.clone()) {
                frontier.push(pkg.name.clone());
            }
        }
    }

    closure
}

/// The order in which `root` plus its dependents must be
/// disfigured-then-purged: dependents first (nothing may still
/// reference a package when it's disfigured — spec §4.2 "Disfigure").
pub fn drop_order(root: &Name, universe: &[SelectedPackage]) -> Vec<Name> {
    let dependents = transitive_dependents(root, universe);
    let mut order: Vec<Name> = dependents.into_iter().collect();
    order.push(root.clone());
    order
}

/// Plan (or refuse) a drop of `root`, prompting through `confirm` when
/// there are dependents that would also be removed (spec §4.2, unless
/// `assume_yes` was already given on the command line).
pub fn plan_drop(
    root: &Name,
    universe: &[SelectedPackage],
    assume_yes: bool,
    confirm: &mut dyn DropConfirm,
) -> Res<Vec<Name>> {
    let order = drop_order(root, universe);
    let dependents: Vec<Name> = order.iter().filter(|n| *n != root).cloned().collect();

    if !dependents.is_empty() && !assume_yes && !confirm.confirm(root, &dependents) {
        return Err(crate::util::errors::ErrorKind::Logic(format!(
            "drop of {} cancelled: would also remove {} dependent package(s)",
            root,
            dependents.len()
        ))
        .into());
    }

    Ok(order)
}
