//! `bpkg disfigure` — undo configure, subject to the dependent-prerequisite
//! guard (spec §4.2 "Disfigure").

use slog::Logger;

use crate::driver::BuildSystemDriver;
use crate::package::disfigure;
use crate::package::selected::SelectedPackage;
use crate::util::errors::Res;

pub fn run<'a>(
    selected: &mut SelectedPackage,
    driver: &dyn BuildSystemDriver,
    others: impl Iterator<Item = &'a SelectedPackage>,
    clean: bool,
    log: &Logger,
) -> Res<()> {
    disfigure::disfigure(selected, driver, others, clean, log)
}
