//! `bpkg configure` — materialize C7's resolution decision against the
//! build system (spec §4.2 "Configure").

use indexmap::IndexMap;
use slog::Logger;
use std::path::PathBuf;

use crate::driver::BuildSystemDriver;
use crate::package::configure;
use crate::package::selected::SelectedPackage;
use crate::types::{ConfigUuid, Name, VersionConstraint};
use crate::util::errors::Res;

pub struct ConfigureArgs {
    pub out_root: PathBuf,
    pub prerequisites: IndexMap<Name, (ConfigUuid, i64, VersionConstraint)>,
}

pub fn run(selected: &mut SelectedPackage, driver: &dyn BuildSystemDriver, args: ConfigureArgs, log: &Logger) -> Res<()> {
    configure::configure(selected, driver, &args.out_root, args.prerequisites, log)
}
