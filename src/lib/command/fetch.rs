//! `bpkg fetch` — bind a downloaded archive to a selected package (spec
//! §4.2 "Fetch").

use slog::Logger;
use std::path::PathBuf;

use crate::package::fetch;
use crate::package::selected::SelectedPackage;
use crate::util::errors::Res;

pub struct FetchArgs {
    pub archive_src: PathBuf,
    pub dest_dir: PathBuf,
    pub expected_sha256: String,
    pub shared_src: bool,
}

pub fn run(selected: &mut SelectedPackage, args: FetchArgs, log: &Logger) -> Res<()> {
    fetch::fetch(selected, &args.archive_src, &args.dest_dir, &args.expected_sha256, args.shared_src, log)
}
