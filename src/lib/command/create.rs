//! `bpkg create` — create a new configuration directory (spec §4.1,
//! adapted from the teacher's `cli::new` project scaffold).

use slog::Logger;
use std::path::PathBuf;

use crate::config::store::Config;
use crate::util::errors::Res;

pub struct CreateArgs {
    pub directory: PathBuf,
    pub type_: String,
    pub name: Option<String>,
}

pub fn run(args: CreateArgs, log: Logger) -> Res<Config> {
    Config::create(&args.directory, &args.type_, args.name, log)
}
