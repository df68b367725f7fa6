//! `bpkg create` argument wiring (spec §4.1, adapted from the teacher's
//! `cli::new` project scaffold — the destination-must-not-exist check
//! and the type/name arguments are kept, the Idris project scaffolding
//! is replaced with a `.bpkg` configuration database).

use clap::{App, Arg, ArgMatches, SubCommand};
use slog::Logger;
use std::path::Path;

use crate::command::create::{self, CreateArgs};
use crate::util::errors::Res;

pub fn subcommand() -> App<'static, 'static> {
    SubCommand::with_name("create")
        .about("create a new configuration directory")
        .arg(Arg::with_name("directory").required(true))
        .arg(Arg::with_name("type").long("type").takes_value(true).default_value("target"))
        .arg(Arg::with_name("name").long("name").takes_value(true))
}

pub fn run(matches: &ArgMatches, log: Logger) -> Res<()> {
    let directory = Path::new(matches.value_of("directory").unwrap()).to_path_buf();
    let type_ = matches.value_of("type").unwrap().to_string();
    let name = matches.value_of("name").map(|s| s.to_string());

    create::run(CreateArgs { directory, type_, name }, log)?;
    Ok(())
}
