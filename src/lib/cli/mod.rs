//! `clap` wiring, kept/adapted from the teacher's `cli::new` (spec §0
//! [ADDED]): builds the argument parser and dispatches each subcommand
//! to one `command::*` verb.

pub mod new;

use clap::{App, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::store::Config;
use crate::driver::{SubprocessDriver, SubprocessTar};
use crate::package::selected;
use crate::types::Name;
use crate::util::errors::{ErrorKind, Res};

pub fn app() -> App<'static, 'static> {
    App::new("bpkg")
        .about("dependency resolution and build-state engine")
        .arg(Arg::with_name("verbose").short("v").multiple(true).help("increase diagnostic verbosity"))
        .subcommand(new::subcommand())
        .subcommand(
            SubCommand::with_name("status")
                .about("list selected packages")
                .arg(Arg::with_name("directory").required(true)),
        )
        .subcommand(
            SubCommand::with_name("fetch")
                .about("bind a downloaded archive to a selected package")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("name").required(true))
                .arg(Arg::with_name("archive").required(true))
                .arg(Arg::with_name("sha256").required(true))
                .arg(Arg::with_name("shared-src").long("shared-src")),
        )
        .subcommand(
            SubCommand::with_name("unpack")
                .about("extract a fetched archive")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("name").required(true)),
        )
        .subcommand(
            SubCommand::with_name("disfigure")
                .about("undo configure")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("name").required(true))
                .arg(Arg::with_name("clean").long("clean")),
        )
        .subcommand(
            SubCommand::with_name("purge")
                .about("remove on-disk artifacts and erase the row")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("name").required(true))
                .arg(Arg::with_name("force").long("force")),
        )
        .subcommand(
            SubCommand::with_name("drop")
                .about("disfigure-then-purge a package and its dependents")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("name").required(true))
                .arg(Arg::with_name("yes").short("y").long("yes")),
        )
        .subcommand(
            SubCommand::with_name("link")
                .about("explicitly link two configurations")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("other").required(true))
                .arg(Arg::with_name("name").long("name").takes_value(true))
                .arg(Arg::with_name("relative").long("relative")),
        )
        .subcommand(
            SubCommand::with_name("unlink")
                .about("remove an explicit configuration link")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("other").required(true))
                .arg(Arg::with_name("name").required(true))
                .arg(Arg::with_name("private").long("private")),
        )
        .subcommand(
            SubCommand::with_name("clean")
                .about("garbage-collect the fetch cache")
                .arg(Arg::with_name("directory").required(true))
                .arg(Arg::with_name("max-age-secs").long("max-age-secs").takes_value(true).default_value("0")),
        )
}

fn parse_name(raw: &str) -> Res<Name> {
    Name::from_str(raw).map_err(|_| ErrorKind::InvalidPackageName(raw.to_string()).into())
}

/// Dispatch a parsed subcommand to its `command::*` verb (spec §0
/// [ADDED]: this is the only place argv is translated into library
/// calls — everything past this is `command::*`/`package::*`).
pub fn run(matches: &ArgMatches, log: slog::Logger) -> Res<()> {
    match matches.subcommand() {
        ("create", Some(sub)) => {
            new::run(sub, log)?;
            Ok(())
        }
        ("status", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let config = Config::open(directory, log)?;
            for row in crate::command::status::run(&config)? {
                println!("{} {} {} {}", row.name, row.version, row.state, row.substate);
            }
            Ok(())
        }
        ("fetch", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let name = parse_name(sub.value_of("name").unwrap())?;
            let archive = PathBuf::from(sub.value_of("archive").unwrap());
            let sha256 = sub.value_of("sha256").unwrap().to_string();
            let shared_src = sub.is_present("shared-src");

            let config = Config::open(directory, log.clone())?;
            let mut pkg = selected::load(&config, &name)?
                .ok_or_else(|| ErrorKind::UnknownPackage(name.to_string()))?;
            let dest_dir = directory.join(".bpkg");
            crate::command::fetch::run(
                &mut pkg,
                crate::command::fetch::FetchArgs { archive_src: archive, dest_dir, expected_sha256: sha256, shared_src },
                &log,
            )?;
            selected::save(&config, &pkg)?;
            Ok(())
        }
        ("unpack", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let name = parse_name(sub.value_of("name").unwrap())?;

            let config = Config::open(directory, log.clone())?;
            let mut pkg = selected::load(&config, &name)?
                .ok_or_else(|| ErrorKind::UnknownPackage(name.to_string()))?;
            let archive_tool = SubprocessTar { program: "tar".to_string() };
            crate::command::unpack::run_from_archive(&mut pkg, &archive_tool, &directory.join(".bpkg"), &log)?;
            selected::save(&config, &pkg)?;
            Ok(())
        }
        ("disfigure", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let name = parse_name(sub.value_of("name").unwrap())?;
            let clean = sub.is_present("clean");

            let config = Config::open(directory, log.clone())?;
            let universe = selected::load_all(&config)?;
            let mut pkg = selected::load(&config, &name)?
                .ok_or_else(|| ErrorKind::UnknownPackage(name.to_string()))?;
            let driver = SubprocessDriver { program: "b".to_string() };
            let others = universe.iter().filter(|p| p.name != name);
            crate::command::disfigure::run(&mut pkg, &driver, others, clean, &log)?;
            selected::save(&config, &pkg)?;
            Ok(())
        }
        ("purge", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let name = parse_name(sub.value_of("name").unwrap())?;
            let force = sub.is_present("force");

            let config = Config::open(directory, log)?;
            let pkg = selected::load(&config, &name)?
                .ok_or_else(|| ErrorKind::UnknownPackage(name.to_string()))?;
            let actions = crate::command::purge::run(&pkg, force)?;
            crate::command::purge::apply(&actions, &pkg)?;
            if actions.erase_row {
                selected::erase(&config, &name)?;
            }
            Ok(())
        }
        ("drop", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let name = parse_name(sub.value_of("name").unwrap())?;
            let assume_yes = sub.is_present("yes");

            let config = Config::open(directory, log)?;
            let universe = selected::load_all(&config)?;
            let mut confirm = crate::package::drop::AlwaysYes;
            let order = crate::command::drop::run(&name, &universe, assume_yes, &mut confirm)?;
            for dropped in order {
                selected::erase(&config, &dropped)?;
            }
            Ok(())
        }
        ("link", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let other = Path::new(sub.value_of("other").unwrap());
            let name = sub.value_of("name").map(|s| s.to_string());
            let relative = sub.is_present("relative");

            let mut a = Config::open(directory, log.clone())?;
            let b = Config::open(other, log)?;
            crate::command::link::run(&mut a, directory, &b, other, crate::command::link::LinkArgs { name, relative })
        }
        ("unlink", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let other = Path::new(sub.value_of("other").unwrap());
            let name = sub.value_of("name").unwrap();
            let private = sub.is_present("private");

            let mut a = Config::open(directory, log.clone())?;
            let mut b = Config::open(other, log)?;
            crate::command::unlink::run(&mut a, &mut b, name, private)
        }
        ("clean", Some(sub)) => {
            let directory = Path::new(sub.value_of("directory").unwrap());
            let max_age_secs: u64 = sub
                .value_of("max-age-secs")
                .unwrap()
                .parse()
                .map_err(|_| ErrorKind::Logic("invalid --max-age-secs".to_string()))?;

            let cache = crate::cache::store::FetchCache::open(&directory.join(".bpkg/cache"), log.clone())?;
            crate::command::clean::run(&cache, Duration::from_secs(max_age_secs), &log)?;
            Ok(())
        }
        _ => Err(ErrorKind::Logic("no subcommand given".to_string()).into()),
    }
}
