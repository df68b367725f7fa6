//! `bpkg`: a C/C++-style package manager's dependency-resolution and
//! build-state engine.

pub mod cache;
pub mod cli;
pub mod command;
pub mod config;
pub mod driver;
pub mod index;
pub mod manifest;
pub mod package;
pub mod query;
pub mod repository;
pub mod resolve;
pub mod types;
pub mod util;

use slog::Drain;

/// Build the root logger at the verbosity requested on the command line
/// (spec §1's `verb` global: 0 is warnings-and-errors only, climbing
/// through info/trace as `verbosity` increases).
pub fn root_logger(verbosity: u8) -> slog::Logger {
    let level = match verbosity {
        0 => slog::Level::Warning,
        1 => slog::Level::Info,
        2 => slog::Level::Debug,
        _ => slog::Level::Trace,
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
