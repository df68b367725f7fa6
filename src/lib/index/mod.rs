//! Configuration of the tool itself (spec §1 ambient stack).

pub mod config;

pub use config::{RepositorySourceConfig, RepositorySourceInner};
