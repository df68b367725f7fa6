//! CLI-facing verbs, each a thin layer over the core modules (spec §0
//! [ADDED]): argument structs in, a `Res<()>`/small result out, no
//! business logic beyond what's needed to wire `cli::*` to `config::*`,
//! `package::*`, `repository::*`, `cache::*` and `resolve::*`.

pub mod clean;
pub mod configure;
pub mod create;
pub mod disfigure;
pub mod drop;
pub mod fetch;
pub mod link;
pub mod purge;
pub mod status;
pub mod unlink;
pub mod unpack;
