//! C3 — the package state machine: selected packages, legal
//! transitions, and the fetch/unpack/configure/disfigure/purge/drop
//! operations (spec §4.2).

pub mod configure;
pub mod disfigure;
pub mod drop;
pub mod fetch;
pub mod purge;
pub mod selected;
pub mod state;
pub mod unpack;

pub use selected::{LazyPointer, Prerequisite, SelectedPackage};
pub use state::{PackageState, Substate};
