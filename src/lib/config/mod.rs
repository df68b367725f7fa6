//! C2 — the configuration store: opening/creating databases, schema
//! migration, linking, transactions, and `BPKG_OPEN_CONFIGS` (spec
//! §4.1).

pub mod env;
pub mod link;
pub mod schema;
pub mod store;
pub mod transaction;

pub use link::{dependency_configs, dependent_configs, ConfigLink, LinkKind};
pub use store::Config;
pub use transaction::Transaction;
