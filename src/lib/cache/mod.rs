//! C5 — the shared fetch cache: `fetch-cache.sqlite3` plus the on-disk
//! layout it indexes (spec §4.4).

pub mod gc;
pub mod session;
pub mod store;

pub use gc::{apply as gc_apply, plan as gc_plan, GcPlan};
pub use session::{session_id, CacheMode};
pub use store::{FetchCache, MetadataLookup, SharedSourceDirectory};
