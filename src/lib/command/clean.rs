//! `bpkg clean` — garbage-collect the fetch cache (spec §4.4 "Garbage
//! collection").

use slog::Logger;
use std::time::Duration;

use crate::cache::gc::{self, GcPlan};
use crate::cache::store::FetchCache;
use crate::util::errors::Res;

pub fn run(cache: &FetchCache, max_age: Duration, log: &Logger) -> Res<GcPlan> {
    let plan = gc::plan(cache, max_age)?;
    gc::apply(cache, &plan, log)?;
    Ok(plan)
}
