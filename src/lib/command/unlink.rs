//! `bpkg unlink` — remove an explicit configuration link (spec §4.1
//! "Unlinking").

use crate::config::link;
use crate::config::store::Config;
use crate::util::errors::Res;

pub fn run(a: &mut Config, b: &mut Config, name: &str, private: bool) -> Res<()> {
    link::unlink(a, b, name, private)
}
