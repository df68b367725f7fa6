//! `bpkg link` — explicitly link two configurations (spec §4.1
//! "Linking").

use std::path::Path;

use crate::config::link;
use crate::config::store::Config;
use crate::util::errors::Res;

pub struct LinkArgs {
    pub name: Option<String>,
    pub relative: bool,
}

pub fn run(a: &mut Config, a_dir: &Path, b: &Config, b_dir: &Path, args: LinkArgs) -> Res<()> {
    link::link(a, a_dir, b, b_dir, args.name, args.relative)
}
