//! `bpkg unpack` — extract a fetched archive, or adopt an external
//! source directory (spec §4.2 "Unpack").

use slog::Logger;
use std::path::{Path, PathBuf};

use crate::driver::ArchiveTool;
use crate::manifest::package::PackageManifest;
use crate::package::selected::SelectedPackage;
use crate::package::unpack;
use crate::util::errors::Res;

pub fn run_from_archive(selected: &mut SelectedPackage, archive_tool: &dyn ArchiveTool, cfg_dir: &Path, log: &Logger) -> Res<()> {
    unpack::unpack_from_archive(selected, archive_tool, cfg_dir, log)
}

pub struct UnpackDirArgs {
    pub external_dir: PathBuf,
    pub subprojects: Vec<String>,
    pub build_dir_names: (String, String),
}

pub fn run_from_directory(selected: &mut SelectedPackage, args: UnpackDirArgs, manifest: &PackageManifest) -> Res<()> {
    unpack::unpack_from_directory(
        selected,
        &args.external_dir,
        manifest,
        &args.subprojects,
        (args.build_dir_names.0.as_str(), args.build_dir_names.1.as_str()),
    )
}
