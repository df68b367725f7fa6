//! Integration test for spec §8 scenario S6 (state transition under
//! crash): a build-system-driver failure during disfigure must leave the
//! selected-package row `broken` and committed, and a later run must
//! refuse to purge it without `--force`.

use std::path::Path;
use std::str::FromStr;

use slog::Logger;

use bpkg::config::store::Config;
use bpkg::driver::{BuildSystemDriver, PackageBuildInfo};
use bpkg::package::state::PackageState;
use bpkg::package::{disfigure, purge, selected};
use bpkg::types::{Name, Version};
use bpkg::util::errors::{ErrorKind, Res};

fn logger() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

struct FailingDriver;

impl BuildSystemDriver for FailingDriver {
    fn configure(&self, _src_root: &Path, _out_root: &Path, _log: &Logger) -> Res<()> {
        Ok(())
    }
    fn disfigure(&self, _out_root: &Path, _clean: bool, _log: &Logger) -> Res<()> {
        Err(ErrorKind::SubprocessFailed("b".to_string()).into())
    }
    fn info(&self, _src_root: &Path, _log: &Logger) -> Res<PackageBuildInfo> {
        Ok(PackageBuildInfo::default())
    }
    fn version(&self, _log: &Logger) -> Res<Version> {
        "0.15.0".parse()
    }
}

#[test]
fn s6_failed_disfigure_is_persisted_as_broken_and_blocks_purge() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::create(dir.path(), "target", None, logger()).unwrap();

    let out_root = dir.path().join("libfoo");
    std::fs::create_dir_all(&out_root).unwrap();

    let mut pkg = selected::SelectedPackage::new(0, Name::from_str("libfoo").unwrap(), Version::from_str("1.0.0").unwrap());
    pkg.state = PackageState::Configured;
    pkg.out_root = Some(out_root.clone());
    selected::save(&cfg, &pkg).unwrap();

    let driver = FailingDriver;
    let others: Vec<selected::SelectedPackage> = vec![];
    let result = disfigure::disfigure(&mut pkg, &driver, others.iter(), false, &cfg.log);
    assert!(result.is_err(), "the driver failure must propagate");
    assert_eq!(pkg.state, PackageState::Broken);

    // The row must reflect `broken` even though the operation failed —
    // the caller commits the transaction around the save regardless of
    // the disfigure outcome (spec §4.2 "Disfigure").
    selected::save(&cfg, &pkg).unwrap();

    let reloaded = selected::load(&cfg, &pkg.name).unwrap().unwrap();
    assert_eq!(reloaded.state, PackageState::Broken);

    // A later run must refuse to purge without --force.
    assert!(purge::purge(&reloaded, false).is_err());

    // With --force, purge is refused again because the artifact (out_root
    // still standing in for an un-cleaned state) is not itself gated here;
    // src_root/archive are both absent so --force succeeds.
    let actions = purge::purge(&reloaded, true).unwrap();
    assert!(actions.erase_row);
}
