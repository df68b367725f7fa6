//! External collaborators (spec §1): the build-system driver, the
//! archive/compression tool, and the toolchain pseudo-dependency
//! version probe. All are invoked as subprocesses via `util::process`;
//! this module gives each one a typed seam so `package::*` and
//! `resolve::*` don't shell out directly.

use slog::Logger;
use std::path::Path;

use crate::types::Version;
use crate::util::errors::{ErrorKind, Res};
use crate::util::process;

/// A small projection of a package's build-system-reported info (spec
/// §2 "`package_b_info`/`b info` projection"): the narrow contract is
/// "spawn driver with argv; pipe output; interpret exit code and a small
/// projection of its reported info via a name-colon-value stream".
#[derive(Clone, Debug, Default)]
pub struct PackageBuildInfo {
    pub project_name: Option<String>,
    pub amalgamation: bool,
    pub subprojects: Vec<String>,
}

fn parse_b_info(raw: &str) -> PackageBuildInfo {
    let mut info = PackageBuildInfo::default();
    for line in raw.lines() {
        if let Some((k, v)) = line.split_once(':') {
            match k.trim() {
                "project" => info.project_name = Some(v.trim().to_string()),
                "amalgamation" => info.amalgamation = v.trim() == "true",
                "subprojects" => {
                    info.subprojects = v.trim().split_whitespace().map(|s| s.to_string()).collect()
                }
                _ => {}
            }
        }
    }
    info
}

/// Seam to the build-system driver binary (`b`, spec §1). A fake
/// implementation backs tests; production code shells out through
/// `util::process`.
pub trait BuildSystemDriver {
    fn configure(&self, src_root: &Path, out_root: &Path, log: &Logger) -> Res<()>;
    fn disfigure(&self, out_root: &Path, clean: bool, log: &Logger) -> Res<()>;
    fn info(&self, src_root: &Path, log: &Logger) -> Res<PackageBuildInfo>;
    /// `b --version`, used by the toolchain pseudo-dependency check
    /// (spec §2 "build2/bpkg toolchain pseudo-dependencies").
    fn version(&self, log: &Logger) -> Res<Version>;
}

/// Invokes the real `b` binary found on `PATH` (or at `program`).
pub struct SubprocessDriver {
    pub program: String,
}

impl BuildSystemDriver for SubprocessDriver {
    fn configure(&self, src_root: &Path, out_root: &Path, log: &Logger) -> Res<()> {
        process::run(
            log,
            &self.program,
            &["configure", &src_root.to_string_lossy(), &format!("out={}", out_root.display())],
            None,
        )?;
        Ok(())
    }

    fn disfigure(&self, out_root: &Path, clean: bool, log: &Logger) -> Res<()> {
        if clean {
            process::run(log, &self.program, &["clean", &out_root.to_string_lossy()], None)?;
        }
        process::run(log, &self.program, &["disfigure", &out_root.to_string_lossy()], None)?;
        Ok(())
    }

    fn info(&self, src_root: &Path, log: &Logger) -> Res<PackageBuildInfo> {
        let out = process::run_text(log, &self.program, &["info", &src_root.to_string_lossy()], None)?;
        Ok(parse_b_info(&out))
    }

    fn version(&self, log: &Logger) -> Res<Version> {
        let out = process::run_text(log, &self.program, &["--version"], None)?;
        parse_toolchain_version(&out)
            .ok_or_else(|| ErrorKind::Logic("unable to parse build2 version output".to_string()).into())
    }
}

/// Parses the `"build2 "`-prefixed version line emitted by `b
/// --version` (spec §2, `satisfaction.cxx`'s `satisfy_build2`).
pub fn parse_toolchain_version(output: &str) -> Option<Version> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("build2 "))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|v| v.parse().ok())
}

/// Seam to the archive/compression tool (spec §1).
pub trait ArchiveTool {
    fn extract(&self, archive: &Path, dest: &Path, log: &Logger) -> Res<()>;
    fn create(&self, src_dir: &Path, archive: &Path, log: &Logger) -> Res<()>;
}

pub struct SubprocessTar {
    pub program: String,
}

impl ArchiveTool for SubprocessTar {
    fn extract(&self, archive: &Path, dest: &Path, log: &Logger) -> Res<()> {
        std::fs::create_dir_all(dest).map_err(|_| ErrorKind::Io(dest.to_path_buf()))?;
        process::run(
            log,
            &self.program,
            &["-xf", &archive.to_string_lossy(), "-C", &dest.to_string_lossy(), "--strip-components=1"],
            None,
        )?;
        Ok(())
    }

    fn create(&self, src_dir: &Path, archive: &Path, log: &Logger) -> Res<()> {
        process::run(
            log,
            &self.program,
            &["-czf", &archive.to_string_lossy(), "-C", &src_dir.to_string_lossy(), "."],
            None,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toolchain_version_line() {
        let output = "build2 0.15.0\nbuild2 toolchain\n";
        let v = parse_toolchain_version(output).unwrap();
        assert_eq!(v.to_string(), "0.15.0");
    }

    #[test]
    fn parses_b_info_projection() {
        let raw = "project: libfoo\namalgamation: true\nsubprojects: libbar libbaz\n";
        let info = parse_b_info(raw);
        assert_eq!(info.project_name.as_deref(), Some("libfoo"));
        assert!(info.amalgamation);
        assert_eq!(info.subprojects, vec!["libbar".to_string(), "libbaz".to_string()]);
    }
}
