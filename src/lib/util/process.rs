//! Subprocess invocation and exit-code interpretation.
//!
//! Archive extraction, the build-system driver, `git`, and `openssl` are
//! all external collaborators invoked as subprocesses (spec §1, §9). This
//! module gives every caller one place to spawn, capture output, and turn
//! a non-zero exit status into a diagnosed `ErrorKind::SubprocessFailed`,
//! matching the `print_process`/`fail_mark` idiom of the original's
//! `diagnostics.cxx`.

use slog::Logger;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::util::errors::{ErrorKind, Res};

/// Run `program` with `args` in `cwd` (if given), returning captured
/// stdout/stderr. Fails with `ErrorKind::SubprocessFailed` on non-zero exit
/// and `ErrorKind::SubprocessSpawn` if the program couldn't even start.
pub fn run(log: &Logger, program: &str, args: &[&str], cwd: Option<&Path>) -> Res<Output> {
    slog::debug!(log, "spawning subprocess"; "program" => program, "args" => format!("{:?}", args));

    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .map_err(|_| ErrorKind::SubprocessSpawn(program.to_string()))?;

    if !output.status.success() {
        slog::warn!(
            log,
            "subprocess failed";
            "program" => program,
            "status" => output.status.code(),
        );
        return Err(ErrorKind::SubprocessFailed(program.to_string()).into());
    }

    Ok(output)
}

/// As `run`, but return stdout decoded as UTF-8 (lossy), trimmed.
pub fn run_text(log: &Logger, program: &str, args: &[&str], cwd: Option<&Path>) -> Res<String> {
    let out = run(log, program, args, cwd)?;
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Read the whole of a piped child's stdout as bytes regardless of status,
/// used where the caller wants to interpret a non-zero exit itself (e.g.
/// `satisfy_build2`, which falls through to a diagnostic only if the
/// version line couldn't be parsed even though the process otherwise
/// failed).
pub fn run_lenient(program: &str, args: &[&str]) -> Res<(bool, String)> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|_| ErrorKind::SubprocessSpawn(program.to_string()))?;

    let mut out = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        let _ = stdout.read_to_string(&mut out);
    }
    let status = child
        .wait()
        .map_err(|_| ErrorKind::SubprocessSpawn(program.to_string()))?;

    Ok((status.success(), out))
}
