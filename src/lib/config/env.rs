//! `BPKG_OPEN_CONFIGS` (spec §4.1, §6): the set of currently open
//! configuration directories, exported so cooperating external build
//! tools can see them. Format per the original: space-separated,
//! double-quoted, absolute paths.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const VAR_NAME: &str = "BPKG_OPEN_CONFIGS";

/// Render a set of open configuration directories into the exact
/// on-the-wire format the original emits.
pub fn render(dirs: &BTreeSet<PathBuf>) -> String {
    dirs.iter()
        .map(|d| format!("\"{}\"", d.display()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a previously rendered `BPKG_OPEN_CONFIGS` value back into a set
/// of directories (used when this process inherits the variable from a
/// cooperating parent).
pub fn parse(raw: &str) -> BTreeSet<PathBuf> {
    let mut out = BTreeSet::new();
    let mut chars = raw.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut s = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                s.push(c);
            }
            out.insert(PathBuf::from(s));
        } else {
            break;
        }
    }
    out
}

/// Merge `dir` into the current process's view of open configurations
/// and produce the new environment variable value. `reset` mirrors the
/// original's `add_env(reset)`: when true, discard anything inherited
/// from the parent process rather than appending to it.
pub fn add(existing: Option<&str>, dir: &Path, reset: bool) -> String {
    let mut dirs = if reset {
        BTreeSet::new()
    } else {
        existing.map(parse).unwrap_or_default()
    };
    dirs.insert(dir.to_path_buf());
    render(&dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_render_and_parse() {
        let mut dirs = BTreeSet::new();
        dirs.insert(PathBuf::from("/home/user/cfg1"));
        dirs.insert(PathBuf::from("/home/user/cfg2"));
        let rendered = render(&dirs);
        assert_eq!(parse(&rendered), dirs);
    }

    #[test]
    fn add_appends_unless_reset() {
        let existing = "\"/a\" \"/b\"";
        let appended = add(Some(existing), Path::new("/c"), false);
        assert_eq!(parse(&appended).len(), 3);

        let reset = add(Some(existing), Path::new("/c"), true);
        assert_eq!(parse(&reset).len(), 1);
    }
}
