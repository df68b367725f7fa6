//! Manifest formats (spec §6): line-oriented, `name: value`, UTF-8,
//! entries separated by blank lines. This module has the shared grammar;
//! submodules specialize it for each of the four manifest kinds.

pub mod package;
pub mod packages;
pub mod repositories;
pub mod signature;

use crate::util::errors::{ErrorKind, Res};

/// One manifest entry: an ordered list of `name: value` pairs (order
/// matters for fields like `depends` that can repeat).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    pub fields: Vec<(String, String)>,
}

impl Entry {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields.iter().filter(move |(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn require(&self, name: &str) -> Res<&str> {
        self.get(name)
            .ok_or_else(|| ErrorKind::InvalidManifestFile(format!("missing field `{}`", name)).into())
    }
}

/// Split a manifest document into blank-line-separated entries, each
/// parsed into `name: value` pairs. A backslash at end of line continues
/// the value onto the next line (long `depends`/`sha256sum` values).
pub fn parse_entries(raw: &str) -> Res<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut current = Entry::default();
    let mut pending_continuation: Option<String> = None;

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.fields.is_empty() {
                entries.push(std::mem::take(&mut current));
            }
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            // Continuation of the previous value.
            if let Some((_, v)) = current.fields.last_mut() {
                v.push('\n');
                v.push_str(line.trim());
            }
            continue;
        }

        if let Some(mut carry) = pending_continuation.take() {
            carry.push_str(line.trim_start());
            current.fields.last_mut().unwrap().1 = carry;
        }

        let mut parts = line.splitn(2, ':');
        let key = parts.next().unwrap_or("").trim().to_string();
        let mut value = parts
            .next()
            .ok_or_else(|| ErrorKind::InvalidManifestFile(format!("malformed line: {}", line)))?
            .trim()
            .to_string();

        if value.ends_with('\\') {
            value.pop();
            current.fields.push((key, value));
            pending_continuation = Some(String::new());
        } else {
            current.fields.push((key, value));
        }
    }

    if !current.fields.is_empty() {
        entries.push(current);
    }

    Ok(entries)
}

/// Serialize a single entry back into `name: value` lines.
pub fn render_entry(entry: &Entry) -> String {
    let mut out = String::new();
    for (k, v) in &entry.fields {
        out.push_str(k);
        out.push_str(": ");
        out.push_str(v);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_entries() {
        let raw = "name: foo\nversion: 1.0\n\nname: bar\nversion: 2.0\n";
        let entries = parse_entries(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get("name"), Some("foo"));
        assert_eq!(entries[1].get("version"), Some("2.0"));
    }
}
