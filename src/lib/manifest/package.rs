//! Per-package `manifest` (spec §6) and the `depends` grammar it carries
//! (spec §4.6): an ordered list of depends entries, each a disjunction of
//! alternatives, each alternative a conjunction of constrained package
//! references plus optional `enable`/`reflect` and either `prefer+accept`
//! or `require` clauses.
//!
//! Textual form (one physical `depends:` line per entry):
//!
//! ```text
//! depends: libfoo ^1.0.0, libbar [2.0 3.0) {enable: ...; reflect: ...} | libbaz *
//! ```
//!
//! `|` separates alternatives, `,` separates the conjunction of package
//! references within an alternative, and an optional `{...}` trailer
//! carries `key: value` clauses separated by `;`. A package reference
//! prefixed with `*` is build-time (spec §4.6).

use serde::{Deserialize, Serialize};

use crate::types::{Name, VersionConstraint};
use crate::util::errors::{ErrorKind, Res};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    pub name: Name,
    pub constraint: VersionConstraint,
    pub buildtime: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clauses {
    pub enable: Option<String>,
    pub reflect: Option<String>,
    pub prefer: Option<String>,
    pub accept: Option<String>,
    pub require: Option<String>,
}

impl Clauses {
    pub fn has_prefer_accept(&self) -> bool {
        self.prefer.is_some() || self.accept.is_some()
    }

    pub fn has_require(&self) -> bool {
        self.require.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub refs: Vec<DependencyRef>,
    pub clauses: Clauses,
}

/// One `depends` entry: a disjunction of alternatives, plus the source
/// line number used in diagnostics when no alternative is satisfiable
/// (spec §4.6 step 2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsEntry {
    pub line: usize,
    pub alternatives: Vec<Alternative>,
}

fn parse_dependency_ref(s: &str) -> Res<DependencyRef> {
    let s = s.trim();
    let (buildtime, s) = if let Some(rest) = s.strip_prefix('*') {
        (true, rest.trim())
    } else {
        (false, s)
    };

    // Name is the leading run of name characters; the remainder (if any)
    // is the version constraint.
    let split_at = s
        .find(|c: char| c.is_whitespace() || c == '[' || c == '(' || c == '=')
        .unwrap_or(s.len());
    let (name_s, constraint_s) = s.split_at(split_at);
    let name = name_s
        .parse::<Name>()
        .map_err(|_| ErrorKind::InvalidManifestFile(format!("bad dependency name `{}`", name_s)))?;
    let constraint_s = constraint_s.trim();
    let constraint = if constraint_s.is_empty() || constraint_s == "*" {
        VersionConstraint::any()
    } else {
        constraint_s
            .parse::<VersionConstraint>()
            .map_err(|_| ErrorKind::InvalidManifestFile(format!("bad constraint `{}`", constraint_s)))?
    };

    Ok(DependencyRef {
        name,
        constraint,
        buildtime,
    })
}

fn parse_clauses(s: &str) -> Res<Clauses> {
    let mut clauses = Clauses::default();
    for clause in s.split(';') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let mut parts = clause.splitn(2, ':');
        let key = parts.next().unwrap_or("").trim();
        let value = parts
            .next()
            .ok_or_else(|| ErrorKind::InvalidManifestFile(format!("bad clause `{}`", clause)))?
            .trim()
            .to_string();
        match key {
            "enable" => clauses.enable = Some(value),
            "reflect" => clauses.reflect = Some(value),
            "prefer" => clauses.prefer = Some(value),
            "accept" => clauses.accept = Some(value),
            "require" => clauses.require = Some(value),
            other => {
                return Err(
                    ErrorKind::InvalidManifestFile(format!("unknown clause `{}`", other)).into(),
                )
            }
        }
    }

    if clauses.has_require() && clauses.has_prefer_accept() {
        return Err(ErrorKind::InvalidManifestFile(
            "an alternative may carry either prefer+accept or require, not both".to_string(),
        )
        .into());
    }

    Ok(clauses)
}

fn parse_alternative(s: &str) -> Res<Alternative> {
    let (body, clauses) = if let Some(brace) = s.find('{') {
        let end = s
            .rfind('}')
            .ok_or_else(|| ErrorKind::InvalidManifestFile("unterminated clause block".to_string()))?;
        (&s[..brace], parse_clauses(&s[brace + 1..end])?)
    } else {
        (s, Clauses::default())
    };

    let refs = body
        .split(',')
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(parse_dependency_ref)
        .collect::<Res<Vec<_>>>()?;

    if refs.is_empty() {
        return Err(ErrorKind::InvalidManifestFile("empty dependency alternative".to_string()).into());
    }

    Ok(Alternative { refs, clauses })
}

pub fn parse_depends_entry(line: usize, raw: &str) -> Res<DependsEntry> {
    let alternatives = raw
        .split('|')
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(parse_alternative)
        .collect::<Res<Vec<_>>>()?;

    if alternatives.is_empty() {
        return Err(ErrorKind::InvalidManifestFile("empty depends entry".to_string()).into());
    }

    Ok(DependsEntry { line, alternatives })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: Name,
    pub version: crate::types::Version,
    pub project: Option<String>,
    pub summary: Option<String>,
    pub depends: Vec<DependsEntry>,
    pub languages: Vec<String>,
}

impl PackageManifest {
    pub fn parse(raw: &str) -> Res<Self> {
        let entries = super::parse_entries(raw)?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| ErrorKind::InvalidManifestFile("empty package manifest".to_string()))?;

        let name = entry.require("name")?.parse()?;
        let version = entry.require("version")?.parse()?;
        let project = entry.get("project").map(|s| s.to_string());
        let summary = entry.get("summary").map(|s| s.to_string());
        let languages = entry
            .get("languages")
            .map(|s| s.split(',').map(|l| l.trim().to_string()).collect())
            .unwrap_or_default();

        let depends = entry
            .get_all("depends")
            .enumerate()
            .map(|(i, raw)| parse_depends_entry(i + 1, raw))
            .collect::<Res<Vec<_>>>()?;

        Ok(PackageManifest {
            name,
            version,
            project,
            summary,
            depends,
            languages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_disjunction_and_conjunction() {
        let e = parse_depends_entry(1, "libfoo ^1.0.0, libbar [2.0 3.0) | libbaz *").unwrap();
        assert_eq!(e.alternatives.len(), 2);
        assert_eq!(e.alternatives[0].refs.len(), 2);
        assert_eq!(e.alternatives[1].refs.len(), 1);
    }

    #[test]
    fn parses_buildtime_marker() {
        let e = parse_depends_entry(1, "*libbuild2-kconfig ^1.0.0").unwrap();
        assert!(e.alternatives[0].refs[0].buildtime);
    }

    #[test]
    fn parses_clauses() {
        let e = parse_depends_entry(
            1,
            "libfoo ^1.0.0 {enable: host; reflect: config.libfoo.x = true}",
        )
        .unwrap();
        let c = &e.alternatives[0].clauses;
        assert_eq!(c.enable.as_deref(), Some("host"));
        assert!(c.reflect.is_some());
    }

    #[test]
    fn rejects_require_and_prefer_together() {
        let r = parse_depends_entry(1, "libfoo {require: x; prefer: y}");
        assert!(r.is_err());
    }

    #[test]
    fn full_manifest_parses() {
        let raw = "\
name: libfoo
version: 1.2.3
project: math
summary: a math library
depends: libbar ^1.0.0
depends: libbaz [2.0 3.0)
";
        let m = PackageManifest::parse(raw).unwrap();
        assert_eq!(m.depends.len(), 2);
        assert_eq!(m.name.as_str(), "libfoo");
    }
}
