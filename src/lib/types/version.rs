//! Package versions and version constraints (spec §3, C1).
//!
//! A `Version` is the strictly ordered tuple
//! `(epoch, upstream, release?, revision?, iteration?)` described in the
//! data model. Comparison and satisfaction rules are ported from the
//! `bpkg` original's `satisfaction.cxx`, in particular the "effective
//! revision" normalization (an absent revision compares as revision zero)
//! and the endpoint-normalization used when comparing one constraint
//! against another ("stricter than").

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::char as nom_char,
    combinator::{map, opt},
    sequence::{preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::util::errors::{ErrorKind, Res};

/// A single dot-separated numeric-or-alpha component of the upstream
/// version string, compared the way Debian-style version strings are:
/// numeric runs compare numerically, everything else compares as text,
/// and a missing trailing component sorts before a present one.
fn compare_upstream(a: &str, b: &str) -> Ordering {
    let mut ai = a.split('.');
    let mut bi = b.split('.');

    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(xn), Ok(yn)) => xn.cmp(&yn),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// `Version` with a distinguished *wildcard* value (spec §3): the
/// wildcard satisfies any constraint and stands in for an unconstrained
/// system package. We represent it as a dedicated boolean rather than a
/// magic numeric sentinel so comparisons can't accidentally collide with
/// a real version.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct Version {
    pub epoch: u16,
    pub upstream: String,
    /// `None` = final release. `Some("")` = the earliest pre-release,
    /// used as a range floor. `Some(s)` = a named pre-release/snapshot.
    pub release: Option<String>,
    pub revision: Option<u16>,
    pub iteration: Option<u16>,
    #[serde(default)]
    wildcard: bool,
}

impl Version {
    pub fn new(
        epoch: u16,
        upstream: impl Into<String>,
        release: Option<String>,
        revision: Option<u16>,
        iteration: Option<u16>,
    ) -> Self {
        Version {
            epoch,
            upstream: upstream.into(),
            release,
            revision,
            iteration,
            wildcard: false,
        }
    }

    /// The designated wildcard version.
    pub fn wildcard() -> Self {
        Version {
            epoch: 0,
            upstream: String::new(),
            release: None,
            revision: None,
            iteration: None,
            wildcard: true,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// An absent revision means zero revision for the purposes of
    /// comparing two concrete versions (`X` must satisfy `[X+0, ...)`,
    /// i.e. technically `X < X+0`).
    pub fn effective_revision(&self) -> u16 {
        self.revision.unwrap_or(0)
    }

    pub fn is_earliest_release(&self) -> bool {
        matches!(&self.release, Some(r) if r.is_empty())
    }

    /// Compare two versions. `ignore_revision` folds the revision
    /// component out of the comparison entirely (rather than treating an
    /// absent one as zero); `ignore_iteration` folds out the iteration.
    pub fn compare(&self, other: &Version, ignore_revision: bool, ignore_iteration: bool) -> Ordering {
        if self.wildcard || other.wildcard {
            return if self.wildcard == other.wildcard {
                Ordering::Equal
            } else if self.wildcard {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = self.epoch.cmp(&other.epoch);
        if ord != Ordering::Equal {
            return ord;
        }

        let ord = compare_upstream(&self.upstream, &other.upstream);
        if ord != Ordering::Equal {
            return ord;
        }

        // Absence of a release component sorts after any actual release
        // (a final release is newer than any pre-release of the same
        // upstream version); an empty release (earliest pre-release)
        // sorts before every named pre-release.
        let ord = match (&self.release, &other.release) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                if a.is_empty() && b.is_empty() {
                    Ordering::Equal
                } else if a.is_empty() {
                    Ordering::Less
                } else if b.is_empty() {
                    Ordering::Greater
                } else {
                    a.cmp(b)
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }

        if !ignore_revision {
            let ord = self.effective_revision().cmp(&other.effective_revision());
            if ord != Ordering::Equal {
                return ord;
            }
        }

        if !ignore_iteration {
            return self.iteration.unwrap_or(0).cmp(&other.iteration.unwrap_or(0));
        }

        Ordering::Equal
    }

    pub fn empty(&self) -> bool {
        self.upstream.is_empty() && !self.wildcard
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Version) -> bool {
        self.compare(other, false, true) == Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
        Some(self.compare(other, false, true))
    }
}
impl Ord for Version {
    fn cmp(&self, other: &Version) -> Ordering {
        self.compare(other, false, true)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.wildcard {
            return write!(f, "*");
        }
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if let Some(r) = &self.release {
            if r.is_empty() {
                write!(f, "-")?;
            } else {
                write!(f, "-{}", r)?;
            }
        }
        if let Some(rev) = self.revision {
            write!(f, "+{}", rev)?;
        }
        if let Some(it) = self.iteration {
            write!(f, "#{}", it)?;
        }
        Ok(())
    }
}

fn parse_u16(input: &str) -> IResult<&str, u16> {
    map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u16>().unwrap_or(0)
    })(input)
}

fn version_parser(input: &str) -> IResult<&str, Version> {
    let (input, epoch) = opt(map(tuple((parse_u16, nom_char(':'))), |(e, _)| e))(input)?;
    let (input, upstream) = take_while1(|c: char| c.is_alphanumeric() || c == '.' || c == '_')(input)?;
    let (input, release) = opt(preceded(
        nom_char('-'),
        take_while1(|c: char| c.is_alphanumeric() || c == '.' || c == '_'),
    ))(input)?;
    // A bare trailing '-' (no characters after it) denotes the empty,
    // "earliest pre-release" marker; nom's `opt` above already consumed
    // nothing in that case, so special-case it directly on the tail.
    let (input, release) = if release.is_none() {
        if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>("-")(input) {
            (rest, Some(""))
        } else {
            (input, release)
        }
    } else {
        (input, release)
    };
    let (input, revision) = opt(preceded(nom_char('+'), parse_u16))(input)?;
    let (input, iteration) = opt(preceded(nom_char('#'), parse_u16))(input)?;

    Ok((
        input,
        Version::new(
            epoch.unwrap_or(0),
            upstream,
            release.map(|r| r.to_string()),
            revision,
            iteration,
        ),
    ))
}

impl FromStr for Version {
    type Err = failure::Error;

    fn from_str(s: &str) -> Res<Self> {
        if s == "*" {
            return Ok(Version::wildcard());
        }
        match version_parser(s) {
            Ok((rest, v)) if rest.is_empty() => Ok(v),
            _ => Err(ErrorKind::InvalidVersion(s.to_string()).into()),
        }
    }
}

/// A half-open or closed interval `[min, max]` over versions, or an exact
/// equality constraint (represented as `min == max`, both closed).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub min_version: Option<Version>,
    pub min_open: bool,
    pub max_version: Option<Version>,
    pub max_open: bool,
}

impl VersionConstraint {
    pub fn any() -> Self {
        VersionConstraint {
            min_version: None,
            min_open: false,
            max_version: None,
            max_open: false,
        }
    }

    pub fn exact(v: Version) -> Self {
        VersionConstraint {
            min_version: Some(v.clone()),
            min_open: false,
            max_version: Some(v),
            max_open: false,
        }
    }

    pub fn range(
        min: Option<Version>,
        min_open: bool,
        max: Option<Version>,
        max_open: bool,
    ) -> Self {
        VersionConstraint {
            min_version: min,
            min_open,
            max_version: max,
            max_open,
        }
    }

    pub fn empty(&self) -> bool {
        self.min_version.is_none() && self.max_version.is_none() && (self.min_open || self.max_open)
    }

    pub fn complete(&self) -> bool {
        true
    }

    /// Normalize an endpoint version for constraint-over-constraint
    /// comparison: a present revision, or an earliest-release version, is
    /// used as-is; otherwise the absent revision is folded to 0 or u16::MAX
    /// depending on which side of the range it bounds and whether that
    /// side is open. Ported from `satisfaction.cxx`'s `norm` lambda.
    fn normalize_endpoint(v: &Version, min: bool, open: bool) -> Version {
        if v.revision.is_some() || v.is_earliest_release() {
            return v.clone();
        }
        let rev = if (min && !open) || (!min && open) {
            0
        } else {
            u16::MAX
        };
        Version::new(v.epoch, v.upstream.clone(), v.release.clone(), Some(rev), v.iteration)
    }

    /// Does every version satisfying `self` also satisfy `other`? ("`self`
    /// is stricter than or equal to `other`" / `self` is a subset of
    /// `other`.)
    pub fn stricter_than(&self, other: &VersionConstraint) -> bool {
        let min_ok = match (&self.min_version, &other.min_version) {
            (Some(l), Some(r)) => {
                let lv = Self::normalize_endpoint(l, true, self.min_open);
                let rv = Self::normalize_endpoint(r, true, other.min_open);
                let i = lv.compare(&rv, false, true);
                if self.min_open {
                    i != Ordering::Less
                } else if other.min_open {
                    i == Ordering::Greater
                } else {
                    i != Ordering::Less
                }
            }
            (Some(_), None) => true,
            (None, None) => true,
            (None, Some(_)) => false,
        };

        if !min_ok {
            return false;
        }

        match (&self.max_version, &other.max_version) {
            (Some(l), Some(r)) => {
                let lv = Self::normalize_endpoint(l, false, self.max_open);
                let rv = Self::normalize_endpoint(r, false, other.max_open);
                let i = lv.compare(&rv, false, true);
                if self.max_open {
                    i != Ordering::Greater
                } else if other.max_open {
                    i == Ordering::Less
                } else {
                    i != Ordering::Greater
                }
            }
            (Some(_), None) => true,
            (None, None) => true,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.min_version == self.max_version && !self.min_open && !self.max_open {
            if let Some(v) = &self.min_version {
                return write!(f, "=={}", v);
            }
        }
        write!(f, "{}", if self.min_open { "(" } else { "[" })?;
        if let Some(v) = &self.min_version {
            write!(f, "{}", v)?;
        }
        write!(f, " ")?;
        if let Some(v) = &self.max_version {
            write!(f, "{}", v)?;
        }
        write!(f, "{}", if self.max_open { ")" } else { "]" })
    }
}

impl FromStr for VersionConstraint {
    type Err = failure::Error;

    /// Parses the `[min max]` / `(min max)` bracket forms (mixed openness
    /// allowed) as well as a bare version (exact match).
    fn from_str(s: &str) -> Res<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(VersionConstraint::any());
        }

        let first = s.chars().next().unwrap();
        if first == '^' {
            // Caret constraint: `^X` means "at least X, but less than the
            // next upstream major version" (spec S2's `satisfies(^1.0.0,
            // ^1.0.0)` example), a shorthand the resolver's dependency
            // grammar accepts alongside the full bracket form.
            let min = Version::from_str(&s[1..])?;
            let mut major = min
                .upstream
                .split('.')
                .next()
                .unwrap_or("0")
                .parse::<u64>()
                .unwrap_or(0);
            major += 1;
            let max = Version::new(min.epoch, major.to_string(), None, None, None);
            return Ok(VersionConstraint::range(Some(min), false, Some(max), true));
        }
        if first == '[' || first == '(' {
            let min_open = first == '(';
            let last = s.chars().last().unwrap();
            if last != ']' && last != ')' {
                return Err(ErrorKind::InvalidConstraint(s.to_string()).into());
            }
            let max_open = last == ')';
            let inner = &s[1..s.len() - 1];
            let mut parts = inner.splitn(2, ' ');
            let min_s = parts.next().unwrap_or("").trim();
            let max_s = parts.next().unwrap_or("").trim();

            let min_version = if min_s.is_empty() {
                None
            } else {
                Some(Version::from_str(min_s)?)
            };
            let max_version = if max_s.is_empty() {
                None
            } else {
                Some(Version::from_str(max_s)?)
            };

            Ok(VersionConstraint::range(min_version, min_open, max_version, max_open))
        } else {
            Ok(VersionConstraint::exact(Version::from_str(s)?))
        }
    }
}

/// Satisfaction: does `v` satisfy `c`? Ported from `satisfaction.cxx`.
pub fn satisfies_version(v: &Version, c: &VersionConstraint) -> bool {
    if v.is_wildcard() {
        return true;
    }

    let ev = Version::new(v.epoch, v.upstream.clone(), v.release.clone(), Some(v.effective_revision()), v.iteration);

    let mut s = true;
    if let Some(min) = &c.min_version {
        let i = ev.compare(min, min.revision.is_none(), true);
        s = if c.min_open { i == Ordering::Greater } else { i != Ordering::Less };
    }

    if s {
        if let Some(max) = &c.max_version {
            let i = ev.compare(max, max.revision.is_none(), true);
            s = if c.max_open { i == Ordering::Less } else { i != Ordering::Greater };
        }
    }

    s
}

/// Does every version satisfying `l` also satisfy `r`?
pub fn satisfies_constraint(l: &VersionConstraint, r: &VersionConstraint) -> bool {
    l.stricter_than(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering_ignores_iteration_by_default() {
        let a = Version::from_str("1.0+1").unwrap();
        let b = Version::from_str("1.0+1#5").unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn version_roundtrip() {
        let v = Version::from_str("1:2.3.4-beta+5#6").unwrap();
        assert_eq!(v.to_string(), "1:2.3.4-beta+5#6");
    }

    #[test]
    fn s1_version_satisfaction() {
        let c = VersionConstraint::from_str("[1.0 2.0]").unwrap();
        for s in &["1.0", "1.0+1", "2.0", "2.0+0"] {
            let v = Version::from_str(s).unwrap();
            assert!(satisfies_version(&v, &c), "{} should satisfy {}", s, c);
        }
        let v = Version::from_str("0.9").unwrap();
        assert!(!satisfies_version(&v, &c));
    }

    #[test]
    fn s2_constraint_over_constraint() {
        let a = VersionConstraint::from_str("[1.0+0 2.0]").unwrap();
        let b = VersionConstraint::from_str("[1.0 2.0]").unwrap();
        assert!(satisfies_constraint(&a, &b));
        assert!(satisfies_constraint(&b, &a));

        let caret = VersionConstraint::from_str("^1.0.0").unwrap();
        assert!(satisfies_constraint(&caret, &caret));
    }

    #[test]
    fn wildcard_satisfies_anything() {
        let c = VersionConstraint::from_str("[1.0 2.0]").unwrap();
        assert!(satisfies_version(&Version::wildcard(), &c));
    }

    #[test]
    fn invariant_3_satisfies_holds_for_all_versions_in_sample() {
        let c = VersionConstraint::from_str("[1.0 2.0]").unwrap();
        let inside = ["1.0", "1.5", "2.0"];
        let outside = ["0.1", "0.9", "3.0"];
        for s in inside.iter() {
            assert!(satisfies_version(&Version::from_str(s).unwrap(), &c));
        }
        for s in outside.iter() {
            assert!(!satisfies_version(&Version::from_str(s).unwrap(), &c));
        }
    }
}
