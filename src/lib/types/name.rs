//! Package name grammar (spec §3, C1).

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;

use crate::util::errors::{ErrorKind, Res};

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+' || c == '.'
}

/// The name of a package: letters, digits, `-`, `_`, `+`, `.`; compared
/// case-insensitively. Stored behind an `Rc` so cloning a name (which
/// happens constantly while walking the dependency graph) is cheap.
#[derive(Clone, Debug)]
pub struct Name {
    inner: Rc<NameInner>,
}

#[derive(Debug)]
struct NameInner {
    raw: String,
    lower: String,
}

impl Name {
    pub fn new(raw: String) -> Res<Self> {
        if raw.is_empty() || !raw.chars().all(is_name_char) {
            return Err(ErrorKind::InvalidPackageName(raw).into());
        }
        let first = raw.chars().next().unwrap();
        if first == '-' || first == '.' || first == '+' {
            return Err(ErrorKind::InvalidPackageName(raw).into());
        }
        let lower = raw.to_lowercase();
        Ok(Name {
            inner: Rc::new(NameInner { raw, lower }),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.inner.raw
    }

    /// `true` iff this name matches the `libbuild2-*` prefix used to
    /// route build-time dependencies into the `build2`-typed
    /// configuration rather than `host` (spec §4.1/§4.6).
    pub fn is_build2_module(&self) -> bool {
        self.inner.lower.starts_with("libbuild2-")
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Name) -> bool {
        self.inner.lower == other.inner.lower
    }
}
impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.lower.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Name) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Name {
    fn cmp(&self, other: &Name) -> Ordering {
        self.inner.lower.cmp(&other.inner.lower)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner.raw)
    }
}

impl FromStr for Name {
    type Err = failure::Error;

    fn from_str(s: &str) -> Res<Self> {
        Name::new(s.to_string())
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::new(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_equality() {
        let a = Name::from_str("Foo-Bar").unwrap();
        let b = Name::from_str("foo-bar").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_and_bad_leading_char() {
        assert!(Name::from_str("").is_err());
        assert!(Name::from_str("-foo").is_err());
        assert!(Name::from_str("foo bar").is_err());
    }

    #[test]
    fn build2_module_prefix() {
        let n = Name::from_str("libbuild2-kconfig").unwrap();
        assert!(n.is_build2_module());
        let n = Name::from_str("libfoo").unwrap();
        assert!(!n.is_build2_module());
    }
}
