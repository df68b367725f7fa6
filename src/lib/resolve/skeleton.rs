//! The plugin-style package skeleton (spec §4.6 "Input", Design Notes
//! §9): a sandboxed build-system evaluator the resolver drives to
//! reload defaults, evaluate `enable`/`reflect`/`prefer+accept`/
//! `require` clauses, without the resolver ever knowing how those
//! clauses are actually interpreted by the build system.

use std::collections::HashMap;

use crate::package::configure::ConfigSource;
use crate::types::Name;
use crate::util::errors::Res;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Str(String),
    Int(i64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigVariable {
    pub value: ConfigValue,
    pub source: ConfigSource,
    /// The dependent that set this value via a buildfile clause, when
    /// `source == Buildfile` (spec §4.6).
    pub origin: Option<Name>,
}

/// A package's current `config_variable_value`s (spec §4.6).
pub type PackageConfiguration = HashMap<String, ConfigVariable>;

/// A sandboxed build-system evaluator for one selected package.
/// Production code backs this with the build-system driver; tests use
/// an in-memory fake (see `resolve::mod` tests).
pub trait PackageSkeleton {
    fn reload_defaults(&self) -> Res<PackageConfiguration>;
    fn evaluate_enable(&self, expr: &str, config: &PackageConfiguration) -> Res<bool>;
    fn evaluate_reflect(&self, expr: &str, config: &PackageConfiguration) -> Res<PackageConfiguration>;
    /// Proposes variable bindings for the joint configuration of a
    /// dependent and a set of dependency configurations, then decides
    /// whether the result is acceptable.
    fn evaluate_prefer_accept(
        &self,
        prefer: &str,
        accept: &str,
        joint: &mut HashMap<Name, PackageConfiguration>,
    ) -> Res<bool>;
    /// Asserts conditions on dependency configuration variables,
    /// mutating `joint` to record the asserted values. `lax` permits
    /// only boolean-true assignments (spec §4.6 step 4a: system package
    /// with a `require` clause).
    fn evaluate_require(&self, expr: &str, joint: &mut HashMap<Name, PackageConfiguration>, lax: bool) -> Res<()>;
}
