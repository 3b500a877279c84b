// Copyright 2025 Querytrace Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The closed set of pipeline extension points.
//!
//! Each `HookPoint` names one phase boundary of the query pipeline. The set is
//! fixed at compile time; adding a point is a new release of this crate, not a
//! runtime call. The `…Deferred` variants share their context shape with the
//! eager sibling but complete through a deferred value rather than a direct
//! return, so callers know which completion model to attach follow-up logic to.

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named extension point corresponding to one phase of pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    /// Tokenizing the incoming source text.
    Lex,
    /// Parsing tokens into a document.
    Parse,
    /// Validating a parsed unit against the schema.
    Validate,
    /// Static analysis over a whole batch.
    AnalyzeBatch,
    /// Static analysis over a single unit.
    AnalyzeUnit,
    /// Executing a whole batch.
    ExecuteBatch,
    /// Executing a single unit.
    ExecuteUnit,
    /// Draining a unit's deferred values after eager execution.
    ExecuteUnitDeferred,
    /// Resolving one field.
    ResolveField,
    /// Settling a field whose resolver returned a deferred value.
    ResolveFieldDeferred,
    /// Authorization check for an object against a type.
    Authorize,
    /// Deferred variant of the authorization check.
    AuthorizeDeferred,
    /// Resolving the concrete type of an abstract-typed value.
    ResolveType,
    /// Deferred variant of type resolution.
    ResolveTypeDeferred,
}

impl HookPoint {
    /// Every hook point, in declaration (pipeline) order. Chain tables are
    /// indexed in this order so composition is deterministic.
    pub const ALL: [HookPoint; 14] = [
        HookPoint::Lex,
        HookPoint::Parse,
        HookPoint::Validate,
        HookPoint::AnalyzeBatch,
        HookPoint::AnalyzeUnit,
        HookPoint::ExecuteBatch,
        HookPoint::ExecuteUnit,
        HookPoint::ExecuteUnitDeferred,
        HookPoint::ResolveField,
        HookPoint::ResolveFieldDeferred,
        HookPoint::Authorize,
        HookPoint::AuthorizeDeferred,
        HookPoint::ResolveType,
        HookPoint::ResolveTypeDeferred,
    ];

    /// Number of hook points.
    pub const COUNT: usize = Self::ALL.len();

    /// The wire name of this hook point, as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            HookPoint::Lex => "lex",
            HookPoint::Parse => "parse",
            HookPoint::Validate => "validate",
            HookPoint::AnalyzeBatch => "analyzeBatch",
            HookPoint::AnalyzeUnit => "analyzeUnit",
            HookPoint::ExecuteBatch => "executeBatch",
            HookPoint::ExecuteUnit => "executeUnit",
            HookPoint::ExecuteUnitDeferred => "executeUnitDeferred",
            HookPoint::ResolveField => "resolveField",
            HookPoint::ResolveFieldDeferred => "resolveFieldDeferred",
            HookPoint::Authorize => "authorize",
            HookPoint::AuthorizeDeferred => "authorizeDeferred",
            HookPoint::ResolveType => "resolveType",
            HookPoint::ResolveTypeDeferred => "resolveTypeDeferred",
        }
    }

    /// Look up a hook point by wire name.
    pub fn from_name(name: &str) -> Result<Self, BuildError> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| BuildError::UnknownHookPoint(name.to_string()))
    }

    /// Whether this point completes through a deferred value.
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            HookPoint::ExecuteUnitDeferred
                | HookPoint::ResolveFieldDeferred
                | HookPoint::AuthorizeDeferred
                | HookPoint::ResolveTypeDeferred
        )
    }

    /// Stable index into per-hook chain tables.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of hook points, used by trace modules to declare which phase
/// boundaries they instrument. Modules are skipped entirely (no chain layer,
/// not a no-op layer) at points outside their set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HookSet(u16);

impl HookSet {
    /// The empty set.
    pub const fn empty() -> Self {
        HookSet(0)
    }

    /// The set of all hook points.
    pub const fn all() -> Self {
        HookSet((1u16 << HookPoint::COUNT) - 1)
    }

    /// Build a set from a slice of points.
    pub fn of(points: &[HookPoint]) -> Self {
        points.iter().fold(Self::empty(), |set, p| set.with(*p))
    }

    /// Return this set with `point` added.
    pub const fn with(self, point: HookPoint) -> Self {
        HookSet(self.0 | 1 << point as usize)
    }

    /// Add a point in place.
    pub fn insert(&mut self, point: HookPoint) {
        self.0 |= 1 << point.index();
    }

    /// Membership test.
    pub const fn contains(self, point: HookPoint) -> bool {
        self.0 & (1 << point as usize) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = HookPoint> {
        HookPoint::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for point in HookPoint::ALL {
            assert_eq!(HookPoint::from_name(point.name()).unwrap(), point);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = HookPoint::from_name("executeEverything").unwrap_err();
        assert!(matches!(err, BuildError::UnknownHookPoint(name) if name == "executeEverything"));
    }

    #[test]
    fn test_deferred_points() {
        let deferred: Vec<_> = HookPoint::ALL.into_iter().filter(|p| p.is_deferred()).collect();
        assert_eq!(
            deferred,
            vec![
                HookPoint::ExecuteUnitDeferred,
                HookPoint::ResolveFieldDeferred,
                HookPoint::AuthorizeDeferred,
                HookPoint::ResolveTypeDeferred,
            ]
        );
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, point) in HookPoint::ALL.into_iter().enumerate() {
            assert_eq!(point.index(), i);
        }
    }

    #[test]
    fn test_hook_set() {
        let mut set = HookSet::of(&[HookPoint::Parse, HookPoint::ResolveField]);
        assert!(set.contains(HookPoint::Parse));
        assert!(!set.contains(HookPoint::Lex));

        set.insert(HookPoint::Lex);
        assert!(set.contains(HookPoint::Lex));

        assert_eq!(set.iter().count(), 3);
        assert!(HookSet::empty().is_empty());
        assert_eq!(HookSet::all().iter().count(), HookPoint::COUNT);
    }
}
