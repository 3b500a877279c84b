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

//! Phase context values and trace-instance state.
//!
//! The engine supplies one payload per phase boundary. Payloads carry enough
//! identity to correlate the event (which field, which unit, which batch);
//! the engine's own richer objects stay on its side of the boundary, with
//! opaque values crossing as `serde_json::Value`.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity of one batch of units executed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInfo {
    /// Correlation id for this batch.
    pub id: Uuid,
    /// Number of units in the batch.
    pub unit_count: usize,
}

impl BatchInfo {
    pub fn new(unit_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            unit_count,
        }
    }
}

/// Identity of one unit (a single query) within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Correlation id for this unit.
    pub id: Uuid,
    /// Operation name, when the source declares one.
    pub operation_name: Option<String>,
    /// The source text being processed.
    pub source: String,
}

impl UnitInfo {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation_name: None,
            source: source.into(),
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// Request-scoped state owned by one trace instance.
///
/// Holds the execution context the instance was built for and a scratch map
/// where modules keep instance-scoped mutable state (for example a start
/// timestamp stashed in a "before" handler and read back in "after"). The
/// context lives exactly as long as its execution context; modules must not
/// assume state survives into the next request.
pub struct TraceContext {
    /// The batch being executed, when tracing a batch.
    pub batch: Option<BatchInfo>,
    /// The single unit currently executing, when known.
    pub unit: Option<UnitInfo>,
    state: DashMap<String, Value>,
}

impl TraceContext {
    pub fn new(batch: Option<BatchInfo>, unit: Option<UnitInfo>) -> Self {
        Self {
            batch,
            unit,
            state: DashMap::new(),
        }
    }

    pub fn for_batch(batch: BatchInfo) -> Self {
        Self::new(Some(batch), None)
    }

    pub fn for_unit(unit: UnitInfo) -> Self {
        Self::new(None, Some(unit))
    }

    /// Stash a module-scoped value on this instance.
    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// Read a stashed value.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.state.get(key).map(|v| v.clone())
    }

    /// Remove and return a stashed value.
    pub fn take_state(&self, key: &str) -> Option<Value> {
        self.state.remove(key).map(|(_, v)| v)
    }
}

/// Context for `lex` and `parse`: the raw source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePayload {
    pub source: String,
}

/// Context for `validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePayload {
    pub unit: UnitInfo,
    /// Whether validation is actually being performed for this unit.
    pub validate: bool,
}

/// Context for the batch-scoped phases (`analyzeBatch`, `executeBatch`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPayload {
    pub batch: BatchInfo,
}

/// Context for the unit-scoped phases (`analyzeUnit`, `executeUnit`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPayload {
    pub unit: UnitInfo,
}

/// Context for `executeUnitDeferred`, which drains a unit's deferred values
/// within its enclosing batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitBatchPayload {
    pub unit: UnitInfo,
    pub batch: BatchInfo,
}

/// Identity of a field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Name of the type the field is defined on.
    pub parent_type: String,
    /// Field name.
    pub field_name: String,
}

impl FieldRef {
    pub fn new(parent_type: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            parent_type: parent_type.into(),
            field_name: field_name.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.parent_type, self.field_name)
    }
}

/// Context for `resolveField` and `resolveFieldDeferred`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPayload {
    /// The field definition being resolved.
    pub field: FieldRef,
    /// Source location of the node selecting this field, when available.
    pub ast_node: Option<String>,
    /// Arguments resolved for this selection.
    pub arguments: Value,
    /// The object the field is being resolved against.
    pub object: Value,
}

impl FieldPayload {
    pub fn new(field: FieldRef) -> Self {
        Self {
            field,
            ast_node: None,
            arguments: Value::Null,
            object: Value::Null,
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_object(mut self, object: Value) -> Self {
        self.object = object;
        self
    }
}

/// Context for the `authorize` and `resolveType` families: a type checked
/// against a runtime object, within a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCheckPayload {
    pub unit: UnitInfo,
    pub type_name: String,
    pub object: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_state_scoping() {
        let ctx = TraceContext::for_batch(BatchInfo::new(2));
        assert!(ctx.state("timing.start").is_none());

        ctx.set_state("timing.start", json!(123));
        assert_eq!(ctx.state("timing.start"), Some(json!(123)));

        assert_eq!(ctx.take_state("timing.start"), Some(json!(123)));
        assert!(ctx.state("timing.start").is_none());
    }

    #[test]
    fn test_field_ref_display() {
        let field = FieldRef::new("User", "avatarUrl");
        assert_eq!(field.to_string(), "User.avatarUrl");
    }

    #[test]
    fn test_unit_ids_are_unique() {
        let a = UnitInfo::new("{ viewer { id } }");
        let b = UnitInfo::new("{ viewer { id } }");
        assert_ne!(a.id, b.id);
    }
}
