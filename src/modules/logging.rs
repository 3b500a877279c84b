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

//! Structured logging around phase boundaries.

use crate::chain::{DeferredNext, SyncNext};
use crate::error::PhaseResult;
use crate::hook::{HookPoint, HookSet};
use crate::module::TraceModule;
use crate::payload::{
    BatchPayload, FieldPayload, SourcePayload, TraceContext, UnitBatchPayload, UnitPayload,
    ValidatePayload,
};
use async_trait::async_trait;
use std::time::Instant;

/// Emits a `tracing` debug event at the start and end of each phase it is
/// attached to, with the phase identity and elapsed time as structured
/// fields. Field-level points are noisy; narrow this module via its hook set
/// or [`TraceConfig`](crate::config::TraceConfig) on busy schemas.
pub struct LoggingTrace {
    name: String,
}

impl Default for LoggingTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingTrace {
    pub fn new() -> Self {
        Self {
            name: "logging".to_string(),
        }
    }

    /// Use a non-default module name, e.g. to register two differently
    /// configured instances.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn finish(&self, hook: HookPoint, started: Instant, result: &PhaseResult) {
        tracing::debug!(
            module = %self.name,
            hook = %hook,
            elapsed_us = started.elapsed().as_micros() as u64,
            ok = result.is_ok(),
            "phase finished"
        );
    }
}

#[async_trait]
impl TraceModule for LoggingTrace {
    fn name(&self) -> &str {
        &self.name
    }

    fn hooks(&self) -> HookSet {
        HookSet::of(&[
            HookPoint::Parse,
            HookPoint::Validate,
            HookPoint::ExecuteBatch,
            HookPoint::ExecuteUnit,
            HookPoint::ExecuteUnitDeferred,
            HookPoint::ResolveField,
            HookPoint::ResolveFieldDeferred,
        ])
    }

    fn parse(
        &self,
        ctx: &TraceContext,
        payload: &SourcePayload,
        next: SyncNext<'_, SourcePayload>,
    ) -> PhaseResult {
        tracing::debug!(module = %self.name, hook = %HookPoint::Parse, bytes = payload.source.len(), "phase started");
        let started = Instant::now();
        let result = next.run(ctx, payload);
        self.finish(HookPoint::Parse, started, &result);
        result
    }

    fn validate(
        &self,
        ctx: &TraceContext,
        payload: &ValidatePayload,
        next: SyncNext<'_, ValidatePayload>,
    ) -> PhaseResult {
        tracing::debug!(
            module = %self.name,
            hook = %HookPoint::Validate,
            unit = %payload.unit.id,
            validate = payload.validate,
            "phase started"
        );
        let started = Instant::now();
        let result = next.run(ctx, payload);
        self.finish(HookPoint::Validate, started, &result);
        result
    }

    fn execute_batch(
        &self,
        ctx: &TraceContext,
        payload: &BatchPayload,
        next: SyncNext<'_, BatchPayload>,
    ) -> PhaseResult {
        tracing::debug!(
            module = %self.name,
            hook = %HookPoint::ExecuteBatch,
            batch = %payload.batch.id,
            units = payload.batch.unit_count,
            "phase started"
        );
        let started = Instant::now();
        let result = next.run(ctx, payload);
        self.finish(HookPoint::ExecuteBatch, started, &result);
        result
    }

    fn execute_unit(
        &self,
        ctx: &TraceContext,
        payload: &UnitPayload,
        next: SyncNext<'_, UnitPayload>,
    ) -> PhaseResult {
        tracing::debug!(
            module = %self.name,
            hook = %HookPoint::ExecuteUnit,
            unit = %payload.unit.id,
            operation = payload.unit.operation_name.as_deref().unwrap_or(""),
            "phase started"
        );
        let started = Instant::now();
        let result = next.run(ctx, payload);
        self.finish(HookPoint::ExecuteUnit, started, &result);
        result
    }

    async fn execute_unit_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a UnitBatchPayload,
        next: DeferredNext<'a, UnitBatchPayload>,
    ) -> PhaseResult {
        tracing::debug!(
            module = %self.name,
            hook = %HookPoint::ExecuteUnitDeferred,
            unit = %payload.unit.id,
            batch = %payload.batch.id,
            "phase started"
        );
        let started = Instant::now();
        let result = next.run(ctx, payload).await;
        self.finish(HookPoint::ExecuteUnitDeferred, started, &result);
        result
    }

    fn resolve_field(
        &self,
        ctx: &TraceContext,
        payload: &FieldPayload,
        next: SyncNext<'_, FieldPayload>,
    ) -> PhaseResult {
        tracing::debug!(
            module = %self.name,
            hook = %HookPoint::ResolveField,
            field = %payload.field,
            "phase started"
        );
        let started = Instant::now();
        let result = next.run(ctx, payload);
        self.finish(HookPoint::ResolveField, started, &result);
        result
    }

    async fn resolve_field_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a FieldPayload,
        next: DeferredNext<'a, FieldPayload>,
    ) -> PhaseResult {
        tracing::debug!(
            module = %self.name,
            hook = %HookPoint::ResolveFieldDeferred,
            field = %payload.field,
            "phase started"
        );
        let started = Instant::now();
        let result = next.run(ctx, payload).await;
        self.finish(HookPoint::ResolveFieldDeferred, started, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::TraceFactory;
    use crate::payload::{FieldRef, UnitInfo};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_logging_passes_result_through() {
        let mut factory = TraceFactory::new();
        factory.register(Arc::new(LoggingTrace::new())).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a }"));

        let payload = FieldPayload::new(FieldRef::new("Query", "a"));
        let result = trace.resolve_field(&payload, || Ok(json!(7)));
        assert_eq!(result.unwrap(), json!(7));
    }

    #[test]
    fn test_logging_declares_a_narrow_hook_set() {
        let module = LoggingTrace::new();
        assert!(module.hooks().contains(HookPoint::ResolveField));
        assert!(!module.hooks().contains(HookPoint::Lex));
        assert!(!module.hooks().contains(HookPoint::Authorize));
    }

    #[tokio::test]
    async fn test_logging_on_deferred_point() {
        let mut factory = TraceFactory::new();
        factory.register(Arc::new(LoggingTrace::named("log2"))).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a }"));

        let payload = FieldPayload::new(FieldRef::new("Query", "a"));
        let result = trace
            .resolve_field_deferred(&payload, || Box::pin(async { Ok(json!("deferred")) }))
            .await;
        assert_eq!(result.unwrap(), json!("deferred"));
    }
}
