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

//! Wall-clock timing per hook point.

use crate::chain::{DeferredNext, SyncNext};
use crate::error::PhaseResult;
use crate::hook::HookPoint;
use crate::module::TraceModule;
use crate::payload::{
    BatchPayload, FieldPayload, SourcePayload, TraceContext, TypeCheckPayload, UnitBatchPayload,
    UnitPayload, ValidatePayload,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulated timing for one hook point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Number of chain invocations observed.
    pub invocations: u64,
    /// Total wall-clock time spent inside the point, including inner layers
    /// and the phase body. For deferred points this is time to settlement.
    pub total: Duration,
}

/// Accumulates per-hook durations across every point.
///
/// A process-lifetime singleton is fine: the counters are behind a mutex and
/// shared by all trace instances registered with the same `TimingTrace`.
/// Failed phases are counted too; the failure keeps propagating outward.
pub struct TimingTrace {
    name: String,
    stats: Mutex<HashMap<HookPoint, PhaseStats>>,
}

impl Default for TimingTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingTrace {
    pub fn new() -> Self {
        Self {
            name: "timing".to_string(),
            stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: Mutex::new(HashMap::new()),
        }
    }

    fn record(&self, hook: HookPoint, elapsed: Duration) {
        let mut stats = self.stats.lock();
        let entry = stats.entry(hook).or_default();
        entry.invocations += 1;
        entry.total += elapsed;
    }

    fn timed(&self, hook: HookPoint, run: impl FnOnce() -> PhaseResult) -> PhaseResult {
        let started = Instant::now();
        let result = run();
        self.record(hook, started.elapsed());
        result
    }

    /// Stats for one hook point, if it has been hit.
    pub fn stats_for(&self, hook: HookPoint) -> Option<PhaseStats> {
        self.stats.lock().get(&hook).copied()
    }

    /// A copy of all accumulated stats.
    pub fn snapshot(&self) -> HashMap<HookPoint, PhaseStats> {
        self.stats.lock().clone()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.stats.lock().clear();
    }
}

#[async_trait]
impl TraceModule for TimingTrace {
    fn name(&self) -> &str {
        &self.name
    }

    fn lex(
        &self,
        ctx: &TraceContext,
        payload: &SourcePayload,
        next: SyncNext<'_, SourcePayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::Lex, || next.run(ctx, payload))
    }

    fn parse(
        &self,
        ctx: &TraceContext,
        payload: &SourcePayload,
        next: SyncNext<'_, SourcePayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::Parse, || next.run(ctx, payload))
    }

    fn validate(
        &self,
        ctx: &TraceContext,
        payload: &ValidatePayload,
        next: SyncNext<'_, ValidatePayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::Validate, || next.run(ctx, payload))
    }

    fn analyze_batch(
        &self,
        ctx: &TraceContext,
        payload: &BatchPayload,
        next: SyncNext<'_, BatchPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::AnalyzeBatch, || next.run(ctx, payload))
    }

    fn analyze_unit(
        &self,
        ctx: &TraceContext,
        payload: &UnitPayload,
        next: SyncNext<'_, UnitPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::AnalyzeUnit, || next.run(ctx, payload))
    }

    fn execute_batch(
        &self,
        ctx: &TraceContext,
        payload: &BatchPayload,
        next: SyncNext<'_, BatchPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::ExecuteBatch, || next.run(ctx, payload))
    }

    fn execute_unit(
        &self,
        ctx: &TraceContext,
        payload: &UnitPayload,
        next: SyncNext<'_, UnitPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::ExecuteUnit, || next.run(ctx, payload))
    }

    async fn execute_unit_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a UnitBatchPayload,
        next: DeferredNext<'a, UnitBatchPayload>,
    ) -> PhaseResult {
        let started = Instant::now();
        let result = next.run(ctx, payload).await;
        self.record(HookPoint::ExecuteUnitDeferred, started.elapsed());
        result
    }

    fn resolve_field(
        &self,
        ctx: &TraceContext,
        payload: &FieldPayload,
        next: SyncNext<'_, FieldPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::ResolveField, || next.run(ctx, payload))
    }

    async fn resolve_field_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a FieldPayload,
        next: DeferredNext<'a, FieldPayload>,
    ) -> PhaseResult {
        let started = Instant::now();
        let result = next.run(ctx, payload).await;
        self.record(HookPoint::ResolveFieldDeferred, started.elapsed());
        result
    }

    fn authorize(
        &self,
        ctx: &TraceContext,
        payload: &TypeCheckPayload,
        next: SyncNext<'_, TypeCheckPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::Authorize, || next.run(ctx, payload))
    }

    async fn authorize_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: DeferredNext<'a, TypeCheckPayload>,
    ) -> PhaseResult {
        let started = Instant::now();
        let result = next.run(ctx, payload).await;
        self.record(HookPoint::AuthorizeDeferred, started.elapsed());
        result
    }

    fn resolve_type(
        &self,
        ctx: &TraceContext,
        payload: &TypeCheckPayload,
        next: SyncNext<'_, TypeCheckPayload>,
    ) -> PhaseResult {
        self.timed(HookPoint::ResolveType, || next.run(ctx, payload))
    }

    async fn resolve_type_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: DeferredNext<'a, TypeCheckPayload>,
    ) -> PhaseResult {
        let started = Instant::now();
        let result = next.run(ctx, payload).await;
        self.record(HookPoint::ResolveTypeDeferred, started.elapsed());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::TraceFactory;
    use crate::error::PhaseError;
    use crate::payload::{FieldRef, UnitInfo};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_counts_each_invocation_once() {
        let timing = Arc::new(TimingTrace::new());
        let mut factory = TraceFactory::new();
        factory.register(timing.clone()).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a b }"));

        let payload = FieldPayload::new(FieldRef::new("Query", "a"));
        trace.resolve_field(&payload, || Ok(json!(1))).unwrap();
        trace.resolve_field(&payload, || Ok(json!(2))).unwrap();

        let stats = timing.stats_for(HookPoint::ResolveField).unwrap();
        assert_eq!(stats.invocations, 2);
        assert!(timing.stats_for(HookPoint::Parse).is_none());
    }

    #[test]
    fn test_counts_failed_phases() {
        let timing = Arc::new(TimingTrace::new());
        let mut factory = TraceFactory::new();
        factory.register(timing.clone()).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a }"));

        let payload = SourcePayload {
            source: "{ a".into(),
        };
        let err = trace
            .parse(&payload, || Err(PhaseError::pipeline("unexpected EOF")))
            .unwrap_err();
        assert_eq!(err, PhaseError::pipeline("unexpected EOF"));
        assert_eq!(timing.stats_for(HookPoint::Parse).unwrap().invocations, 1);
    }

    #[tokio::test]
    async fn test_deferred_time_includes_settlement() {
        let timing = Arc::new(TimingTrace::new());
        let mut factory = TraceFactory::new();
        factory.register(timing.clone()).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a }"));

        let payload = FieldPayload::new(FieldRef::new("Query", "a"));
        trace
            .resolve_field_deferred(&payload, || {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(json!("late"))
                })
            })
            .await
            .unwrap();

        let stats = timing.stats_for(HookPoint::ResolveFieldDeferred).unwrap();
        assert_eq!(stats.invocations, 1);
        assert!(stats.total >= Duration::from_millis(10));
    }

    #[test]
    fn test_reset() {
        let timing = TimingTrace::new();
        timing.record(HookPoint::Lex, Duration::from_micros(5));
        assert_eq!(timing.snapshot().len(), 1);
        timing.reset();
        assert!(timing.snapshot().is_empty());
    }
}
