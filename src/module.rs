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

//! The observer-module interface.
//!
//! A `TraceModule` implements behavior for one or more hook points. Every
//! method's default body is the terminal no-op contract: run the continuation
//! once and return its result unchanged. An override may run code before the
//! continuation, after it (for deferred points, after the deferred value
//! settles), substitute the result, or decline to run the continuation at all
//! to short-circuit the phase.
//!
//! The continuation is consumed by value, so invoking it twice does not
//! compile; the wrapped phase body can never be re-run by a misbehaving
//! module.
//!
//! One module instance may serve many concurrent trace instances. Keep any
//! mutable state either behind the module's own synchronization or in the
//! per-instance [`TraceContext`] scratch map.

use crate::chain::{DeferredNext, SyncNext};
use crate::error::PhaseResult;
use crate::hook::HookSet;
use crate::payload::{
    BatchPayload, FieldPayload, SourcePayload, TraceContext, TypeCheckPayload, UnitBatchPayload,
    UnitPayload, ValidatePayload,
};
use async_trait::async_trait;

/// A unit of observer behavior attached around pipeline phases.
#[async_trait]
pub trait TraceModule: Send + Sync {
    /// Name identifying this module in logs, config, and build errors.
    fn name(&self) -> &str;

    /// The hook points this module instruments. The chain builder contributes
    /// no layer for this module anywhere else. Defaults to every point, which
    /// is always safe because the default method bodies pass straight through.
    fn hooks(&self) -> HookSet {
        HookSet::all()
    }

    fn lex(
        &self,
        ctx: &TraceContext,
        payload: &SourcePayload,
        next: SyncNext<'_, SourcePayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    fn parse(
        &self,
        ctx: &TraceContext,
        payload: &SourcePayload,
        next: SyncNext<'_, SourcePayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    fn validate(
        &self,
        ctx: &TraceContext,
        payload: &ValidatePayload,
        next: SyncNext<'_, ValidatePayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    fn analyze_batch(
        &self,
        ctx: &TraceContext,
        payload: &BatchPayload,
        next: SyncNext<'_, BatchPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    fn analyze_unit(
        &self,
        ctx: &TraceContext,
        payload: &UnitPayload,
        next: SyncNext<'_, UnitPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    fn execute_batch(
        &self,
        ctx: &TraceContext,
        payload: &BatchPayload,
        next: SyncNext<'_, BatchPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    fn execute_unit(
        &self,
        ctx: &TraceContext,
        payload: &UnitPayload,
        next: SyncNext<'_, UnitPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    async fn execute_unit_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a UnitBatchPayload,
        next: DeferredNext<'a, UnitBatchPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload).await
    }

    fn resolve_field(
        &self,
        ctx: &TraceContext,
        payload: &FieldPayload,
        next: SyncNext<'_, FieldPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    async fn resolve_field_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a FieldPayload,
        next: DeferredNext<'a, FieldPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload).await
    }

    fn authorize(
        &self,
        ctx: &TraceContext,
        payload: &TypeCheckPayload,
        next: SyncNext<'_, TypeCheckPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    async fn authorize_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: DeferredNext<'a, TypeCheckPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload).await
    }

    fn resolve_type(
        &self,
        ctx: &TraceContext,
        payload: &TypeCheckPayload,
        next: SyncNext<'_, TypeCheckPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload)
    }

    async fn resolve_type_deferred<'a>(
        &self,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: DeferredNext<'a, TypeCheckPayload>,
    ) -> PhaseResult {
        next.run(ctx, payload).await
    }
}
