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

//! The per-execution-context trace instance.
//!
//! The engine holds one [`Trace`] per batch (or per unit) and, at every phase
//! boundary, calls the method for that hook point with the phase context and
//! a thunk for the real work. Each call runs exactly one full composed chain;
//! there are no retries and no memoization. Dispatch is an indexed table
//! lookup, and a point with no registered modules goes straight to the thunk.
//!
//! Nested phases (field resolution inside unit execution) re-enter the same
//! instance; no lock is held across a chain invocation.

use crate::chain::{
    ChainTable, DeferredBody, DeferredDispatchFn, DeferredNext, DeferredPhaseBody, PhaseBody,
    SyncDispatchFn, SyncNext,
};
use crate::error::PhaseResult;
use crate::hook::HookPoint;
use crate::payload::{
    BatchPayload, FieldPayload, SourcePayload, TraceContext, TypeCheckPayload, UnitBatchPayload,
    UnitPayload, ValidatePayload,
};

/// Runtime object bound to one execution context: the composed handler
/// chains plus the request-scoped [`TraceContext`].
pub struct Trace {
    chains: ChainTable,
    ctx: TraceContext,
}

impl Trace {
    pub(crate) fn new(chains: ChainTable, ctx: TraceContext) -> Self {
        Self { chains, ctx }
    }

    /// The request-scoped state modules may read and write.
    pub fn context(&self) -> &TraceContext {
        &self.ctx
    }

    /// Number of module layers composed at a hook point.
    pub fn chain_len(&self, hook: HookPoint) -> usize {
        self.chains.get(hook).len()
    }

    fn run_sync<'a, P>(
        &'a self,
        hook: HookPoint,
        payload: &P,
        dispatch: SyncDispatchFn<P>,
        terminal: PhaseBody<'a>,
    ) -> PhaseResult {
        let chain = self.chains.get(hook);
        if !chain.is_empty() {
            tracing::trace!(hook = %hook, layers = chain.len(), "dispatching phase chain");
        }
        SyncNext {
            chain,
            dispatch,
            terminal,
        }
        .run(&self.ctx, payload)
    }

    async fn run_deferred<'a, P: Sync>(
        &'a self,
        hook: HookPoint,
        payload: &'a P,
        dispatch: DeferredDispatchFn<P>,
        terminal: DeferredPhaseBody<'a>,
    ) -> PhaseResult {
        let chain = self.chains.get(hook);
        if !chain.is_empty() {
            tracing::trace!(hook = %hook, layers = chain.len(), "dispatching deferred phase chain");
        }
        DeferredNext {
            chain,
            dispatch,
            terminal,
        }
        .run(&self.ctx, payload)
        .await
    }

    pub fn lex<'a, F>(&'a self, payload: &SourcePayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(HookPoint::Lex, payload, dispatch::lex, Box::new(body))
    }

    pub fn parse<'a, F>(&'a self, payload: &SourcePayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(HookPoint::Parse, payload, dispatch::parse, Box::new(body))
    }

    pub fn validate<'a, F>(&'a self, payload: &ValidatePayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::Validate,
            payload,
            dispatch::validate,
            Box::new(body),
        )
    }

    pub fn analyze_batch<'a, F>(&'a self, payload: &BatchPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::AnalyzeBatch,
            payload,
            dispatch::analyze_batch,
            Box::new(body),
        )
    }

    pub fn analyze_unit<'a, F>(&'a self, payload: &UnitPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::AnalyzeUnit,
            payload,
            dispatch::analyze_unit,
            Box::new(body),
        )
    }

    pub fn execute_batch<'a, F>(&'a self, payload: &BatchPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::ExecuteBatch,
            payload,
            dispatch::execute_batch,
            Box::new(body),
        )
    }

    pub fn execute_unit<'a, F>(&'a self, payload: &UnitPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::ExecuteUnit,
            payload,
            dispatch::execute_unit,
            Box::new(body),
        )
    }

    pub async fn execute_unit_deferred<'a, F>(
        &'a self,
        payload: &'a UnitBatchPayload,
        body: F,
    ) -> PhaseResult
    where
        F: FnOnce() -> DeferredBody<'a> + Send + 'a,
    {
        self.run_deferred(
            HookPoint::ExecuteUnitDeferred,
            payload,
            dispatch::execute_unit_deferred,
            Box::new(body),
        )
        .await
    }

    pub fn resolve_field<'a, F>(&'a self, payload: &FieldPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::ResolveField,
            payload,
            dispatch::resolve_field,
            Box::new(body),
        )
    }

    pub async fn resolve_field_deferred<'a, F>(
        &'a self,
        payload: &'a FieldPayload,
        body: F,
    ) -> PhaseResult
    where
        F: FnOnce() -> DeferredBody<'a> + Send + 'a,
    {
        self.run_deferred(
            HookPoint::ResolveFieldDeferred,
            payload,
            dispatch::resolve_field_deferred,
            Box::new(body),
        )
        .await
    }

    pub fn authorize<'a, F>(&'a self, payload: &TypeCheckPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::Authorize,
            payload,
            dispatch::authorize,
            Box::new(body),
        )
    }

    pub async fn authorize_deferred<'a, F>(
        &'a self,
        payload: &'a TypeCheckPayload,
        body: F,
    ) -> PhaseResult
    where
        F: FnOnce() -> DeferredBody<'a> + Send + 'a,
    {
        self.run_deferred(
            HookPoint::AuthorizeDeferred,
            payload,
            dispatch::authorize_deferred,
            Box::new(body),
        )
        .await
    }

    pub fn resolve_type<'a, F>(&'a self, payload: &TypeCheckPayload, body: F) -> PhaseResult
    where
        F: FnOnce() -> PhaseResult + 'a,
    {
        self.run_sync(
            HookPoint::ResolveType,
            payload,
            dispatch::resolve_type,
            Box::new(body),
        )
    }

    pub async fn resolve_type_deferred<'a, F>(
        &'a self,
        payload: &'a TypeCheckPayload,
        body: F,
    ) -> PhaseResult
    where
        F: FnOnce() -> DeferredBody<'a> + Send + 'a,
    {
        self.run_deferred(
            HookPoint::ResolveTypeDeferred,
            payload,
            dispatch::resolve_type_deferred,
            Box::new(body),
        )
        .await
    }
}

/// Per-hook adapters from the erased chain machinery to the typed
/// `TraceModule` methods. Fn items, so they coerce to the higher-ranked
/// dispatch pointers stored in continuations.
mod dispatch {
    use super::*;
    use crate::module::TraceModule;

    pub(super) fn lex<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a SourcePayload,
        next: SyncNext<'a, SourcePayload>,
    ) -> PhaseResult {
        m.lex(ctx, payload, next)
    }

    pub(super) fn parse<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a SourcePayload,
        next: SyncNext<'a, SourcePayload>,
    ) -> PhaseResult {
        m.parse(ctx, payload, next)
    }

    pub(super) fn validate<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a ValidatePayload,
        next: SyncNext<'a, ValidatePayload>,
    ) -> PhaseResult {
        m.validate(ctx, payload, next)
    }

    pub(super) fn analyze_batch<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a BatchPayload,
        next: SyncNext<'a, BatchPayload>,
    ) -> PhaseResult {
        m.analyze_batch(ctx, payload, next)
    }

    pub(super) fn analyze_unit<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a UnitPayload,
        next: SyncNext<'a, UnitPayload>,
    ) -> PhaseResult {
        m.analyze_unit(ctx, payload, next)
    }

    pub(super) fn execute_batch<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a BatchPayload,
        next: SyncNext<'a, BatchPayload>,
    ) -> PhaseResult {
        m.execute_batch(ctx, payload, next)
    }

    pub(super) fn execute_unit<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a UnitPayload,
        next: SyncNext<'a, UnitPayload>,
    ) -> PhaseResult {
        m.execute_unit(ctx, payload, next)
    }

    pub(super) fn execute_unit_deferred<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a UnitBatchPayload,
        next: DeferredNext<'a, UnitBatchPayload>,
    ) -> DeferredBody<'a> {
        m.execute_unit_deferred(ctx, payload, next)
    }

    pub(super) fn resolve_field<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a FieldPayload,
        next: SyncNext<'a, FieldPayload>,
    ) -> PhaseResult {
        m.resolve_field(ctx, payload, next)
    }

    pub(super) fn resolve_field_deferred<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a FieldPayload,
        next: DeferredNext<'a, FieldPayload>,
    ) -> DeferredBody<'a> {
        m.resolve_field_deferred(ctx, payload, next)
    }

    pub(super) fn authorize<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: SyncNext<'a, TypeCheckPayload>,
    ) -> PhaseResult {
        m.authorize(ctx, payload, next)
    }

    pub(super) fn authorize_deferred<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: DeferredNext<'a, TypeCheckPayload>,
    ) -> DeferredBody<'a> {
        m.authorize_deferred(ctx, payload, next)
    }

    pub(super) fn resolve_type<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: SyncNext<'a, TypeCheckPayload>,
    ) -> PhaseResult {
        m.resolve_type(ctx, payload, next)
    }

    pub(super) fn resolve_type_deferred<'a>(
        m: &'a dyn TraceModule,
        ctx: &'a TraceContext,
        payload: &'a TypeCheckPayload,
        next: DeferredNext<'a, TypeCheckPayload>,
    ) -> DeferredBody<'a> {
        m.resolve_type_deferred(ctx, payload, next)
    }
}
