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

//! Chain composition and the continuation contract.
//!
//! [`TraceFactory`] takes an ordered list of modules and, per hook point,
//! precomputes the filtered chain: first registered is outermost, modules not
//! declaring the point contribute nothing. [`SyncNext`] and [`DeferredNext`]
//! are the continuations handed to each layer; `run` peels one layer off the
//! chain, bottoming out in the terminal thunk that is the real phase body.

use crate::config::TraceConfig;
use crate::error::{BuildError, PhaseResult};
use crate::hook::{HookPoint, HookSet};
use crate::module::TraceModule;
use crate::payload::{BatchInfo, TraceContext, UnitInfo};
use crate::trace::Trace;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The real work of a synchronous phase, supplied by the engine at call time.
pub type PhaseBody<'a> = Box<dyn FnOnce() -> PhaseResult + 'a>;

/// A deferred phase result: settlement may happen after the call that
/// produced it has already returned to the engine.
pub type DeferredBody<'a> = Pin<Box<dyn Future<Output = PhaseResult> + Send + 'a>>;

/// The real work of a deferred phase.
pub type DeferredPhaseBody<'a> = Box<dyn FnOnce() -> DeferredBody<'a> + Send + 'a>;

pub(crate) type SyncDispatchFn<P> =
    for<'a> fn(&'a dyn TraceModule, &'a TraceContext, &'a P, SyncNext<'a, P>) -> PhaseResult;

pub(crate) type DeferredDispatchFn<P> =
    for<'a> fn(&'a dyn TraceModule, &'a TraceContext, &'a P, DeferredNext<'a, P>) -> DeferredBody<'a>;

/// Continuation for a synchronous hook point: the remaining chain layers plus
/// the real phase body.
///
/// `run` consumes the continuation, so a handler may invoke it at most once.
/// Declining to invoke it is a supported short-circuit: the phase body never
/// runs and the handler's own return value is what outer layers see.
pub struct SyncNext<'a, P> {
    pub(crate) chain: &'a [Arc<dyn TraceModule>],
    pub(crate) dispatch: SyncDispatchFn<P>,
    pub(crate) terminal: PhaseBody<'a>,
}

impl<'a, P> SyncNext<'a, P> {
    /// Proceed to the next layer, or to the real phase body once the chain
    /// is exhausted.
    pub fn run(self, ctx: &TraceContext, payload: &P) -> PhaseResult {
        let SyncNext {
            chain,
            dispatch,
            terminal,
        } = self;
        match chain.split_first() {
            Some((outer, rest)) => dispatch(
                outer.as_ref(),
                ctx,
                payload,
                SyncNext {
                    chain: rest,
                    dispatch,
                    terminal,
                },
            ),
            None => terminal(),
        }
    }
}

/// Continuation for a deferred hook point.
///
/// Code placed after `run(..).await` in a handler runs once the deferred
/// value has settled, inner layers first. If the engine cancels the execution
/// context by dropping the in-flight future, no further after-code runs.
pub struct DeferredNext<'a, P> {
    pub(crate) chain: &'a [Arc<dyn TraceModule>],
    pub(crate) dispatch: DeferredDispatchFn<P>,
    pub(crate) terminal: DeferredPhaseBody<'a>,
}

impl<'a, P: Sync> DeferredNext<'a, P> {
    /// Proceed to the next layer, or begin the real phase body once the chain
    /// is exhausted, and wait for the result to settle.
    ///
    /// `ctx` and `payload` share the chain's lifetime: the tail continuation
    /// rebuilt for the next layer captures them at `'a`.
    pub async fn run(self, ctx: &'a TraceContext, payload: &'a P) -> PhaseResult {
        let DeferredNext {
            chain,
            dispatch,
            terminal,
        } = self;
        match chain.split_first() {
            Some((outer, rest)) => {
                dispatch(
                    outer.as_ref(),
                    ctx,
                    payload,
                    DeferredNext {
                        chain: rest,
                        dispatch,
                        terminal,
                    },
                )
                .await
            }
            None => terminal().await,
        }
    }
}

/// One registered module plus the hook points it is active on.
struct RegisteredModule {
    module: Arc<dyn TraceModule>,
    active: HookSet,
}

/// Per-hook composed chains, built once per trace instance.
///
/// Indexed by [`HookPoint::index`]; composition of the same ordered module
/// list always yields the same chains.
pub(crate) struct ChainTable {
    per_hook: [Arc<[Arc<dyn TraceModule>]>; HookPoint::COUNT],
}

impl ChainTable {
    fn build(modules: &[RegisteredModule]) -> Self {
        Self {
            per_hook: std::array::from_fn(|i| {
                let hook = HookPoint::ALL[i];
                modules
                    .iter()
                    .filter(|reg| reg.active.contains(hook))
                    .map(|reg| reg.module.clone())
                    .collect::<Vec<_>>()
                    .into()
            }),
        }
    }

    pub(crate) fn get(&self, hook: HookPoint) -> &[Arc<dyn TraceModule>] {
        &self.per_hook[hook.index()]
    }
}

/// Construction-time registration of trace modules, and the factory for
/// per-execution-context [`Trace`] instances.
///
/// Registration order is composition order: the first registered module is
/// outermost on every hook point it instruments, so it observes the total
/// elapsed time and the outermost failures of everything inside it. Once a
/// `Trace` is built, its module list is fixed.
#[derive(Default)]
pub struct TraceFactory {
    modules: Vec<RegisteredModule>,
}

impl TraceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module at the end (innermost position) of the chain.
    pub fn register(&mut self, module: Arc<dyn TraceModule>) -> Result<(), BuildError> {
        let name = module.name().to_string();
        if self.modules.iter().any(|reg| reg.module.name() == name) {
            return Err(BuildError::DuplicateModule(name));
        }
        let active = module.hooks();
        tracing::debug!(module = %name, hooks = active.iter().count(), "registered trace module");
        self.modules.push(RegisteredModule { module, active });
        Ok(())
    }

    /// Narrow or disable registered modules from configuration. Unknown
    /// module or hook-point names are construction errors; nothing is
    /// partially applied on failure.
    pub fn apply_config(&mut self, config: &TraceConfig) -> Result<(), BuildError> {
        // Resolve everything before mutating.
        let mut updates = Vec::with_capacity(config.modules.len());
        for spec in &config.modules {
            let index = self
                .modules
                .iter()
                .position(|reg| reg.module.name() == spec.module)
                .ok_or_else(|| BuildError::UnknownModule(spec.module.clone()))?;
            let active = if !spec.enabled {
                HookSet::empty()
            } else if spec.hooks.is_empty() {
                self.modules[index].module.hooks()
            } else {
                let mut set = HookSet::empty();
                for name in &spec.hooks {
                    set.insert(HookPoint::from_name(name)?);
                }
                set
            };
            updates.push((index, active));
        }
        for (index, active) in updates {
            self.modules[index].active = active;
        }
        Ok(())
    }

    /// Number of registered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Build a trace instance for a batch execution context.
    pub fn build_for_batch(&self, batch: BatchInfo) -> Trace {
        self.build(Some(batch), None)
    }

    /// Build a trace instance for a single-unit execution context.
    pub fn build_for_unit(&self, unit: UnitInfo) -> Trace {
        self.build(None, Some(unit))
    }

    /// Build a trace instance. Pure with respect to the module list: no I/O,
    /// and it cannot fail for well-formed modules.
    pub fn build(&self, batch: Option<BatchInfo>, unit: Option<UnitInfo>) -> Trace {
        tracing::debug!(modules = self.modules.len(), "building trace chains");
        Trace::new(
            ChainTable::build(&self.modules),
            TraceContext::new(batch, unit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::SourcePayload;
    use serde_json::json;

    struct Passive {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl TraceModule for Passive {
        fn name(&self) -> &str {
            self.name
        }
    }

    struct NarrowModule;

    #[async_trait::async_trait]
    impl TraceModule for NarrowModule {
        fn name(&self) -> &str {
            "narrow"
        }

        fn hooks(&self) -> HookSet {
            HookSet::of(&[HookPoint::ResolveField])
        }
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut factory = TraceFactory::new();
        factory.register(Arc::new(Passive { name: "dup" })).unwrap();
        let err = factory
            .register(Arc::new(Passive { name: "dup" }))
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateModule(name) if name == "dup"));
    }

    #[test]
    fn test_undeclared_hooks_contribute_no_layer() {
        let mut factory = TraceFactory::new();
        factory.register(Arc::new(NarrowModule)).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a }"));

        assert_eq!(trace.chain_len(HookPoint::ResolveField), 1);
        assert_eq!(trace.chain_len(HookPoint::Parse), 0);
    }

    #[test]
    fn test_default_methods_pass_through() {
        let mut factory = TraceFactory::new();
        factory.register(Arc::new(Passive { name: "a" })).unwrap();
        factory.register(Arc::new(Passive { name: "b" })).unwrap();
        let trace = factory.build_for_unit(UnitInfo::new("{ a }"));

        let payload = SourcePayload {
            source: "{ a }".into(),
        };
        let result = trace.parse(&payload, || Ok(json!("document")));
        assert_eq!(result.unwrap(), json!("document"));
    }

    #[test]
    fn test_composition_is_deterministic() {
        let mut factory = TraceFactory::new();
        factory.register(Arc::new(Passive { name: "a" })).unwrap();
        factory.register(Arc::new(NarrowModule)).unwrap();

        let one = factory.build_for_batch(BatchInfo::new(1));
        let two = factory.build_for_batch(BatchInfo::new(1));
        for hook in HookPoint::ALL {
            assert_eq!(one.chain_len(hook), two.chain_len(hook));
        }
        // "a" declares everything, "narrow" only resolveField.
        assert_eq!(one.chain_len(HookPoint::ResolveField), 2);
        assert_eq!(one.chain_len(HookPoint::Lex), 1);
    }
}
