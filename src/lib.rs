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

//! Querytrace
//!
//! Composable instrumentation around the phases of a multi-stage
//! query-processing pipeline. Independently authored observer modules —
//! metrics collectors, tracers, loggers — attach to any subset of a fixed set
//! of hook points (lexing, parsing, validation, analysis, execution,
//! field resolution, authorization, type resolution) without the pipeline
//! engine knowing they exist.
//!
//! # Architecture
//!
//! - [`HookPoint`]: the closed set of extension points, with eager and
//!   deferred variants kept distinct so callers know which completion model
//!   applies.
//! - [`TraceModule`]: one observer. Every method defaults to running its
//!   continuation once and returning the result unchanged, so a module only
//!   writes the points it cares about and declares them in [`HookSet`].
//! - [`TraceFactory`]: ordered, construction-time registration. First
//!   registered is outermost on every point.
//! - [`Trace`]: one instance per execution context (a batch or a single
//!   unit); the engine calls it at each phase boundary with the phase
//!   context and a thunk for the real work.
//! - [`SyncNext`] / [`DeferredNext`]: the continuation a handler receives.
//!   Consumed by value — it can be run at most once, and not running it
//!   short-circuits the phase. For deferred points, code after
//!   `run(..).await` executes once the deferred value settles.
//!
//! With no modules registered, every dispatch is a straight call into the
//! phase body; a failure in the body surfaces to the engine unchanged unless
//! a module deliberately intercepts it.
//!
//! # Example
//!
//! ```rust,ignore
//! use querytrace::{TraceFactory, UnitInfo, FieldPayload, FieldRef};
//! use querytrace::modules::{LoggingTrace, TimingTrace};
//! use std::sync::Arc;
//!
//! let timing = Arc::new(TimingTrace::new());
//! let mut factory = TraceFactory::new();
//! factory.register(Arc::new(LoggingTrace::new()))?;
//! factory.register(timing.clone())?;
//!
//! // One trace instance per request.
//! let trace = factory.build_for_unit(UnitInfo::new("{ viewer { name } }"));
//! let payload = FieldPayload::new(FieldRef::new("Query", "viewer"));
//! let result = trace.resolve_field(&payload, || {
//!     // ... the engine resolves the field here ...
//!     Ok(serde_json::json!({"name": "ada"}))
//! });
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod hook;
pub mod module;
pub mod modules;
pub mod payload;
pub mod trace;

// Re-exports
pub use chain::{
    DeferredBody, DeferredNext, DeferredPhaseBody, PhaseBody, SyncNext, TraceFactory,
};
pub use config::{ModuleSpec, TraceConfig};
pub use error::{BuildError, PhaseError, PhaseResult};
pub use hook::{HookPoint, HookSet};
pub use module::TraceModule;
pub use payload::{
    BatchInfo, BatchPayload, FieldPayload, FieldRef, SourcePayload, TraceContext,
    TypeCheckPayload, UnitBatchPayload, UnitInfo, UnitPayload, ValidatePayload,
};
pub use trace::Trace;
