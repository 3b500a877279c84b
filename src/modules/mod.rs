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

//! Built-in trace modules.
//!
//! Reference observers shipped with the crate: structured logging around
//! phase boundaries and wall-clock timing per hook point. They double as
//! worked examples of the [`TraceModule`](crate::module::TraceModule)
//! contract.

pub mod logging;
pub mod timing;

pub use logging::LoggingTrace;
pub use timing::{PhaseStats, TimingTrace};
