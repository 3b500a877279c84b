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

//! Observer wiring configuration.
//!
//! Modules themselves are code, registered in order on a
//! [`TraceFactory`](crate::chain::TraceFactory); configuration narrows a
//! registered module to named hook points or disables it outright, without a
//! rebuild. Unknown module or hook-point names are rejected before any chain
//! is composed.
//!
//! # Example JSON configuration
//!
//! ```json
//! {
//!     "modules": [
//!         {"module": "timing"},
//!         {"module": "logging", "hooks": ["resolveField", "executeUnit"]},
//!         {"module": "slow_query_capture", "enabled": false}
//!     ]
//! }
//! ```

use crate::error::BuildError;
use crate::hook::HookPoint;
use serde::{Deserialize, Serialize};

/// Configuration for the modules attached to a trace factory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Per-module overrides. Modules not named here keep their declared
    /// hook set.
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

impl TraceConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        serde_json::from_str(json).map_err(|e| BuildError::ConfigParse(e.to_string()))
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BuildError> {
        toml::from_str(toml_str).map_err(|e| BuildError::ConfigParse(e.to_string()))
    }

    /// Check that every named hook point exists. Module names can only be
    /// checked against a factory; see
    /// [`TraceFactory::apply_config`](crate::chain::TraceFactory::apply_config).
    pub fn validate(&self) -> Result<(), BuildError> {
        for spec in &self.modules {
            for name in &spec.hooks {
                HookPoint::from_name(name)?;
            }
        }
        Ok(())
    }
}

/// Override for a single registered module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Name of the registered module this spec applies to.
    pub module: String,

    /// Hook points to keep the module on. Empty means the module's own
    /// declared set.
    #[serde(default)]
    pub hooks: Vec<String>,

    /// Whether the module is active at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ModuleSpec {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            hooks: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_hooks(mut self, hooks: &[HookPoint]) -> Self {
        self.hooks = hooks.iter().map(|h| h.name().to_string()).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "modules": [
                {"module": "timing"},
                {"module": "logging", "hooks": ["resolveField"], "enabled": true}
            ]
        }"#;

        let config = TraceConfig::from_json(json).unwrap();
        assert_eq!(config.modules.len(), 2);
        assert!(config.modules[0].hooks.is_empty());
        assert_eq!(config.modules[1].hooks, vec!["resolveField"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            [[modules]]
            module = "timing"
            hooks = ["parse", "executeBatch"]

            [[modules]]
            module = "logging"
            enabled = false
        "#;

        let config = TraceConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.modules.len(), 2);
        assert!(!config.modules[1].enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_unknown_hook() {
        let config = TraceConfig {
            modules: vec![ModuleSpec::new("timing")
                .with_hooks(&[HookPoint::Parse])],
        };
        config.validate().unwrap();

        let bad = TraceConfig::from_json(
            r#"{"modules": [{"module": "timing", "hooks": ["executeGalaxy"]}]}"#,
        )
        .unwrap();
        let err = bad.validate().unwrap_err();
        assert!(matches!(err, BuildError::UnknownHookPoint(name) if name == "executeGalaxy"));
    }
}
