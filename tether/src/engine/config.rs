//! Engine instance configuration

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Default reserved global name the function registry table is bound under.
/// The leading underscores keep it out of the way of ordinary script names.
pub const DEFAULT_FUNCTION_REGISTRY_KEY: &str = "__tether_fnregistry";

const DEFAULT_MAX_STACK_DEPTH: usize = 4096;

/// Per-instance settings, applied at construction.
///
/// Construction replaces the usual process-wide setup flag: every instance
/// carries its own configuration, and registry creation is idempotent, so
/// nothing needs one-time global initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluation stack depth at which further pushes are rejected
    pub max_stack_depth: usize,
    /// Reserved global name for the function registry table
    pub function_registry_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            function_registry_key: DEFAULT_FUNCTION_REGISTRY_KEY.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from its JSON form; absent fields take defaults
    pub fn from_json_str(raw: &str) -> Result<EngineConfig> {
        serde_json::from_str(raw)
            .map_err(|err| BridgeError::config_error(format!("invalid engine config: {err}")))
    }
}
