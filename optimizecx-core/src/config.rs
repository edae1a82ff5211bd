//! Optimizer configuration — identifiers and rule targets.
//!
//! The detail-page matcher and the fixed list paths are caller inputs:
//! the core never decides which destinations are worth speculating on.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::errors::OptimizeError;

/// Identifiers and targets used by every optimizer component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeculationConfig {
    /// Durable storage key for the persisted mode.
    pub storage_key: String,
    /// Identity tag of the speculation-rules node.
    pub script_id: String,
    /// Ownership attribute of preload hint elements.
    pub preload_attribute: String,
    /// Telemetry dimension name.
    pub telemetry_tag: String,
    /// Primary override query parameter.
    pub override_param: String,
    /// Legacy boolean override query parameter.
    pub legacy_override_param: String,
    /// Document-matcher pattern for detail pages.
    pub detail_matcher: String,
    /// Paths listed verbatim in every compiled rule document.
    pub list_paths: Vec<String>,
}

impl Default for SpeculationConfig {
    fn default() -> Self {
        Self {
            storage_key: constants::STORAGE_KEY.to_string(),
            script_id: constants::SCRIPT_ID.to_string(),
            preload_attribute: constants::PRELOAD_ATTRIBUTE.to_string(),
            telemetry_tag: constants::TELEMETRY_TAG.to_string(),
            override_param: constants::OVERRIDE_PARAM.to_string(),
            legacy_override_param: constants::LEGACY_OVERRIDE_PARAM.to_string(),
            detail_matcher: constants::DETAIL_MATCHER.to_string(),
            list_paths: vec![constants::CART_PATH.to_string()],
        }
    }
}

impl SpeculationConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns `OptimizeError::Config` on malformed JSON, unknown fields,
    /// or a value that fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, OptimizeError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| OptimizeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that identifiers are non-empty and list paths are absolute.
    ///
    /// # Errors
    /// Returns `OptimizeError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let required = [
            ("storage_key", &self.storage_key),
            ("script_id", &self.script_id),
            ("preload_attribute", &self.preload_attribute),
            ("telemetry_tag", &self.telemetry_tag),
            ("override_param", &self.override_param),
            ("legacy_override_param", &self.legacy_override_param),
            ("detail_matcher", &self.detail_matcher),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OptimizeError::Config(format!("{field} must not be empty")));
            }
        }
        if let Some(path) = self.list_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(OptimizeError::Config(format!(
                "list path {path:?} must start with '/'"
            )));
        }
        Ok(())
    }
}
