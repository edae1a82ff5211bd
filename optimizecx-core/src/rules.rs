//! Rule compiler — mode → declarative speculation-rules document.
//!
//! Pure: no IO, no clocks, no global state. The serialized form is
//! deterministic (field order fixed by declaration order), which is what
//! lets the directive synchronizer compare node contents byte-for-byte.
//!
//! ```text
//! none      → no document
//! prefetch  → {"prefetch":  [document(matcher, moderate),  list(paths)]}
//! prerender → {"prerender": [document(matcher, immediate), list(paths)]}
//! preload   → no document (handled procedurally by `preload`)
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::SpeculationConfig;
use crate::errors::OptimizeError;
use crate::mode::OptimizationMode;

/// Directive kind a rule document populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeculationAction {
    /// Fetch the target document ahead of navigation.
    Prefetch,
    /// Fully render the target document ahead of navigation.
    Prerender,
}

impl SpeculationAction {
    /// JSON key for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            SpeculationAction::Prefetch => "prefetch",
            SpeculationAction::Prerender => "prerender",
        }
    }
}

/// How aggressively the runtime should act on a document rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Eagerness {
    /// Act on hover / pointer-down.
    Moderate,
    /// Act as soon as the rule is observed.
    Immediate,
}

/// `where` clause of a document rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrefMatcher {
    /// URL pattern matched against link targets in the document.
    pub href_matches: String,
}

/// One entry of a rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SpeculationRule {
    /// Match links found in the document.
    Document {
        #[serde(rename = "where")]
        matcher: HrefMatcher,
        eagerness: Eagerness,
    },
    /// Explicit list of paths.
    List { urls: Vec<String> },
}

/// Compiled rule document: one action, an ordered list of rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeculationRules {
    /// The single populated directive kind.
    pub action: SpeculationAction,
    /// Rules in emission order.
    pub rules: Vec<SpeculationRule>,
}

impl Serialize for SpeculationRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.action.as_str(), &self.rules)?;
        map.end()
    }
}

impl SpeculationRules {
    /// Deterministic JSON text, as installed in the rules node.
    ///
    /// # Errors
    /// Returns `OptimizeError::Serialization` if serde_json fails.
    pub fn to_json(&self) -> Result<String, OptimizeError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Compile the rule document for `mode`.
///
/// Returns `None` for `none` and `preload`.
pub fn compile(mode: OptimizationMode, config: &SpeculationConfig) -> Option<SpeculationRules> {
    let (action, eagerness) = match mode {
        OptimizationMode::Prefetch => (SpeculationAction::Prefetch, Eagerness::Moderate),
        OptimizationMode::Prerender => (SpeculationAction::Prerender, Eagerness::Immediate),
        OptimizationMode::None | OptimizationMode::Preload => return None,
    };

    Some(SpeculationRules {
        action,
        rules: vec![
            SpeculationRule::Document {
                matcher: HrefMatcher {
                    href_matches: config.detail_matcher.clone(),
                },
                eagerness,
            },
            SpeculationRule::List {
                urls: config.list_paths.clone(),
            },
        ],
    })
}

/// Compile from a mode name. Unrecognized names compile to no document.
pub fn compile_named(name: &str, config: &SpeculationConfig) -> Option<SpeculationRules> {
    OptimizationMode::parse(name).and_then(|mode| compile(mode, config))
}
