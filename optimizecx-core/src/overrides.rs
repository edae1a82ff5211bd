//! Ambient override signal — the per-navigation query parameters.
//!
//! ## Precedence
//! ```text
//! ?optimization=<raw>   present  → raw, verbatim (even if unrecognized)
//! ?optimized=true               → "prerender"
//! ?optimized=false              → "none"
//! otherwise                     → absent
//! ```
//! An unrecognized primary value does NOT fall back to the legacy alias;
//! the resolver rejects it and moves on to the persisted record.

use url::form_urlencoded;

use crate::config::SpeculationConfig;
use crate::mode::OptimizationMode;

/// Override value extracted from one navigation's query string.
///
/// Equality is what drives re-resolution: a plain route change that
/// carries the same (or no) override compares equal and is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverrideSignal {
    raw: Option<String>,
}

impl OverrideSignal {
    /// No override on this navigation.
    pub fn absent() -> Self {
        Self { raw: None }
    }

    /// Override carrying `raw` verbatim.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { raw: Some(raw.into()) }
    }

    /// Extract the override from a query string (leading `?` optional).
    ///
    /// The first occurrence of each parameter wins.
    pub fn from_query(query: &str, config: &SpeculationConfig) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut primary = None;
        let mut legacy = None;
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            if primary.is_none() && name == config.override_param.as_str() {
                primary = Some(value.into_owned());
            } else if legacy.is_none() && name == config.legacy_override_param.as_str() {
                legacy = Some(value.into_owned());
            }
        }

        let raw = primary.or_else(|| match legacy.as_deref() {
            Some("true") => Some(OptimizationMode::Prerender.as_str().to_string()),
            Some("false") => Some(OptimizationMode::None.as_str().to_string()),
            _ => None,
        });
        Self { raw }
    }

    /// The raw override text, if any.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// The override as a mode, if present and recognized.
    pub fn mode(&self) -> Option<OptimizationMode> {
        self.raw.as_deref().and_then(OptimizationMode::parse)
    }
}

/// URL that primes a fresh browsing context into `mode`.
///
/// Used by the load-test harness before each journey. One trailing `/`
/// on `base` is dropped so `http://host/` and `http://host` agree.
pub fn override_url(base: &str, mode: OptimizationMode, config: &SpeculationConfig) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair(&config.override_param, mode.as_str())
        .finish();
    format!("{base}/?{query}")
}
