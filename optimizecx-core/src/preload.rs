//! Preload link reconciler — procedural hints for `preload` mode.
//!
//! Every pass tears down all hint elements carrying the ownership
//! attribute and rebuilds the set from scratch. Link sets change almost
//! completely between pages, so there is no incremental diff.
//!
//! ## Pass
//! ```text
//! remove_tagged(attr)
//! └─ mode != preload or not hydrated → stop
//!    └─ anchors → normalize → dedupe (absolute URL)
//!       └─ empty → stop
//!          └─ per path+query (deduped again):
//!               navigation.warm(path)   best-effort
//!               append_hint(path)
//! ```

use std::collections::HashSet;

use url::Url;

use crate::config::SpeculationConfig;
use crate::constants::{HINT_AS, HINT_CROSS_ORIGIN, HINT_FETCH_PRIORITY, HINT_MIME, HINT_REL};
use crate::links;
use crate::mode::OptimizationMode;
use crate::ports::{Document, NavigationLayer, PageContext, PreloadHint};
use crate::settings::SpeculationSettings;

/// Build the hint record for one same-origin path.
pub fn preload_hint(href: impl Into<String>) -> PreloadHint {
    PreloadHint {
        href: href.into(),
        rel: HINT_REL,
        destination: HINT_AS,
        mime: HINT_MIME,
        cross_origin: HINT_CROSS_ORIGIN,
        fetch_priority: HINT_FETCH_PRIORITY,
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreloadOutcome {
    /// Tagged elements removed during cleanup.
    pub removed: usize,
    /// Paths hinted this pass, in installation order.
    pub hinted: Vec<String>,
    /// Warm requests the navigation layer rejected.
    pub warm_failures: usize,
}

/// Reconciler for the tagged preload hint set.
#[derive(Debug, Clone)]
pub struct PreloadReconciler {
    attribute: String,
}

impl PreloadReconciler {
    /// Reconciler owning elements tagged with `config.preload_attribute`.
    pub fn new(config: &SpeculationConfig) -> Self {
        Self {
            attribute: config.preload_attribute.clone(),
        }
    }

    /// Run one full teardown-and-rebuild pass.
    pub fn reconcile(
        &self,
        settings: SpeculationSettings,
        page: &PageContext,
        document: &mut dyn Document,
        navigation: &dyn NavigationLayer,
    ) -> PreloadOutcome {
        let mut outcome = PreloadOutcome {
            removed: document.remove_tagged(&self.attribute).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to clear preload hints");
                0
            }),
            ..PreloadOutcome::default()
        };

        if !settings.has_hydrated || settings.optimization_mode != OptimizationMode::Preload {
            return outcome;
        }

        let hrefs = match document.anchor_hrefs() {
            Ok(hrefs) => hrefs,
            Err(e) => {
                tracing::warn!(error = %e, "anchor scan failed; no preload hints this page");
                return outcome;
            }
        };

        let urls = links::collect_internal_urls(hrefs.iter().map(String::as_str), &page.origin);
        if urls.is_empty() {
            tracing::debug!(path = %page.path, "no internal links to preload");
            return outcome;
        }

        let mut seen = HashSet::new();
        for absolute in &urls {
            let Ok(parsed) = Url::parse(absolute) else {
                continue;
            };
            if parsed.origin() != page.origin.origin() {
                continue;
            }
            let relative = links::path_and_query(&parsed);
            if !seen.insert(relative.clone()) {
                continue;
            }

            if let Err(e) = navigation.warm(&relative) {
                tracing::debug!(path = %relative, error = %e, "router warm failed; hint still installed");
                outcome.warm_failures += 1;
            }

            match document.append_hint(&self.attribute, &preload_hint(relative.as_str())) {
                Ok(()) => outcome.hinted.push(relative),
                Err(e) => tracing::warn!(path = %relative, error = %e, "failed to append preload hint"),
            }
        }

        tracing::info!(
            path = %page.path,
            removed = outcome.removed,
            hinted = outcome.hinted.len(),
            "preload hints rebuilt"
        );
        outcome
    }
}
