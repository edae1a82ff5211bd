//! Directive synchronizer — keeps the single speculation-rules node in
//! the document head consistent with the compiled rule document.
//!
//! ## Algorithm (per `(hydrated, mode)` change)
//! 1. Tag the mode on the telemetry sink (best-effort).
//! 2. Look up the owned node by its identity tag.
//! 3. Compile the rule document for the mode.
//! 4. No document → remove the node if present.
//! 5. Runtime lacks `speculationrules` → remove the node if present.
//!    The capability check always precedes any install or update.
//! 6. Serialize; identical content → no-op, else update in place or
//!    create the node.
//!
//! Nothing here returns an error. Every failure degrades to "no rules
//! installed" and is logged.

use crate::config::SpeculationConfig;
use crate::constants::SPECULATION_RULES_TYPE;
use crate::mode::OptimizationMode;
use crate::ports::{CapabilityProbe, Document, TelemetrySink};
use crate::rules;
use crate::settings::SpeculationSettings;

/// What a synchronization pass did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// Not hydrated yet; nothing touched.
    Pending,
    /// No document for this mode and no node present.
    Absent,
    /// No document for this mode (or runtime unsupported, or failure);
    /// the stale node was removed.
    Removed,
    /// Runtime does not support speculation rules; nothing installed.
    Unsupported,
    /// Node already carried identical content.
    Unchanged,
    /// Existing node's content replaced.
    Updated,
    /// New node appended.
    Created,
    /// A document mutation failed; the node may be missing.
    Failed,
}

/// Reconciler for the speculation-rules node.
#[derive(Debug, Clone)]
pub struct DirectiveSynchronizer {
    config: SpeculationConfig,
}

impl DirectiveSynchronizer {
    /// Synchronizer using `config`'s identity tag, telemetry dimension and
    /// rule targets.
    pub fn new(config: SpeculationConfig) -> Self {
        Self { config }
    }

    /// Run one synchronization pass.
    pub fn sync(
        &self,
        settings: SpeculationSettings,
        document: &mut dyn Document,
        probe: &dyn CapabilityProbe,
        telemetry: &dyn TelemetrySink,
    ) -> DirectiveOutcome {
        if !settings.has_hydrated {
            return DirectiveOutcome::Pending;
        }
        let mode = settings.optimization_mode;

        if let Err(e) = telemetry.set_tag(&self.config.telemetry_tag, mode.as_str()) {
            tracing::debug!(error = %e, "telemetry tag dropped");
        }

        let id = self.config.script_id.as_str();
        let existing = match document.script_text(id) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(error = %e, "rules node lookup failed; skipping sync");
                return DirectiveOutcome::Failed;
            }
        };

        let Some(rules) = rules::compile(mode, &self.config) else {
            return self.clear(document, existing.is_some(), DirectiveOutcome::Absent);
        };

        match probe.supports(SPECULATION_RULES_TYPE) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(%mode, "speculation rules unsupported by runtime");
                return self.clear(document, existing.is_some(), DirectiveOutcome::Unsupported);
            }
            Err(e) => {
                tracing::debug!(error = %e, "capability detection failed; treating as unsupported");
                return self.clear(document, existing.is_some(), DirectiveOutcome::Unsupported);
            }
        }

        let serialized = match rules.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "rule serialization failed");
                return self.clear(document, existing.is_some(), DirectiveOutcome::Failed);
            }
        };

        let result = match existing {
            Some(current) if current == serialized => return DirectiveOutcome::Unchanged,
            Some(_) => document
                .set_script_text(id, &serialized)
                .map(|()| DirectiveOutcome::Updated),
            None => document
                .append_script(id, SPECULATION_RULES_TYPE, &serialized)
                .map(|()| DirectiveOutcome::Created),
        };

        match result {
            Ok(outcome) => {
                tracing::info!(%mode, ?outcome, "speculation rules installed");
                outcome
            }
            Err(e) => {
                tracing::warn!(error = %e, %mode, "failed to install speculation rules");
                DirectiveOutcome::Failed
            }
        }
    }

    /// Mode-only convenience for callers without a settings value.
    pub fn sync_mode(
        &self,
        mode: OptimizationMode,
        document: &mut dyn Document,
        probe: &dyn CapabilityProbe,
        telemetry: &dyn TelemetrySink,
    ) -> DirectiveOutcome {
        let settings = SpeculationSettings {
            optimization_mode: mode,
            has_hydrated: true,
        };
        self.sync(settings, document, probe, telemetry)
    }

    fn clear(&self, document: &mut dyn Document, present: bool, absent: DirectiveOutcome) -> DirectiveOutcome {
        if !present {
            return absent;
        }
        match document.remove_script(&self.config.script_id) {
            Ok(()) => DirectiveOutcome::Removed,
            Err(e) => {
                tracing::warn!(error = %e, "failed to remove stale rules node");
                DirectiveOutcome::Failed
            }
        }
    }
}
