//! Mode resolver — ambient signal + persisted record → one active mode.
//!
//! ## State machine
//! ```text
//!                 resolve(signal)
//! Uninitialized ─────────────────▶ Hydrated(mode)
//!                                    │  ▲
//!                 resolve(signal')   │  │  adopt(mode')  (cross-tab mirror)
//!                 signal' ≠ signal   └──┘
//! ```
//! `Hydrated` never returns to `Uninitialized`.
//!
//! ## Resolution order
//! 1. Recognized override → adopt it and persist it.
//! 2. Recognized persisted record → adopt it, no write.
//! 3. Otherwise `none`, no write.
//!
//! Each pass performs zero or one storage write.

use crate::mode::OptimizationMode;
use crate::overrides::OverrideSignal;
use crate::ports::KeyValueStore;
use crate::settings::SpeculationSettings;

/// Resolver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// No resolution pass has completed yet.
    #[default]
    Uninitialized,
    /// Settled on a mode; safe to act on.
    Hydrated(OptimizationMode),
}

/// Which source a resolution pass took its mode from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// The navigation's override parameter.
    Override,
    /// The persisted mode record.
    Persisted,
    /// Neither source was usable.
    Default,
}

/// Result of one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Mode now active.
    pub mode: OptimizationMode,
    /// Where it came from.
    pub source: ResolutionSource,
    /// Whether the pass wrote the persisted record.
    pub persisted: bool,
}

/// Mode resolver for one optimizer lifetime.
#[derive(Debug)]
pub struct ModeResolver {
    storage_key: String,
    state: ResolverState,
    last_signal: Option<OverrideSignal>,
}

impl ModeResolver {
    /// Resolver persisting under `storage_key`.
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            state: ResolverState::Uninitialized,
            last_signal: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ResolverState {
        self.state
    }

    /// Settings view of the current state.
    pub fn settings(&self) -> SpeculationSettings {
        match self.state {
            ResolverState::Uninitialized => SpeculationSettings::default(),
            ResolverState::Hydrated(mode) => SpeculationSettings {
                optimization_mode: mode,
                has_hydrated: true,
            },
        }
    }

    /// Run a pass only if `signal` differs from the one last resolved.
    ///
    /// The first call always resolves. Plain route changes carrying the
    /// same override return `None` and leave storage untouched.
    pub fn on_override(
        &mut self,
        signal: &OverrideSignal,
        store: &mut dyn KeyValueStore,
    ) -> Option<Resolution> {
        if self.state != ResolverState::Uninitialized && self.last_signal.as_ref() == Some(signal) {
            return None;
        }
        Some(self.resolve(signal, store))
    }

    /// Run a resolution pass unconditionally.
    pub fn resolve(&mut self, signal: &OverrideSignal, store: &mut dyn KeyValueStore) -> Resolution {
        self.last_signal = Some(signal.clone());

        let resolution = match signal.mode() {
            Some(mode) => Resolution {
                mode,
                source: ResolutionSource::Override,
                persisted: self.persist(store, mode),
            },
            None => {
                if let Some(raw) = signal.raw() {
                    tracing::debug!(raw, "ignoring unrecognized optimization override");
                }
                match self.read_persisted(store) {
                    Some(mode) => Resolution {
                        mode,
                        source: ResolutionSource::Persisted,
                        persisted: false,
                    },
                    None => Resolution {
                        mode: OptimizationMode::None,
                        source: ResolutionSource::Default,
                        persisted: false,
                    },
                }
            }
        };

        tracing::info!(
            mode = %resolution.mode,
            source = ?resolution.source,
            persisted = resolution.persisted,
            "optimization mode resolved"
        );
        self.state = ResolverState::Hydrated(resolution.mode);
        resolution
    }

    /// Mirror a mode another browsing context already persisted.
    ///
    /// Never writes storage. Ignored before the first pass, which reads
    /// the same record anyway. Returns `true` if the mode changed.
    pub fn adopt(&mut self, mode: OptimizationMode) -> bool {
        match self.state {
            ResolverState::Hydrated(current) if current != mode => {
                tracing::info!(from = %current, to = %mode, "adopting optimization mode from another context");
                self.state = ResolverState::Hydrated(mode);
                true
            }
            ResolverState::Hydrated(_) => false,
            ResolverState::Uninitialized => {
                tracing::debug!(%mode, "storage change before hydration; deferring to first pass");
                false
            }
        }
    }

    fn read_persisted(&self, store: &dyn KeyValueStore) -> Option<OptimizationMode> {
        match store.get(&self.storage_key) {
            Ok(Some(value)) => {
                let mode = OptimizationMode::parse(&value);
                if mode.is_none() {
                    tracing::debug!(value = %value, "ignoring unrecognized persisted mode");
                }
                mode
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "persisted mode unreadable");
                None
            }
        }
    }

    fn persist(&self, store: &mut dyn KeyValueStore, mode: OptimizationMode) -> bool {
        match store.set(&self.storage_key, mode.as_str()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist optimization mode; continuing unpersisted");
                false
            }
        }
    }
}
