//! OptimizeCX core — speculative-navigation optimizer.
//!
//! Decides, per page view, whether and how the browser should fetch or
//! render likely-next pages ahead of navigation, and keeps that decision
//! consistent across page loads and tabs. The storefront itself (catalog,
//! cart, checkout) is out of scope; so is picking good candidates (the
//! caller supplies a matcher) and the fetching itself (the browser's
//! speculation engine does that).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`constants`] | Default identifiers and targets |
//! | [`errors`] | Error type for ports and helpers |
//! | [`config`] | Identifier / target configuration |
//! | [`mode`] | The four optimization modes |
//! | [`overrides`] | Query-string override signal |
//! | [`resolver`] | Mode resolution state machine |
//! | [`rules`] | Mode → speculation-rules document |
//! | [`directive`] | Rules node reconciler |
//! | [`links`] | Internal link normalization |
//! | [`preload`] | Preload hint reconciler |
//! | [`cross_tab`] | Cross-context mode mirroring |
//! | [`settings`] | Read-only settings broadcaster |
//! | [`ports`] | Side-effect capability traits |
//! | [`runtime`] | Event-driven orchestration |
//!
//! # Failure model
//!
//! Nothing in a pass is fatal. Bad input is ignored, missing capabilities
//! are a normal negative answer, and port failures are logged and
//! dropped. The worst case is "no speculation this page view".

/// Default identifiers and targets.
pub mod constants;

/// Error types for optimizer operations.
pub mod errors;

/// Optimizer configuration.
pub mod config;

/// Optimization modes.
pub mod mode;

/// Ambient override signal parsing.
pub mod overrides;

/// Mode resolver state machine.
pub mod resolver;

/// Rule compiler.
pub mod rules;

/// Directive synchronizer.
pub mod directive;

/// Internal link normalization.
pub mod links;

/// Preload link reconciler.
pub mod preload;

/// Cross-tab synchronizer.
pub mod cross_tab;

/// Settings broadcaster.
pub mod settings;

/// Capability ports.
pub mod ports;

/// Event-driven runtime.
pub mod runtime;

pub use config::SpeculationConfig;
pub use errors::OptimizeError;
pub use mode::OptimizationMode;
pub use overrides::OverrideSignal;
pub use ports::{Environment, PageContext};
pub use runtime::{OptimizerEvent, PassReport, SpeculationOptimizer, SpeculationRuntime};
pub use settings::{SettingsReader, SpeculationSettings};
