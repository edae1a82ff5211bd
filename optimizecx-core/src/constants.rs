//! Default identifiers and targets — the values the storefront ships with.
//!
//! Every value here is the default for a field of
//! [`SpeculationConfig`](crate::config::SpeculationConfig). The load-test
//! harness and the storefront pages rely on the query parameter names and
//! the storage key staying stable across releases.

/// Durable storage key holding the persisted optimization mode.
pub const STORAGE_KEY: &str = "optimize-cx:optimization-mode";

/// Identity tag (element `id`) of the single speculation-rules node.
pub const SCRIPT_ID: &str = "optimize-cx-speculation-rules";

/// Ownership attribute carried by every preload hint element.
pub const PRELOAD_ATTRIBUTE: &str = "data-optimize-cx-preload";

/// Telemetry dimension name the active mode is recorded under.
pub const TELEMETRY_TAG: &str = "optimization_mode";

/// Primary override query parameter (`?optimization=prefetch`).
pub const OVERRIDE_PARAM: &str = "optimization";

/// Legacy boolean override query parameter (`?optimized=true`).
pub const LEGACY_OVERRIDE_PARAM: &str = "optimized";

/// Document-matcher pattern selecting product detail pages.
pub const DETAIL_MATCHER: &str = "/products/.*";

/// Fixed path listed in every compiled rule document.
pub const CART_PATH: &str = "/cart";

/// Script `type` the runtime must support before a rule node is installed.
pub const SPECULATION_RULES_TYPE: &str = "speculationrules";

/// `rel` value of preload hint elements.
pub const HINT_REL: &str = "preload";

/// `as` destination of preload hint elements.
pub const HINT_AS: &str = "fetch";

/// MIME type advertised by preload hint elements.
pub const HINT_MIME: &str = "text/html";

/// `crossorigin` value. Credentials are never sent with hint fetches.
pub const HINT_CROSS_ORIGIN: &str = "anonymous";

/// `fetchpriority` value of preload hint elements.
pub const HINT_FETCH_PRIORITY: &str = "high";
