//! Capability ports — every side effect the optimizer performs.
//!
//! The core owns no DOM, storage, or network handle. The browser binding
//! (`optimizecx-wasm`) implements these traits over `web-sys`; tests use
//! the in-memory fakes from `optimizecx-testkit`.
//!
//! Everything is single-threaded: ports take `&self`/`&mut self` and are
//! never shared across threads, so none of them require `Send`.

use url::Url;

use crate::errors::OptimizeError;

/// Durable client-side key/value storage (one origin's `localStorage`).
pub trait KeyValueStore {
    /// Read `key`. `Ok(None)` when unset.
    fn get(&self, key: &str) -> Result<Option<String>, OptimizeError>;

    /// Write `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), OptimizeError>;
}

/// A change to durable storage made by another browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Changed key; `None` when the whole store was cleared.
    pub key: Option<String>,
    /// Value after the change; `None` when removed.
    pub new_value: Option<String>,
}

/// Callback receiving storage changes.
pub type StorageListener = Box<dyn FnMut(StorageChange)>;

/// Cross-context change-notification feed for durable storage.
pub trait StorageEvents {
    /// Register `listener`. It stays installed until the returned
    /// [`Subscription`] is dropped.
    fn subscribe(&self, listener: StorageListener) -> Subscription;
}

/// Handle for an installed listener; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Subscription whose teardown runs `cancel` exactly once.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to tear down.
    pub fn inert() -> Self {
        Self { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// One preload hint element's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadHint {
    /// Same-origin path plus query (`/products/7?ref=x`).
    pub href: String,
    /// `rel` attribute.
    pub rel: &'static str,
    /// `as` attribute.
    pub destination: &'static str,
    /// `type` attribute.
    pub mime: &'static str,
    /// `crossorigin` attribute.
    pub cross_origin: &'static str,
    /// `fetchpriority` attribute.
    pub fetch_priority: &'static str,
}

/// Document query and mutation, scoped to what the reconcilers touch.
///
/// Nodes are addressed only by identity tag (script `id`) or ownership
/// attribute, so no element handles cross this boundary.
pub trait Document {
    /// Text content of the head script with `id`, if present.
    fn script_text(&self, id: &str) -> Result<Option<String>, OptimizeError>;

    /// Replace the text content of the existing head script with `id`.
    fn set_script_text(&mut self, id: &str, text: &str) -> Result<(), OptimizeError>;

    /// Append a new head script with `id`, `script_type` and `text`.
    fn append_script(&mut self, id: &str, script_type: &str, text: &str) -> Result<(), OptimizeError>;

    /// Remove the head script with `id`. Removing nothing is not an error.
    fn remove_script(&mut self, id: &str) -> Result<(), OptimizeError>;

    /// Remove every element carrying `attribute`; returns how many.
    fn remove_tagged(&mut self, attribute: &str) -> Result<usize, OptimizeError>;

    /// Append a hint element to the head, tagged with `attribute`.
    fn append_hint(&mut self, attribute: &str, hint: &PreloadHint) -> Result<(), OptimizeError>;

    /// Raw `href` attribute of every anchor in the document, in order.
    fn anchor_hrefs(&self) -> Result<Vec<String>, OptimizeError>;
}

/// "Does this runtime support this declarative directive type?"
pub trait CapabilityProbe {
    /// `Ok(false)` is the normal negative answer; `Err` means the
    /// detection itself failed and is treated the same way.
    fn supports(&self, directive_type: &str) -> Result<bool, OptimizeError>;
}

/// The host router's best-effort cache warming.
pub trait NavigationLayer {
    /// Ask the router to warm its cache for `path`.
    fn warm(&self, path: &str) -> Result<(), OptimizeError>;
}

/// Telemetry / error-reporting sink accepting labeled dimensions.
pub trait TelemetrySink {
    /// Attach `key = value` to subsequent reports.
    fn set_tag(&self, key: &str, value: &str) -> Result<(), OptimizeError>;
}

/// Telemetry sink that records tags as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn set_tag(&self, key: &str, value: &str) -> Result<(), OptimizeError> {
        tracing::info!(target: "optimizecx::telemetry", tag = key, value, "telemetry tag");
        Ok(())
    }
}

/// Where the current page view lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Origin of the page (`https://shop.example`).
    pub origin: Url,
    /// Path of the page (`/products/7`), the preload trigger.
    pub path: String,
}

impl PageContext {
    /// Build from an absolute page URL.
    ///
    /// # Errors
    /// Returns `OptimizeError::InvalidUrl` if `location` does not parse
    /// or has no usable origin.
    pub fn from_location(location: &str) -> Result<Self, OptimizeError> {
        let url = Url::parse(location).map_err(|e| OptimizeError::InvalidUrl(format!("{location}: {e}")))?;
        if !url.origin().is_tuple() {
            return Err(OptimizeError::InvalidUrl(format!("{location}: opaque origin")));
        }
        let origin = Url::parse(&url.origin().ascii_serialization())
            .map_err(|e| OptimizeError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            path: url.path().to_string(),
        })
    }
}

/// Bundle of every port the optimizer drives.
pub struct Environment {
    /// Durable storage.
    pub store: Box<dyn KeyValueStore>,
    /// The current document.
    pub document: Box<dyn Document>,
    /// Directive capability detection.
    pub probe: Box<dyn CapabilityProbe>,
    /// Router cache warming.
    pub navigation: Box<dyn NavigationLayer>,
    /// Telemetry tagging.
    pub telemetry: Box<dyn TelemetrySink>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}
