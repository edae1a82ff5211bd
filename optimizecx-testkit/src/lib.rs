//! In-memory ports for OptimizeCX contract tests.
//!
//! Every fake is a cheap `Clone` handle over shared state: hand one clone
//! to the optimizer's [`Environment`] and keep another to inspect what
//! happened. [`SharedStorage`] models one origin's `localStorage` seen
//! from several tabs, including `storage` notifications that reach every
//! context except the writer.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use optimizecx_core::errors::OptimizeError;
use optimizecx_core::ports::{
    CapabilityProbe, Document, Environment, KeyValueStore, NavigationLayer, PageContext, PreloadHint,
    StorageChange, StorageEvents, StorageListener, Subscription, TelemetrySink,
};
use optimizecx_core::{OverrideSignal, SpeculationConfig, SpeculationOptimizer, SpeculationRuntime};

/// Origin every fixture page lives on.
pub const ORIGIN: &str = "https://shop.example";

/// Page context for `path` on [`ORIGIN`].
pub fn page(path: &str) -> PageContext {
    PageContext::from_location(&format!("{ORIGIN}{path}")).expect("fixture origin is valid")
}

/// Override signal parsed from `query` with the default config.
pub fn signal(query: &str) -> OverrideSignal {
    OverrideSignal::from_query(query, &SpeculationConfig::default())
}

// ── Storage ─────────────────────────────────────────────────────────────

struct Listener {
    id: u64,
    context: u64,
    callback: Rc<RefCell<StorageListener>>,
}

#[derive(Default)]
struct StorageState {
    values: BTreeMap<String, String>,
    listeners: Vec<Listener>,
    next_id: u64,
    writes: usize,
    subscribes: usize,
    unsubscribes: usize,
    fail_writes: bool,
}

/// One origin's durable storage, shared by every [`StorageContext`].
#[derive(Clone, Default)]
pub struct SharedStorage {
    state: Rc<RefCell<StorageState>>,
}

impl SharedStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new browsing context (tab) viewing this storage.
    pub fn context(&self) -> StorageContext {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        StorageContext {
            id: state.next_id,
            state: Rc::clone(&self.state),
        }
    }

    /// Current value of `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.state.borrow().values.get(key).cloned()
    }

    /// Seed `key` without counting a write or notifying anyone.
    pub fn seed(&self, key: &str, value: &str) {
        self.state.borrow_mut().values.insert(key.into(), value.into());
    }

    /// Successful writes across all contexts.
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    /// Listeners currently installed.
    pub fn active_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Total `(subscribe, unsubscribe)` calls.
    pub fn subscription_counts(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.subscribes, state.unsubscribes)
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

/// One tab's view of [`SharedStorage`].
#[derive(Clone)]
pub struct StorageContext {
    id: u64,
    state: Rc<RefCell<StorageState>>,
}

impl KeyValueStore for StorageContext {
    fn get(&self, key: &str) -> Result<Option<String>, OptimizeError> {
        Ok(self.state.borrow().values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), OptimizeError> {
        let targets: Vec<_> = {
            let mut state = self.state.borrow_mut();
            if state.fail_writes {
                return Err(OptimizeError::Storage("QuotaExceededError".into()));
            }
            state.writes += 1;
            state.values.insert(key.into(), value.into());
            state
                .listeners
                .iter()
                .filter(|l| l.context != self.id)
                .map(|l| Rc::clone(&l.callback))
                .collect()
        };
        for callback in targets {
            let change = StorageChange {
                key: Some(key.into()),
                new_value: Some(value.into()),
            };
            let mut callback = callback.borrow_mut();
            (*callback)(change);
        }
        Ok(())
    }
}

impl StorageEvents for StorageContext {
    fn subscribe(&self, listener: StorageListener) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            state.subscribes += 1;
            let id = state.next_id;
            state.listeners.push(Listener {
                id,
                context: self.id,
                callback: Rc::new(RefCell::new(listener)),
            });
            id
        };
        let weak: Weak<RefCell<StorageState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                let mut state = state.borrow_mut();
                state.unsubscribes += 1;
                state.listeners.retain(|l| l.id != id);
            }
        })
    }
}

// ── Document ────────────────────────────────────────────────────────────

/// A `<script>` node in the fake head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNode {
    /// `id` attribute.
    pub id: String,
    /// `type` attribute.
    pub script_type: String,
    /// Text content.
    pub text: String,
}

#[derive(Default)]
struct DocumentState {
    scripts: Vec<ScriptNode>,
    tagged: Vec<(String, PreloadHint)>,
    anchors: Vec<String>,
    mutations: usize,
    fail_mutations: bool,
    fail_scan: bool,
}

/// Recording document: head scripts, tagged hints, body anchors.
#[derive(Clone, Default)]
pub struct FakeDocument {
    state: Rc<RefCell<DocumentState>>,
}

impl FakeDocument {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the body's anchors (simulates a page change).
    pub fn set_anchors<I, S>(&self, hrefs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.borrow_mut().anchors = hrefs.into_iter().map(Into::into).collect();
    }

    /// Head scripts in document order.
    pub fn scripts(&self) -> Vec<ScriptNode> {
        self.state.borrow().scripts.clone()
    }

    /// Script with `id`, if present.
    pub fn script(&self, id: &str) -> Option<ScriptNode> {
        self.state.borrow().scripts.iter().find(|s| s.id == id).cloned()
    }

    /// Hints carrying `attribute`, in document order.
    pub fn hints(&self, attribute: &str) -> Vec<PreloadHint> {
        self.state
            .borrow()
            .tagged
            .iter()
            .filter(|(attr, _)| attr == attribute)
            .map(|(_, hint)| hint.clone())
            .collect()
    }

    /// Successful head mutations so far.
    pub fn mutations(&self) -> usize {
        self.state.borrow().mutations
    }

    /// Make every subsequent mutation fail.
    pub fn fail_mutations(&self, fail: bool) {
        self.state.borrow_mut().fail_mutations = fail;
    }

    /// Make anchor scanning fail.
    pub fn fail_scan(&self, fail: bool) {
        self.state.borrow_mut().fail_scan = fail;
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut DocumentState) -> T) -> Result<T, OptimizeError> {
        let mut state = self.state.borrow_mut();
        if state.fail_mutations {
            return Err(OptimizeError::Document("NoModificationAllowedError".into()));
        }
        state.mutations += 1;
        Ok(f(&mut state))
    }
}

impl Document for FakeDocument {
    fn script_text(&self, id: &str) -> Result<Option<String>, OptimizeError> {
        Ok(self.script(id).map(|s| s.text))
    }

    fn set_script_text(&mut self, id: &str, text: &str) -> Result<(), OptimizeError> {
        self.mutate(|state| {
            if let Some(script) = state.scripts.iter_mut().find(|s| s.id == id) {
                script.text = text.into();
            }
        })
    }

    fn append_script(&mut self, id: &str, script_type: &str, text: &str) -> Result<(), OptimizeError> {
        self.mutate(|state| {
            state.scripts.push(ScriptNode {
                id: id.into(),
                script_type: script_type.into(),
                text: text.into(),
            });
        })
    }

    fn remove_script(&mut self, id: &str) -> Result<(), OptimizeError> {
        if self.script(id).is_none() {
            return Ok(());
        }
        self.mutate(|state| state.scripts.retain(|s| s.id != id))
    }

    fn remove_tagged(&mut self, attribute: &str) -> Result<usize, OptimizeError> {
        let present = self.hints(attribute).len();
        if present == 0 {
            return Ok(0);
        }
        self.mutate(|state| {
            state.tagged.retain(|(attr, _)| attr != attribute);
            present
        })
    }

    fn append_hint(&mut self, attribute: &str, hint: &PreloadHint) -> Result<(), OptimizeError> {
        self.mutate(|state| state.tagged.push((attribute.into(), hint.clone())))
    }

    fn anchor_hrefs(&self) -> Result<Vec<String>, OptimizeError> {
        let state = self.state.borrow();
        if state.fail_scan {
            return Err(OptimizeError::Document("SecurityError".into()));
        }
        Ok(state.anchors.clone())
    }
}

// ── Capability / navigation / telemetry ─────────────────────────────────

/// Capability probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub enum FakeProbe {
    /// Everything supported.
    Supported,
    /// Nothing supported.
    Unsupported,
    /// Detection throws.
    Broken,
}

impl CapabilityProbe for FakeProbe {
    fn supports(&self, _directive_type: &str) -> Result<bool, OptimizeError> {
        match self {
            FakeProbe::Supported => Ok(true),
            FakeProbe::Unsupported => Ok(false),
            FakeProbe::Broken => Err(OptimizeError::Capability("HTMLScriptElement missing".into())),
        }
    }
}

/// Navigation layer recording every warm request.
#[derive(Clone, Default)]
pub struct FakeNavigation {
    warmed: Rc<RefCell<Vec<String>>>,
    reject: Rc<Cell<bool>>,
}

impl FakeNavigation {
    /// Paths warmed so far, in order (including rejected ones).
    pub fn warmed(&self) -> Vec<String> {
        self.warmed.borrow().clone()
    }

    /// Reject every subsequent warm request.
    pub fn reject(&self, reject: bool) {
        self.reject.set(reject);
    }
}

impl NavigationLayer for FakeNavigation {
    fn warm(&self, path: &str) -> Result<(), OptimizeError> {
        self.warmed.borrow_mut().push(path.into());
        if self.reject.get() {
            return Err(OptimizeError::Navigation(format!("prefetch rejected for {path}")));
        }
        Ok(())
    }
}

/// Telemetry sink recording tags.
#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    tags: Rc<RefCell<Vec<(String, String)>>>,
    fail: Rc<Cell<bool>>,
}

impl RecordingTelemetry {
    /// Tags recorded so far, in order.
    pub fn tags(&self) -> Vec<(String, String)> {
        self.tags.borrow().clone()
    }

    /// Make the sink fail (tags are still recorded).
    pub fn fail(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn set_tag(&self, key: &str, value: &str) -> Result<(), OptimizeError> {
        self.tags.borrow_mut().push((key.into(), value.into()));
        if self.fail.get() {
            return Err(OptimizeError::Telemetry("sink offline".into()));
        }
        Ok(())
    }
}

// ── Tabs ────────────────────────────────────────────────────────────────

/// One browsing context: its own document and router, shared storage.
#[derive(Clone)]
pub struct Tab {
    /// This tab's view of origin storage.
    pub storage: StorageContext,
    /// This tab's document.
    pub document: FakeDocument,
    /// This tab's router.
    pub navigation: FakeNavigation,
    /// This tab's telemetry.
    pub telemetry: RecordingTelemetry,
    /// Capability answer for this tab's runtime.
    pub probe: FakeProbe,
}

impl Tab {
    /// New tab on `storage` with a rules-capable runtime.
    pub fn open(storage: &SharedStorage) -> Self {
        Self {
            storage: storage.context(),
            document: FakeDocument::new(),
            navigation: FakeNavigation::default(),
            telemetry: RecordingTelemetry::default(),
            probe: FakeProbe::Supported,
        }
    }

    /// Same tab with a different capability answer.
    pub fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Port bundle backed by this tab's fakes.
    pub fn environment(&self) -> Environment {
        Environment {
            store: Box::new(self.storage.clone()),
            document: Box::new(self.document.clone()),
            probe: Box::new(self.probe),
            navigation: Box::new(self.navigation.clone()),
            telemetry: Box::new(self.telemetry.clone()),
        }
    }

    /// Unmounted optimizer with the default config.
    pub fn optimizer(&self) -> SpeculationOptimizer {
        SpeculationOptimizer::new(SpeculationConfig::default(), self.environment())
    }

    /// Mounted runtime with the default config.
    pub fn mount(&self) -> SpeculationRuntime {
        SpeculationRuntime::mount(self.optimizer(), &self.storage)
    }
}
