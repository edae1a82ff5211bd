//! Optimizer runtime — drives every component from discrete events.
//!
//! ## Event flow
//! ```text
//! Navigated{page, signal} ──▶ resolver.on_override ─┐
//! StorageChanged(change)  ──▶ cross_tab → adopt ────┤
//!                                                   ▼
//!                                   broadcaster.publish(settings)
//!                                                   │
//!                    (hydrated, mode) changed? ─────┼──▶ directive sync
//!              (hydrated, mode, path) changed? ─────┴──▶ preload rebuild
//! ```
//! Resolution always completes before either reconciler observes a mode,
//! and both reconcilers are gated on `has_hydrated`.
//!
//! [`SpeculationRuntime`] owns the storage subscription. It is installed
//! once at mount and removed exactly once when the runtime is dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::config::SpeculationConfig;
use crate::cross_tab::CrossTabSync;
use crate::directive::{DirectiveOutcome, DirectiveSynchronizer};
use crate::overrides::OverrideSignal;
use crate::ports::{Environment, PageContext, StorageChange, StorageEvents, Subscription};
use crate::preload::{PreloadOutcome, PreloadReconciler};
use crate::resolver::{ModeResolver, Resolution, ResolverState};
use crate::settings::{SettingsBroadcaster, SettingsReader, SpeculationSettings};

/// Input to the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizerEvent {
    /// A page view: initial load or in-app route change.
    Navigated {
        /// Where the page lives.
        page: PageContext,
        /// Override carried by this navigation's query string.
        signal: OverrideSignal,
    },
    /// Another browsing context changed durable storage.
    StorageChanged(StorageChange),
}

/// What one event caused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PassReport {
    /// Resolution pass, if one ran.
    pub resolution: Option<Resolution>,
    /// Directive sync, if it ran.
    pub directive: Option<DirectiveOutcome>,
    /// Preload rebuild, if it ran.
    pub preload: Option<PreloadOutcome>,
}

/// The whole optimizer for one document lifetime.
#[derive(Debug)]
pub struct SpeculationOptimizer {
    env: Environment,
    resolver: ModeResolver,
    directives: DirectiveSynchronizer,
    preload: PreloadReconciler,
    cross_tab: CrossTabSync,
    broadcaster: SettingsBroadcaster,
    page: Option<PageContext>,
    directive_seen: Option<SpeculationSettings>,
    preload_seen: Option<(SpeculationSettings, String)>,
}

impl SpeculationOptimizer {
    /// Optimizer over `env`, not yet hydrated.
    pub fn new(config: SpeculationConfig, env: Environment) -> Self {
        Self {
            env,
            resolver: ModeResolver::new(config.storage_key.clone()),
            preload: PreloadReconciler::new(&config),
            cross_tab: CrossTabSync::new(config.storage_key.clone()),
            directives: DirectiveSynchronizer::new(config),
            broadcaster: SettingsBroadcaster::new(),
            page: None,
            directive_seen: None,
            preload_seen: None,
        }
    }

    /// Read-only handle on the published settings.
    pub fn settings(&self) -> SettingsReader {
        self.broadcaster.reader()
    }

    /// Current published settings.
    pub fn current(&self) -> Rc<SpeculationSettings> {
        self.broadcaster.current()
    }

    /// Resolver lifecycle state.
    pub fn state(&self) -> ResolverState {
        self.resolver.state()
    }

    /// Process one event to completion.
    pub fn handle(&mut self, event: OptimizerEvent) -> PassReport {
        let mut report = PassReport::default();

        match event {
            OptimizerEvent::Navigated { page, signal } => {
                report.resolution = self.resolver.on_override(&signal, self.env.store.as_mut());
                self.page = Some(page);
            }
            OptimizerEvent::StorageChanged(change) => {
                let Some(mode) = self.cross_tab.mode_from(&change) else {
                    return report;
                };
                if !self.resolver.adopt(mode) {
                    return report;
                }
            }
        }

        let settings = self.resolver.settings();
        self.broadcaster.publish(settings);

        if self.directive_seen != Some(settings) {
            self.directive_seen = Some(settings);
            report.directive = Some(self.directives.sync(
                settings,
                self.env.document.as_mut(),
                self.env.probe.as_ref(),
                self.env.telemetry.as_ref(),
            ));
        }

        if let Some(page) = &self.page {
            let key = (settings, page.path.clone());
            if self.preload_seen.as_ref() != Some(&key) {
                report.preload = Some(self.preload.reconcile(
                    settings,
                    page,
                    self.env.document.as_mut(),
                    self.env.navigation.as_ref(),
                ));
                self.preload_seen = Some(key);
            }
        }

        report
    }

    /// Convenience for [`OptimizerEvent::Navigated`].
    pub fn navigate(&mut self, page: PageContext, signal: OverrideSignal) -> PassReport {
        self.handle(OptimizerEvent::Navigated { page, signal })
    }
}

type Inbox = Rc<RefCell<VecDeque<StorageChange>>>;

/// A mounted optimizer with its storage subscription.
///
/// Dropping the runtime unsubscribes first, then tears down the
/// optimizer; outstanding [`SettingsReader`]s fall back to defaults.
///
/// Settings queries go through a reader taken at mount and never touch
/// the optimizer cell, so host callbacks invoked mid-pass may read them.
pub struct SpeculationRuntime {
    subscription: Subscription,
    inbox: Inbox,
    optimizer: Rc<RefCell<SpeculationOptimizer>>,
    reader: SettingsReader,
}

impl SpeculationRuntime {
    /// Mount `optimizer` and subscribe it to `events`.
    pub fn mount(optimizer: SpeculationOptimizer, events: &dyn StorageEvents) -> Self {
        let reader = optimizer.settings();
        let optimizer = Rc::new(RefCell::new(optimizer));
        let inbox: Inbox = Rc::default();

        let weak = Rc::downgrade(&optimizer);
        let queued = Rc::clone(&inbox);
        let subscription = events.subscribe(Box::new(move |change| {
            queued.borrow_mut().push_back(change);
            deliver(&weak, &queued);
        }));
        tracing::debug!("speculation runtime mounted");

        Self {
            subscription,
            inbox,
            optimizer,
            reader,
        }
    }

    /// Feed a navigation through the optimizer.
    pub fn navigate(&self, page: PageContext, signal: OverrideSignal) -> PassReport {
        let report = self.optimizer.borrow_mut().navigate(page, signal);
        deliver(&Rc::downgrade(&self.optimizer), &self.inbox);
        report
    }

    /// Read-only settings handle, valid for the runtime's lifetime.
    pub fn settings(&self) -> SettingsReader {
        self.reader.clone()
    }

    /// Current published settings.
    pub fn current(&self) -> Rc<SpeculationSettings> {
        self.reader.get()
    }
}

impl std::fmt::Debug for SpeculationRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeculationRuntime")
            .field("subscription", &self.subscription)
            .field("pending", &self.inbox.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Drain queued storage changes into the optimizer if it is not already
/// mid-pass; a busy optimizer picks them up at the end of its pass.
fn deliver(optimizer: &Weak<RefCell<SpeculationOptimizer>>, inbox: &RefCell<VecDeque<StorageChange>>) {
    let Some(optimizer) = optimizer.upgrade() else {
        inbox.borrow_mut().clear();
        return;
    };
    let Ok(mut optimizer) = optimizer.try_borrow_mut() else {
        return;
    };
    loop {
        let next = inbox.borrow_mut().pop_front();
        match next {
            Some(change) => {
                optimizer.handle(OptimizerEvent::StorageChanged(change));
            }
            None => break,
        }
    }
}
