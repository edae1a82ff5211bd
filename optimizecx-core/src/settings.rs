//! Settings broadcaster — the read-only `{mode, hydrated}` value.
//!
//! One [`SettingsBroadcaster`] per optimizer lifetime; any number of
//! [`SettingsReader`]s. Readers hold a weak link, so a reader that
//! outlives its broadcaster answers with the conservative default
//! (`none`, not hydrated) instead of failing.
//!
//! The published value is an `Rc` that is only replaced when one of its
//! two fields changes, so consumers can compare by pointer to detect
//! updates.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::mode::OptimizationMode;

/// Resolved optimizer settings as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeculationSettings {
    /// Active mode. Meaningless until `has_hydrated`.
    pub optimization_mode: OptimizationMode,
    /// `true` once the first resolution pass has completed.
    pub has_hydrated: bool,
}

impl SpeculationSettings {
    /// Should ordinary links request eager navigation right now?
    ///
    /// True once hydrated under any mode except `none`. `preload` counts:
    /// its links still get the router's lightweight prefetch even though
    /// no rules node is installed for it.
    pub fn should_prefetch_links(&self) -> bool {
        self.has_hydrated && self.optimization_mode != OptimizationMode::None
    }

    /// Alias used by badge rendering; same predicate as
    /// [`should_prefetch_links`](Self::should_prefetch_links).
    pub fn is_active(&self) -> bool {
        self.should_prefetch_links()
    }

    /// Human label, e.g. `"Optimization: Prefetch"`, or
    /// `"Optimization: ..."` before hydration.
    pub fn label(&self) -> String {
        let mode = if self.has_hydrated {
            self.optimization_mode.title()
        } else {
            "..."
        };
        format!("Optimization: {mode}")
    }
}

type Slot = RefCell<Rc<SpeculationSettings>>;

/// Sole writer of the published settings value.
#[derive(Debug)]
pub struct SettingsBroadcaster {
    slot: Rc<Slot>,
}

impl Default for SettingsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBroadcaster {
    /// Broadcaster publishing the un-hydrated default.
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Rc::new(SpeculationSettings::default()))),
        }
    }

    /// Publish `next`. Returns `true` if the value changed; an equal value
    /// keeps the existing `Rc`.
    pub(crate) fn publish(&self, next: SpeculationSettings) -> bool {
        let mut slot = self.slot.borrow_mut();
        if **slot == next {
            return false;
        }
        *slot = Rc::new(next);
        true
    }

    /// Current value.
    pub fn current(&self) -> Rc<SpeculationSettings> {
        Rc::clone(&self.slot.borrow())
    }

    /// New read-only handle.
    pub fn reader(&self) -> SettingsReader {
        SettingsReader {
            slot: Rc::downgrade(&self.slot),
        }
    }
}

/// Read-only view of a broadcaster's settings.
#[derive(Debug, Clone)]
pub struct SettingsReader {
    slot: Weak<Slot>,
}

impl SettingsReader {
    /// Reader bound to no broadcaster; always answers the default.
    pub fn detached() -> Self {
        Self { slot: Weak::new() }
    }

    /// `true` while the originating broadcaster is alive.
    pub fn is_connected(&self) -> bool {
        self.slot.strong_count() > 0
    }

    /// Current settings, or the conservative default when the
    /// broadcaster is gone (with a diagnostic in debug builds).
    pub fn get(&self) -> Rc<SpeculationSettings> {
        match self.slot.upgrade() {
            Some(slot) => {
                let current = Rc::clone(&slot.borrow());
                current
            }
            None => {
                if cfg!(debug_assertions) {
                    tracing::warn!(
                        "speculation settings read outside an active optimizer; returning default disabled state"
                    );
                }
                Rc::new(SpeculationSettings::default())
            }
        }
    }

    /// Shorthand for `get().should_prefetch_links()`.
    pub fn should_prefetch_links(&self) -> bool {
        self.get().should_prefetch_links()
    }
}
