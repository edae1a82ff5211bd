//! Cross-tab synchronizer — mirrors mode changes made in other contexts.
//!
//! Browsers deliver `storage` notifications only to contexts other than
//! the writer, and mirroring never writes back, so two tabs cannot
//! ping-pong each other.

use crate::mode::OptimizationMode;
use crate::ports::StorageChange;

/// Filter for storage notifications about the persisted mode record.
#[derive(Debug, Clone)]
pub struct CrossTabSync {
    storage_key: String,
}

impl CrossTabSync {
    /// Filter for `storage_key`.
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }

    /// The mode another context wrote, if `change` is about our key and
    /// carries a recognized value.
    ///
    /// Removals, clears and unrecognized values are ignored.
    pub fn mode_from(&self, change: &StorageChange) -> Option<OptimizationMode> {
        if change.key.as_deref() != Some(self.storage_key.as_str()) {
            return None;
        }
        let value = change.new_value.as_deref()?;
        let mode = OptimizationMode::parse(value);
        if mode.is_none() {
            tracing::debug!(value, "ignoring unrecognized mode from another context");
        }
        mode
    }
}
