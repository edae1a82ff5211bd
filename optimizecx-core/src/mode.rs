//! Optimization modes — the four speculative-navigation strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::OptimizeError;

/// Strategy a page view operates under. Exactly one is active at a time.
///
/// The textual form (`"none"`, `"prefetch"`, `"preload"`, `"prerender"`)
/// is what the override parameter carries and what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    /// No speculation at all.
    #[default]
    None,
    /// Declarative prefetch rules, moderate eagerness.
    Prefetch,
    /// Procedural preload hints for every internal link on the page.
    Preload,
    /// Declarative prerender rules, immediate eagerness.
    Prerender,
}

impl OptimizationMode {
    /// All modes in declaration order.
    pub const ALL: [OptimizationMode; 4] = [
        OptimizationMode::None,
        OptimizationMode::Prefetch,
        OptimizationMode::Preload,
        OptimizationMode::Prerender,
    ];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationMode::None => "none",
            OptimizationMode::Prefetch => "prefetch",
            OptimizationMode::Preload => "preload",
            OptimizationMode::Prerender => "prerender",
        }
    }

    /// Lenient parse: `None` for anything that is not an exact mode name.
    ///
    /// Matching is case-sensitive, as persisted values and query
    /// parameters are always written in lowercase.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }

    /// Mode for the `run`-th load-test iteration, rotating through
    /// [`ALL`](Self::ALL).
    pub fn for_run(run: u64) -> Self {
        Self::ALL[(run % Self::ALL.len() as u64) as usize]
    }

    /// Capitalized display name (`"Prefetch"`).
    pub fn title(self) -> &'static str {
        match self {
            OptimizationMode::None => "None",
            OptimizationMode::Prefetch => "Prefetch",
            OptimizationMode::Preload => "Preload",
            OptimizationMode::Prerender => "Prerender",
        }
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationMode {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| OptimizeError::UnknownMode(s.to_string()))
    }
}
