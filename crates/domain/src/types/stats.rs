//! Derived statistics and suggestion types

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// Session counts for one calendar window (week, month).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTally {
    pub completed: usize,
    pub total: usize,
}

impl PeriodTally {
    /// Completion percentage rounded to the nearest whole number; zero when
    /// the window holds no sessions.
    #[must_use]
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let rate = (self.completed as f64 / self.total as f64) * 100.0;
        rate.round() as u32
    }
}

/// Aggregated completion counters over the current week and month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub week: PeriodTally,
    pub month: PeriodTally,
    /// All-time completed session count.
    pub total_completed: usize,
}

/// Per-category occurrence counters across all sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub total: usize,
    pub completed: usize,
}

impl CategoryTally {
    /// Completed percentage of all occurrences; zero when the category was
    /// never referenced.
    #[must_use]
    pub fn percent(&self) -> u32 {
        PeriodTally { completed: self.completed, total: self.total }.completion_rate()
    }
}

/// Severity / tone of a smart suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Warning,
    Success,
    Info,
    Motivation,
}

impl_domain_enum_conversions!(SuggestionKind {
    Warning => "warning",
    Success => "success",
    Info => "info",
    Motivation => "motivation",
});

/// A single heuristic suggestion shown on the stats page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub icon: String,
    pub message: String,
}
