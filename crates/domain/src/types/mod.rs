//! Domain types and models

pub mod stats;

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// Re-export stats types for convenience
pub use stats::{CategoryTally, CompletionStats, PeriodTally, Suggestion, SuggestionKind};

/// A user-defined workout category (e.g. "Legs", "Mobility").
///
/// Categories form an ordered list. `order` is dense `0..N-1` after adds and
/// reorders; deletion leaves gaps, so readers treat it purely as a sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Position within the category list. Absent on legacy records; readers
    /// fall back to `created_at` ordering.
    #[serde(default)]
    pub order: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// A library entry owned by a category: an embedded workout video or a
/// standalone note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub category_id: String,
    /// Position within the owning category, independent of other categories.
    #[serde(default)]
    pub order: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

/// Variant-specific entry payload.
///
/// A note without text or a video without a source URL is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    Video {
        url: String,
        /// 11-character platform identifier derived from `url`.
        video_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    Note {
        notes: String,
    },
}

impl Entry {
    /// Whether this entry is a standalone note (no video attached).
    #[must_use]
    pub fn is_note_only(&self) -> bool {
        matches!(self.kind, EntryKind::Note { .. })
    }

    /// Platform video identifier, `None` for notes.
    #[must_use]
    pub fn video_id(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Video { video_id, .. } => Some(video_id),
            EntryKind::Note { .. } => None,
        }
    }

    /// Source URL, `None` for notes.
    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Video { url, .. } => Some(url),
            EntryKind::Note { .. } => None,
        }
    }

    /// Free-text notes; always present for note entries.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Video { notes, .. } => notes.as_deref(),
            EntryKind::Note { notes } => Some(notes),
        }
    }
}

/// Partial update for an entry. Absent fields leave the entry unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// New source URL for video entries; the video identifier is re-derived
    /// from it. Ignored for note entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl EntryPatch {
    /// True when the patch carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category_id.is_none()
            && self.notes.is_none()
            && self.image_url.is_none()
            && self.url.is_none()
    }
}

/// Cumulative watch time per entry, in whole seconds.
///
/// Entries with no recorded time are treated as zero; note entries never
/// appear in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchTimeMap(HashMap<String, u64>);

impl WatchTimeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded seconds for an entry; zero when absent.
    #[must_use]
    pub fn seconds_for(&self, entry_id: &str) -> u64 {
        self.0.get(entry_id).copied().unwrap_or(0)
    }

    /// Increment an entry's watch time, saturating on overflow.
    pub fn add(&mut self, entry_id: &str, seconds: u64) {
        let slot = self.0.entry(entry_id.to_string()).or_insert(0);
        *slot = slot.saturating_add(seconds);
    }

    /// Replace an entry's recorded time outright.
    pub fn set(&mut self, entry_id: &str, seconds: u64) {
        self.0.insert(entry_id.to_string(), seconds);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }
}

impl From<HashMap<String, u64>> for WatchTimeMap {
    fn from(map: HashMap<String, u64>) -> Self {
        Self(map)
    }
}

/// A scheduled workout session on the planning calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Referenced categories; non-empty at creation and on any update that
    /// replaces it. Deleting a category does not remove its id from
    /// existing sessions.
    pub category_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for a workout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub category_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Partial update for a workout session. Absent fields leave the session
/// unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}
