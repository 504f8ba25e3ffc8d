//! Library store service - the single source of truth for the four
//! replicated collections (categories, entries, workout sessions, watch
//! time).
//!
//! Every mutation is optimistic: the in-memory collection is recomputed and
//! applied synchronously, then the corresponding gateway write is issued.
//! The returned future resolves with the outcome of persistence only; local
//! reads observe the new state as soon as the method has been entered, and
//! local state is not rolled back when a write fails.
//!
//! Remote snapshots delivered through the gateway subscriptions replace
//! collection state wholesale (last-snapshot-wins). A snapshot racing a
//! not-yet-persisted local mutation can therefore be overwritten by the
//! mutation's own write, and vice versa; the integration tests pin this
//! behavior down rather than papering over it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::{Mutex, RwLock};
use repflow_domain::utils::youtube::extract_video_id;
use repflow_domain::{
    Category, Entry, EntryKind, EntryPatch, RepFlowError, Result, SessionDraft, SessionPatch,
    WatchTimeMap, WorkoutSession,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ports::{CollectionGateway, DocumentGateway};

const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway handles for the four replicated collections.
#[derive(Clone)]
pub struct LibraryGateways {
    pub categories: Arc<dyn CollectionGateway<Category>>,
    pub entries: Arc<dyn CollectionGateway<Entry>>,
    pub sessions: Arc<dyn CollectionGateway<WorkoutSession>>,
    pub watch_time: Arc<dyn DocumentGateway<WatchTimeMap>>,
}

#[derive(Default)]
struct LibraryState {
    categories: Vec<Category>,
    entries: Vec<Entry>,
    sessions: Vec<WorkoutSession>,
    watch_time: WatchTimeMap,
}

/// The domain store.
///
/// Constructed once at application start, handed by reference to consumers,
/// with an explicit [`start`](Self::start) / [`stop`](Self::stop) lifecycle
/// around the gateway subscriptions.
pub struct LibraryService {
    gateways: LibraryGateways,
    state: Arc<RwLock<LibraryState>>,
    loading: Arc<AtomicBool>,
    cancellation: Mutex<CancellationToken>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
    join_timeout: Duration,
}

impl LibraryService {
    /// Create a new store over the given gateways. No subscription is
    /// opened until [`start`](Self::start).
    pub fn new(gateways: LibraryGateways) -> Self {
        Self {
            gateways,
            state: Arc::new(RwLock::new(LibraryState::default())),
            loading: Arc::new(AtomicBool::new(true)),
            cancellation: Mutex::new(CancellationToken::new()),
            listeners: Mutex::new(Vec::new()),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }

    /// Override the join timeout used when stopping listeners.
    #[must_use]
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open the four gateway subscriptions and spawn their listener tasks.
    ///
    /// The loading flag clears once the categories stream delivers its
    /// first snapshot; the other streams do not block it.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the store is already started.
    pub fn start(&self) -> Result<()> {
        let mut listeners = self.listeners.lock();
        if !listeners.is_empty() {
            return Err(RepFlowError::Internal("library store already started".to_string()));
        }

        info!("Starting library store subscriptions");

        let cancel = CancellationToken::new();
        *self.cancellation.lock() = cancel.clone();

        let state = Arc::clone(&self.state);
        let loading = Arc::clone(&self.loading);
        let rx = self.gateways.categories.subscribe();
        listeners.push(tokio::spawn(run_listener(
            "categories",
            rx,
            cancel.clone(),
            move |mut categories: Vec<Category>| {
                sort_by_position(&mut categories, |c| c.order, |c| c.created_at);
                state.write().categories = categories;
                if loading.swap(false, Ordering::SeqCst) {
                    debug!("initial category snapshot applied");
                }
            },
        )));

        let state = Arc::clone(&self.state);
        let rx = self.gateways.entries.subscribe();
        listeners.push(tokio::spawn(run_listener(
            "entries",
            rx,
            cancel.clone(),
            move |mut entries: Vec<Entry>| {
                sort_by_position(&mut entries, |e| e.order, |e| e.created_at);
                state.write().entries = entries;
            },
        )));

        let state = Arc::clone(&self.state);
        let rx = self.gateways.sessions.subscribe();
        listeners.push(tokio::spawn(run_listener(
            "sessions",
            rx,
            cancel.clone(),
            move |sessions: Vec<WorkoutSession>| {
                state.write().sessions = sessions;
            },
        )));

        let state = Arc::clone(&self.state);
        let rx = self.gateways.watch_time.subscribe();
        listeners.push(tokio::spawn(run_listener(
            "watch_time",
            rx,
            cancel,
            move |watch_time: WatchTimeMap| {
                state.write().watch_time = watch_time;
            },
        )));

        Ok(())
    }

    /// Whether the snapshot listeners are active.
    pub fn is_running(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    /// Release all subscriptions and wait for the listener tasks to finish.
    pub async fn stop(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut listeners = self.listeners.lock();
            listeners.drain(..).collect()
        };
        if handles.is_empty() {
            return;
        }

        info!("Stopping library store subscriptions");
        self.cancellation.lock().cancel();

        for handle in handles {
            match tokio::time::timeout(self.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "Snapshot listener panicked"),
                Err(_) => warn!("Snapshot listener did not stop within timeout"),
            }
        }
    }

    // ------------------------------------------------------------------
    // Category mutations
    // ------------------------------------------------------------------

    /// Append a new category at the end of the list.
    ///
    /// # Errors
    ///
    /// `Validation` when the trimmed name is empty; `Persistence` when the
    /// gateway write fails (the local state keeps the new category).
    pub async fn add_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepFlowError::Validation("Category name cannot be empty".to_string()));
        }

        let (category, snapshot) = {
            let mut state = self.state.write();
            let category = Category {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                order: Some(state.categories.len() as u32),
                created_at: Utc::now(),
            };
            state.categories.push(category.clone());
            (category, state.categories.clone())
        };

        debug!(category_id = %category.id, "Adding category");
        self.gateways.categories.save_all(&snapshot).await?;
        Ok(category)
    }

    /// Replace the category list with the caller-supplied sequence,
    /// reassigning `order = index`. The caller provides the complete
    /// desired sequence (e.g. after a drag gesture); no diff is computed.
    pub async fn reorder_categories(&self, sequence: Vec<Category>) -> Result<()> {
        let snapshot = {
            let mut state = self.state.write();
            state.categories = sequence
                .into_iter()
                .enumerate()
                .map(|(index, mut category)| {
                    category.order = Some(index as u32);
                    category
                })
                .collect();
            state.categories.clone()
        };

        self.gateways.categories.save_all(&snapshot).await
    }

    /// Delete a category and every entry it owns.
    ///
    /// Remaining categories keep their order values; `order` is a sort key
    /// tolerant of gaps after deletion.
    pub async fn delete_category(&self, category_id: &str) -> Result<()> {
        let (categories, entries) = {
            let mut state = self.state.write();
            state.categories.retain(|c| c.id != category_id);
            state.entries.retain(|e| e.category_id != category_id);
            (state.categories.clone(), state.entries.clone())
        };

        info!(category_id, "Deleting category and its entries");
        self.gateways.categories.delete_one(category_id).await?;
        self.gateways.categories.save_all(&categories).await?;
        self.gateways.entries.save_all(&entries).await?;
        Ok(())
    }

    /// Rename a category. Unknown ids are a silent no-op.
    pub async fn update_category(&self, category_id: &str, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepFlowError::Validation("Category name cannot be empty".to_string()));
        }

        let snapshot = {
            let mut state = self.state.write();
            for category in &mut state.categories {
                if category.id == category_id {
                    category.name = name.to_string();
                }
            }
            state.categories.clone()
        };

        self.gateways.categories.save_all(&snapshot).await
    }

    // ------------------------------------------------------------------
    // Entry mutations
    // ------------------------------------------------------------------

    /// Add a video entry. The platform video identifier is derived from
    /// `url`; the entry is appended at the end of its category.
    ///
    /// # Errors
    ///
    /// `Validation` when a required field is blank or no 11-character video
    /// identifier can be extracted from `url`.
    pub async fn add_video(
        &self,
        title: &str,
        url: &str,
        category_id: &str,
        notes: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Entry> {
        let title = title.trim();
        if title.is_empty() || url.trim().is_empty() || category_id.is_empty() {
            return Err(RepFlowError::Validation(
                "Title, URL and category are required".to_string(),
            ));
        }
        let video_id = extract_video_id(url)
            .ok_or_else(|| RepFlowError::Validation("Invalid YouTube URL".to_string()))?;

        let kind = EntryKind::Video {
            url: url.to_string(),
            video_id,
            notes: trimmed_optional(notes),
        };
        let entry = self.push_entry(title, category_id, image_url, kind).await?;
        Ok(entry)
    }

    /// Add a note-only entry. Notes text is required.
    pub async fn add_note(
        &self,
        title: &str,
        category_id: &str,
        notes: &str,
        image_url: Option<&str>,
    ) -> Result<Entry> {
        let title = title.trim();
        let notes = notes.trim();
        if title.is_empty() || category_id.is_empty() || notes.is_empty() {
            return Err(RepFlowError::Validation(
                "Title, category and notes are required".to_string(),
            ));
        }

        let kind = EntryKind::Note { notes: notes.to_string() };
        let entry = self.push_entry(title, category_id, image_url, kind).await?;
        Ok(entry)
    }

    async fn push_entry(
        &self,
        title: &str,
        category_id: &str,
        image_url: Option<&str>,
        kind: EntryKind,
    ) -> Result<Entry> {
        let (entry, snapshot) = {
            let mut state = self.state.write();
            let order = state.entries.iter().filter(|e| e.category_id == category_id).count();
            let entry = Entry {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                category_id: category_id.to_string(),
                order: Some(order as u32),
                created_at: Utc::now(),
                image_url: trimmed_optional(image_url),
                kind,
            };
            state.entries.push(entry.clone());
            (entry, state.entries.clone())
        };

        debug!(entry_id = %entry.id, category_id = %entry.category_id, "Adding entry");
        self.gateways.entries.save_all(&snapshot).await?;
        Ok(entry)
    }

    /// Replace one category's entry sequence, reassigning `order = index`
    /// within it. Entries of all other categories are untouched.
    pub async fn reorder_entries(&self, category_id: &str, sequence: Vec<Entry>) -> Result<()> {
        let snapshot = {
            let mut state = self.state.write();
            let mut merged: Vec<Entry> =
                state.entries.iter().filter(|e| e.category_id != category_id).cloned().collect();
            merged.extend(sequence.into_iter().enumerate().map(|(index, mut entry)| {
                entry.order = Some(index as u32);
                entry
            }));
            state.entries = merged;
            state.entries.clone()
        };

        self.gateways.entries.save_all(&snapshot).await
    }

    /// Delete a single entry. Remaining orders are not renumbered.
    pub async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        {
            let mut state = self.state.write();
            state.entries.retain(|e| e.id != entry_id);
        }

        debug!(entry_id, "Deleting entry");
        self.gateways.entries.delete_one(entry_id).await
    }

    /// Shallow-merge a partial update into an entry. Unknown ids are a
    /// silent no-op; an empty patch changes nothing observable.
    ///
    /// A patch carrying `url` re-derives the video identifier and only
    /// applies to video entries.
    pub async fn update_entry(&self, entry_id: &str, patch: EntryPatch) -> Result<()> {
        // Validate the URL before touching state so a failure is side-effect
        // free.
        let new_source = match patch.url.as_deref() {
            Some(url) => {
                let video_id = extract_video_id(url)
                    .ok_or_else(|| RepFlowError::Validation("Invalid YouTube URL".to_string()))?;
                Some((url.to_string(), video_id))
            }
            None => None,
        };

        let snapshot = {
            let mut state = self.state.write();
            for entry in &mut state.entries {
                if entry.id != entry_id {
                    continue;
                }
                if let Some(title) = &patch.title {
                    entry.title = title.trim().to_string();
                }
                if let Some(category_id) = &patch.category_id {
                    entry.category_id = category_id.clone();
                }
                if let Some(image_url) = &patch.image_url {
                    entry.image_url = Some(image_url.trim().to_string());
                }
                match &mut entry.kind {
                    EntryKind::Video { url, video_id, notes } => {
                        if let Some((new_url, new_id)) = &new_source {
                            *url = new_url.clone();
                            *video_id = new_id.clone();
                        }
                        if let Some(new_notes) = &patch.notes {
                            *notes = Some(new_notes.trim().to_string());
                        }
                    }
                    EntryKind::Note { notes } => {
                        if let Some(new_notes) = &patch.notes {
                            *notes = new_notes.trim().to_string();
                        }
                    }
                }
            }
            state.entries.clone()
        };

        self.gateways.entries.save_all(&snapshot).await
    }

    // ------------------------------------------------------------------
    // Watch time
    // ------------------------------------------------------------------

    /// Add elapsed seconds to an entry's cumulative watch time and persist
    /// the whole map.
    pub async fn add_watch_time(&self, entry_id: &str, seconds: u64) -> Result<()> {
        let snapshot = {
            let mut state = self.state.write();
            state.watch_time.add(entry_id, seconds);
            state.watch_time.clone()
        };

        debug!(entry_id, seconds, "Recording watch time");
        self.gateways.watch_time.save(&snapshot).await
    }

    /// Replace the whole watch-time map.
    pub async fn set_watch_time(&self, map: WatchTimeMap) -> Result<()> {
        {
            let mut state = self.state.write();
            state.watch_time = map.clone();
        }

        self.gateways.watch_time.save(&map).await
    }

    // ------------------------------------------------------------------
    // Workout sessions
    // ------------------------------------------------------------------

    /// Schedule a new workout session.
    ///
    /// # Errors
    ///
    /// `Validation` when the referenced category set is empty.
    pub async fn add_session(&self, draft: SessionDraft) -> Result<WorkoutSession> {
        if draft.category_ids.is_empty() {
            return Err(RepFlowError::Validation(
                "A session must reference at least one category".to_string(),
            ));
        }

        let (session, snapshot) = {
            let mut state = self.state.write();
            let session = WorkoutSession {
                id: Uuid::new_v4().to_string(),
                date: draft.date,
                time: draft.time,
                category_ids: draft.category_ids,
                notes: trimmed_optional(draft.notes.as_deref()),
                completed: draft.completed,
                created_at: Utc::now(),
            };
            state.sessions.push(session.clone());
            (session, state.sessions.clone())
        };

        debug!(session_id = %session.id, date = %session.date, "Adding workout session");
        self.gateways.sessions.save_all(&snapshot).await?;
        Ok(session)
    }

    /// Shallow-merge a partial update into a session. Unknown ids are a
    /// silent no-op.
    ///
    /// # Errors
    ///
    /// `Validation` when the patch replaces the category set with an empty
    /// one.
    pub async fn update_session(&self, session_id: &str, patch: SessionPatch) -> Result<()> {
        if matches!(&patch.category_ids, Some(ids) if ids.is_empty()) {
            return Err(RepFlowError::Validation(
                "A session must reference at least one category".to_string(),
            ));
        }

        let snapshot = {
            let mut state = self.state.write();
            for session in &mut state.sessions {
                if session.id != session_id {
                    continue;
                }
                if let Some(date) = patch.date {
                    session.date = date;
                }
                if let Some(time) = patch.time {
                    session.time = time;
                }
                if let Some(category_ids) = &patch.category_ids {
                    session.category_ids = category_ids.clone();
                }
                if let Some(notes) = &patch.notes {
                    session.notes = Some(notes.trim().to_string());
                }
                if let Some(completed) = patch.completed {
                    session.completed = completed;
                }
            }
            state.sessions.clone()
        };

        self.gateways.sessions.save_all(&snapshot).await
    }

    /// Delete a single session.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        {
            let mut state = self.state.write();
            state.sessions.retain(|s| s.id != session_id);
        }

        debug!(session_id, "Deleting workout session");
        self.gateways.sessions.delete_one(session_id).await
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// True until the categories stream has delivered its first snapshot.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.state.read().categories.clone()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.state.read().entries.clone()
    }

    pub fn sessions(&self) -> Vec<WorkoutSession> {
        self.state.read().sessions.clone()
    }

    pub fn watch_time(&self) -> WatchTimeMap {
        self.state.read().watch_time.clone()
    }

    /// One category's entries, sorted by order ascending with a creation
    /// timestamp fallback for legacy records lacking an order.
    pub fn entries_for_category(&self, category_id: &str) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .state
            .read()
            .entries
            .iter()
            .filter(|e| e.category_id == category_id)
            .cloned()
            .collect();
        sort_by_position(&mut entries, |e| e.order, |e| e.created_at);
        entries
    }

    /// Sum of recorded watch time over the entries currently owned by a
    /// category; entries absent from the map count as zero.
    pub fn total_watch_time(&self, category_id: &str) -> u64 {
        let state = self.state.read();
        state
            .entries
            .iter()
            .filter(|e| e.category_id == category_id)
            .map(|e| state.watch_time.seconds_for(&e.id))
            .sum()
    }

    pub fn entry_by_id(&self, entry_id: &str) -> Option<Entry> {
        self.state.read().entries.iter().find(|e| e.id == entry_id).cloned()
    }

    pub fn category_by_id(&self, category_id: &str) -> Option<Category> {
        self.state.read().categories.iter().find(|c| c.id == category_id).cloned()
    }

    /// Sessions scheduled on the given calendar date.
    pub fn sessions_for_date(&self, date: NaiveDate) -> Vec<WorkoutSession> {
        self.state.read().sessions.iter().filter(|s| s.date == date).cloned().collect()
    }
}

impl Drop for LibraryService {
    fn drop(&mut self) {
        if !self.listeners.lock().is_empty() {
            warn!("LibraryService dropped while running; cancelling subscriptions");
            self.cancellation.lock().cancel();
        }
    }
}

/// Consume one snapshot stream until cancellation or channel close.
async fn run_listener<M, F>(
    stream: &'static str,
    mut rx: UnboundedReceiver<M>,
    cancel: CancellationToken,
    mut apply: F,
) where
    M: Send + 'static,
    F: FnMut(M) + Send + 'static,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(stream, "snapshot listener cancelled");
                break;
            }
            snapshot = rx.recv() => {
                match snapshot {
                    Some(snapshot) => apply(snapshot),
                    None => {
                        debug!(stream, "snapshot stream closed");
                        break;
                    }
                }
            }
        }
    }
}

/// Stable sort by explicit position; records without one go last, ordered
/// by creation time.
fn sort_by_position<T>(
    items: &mut [T],
    position: impl Fn(&T) -> Option<u32>,
    created: impl Fn(&T) -> DateTime<Utc>,
) {
    items.sort_by_key(|item| (position(item).unwrap_or(u32::MAX), created(item)));
}

fn trimmed_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(std::string::ToString::to_string)
}
