//! Document session coordination
//!
//! Owns the annotation index for one open document and decides when it is
//! (re)loaded from persistence and when the overlay is (re)applied to the
//! render surface. The surface tears its view down on every navigation and
//! reflow, so the overlay is never trusted as state: it is re-derived from
//! the index each time a fresh view reports ready.
//!
//! # Staleness
//!
//! Every transition out of a live view bumps a generation counter. Work that
//! targets the surface (readiness waits, decoration pushes) captures the
//! generation when it starts and discards itself quietly once superseded, so
//! a rapid second navigation cancels the first one's pending overlay work
//! (last navigation wins) and no decorations land on a view that is already
//! being torn down.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::annotations::{
    AnnotationIndex, Discussion, Highlight, HighlightColor, Note, RangeAnnotations, RangeKey,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::overlay::{plan, plan_all, Decoration, RenderBridge};
use crate::persistence::AnnotationStore;
use crate::surface::{RenderSurface, SurfaceEvent};

/// Where the open document's view is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Displaying,
    /// View torn down for a page turn or jump; a fresh one is on its way
    Navigating,
    /// View torn down for a layout-affecting settings change
    Reflowing,
}

/// Feed for the "sync pending" indicator: failed persistence writes whose
/// local state is still held optimistically in the index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncState {
    #[serde(rename = "pendingWrites")]
    pub pending_writes: usize,
    #[serde(rename = "lastError", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Lifecycle coordinator for one open document.
///
/// All reads and mutations go through this type; no collaborator holds a
/// long-lived reference to the index itself. Surface event handlers are
/// wired once at open and resolve against the index at delivery time via
/// [`handle_event`](Self::handle_event).
pub struct DocumentSession {
    document_id: String,
    config: EngineConfig,
    store: Arc<dyn AnnotationStore>,
    bridge: RenderBridge,
    index: Mutex<AnnotationIndex>,
    state: Mutex<SessionState>,
    generation: AtomicU64,
    index_complete: AtomicBool,
    /// Ranges mutated while no live view could take the update; folded into
    /// the next full overlay pass
    deferred: Mutex<BTreeSet<RangeKey>>,
    sync: Mutex<SyncState>,
}

impl DocumentSession {
    pub fn new(
        document_id: &str,
        config: EngineConfig,
        store: Arc<dyn AnnotationStore>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            document_id: document_id.to_string(),
            config,
            store,
            bridge: RenderBridge::new(surface),
            index: Mutex::new(AnnotationIndex::new()),
            state: Mutex::new(SessionState::Closed),
            generation: AtomicU64::new(0),
            index_complete: AtomicBool::new(false),
            deferred: Mutex::new(BTreeSet::new()),
            sync: Mutex::new(SyncState::default()),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.state() != SessionState::Closed
    }

    /// Current live-surface generation (bumped on open and on every teardown)
    pub fn surface_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.lock().clone()
    }

    /// Open the document: bulk-load the index, wait for the surface's first
    /// layout, apply the full overlay plan.
    pub async fn open(&self) -> Result<()> {
        let generation = self.begin_transition(SessionState::Opening);
        tracing::debug!(document = %self.document_id, "opening document session");
        self.load_index().await?;
        self.resume_display(generation).await
    }

    /// Discard the session. The index empties; the surface is left to the
    /// host to tear down.
    pub fn close(&self) {
        self.begin_transition(SessionState::Closed);
        self.index.lock().clear();
        self.index_complete.store(false, Ordering::SeqCst);
        self.deferred.lock().clear();
        *self.sync.lock() = SyncState::default();
        tracing::debug!(document = %self.document_id, "document session closed");
    }

    /// Re-fetch every record for the document and atomically replace the
    /// index. Required after a partial bulk load before mutations resume.
    pub async fn reload(&self) -> Result<()> {
        self.ensure_not_closed()?;
        self.load_index().await?;
        if *self.state.lock() == SessionState::Displaying {
            let generation = self.surface_generation();
            if self.await_ready(generation).await? {
                let full = plan_all(&self.index.lock());
                self.bridge.apply_all(&full).await?;
            }
        }
        Ok(())
    }

    /// Handle an event from the render surface.
    ///
    /// Returns the range snapshot for [`SurfaceEvent::RangeActivated`] so the
    /// host can build its context menu; `None` for everything else.
    pub async fn handle_event(&self, event: SurfaceEvent) -> Result<Option<RangeAnnotations>> {
        match event {
            SurfaceEvent::RangeActivated(range) => Ok(Some(self.on_range_activated(&range))),
            SurfaceEvent::SelectionChanged { range, .. } => {
                tracing::trace!(%range, "selection changed");
                Ok(None)
            }
            SurfaceEvent::SurfaceDestroyed => {
                self.ensure_not_closed()?;
                self.begin_transition(SessionState::Navigating);
                Ok(None)
            }
            SurfaceEvent::SurfaceReady => {
                self.ensure_not_closed()?;
                let generation = self.surface_generation();
                self.resume_display(generation).await?;
                Ok(None)
            }
        }
    }

    /// Read-only snapshot of everything at a range, resolved against the
    /// index as it stands right now.
    pub fn on_range_activated(&self, range: &RangeKey) -> RangeAnnotations {
        self.index.lock().get(range)
    }

    /// Every annotated range with its records, in display order
    /// (lexicographic token order), for the annotations side panel.
    pub fn annotations_overview(&self) -> Vec<(RangeKey, RangeAnnotations)> {
        let index = self.index.lock();
        index
            .all_ranges()
            .into_iter()
            .map(|range| {
                let snapshot = index.get(&range);
                (range, snapshot)
            })
            .collect()
    }

    /// Jump the view to a range. The surface rebuilds its view, after which
    /// the full overlay plan is re-applied.
    pub async fn navigate_to(&self, range: &RangeKey) -> Result<()> {
        self.ensure_not_closed()?;
        let generation = self.begin_transition(SessionState::Navigating);
        self.bridge.navigate_to(range).await?;
        self.resume_display(generation).await
    }

    /// Layout-affecting settings changed (font, margins, pagination mode).
    /// Functionally a navigation: the view is rebuilt and the overlay
    /// re-derived.
    pub async fn reflow(&self) -> Result<()> {
        self.ensure_not_closed()?;
        let generation = self.begin_transition(SessionState::Reflowing);
        self.resume_display(generation).await
    }

    /// Create a highlight, or revise color and selection text of the one
    /// already at this range.
    pub async fn create_or_update_highlight(
        &self,
        range: &RangeKey,
        color: HighlightColor,
        source_text: &str,
    ) -> Result<Highlight> {
        self.ensure_mutable()?;
        let (record, decoration) = {
            let mut index = self.index.lock();
            let record = match index.highlight(range) {
                Some(existing) => {
                    let mut revised = existing.clone();
                    revised.revise(color, source_text);
                    revised
                }
                None => Highlight::new(&self.document_id, range.clone(), color, source_text),
            };
            index.upsert_highlight(record.clone());
            (record, plan(&index, range))
        };
        self.project_range(range, &decoration).await?;
        self.persist(self.store.put_highlight(&record)).await?;
        Ok(record)
    }

    pub async fn remove_highlight(&self, range: &RangeKey) -> Result<()> {
        self.ensure_mutable()?;
        let (removed, decoration) = {
            let mut index = self.index.lock();
            let removed = index.remove_highlight(range);
            (removed, plan(&index, range))
        };
        let Some(removed) = removed else {
            tracing::debug!(%range, "remove_highlight on a range without one");
            return Ok(());
        };
        self.project_range(range, &decoration).await?;
        self.persist(self.store.delete_highlight(&removed.id)).await?;
        Ok(())
    }

    /// Create a note, or revise the one already at this range.
    pub async fn create_or_update_note(
        &self,
        range: &RangeKey,
        source_text: &str,
        body: &str,
    ) -> Result<Note> {
        self.ensure_mutable()?;
        let (record, decoration) = {
            let mut index = self.index.lock();
            let record = match index.note(range) {
                Some(existing) => {
                    let mut revised = existing.clone();
                    revised.revise(source_text, body);
                    revised
                }
                None => Note::new(&self.document_id, range.clone(), source_text, body),
            };
            index.upsert_note(record.clone());
            (record, plan(&index, range))
        };
        self.project_range(range, &decoration).await?;
        self.persist(self.store.put_note(&record)).await?;
        Ok(record)
    }

    pub async fn remove_note(&self, range: &RangeKey) -> Result<()> {
        self.ensure_mutable()?;
        let (removed, decoration) = {
            let mut index = self.index.lock();
            let removed = index.remove_note(range);
            (removed, plan(&index, range))
        };
        let Some(removed) = removed else {
            tracing::debug!(%range, "remove_note on a range without one");
            return Ok(());
        };
        self.project_range(range, &decoration).await?;
        self.persist(self.store.delete_note(&removed.id)).await?;
        Ok(())
    }

    /// Start a new discussion thread at a range. Threads accumulate; every
    /// call adds one.
    pub async fn append_discussion(
        &self,
        range: &RangeKey,
        source_text: &str,
        prompt: &str,
        response: Option<&str>,
    ) -> Result<Discussion> {
        self.ensure_mutable()?;
        let (record, decoration) = {
            let mut index = self.index.lock();
            let record = Discussion::new(
                &self.document_id,
                range.clone(),
                source_text,
                prompt,
                response,
            );
            index.append_discussion(record.clone());
            (record, plan(&index, range))
        };
        self.project_range(range, &decoration).await?;
        self.persist(self.store.put_discussion(&record)).await?;
        Ok(record)
    }

    /// Fill in the response on an existing thread. The overlay is untouched:
    /// the thread already marks (or is suppressed at) its range.
    pub async fn answer_discussion(&self, id: &str, response: &str) -> Result<Discussion> {
        self.ensure_mutable()?;
        let record = self
            .index
            .lock()
            .answer_discussion(id, response)
            .ok_or_else(|| EngineError::NotFound(format!("discussion {id}")))?;
        self.persist(self.store.put_discussion(&record)).await?;
        Ok(record)
    }

    pub async fn remove_discussion(&self, id: &str) -> Result<()> {
        self.ensure_mutable()?;
        let (removed, decoration) = {
            let mut index = self.index.lock();
            match index.remove_discussion(id) {
                Some(removed) => {
                    let decoration = plan(&index, &removed.range);
                    (removed, decoration)
                }
                None => return Err(EngineError::NotFound(format!("discussion {id}"))),
            }
        };
        self.project_range(&removed.range, &decoration).await?;
        self.persist(self.store.delete_discussion(&removed.id)).await?;
        Ok(())
    }

    // ---- internals ----

    fn begin_transition(&self, to: SessionState) -> u64 {
        *self.state.lock() = to;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(state = ?to, generation, "lifecycle transition");
        generation
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if *self.state.lock() == SessionState::Closed {
            return Err(EngineError::Closed);
        }
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<()> {
        self.ensure_not_closed()?;
        if !self.index_complete.load(Ordering::SeqCst) {
            return Err(EngineError::IndexIncomplete(
                "reload required before mutating".to_string(),
            ));
        }
        Ok(())
    }

    /// Bulk-load all three record kinds. The index is replaced only when
    /// every list succeeded; a partial result leaves the previous contents
    /// untouched and the index marked incomplete.
    async fn load_index(&self) -> Result<()> {
        self.index_complete.store(false, Ordering::SeqCst);
        let mut failed = Vec::new();

        let highlights = match self.store.list_highlights(&self.document_id).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(error = %err, "highlight bulk load failed");
                failed.push("highlights");
                Vec::new()
            }
        };
        let notes = match self.store.list_notes(&self.document_id).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(error = %err, "note bulk load failed");
                failed.push("notes");
                Vec::new()
            }
        };
        let discussions = match self.store.list_discussions(&self.document_id).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(error = %err, "discussion bulk load failed");
                failed.push("discussions");
                Vec::new()
            }
        };

        if !failed.is_empty() {
            return Err(EngineError::IndexIncomplete(format!(
                "bulk load failed for {}",
                failed.join(", ")
            )));
        }

        let mut index = self.index.lock();
        index.load_all(highlights, notes, discussions);
        self.index_complete.store(true, Ordering::SeqCst);
        tracing::debug!(records = index.len(), "annotation index loaded");
        Ok(())
    }

    /// Wait for the surface belonging to `generation`, then re-derive and
    /// apply the full overlay and enter `Displaying`. A no-op when a newer
    /// navigation has taken over in the meantime.
    async fn resume_display(&self, generation: u64) -> Result<()> {
        if !self.await_ready(generation).await? {
            return Ok(());
        }

        let full = plan_all(&self.index.lock());
        self.bridge.apply_all(&full).await?;
        if self.surface_generation() != generation {
            return Ok(());
        }

        *self.state.lock() = SessionState::Displaying;
        let deferred = {
            let mut deferred = self.deferred.lock();
            let count = deferred.len();
            deferred.clear();
            count
        };
        if deferred > 0 {
            tracing::debug!(deferred, "deferred range updates folded into full overlay pass");
        }
        tracing::debug!(generation, ranges = full.len(), "overlay restored, displaying");
        Ok(())
    }

    /// Poll surface readiness with bounded, doubling backoff.
    ///
    /// `Ok(true)`: ready, and `generation` is still the live view.
    /// `Ok(false)`: superseded by a newer transition; the caller discards its
    /// work quietly. `Err(NotReady)`: retry budget exhausted.
    async fn await_ready(&self, generation: u64) -> Result<bool> {
        let readiness = &self.config.readiness;
        let mut attempts = 0;
        loop {
            if self.surface_generation() != generation {
                tracing::debug!(generation, "readiness wait superseded by a newer view");
                return Ok(false);
            }
            if self.bridge.readiness_check().await {
                return Ok(self.surface_generation() == generation);
            }
            attempts += 1;
            if attempts >= readiness.max_attempts {
                tracing::warn!(attempts, "render surface never became ready");
                return Err(EngineError::NotReady { attempts });
            }
            tokio::time::sleep(readiness.delay_after(attempts)).await;
        }
    }

    /// Push one range's decoration to the live view, or defer it when the
    /// surface is mid-transition (the full pass on arrival covers it).
    async fn project_range(&self, range: &RangeKey, decoration: &Decoration) -> Result<()> {
        if *self.state.lock() != SessionState::Displaying {
            self.deferred.lock().insert(range.clone());
            return Ok(());
        }
        let generation = self.surface_generation();
        if !self.await_ready(generation).await? {
            self.deferred.lock().insert(range.clone());
            return Ok(());
        }
        self.bridge.apply_one(range, decoration).await
    }

    /// Await a persistence write. On failure the optimistic index state is
    /// kept (rolling back would visually remove content the user just
    /// authored) and the failure feeds the sync indicator.
    async fn persist<T>(&self, write: impl Future<Output = anyhow::Result<T>>) -> Result<T> {
        match write.await {
            Ok(value) => Ok(value),
            Err(err) => {
                let mut sync = self.sync.lock();
                sync.pending_writes += 1;
                sync.last_error = Some(err.to_string());
                tracing::warn!(error = %err, "persistence write failed; keeping local state");
                Err(EngineError::Persistence(err))
            }
        }
    }
}
