//! In-memory test doubles for the two consumed collaborators

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use marginalia::{
    AnnotationStore, DecorationKind, DecorationStyle, Discussion, EngineConfig, Highlight, Note,
    RangeKey, RenderSurface, SurfaceError,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("marginalia=debug")
        .with_test_writer()
        .try_init();
}

/// Fast retry budget so readiness tests stay quick.
pub fn test_config(max_attempts: u32, initial_delay_ms: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.readiness.max_attempts = max_attempts;
    config.readiness.initial_delay_ms = initial_delay_ms;
    config
}

/// In-memory annotation store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    highlights: Mutex<HashMap<String, Highlight>>,
    notes: Mutex<HashMap<String, Note>>,
    discussions: Mutex<HashMap<String, Discussion>>,
    fail_lists: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn seed_highlight(&self, highlight: Highlight) {
        self.highlights
            .lock()
            .insert(highlight.id.clone(), highlight);
    }

    pub fn seed_note(&self, note: Note) {
        self.notes.lock().insert(note.id.clone(), note);
    }

    pub fn seed_discussion(&self, discussion: Discussion) {
        self.discussions
            .lock()
            .insert(discussion.id.clone(), discussion);
    }

    pub fn highlight(&self, id: &str) -> Option<Highlight> {
        self.highlights.lock().get(id).cloned()
    }

    pub fn discussion(&self, id: &str) -> Option<Discussion> {
        self.discussions.lock().get(id).cloned()
    }

    pub fn highlight_count(&self) -> usize {
        self.highlights.lock().len()
    }

    fn check_list(&self) -> anyhow::Result<()> {
        if self.fail_lists.load(Ordering::SeqCst) {
            anyhow::bail!("injected list failure");
        }
        Ok(())
    }

    fn check_write(&self) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("injected write failure");
        }
        Ok(())
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn list_highlights(&self, document_id: &str) -> anyhow::Result<Vec<Highlight>> {
        self.check_list()?;
        let mut records: Vec<Highlight> = self
            .highlights
            .lock()
            .values()
            .filter(|h| h.document_id == document_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn list_notes(&self, document_id: &str) -> anyhow::Result<Vec<Note>> {
        self.check_list()?;
        let mut records: Vec<Note> = self
            .notes
            .lock()
            .values()
            .filter(|n| n.document_id == document_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn list_discussions(&self, document_id: &str) -> anyhow::Result<Vec<Discussion>> {
        self.check_list()?;
        let mut records: Vec<Discussion> = self
            .discussions
            .lock()
            .values()
            .filter(|d| d.document_id == document_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn put_highlight(&self, highlight: &Highlight) -> anyhow::Result<()> {
        self.check_write()?;
        self.highlights
            .lock()
            .insert(highlight.id.clone(), highlight.clone());
        Ok(())
    }

    async fn delete_highlight(&self, id: &str) -> anyhow::Result<()> {
        self.check_write()?;
        self.highlights.lock().remove(id);
        Ok(())
    }

    async fn put_note(&self, note: &Note) -> anyhow::Result<()> {
        self.check_write()?;
        self.notes.lock().insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> anyhow::Result<()> {
        self.check_write()?;
        self.notes.lock().remove(id);
        Ok(())
    }

    async fn put_discussion(&self, discussion: &Discussion) -> anyhow::Result<()> {
        self.check_write()?;
        self.discussions
            .lock()
            .insert(discussion.id.clone(), discussion.clone());
        Ok(())
    }

    async fn delete_discussion(&self, id: &str) -> anyhow::Result<()> {
        self.check_write()?;
        self.discussions.lock().remove(id);
        Ok(())
    }
}

/// Render surface double holding marks as a flat list, the way a real
/// renderer stacks them: duplicate draws show up as duplicate entries.
#[derive(Default)]
pub struct MockSurface {
    ready: AtomicBool,
    marks: Mutex<Vec<(RangeKey, DecorationKind, DecorationStyle)>>,
    last_navigated: Mutex<Option<RangeKey>>,
    add_calls: AtomicU32,
}

impl MockSurface {
    pub fn new(ready: bool) -> Self {
        let surface = Self::default();
        surface.ready.store(ready, Ordering::SeqCst);
        surface
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn marks(&self) -> Vec<(RangeKey, DecorationKind, DecorationStyle)> {
        self.marks.lock().clone()
    }

    pub fn decorated_ranges(&self) -> BTreeSet<RangeKey> {
        self.marks.lock().iter().map(|(r, _, _)| r.clone()).collect()
    }

    pub fn mark_for(&self, range: &RangeKey) -> Option<(DecorationKind, DecorationStyle)> {
        self.marks
            .lock()
            .iter()
            .find(|(r, _, _)| r == range)
            .map(|(_, kind, style)| (*kind, style.clone()))
    }

    pub fn last_navigated(&self) -> Option<RangeKey> {
        self.last_navigated.lock().clone()
    }

    /// Total `add_decoration` calls ever made, across clears and redraws.
    pub fn add_calls(&self) -> u32 {
        self.add_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderSurface for MockSurface {
    async fn add_decoration(
        &self,
        range: &RangeKey,
        kind: DecorationKind,
        style: DecorationStyle,
    ) -> Result<(), SurfaceError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(SurfaceError::NotReady);
        }
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.marks.lock().push((range.clone(), kind, style));
        Ok(())
    }

    async fn remove_decoration(
        &self,
        range: &RangeKey,
        kind: DecorationKind,
    ) -> Result<(), SurfaceError> {
        let mut marks = self.marks.lock();
        let before = marks.len();
        marks.retain(|(r, k, _)| !(r == range && *k == kind));
        if marks.len() == before {
            return Err(SurfaceError::NotPresent);
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn navigate_to(&self, range: &RangeKey) -> Result<(), SurfaceError> {
        *self.last_navigated.lock() = Some(range.clone());
        Ok(())
    }
}
