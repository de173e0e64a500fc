//! Persistence boundary
//!
//! The record store consumed by the engine, one method per remote operation.
//! Calls may be slow or fail; the engine never assumes ordering between
//! concurrent calls for different ranges. Upsert-by-range semantics live in
//! the index — the store just persists records by id.

use async_trait::async_trait;

use crate::annotations::{Discussion, Highlight, Note};

/// Storage for annotation records, keyed by document.
///
/// `put_*` both creates and updates (the record id decides), so a color
/// change and a fresh highlight go through the same call.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn list_highlights(&self, document_id: &str) -> anyhow::Result<Vec<Highlight>>;

    async fn list_notes(&self, document_id: &str) -> anyhow::Result<Vec<Note>>;

    async fn list_discussions(&self, document_id: &str) -> anyhow::Result<Vec<Discussion>>;

    async fn put_highlight(&self, highlight: &Highlight) -> anyhow::Result<()>;

    async fn delete_highlight(&self, id: &str) -> anyhow::Result<()>;

    async fn put_note(&self, note: &Note) -> anyhow::Result<()>;

    async fn delete_note(&self, id: &str) -> anyhow::Result<()>;

    async fn put_discussion(&self, discussion: &Discussion) -> anyhow::Result<()>;

    async fn delete_discussion(&self, id: &str) -> anyhow::Result<()>;
}
