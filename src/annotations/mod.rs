//! Annotation data model
//!
//! Record types for the three annotation kinds and the in-memory, range-keyed
//! index holding them for the currently open document.
//!
//! The index is pure data: no I/O, no surface calls. Persistence and overlay
//! projection are layered on top by the session coordinator.

mod index;
mod types;

pub use index::AnnotationIndex;
pub use types::{Discussion, Highlight, HighlightColor, Note, RangeAnnotations, RangeKey};
