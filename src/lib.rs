//! Marginalia - annotation overlay synchronization engine
//!
//! Keeps a document's user annotations (highlights, notes, discussion
//! threads) consistent with the decoration overlay of an external render
//! surface that destroys and rebuilds its view on every navigation, reflow,
//! and layout-affecting settings change.
//!
//! # Architecture
//!
//! - `annotations`: record types and the in-memory, range-keyed index
//! - `overlay`: pure decoration planner and the idempotent render bridge
//! - `session`: the lifecycle coordinator owning index and overlay timing
//! - `surface`, `persistence`: the two consumed collaborator boundaries
//!
//! The render surface is a projection target, never a source of truth: the
//! engine re-derives the full overlay from the index after every lifecycle
//! transition instead of reconciling across view replacements.

pub mod annotations;
pub mod config;
pub mod error;
pub mod overlay;
pub mod persistence;
pub mod session;
pub mod surface;

pub use annotations::{
    AnnotationIndex, Discussion, Highlight, HighlightColor, Note, RangeAnnotations, RangeKey,
};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use overlay::{plan, plan_all, Decoration, OverlayPlan, RenderBridge};
pub use persistence::AnnotationStore;
pub use session::{DocumentSession, SessionState, SyncState};
pub use surface::{DecorationKind, DecorationStyle, RenderSurface, SurfaceError, SurfaceEvent};
