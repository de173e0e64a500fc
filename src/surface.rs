//! Render surface boundary
//!
//! The render surface is the external collaborator that lays out document
//! content and draws decorations on ranges. It is disposable: navigation and
//! reflow destroy and recreate its internal view, so the engine treats it as
//! a write-only projection target and never reads decoration state back out
//! of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotations::RangeKey;

/// The two decoration primitives a surface can draw on a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorationKind {
    /// Background fill across the range
    Fill,
    /// Line under the range
    Underline,
}

impl DecorationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecorationKind::Fill => "fill",
            DecorationKind::Underline => "underline",
        }
    }

    /// Both kinds, in the order clearing sweeps them.
    pub const ALL: [DecorationKind; 2] = [DecorationKind::Fill, DecorationKind::Underline];
}

/// Visual style for a decoration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationStyle {
    /// CSS color value
    pub color: String,
    /// Opacity (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    /// Dashed stroke (underlines only)
    pub dashed: bool,
}

impl DecorationStyle {
    pub fn fill(color: &str) -> Self {
        Self {
            color: color.to_string(),
            opacity: Some(0.3),
            dashed: false,
        }
    }

    pub fn underline(color: &str, dashed: bool) -> Self {
        Self {
            color: color.to_string(),
            opacity: None,
            dashed,
        }
    }
}

/// Surface-specific errors
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Removal targeted a decoration that was never drawn. Clearing sweeps
    /// every kind without tracking which one was rendered, so callers ignore
    /// this.
    #[error("no such decoration on range")]
    NotPresent,

    #[error("surface not laid out yet")]
    NotReady,

    #[error("surface backend error: {0}")]
    Backend(String),
}

/// Events the surface emits back to the engine.
///
/// The host wires these to [`DocumentSession::handle_event`] exactly once,
/// when the document opens. The session resolves every event against the
/// index as it stands at delivery time, so handlers stay correct for the
/// whole document session while the index mutates underneath them.
///
/// [`DocumentSession::handle_event`]: crate::session::DocumentSession::handle_event
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// User activated (clicked/tapped) a decorated range
    RangeActivated(RangeKey),
    /// User selected text spanning the given range
    SelectionChanged { range: RangeKey, text: String },
    /// The current view was torn down (navigation or reflow under way)
    SurfaceDestroyed,
    /// A freshly created view finished its first layout
    SurfaceReady,
}

/// The document render surface, as consumed by the engine.
///
/// Range tokens pass through opaquely; the engine never parses them.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Draw a decoration on a range.
    async fn add_decoration(
        &self,
        range: &RangeKey,
        kind: DecorationKind,
        style: DecorationStyle,
    ) -> Result<(), SurfaceError>;

    /// Remove a decoration of the given kind from a range.
    ///
    /// Returns [`SurfaceError::NotPresent`] if none was drawn.
    async fn remove_decoration(
        &self,
        range: &RangeKey,
        kind: DecorationKind,
    ) -> Result<(), SurfaceError>;

    /// Whether the surface has completed layout and can accept decorations.
    async fn is_ready(&self) -> bool;

    /// Scroll/page the view to the given range.
    async fn navigate_to(&self, range: &RangeKey) -> Result<(), SurfaceError>;
}
