//! Error types for the annotation engine

use thiserror::Error;

use crate::surface::SurfaceError;

/// Engine-wide result type
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error type
///
/// Nothing here is fatal to the process. `NotReady` and `Persistence` leave
/// the document open and interactive; the caller decides whether to retry or
/// flag the affected entry as unsynced.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("render surface not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    #[error("persistence operation failed: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("annotation index incomplete: {0}")]
    IndexIncomplete(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("render surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("document session is closed")]
    Closed,
}

impl EngineError {
    /// Whether the document session remains usable after this error.
    ///
    /// Everything except `Closed` is recoverable: the session stays open and
    /// the index keeps accepting reads.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Closed)
    }
}
