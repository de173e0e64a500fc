//! Document lifecycle
//!
//! One [`DocumentSession`] per open document: it owns the annotation index,
//! drives bulk loads and overlay (re)application across navigation and
//! reflow, and is the only writer the index ever has.

mod coordinator;

pub use coordinator::{DocumentSession, SessionState, SyncState};
