//! Overlay projection
//!
//! Turns the annotation index into decorations on the render surface:
//!
//! - `planner`: pure priority-based decision of one decoration per range
//! - `bridge`: idempotent application of plans to the surface primitives

mod bridge;
mod planner;

pub use bridge::RenderBridge;
pub use planner::{plan, plan_all, Decoration, OverlayPlan};
