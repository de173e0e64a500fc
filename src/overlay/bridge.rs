//! Render bridge
//!
//! The adapter between overlay plans and the render surface's decoration
//! primitives. The surface is a write-only projection target: the bridge
//! never queries what is currently drawn, it clears and redraws from the
//! plan, which makes full application idempotent.

use std::sync::Arc;

use crate::annotations::RangeKey;
use crate::error::Result;
use crate::overlay::planner::{Decoration, OverlayPlan};
use crate::surface::{DecorationKind, RenderSurface, SurfaceError};

/// Applies overlay plans to a render surface.
pub struct RenderBridge {
    surface: Arc<dyn RenderSurface>,
}

impl RenderBridge {
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self { surface }
    }

    /// Whether the surface can accept decorations yet.
    pub async fn readiness_check(&self) -> bool {
        self.surface.is_ready().await
    }

    /// Remove every decoration kind from each given range.
    ///
    /// Callers do not track which kind was actually rendered, so both kinds
    /// are swept and absent ones are ignored. Safe on ranges that never
    /// carried a decoration.
    pub async fn clear_all<'a>(
        &self,
        ranges: impl IntoIterator<Item = &'a RangeKey>,
    ) -> Result<()> {
        for range in ranges {
            self.clear_range(range).await?;
        }
        Ok(())
    }

    /// Clear then draw exactly one decoration per range of the plan.
    ///
    /// Applying the same plan twice leaves the surface in the same state as
    /// applying it once: no duplicate marks, no leftovers.
    pub async fn apply_all(&self, plan: &OverlayPlan) -> Result<()> {
        self.clear_all(plan.ranges()).await?;
        for (range, decoration) in plan.iter() {
            self.draw(range, decoration).await?;
        }
        tracing::debug!(ranges = plan.len(), "applied full overlay plan");
        Ok(())
    }

    /// Redraw a single range after an incremental index change.
    pub async fn apply_one(&self, range: &RangeKey, decoration: &Decoration) -> Result<()> {
        self.clear_range(range).await?;
        self.draw(range, decoration).await
    }

    /// Scroll/page the surface to a range.
    pub async fn navigate_to(&self, range: &RangeKey) -> Result<()> {
        self.surface.navigate_to(range).await?;
        Ok(())
    }

    async fn clear_range(&self, range: &RangeKey) -> Result<()> {
        for kind in DecorationKind::ALL {
            match self.surface.remove_decoration(range, kind).await {
                Ok(()) | Err(SurfaceError::NotPresent) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn draw(&self, range: &RangeKey, decoration: &Decoration) -> Result<()> {
        if let Some((kind, style)) = decoration.paint() {
            self.surface.add_decoration(range, kind, style).await?;
        }
        Ok(())
    }
}
