use crate::types::{Extent, TextureRole};

/// Failures surfaced by the renderer and its backends.
///
/// A surface without a drawable is not an error: draws report
/// [`FrameStatus::Skipped`](crate::FrameStatus::Skipped) and the host simply
/// tries again on its next tick.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Device, queue, kernel entry point or pipeline unavailable at start-up.
    #[error("renderer initialisation failed: {0}")]
    Initialization(String),
    /// Texture storage could not be created for the requested size.
    #[error("failed to allocate {role:?} texture at {extent}: {reason}")]
    Allocation {
        role: TextureRole,
        extent: Extent,
        reason: String,
    },
    /// The presentation surface failed in a way retrying cannot fix.
    #[error("presentation surface failed: {0}")]
    Presentation(String),
}

impl RenderError {
    pub fn initialization(reason: impl Into<String>) -> Self {
        RenderError::Initialization(reason.into())
    }

    pub fn allocation(role: TextureRole, extent: Extent, reason: impl Into<String>) -> Self {
        RenderError::Allocation {
            role,
            extent,
            reason: reason.into(),
        }
    }

    /// Every variant ends the operation that raised it; only presentation
    /// failures also end the host loop.
    pub fn is_fatal_for_host(&self) -> bool {
        matches!(
            self,
            RenderError::Initialization(_) | RenderError::Presentation(_)
        )
    }
}
