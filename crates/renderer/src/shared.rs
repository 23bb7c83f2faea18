use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{GpuDevice, PresentationSurface};
use crate::error::RenderError;
use crate::progressive::ProgressiveRenderer;
use crate::types::{Extent, FrameStatus};

/// Renderer handle that can be cloned across threads.
///
/// One lock guards the accumulation texture, the output texture and the
/// frame index together. A draw holds it from drawable acquisition through
/// present, so a reset or resize from another thread either finishes before
/// the next draw starts encoding or waits for the current one to finish.
/// Commands already submitted to the GPU are not recalled.
pub struct SharedRenderer<D: GpuDevice> {
    inner: Arc<Mutex<ProgressiveRenderer<D>>>,
}

impl<D: GpuDevice> Clone for SharedRenderer<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: GpuDevice> SharedRenderer<D> {
    pub fn new(renderer: ProgressiveRenderer<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(renderer)),
        }
    }

    /// Exclusive access for callers that need several operations in a row.
    ///
    /// A panic while the lock was held does not leave the targets half
    /// swapped, so a poisoned lock is taken over rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, ProgressiveRenderer<D>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("renderer lock poisoned by a panicking holder; recovering");
            poisoned.into_inner()
        })
    }

    pub fn draw<S>(&self, surface: &mut S) -> Result<FrameStatus, RenderError>
    where
        S: PresentationSurface<Drawable = D::Drawable>,
    {
        self.lock().on_draw_requested(surface)
    }

    pub fn resize(&self, new_size: Extent) -> Result<(), RenderError> {
        self.lock().on_resize(new_size)
    }

    pub fn reset_accumulation(&self) {
        self.lock().reset_accumulation();
    }

    pub fn frame_index(&self) -> u32 {
        self.lock().frame_index()
    }

    pub fn extent(&self) -> Extent {
        self.lock().extent()
    }

    /// Hands the renderer back once every other handle is gone.
    pub fn try_unwrap(self) -> Result<ProgressiveRenderer<D>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<D: GpuDevice> std::fmt::Debug for SharedRenderer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRenderer")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl<D: GpuDevice> From<ProgressiveRenderer<D>> for SharedRenderer<D> {
    fn from(renderer: ProgressiveRenderer<D>) -> Self {
        Self::new(renderer)
    }
}
