use crate::backend::PresentationSurface;
use crate::error::RenderError;
use crate::types::Extent;

/// Window size as last reported, kept apart from the swapchain size.
///
/// Minimised windows report 0x0; the swapchain cannot take that, but callers
/// asking for the size should still see the (clamped) window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SurfaceSize {
    reported: Extent,
}

impl SurfaceSize {
    fn new(initial: Extent) -> Self {
        Self {
            reported: initial.clamped(),
        }
    }

    /// Records a window resize and returns the size to configure the
    /// swapchain with, if any.
    fn update(&mut self, requested: Extent) -> Option<Extent> {
        self.reported = requested.clamped();
        (!requested.is_degenerate()).then_some(requested)
    }

    fn reported(&self) -> Extent {
        self.reported
    }
}

/// Swapchain for a window, configured for copies from the output texture.
pub struct WindowSurface {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    size: SurfaceSize,
}

impl WindowSurface {
    pub(crate) fn new(
        surface: wgpu::Surface<'static>,
        device: wgpu::Device,
        config: wgpu::SurfaceConfiguration,
    ) -> Self {
        let size = SurfaceSize::new(Extent::new(config.width, config.height));
        Self {
            surface,
            device,
            config,
            size,
        }
    }

    /// Reconfigures the swapchain. Zero-sized windows keep the previous
    /// swapchain configuration while [`size`](PresentationSurface::size)
    /// reports the clamped window size.
    pub fn resize(&mut self, new_size: Extent) {
        let Some(configured) = self.size.update(new_size) else {
            return;
        };

        self.config.width = configured.width;
        self.config.height = configured.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        self.config.present_mode
    }

    fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl PresentationSurface for WindowSurface {
    type Drawable = wgpu::SurfaceTexture;

    fn size(&self) -> Extent {
        self.size.reported()
    }

    fn current_drawable(&mut self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout; retrying next frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.reconfigure();
                Ok(None)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::Presentation(
                "surface out of memory".to_string(),
            )),
            Err(other) => {
                tracing::warn!(error = ?other, "surface error; retrying next frame");
                Ok(None)
            }
        }
    }

    fn present(&mut self, drawable: wgpu::SurfaceTexture) {
        drawable.present();
    }
}
