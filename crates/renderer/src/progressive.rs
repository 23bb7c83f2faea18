use crate::accumulation::FrameCounter;
use crate::backend::{ComputeKernel, GpuDevice, PresentationSurface, TextureResource};
use crate::error::RenderError;
use crate::types::{Dispatch, Extent, FrameStatus, RendererConfig, TextureRole, ThreadGroup, Uniforms};

/// Accumulation/output pair plus the kernel bindings that reference them.
///
/// Always replaced as a unit so both textures share one size.
struct RenderTargets<D: GpuDevice> {
    accumulation: D::Texture,
    output: D::Texture,
    bindings: D::Bindings,
    extent: Extent,
}

impl<D: GpuDevice> RenderTargets<D> {
    fn allocate(
        device: &D,
        kernel: &D::Kernel,
        uniforms: &D::UniformBuffer,
        requested: Extent,
    ) -> Result<Self, RenderError> {
        let extent = requested.clamped();
        let accumulation = device.create_texture(TextureRole::Accumulation, extent)?;
        let output = device.create_texture(TextureRole::Output, extent)?;
        device.zero_fill(&accumulation);
        let bindings = device.bind(kernel, &accumulation, &output, uniforms);
        Ok(Self {
            accumulation,
            output,
            bindings,
            extent,
        })
    }
}

/// Host-side driver of a progressive compute renderer.
///
/// Owns the device context, the compiled kernel, the uniform buffer, the
/// accumulation/output textures and the frame counter. Each presented frame
/// writes the uniforms, dispatches the kernel once over the output texture,
/// copies the output into the surface's drawable and presents it. What the
/// kernel does with the accumulation texture is its own business; the frame
/// index it receives is the only weighting signal.
pub struct ProgressiveRenderer<D: GpuDevice> {
    device: D,
    kernel: D::Kernel,
    group: ThreadGroup,
    uniform_buffer: D::UniformBuffer,
    targets: RenderTargets<D>,
    frames: FrameCounter,
}

impl<D: GpuDevice> ProgressiveRenderer<D> {
    /// Compiles the kernel and allocates every resource the frame loop needs.
    pub fn initialize(
        device: D,
        initial_size: Extent,
        config: &RendererConfig,
    ) -> Result<Self, RenderError> {
        if config.entry_point.trim().is_empty() {
            return Err(RenderError::initialization("kernel entry point name is empty"));
        }
        if config.max_samples == 0 {
            return Err(RenderError::initialization(
                "sample cap must allow at least one frame",
            ));
        }

        let kernel = device.create_kernel(&config.entry_point)?;
        let group =
            ThreadGroup::for_pipeline(kernel.execution_width(), kernel.max_threads_per_group());
        let uniform_buffer = device.create_uniform_buffer()?;
        let targets = RenderTargets::allocate(&device, &kernel, &uniform_buffer, initial_size)?;

        tracing::debug!(
            entry_point = %config.entry_point,
            extent = %targets.extent,
            group_width = group.width,
            group_height = group.height,
            max_samples = config.max_samples,
            "progressive renderer initialised"
        );

        Ok(Self {
            device,
            kernel,
            group,
            uniform_buffer,
            targets,
            frames: FrameCounter::new(config.max_samples),
        })
    }

    /// Replaces both textures at the new (clamped) size and restarts
    /// accumulation.
    ///
    /// On allocation failure the previous textures and frame index stay in
    /// place.
    pub fn on_resize(&mut self, new_size: Extent) -> Result<(), RenderError> {
        let targets = RenderTargets::allocate(
            &self.device,
            &self.kernel,
            &self.uniform_buffer,
            new_size,
        )?;
        let previous = std::mem::replace(&mut self.targets, targets);
        self.frames.reset();
        tracing::debug!(
            requested = %new_size,
            previous = %previous.extent,
            extent = %self.targets.extent,
            "reallocated render targets"
        );
        Ok(())
    }

    /// Resize notification that reads the size from the surface itself.
    pub fn on_surface_resized<S>(&mut self, surface: &S) -> Result<(), RenderError>
    where
        S: PresentationSurface<Drawable = D::Drawable>,
    {
        self.on_resize(surface.size())
    }

    /// Encodes, submits and presents one frame.
    ///
    /// Returns [`FrameStatus::Skipped`] without touching any state when the
    /// surface has no drawable. Returns once the commands are queued.
    pub fn on_draw_requested<S>(&mut self, surface: &mut S) -> Result<FrameStatus, RenderError>
    where
        S: PresentationSurface<Drawable = D::Drawable>,
    {
        let Some(drawable) = surface.current_drawable()? else {
            tracing::trace!("no drawable available; skipping frame");
            return Ok(FrameStatus::Skipped);
        };

        let (frame_index, converged) = self.frames.advance();
        if converged {
            tracing::info!(
                frame_index,
                extent = %self.targets.extent,
                "accumulation reached sample cap"
            );
        }

        let extent = self.targets.output.extent();
        self.device
            .write_uniforms(&self.uniform_buffer, &Uniforms::new(extent, frame_index));

        let mut stream = self.device.begin_frame();
        self.device.encode_dispatch(
            &mut stream,
            &self.kernel,
            &self.targets.bindings,
            Dispatch::new(extent, self.group),
        );
        self.device
            .encode_copy(&mut stream, &self.targets.output, &drawable);
        self.device.submit(stream);
        surface.present(drawable);

        Ok(FrameStatus::Presented { frame_index })
    }

    /// Clears the accumulation texture and restarts the frame index.
    ///
    /// Frames already submitted keep whatever they accumulated.
    pub fn reset_accumulation(&mut self) {
        self.device.zero_fill(&self.targets.accumulation);
        let previous = self.frames.value();
        self.frames.reset();
        tracing::debug!(previous_frame_index = previous, "accumulation reset");
    }

    pub fn frame_index(&self) -> u32 {
        self.frames.value()
    }

    pub fn max_samples(&self) -> u32 {
        self.frames.cap()
    }

    pub fn is_converged(&self) -> bool {
        self.frames.is_saturated()
    }

    /// Current size of both render targets.
    pub fn extent(&self) -> Extent {
        self.targets.extent
    }

    pub fn thread_group(&self) -> ThreadGroup {
        self.group
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn accumulation_texture(&self) -> &D::Texture {
        &self.targets.accumulation
    }

    pub fn output_texture(&self) -> &D::Texture {
        &self.targets.output
    }
}

impl<D: GpuDevice> std::fmt::Debug for ProgressiveRenderer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveRenderer")
            .field("extent", &self.targets.extent)
            .field("frame_index", &self.frames.value())
            .field("max_samples", &self.frames.cap())
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}
