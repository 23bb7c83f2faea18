//! Capability seams between the renderer and whatever executes its commands.
//!
//! The renderer only sequences work: it never touches pixels and never
//! assumes a particular graphics API. [`GpuDevice`] is the explicitly owned
//! resource context it drives, [`ComputeKernel`] is the opaque shading program,
//! and [`PresentationSurface`] is borrowed for the duration of one draw.

use crate::error::RenderError;
use crate::types::{Dispatch, Extent, TextureRole, Uniforms};

/// A compiled compute program plus the scheduling facts it reports.
pub trait ComputeKernel {
    /// Threads the hardware prefers to run in lockstep along one row.
    fn execution_width(&self) -> u32;
    /// Upper bound on threads in a single group for this pipeline.
    fn max_threads_per_group(&self) -> u32;
}

/// Texture handle that knows its own size.
pub trait TextureResource {
    fn extent(&self) -> Extent;
}

/// Device context owned by the renderer.
///
/// Commands recorded on a [`GpuDevice::CommandStream`] execute in recording
/// order. Uniform writes and zero-fills issued through the device are visible
/// to every stream submitted after them.
pub trait GpuDevice {
    type Kernel: ComputeKernel;
    type Texture: TextureResource;
    type UniformBuffer;
    /// Kernel resource bindings for one (accumulation, output, uniforms) set.
    type Bindings;
    type CommandStream;
    /// Per-frame presentation target handed out by the surface.
    type Drawable;

    /// Compiles the named entry point into an immutable pipeline.
    fn create_kernel(&self, entry_point: &str) -> Result<Self::Kernel, RenderError>;

    fn create_texture(
        &self,
        role: TextureRole,
        extent: Extent,
    ) -> Result<Self::Texture, RenderError>;

    fn create_uniform_buffer(&self) -> Result<Self::UniformBuffer, RenderError>;

    /// Binds accumulation to texture slot 0, output to texture slot 1 and the
    /// uniform buffer to uniform slot 0.
    fn bind(
        &self,
        kernel: &Self::Kernel,
        accumulation: &Self::Texture,
        output: &Self::Texture,
        uniforms: &Self::UniformBuffer,
    ) -> Self::Bindings;

    /// Overwrites every texel with zero.
    fn zero_fill(&self, texture: &Self::Texture);

    fn write_uniforms(&self, buffer: &Self::UniformBuffer, uniforms: &Uniforms);

    fn begin_frame(&self) -> Self::CommandStream;

    fn encode_dispatch(
        &self,
        stream: &mut Self::CommandStream,
        kernel: &Self::Kernel,
        bindings: &Self::Bindings,
        dispatch: Dispatch,
    );

    /// Copies `source` into the drawable's texture without format conversion.
    fn encode_copy(
        &self,
        stream: &mut Self::CommandStream,
        source: &Self::Texture,
        target: &Self::Drawable,
    );

    /// Hands the stream to the GPU and returns without waiting for it.
    fn submit(&self, stream: Self::CommandStream);
}

/// Window-side collaborator that owns the swapchain.
pub trait PresentationSurface {
    type Drawable;

    /// Current drawable size in physical pixels.
    fn size(&self) -> Extent;

    /// Next drawable, or `Ok(None)` when none is available this tick.
    fn current_drawable(&mut self) -> Result<Option<Self::Drawable>, RenderError>;

    fn present(&mut self, drawable: Self::Drawable);
}
