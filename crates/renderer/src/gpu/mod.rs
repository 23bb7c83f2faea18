//! `wgpu` implementation of the renderer's device and surface seams.
//!
//! - `context` owns instance/adapter/device wiring and picks a surface format
//!   the kernel can write as a storage texture.
//! - `pipeline` compiles the wrapped kernel into a compute pipeline with the
//!   contract bind group layout.
//! - `resources` describes the accumulation/output textures.
//! - `device` implements [`GpuDevice`](crate::GpuDevice) on top of the above.
//! - `surface` wraps the swapchain as a
//!   [`PresentationSurface`](crate::PresentationSurface).

mod context;
mod device;
mod pipeline;
mod resources;
mod surface;

pub use context::{
    AdapterProfile, GpuContext, GpuOptions, GpuPowerPreference, DEFAULT_EXECUTION_WIDTH,
};
pub use pipeline::KernelPipeline;
pub use resources::{GpuTexture, ACCUMULATION_FORMAT};
pub use surface::WindowSurface;
