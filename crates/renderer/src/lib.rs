//! Host-side orchestration for a progressive compute renderer.
//!
//! The crate owns the GPU resources of a sample-accumulating renderer and
//! sequences every frame, while the shading math lives in an opaque compute
//! kernel. The overall flow is:
//!
//! ```text
//!   host driver (periodic tick, input, resize)
//!          │
//!          ├─▶ on_resize() ──▶ reallocate accumulation + output ─▶ frame index = 0
//!          ├─▶ reset_accumulation() ──▶ zero accumulation ─▶ frame index = 0
//!          └─▶ on_draw_requested(surface)
//!                   │  frame index += 1 (capped)
//!                   ▼
//!            uniforms ─▶ compute dispatch ─▶ copy to drawable ─▶ present
//! ```
//!
//! [`ProgressiveRenderer`] is generic over a [`GpuDevice`], the explicitly
//! owned resource context, and borrows a [`PresentationSurface`] only for the
//! duration of a draw. The [`gpu`] module provides the `wgpu` implementation
//! of both; [`SharedRenderer`] serialises access when resets or resizes arrive
//! from another thread.

pub mod accumulation;
pub mod backend;
pub mod compile;
pub mod error;
pub mod gpu;
mod progressive;
mod shared;
pub mod types;

pub use accumulation::FrameCounter;
pub use backend::{ComputeKernel, GpuDevice, PresentationSurface, TextureResource};
pub use error::RenderError;
pub use progressive::ProgressiveRenderer;
pub use shared::SharedRenderer;
pub use types::{
    Dispatch, Extent, FrameStatus, RendererConfig, TextureRole, ThreadGroup, Uniforms,
    DEFAULT_ENTRY_POINT, DEFAULT_MAX_SAMPLES,
};
