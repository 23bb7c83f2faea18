use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

/// Sample cap applied when the caller does not pick one.
pub const DEFAULT_MAX_SAMPLES: u32 = 2000;

/// Compute entry point looked up in the kernel library by default.
pub const DEFAULT_ENTRY_POINT: &str = "pathtrace_kernel";

/// Pixel dimensions of a drawable or texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Raises each axis to at least one pixel.
    ///
    /// Window systems report 0x0 while minimised; textures cannot be empty.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<PhysicalSize<u32>> for Extent {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

impl From<(u32, u32)> for Extent {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parameter block handed to the kernel every frame.
///
/// Field order and packing are part of the kernel contract: three tightly
/// packed `u32`s, 12 bytes total.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Uniforms {
    pub width: u32,
    pub height: u32,
    pub frame_index: u32,
}

impl Uniforms {
    pub fn new(extent: Extent, frame_index: u32) -> Self {
        Self {
            width: extent.width,
            height: extent.height,
            frame_index,
        }
    }
}

/// Which of the two renderer-owned textures a resource backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// Floating-point running estimate, read and written by the kernel.
    Accumulation,
    /// Presentation-format image the kernel writes and the blit copies out.
    Output,
}

/// Threads per group used for every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadGroup {
    pub width: u32,
    pub height: u32,
}

impl ThreadGroup {
    /// Shapes a group from the pipeline's preferred execution width and its
    /// per-group thread limit: one execution-width row per line, as many lines
    /// as the limit allows, never fewer than one.
    pub fn for_pipeline(execution_width: u32, max_threads_per_group: u32) -> Self {
        let width = execution_width.max(1);
        Self {
            width,
            height: (max_threads_per_group / width).max(1),
        }
    }

    pub fn threads(self) -> u32 {
        self.width.saturating_mul(self.height)
    }
}

/// One compute dispatch: the logical thread grid plus the group shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Total threads per axis; always the output texture's dimensions.
    pub grid: Extent,
    pub group: ThreadGroup,
}

impl Dispatch {
    pub fn new(grid: Extent, group: ThreadGroup) -> Self {
        Self { grid, group }
    }

    /// Whole groups needed to cover the grid, for APIs that dispatch groups
    /// rather than threads. Edge groups overhang the grid; kernels bound-check
    /// against the uniform dimensions.
    pub fn workgroups(self) -> (u32, u32) {
        (
            self.grid.width.div_ceil(self.group.width),
            self.grid.height.div_ceil(self.group.height),
        )
    }
}

/// Start-up configuration for [`ProgressiveRenderer`](crate::ProgressiveRenderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Name of the compute entry point to compile.
    pub entry_point: String,
    /// Frame index ceiling; draws past it keep presenting without advancing.
    pub max_samples: u32,
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_max_samples(mut self, max_samples: u32) -> Self {
        self.max_samples = max_samples;
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

/// Result of a draw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Commands were submitted and the drawable queued for presentation.
    Presented { frame_index: u32 },
    /// The surface had no drawable this tick; nothing changed.
    Skipped,
}

impl FrameStatus {
    pub fn is_presented(self) -> bool {
        matches!(self, FrameStatus::Presented { .. })
    }
}
