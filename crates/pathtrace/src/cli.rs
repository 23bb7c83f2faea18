use std::path::PathBuf;

use clap::Parser;
use pathtrace_renderer::gpu::{GpuOptions, GpuPowerPreference};
use pathtrace_renderer::{Extent, RendererConfig, DEFAULT_ENTRY_POINT, DEFAULT_MAX_SAMPLES};

/// Highest redraw rate the host will ask for.
pub const MAX_FPS: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(
    name = "pathtrace",
    author,
    version,
    about = "Progressive compute path tracer; press Space to restart accumulation"
)]
pub struct Cli {
    /// Initial window width in physical pixels.
    #[arg(long, env = "PATHTRACE_WIDTH", default_value_t = 800)]
    pub width: u32,

    /// Initial window height in physical pixels.
    #[arg(long, env = "PATHTRACE_HEIGHT", default_value_t = 600)]
    pub height: u32,

    /// Redraw rate cap; values outside 1-60 are clamped.
    #[arg(long, env = "PATHTRACE_FPS", default_value_t = MAX_FPS)]
    pub fps: f32,

    /// Frame index ceiling after which accumulation stops advancing.
    #[arg(long, env = "PATHTRACE_MAX_SAMPLES", default_value_t = DEFAULT_MAX_SAMPLES)]
    pub max_samples: u32,

    /// WGSL kernel library to load instead of the bundled scene.
    #[arg(long, env = "PATHTRACE_KERNEL", value_name = "PATH")]
    pub kernel: Option<PathBuf>,

    /// Compute entry point inside the kernel library.
    #[arg(long, env = "PATHTRACE_ENTRY_POINT", default_value = DEFAULT_ENTRY_POINT)]
    pub entry_point: String,

    /// Prefer an integrated or low-power adapter.
    #[arg(long)]
    pub low_power: bool,

    /// Present without waiting for vertical blank when the surface allows it.
    #[arg(long)]
    pub no_vsync: bool,
}

impl Cli {
    pub fn window_size(&self) -> Extent {
        Extent::new(self.width, self.height).clamped()
    }

    pub fn target_fps(&self) -> f32 {
        clamp_fps(self.fps)
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig::default()
            .with_entry_point(self.entry_point.trim())
            .with_max_samples(self.max_samples)
    }

    pub fn gpu_options(&self) -> GpuOptions {
        GpuOptions {
            power: if self.low_power {
                GpuPowerPreference::Low
            } else {
                GpuPowerPreference::High
            },
            vsync: !self.no_vsync,
            ..GpuOptions::default()
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn clamp_fps(fps: f32) -> f32 {
    if fps.is_finite() {
        fps.clamp(1.0, MAX_FPS)
    } else {
        MAX_FPS
    }
}
