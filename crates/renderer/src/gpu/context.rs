use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::TextureFormatFeatureFlags;

use crate::compile::storage_format_name;
use crate::error::RenderError;
use crate::types::Extent;

use super::resources::ACCUMULATION_FORMAT;
use super::surface::WindowSurface;

/// Row width requested from the pipeline when the caller has no preference.
pub const DEFAULT_EXECUTION_WIDTH: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Device and swapchain preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuOptions {
    pub power: GpuPowerPreference,
    /// Present with FIFO when true, otherwise prefer Immediate then Mailbox.
    pub vsync: bool,
    /// Frames the swapchain may queue ahead; clamped to 1-3.
    pub frame_latency: u32,
    /// Preferred threads per group row; clamped to the device limits.
    pub execution_width: u32,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            power: GpuPowerPreference::High,
            vsync: true,
            frame_latency: 2,
            execution_width: DEFAULT_EXECUTION_WIDTH,
        }
    }
}

/// Identity of the adapter the context runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Explicitly owned `wgpu` device context.
///
/// Holds the device, queue and the kernel library source; the renderer asks
/// it for pipelines, textures and command streams through
/// [`GpuDevice`](crate::GpuDevice).
pub struct GpuContext {
    _instance: wgpu::Instance,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) limits: wgpu::Limits,
    pub(crate) output_format: wgpu::TextureFormat,
    pub(crate) kernel_source: String,
    pub(crate) execution_width: u32,
    adapter_profile: AdapterProfile,
}

impl GpuContext {
    /// Creates the device context and the presentation surface for `target`.
    ///
    /// The surface format is the first non-sRGB format the adapter can bind
    /// as a storage texture, so the kernel's output can be copied into
    /// drawables without conversion.
    pub fn new<T>(
        target: &T,
        initial_size: Extent,
        options: &GpuOptions,
        kernel_source: impl Into<String>,
    ) -> Result<(Self, WindowSurface), RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target.window_handle().map_err(|err| {
            RenderError::initialization(format!("failed to acquire window handle: {err}"))
        })?;
        let display_handle = target.display_handle().map_err(|err| {
            RenderError::initialization(format!("failed to acquire display handle: {err}"))
        })?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| {
            RenderError::initialization(format!("failed to create rendering surface: {err}"))
        })?;

        let power_preference = match options.power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| {
            RenderError::initialization(format!("failed to find a suitable GPU adapter: {err}"))
        })?;

        let adapter_profile = AdapterProfile::from_wgpu(&adapter.get_info());
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software = adapter_profile.is_software(),
            "selected GPU adapter"
        );

        let adapter_features = adapter.features();
        if !adapter_features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            return Err(RenderError::initialization(
                "adapter cannot expose read-write storage textures",
            ));
        }
        let accumulation_features = adapter.get_texture_format_features(ACCUMULATION_FORMAT);
        if !accumulation_features
            .flags
            .contains(TextureFormatFeatureFlags::STORAGE_READ_WRITE)
        {
            return Err(RenderError::initialization(format!(
                "{ACCUMULATION_FORMAT:?} cannot be bound read-write on this adapter"
            )));
        }

        let surface_caps = surface.get_capabilities(&adapter);
        if !surface_caps.usages.contains(wgpu::TextureUsages::COPY_DST) {
            return Err(RenderError::initialization(
                "surface does not accept copies into its drawables",
            ));
        }

        let bgra_storage = adapter_features.contains(wgpu::Features::BGRA8UNORM_STORAGE);
        let output_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| {
                storage_format_name(*format).is_some()
                    && (*format != wgpu::TextureFormat::Bgra8Unorm || bgra_storage)
                    && adapter
                        .get_texture_format_features(*format)
                        .allowed_usages
                        .contains(wgpu::TextureUsages::STORAGE_BINDING)
            })
            .ok_or_else(|| {
                RenderError::initialization(format!(
                    "no storage-capable surface format among {:?}",
                    surface_caps.formats
                ))
            })?;

        let mut required_features = wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        if output_format == wgpu::TextureFormat::Bgra8Unorm {
            required_features |= wgpu::Features::BGRA8UNORM_STORAGE;
        }

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("pathtrace device"),
            required_features,
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| {
            RenderError::initialization(format!("failed to create GPU device: {err}"))
        })?;

        let desired_maximum_frame_latency = options.frame_latency.clamp(1, 3);
        if desired_maximum_frame_latency != options.frame_latency {
            tracing::warn!(
                requested = options.frame_latency,
                clamped = desired_maximum_frame_latency,
                "GPU frame latency clamped to valid range (1-3)"
            );
        }

        let present_mode = select_present_mode(&surface_caps.present_modes, options.vsync);
        tracing::debug!(?present_mode, ?output_format, "configuring surface");

        let size = initial_size.clamped();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_DST,
            format: output_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let execution_width = options
            .execution_width
            .clamp(1, limits.max_compute_workgroup_size_x.max(1));
        if execution_width != options.execution_width {
            tracing::warn!(
                requested = options.execution_width,
                clamped = execution_width,
                "execution width clamped to device workgroup limits"
            );
        }

        let window_surface = WindowSurface::new(surface, device.clone(), config);
        let context = Self {
            _instance: instance,
            device,
            queue,
            limits,
            output_format,
            kernel_source: kernel_source.into(),
            execution_width,
            adapter_profile,
        };
        Ok((context, window_surface))
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.adapter_profile
    }

    /// Pixel format shared by the output texture and the surface drawables.
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    /// Threads the device allows in one group for the configured row width.
    pub(crate) fn max_threads_per_group(&self) -> u32 {
        self.limits.max_compute_invocations_per_workgroup.min(
            self.execution_width
                .saturating_mul(self.limits.max_compute_workgroup_size_y),
        )
    }
}

fn select_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    // Every surface supports FIFO.
    let fifo = wgpu::PresentMode::Fifo;
    if vsync {
        return fifo;
    }
    modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Immediate)
        .or_else(|| {
            modes
                .iter()
                .copied()
                .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        })
        .unwrap_or(fifo)
}
