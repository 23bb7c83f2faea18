use std::borrow::Cow;
use std::num::NonZeroU64;

use crate::backend::ComputeKernel;
use crate::compile::wrap_kernel_source;
use crate::error::RenderError;
use crate::types::{ThreadGroup, Uniforms};

use super::resources::ACCUMULATION_FORMAT;

/// Compiled compute pipeline for one kernel entry point.
///
/// The group shape is baked into the module through the prelude constants,
/// so the values reported through [`ComputeKernel`] always describe the
/// pipeline that was actually built.
pub struct KernelPipeline {
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) layout: wgpu::BindGroupLayout,
    entry_point: String,
    execution_width: u32,
    max_threads_per_group: u32,
}

impl KernelPipeline {
    pub(crate) fn new(
        device: &wgpu::Device,
        source: &str,
        entry_point: &str,
        output_format: wgpu::TextureFormat,
        execution_width: u32,
        max_threads_per_group: u32,
    ) -> Result<Self, RenderError> {
        if !declares_entry_point(source, entry_point) {
            return Err(RenderError::initialization(format!(
                "kernel entry point `{entry_point}` not found in kernel library"
            )));
        }

        let group = ThreadGroup::for_pipeline(execution_width, max_threads_per_group);
        let wrapped = wrap_kernel_source(source, output_format, group)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pathtrace kernel"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(wrapped)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kernel bindings layout"),
            entries: &build_layout_entries(output_format),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kernel pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("kernel pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(entry_point),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::initialization(format!(
                "failed to compile kernel `{entry_point}`: {err}"
            )));
        }

        tracing::debug!(
            entry_point,
            group_width = group.width,
            group_height = group.height,
            ?output_format,
            "compiled kernel pipeline"
        );

        Ok(Self {
            pipeline,
            layout,
            entry_point: entry_point.to_string(),
            execution_width,
            max_threads_per_group,
        })
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

impl ComputeKernel for KernelPipeline {
    fn execution_width(&self) -> u32 {
        self.execution_width
    }

    fn max_threads_per_group(&self) -> u32 {
        self.max_threads_per_group
    }
}

fn declares_entry_point(source: &str, entry_point: &str) -> bool {
    let needle = format!("fn {entry_point}");
    source.match_indices(&needle).any(|(index, _)| {
        source[index + needle.len()..]
            .chars()
            .next()
            .is_some_and(|next| next == '(' || next.is_whitespace())
    })
}

fn build_layout_entries(output_format: wgpu::TextureFormat) -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::ReadWrite,
                format: ACCUMULATION_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: output_format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<Uniforms>() as u64),
            },
            count: None,
        },
    ]
}
