use crate::backend::{GpuDevice, TextureResource};
use crate::error::RenderError;
use crate::types::{Dispatch, Extent, TextureRole, Uniforms};

use super::context::GpuContext;
use super::pipeline::KernelPipeline;
use super::resources::{texture_descriptor, GpuTexture, UNIFORM_BUFFER_SIZE};

impl GpuDevice for GpuContext {
    type Kernel = KernelPipeline;
    type Texture = GpuTexture;
    type UniformBuffer = wgpu::Buffer;
    type Bindings = wgpu::BindGroup;
    type CommandStream = wgpu::CommandEncoder;
    type Drawable = wgpu::SurfaceTexture;

    fn create_kernel(&self, entry_point: &str) -> Result<KernelPipeline, RenderError> {
        KernelPipeline::new(
            &self.device,
            &self.kernel_source,
            entry_point,
            self.output_format,
            self.execution_width,
            self.max_threads_per_group(),
        )
    }

    fn create_texture(&self, role: TextureRole, extent: Extent) -> Result<GpuTexture, RenderError> {
        let max_dimension = self.limits.max_texture_dimension_2d;
        if extent.width > max_dimension || extent.height > max_dimension {
            return Err(RenderError::allocation(
                role,
                extent,
                format!("exceeds GPU max texture dimension {max_dimension}"),
            ));
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self
            .device
            .create_texture(&texture_descriptor(role, extent, self.output_format));
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = out_of_memory.or(validation) {
            return Err(RenderError::allocation(role, extent, err.to_string()));
        }

        tracing::trace!(?role, %extent, "allocated texture");
        Ok(GpuTexture::new(texture, role, extent))
    }

    fn create_uniform_buffer(&self) -> Result<wgpu::Buffer, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: UNIFORM_BUFFER_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::initialization(format!(
                "failed to create uniform buffer: {err}"
            )));
        }
        Ok(buffer)
    }

    fn bind(
        &self,
        kernel: &KernelPipeline,
        accumulation: &GpuTexture,
        output: &GpuTexture,
        uniforms: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kernel bind group"),
            layout: &kernel.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&accumulation.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&output.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        })
    }

    fn zero_fill(&self, texture: &GpuTexture) {
        let extent = texture.extent();
        let bytes_per_row = texture.bytes_per_row();
        let zeros = vec![0u8; bytes_per_row as usize * extent.height as usize];
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &zeros,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(extent.height),
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn write_uniforms(&self, buffer: &wgpu::Buffer, uniforms: &Uniforms) {
        self.queue
            .write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn begin_frame(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("progressive frame encoder"),
            })
    }

    fn encode_dispatch(
        &self,
        stream: &mut wgpu::CommandEncoder,
        kernel: &KernelPipeline,
        bindings: &wgpu::BindGroup,
        dispatch: Dispatch,
    ) {
        let (groups_x, groups_y) = dispatch.workgroups();
        let mut pass = stream.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("progressive dispatch"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&kernel.pipeline);
        pass.set_bind_group(0, bindings, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }

    fn encode_copy(
        &self,
        stream: &mut wgpu::CommandEncoder,
        source: &GpuTexture,
        target: &wgpu::SurfaceTexture,
    ) {
        // The surface can be reconfigured before the resize notification
        // arrives; copy only the overlapping region until then.
        let source_extent = source.extent();
        let target_size = target.texture.size();
        let width = source_extent.width.min(target_size.width);
        let height = source_extent.height.min(target_size.height);
        if width != source_extent.width || height != source_extent.height {
            tracing::trace!(
                output = %source_extent,
                drawable = %Extent::new(target_size.width, target_size.height),
                "drawable size differs from output texture"
            );
        }

        stream.copy_texture_to_texture(
            source.texture.as_image_copy(),
            target.texture.as_image_copy(),
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn submit(&self, stream: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(stream.finish()));
    }
}
