use crate::backend::TextureResource;
use crate::types::{Extent, TextureRole};

/// Storage format of the accumulation texture.
pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Uniform buffer size; the 12-byte block rounded up to 16.
pub(crate) const UNIFORM_BUFFER_SIZE: u64 = 16;

/// Renderer-owned texture with its default view.
pub struct GpuTexture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    role: TextureRole,
    extent: Extent,
    bytes_per_pixel: u32,
}

impl GpuTexture {
    pub(crate) fn new(texture: wgpu::Texture, role: TextureRole, extent: Extent) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bytes_per_pixel = texture.format().block_copy_size(None).unwrap_or(4);
        Self {
            texture,
            view,
            role,
            extent,
            bytes_per_pixel,
        }
    }

    pub fn role(&self) -> TextureRole {
        self.role
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub(crate) fn bytes_per_row(&self) -> u32 {
        self.extent.width * self.bytes_per_pixel
    }
}

impl TextureResource for GpuTexture {
    fn extent(&self) -> Extent {
        self.extent
    }
}

pub(crate) fn texture_descriptor(
    role: TextureRole,
    extent: Extent,
    output_format: wgpu::TextureFormat,
) -> wgpu::TextureDescriptor<'static> {
    let (label, format, usage) = match role {
        TextureRole::Accumulation => (
            "accumulation texture",
            ACCUMULATION_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_DST,
        ),
        TextureRole::Output => (
            "output texture",
            output_format,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
        ),
    };
    wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    }
}
