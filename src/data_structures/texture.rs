//! GPU textures: the depth buffer and the transform texture.
//!
//! The transform texture is an `Rgba32Float` image used as an indexable
//! array of matrices. Each instance owns four consecutive texels, one per
//! matrix column, so instance `i` starts at texel `4 * i`, found at
//! `(texel % width, texel / width)`.

use crate::resources::transforms::{TextureShape, TEXELS_PER_MATRIX};

/// A GPU texture with its default view.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// The per-frame matrix store read by the vertex shader.
#[derive(Debug)]
pub struct TransformTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
    shape: TextureShape,
}

impl TransformTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
    const BYTES_PER_TEXEL: u32 = 16;

    /// Layout of the transform bind group: one unfilterable float texture
    /// read with `textureLoad` in the vertex stage.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            }],
            label: Some("transform_texture_bind_group_layout"),
        })
    }

    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, shape: TextureShape) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Transform Texture"),
            size: wgpu::Extent3d {
                width: shape.width,
                height: shape.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
            label: Some("transform_texture_bind_group"),
        });
        log::info!("allocated transform texture {}x{}", shape.width, shape.height);
        Self {
            texture: Texture { texture, view },
            bind_group,
            shape,
        }
    }

    pub fn shape(&self) -> TextureShape {
        self.shape
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Upload packed matrices. A shape change reallocates the texture (and its
    /// bind group) before writing; the return value reports whether that happened.
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        transforms: &[f32],
        shape: TextureShape,
    ) -> bool {
        let reallocated = shape != self.shape;
        if reallocated {
            *self = Self::new(device, layout, shape);
        }

        let texels = (transforms.len() / 4) as u32;
        debug_assert_eq!(texels % TEXELS_PER_MATRIX, 0);
        let full_rows = texels / shape.width;
        let remainder = texels % shape.width;
        let row_bytes = shape.width * Self::BYTES_PER_TEXEL;
        let bytes: &[u8] = bytemuck::cast_slice(transforms);

        if full_rows > 0 {
            self.write_region(queue, &bytes[..(full_rows * row_bytes) as usize], 0, shape.width, full_rows);
        }
        if remainder > 0 {
            let start = (full_rows * row_bytes) as usize;
            self.write_region(queue, &bytes[start..], full_rows, remainder, 1);
        }
        reallocated
    }

    fn write_region(&self, queue: &wgpu::Queue, data: &[u8], first_row: u32, width: u32, rows: u32) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: first_row,
                    z: 0,
                },
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * Self::BYTES_PER_TEXEL),
                rows_per_image: Some(rows),
            },
            wgpu::Extent3d {
                width,
                height: rows,
                depth_or_array_layers: 1,
            },
        );
    }
}
