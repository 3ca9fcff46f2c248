//! The instanced cube program: globals at group 0, transform texture at group 1.

use crate::{
    data_structures::texture::{Texture, TransformTexture},
    pipelines::basic::mk_render_pipeline,
    resources::geometry::PackedVertex,
};

pub fn mk_globals_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("globals_bind_group_layout"),
    })
}

pub fn mk_swarm_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    globals_layout: &wgpu::BindGroupLayout,
    transform_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Swarm Pipeline Layout"),
        bind_group_layouts: &[globals_layout, transform_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Swarm Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("swarm.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        color_format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[PackedVertex::desc()],
        shader,
    )
}

/// Layouts and pipeline in one go, for callers that do not keep the layouts elsewhere.
pub fn mk_swarm_program(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
) -> (wgpu::BindGroupLayout, wgpu::BindGroupLayout, wgpu::RenderPipeline) {
    let globals_layout = mk_globals_layout(device);
    let transform_layout = TransformTexture::bind_group_layout(device);
    let pipeline = mk_swarm_pipeline(device, color_format, &globals_layout, &transform_layout);
    (globals_layout, transform_layout, pipeline)
}
