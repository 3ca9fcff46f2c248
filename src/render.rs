//! The wgpu side of the frame: resource bundle and draw submission.
//!
//! # Key types
//!
//! - [`GpuResources`] is created once at start-up and never changes: the
//!   compiled program, the globals uniform and the transform bind group layout
//! - [`Renderer`] owns the [`Context`] plus the per-session buffers and
//!   implements [`FrameTarget`] so the [`FrameDriver`](crate::driver::FrameDriver)
//!   can drive it

use std::iter;

use wgpu::util::DeviceExt;

use crate::{
    camera::{GlobalsUniform, Projection},
    config::SwarmConfig,
    context::Context,
    data_structures::texture::TransformTexture,
    driver::FrameTarget,
    error::{Error, Result},
    pipelines::swarm::mk_swarm_program,
    resources::{geometry::PackedGeometry, transforms::TextureShape},
};

/// Immutable GPU state shared by every frame.
#[derive(Debug)]
pub struct GpuResources {
    pub pipeline: wgpu::RenderPipeline,
    pub globals_buffer: wgpu::Buffer,
    pub globals_bind_group: wgpu::BindGroup,
    pub transform_layout: wgpu::BindGroupLayout,
}

impl GpuResources {
    /// Compile the program and create the globals uniform.
    ///
    /// Shader compile and link problems are captured with a validation error
    /// scope and returned as [`Error::ShaderProgram`] instead of surfacing
    /// later as a device error in the middle of a frame.
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        globals: GlobalsUniform,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let (globals_layout, transform_layout, pipeline) = mk_swarm_program(device, color_format);
        if let Some(error) = device.pop_error_scope().await {
            log::error!("swarm shader program rejected: {}", error);
            return Err(Error::ShaderProgram(error.to_string()));
        }

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[globals]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        Ok(Self {
            pipeline,
            globals_buffer,
            globals_bind_group,
            transform_layout,
        })
    }
}

#[derive(Debug)]
struct GeometryBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
}

#[derive(Debug)]
pub struct Renderer {
    ctx: Context,
    resources: GpuResources,
    projection: Projection,
    globals: GlobalsUniform,
    transforms: TransformTexture,
    geometry: Option<GeometryBuffers>,
}

impl Renderer {
    pub async fn new(mut ctx: Context, config: &SwarmConfig, instance_count: usize) -> Result<Self> {
        config.validate()?;
        ctx.clear_colour = config.clear_colour;
        let projection = Projection::new(
            ctx.config.width,
            ctx.config.height,
            config.fov_degrees,
            config.near,
            config.far,
        )?;
        let globals = GlobalsUniform::new(&projection, config.fog_distance);
        let resources = GpuResources::new(&ctx.device, ctx.config.format, globals).await?;

        let shape = TextureShape::for_instances(instance_count, config.transform_texture_width);
        check_shape(&ctx.device, shape)?;
        let transforms = TransformTexture::new(&ctx.device, &resources.transform_layout, shape);

        Ok(Self {
            ctx,
            resources,
            projection,
            globals,
            transforms,
            geometry: None,
        })
    }

    /// New viewport size: surface, depth buffer and projection. Vertex data and
    /// the transform texture stay as they are.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool> {
        if !self.ctx.resize(width, height) {
            return Ok(false);
        }
        self.projection.resize(width, height)?;
        self.globals.update_projection(&self.projection);
        self.ctx.queue.write_buffer(
            &self.resources.globals_buffer,
            0,
            bytemuck::cast_slice(&[self.globals]),
        );
        Ok(true)
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

fn check_shape(device: &wgpu::Device, shape: TextureShape) -> Result<()> {
    let max = device.limits().max_texture_dimension_2d;
    if shape.width > max || shape.height > max {
        return Err(Error::InvalidConfig(format!(
            "transform texture {}x{} exceeds the device limit of {}",
            shape.width, shape.height, max
        )));
    }
    Ok(())
}

impl FrameTarget for Renderer {
    fn upload_geometry(&mut self, geometry: &PackedGeometry) -> Result<()> {
        let device = &self.ctx.device;
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Swarm Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Swarm Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.geometry = Some(GeometryBuffers { vertex, index });
        Ok(())
    }

    fn upload_transforms(&mut self, transforms: &[f32], shape: TextureShape) -> Result<bool> {
        if shape != self.transforms.shape() {
            check_shape(&self.ctx.device, shape)?;
        }
        Ok(self.transforms.write(
            &self.ctx.device,
            &self.ctx.queue,
            &self.resources.transform_layout,
            transforms,
            shape,
        ))
    }

    fn draw(&mut self, index_count: u32) -> Result<()> {
        let geometry = self.geometry.as_ref().ok_or(Error::NotInitialized)?;
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if index_count > 0 {
                render_pass.set_pipeline(&self.resources.pipeline);
                render_pass.set_bind_group(0, &self.resources.globals_bind_group, &[]);
                render_pass.set_bind_group(1, self.transforms.bind_group(), &[]);
                render_pass.set_vertex_buffer(0, geometry.vertex.slice(..));
                render_pass.set_index_buffer(geometry.index.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..index_count, 0, 0..1);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
