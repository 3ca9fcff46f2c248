//! Static vertex and index packing.
//!
//! Mesh topology never changes during a session, so every instance's copy of
//! its mesh is written once at start-up. Each copied vertex is tagged with the
//! owning instance's index, which the vertex shader uses to fetch the matching
//! matrix from the transform texture.

use std::mem;

use crate::{
    data_structures::scene::Scene,
    error::{Error, Result},
};

/// The interleaved vertex as stored on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub normal: [f32; 4],
    pub instance_index: u32,
}

impl PackedVertex {
    /**
     * Stride layout: homogeneous position, colour, normal (w = 0) and the
     * owning instance index. Locations match `swarm.wgsl`.
     */
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PackedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        }
    }
}

/// Everything the single draw call needs, ready for upload.
#[derive(Clone, Debug, Default)]
pub struct PackedGeometry {
    pub vertices: Vec<PackedVertex>,
    pub indices: Vec<u32>,
    pub instance_count: usize,
}

impl PackedGeometry {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Copy each instance's mesh into one vertex/index buffer pair.
///
/// Triangle indices are offset by the number of vertices written before the
/// instance. Re-run only when objects or meshes are added.
pub fn pack_geometry(scene: &Scene) -> Result<PackedGeometry> {
    let (vertex_total, index_total) = scene.iter().try_fold((0usize, 0usize), |(v, i), instance| {
        let mesh = scene.mesh(instance.mesh()).ok_or_else(|| missing_mesh(instance.mesh().index()))?;
        Ok::<_, Error>((v + mesh.vertices().len(), i + mesh.index_count()))
    })?;
    if u32::try_from(vertex_total).is_err() || u32::try_from(index_total).is_err() {
        return Err(Error::InvalidConfig(format!(
            "{} vertices / {} indices exceed 32 bit indexing",
            vertex_total, index_total
        )));
    }

    let mut vertices = Vec::with_capacity(vertex_total);
    let mut indices = Vec::with_capacity(index_total);
    for instance in scene.iter() {
        let mesh = scene.mesh(instance.mesh()).ok_or_else(|| missing_mesh(instance.mesh().index()))?;
        let offset = vertices.len() as u32;
        let instance_index = instance.index().get();
        vertices.extend(mesh.vertices().iter().map(|v| PackedVertex {
            position: [v.position[0], v.position[1], v.position[2], 1.0],
            color: v.color,
            normal: [v.normal[0], v.normal[1], v.normal[2], 0.0],
            instance_index,
        }));
        indices.extend(mesh.triangles().iter().flatten().map(|&i| i + offset));
    }

    log::info!(
        "packed {} vertices and {} indices for {} instances",
        vertices.len(),
        indices.len(),
        scene.count()
    );
    Ok(PackedGeometry {
        vertices,
        indices,
        instance_count: scene.count(),
    })
}

fn missing_mesh(id: usize) -> Error {
    Error::InvalidConfig(format!("instance refers to unknown mesh {}", id))
}
