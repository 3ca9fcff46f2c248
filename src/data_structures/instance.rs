//! Per-instance transformation data.
//!
//! Every instance keeps the index it was created with. That index selects the
//! instance's matrix in the transform texture and is baked into its vertices,
//! so it must never change after creation.

use cgmath::{Matrix4, Quaternion, Vector3};

use crate::{data_structures::model::MeshId, math::quaternion_to_rotation_matrix};

/// Position of an instance's matrix in the transform texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceIndex(pub(crate) u32);

impl InstanceIndex {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A renderable object: transform, speed and the mesh it draws.
#[derive(Clone, Debug)]
pub struct Instance {
    index: InstanceIndex,
    mesh: MeshId,
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub speed: f32,
}

impl Instance {
    pub(crate) fn new(
        index: InstanceIndex,
        mesh: MeshId,
        position: Vector3<f32>,
        scale: Vector3<f32>,
        rotation: Quaternion<f32>,
        speed: f32,
    ) -> Self {
        Self {
            index,
            mesh,
            position,
            rotation,
            scale,
            speed,
        }
    }

    pub fn index(&self) -> InstanceIndex {
        self.index
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// `T(position) * R(rotation) * S(scale)`: scale first, then rotate, then translate.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * quaternion_to_rotation_matrix(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> TransformRaw {
        TransformRaw {
            columns: self.to_matrix().into(),
        }
    }
}

/**
 * The raw transform is what ends up in the transform texture: four RGBA32F
 * texels, one per matrix column.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    pub columns: [[f32; 4]; 4],
}
