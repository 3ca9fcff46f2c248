//! Shared mesh data.
//!
//! A [`Mesh`] is immutable once built and is referenced by every instance that
//! draws it; instances never copy or mutate vertex data themselves.

use crate::math::normalize_color_byte;

/// A mesh-local vertex: position, normalized RGBA colour and normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub normal: [f32; 3],
}

/// Three indices into a mesh's vertex list, counter-clockwise when seen from the front.
pub type Triangle = [u32; 3];

/// Handle to a mesh stored in a [`Scene`](super::scene::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

impl MeshId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Build a mesh, rejecting triangles that point past the vertex list.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        triangles: Vec<Triangle>,
    ) -> crate::Result<Self> {
        let name = name.into();
        let vertex_count = vertices.len() as u32;
        if let Some(bad) = triangles.iter().find(|t| t.iter().any(|&i| i >= vertex_count)) {
            return Err(crate::Error::InvalidConfig(format!(
                "mesh {} has triangle {:?} but only {} vertices",
                name, bad, vertex_count
            )));
        }
        Ok(Self {
            name,
            vertices,
            triangles,
        })
    }

    /// A unit cube centred on the origin, one colour per face.
    ///
    /// Every face gets its own four vertices so that normals and colours stay
    /// flat across the face.
    pub fn cube() -> Self {
        const P: f32 = 0.5;
        // (normal, colour, four corners counter-clockwise seen from outside)
        #[rustfmt::skip]
        let faces: [([f32; 3], [f32; 4], [[f32; 3]; 4]); 6] = [
            ([ 1.0, 0.0, 0.0], normalize_color_byte(179, 128, 179), [[ P, -P,  P], [ P, -P, -P], [ P,  P, -P], [ P,  P,  P]]),
            ([-1.0, 0.0, 0.0], normalize_color_byte(179, 179, 128), [[-P, -P, -P], [-P, -P,  P], [-P,  P,  P], [-P,  P, -P]]),
            ([ 0.0, 1.0, 0.0], normalize_color_byte(179, 179, 179), [[-P,  P,  P], [ P,  P,  P], [ P,  P, -P], [-P,  P, -P]]),
            ([ 0.0,-1.0, 0.0], normalize_color_byte(255,   0,   0), [[-P, -P, -P], [ P, -P, -P], [ P, -P,  P], [-P, -P,  P]]),
            ([ 0.0, 0.0, 1.0], normalize_color_byte( 64, 128, 255), [[-P, -P,  P], [ P, -P,  P], [ P,  P,  P], [-P,  P,  P]]),
            ([ 0.0, 0.0,-1.0], normalize_color_byte( 64, 200, 120), [[ P, -P, -P], [-P, -P, -P], [-P,  P, -P], [ P,  P, -P]]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);
        for (normal, color, corners) in faces {
            let base = vertices.len() as u32;
            vertices.extend(corners.iter().map(|&position| Vertex {
                position,
                color,
                normal,
            }));
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base + 2, base + 3, base]);
        }

        Self {
            name: "cube".to_string(),
            vertices,
            triangles,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn index_count(&self) -> usize {
        self.triangles.len() * 3
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn cube_has_flat_faces() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.triangles().len(), 12);
        assert_eq!(cube.index_count(), 36);
    }

    #[test]
    fn cube_winding_is_counter_clockwise_from_outside() {
        let cube = Mesh::cube();
        for triangle in cube.triangles() {
            let [a, b, c] = triangle.map(|i| cube.vertices()[i as usize]);
            let (pa, pb, pc): (Vector3<f32>, Vector3<f32>, Vector3<f32>) =
                (a.position.into(), b.position.into(), c.position.into());
            let face_normal = (pb - pa).cross(pc - pa);
            let normal: Vector3<f32> = a.normal.into();
            assert!(face_normal.dot(normal) > 0.0, "{:?} winds clockwise", triangle);
            // Outward: the normal points away from the centre.
            assert!(pa.dot(normal) > 0.0);
        }
    }

    #[test]
    fn cube_colours_are_opaque_and_normalized() {
        for vertex in Mesh::cube().vertices() {
            assert_eq!(vertex.color[3], 1.0);
            assert!(vertex.color.iter().all(|c| (0.0..=1.0).contains(c)));
            assert!((Vector3::from(vertex.normal).magnitude() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn out_of_range_triangles_are_rejected() {
        let vertex = Vertex {
            position: [0.0; 3],
            color: [1.0; 4],
            normal: [0.0, 0.0, 1.0],
        };
        assert!(Mesh::new("broken", vec![vertex; 3], vec![[0, 1, 3]]).is_err());
        assert!(Mesh::new("ok", vec![vertex; 3], vec![[0, 1, 2]]).is_ok());
    }
}
