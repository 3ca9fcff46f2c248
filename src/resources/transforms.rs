//! Per-frame matrix packing.
//!
//! The instance count (thousands) is far beyond what a uniform array can hold
//! and WebGL2 has no storage buffers, so matrices travel in a float texture
//! instead. This module produces the linear float buffer and the texture
//! shape it needs; [`TransformTexture`](crate::data_structures::texture::TransformTexture)
//! does the upload.

use crate::{
    data_structures::scene::Scene,
    error::{Error, Result},
};

pub const FLOATS_PER_MATRIX: usize = 16;
pub const TEXELS_PER_MATRIX: u32 = 4;

/// Texture rows must hold whole matrices and stay a power of two wide.
pub fn check_texture_width(width: u32) -> Result<()> {
    if width < TEXELS_PER_MATRIX || !width.is_power_of_two() {
        return Err(Error::InvalidConfig(format!(
            "transform texture width {} must be a power of two of at least {}",
            width, TEXELS_PER_MATRIX
        )));
    }
    Ok(())
}

/// Dimensions of the transform texture in texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureShape {
    pub width: u32,
    pub height: u32,
}

impl TextureShape {
    /// Smallest shape of the given width that holds `instance_count` matrices.
    ///
    /// Always derived from the current count, never cached, so the texture can
    /// not fall behind the instance list. An empty scene still gets one row.
    pub fn for_instances(instance_count: usize, width: u32) -> Self {
        let texels = instance_count as u64 * TEXELS_PER_MATRIX as u64;
        let height = texels.div_ceil(width as u64).max(1);
        Self {
            width,
            height: height as u32,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Texel holding `column` of the matrix for `instance`, as `(x, y)`.
    /// The vertex shader computes the same address.
    pub fn texel(&self, instance: u32, column: u32) -> (u32, u32) {
        let texel = instance * TEXELS_PER_MATRIX + column;
        (texel % self.width, texel / self.width)
    }
}

/// Flatten every instance's model matrix, column-major, into one buffer.
///
/// Matrix `i` occupies floats `16 * i .. 16 * (i + 1)` where `i` is the
/// instance's stored index.
pub fn pack_transforms(scene: &Scene) -> Vec<f32> {
    let mut out = Vec::new();
    pack_transforms_into(scene, &mut out);
    out
}

/// Like [`pack_transforms`] but reuses `out` to avoid a per-frame allocation.
pub fn pack_transforms_into(scene: &Scene, out: &mut Vec<f32>) {
    out.clear();
    out.resize(scene.count() * FLOATS_PER_MATRIX, 0.0);
    scene.for_each_object(|instance| {
        let start = instance.index().get() as usize * FLOATS_PER_MATRIX;
        let raw = instance.to_raw();
        out[start..start + FLOATS_PER_MATRIX].copy_from_slice(bytemuck::cast_slice(&raw.columns));
    });
}

#[cfg(test)]
mod tests {
    use cgmath::{One, Quaternion, Vector3};

    use super::*;
    use crate::data_structures::model::Mesh;

    fn scene_with(positions: &[[f32; 3]]) -> Scene {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(Mesh::cube());
        for &position in positions {
            scene
                .add_object(
                    position.into(),
                    Vector3::new(1.0, 1.0, 1.0),
                    Quaternion::one(),
                    0.0,
                    cube,
                )
                .unwrap();
        }
        scene
    }

    #[test]
    fn buffer_holds_sixteen_floats_per_object() {
        let positions: Vec<[f32; 3]> = (0..37).map(|i| [i as f32, 0.0, -1.0]).collect();
        let packed = pack_transforms(&scene_with(&positions));
        assert_eq!(packed.len(), 37 * FLOATS_PER_MATRIX);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let packed = pack_transforms(&scene_with(&[[4.0, 5.0, -6.0]]));
        assert_eq!(&packed[12..16], &[4.0, 5.0, -6.0, 1.0]);
    }

    #[test]
    fn height_covers_instance_count() {
        for (count, width, height) in [
            (0, 1024, 1),
            (1, 1024, 1),
            (256, 1024, 1),
            (257, 1024, 2),
            (5000, 1024, 20),
            (3, 4, 3),
        ] {
            let shape = TextureShape::for_instances(count, width);
            assert_eq!(shape.height, height, "{} instances at width {}", count, width);
            assert!(shape.capacity() >= count as u64 * 4);
        }
    }

    #[test]
    fn width_must_be_a_power_of_two_of_at_least_four() {
        for width in [0, 1, 2, 3, 6, 1000] {
            assert!(check_texture_width(width).is_err(), "accepted {}", width);
        }
        for width in [4, 8, 1024, 4096] {
            assert!(check_texture_width(width).is_ok(), "rejected {}", width);
        }
    }

    #[test]
    fn texel_addresses_wrap_rows() {
        let shape = TextureShape::for_instances(10, 8);
        assert_eq!(shape.texel(0, 0), (0, 0));
        assert_eq!(shape.texel(1, 3), (7, 0));
        assert_eq!(shape.texel(2, 0), (0, 1));
        assert_eq!(shape.texel(9, 3), (7, 4));
    }

    #[test]
    fn reused_buffer_is_resized() {
        let mut out = vec![42.0; 3];
        pack_transforms_into(&scene_with(&[[0.0; 3], [1.0; 3]]), &mut out);
        assert_eq!(out.len(), 32);
        assert_eq!(out[0], 1.0);
    }
}
