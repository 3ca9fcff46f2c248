//! Perspective projection for the fixed camera.
//!
//! The camera sits at the origin looking down `-z`, so the projection is the
//! whole view transform: object matrices already place cubes in view space.
//! wgpu expects clip-space depth in `0..1`, whereas the classic frustum matrix
//! produces `-1..1`; [`OPENGL_TO_WGPU_MATRIX`] bridges the two.

use cgmath::Matrix4;

use crate::{
    error::{Error, Result},
    math::degrees_to_radians,
};

/// Remaps OpenGL clip depth (`-1..1`) to the wgpu range (`0..1`).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

fn validate(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Result<()> {
    let reason = if !(near > 0.0) {
        Some("near plane must be positive")
    } else if !(far > near) {
        Some("far plane must lie beyond the near plane")
    } else if !far.is_finite() {
        Some("far plane must be finite")
    } else if !(aspect_ratio > 0.0) || !aspect_ratio.is_finite() {
        Some("aspect ratio must be positive")
    } else if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
        Some("field of view must be within (0, 180) degrees")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::InvalidProjection {
            fov_degrees,
            aspect_ratio,
            near,
            far,
            reason,
        }),
        None => Ok(()),
    }
}

/// Symmetric frustum with OpenGL depth: `near` maps to -1, `far` to +1.
///
/// The frustum half-height is `tan(fov / 2) * near` and the half-width is
/// that value scaled by the aspect ratio.
pub fn build_gl_perspective(
    fov_degrees: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
) -> Result<Matrix4<f32>> {
    validate(fov_degrees, aspect_ratio, near, far)?;
    let top = (degrees_to_radians(fov_degrees) / 2.0).tan() * near;
    let right = aspect_ratio * top;
    Ok(cgmath::frustum(-right, right, -top, top, near, far))
}

/// Perspective projection in wgpu clip space: `near` maps to depth 0, `far` to 1.
///
/// `aspect_ratio` is `viewport_width / viewport_height`.
pub fn build_perspective_projection(
    fov_degrees: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
) -> Result<Matrix4<f32>> {
    Ok(OPENGL_TO_WGPU_MATRIX * build_gl_perspective(fov_degrees, aspect_ratio, near, far)?)
}

/// The process-wide projection. Only a viewport resize changes it.
#[derive(Clone, Debug)]
pub struct Projection {
    fov_degrees: f32,
    near: f32,
    far: f32,
    aspect_ratio: f32,
    matrix: Matrix4<f32>,
}

impl Projection {
    pub fn new(width: u32, height: u32, fov_degrees: f32, near: f32, far: f32) -> Result<Self> {
        let aspect_ratio = aspect(width, height);
        let matrix = build_perspective_projection(fov_degrees, aspect_ratio, near, far)?;
        Ok(Self {
            fov_degrees,
            near,
            far,
            aspect_ratio,
            matrix,
        })
    }

    /// Rebuild the matrix for a new viewport. Buffers and textures are untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let aspect_ratio = aspect(width, height);
        self.matrix = build_perspective_projection(self.fov_degrees, aspect_ratio, self.near, self.far)?;
        self.aspect_ratio = aspect_ratio;
        Ok(())
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    if height == 0 {
        // Rejected by `validate` as a non-finite/non-positive ratio.
        return 0.0;
    }
    width as f32 / height as f32
}

/// Per-draw uniforms: the projection and the fog reference distance.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalsUniform {
    projection: [[f32; 4]; 4],
    fog_distance: f32,
    // Uniform structs are padded to 16 bytes.
    _padding: [f32; 3],
}

impl GlobalsUniform {
    pub fn new(projection: &Projection, fog_distance: f32) -> Self {
        Self {
            projection: projection.matrix().into(),
            fog_distance,
            _padding: [0.0; 3],
        }
    }

    pub fn update_projection(&mut self, projection: &Projection) {
        self.projection = projection.matrix().into();
    }
}
