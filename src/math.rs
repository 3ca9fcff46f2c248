//! Quaternion and vector helpers used by the instancing pipeline.
//!
//! All rotations in this crate follow one convention: Hamilton quaternions in a
//! right-handed coordinate system, column vectors and column-major matrices
//! (the `cgmath` layout). `quaternion_multiply(p, q)` therefore rotates by `q`
//! first and then by `p`, exactly like `Matrix4::from(p) * Matrix4::from(q)`.
//!
//! Every function here is pure, so they can be called from anywhere.

use cgmath::{InnerSpace, Matrix4, Quaternion, Rad, Vector3};

use crate::error::{Error, Result};

/// Below this squared length an axis is treated as zero.
const AXIS_EPSILON: f32 = 1e-12;

/// Convert an axis-angle rotation into a unit quaternion.
///
/// The axis is normalized before use, so callers may pass any non-zero
/// direction. A zero-length axis has no defined rotation and is rejected.
pub fn axis_angle_to_quaternion(
    axis: Vector3<f32>,
    angle: impl Into<Rad<f32>>,
) -> Result<Quaternion<f32>> {
    if axis.magnitude2() < AXIS_EPSILON || !axis.magnitude2().is_finite() {
        return Err(Error::ZeroLengthAxis);
    }
    let axis = axis.normalize();
    let angle: Rad<f32> = angle.into();
    let (sin, cos) = (angle.0 / 2.0).sin_cos();
    Ok(Quaternion::from_sv(cos, axis * sin))
}

/// Hamilton product `p * q`: the resulting rotation applies `q` first, then `p`.
pub fn quaternion_multiply(p: Quaternion<f32>, q: Quaternion<f32>) -> Quaternion<f32> {
    let (px, py, pz, pw) = (p.v.x, p.v.y, p.v.z, p.s);
    let (qx, qy, qz, qw) = (q.v.x, q.v.y, q.v.z, q.s);
    Quaternion::new(
        pw * qw - px * qx - py * qy - pz * qz,
        pw * qx + px * qw + py * qz - pz * qy,
        pw * qy - px * qz + py * qw + pz * qx,
        pw * qz + px * qy - py * qx + pz * qw,
    )
}

/// Rescale a quaternion to unit length. Composition accumulates rounding
/// error, so rotations are renormalized after every product.
pub fn normalize_quaternion(q: Quaternion<f32>) -> Quaternion<f32> {
    let magnitude = q.magnitude();
    if magnitude <= f32::EPSILON || !magnitude.is_finite() {
        return Quaternion::new(1.0, 0.0, 0.0, 0.0);
    }
    q / magnitude
}

/// Rotation matrix for a unit quaternion, embedded in a homogeneous 4x4.
///
/// The matrix is column-major and meant to be multiplied with column
/// vectors (`M * v`), matching the projection built in [`crate::camera`].
pub fn quaternion_to_rotation_matrix(q: Quaternion<f32>) -> Matrix4<f32> {
    let (x, y, z, w) = (q.v.x, q.v.y, q.v.z, q.s);

    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, xz, yz) = (x * y, x * z, y * z);
    let (wx, wy, wz) = (w * x, w * y, w * z);

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz),       2.0 * (xz - wy),       0.0,
        2.0 * (xy - wz),       1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx),       0.0,
        2.0 * (xz + wy),       2.0 * (yz - wx),       1.0 - 2.0 * (xx + yy), 0.0,
        0.0,                   0.0,                   0.0,                   1.0,
    );
    matrix
}

/// Rotate `v` by `q` using the conjugation `q * v * q⁻¹`.
pub fn apply_quaternion_to_vec3(q: Quaternion<f32>, v: Vector3<f32>) -> Vector3<f32> {
    let pure = Quaternion::from_sv(0.0, v);
    quaternion_multiply(quaternion_multiply(q, pure), q.conjugate()).v
}

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Map 8 bit colour channels to the 0..1 range the shaders expect. Alpha is opaque.
pub fn normalize_color_byte(r: u8, g: u8, b: u8) -> [f32; 4] {
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        1.0,
    ]
}
