//! Error types shared by every stage of the renderer.
//!
//! Failures fall into three groups: fatal setup problems (no adapter, shader
//! program rejected), degenerate math input (zero rotation axis, impossible
//! frustum) and per-frame surface errors that the host recovers from by
//! reconfiguring the surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rotation axis has zero length")]
    ZeroLengthAxis,

    #[error(
        "invalid perspective projection (fov {fov_degrees}°, aspect {aspect_ratio}, near {near}, far {far}): {reason}"
    )]
    InvalidProjection {
        fov_degrees: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
        reason: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no suitable graphics adapter: {0}")]
    DeviceUnavailable(String),

    #[error("window could not be created: {0}")]
    CreateWindow(#[from] winit::error::OsError),

    #[error(transparent)]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error(transparent)]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("shader program could not be built:\n{0}")]
    ShaderProgram(String),

    #[error("the frame driver was stepped before it was initialized")]
    NotInitialized,

    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
}

pub type Result<T> = std::result::Result<T, Error>;
