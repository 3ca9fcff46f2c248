//! swarm-ngin
//!
//! Renders thousands of moving cubes with a single draw call per frame. Every
//! object's model matrix is packed into a floating-point texture that the
//! vertex stage indexes by instance, so the per-object cost on the CPU is one
//! matrix pack and nothing else. Runs natively and on the web (WebGL2).
//!
//! High-level modules
//! - `math`: quaternion and colour helpers
//! - `camera`: perspective projection and the globals uniform
//! - `config`: tunables for the cube field
//! - `data_structures`: meshes, instances, the object store and textures
//! - `resources`: vertex/index packing and transform packing
//! - `pipelines`: the instanced render pipeline and its shader
//! - `context`: device, queue and surface
//! - `render`: the wgpu frame target
//! - `driver`: per-frame motion and submission
//! - `flow`: the winit event loop
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod driver;
pub mod error;
pub mod flow;
pub mod math;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use error::{Error, Result};
