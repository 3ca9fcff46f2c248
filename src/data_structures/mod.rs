//! Scene data: meshes, instances, the object store and GPU textures.
//!
//! - `model` holds the shared mesh data (vertices, triangles) and the cube mesh
//! - `instance` holds per-object transform and speed
//! - `scene` is the index-addressable store of meshes and instances
//! - `texture` wraps the depth buffer and the transform texture

pub mod instance;
pub mod model;
pub mod scene;
pub mod texture;
