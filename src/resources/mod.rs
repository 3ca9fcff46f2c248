//! CPU-side packing of scene data into GPU upload layouts.
//!
//! - `geometry` builds the static vertex and index buffers once per session
//! - `transforms` flattens every model matrix into the transform texture layout

pub mod geometry;
pub mod transforms;
