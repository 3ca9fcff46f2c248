//! Render pipeline definitions.
//!
//! - `basic` holds the shared pipeline builder
//! - `swarm` builds the instanced cube program and its bind group layouts

pub mod basic;
pub mod swarm;
