//! Tunables for the cube field.
//!
//! The defaults reproduce the reference scene: a 70° camera, cubes drifting
//! towards the viewer and recycled 220 units back once they pass `z = 20`.

use crate::{
    camera::build_perspective_projection, error::Error,
    resources::transforms::check_texture_width,
};

#[derive(Clone, Debug)]
pub struct SwarmConfig {
    /// Number of cubes placed in the field.
    pub object_count: usize,
    /// Cubes per lattice row (x) and rows per layer (y).
    pub columns: u32,
    pub rows: u32,
    /// Distance between neighbouring lattice cells.
    pub spacing: f32,
    /// Per-axis scale applied to every cube.
    pub cube_scale: [f32; 3],
    /// Speeds are `base_speed + speed_variation * t` for a deterministic `t` in `0..1`.
    pub base_speed: f32,
    pub speed_variation: f32,
    /// Displacement per tick is `speed * speed_scale`.
    pub speed_scale: f32,
    /// Cubes whose z exceeds `wrap_bound` are moved back by `wrap_distance`.
    pub wrap_bound: f32,
    pub wrap_distance: f32,
    /// Spin applied to every cube each tick. Zero disables spinning.
    pub spin_degrees_per_tick: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Fog factor is `clamp(fog_distance / clip_w, 0, 1)`.
    pub fog_distance: f32,
    /// Texels per row of the transform texture. Must be a power of two.
    pub transform_texture_width: u32,
    pub clear_colour: wgpu::Color,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            object_count: 4096,
            columns: 32,
            rows: 16,
            spacing: 2.5,
            cube_scale: [1.0; 3],
            base_speed: 0.01,
            speed_variation: 0.02,
            speed_scale: 10.0,
            wrap_bound: 20.0,
            wrap_distance: 220.0,
            spin_degrees_per_tick: 0.5,
            fov_degrees: 70.0,
            near: 0.01,
            far: 100000.0,
            fog_distance: 20.0,
            transform_texture_width: 1024,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

impl SwarmConfig {
    /// Check everything that would otherwise surface as NaNs or a broken texture later.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        check_texture_width(self.transform_texture_width)?;
        if self.columns == 0 || self.rows == 0 {
            return invalid(format!("lattice {}x{} is empty", self.columns, self.rows));
        }
        if self.columns.checked_mul(self.rows).is_none() {
            return invalid(format!("lattice {}x{} is too large", self.columns, self.rows));
        }
        if !(self.spacing > 0.0) {
            return invalid(format!("spacing {} must be positive", self.spacing));
        }
        if !(self.wrap_distance > 0.0) {
            return invalid(format!(
                "wrap distance {} must be positive",
                self.wrap_distance
            ));
        }
        if self.u32_object_count().is_none() {
            return invalid(format!("{} objects do not fit a u32 index", self.object_count));
        }
        build_perspective_projection(self.fov_degrees, 1.0, self.near, self.far)?;
        Ok(())
    }

    fn u32_object_count(&self) -> Option<u32> {
        u32::try_from(self.object_count)
            .ok()
            .filter(|count| count.checked_mul(4).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SwarmConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_power_of_two_width() {
        let config = SwarmConfig {
            transform_texture_width: 1000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_overflowing_lattice() {
        let config = SwarmConfig {
            columns: 1 << 16,
            rows: 1 << 16,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_infinite_far_plane() {
        let config = SwarmConfig {
            far: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidProjection { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_projection() {
        let config = SwarmConfig {
            near: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidProjection { .. })
        ));
    }
}
