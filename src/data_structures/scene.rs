//! The authoritative object store.
//!
//! Instances live in an append-only vector and carry the index they were
//! created with. Packing code addresses output slots by that stored index,
//! never by iteration position, so the transform texture and the per-vertex
//! instance attribute always agree.

use cgmath::{Deg, Quaternion, Vector3};

use crate::{
    config::SwarmConfig,
    data_structures::{
        instance::{Instance, InstanceIndex},
        model::{Mesh, MeshId},
    },
    error::{Error, Result},
    math::{axis_angle_to_quaternion, normalize_quaternion},
};

#[derive(Clone, Debug, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    instances: Vec<Instance>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Add an object drawing `mesh`. The rotation is renormalized on the way in.
    pub fn add_object(
        &mut self,
        position: Vector3<f32>,
        scale: Vector3<f32>,
        rotation: Quaternion<f32>,
        speed: f32,
        mesh: MeshId,
    ) -> Result<InstanceIndex> {
        if self.mesh(mesh).is_none() {
            return Err(Error::InvalidConfig(format!(
                "mesh {} does not exist ({} meshes registered)",
                mesh.0,
                self.meshes.len()
            )));
        }
        let index = u32::try_from(self.instances.len())
            .ok()
            .filter(|i| i.checked_add(1).and_then(|n| n.checked_mul(4)).is_some())
            .map(InstanceIndex)
            .ok_or_else(|| Error::InvalidConfig("too many objects for the transform texture".into()))?;
        self.instances.push(Instance::new(
            index,
            mesh,
            position,
            scale,
            normalize_quaternion(rotation),
            speed,
        ));
        Ok(index)
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    pub fn get(&self, index: InstanceIndex) -> Option<&Instance> {
        self.instances.get(index.0 as usize)
    }

    pub fn get_mut(&mut self, index: InstanceIndex) -> Option<&mut Instance> {
        self.instances.get_mut(index.0 as usize)
    }

    /// Instances in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    pub fn for_each_object(&self, f: impl FnMut(&Instance)) {
        self.instances.iter().for_each(f);
    }

    pub fn for_each_object_mut(&mut self, f: impl FnMut(&mut Instance)) {
        self.instances.iter_mut().for_each(f);
    }

    /// Fill a scene with cubes on a lattice spread over the recycling range.
    ///
    /// Placement, speed and initial orientation are derived from the object's
    /// index, so the same config always yields the same field.
    pub fn cube_field(config: &SwarmConfig) -> Result<Self> {
        config.validate()?;
        let mut scene = Scene::new();
        let cube = scene.add_mesh(Mesh::cube());

        let per_layer = config.columns as usize * config.rows as usize;
        let layers = config.object_count.div_ceil(per_layer).max(1);
        let layer_depth = config.wrap_distance / layers as f32;
        let far_edge = config.wrap_bound - config.wrap_distance;
        let half_width = (config.columns - 1) as f32 / 2.0;
        let half_height = (config.rows - 1) as f32 / 2.0;

        for i in 0..config.object_count {
            let layer = i / per_layer;
            let cell = i % per_layer;
            let column = (cell % config.columns as usize) as f32;
            let row = (cell / config.columns as usize) as f32;
            let jitter = golden_fraction(i);

            let position = Vector3::new(
                (column - half_width) * config.spacing,
                (row - half_height) * config.spacing,
                far_edge + (layer as f32 + jitter) * layer_depth,
            );
            let axis = Vector3::new(jitter, 1.0 - jitter, 0.5);
            let rotation = axis_angle_to_quaternion(axis, Deg(360.0 * jitter))?;
            let speed = config.base_speed + config.speed_variation * jitter;

            scene.add_object(position, config.cube_scale.into(), rotation, speed, cube)?;
        }
        log::info!(
            "cube field: {} objects in {} layers of {}x{}",
            scene.count(),
            layers,
            config.columns,
            config.rows
        );
        Ok(scene)
    }
}

/// Low-discrepancy value in `0..1` for index `i`.
fn golden_fraction(i: usize) -> f32 {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    ((i as f64 * GOLDEN) % 1.0) as f32
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, One};

    use super::*;

    #[test]
    fn indices_follow_creation_order() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(Mesh::cube());
        for x in 0..5 {
            let index = scene
                .add_object(
                    Vector3::new(x as f32, 0.0, 0.0),
                    Vector3::new(1.0, 1.0, 1.0),
                    Quaternion::one(),
                    0.0,
                    cube,
                )
                .unwrap();
            assert_eq!(index.get(), x);
        }
        assert_eq!(scene.count(), 5);
        let ordered: Vec<u32> = scene.iter().map(|i| i.index().get()).collect();
        assert_eq!(ordered, vec![0, 1, 2, 3, 4]);
        assert_eq!(scene.get(InstanceIndex(3)).unwrap().position.x, 3.0);
    }

    #[test]
    fn unknown_mesh_is_rejected() {
        let mut scene = Scene::new();
        let result = scene.add_object(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Quaternion::one(),
            0.0,
            MeshId(7),
        );
        assert!(result.is_err());
        assert_eq!(scene.count(), 0);
    }

    #[test]
    fn stored_rotations_are_unit() {
        let mut scene = Scene::new();
        let cube = scene.add_mesh(Mesh::cube());
        let index = scene
            .add_object(
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
                Quaternion::new(3.0, 0.0, 4.0, 0.0),
                0.0,
                cube,
            )
            .unwrap();
        let rotation = scene.get(index).unwrap().rotation;
        assert!((rotation.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mutation_in_place_keeps_indices() {
        let mut scene = Scene::cube_field(&SwarmConfig {
            object_count: 10,
            ..Default::default()
        })
        .unwrap();
        scene.for_each_object_mut(|instance| instance.position.z += 1.0);
        let mut expected = 0;
        scene.for_each_object(|instance| {
            assert_eq!(instance.index().get(), expected);
            expected += 1;
        });
    }

    #[test]
    fn cube_field_fills_recycling_range() {
        let config = SwarmConfig {
            object_count: 1000,
            ..Default::default()
        };
        let scene = Scene::cube_field(&config).unwrap();
        assert_eq!(scene.count(), 1000);
        assert_eq!(scene.meshes().len(), 1);
        let low = config.wrap_bound - config.wrap_distance;
        for instance in scene.iter() {
            assert!(instance.position.z >= low && instance.position.z <= config.wrap_bound);
            assert!(instance.speed >= config.base_speed);
            assert!(instance.speed <= config.base_speed + config.speed_variation);
        }
    }

    #[test]
    fn cube_field_is_deterministic() {
        let config = SwarmConfig {
            object_count: 64,
            ..Default::default()
        };
        let a = Scene::cube_field(&config).unwrap();
        let b = Scene::cube_field(&config).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.rotation, y.rotation);
        }
    }
}
