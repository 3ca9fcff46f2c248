use cgmath::{One, Quaternion, Vector3};
use swarm_ngin::{
    Result,
    data_structures::{instance::InstanceIndex, model::Mesh, scene::Scene},
    driver::FrameTarget,
    resources::{geometry::PackedGeometry, transforms::TextureShape},
};

/// A frame target that keeps everything it is sent.
#[derive(Default)]
pub struct Recorder {
    pub geometry: Option<PackedGeometry>,
    pub calls: Vec<&'static str>,
    pub transforms: Vec<Vec<f32>>,
    pub shapes: Vec<TextureShape>,
    pub draws: Vec<u32>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_transforms(&self) -> &[f32] {
        self.transforms.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl FrameTarget for Recorder {
    fn upload_geometry(&mut self, geometry: &PackedGeometry) -> Result<()> {
        self.calls.push("geometry");
        self.geometry = Some(geometry.clone());
        Ok(())
    }

    fn upload_transforms(&mut self, transforms: &[f32], shape: TextureShape) -> Result<bool> {
        self.calls.push("transforms");
        self.transforms.push(transforms.to_vec());
        let reallocated = self.shapes.last() != Some(&shape);
        self.shapes.push(shape);
        Ok(reallocated)
    }

    fn draw(&mut self, index_count: u32) -> Result<()> {
        self.calls.push("draw");
        self.draws.push(index_count);
        Ok(())
    }
}

/// Unit cubes with identity rotation at the given positions, all with `speed`.
pub fn cubes_at(positions: &[[f32; 3]], speed: f32) -> (Scene, Vec<InstanceIndex>) {
    let mut scene = Scene::new();
    let cube = scene.add_mesh(Mesh::cube());
    let indices = positions
        .iter()
        .map(|p| {
            scene
                .add_object(
                    Vector3::from(*p),
                    Vector3::new(1.0, 1.0, 1.0),
                    Quaternion::one(),
                    speed,
                    cube,
                )
                .unwrap()
        })
        .collect();
    (scene, indices)
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
