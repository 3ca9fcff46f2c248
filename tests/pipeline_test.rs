use cgmath::{Matrix4, Vector3, Vector4};
use swarm_ngin::{
    config::SwarmConfig,
    data_structures::scene::Scene,
    driver::{motion_from_config, FrameDriver, LinearWrap},
    resources::{
        geometry::pack_geometry,
        transforms::{pack_transforms, TextureShape, FLOATS_PER_MATRIX},
    },
};

use crate::common::test_utils::{assert_close, cubes_at, Recorder};

mod common;

fn matrix_at(buffer: &[f32], instance: u32) -> Matrix4<f32> {
    let start = instance as usize * FLOATS_PER_MATRIX;
    let m = &buffer[start..start + FLOATS_PER_MATRIX];
    Matrix4::new(
        m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12], m[13],
        m[14], m[15],
    )
}

#[test]
fn three_cubes_in_a_row_differ_only_in_translation() {
    let (scene, _) = cubes_at(&[[0.0, 0.0, -4.0], [1.0, 0.0, -4.0], [2.0, 0.0, -4.0]], 0.0);
    let packed = pack_transforms(&scene);

    assert_eq!(packed.len(), 3 * 16);
    let first = &packed[0..16];
    for i in 1..3 {
        let other = &packed[i * 16..(i + 1) * 16];
        assert_eq!(&first[..12], &other[..12]);
        assert_close(other[12], i as f32);
        assert_close(other[13], 0.0);
        assert_close(other[14], -4.0);
        assert_close(other[15], 1.0);
    }
}

#[test]
fn every_vertex_finds_its_own_matrix() {
    let positions = [[0.0, 0.0, -4.0], [5.0, -2.0, -9.0], [-3.0, 7.0, -1.0]];
    let (scene, _) = cubes_at(&positions, 0.0);
    let geometry = pack_geometry(&scene).unwrap();
    let transforms = pack_transforms(&scene);
    let cube = &scene.meshes()[0];
    let per_instance = cube.vertices().len();

    for (i, vertex) in geometry.vertices.iter().enumerate() {
        let local = cube.vertices()[i % per_instance].position;
        let world = matrix_at(&transforms, vertex.instance_index) * Vector4::from(vertex.position);
        let expected = positions[i / per_instance];
        assert_close(world.x, local[0] + expected[0]);
        assert_close(world.y, local[1] + expected[1]);
        assert_close(world.z, local[2] + expected[2]);
        assert_close(world.w, 1.0);
    }
}

#[test]
fn texture_always_holds_every_matrix() {
    for width in [4, 16, 1024] {
        for count in [0usize, 1, 3, 255, 256, 257, 4096, 10_001] {
            let shape = TextureShape::for_instances(count, width);
            assert_eq!(shape.width, width);
            assert!(shape.capacity() >= count as u64 * 4, "{} objects at width {}", count, width);
            assert!(shape.height >= 1);
            if count > 0 {
                // One row less would not fit.
                assert!((shape.height as u64 - 1) * (width as u64) < count as u64 * 4);
            }
        }
    }
}

#[test]
fn objects_recycle_after_crossing_the_bound() {
    // Speed 0.01 scaled by 10 moves 0.1 per tick.
    let (scene, indices) = cubes_at(&[[0.0, 0.0, 19.55]], 0.01);
    let motion = LinearWrap::new(Vector3::unit_z(), 10.0, 20.0, 220.0).unwrap();
    let mut driver = FrameDriver::new(scene, motion, 1024).unwrap();
    let mut target = Recorder::new();
    driver.initialize(&mut target).unwrap();

    let mut zs = Vec::new();
    for _ in 0..6 {
        driver.step(&mut target).unwrap();
        zs.push(target.last_transforms()[14]);
    }

    assert_close(zs[3], 19.95);
    // 20.05 passes the bound and is pushed 220 back.
    assert_close(zs[4], -199.95);
    assert_close(zs[5], -199.85);
    let position = driver.scene().get(indices[0]).unwrap().position;
    assert_close(position.z, -199.85);
}

#[test]
fn one_draw_per_frame_covering_every_index() {
    let (scene, _) = cubes_at(&[[0.0, 0.0, -4.0], [1.0, 0.0, -4.0], [2.0, 0.0, -4.0]], 0.01);
    let motion = LinearWrap::new(Vector3::unit_z(), 10.0, 20.0, 220.0).unwrap();
    let mut driver = FrameDriver::new(scene, motion, 16).unwrap();
    let mut target = Recorder::new();
    driver.initialize(&mut target).unwrap();
    for _ in 0..3 {
        driver.step(&mut target).unwrap();
    }

    assert_eq!(
        target.calls,
        vec![
            "geometry",
            "transforms",
            "draw",
            "transforms",
            "draw",
            "transforms",
            "draw"
        ]
    );
    assert_eq!(target.draws, vec![3 * 36; 3]);
    assert_eq!(target.geometry.as_ref().unwrap().index_count(), 3 * 36);
    assert!(target.shapes.iter().all(|s| *s == TextureShape { width: 16, height: 1 }));
}

#[test]
fn default_field_runs_with_one_draw() {
    let config = SwarmConfig::default();
    let scene = Scene::cube_field(&config).unwrap();
    let motion = motion_from_config(&config).unwrap();
    let mut driver = FrameDriver::new(scene, motion, config.transform_texture_width).unwrap();
    let mut target = Recorder::new();
    driver.initialize(&mut target).unwrap();

    let stats = driver.step(&mut target).unwrap();
    assert_eq!(stats.frame, 1);
    assert_eq!(stats.instances, config.object_count);
    assert_eq!(stats.floats_uploaded, config.object_count * 16);
    assert_eq!(stats.indices_drawn as usize, config.object_count * 36);
    assert!(stats.texture_reallocated);
    assert_eq!(target.shapes[0], TextureShape { width: 1024, height: 16 });

    let stats = driver.step(&mut target).unwrap();
    assert!(!stats.texture_reallocated);
}

#[test]
fn growing_the_scene_repacks_geometry_and_texture() {
    let (scene, _) = cubes_at(&[[0.0, 0.0, -4.0]; 4], 0.0);
    let motion = LinearWrap::new(Vector3::unit_z(), 10.0, 20.0, 220.0).unwrap();
    let mut driver = FrameDriver::new(scene, motion, 16).unwrap();
    let mut target = Recorder::new();
    driver.initialize(&mut target).unwrap();
    driver.step(&mut target).unwrap();

    let mesh = driver.scene().iter().next().unwrap().mesh();
    driver
        .scene_mut()
        .add_object(
            Vector3::new(0.0, 0.0, -8.0),
            Vector3::new(1.0, 1.0, 1.0),
            cgmath::Quaternion::new(1.0, 0.0, 0.0, 0.0),
            0.0,
            mesh,
        )
        .unwrap();
    let stats = driver.step(&mut target).unwrap();

    assert!(stats.texture_reallocated);
    assert_eq!(stats.indices_drawn, 5 * 36);
    assert_eq!(target.geometry.as_ref().unwrap().instance_count, 5);
    assert_eq!(target.shapes.last(), Some(&TextureShape { width: 16, height: 2 }));
    assert_eq!(target.last_transforms().len(), 5 * 16);
    assert_eq!(*target.draws.last().unwrap(), 5 * 36);
}

#[test]
fn zero_texture_width_is_rejected_up_front() {
    let (scene, _) = cubes_at(&[[0.0, 0.0, -4.0]], 0.0);
    let motion = LinearWrap::new(Vector3::unit_z(), 10.0, 20.0, 220.0).unwrap();
    assert!(FrameDriver::new(scene, motion, 0).is_err());
}
