//! Frame driver: advances object state and submits one draw per frame.
//!
//! The driver is a re-armable step function. Whoever owns the display loop
//! (the winit host in [`crate::flow`], or a test) calls [`FrameDriver::step`]
//! once per tick; nothing here loops or blocks, so the host may pause, halt
//! or re-pace the animation freely.
//!
//! Each step runs in a fixed order: motion for every object, then the matrix
//! pack, then the transform upload, then the single draw.

use cgmath::{Deg, InnerSpace, Quaternion, Vector3};

use crate::{
    config::SwarmConfig,
    data_structures::{instance::Instance, scene::Scene},
    error::{Error, Result},
    math::{axis_angle_to_quaternion, normalize_quaternion, quaternion_multiply},
    resources::{
        geometry::{pack_geometry, PackedGeometry},
        transforms::{check_texture_width, pack_transforms_into, TextureShape},
    },
};

/// Per-tick state change for one object.
pub trait Motion {
    fn advance(&self, instance: &mut Instance);
}

/// Straight-line drift with recycling.
///
/// Each tick moves the object by `speed * speed_scale` along `axis`. When its
/// coordinate along the axis (after the move) exceeds `bound`, the object is
/// pushed back by `wrap_distance`.
#[derive(Clone, Debug)]
pub struct LinearWrap {
    axis: Vector3<f32>,
    speed_scale: f32,
    bound: f32,
    wrap_distance: f32,
}

impl LinearWrap {
    pub fn new(axis: Vector3<f32>, speed_scale: f32, bound: f32, wrap_distance: f32) -> Result<Self> {
        if axis.magnitude2() < f32::EPSILON || !axis.magnitude2().is_finite() {
            return Err(Error::ZeroLengthAxis);
        }
        Ok(Self {
            axis: axis.normalize(),
            speed_scale,
            bound,
            wrap_distance,
        })
    }

    /// Drift towards the camera along +z, recycled as configured.
    pub fn from_config(config: &SwarmConfig) -> Self {
        Self {
            axis: Vector3::unit_z(),
            speed_scale: config.speed_scale,
            bound: config.wrap_bound,
            wrap_distance: config.wrap_distance,
        }
    }
}

impl Motion for LinearWrap {
    fn advance(&self, instance: &mut Instance) {
        instance.position += self.axis * (instance.speed * self.speed_scale);
        if instance.position.dot(self.axis) > self.bound {
            instance.position -= self.axis * self.wrap_distance;
        }
    }
}

/// Constant rotation about a world axis, renormalized every tick.
#[derive(Clone, Debug)]
pub struct Spin {
    step: Quaternion<f32>,
}

impl Spin {
    pub fn new(axis: Vector3<f32>, per_tick: impl Into<cgmath::Rad<f32>>) -> Result<Self> {
        Ok(Self {
            step: axis_angle_to_quaternion(axis, per_tick)?,
        })
    }
}

impl Motion for Spin {
    fn advance(&self, instance: &mut Instance) {
        // The existing orientation is applied first, the spin on top of it.
        instance.rotation = normalize_quaternion(quaternion_multiply(self.step, instance.rotation));
    }
}

/// Several motions applied in order.
pub struct Chain(pub Vec<Box<dyn Motion>>);

impl Motion for Chain {
    fn advance(&self, instance: &mut Instance) {
        self.0.iter().for_each(|motion| motion.advance(instance));
    }
}

/// The default motion for a config: drift and wrap, plus spin when enabled.
pub fn motion_from_config(config: &SwarmConfig) -> Result<Chain> {
    let mut motions: Vec<Box<dyn Motion>> = vec![Box::new(LinearWrap::from_config(config))];
    if config.spin_degrees_per_tick != 0.0 {
        let axis = Vector3::new(0.3, 1.0, 0.2);
        motions.push(Box::new(Spin::new(axis, Deg(config.spin_degrees_per_tick))?));
    }
    Ok(Chain(motions))
}

/// What the driver needs from the graphics device.
///
/// All methods run on the rendering thread; implementations may assume calls
/// are never concurrent.
pub trait FrameTarget {
    /// Upload the static vertex and index data. Called once before the first frame.
    fn upload_geometry(&mut self, geometry: &PackedGeometry) -> Result<()>;

    /// Replace the transform texture contents, reallocating if `shape` changed.
    /// Returns whether a reallocation happened.
    fn upload_transforms(&mut self, transforms: &[f32], shape: TextureShape) -> Result<bool>;

    /// Issue the single indexed draw covering every instance.
    fn draw(&mut self, index_count: u32) -> Result<()>;
}

/// Summary of one submitted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub instances: usize,
    pub floats_uploaded: usize,
    pub indices_drawn: u32,
    pub texture_reallocated: bool,
}

#[derive(Debug)]
enum DriverState {
    Uninitialized,
    Running { index_count: u32, instance_count: usize },
}

pub struct FrameDriver<M: Motion> {
    scene: Scene,
    motion: M,
    texture_width: u32,
    state: DriverState,
    transforms: Vec<f32>,
    frames: u64,
}

impl<M: Motion> FrameDriver<M> {
    /// `texture_width` must be a power of two of at least four texels.
    pub fn new(scene: Scene, motion: M, texture_width: u32) -> Result<Self> {
        check_texture_width(texture_width)?;
        Ok(Self {
            scene,
            motion,
            texture_width,
            state: DriverState::Uninitialized,
            transforms: Vec::new(),
            frames: 0,
        })
    }

    /// Pack and upload the static geometry, then start running.
    ///
    /// The target is expected to already hold its compiled program; any error
    /// here leaves the driver uninitialized so no frame is ever drawn.
    pub fn initialize(&mut self, target: &mut impl FrameTarget) -> Result<()> {
        if self.is_running() {
            log::warn!("frame driver initialized twice; geometry re-uploaded");
        }
        self.upload_geometry(target)?;
        log::info!("frame driver running");
        Ok(())
    }

    fn upload_geometry(&mut self, target: &mut impl FrameTarget) -> Result<u32> {
        let geometry = pack_geometry(&self.scene)?;
        target.upload_geometry(&geometry)?;
        let index_count = geometry.index_count();
        self.state = DriverState::Running {
            index_count,
            instance_count: geometry.instance_count,
        };
        log::info!(
            "geometry uploaded: {} instances, {} indices",
            geometry.instance_count,
            index_count
        );
        Ok(index_count)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    /// Apply one tick of motion to every object without touching the GPU.
    pub fn advance(&mut self) {
        let motion = &self.motion;
        self.scene.for_each_object_mut(|instance| motion.advance(instance));
    }

    /// One frame: advance, pack, upload, draw.
    pub fn step(&mut self, target: &mut impl FrameTarget) -> Result<FrameStats> {
        let (index_count, instance_count) = match self.state {
            DriverState::Running {
                index_count,
                instance_count,
            } => (index_count, instance_count),
            DriverState::Uninitialized => {
                log::warn!("frame requested before the driver was initialized");
                return Err(Error::NotInitialized);
            }
        };

        self.advance();
        // Objects added since the last upload need their vertices too.
        let index_count = if instance_count != self.scene.count() {
            self.upload_geometry(target)?
        } else {
            index_count
        };
        pack_transforms_into(&self.scene, &mut self.transforms);
        let shape = TextureShape::for_instances(self.scene.count(), self.texture_width);
        let texture_reallocated = target.upload_transforms(&self.transforms, shape)?;
        if index_count == 0 {
            log::warn!("you attempted to render something with zero instances");
        }
        target.draw(index_count)?;

        self.frames += 1;
        Ok(FrameStats {
            frame: self.frames,
            instances: self.scene.count(),
            floats_uploaded: self.transforms.len(),
            indices_drawn: index_count,
            texture_reallocated,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access for hosts that edit objects between frames.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}
