//! First-person camera with free-fly and grounded-walk movement.
//!
//! Orientation is kept as two accumulated angles (yaw and pitch) against the
//! fixed world-up axis and the orthonormal basis (forward, right, up) is
//! recomputed from them on every change. Nothing is multiplied into a running
//! rotation matrix, so long sessions cannot drift the basis out of
//! orthonormality. Vertical look is clamped to stay [`POLE_EPSILON`] radians
//! away from straight up/down, which keeps the basis from flipping through
//! the vertical axis on fast pointer drags.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::input::InputState;

pub const WALK_SPEED: f32 = 0.1;
pub const SPRINT_SPEED: f32 = 1.0;
pub const FLY_SPEED: f32 = 1.0;
/// Pointer-look sensitivity in radians per pixel of pointer travel.
pub const LOOK_SPEED: f32 = 0.002;
/// Fixed eye height the camera snaps to when entering walk mode.
pub const EYE_HEIGHT: f32 = 3.0;
/// Minimum angle (radians) the forward axis keeps from either pole.
pub const POLE_EPSILON: f32 = 0.1;

const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Movement model: unconstrained 3D translation vs. grounded motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Fly,
    Walk,
}

/// Look rotation axes: `V` is horizontal look (yaw around world up),
/// `U` is vertical look (pitch around the camera's right axis).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    U,
    V,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    /// Forward projected onto the ground plane.
    WalkForward,
    WalkBackward,
}

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    forward: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    mode: Mode,
}

impl Camera {
    pub fn new(
        position: impl Into<Point3<f32>>,
        yaw: impl Into<Rad<f32>>,
        pitch: impl Into<Rad<f32>>,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            forward: Vector3::unit_x(),
            right: Vector3::unit_z(),
            up: WORLD_UP,
            mode: Mode::Fly,
        };
        camera.rebuild_basis();
        camera
    }

    /// Recompute the orthonormal basis from the accumulated angles.
    fn rebuild_basis(&mut self) {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        self.forward =
            Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize();
        self.right = self.forward.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.forward).normalize();
    }

    /// Angle in radians between the forward axis and world up.
    ///
    /// 0 means looking straight up, pi straight down.
    pub fn u_axis_angle(&self) -> f32 {
        self.forward.y.clamp(-1.0, 1.0).acos()
    }

    /// Apply a look rotation delta in radians.
    ///
    /// Horizontal look rotates freely. A vertical delta is applied only if
    /// the resulting forward axis would stay more than [`POLE_EPSILON`] away
    /// from either pole; otherwise the orientation is left unchanged.
    pub fn rotate(&mut self, axis: Axis, delta: f32) {
        match axis {
            Axis::V => {
                self.yaw += Rad(delta);
                self.rebuild_basis();
            }
            Axis::U => {
                // Pitching up by `delta` shrinks the angle to the up pole.
                let next = self.u_axis_angle() - delta;
                if next > POLE_EPSILON && next < std::f32::consts::PI - POLE_EPSILON {
                    self.pitch += Rad(delta);
                    self.rebuild_basis();
                }
            }
        }
    }

    /// Move along a camera axis. Walk directions stay in the ground plane.
    pub fn translate(&mut self, direction: Direction, amount: f32) {
        let delta = match direction {
            Direction::Forward => self.forward * amount,
            Direction::Backward => self.forward * -amount,
            Direction::Right => self.right * amount,
            Direction::Left => self.right * -amount,
            Direction::WalkForward => self.grounded_forward() * amount,
            Direction::WalkBackward => self.grounded_forward() * -amount,
        };
        self.position += delta;
    }

    fn grounded_forward(&self) -> Vector3<f32> {
        let flat = Vector3::new(self.forward.x, 0.0, self.forward.z);
        // The pole clamp keeps forward off the vertical, but a zero-length
        // projection must not normalize to NaN.
        if flat.magnitude2() > f32::EPSILON {
            flat.normalize()
        } else {
            Vector3::new(0.0, 0.0, 0.0)
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch movement mode. Entering walk snaps the camera down to the
    /// fixed eye height while keeping its horizontal position; returning to
    /// fly preserves the position entirely.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if let Mode::Walk = mode {
            self.position.y = EYE_HEIGHT;
        }
    }

    pub fn toggle_mode(&mut self) {
        match self.mode {
            Mode::Fly => self.set_mode(Mode::Walk),
            Mode::Walk => self.set_mode(Mode::Fly),
        }
    }

    /// Consume one frame's input snapshot: look rotation plus movement along
    /// the active directional keys, scaled for frame-time variance.
    pub fn advance(&mut self, input: &mut InputState, dt: Duration) {
        let delta = dt.as_secs_f32();
        if delta <= 0.0 {
            return;
        }
        let modifier = 1.0 / delta / 60.0;

        let (dx, dy) = input.take_look_delta();
        if dx != 0.0 {
            self.rotate(Axis::V, LOOK_SPEED * modifier * dx);
        }
        if dy != 0.0 {
            self.rotate(Axis::U, LOOK_SPEED * modifier * -dy);
        }

        let speed = match self.mode {
            Mode::Walk if input.sprint => SPRINT_SPEED,
            Mode::Walk => WALK_SPEED,
            Mode::Fly => FLY_SPEED,
        };
        let amount = speed * modifier;
        let (forward, backward) = match self.mode {
            Mode::Fly => (Direction::Forward, Direction::Backward),
            Mode::Walk => (Direction::WalkForward, Direction::WalkBackward),
        };
        if input.forward {
            self.translate(forward, amount);
        }
        if input.backward {
            self.translate(backward, amount);
        }
        if input.left {
            self.translate(Direction::Left, amount);
        }
        if input.right {
            self.translate(Direction::Right, amount);
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward, self.up)
    }
}

/// Perspective projection; `resize` only ever touches the aspect ratio.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: impl Into<Rad<f32>>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// The camera state mirrored into GPU memory once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.view_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state bundled with its GPU-side buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}
