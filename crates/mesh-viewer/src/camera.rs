use glam::{Mat4, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 500.0;
const MAX_ELEVATION_DEG: f32 = 89.0;

/// Perspective look-at camera.
///
/// `update()` recomputes the view from position/target. The projection is
/// only recomputed by `update_projection_matrix()`, so after
/// `set_aspect_ratio()` it stays stale until that call.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub world_up: Vec3,

    // --- Derived basis (updated by `update()`) ---
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,

    // --- Projection parameters ---
    /// Vertical field of view (radians).
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    view: Mat4,
    proj: Mat4,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            target,
            world_up: Vec3::Y,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            fovy: 45f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        };

        camera.update();
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the basis and view matrix from position, target and up.
    pub fn update(&mut self) {
        self.forward = (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        self.right = self
            .forward
            .cross(self.world_up)
            .try_normalize()
            .unwrap_or(Vec3::X);
        self.up = self.right.cross(self.forward);

        self.view = Mat4::look_at_rh(self.position, self.target, self.up);
    }

    /// Stores the aspect ratio. Call `update_projection_matrix()` before the
    /// next frame.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Right-handed perspective with wgpu's [0, 1] depth range.
    pub fn update_projection_matrix(&mut self) {
        self.proj = Mat4::perspective_rh(self.fovy, self.aspect, self.near, self.far);
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Rotates the position around the target. Azimuth turns about world up,
    /// elevation is clamped short of the poles.
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let azimuth = offset.x.atan2(offset.z) + d_azimuth;
        let limit = MAX_ELEVATION_DEG.to_radians();
        let elevation = ((offset.y / radius).clamp(-1.0, 1.0).asin() + d_elevation).clamp(-limit, limit);

        let (sin_az, cos_az) = azimuth.sin_cos();
        let (sin_el, cos_el) = elevation.sin_cos();
        self.position = self.target + Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az) * radius;
        self.update();
    }

    /// Scales the distance to the target by `factor`, within fixed bounds.
    pub fn zoom(&mut self, factor: f32) {
        let offset = self.position - self.target;
        let distance = (offset.length() * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        if let Some(dir) = offset.try_normalize() {
            self.position = self.target + dir * distance;
            self.update();
        }
    }
}

/// Orbit on left drag, zoom on wheel.
pub struct CameraController {
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            mouse_down: false,
            last_mouse: None,
        }
    }

    /// Handles window events and updates the camera.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_orbit((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };

                // Positive delta = scroll up = zoom in.
                camera.zoom(1.1_f32.powf(-scroll));
            }
            _ => {}
        }
    }

    fn handle_cursor_orbit(&mut self, xy: (f64, f64), camera: &mut Camera) {
        if let Some(last) = self.last_mouse {
            if self.mouse_down {
                let dx = ((xy.0 - last.0) * 0.005) as f32;
                let dy = ((xy.1 - last.1) * 0.005) as f32;
                camera.orbit(-dx, dy);
            }
        }
        self.last_mouse = Some(xy);
    }
}
