use glam::{Mat4, Vec2, Vec3};
use lumen_common::Config;
use lumen_input::Movement;

const PITCH_LIMIT: f32 = 89.0;
const MIN_FOV: f32 = 1.0;

/// First-person camera with yaw/pitch orientation in degrees.
///
/// Lives on the render thread; nothing outside the frame loop moves it.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    max_fov: f32,
    near: f32,
    far: f32,
    sensitivity: f32,
    last_cursor: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            max_fov: 89.0,
            near: 0.1,
            far: 100.0,
            sensitivity: 0.1,
            last_cursor: None,
        };
        camera.update_vectors();
        camera
    }
}

impl Camera {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fov: config.fov,
            max_fov: config.max_fov,
            near: config.render_distance_min,
            far: config.render_distance_max,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Feed an absolute cursor position. The first call only records it.
    pub fn process_cursor(&mut self, position: Vec2) {
        let Some(last) = self.last_cursor.replace(position) else {
            return;
        };
        let dx = position.x - last.x;
        // Screen y grows downward.
        let dy = last.y - position.y;
        self.update_orientation(dx, dy);
    }

    pub fn update_orientation(&mut self, cursor_dx: f32, cursor_dy: f32) {
        self.yaw += cursor_dx * self.sensitivity;
        self.pitch = (self.pitch + cursor_dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Scroll up zooms in.
    pub fn adjust_zoom(&mut self, scroll_delta: f32) {
        self.fov = (self.fov - scroll_delta).clamp(MIN_FOV, self.max_fov);
    }

    pub fn translate(&mut self, direction: Movement, speed: f32, dt: f32) {
        let step = speed * dt;
        let offset = match direction {
            Movement::Forward => self.front,
            Movement::Back => -self.front,
            Movement::Left => -self.right,
            Movement::Right => self.right,
            Movement::Up => self.up,
            Movement::Down => -self.up,
        };
        self.position += offset * step;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect_ratio, self.near, self.far)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}
