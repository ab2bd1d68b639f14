use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

/// Widest polar angle the orbit controls allow, slightly past the equator.
pub const MAX_POLAR_ANGLE: f32 = std::f32::consts::PI / 1.7;
const MIN_POLAR_ANGLE: f32 = 0.01;
const MIN_DISTANCE: f32 = 20.0;
const MAX_DISTANCE: f32 = 800.0;

pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn aspect(resolution: Vec2) -> f32 {
        resolution.x / resolution.y
    }

    pub fn get_vp_matrix(&self, resolution: Vec2) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            Self::aspect(resolution),
            self.near,
            self.far,
        );
        projection * view
    }
}

/// Orbit camera controls: drag rotates around the target, wheel zooms.
/// Spherical state is the source of truth; the camera eye is derived.
pub struct OrbitControls {
    pub azimuth: f32,
    pub polar: f32,
    pub distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitControls {
    /// Controls matching an initial eye on the +Z axis at `distance`.
    pub fn new(distance: f32) -> Self {
        Self {
            azimuth: 0.0,
            polar: std::f32::consts::FRAC_PI_2,
            distance,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
        }
    }

    pub fn rotate(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.rotate_speed;
        self.polar =
            (self.polar - delta.y * self.rotate_speed).clamp(MIN_POLAR_ANGLE, MAX_POLAR_ANGLE);
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance =
            (self.distance * (1.0 - amount * self.zoom_speed)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn apply_to(&self, camera: &mut Camera) {
        let offset = Vec3::new(
            self.polar.sin() * self.azimuth.sin(),
            self.polar.cos(),
            self.polar.sin() * self.azimuth.cos(),
        ) * self.distance;
        camera.eye = camera.target + offset;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    eye: Vec4,
}

impl CameraUniform {
    pub fn update(&mut self, resolution: winit::dpi::PhysicalSize<u32>, camera: &Camera) {
        self.view_proj =
            camera.get_vp_matrix(Vec2::new(resolution.width as f32, resolution.height as f32));
        self.eye = camera.eye.extend(1.0);
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_uses_viewport_aspect() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 200.0), Vec3::ZERO);

        for (width, height) in [(1920.0, 1080.0), (800.0, 600.0), (500.0, 1000.0)] {
            let resolution = Vec2::new(width, height);
            let aspect = Camera::aspect(resolution);
            assert_eq!(aspect, width / height);

            let expected = Mat4::perspective_rh(75.0_f32.to_radians(), aspect, 0.1, 1000.0)
                * Mat4::look_at_rh(camera.eye, camera.target, camera.up);
            assert_eq!(camera.get_vp_matrix(resolution), expected);
        }
    }

    #[test]
    fn initial_orbit_matches_fixed_eye() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::ZERO);
        let controls = OrbitControls::new(200.0);
        controls.apply_to(&mut camera);
        assert!(camera.eye.distance(Vec3::new(0.0, 0.0, 200.0)) < 1e-3);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut controls = OrbitControls::new(200.0);
        // Drag far downward; polar may not exceed the clamp.
        controls.rotate(Vec2::new(0.0, -10000.0));
        assert!(controls.polar <= MAX_POLAR_ANGLE + 1e-6);
        controls.rotate(Vec2::new(0.0, 10000.0));
        assert!(controls.polar >= MIN_POLAR_ANGLE - 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controls = OrbitControls::new(200.0);
        for _ in 0..200 {
            controls.zoom(1.0);
        }
        assert!(controls.distance >= MIN_DISTANCE);
        for _ in 0..200 {
            controls.zoom(-1.0);
        }
        assert!(controls.distance <= MAX_DISTANCE);
    }
}
