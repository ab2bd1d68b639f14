use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

pub const SHADOW_MAP_SIZE: u32 = 1024;

/// Half-extent of the orthographic shadow frustum.
const SHADOW_FRUSTUM_EXTENT: f32 = 500.0;
const SHADOW_NEAR: f32 = 0.1;
const SHADOW_FAR: f32 = 2000.0;

/// The sun: a white directional light aimed at the scene origin.
pub struct DirectionalLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }

    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize()
    }

    pub fn shadow_view_projection(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y);
        let projection = Mat4::orthographic_rh(
            -SHADOW_FRUSTUM_EXTENT,
            SHADOW_FRUSTUM_EXTENT,
            -SHADOW_FRUSTUM_EXTENT,
            SHADOW_FRUSTUM_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        projection * view
    }

    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            view_proj: self.shadow_view_projection(),
            direction: self.direction().extend(0.0).to_array(),
            color: (self.color * self.intensity).extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LightUniform {
    pub view_proj: Mat4,
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_points_at_origin() {
        let light = DirectionalLight::new(Vec3::new(-200.0, 150.0, 200.0));
        let expected = (Vec3::ZERO - light.position).normalize();
        assert!(light.direction().distance(expected) < 1e-6);
        assert!((light.direction().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shadow_frustum_contains_scene_center() {
        let light = DirectionalLight::new(Vec3::new(-200.0, 150.0, 200.0));
        let clip = light.shadow_view_projection().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
        assert!(clip.z >= 0.0 && clip.z <= 1.0);
    }
}
