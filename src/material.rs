use bytemuck::{Pod, Zeroable};
use glam::Vec4;

/// How the scene shader shades a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Metallic/roughness surface lit by the sun and the environment map.
    Standard,
    /// Refractive glass; the environment is sampled along the refracted ray.
    Glass,
}

#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub base_color: Vec4,
    pub metallic: f32,
    pub roughness: f32,
    pub env_intensity: f32,
    pub ior: f32,
    pub kind: MaterialKind,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            metallic: 0.0,
            roughness: 1.0,
            env_intensity: 1.0,
            ior: 1.5,
            kind: MaterialKind::Standard,
        }
    }
}

impl Material {
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color.to_array(),
            params: [self.metallic, self.roughness, self.env_intensity, self.ior],
            kind: match self.kind {
                MaterialKind::Standard => 0,
                MaterialKind::Glass => 1,
            },
            _padding: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// metallic, roughness, env_intensity, ior
    pub params: [f32; 4],
    pub kind: u32,
    pub _padding: [u32; 3],
}
