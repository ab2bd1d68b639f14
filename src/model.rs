use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use gltf::buffer;
use itertools::izip;
use std::mem::offset_of;

use crate::material::Material;
use crate::math::bounds::Aabb;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Material,
}

/// CPU-side mesh data plus its local-space bounds.
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    pub bounds: Aabb,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn new(name: impl Into<String>, primitives: Vec<ModelPrimitive>) -> Model {
        let mut model = Model {
            name: name.into(),
            primitives,
            bounds: Aabb::EMPTY,
        };
        model.recompute_bounds();
        model
    }

    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let name = name.into();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(anyhow::anyhow!(
                    "Unsupported primitive mode: {:?}",
                    primitive.mode()
                ));
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .with_context(|| format!("Mesh {name} has no positions"))?
                .collect::<Vec<[f32; 3]>>();
            let normals = reader
                .read_normals()
                .with_context(|| format!("Mesh {name} has no normals"))?
                .collect::<Vec<[f32; 3]>>();
            let tex_coords = reader
                .read_tex_coords(0)
                .map(|reader| reader.into_f32().collect::<Vec<[f32; 2]>>())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

            anyhow::ensure!(
                normals.len() == positions.len() && tex_coords.len() == positions.len(),
                "Mesh {name} has mismatched attribute counts"
            );

            let vertices = izip!(positions, normals, tex_coords)
                .map(|(position, normal, tex_coords)| Vertex {
                    position: Vec3::from(position),
                    normal: Vec3::from(normal),
                    tex_coords: Vec2::from(tex_coords),
                })
                .collect::<Vec<Vertex>>();

            let indices = reader
                .read_indices()
                .map(|reader| reader.into_u32().collect::<Vec<u32>>())
                .unwrap_or_else(|| (0..vertices.len() as u32).collect());

            let pbr = primitive.material().pbr_metallic_roughness();
            let material = Material {
                base_color: pbr.base_color_factor().into(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                ..Material::default()
            };

            primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
                material,
            });
        }

        if primitives.is_empty() {
            return Err(anyhow::anyhow!("Mesh without primitives: {}", name));
        }

        Ok(Model::new(name, primitives))
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = Aabb::from_points(
            self.primitives
                .iter()
                .flat_map(|primitive| primitive.vertices.iter().map(|vertex| vertex.position)),
        );
    }

    /// Shifts all vertices so the model's bounds are centered on the origin.
    pub fn recenter(&mut self) {
        let offset = self.bounds.center();
        for primitive in &mut self.primitives {
            for vertex in &mut primitive.vertices {
                vertex.position -= offset;
            }
        }
        self.recompute_bounds();
    }
}

pub const MODEL_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, tex_coords) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

/// Per-instance vertex data: world matrix and its inverse transpose for
/// normals under non-uniform scale.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub normal: Mat4,
}

impl Instance {
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        const VEC4_SIZE: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as u64;

        const ATTRIBUTES: [wgpu::VertexAttribute; 8] = {
            let mut attributes = [wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x4,
            }; 8];
            let mut i = 0;
            while i < 8 {
                attributes[i].offset = VEC4_SIZE * i as u64;
                attributes[i].shader_location = 5 + i as u32;
                i += 1;
            }
            attributes
        };

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn recenter_moves_bounds_to_origin() {
        let mut model = primitives::cone(25.0, 100.0, 16, Material::default());
        for primitive in &mut model.primitives {
            for vertex in &mut primitive.vertices {
                vertex.position += Vec3::new(10.0, 20.0, 30.0);
            }
        }
        model.recompute_bounds();
        assert!(model.bounds.center().distance(Vec3::new(10.0, 20.0, 30.0)) < 1e-3);

        model.recenter();
        assert!(model.bounds.center().length() < 1e-3);
    }

    /// A single-triangle GLB built by hand: positions, normals and u16
    /// indices in one binary chunk.
    fn build_test_glb() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let normals: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
        let indices: [u16; 3] = [0, 1, 2];

        let mut bin: Vec<u8> = Vec::new();
        bin.extend_from_slice(bytemuck::cast_slice(&positions));
        bin.extend_from_slice(bytemuck::cast_slice(&normals));
        bin.extend_from_slice(bytemuck::cast_slice(&indices));
        let buffer_length = bin.len();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"scene":0,"#,
                r#""scenes":[{{"nodes":[0]}}],"#,
                r#""nodes":[{{"mesh":0,"name":"tri"}}],"#,
                r#""meshes":[{{"name":"tri","primitives":[{{"attributes":{{"POSITION":0,"NORMAL":1}},"indices":2}}]}}],"#,
                r#""accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[4.0,2.0,0.0]}},"#,
                r#"{{"bufferView":1,"componentType":5126,"count":3,"type":"VEC3"}},"#,
                r#"{{"bufferView":2,"componentType":5123,"count":3,"type":"SCALAR"}}],"#,
                r#""bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}},"#,
                r#"{{"buffer":0,"byteOffset":36,"byteLength":36}},"#,
                r#"{{"buffer":0,"byteOffset":72,"byteLength":6}}],"#,
                r#""buffers":[{{"byteLength":{}}}]}}"#
            ),
            buffer_length
        );
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb: Vec<u8> = Vec::with_capacity(total);
        glb.extend_from_slice(&0x4654_6C67_u32.to_le_bytes());
        glb.extend_from_slice(&2_u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x4E4F_534A_u32.to_le_bytes());
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E_4942_u32.to_le_bytes());
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn gltf_import_builds_model_with_bounds() {
        let glb = build_test_glb();
        let (document, buffers, _images) = gltf::import_slice(&glb).unwrap();

        let mesh = document.meshes().next().unwrap();
        let model = Model::from_gltf("tri", mesh, &buffers).unwrap();

        assert_eq!(model.primitives.len(), 1);
        assert_eq!(model.primitives[0].indices, vec![0, 1, 2]);
        assert_eq!(model.bounds.min, Vec3::ZERO);
        assert_eq!(model.bounds.max, Vec3::new(4.0, 2.0, 0.0));
        assert_eq!(model.primitives[0].vertices[0].normal, Vec3::Z);
        // Missing UVs default to zero.
        assert_eq!(model.primitives[0].vertices[0].tex_coords, Vec2::ZERO);
    }

    #[test]
    fn instance_attributes_cover_both_matrices() {
        let layout = Instance::descriptor();
        assert_eq!(layout.array_stride, 128);
        assert_eq!(layout.attributes.len(), 8);
        assert_eq!(layout.attributes[0].shader_location, 5);
        assert_eq!(layout.attributes[7].shader_location, 12);
        assert_eq!(layout.attributes[7].offset, 112);
    }
}
