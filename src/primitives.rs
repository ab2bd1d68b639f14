//! Procedural meshes for the decorative props around the loaded model.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::material::Material;
use crate::model::{Model, ModelPrimitive, Vertex};

/// UV sphere centered on the origin.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32, material: Material) -> Model {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for row in 0..=height_segments {
        let v = row as f32 / height_segments as f32;
        let phi = v * PI;

        for col in 0..=width_segments {
            let u = col as f32 / width_segments as f32;
            let theta = u * TAU;

            let normal = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );

            vertices.push(Vertex {
                position: normal * radius,
                normal,
                tex_coords: Vec2::new(u, v),
            });
        }
    }

    let stride = width_segments + 1;
    for row in 0..height_segments {
        for col in 0..width_segments {
            let a = row * stride + col;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    Model::new(
        "sphere",
        vec![ModelPrimitive {
            index: 0,
            vertices,
            indices,
            material,
        }],
    )
}

/// Cone with its apex at +height/2 and base at -height/2 along Y.
pub fn cone(radius: f32, height: f32, radial_segments: u32, material: Material) -> Model {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let half_height = height * 0.5;
    let slant = (radius * radius + height * height).sqrt();

    // Side: a one-row grid from the duplicated apex down to the base ring, so
    // each slice gets its own slant normal.
    for col in 0..=radial_segments {
        let u = col as f32 / radial_segments as f32;
        let theta = u * TAU;
        let normal = Vec3::new(
            theta.cos() * height / slant,
            radius / slant,
            theta.sin() * height / slant,
        );

        vertices.push(Vertex {
            position: Vec3::new(0.0, half_height, 0.0),
            normal,
            tex_coords: Vec2::new(u, 0.0),
        });
        vertices.push(Vertex {
            position: Vec3::new(
                theta.cos() * radius,
                -half_height,
                theta.sin() * radius,
            ),
            normal,
            tex_coords: Vec2::new(u, 1.0),
        });
    }

    for col in 0..radial_segments {
        let apex = col * 2;
        let base = apex + 1;
        indices.extend_from_slice(&[apex, base, base + 2]);
    }

    // Base cap.
    let cap_center = vertices.len() as u32;
    vertices.push(Vertex {
        position: Vec3::new(0.0, -half_height, 0.0),
        normal: Vec3::NEG_Y,
        tex_coords: Vec2::new(0.5, 0.5),
    });
    for col in 0..=radial_segments {
        let theta = col as f32 / radial_segments as f32 * TAU;
        vertices.push(Vertex {
            position: Vec3::new(
                theta.cos() * radius,
                -half_height,
                theta.sin() * radius,
            ),
            normal: Vec3::NEG_Y,
            tex_coords: Vec2::new(theta.cos() * 0.5 + 0.5, theta.sin() * 0.5 + 0.5),
        });
    }
    for col in 0..radial_segments {
        let ring = cap_center + 1 + col;
        indices.extend_from_slice(&[cap_center, ring + 1, ring]);
    }

    Model::new(
        "cone",
        vec![ModelPrimitive {
            index: 0,
            vertices,
            indices,
            material,
        }],
    )
}

/// Flat plane in the XY plane facing +Z; the caller orients it.
pub fn plane(width: f32, height: f32, material: Material) -> Model {
    let hw = width * 0.5;
    let hh = height * 0.5;

    let vertices = vec![
        Vertex {
            position: Vec3::new(-hw, -hh, 0.0),
            normal: Vec3::Z,
            tex_coords: Vec2::new(0.0, 1.0),
        },
        Vertex {
            position: Vec3::new(hw, -hh, 0.0),
            normal: Vec3::Z,
            tex_coords: Vec2::new(1.0, 1.0),
        },
        Vertex {
            position: Vec3::new(hw, hh, 0.0),
            normal: Vec3::Z,
            tex_coords: Vec2::new(1.0, 0.0),
        },
        Vertex {
            position: Vec3::new(-hw, hh, 0.0),
            normal: Vec3::Z,
            tex_coords: Vec2::new(0.0, 0.0),
        },
    ];

    let indices = vec![0, 1, 2, 0, 2, 3];

    Model::new(
        "plane",
        vec![ModelPrimitive {
            index: 0,
            vertices,
            indices,
            material,
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_valid(model: &Model) {
        for primitive in &model.primitives {
            assert_eq!(primitive.indices.len() % 3, 0);
            let max = primitive.vertices.len() as u32;
            assert!(primitive.indices.iter().all(|&i| i < max));
        }
    }

    #[test]
    fn sphere_bounds_match_radius() {
        let model = sphere(25.0, 64, 32, Material::default());
        assert_indices_valid(&model);
        assert!(model.bounds.min.distance(Vec3::splat(-25.0)) < 1e-3);
        assert!(model.bounds.max.distance(Vec3::splat(25.0)) < 1e-3);
    }

    #[test]
    fn sphere_normals_are_unit_radial() {
        let model = sphere(2.0, 8, 4, Material::default());
        for vertex in &model.primitives[0].vertices {
            assert!((vertex.normal.length() - 1.0).abs() < 1e-4);
            assert!(vertex.position.distance(vertex.normal * 2.0) < 1e-4);
        }
    }

    #[test]
    fn cone_spans_half_height_each_way() {
        let model = cone(25.0, 100.0, 64, Material::default());
        assert_indices_valid(&model);
        assert!((model.bounds.min.y - -50.0).abs() < 1e-3);
        assert!((model.bounds.max.y - 50.0).abs() < 1e-3);
        assert!((model.bounds.max.x - 25.0).abs() < 1e-3);
        assert!((model.bounds.min.z - -25.0).abs() < 1e-3);
    }

    #[test]
    fn plane_is_flat() {
        let model = plane(1000.0, 1000.0, Material::default());
        assert_indices_valid(&model);
        assert_eq!(model.bounds.size(), Vec3::new(1000.0, 1000.0, 0.0));
    }
}
