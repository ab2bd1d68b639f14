use std::ops::Range;

use id_arena::{Arena, Id};
use wgpu::util::DeviceExt;

use crate::model::{Instance, Model, ModelPrimitive};
use crate::scene_graph::scene::Scene;

pub type RenderModelId = Id<RenderModel>;

pub struct RenderPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub material_bind_group: wgpu::BindGroup,
}

impl RenderPrimitive {
    fn from_primitive(
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        model: &Model,
        primitive: &ModelPrimitive,
    ) -> Self {
        let vertex_buffer_name = format!(
            "Vertex buffer ({}, primitive {})",
            model.name, primitive.index
        );
        let index_buffer_name = format!(
            "Index buffer ({}, primitive {})",
            model.name, primitive.index
        );
        let material_name = format!("Material ({}, primitive {})", model.name, primitive.index);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&vertex_buffer_name),
            contents: bytemuck::cast_slice(&primitive.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&index_buffer_name),
            contents: bytemuck::cast_slice(&primitive.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&material_name),
            contents: bytemuck::cast_slice(&[primitive.material.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&material_name),
            layout: material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: primitive.indices.len() as u32,
            material_bind_group,
        }
    }
}

/// GPU-side model: per-primitive buffers plus this frame's instances.
/// Shadow-casting instances are gathered first so the shadow pass can draw
/// a prefix of the instance buffer.
pub struct RenderModel {
    pub primitives: Vec<RenderPrimitive>,
    name: String,
    instances: Vec<Instance>,
    shadow_instances: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

const INITIAL_INSTANCE_CAPACITY: usize = 4;

impl RenderModel {
    pub fn from_model(
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        model: &Model,
    ) -> Self {
        let primitives = model
            .primitives
            .iter()
            .map(|primitive| {
                RenderPrimitive::from_primitive(device, material_layout, model, primitive)
            })
            .collect();

        RenderModel {
            primitives,
            name: model.name.clone(),
            instances: Vec::new(),
            shadow_instances: 0,
            instance_buffer: Self::create_instance_buffer(
                device,
                &model.name,
                INITIAL_INSTANCE_CAPACITY,
            ),
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
        }
    }

    fn create_instance_buffer(device: &wgpu::Device, name: &str, capacity: usize) -> wgpu::Buffer {
        let label = format!("Instance buffer ({})", name);
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&label),
            size: (capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn shadow_instance_count(&self) -> u32 {
        self.shadow_instances
    }

    pub fn upload_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.instances.is_empty() {
            return;
        }

        if self.instances.len() > self.instance_capacity {
            self.instance_capacity = self.instances.len().next_power_of_two();
            self.instance_buffer =
                Self::create_instance_buffer(device, &self.name, self.instance_capacity);
        }

        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
    }
}

/// Collects this frame's instance transforms from the scene graph. World
/// matrices must be up to date.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
        render_model.shadow_instances = 0;
    }

    // Two passes: shadow casters first, then the rest.
    for casts_shadow in [true, false] {
        for (_, object) in scene.objects.iter() {
            if object.casts_shadow != casts_shadow {
                continue;
            }

            let Some(model_id) = object.model_id else {
                continue;
            };
            let Some(render_model_id) = scene
                .models
                .get(model_id)
                .and_then(|scene_model| scene_model.render_model)
            else {
                continue;
            };
            let Some(render_model) = render_models.get_mut(render_model_id) else {
                continue;
            };

            render_model.instances.push(Instance {
                model: *object.transform.get_world_matrix(),
                normal: *object.transform.get_inverse_transpose_world_matrix(),
            });
            if casts_shadow {
                render_model.shadow_instances += 1;
            }
        }
    }
}

/// Draws the given instance range of every primitive, binding each
/// primitive's material at group 2.
pub fn render_model_instances(
    render_pass: &mut wgpu::RenderPass,
    render_model: &RenderModel,
    instances: Range<u32>,
) {
    if instances.is_empty() {
        return;
    }

    render_pass.set_vertex_buffer(1, render_model.instance_buffer.slice(..));
    for primitive in &render_model.primitives {
        render_pass.set_bind_group(2, &primitive.material_bind_group, &[]);
        render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
        render_pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..primitive.num_indices, 0, instances.clone());
    }
}

/// Depth-only variant for the shadow pass; no material binding.
pub fn render_model_depth(
    render_pass: &mut wgpu::RenderPass,
    render_model: &RenderModel,
    instances: Range<u32>,
) {
    if instances.is_empty() {
        return;
    }

    render_pass.set_vertex_buffer(1, render_model.instance_buffer.slice(..));
    for primitive in &render_model.primitives {
        render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
        render_pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..primitive.num_indices, 0, instances.clone());
    }
}
