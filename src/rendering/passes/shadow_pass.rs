use wgpu::{Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor};

use crate::model::{Instance, MODEL_VERTEX_LAYOUT};
use crate::rendering::shader_loader::{self, ShaderDefinition};
use crate::rendering::texture::DepthTexture;

const SHADOW_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Shadow",
    path: "shadow.wgsl",
};

/// Depth-only render of the shadow casters from the sun's point of view.
pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
}

impl ShadowPass {
    pub fn create(
        device: &Device,
        globals_layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<ShadowPass> {
        let shader = shader_loader::load_shader(device, SHADOW_SHADER)?;

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[globals_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MODEL_VERTEX_LAYOUT, Instance::descriptor()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self { pipeline })
    }

    pub fn render<'a, F>(
        &self,
        shadow_view: &wgpu::TextureView,
        globals_bind_group: &wgpu::BindGroup,
        encoder: &mut wgpu::CommandEncoder,
        render_callback: F,
    ) where
        F: FnOnce(&mut wgpu::RenderPass) + 'a,
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, globals_bind_group, &[]);
        render_callback(&mut render_pass);
    }
}
