use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::util::DeviceExt;
use wgpu::CommandEncoderDescriptor;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::camera::CameraUniform;
use crate::rendering::{
    passes::{
        background_pass::BackgroundPass,
        fxaa_pass::FxaaPass,
        output_pass::OutputPass,
        scene_pass::{ScenePass, ScenePassTextureViews},
        shadow_pass::ShadowPass,
        HDR_FORMAT,
    },
    render_model::{
        gather_instances, render_model_depth, render_model_instances, RenderModel,
    },
    texture::{
        create_environment_texture, create_gradient_texture, ColorTarget, DepthTexture, ShadowMap,
    },
};
use crate::viewer::Viewer;

/// Effective scale factor, capped at 1.5 on displays up to 1920 logical
/// pixels wide. Wider displays render at the native factor.
pub fn capped_scale_factor(logical_width: f64, scale_factor: f64) -> f64 {
    if logical_width <= 1920.0 {
        scale_factor.min(1.5)
    } else {
        scale_factor
    }
}

/// Resolution the scene and post targets render at, derived from the window
/// surface size and the display scale factor.
pub fn render_resolution(physical: PhysicalSize<u32>, scale_factor: f64) -> PhysicalSize<u32> {
    let logical_width = physical.width as f64 / scale_factor;
    let effective = capped_scale_factor(logical_width, scale_factor);
    let ratio = effective / scale_factor;

    PhysicalSize::new(
        ((physical.width as f64 * ratio).round() as u32).max(1),
        ((physical.height as f64 * ratio).round() as u32).max(1),
    )
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,
    render_size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,

    depth_texture: DepthTexture,
    shadow_map: ShadowMap,
    scene_target: ColorTarget,
    post_target: ColorTarget,

    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,

    render_models: Arena<RenderModel>,

    background_pass: BackgroundPass,
    shadow_pass: ShadowPass,
    scene_pass: ScenePass,
    fxaa_pass: FxaaPass,
    output_pass: OutputPass,

    imgui_renderer: imgui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        viewer: &Viewer,
        environment_image: &image::Rgb32FImage,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let render_size = render_resolution(size, scale_factor);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                // The environment map is Rgba32Float and sampled bilinearly.
                required_features: wgpu::Features::FLOAT32_FILTERABLE,
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to acquire GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut camera_uniform = CameraUniform::default();
        camera_uniform.update(render_size, &viewer.camera);
        let camera_buffer = camera_uniform.create_buffer(&device);

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniform Buffer"),
            contents: bytemuck::cast_slice(&[viewer.sun.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let depth_texture = DepthTexture::new(&device, render_size, "Depth Texture");
        let shadow_map = ShadowMap::new(&device);
        let scene_target = ColorTarget::new(&device, render_size, HDR_FORMAT, "Scene Target");
        let post_target = ColorTarget::new(&device, render_size, HDR_FORMAT, "Post Target");

        let environment_texture = create_environment_texture(&device, &queue, environment_image);
        let gradient_texture = create_gradient_texture(&device, &queue);

        let viewport_aspect = render_size.width as f32 / render_size.height as f32;
        let background_pass = BackgroundPass::create(&device, &gradient_texture, viewport_aspect)?;
        let shadow_pass = ShadowPass::create(&device, &globals_layout)?;
        let scene_pass = ScenePass::create(
            &device,
            &globals_layout,
            &material_layout,
            &environment_texture,
            &shadow_map,
        )?;
        let fxaa_pass = FxaaPass::create(&device, &scene_target.view)?;
        let output_pass = OutputPass::create(&device, &post_target.view, surface_format)?;

        let imgui_renderer = imgui_wgpu::Renderer::new(
            imgui_context,
            &device,
            &queue,
            imgui_wgpu::RendererConfig {
                texture_format: surface_format,
                ..Default::default()
            },
        );

        Ok(Self {
            window,
            size,
            render_size,
            surface,
            config,
            device,
            queue,
            depth_texture,
            shadow_map,
            scene_target,
            post_target,
            camera_uniform,
            camera_buffer,
            globals_bind_group,
            material_layout,
            render_models: Arena::new(),
            background_pass,
            shadow_pass,
            scene_pass,
            fxaa_pass,
            output_pass,
            imgui_renderer,
        })
    }

    /// Uploads every scene model to the GPU and links it back to the scene.
    pub fn load_models(&mut self, viewer: &mut Viewer) -> anyhow::Result<()> {
        for (_id, scene_model) in &mut viewer.scene.models {
            let render_model =
                RenderModel::from_model(&self.device, &self.material_layout, &scene_model.model);
            let render_model_id = self.render_models.alloc(render_model);
            scene_model.render_model = Some(render_model_id);
            log::info!(
                "Loaded model {} with {} primitives",
                scene_model.name,
                scene_model.model.primitives.len()
            );
        }

        Ok(())
    }

    /// Applies a (debounced) window resize: reconfigures the surface and
    /// resizes the post chain.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        self.render_size = render_resolution(new_size, self.window.scale_factor());
        self.depth_texture.resize(&self.device, self.render_size);
        self.scene_target.resize(&self.device, self.render_size);
        self.post_target.resize(&self.device, self.render_size);
        self.fxaa_pass.rebind(&self.device, &self.scene_target.view);
        self.output_pass.rebind(&self.device, &self.post_target.view);

        let viewport_aspect = self.render_size.width as f32 / self.render_size.height as f32;
        self.background_pass
            .update_placement(&self.queue, viewport_aspect);

        log::debug!(
            "Resized to {}x{} (render {}x{})",
            new_size.width,
            new_size.height,
            self.render_size.width,
            self.render_size.height
        );
    }

    pub fn render(
        &mut self,
        viewer: &mut Viewer,
        draw_data: &imgui::DrawData,
    ) -> Result<(), wgpu::SurfaceError> {
        self.camera_uniform.update(self.render_size, &viewer.camera);
        self.camera_uniform
            .update_buffer(&self.queue, &self.camera_buffer);

        gather_instances(&viewer.scene, &mut self.render_models);
        for (_, render_model) in self.render_models.iter_mut() {
            render_model.upload_instances(&self.device, &self.queue);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.shadow_pass.render(
            self.shadow_map.view(),
            &self.globals_bind_group,
            &mut encoder,
            |render_pass| {
                for (_id, render_model) in self.render_models.iter() {
                    render_model_depth(
                        render_pass,
                        render_model,
                        0..render_model.shadow_instance_count(),
                    );
                }
            },
        );

        self.background_pass
            .render(&self.scene_target.view, &mut encoder);

        self.scene_pass.render(
            &ScenePassTextureViews {
                color: &self.scene_target.view,
                depth: self.depth_texture.view(),
            },
            &self.globals_bind_group,
            &mut encoder,
            |render_pass| {
                for (_id, render_model) in self.render_models.iter() {
                    render_model_instances(
                        render_pass,
                        render_model,
                        0..render_model.instance_count(),
                    );
                }
            },
        );

        self.fxaa_pass.render(&self.post_target.view, &mut encoder);
        self.output_pass.render(&view, &mut encoder);

        {
            let mut gui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Err(err) =
                self.imgui_renderer
                    .render(draw_data, &self.queue, &self.device, &mut gui_pass)
            {
                log::error!("GUI render failed: {err}");
            }
        }

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factor_is_capped_on_narrow_displays() {
        assert_eq!(capped_scale_factor(1280.0, 2.0), 1.5);
        assert_eq!(capped_scale_factor(1920.0, 3.0), 1.5);
        assert_eq!(capped_scale_factor(1280.0, 1.0), 1.0);
    }

    #[test]
    fn scale_factor_untouched_on_wide_displays() {
        assert_eq!(capped_scale_factor(2560.0, 2.0), 2.0);
        assert_eq!(capped_scale_factor(1921.0, 1.0), 1.0);
    }

    #[test]
    fn render_resolution_shrinks_when_capped() {
        // 3000 physical at 2x is 1500 logical: capped to 1.5x.
        let size = render_resolution(PhysicalSize::new(3000, 2000), 2.0);
        assert_eq!(size, PhysicalSize::new(2250, 1500));

        // 4000 physical at 2x is 2000 logical: wide display, no cap.
        let size = render_resolution(PhysicalSize::new(4000, 2000), 2.0);
        assert_eq!(size, PhysicalSize::new(4000, 2000));
    }
}
