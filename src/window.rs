use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    window::Window,
};

use crate::{
    assets::Assets,
    debounce::{Debounce, RESIZE_DEBOUNCE},
    rendering::renderer::Renderer,
    viewer::{Viewer, SCALE_MAX, SCALE_MIN},
};

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    viewer: Viewer,
    environment_image: image::Rgb32FImage,
    resize_debounce: Debounce,
    mouse_pos: Vec2,
    dragging: bool,
    imgui: Option<ImguiState>,
    last_frame: Instant,
}

impl App {
    fn new(viewer: Viewer, environment_image: image::Rgb32FImage) -> Self {
        Self {
            renderer: None,
            viewer,
            environment_image,
            resize_debounce: Debounce::new(RESIZE_DEBOUNCE),
            mouse_pos: Vec2::ZERO,
            dragging: false,
            imgui: None,
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(&mut self, window: &Window) {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        self.imgui = Some(ImguiState { context, platform });
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("vitrine");
        let window = event_loop.create_window(window_attributes).unwrap();
        self.setup_imgui(&window);
        let renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.viewer,
            &self.environment_image,
            &mut self.imgui.as_mut().unwrap().context,
        ))
        .unwrap();
        self.renderer = Some(renderer);

        self.renderer
            .as_mut()
            .unwrap()
            .load_models(&mut self.viewer)
            .unwrap();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let imgui = self.imgui.as_mut().unwrap();
        let gui_wants_mouse = imgui.context.io().want_capture_mouse;

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                // Coalesced; the renderer resizes once the burst settles.
                self.resize_debounce.request(Instant::now());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                let delta = position - self.mouse_pos;
                self.mouse_pos = position;

                if self.dragging && !gui_wants_mouse {
                    self.viewer.controls.rotate(delta);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed && !gui_wants_mouse;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !gui_wants_mouse {
                    let amount = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(position) => position.y as f32 / 50.0,
                    };
                    self.viewer.controls.zoom(amount);
                }
            }
            WindowEvent::RedrawRequested => {
                let delta_time = self.last_frame.elapsed();
                let now = Instant::now();
                imgui.context.io_mut().update_delta_time(delta_time);
                self.last_frame = now;

                let renderer = self.renderer.as_mut().unwrap();
                renderer.window.request_redraw();

                if self.resize_debounce.poll(now) {
                    renderer.resize(renderer.window.inner_size());
                }

                imgui
                    .platform
                    .prepare_frame(imgui.context.io_mut(), &renderer.window)
                    .expect("Failed to prepare Imgui frame");

                let ui = imgui.context.new_frame();

                ui.window("Model")
                    .size([260.0, 100.0], imgui::Condition::FirstUseEver)
                    .build(|| {
                        let mut scale_x = self.viewer.settings.x;
                        if ui.slider("scale x", SCALE_MIN, SCALE_MAX, &mut scale_x) {
                            self.viewer.set_scale_x(scale_x);
                        }

                        let mut scale_y = self.viewer.settings.y;
                        if ui.slider("scale y", SCALE_MIN, SCALE_MAX, &mut scale_y) {
                            self.viewer.set_scale_y(scale_y);
                        }
                    });

                self.viewer.update();

                imgui.platform.prepare_render(ui, &renderer.window);
                let draw_data = imgui.context.render();

                match renderer.render(&mut self.viewer, draw_data) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
            _ => (),
        }

        {
            let window = self.renderer.as_mut().unwrap().window.as_ref();
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }
}

pub async fn run(assets: Assets) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let viewer = Viewer::new(&assets).context("Failed to build scene")?;
    let mut app = App::new(viewer, assets.environment.image);
    event_loop.run_app(&mut app)?;

    Ok(())
}
