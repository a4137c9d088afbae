use crate::{
    camera::{Camera, CameraController},
    config::{Config, ShaderChoice},
    geometry::{Drawable, Geometry},
    renderer::{context::GfxContext, FrameStats, Renderer, DEPTH_FORMAT},
    shader::{Shader, ShaderProgram},
    time::FrameClock,
    ui::{self, Controls, Visibility},
};
use anyhow::{Context as _, Result};
use glam::Vec3;
use meshgen::{Cube, Icosphere, MeshError, Square};
use std::sync::Arc;
use winit::{event::WindowEvent, window::Window};

const CLEAR_COLOR: [f64; 4] = [0.2, 0.2, 0.2, 1.0];
const CAMERA_START: Vec3 = Vec3::new(0.0, 0.0, 5.0);

pub fn lambert_shaders() -> [Shader; 2] {
    [
        Shader::vertex("lambert_vert.wgsl", include_str!("../shaders/lambert_vert.wgsl")),
        Shader::fragment("lambert_frag.wgsl", include_str!("../shaders/lambert_frag.wgsl")),
    ]
}

pub fn custom_shaders() -> [Shader; 2] {
    [
        Shader::vertex("custom_vert.wgsl", include_str!("../shaders/custom_vert.wgsl")),
        Shader::fragment("custom_frag.wgsl", include_str!("../shaders/custom_frag.wgsl")),
    ]
}

/// The geometry drawn by the viewer, all centred at the origin.
pub struct Scene {
    pub icosphere: Geometry,
    pub square: Geometry,
    pub cube: Geometry,
    subdivisions: u32,
}

impl Scene {
    /// Builds and uploads every shape from scratch.
    pub fn load(device: &wgpu::Device, subdivisions: u32) -> Result<Self, MeshError> {
        let icosphere = Icosphere::new(Vec3::ZERO, 1.0, subdivisions);
        let mut scene = Self {
            subdivisions: icosphere.subdivisions(),
            icosphere: Geometry::new(icosphere),
            square: Geometry::new(Square::new(Vec3::ZERO)),
            cube: Geometry::new(Cube::new(Vec3::ZERO)),
        };

        scene.icosphere.create(device)?;
        scene.square.create(device)?;
        scene.cube.create(device)?;

        log::info!("Scene loaded (icosphere level {})", scene.subdivisions);
        Ok(scene)
    }

    #[inline]
    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Replaces the icosphere if `level` differs from the current one.
    /// Returns whether a rebuild happened.
    pub fn sync_subdivisions(&mut self, device: &wgpu::Device, level: u32) -> Result<bool, MeshError> {
        let icosphere = Icosphere::new(Vec3::ZERO, 1.0, level);
        if icosphere.subdivisions() == self.subdivisions {
            return Ok(false);
        }

        let mut geometry = Geometry::new(icosphere);
        geometry.create(device)?;

        log::info!(
            "Re-tessellated icosphere: level {} -> {} ({} vertices, {} faces)",
            self.subdivisions,
            icosphere.subdivisions(),
            geometry.vertex_count(),
            geometry.index_count() / 3
        );

        self.icosphere = geometry;
        self.subdivisions = icosphere.subdivisions();
        Ok(true)
    }

    /// Visible geometry in draw order.
    pub fn drawables(&self, visible: Visibility) -> Vec<&dyn Drawable> {
        [
            (visible.icosphere, &self.icosphere),
            (visible.square, &self.square),
            (visible.cube, &self.cube),
        ]
        .into_iter()
        .filter(|(shown, _)| *shown)
        .map(|(_, g)| g as &dyn Drawable)
        .collect()
    }
}

pub struct App {
    pub gfx: GfxContext,
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub scene: Scene,
    pub controls: Controls,
    lambert: ShaderProgram,
    custom: ShaderProgram,
    clock: FrameClock,
    last_stats: FrameStats,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let gfx = GfxContext::new(window.clone(), config.vsync).await?;
        let format = gfx.config.format;

        let mut renderer = Renderer::new(&gfx.device, gfx.size.width, gfx.size.height);
        let [r, g, b, a] = CLEAR_COLOR;
        renderer.set_clear_color(r, g, b, a);

        let lambert = ShaderProgram::new(&gfx.device, "Lambert", &lambert_shaders(), format, DEPTH_FORMAT)
            .context("building lambert program")?;
        let custom = ShaderProgram::new(&gfx.device, "Custom", &custom_shaders(), format, DEPTH_FORMAT)
            .context("building custom program")?;

        let controls = Controls {
            subdivisions: config.subdivisions,
            use_custom_shader: config.shader == ShaderChoice::Custom,
            ..Default::default()
        };
        let scene = Scene::load(&gfx.device, controls.subdivisions).context("loading scene")?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, format, None, 1);

        let mut app = Self {
            gfx,
            renderer,
            camera: Camera::new(CAMERA_START, Vec3::ZERO),
            camera_controller: CameraController::new(),
            scene,
            controls,
            lambert,
            custom,
            clock: FrameClock::new(),
            last_stats: FrameStats::default(),
            egui_ctx,
            egui_state,
            egui_renderer,
        };
        app.resize(app.gfx.size);
        Ok(app)
    }

    /// Renderer size first, then camera aspect, then projection.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.renderer
                .set_size(&self.gfx.device, new_size.width, new_size.height);
            self.camera
                .set_aspect_ratio(new_size.width as f32 / new_size.height as f32);
            self.camera.update_projection_matrix();
        }
    }

    /// Returns `true` when egui consumed the event.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.camera_controller.handle_event(event, &mut self.camera);

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        false
    }

    /// Rebuilds every geometry from the current controls.
    pub fn load_scene(&mut self) {
        match Scene::load(&self.gfx.device, self.controls.subdivisions) {
            Ok(scene) => self.scene = scene,
            Err(err) => log::error!("Failed to load scene: {}", err),
        }
    }

    /// One frame tick.
    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.camera.update();
        let time = self.clock.tick();

        let frame = self.gfx.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.renderer.clear(&mut encoder, &view);

        if let Err(err) = self
            .scene
            .sync_subdivisions(&self.gfx.device, self.controls.subdivisions)
        {
            log::error!("Failed to re-tessellate icosphere: {}", err);
        }

        let program = if self.controls.use_custom_shader {
            self.custom.set_u_time(time.elapsed_ms);
            &mut self.custom
        } else {
            &mut self.lambert
        };

        let drawables = self.scene.drawables(self.controls.visible);
        self.last_stats = self.renderer.render(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            &view,
            &self.camera,
            program,
            self.controls.color(),
            &drawables,
        );

        let (actions, ui_commands) = self.draw_ui(window, &mut encoder, &view);

        self.gfx
            .queue
            .submit(ui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        if actions.load_scene {
            self.load_scene();
        }

        Ok(())
    }

    /// Runs the control panel and stats overlay on top of `view`. Returns the
    /// panel actions and the command buffers egui needs submitted first.
    fn draw_ui(
        &mut self,
        window: &Window,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> (ui::UiActions, Vec<wgpu::CommandBuffer>) {
        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        let actions = ui::draw_controls(&self.egui_ctx, &mut self.controls);
        ui::draw_stats(&self.egui_ctx, &self.clock, self.last_stats);

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);

        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.config.width, self.gfx.config.height],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        for (id, delta) in &egui_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }

        let ui_commands = self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        (actions, ui_commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{Attribute, ProgramLayout, Uniform};

    fn link(shaders: [Shader; 2]) -> ProgramLayout {
        let compiled = shaders.iter().map(|s| s.compile().unwrap()).collect();
        ProgramLayout::link(compiled).unwrap()
    }

    #[test]
    fn lambert_program_links() {
        let layout = link(lambert_shaders());
        for attr in Attribute::ALL {
            assert!(layout.attribute(attr).is_some(), "{attr:?}");
        }
        assert!(layout.uniform_offset(Uniform::ModelInvTr).is_some());
        assert!(layout.uniform_offset(Uniform::Color).is_some());
        assert_eq!(layout.uniform_offset(Uniform::Time), None);
    }

    #[test]
    fn custom_program_links_with_time() {
        let layout = link(custom_shaders());
        assert!(layout.attribute(Attribute::Color).is_none());
        assert!(layout.uniform_offset(Uniform::Time).is_some());
        assert_eq!(layout.uniform_offset(Uniform::ModelInvTr), None);
    }
}
