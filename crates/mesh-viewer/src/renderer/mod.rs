//! Drives one frame: clears the surface and draws a list of geometries with
//! a shader program under a camera.

pub mod context;
pub mod targets;

use glam::Vec4;

use self::targets::DepthTarget;
use crate::{camera::Camera, geometry::Drawable, shader::ShaderProgram};

pub use self::targets::DEPTH_FORMAT;

/// Work recorded by one [`Renderer::render`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub triangles: u32,
}

/// Clear state and depth attachment for the render surface.
pub struct Renderer {
    clear_color: wgpu::Color,
    depth: DepthTarget,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            depth: DepthTarget::new(device, width, height),
        }
    }

    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    #[inline]
    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.depth.width, self.depth.height)
    }

    /// Resizes the depth attachment. The swap chain is resized by its owner.
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    /// Clears `view` to the clear color and the depth buffer to the far plane.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    /// Draws `geometries` in order with `program`.
    ///
    /// The view-projection and color uniforms are set once, model and normal
    /// matrices once per geometry. Geometries without GPU buffers are skipped.
    /// Expects [`Renderer::clear`] to have run earlier in the frame.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        camera: &Camera,
        program: &mut ShaderProgram,
        color: Vec4,
        geometries: &[&dyn Drawable],
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        if geometries.is_empty() {
            return stats;
        }

        program.begin_frame();
        program.set_view_proj_matrix(&camera.view_proj());
        program.set_geometry_color(color);

        let mut draws = Vec::with_capacity(geometries.len());
        for &geometry in geometries {
            if geometry.index_buffer().is_none() {
                log::warn!("Skipping geometry that was never created");
                continue;
            }
            let model = geometry.model_matrix();
            program.set_model_matrix(&model);
            program.set_normal_matrix(&model.inverse().transpose());
            draws.push((geometry, program.commit_draw()));
        }

        if draws.is_empty() {
            return stats;
        }

        program.upload(device, queue, geometries);
        let program = &*program;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        program.bind(&mut pass);
        for (geometry, slot) in draws {
            if program.draw(&mut pass, geometry, slot) {
                stats.draw_calls += 1;
                stats.triangles += geometry.index_count() / 3;
            }
        }

        stats
    }
}
