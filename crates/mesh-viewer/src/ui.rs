//! Control panel and stats overlay.

use glam::Vec4;
use meshgen::MAX_SUBDIVISIONS;

use crate::renderer::FrameStats;
use crate::time::FrameClock;

/// Which scene shapes are drawn each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub icosphere: bool,
    pub square: bool,
    pub cube: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            icosphere: false,
            square: false,
            cube: true,
        }
    }
}

/// Parameters edited from the control panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub subdivisions: u32,
    pub color_r: f32,
    pub color_g: f32,
    pub color_b: f32,
    pub use_custom_shader: bool,
    pub visible: Visibility,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            subdivisions: 5,
            color_r: 1.0,
            color_g: 1.0,
            color_b: 0.0,
            use_custom_shader: false,
            visible: Visibility::default(),
        }
    }
}

impl Controls {
    /// Override color; alpha is always 1.
    pub fn color(&self) -> Vec4 {
        Vec4::new(
            self.color_r.clamp(0.0, 1.0),
            self.color_g.clamp(0.0, 1.0),
            self.color_b.clamp(0.0, 1.0),
            1.0,
        )
    }
}

/// One-shot actions requested from the panel this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiActions {
    pub load_scene: bool,
}

pub fn draw_controls(ctx: &egui::Context, controls: &mut Controls) -> UiActions {
    let mut actions = UiActions::default();

    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
        .resizable(false)
        .show(ctx, |ui| {
            ui.add(
                egui::Slider::new(&mut controls.subdivisions, 0..=MAX_SUBDIVISIONS)
                    .step_by(1.0)
                    .text("tesselations"),
            );

            for (value, name) in [
                (&mut controls.color_r, "colorR"),
                (&mut controls.color_g, "colorG"),
                (&mut controls.color_b, "colorB"),
            ] {
                ui.add(egui::Slider::new(value, 0.0..=1.0).step_by(0.1).text(name));
            }

            ui.checkbox(&mut controls.use_custom_shader, "My Shader");

            ui.separator();
            ui.horizontal(|ui| {
                ui.checkbox(&mut controls.visible.icosphere, "Icosphere");
                ui.checkbox(&mut controls.visible.square, "Square");
                ui.checkbox(&mut controls.visible.cube, "Cube");
            });

            if ui.button("Load Scene").clicked() {
                actions.load_scene = true;
            }
        });

    actions
}

pub fn draw_stats(ctx: &egui::Context, clock: &FrameClock, stats: FrameStats) {
    egui::Area::new(egui::Id::new("frame_stats"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "{:.0} FPS ({:.2} ms)",
                    clock.fps(),
                    clock.smoothed_dt() * 1000.0
                ))
                .monospace()
                .color(egui::Color32::LIGHT_GREEN),
            );
            ui.label(
                egui::RichText::new(format!(
                    "{} draws, {} tris",
                    stats.draw_calls, stats.triangles
                ))
                .monospace(),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_has_fixed_alpha() {
        let controls = Controls {
            color_r: 0.3,
            color_g: 0.6,
            color_b: 0.9,
            ..Default::default()
        };
        assert_eq!(controls.color(), Vec4::new(0.3, 0.6, 0.9, 1.0));
    }

    #[test]
    fn color_channels_are_clamped() {
        let controls = Controls {
            color_r: -0.5,
            color_g: 2.0,
            ..Default::default()
        };
        assert_eq!(controls.color(), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn defaults_show_only_the_cube() {
        let controls = Controls::default();
        assert_eq!(controls.subdivisions, 5);
        assert!(!controls.use_custom_shader);
        assert_eq!(
            controls.visible,
            Visibility {
                icosphere: false,
                square: false,
                cube: true
            }
        );
    }

    #[test]
    fn panel_runs_headless() {
        let ctx = egui::Context::default();
        let mut controls = Controls::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            let actions = draw_controls(ctx, &mut controls);
            assert_eq!(actions, UiActions::default());
            draw_stats(ctx, &FrameClock::new(), FrameStats::default());
        });
        assert_eq!(controls, Controls::default());
    }
}
