//! Offscreen rendering tests. Each test passes vacuously when no GPU adapter
//! is available.

use glam::{Vec3, Vec4};
use mesh_viewer::{
    app::{custom_shaders, lambert_shaders, Scene},
    camera::Camera,
    geometry::{Drawable, Geometry},
    renderer::{FrameStats, Renderer, DEPTH_FORMAT},
    shader::{Shader, ShaderError, ShaderProgram, ShaderStage},
    ui::Visibility,
};
use meshgen::{Cube, Icosphere, Square};

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }));
    let Some(adapter) = adapter else {
        eprintln!("no GPU adapter, skipping");
        return None;
    };

    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("Test Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
        },
        None,
    ))
    .ok()
}

struct Offscreen {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Offscreen {
    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color"),
            size: wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Reads back RGBA8 pixels, row-major.
    fn read(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Vec<u8> {
        // 64 px * 4 bytes is already a multiple of COPY_BYTES_PER_ROW_ALIGNMENT.
        let bytes_per_row = SIZE * 4;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback"),
            size: (bytes_per_row * SIZE) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            self.texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(SIZE),
                },
            },
            wgpu::Extent3d {
                width: SIZE,
                height: SIZE,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |r| r.unwrap());
        let _ = device.poll(wgpu::Maintain::Wait);
        let pixels = slice.get_mapped_range().to_vec();
        buffer.unmap();
        pixels
    }
}

fn camera() -> Camera {
    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
    camera.set_aspect_ratio(1.0);
    camera.update_projection_matrix();
    camera
}

fn program(device: &wgpu::Device, shaders: &[Shader]) -> ShaderProgram {
    ShaderProgram::new(device, "Test", shaders, FORMAT, DEPTH_FORMAT).unwrap()
}

fn frame(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &Offscreen,
    program: &mut ShaderProgram,
    geometries: &[&dyn Drawable],
) -> FrameStats {
    let mut renderer = Renderer::new(device, SIZE, SIZE);
    renderer.set_clear_color(0.2, 0.2, 0.2, 1.0);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Frame"),
    });
    renderer.clear(&mut encoder, &target.view);
    let stats = renderer.render(
        device,
        queue,
        &mut encoder,
        &target.view,
        &camera(),
        program,
        Vec4::new(1.0, 0.0, 0.0, 1.0),
        geometries,
    );
    queue.submit(std::iter::once(encoder.finish()));
    stats
}

fn created(device: &wgpu::Device, shape: impl Into<meshgen::Shape>) -> Geometry {
    let mut geometry = Geometry::new(shape);
    geometry.create(device).unwrap();
    geometry
}

#[test]
fn empty_list_clears_and_draws_nothing() {
    let Some((device, queue)) = gpu() else { return };
    let target = Offscreen::new(&device);
    let mut lambert = program(&device, &lambert_shaders());

    let stats = frame(&device, &queue, &target, &mut lambert, &[]);
    assert_eq!(stats, FrameStats::default());

    let pixels = target.read(&device, &queue);
    assert!(pixels.chunks_exact(4).all(|p| p == [51, 51, 51, 255]));
}

#[test]
fn every_geometry_is_drawn_in_order() {
    let Some((device, queue)) = gpu() else { return };
    let target = Offscreen::new(&device);
    let mut lambert = program(&device, &lambert_shaders());

    let sphere = created(&device, Icosphere::new(Vec3::ZERO, 1.0, 1));
    let square = created(&device, Square::new(Vec3::ZERO));
    let cube = created(&device, Cube::new(Vec3::ZERO));

    let stats = frame(&device, &queue, &target, &mut lambert, &[&sphere, &square, &cube]);
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.triangles, 80 + 2 + 12);
}

#[test]
fn uncreated_geometry_is_skipped() {
    let Some((device, queue)) = gpu() else { return };
    let target = Offscreen::new(&device);
    let mut lambert = program(&device, &lambert_shaders());

    let cube = created(&device, Cube::new(Vec3::ZERO));
    let pending = Geometry::new(Square::new(Vec3::ZERO));

    let stats = frame(&device, &queue, &target, &mut lambert, &[&pending, &cube]);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.triangles, 12);
}

#[test]
fn create_is_idempotent() {
    let Some((device, _queue)) = gpu() else { return };
    let mut cube = created(&device, Cube::new(Vec3::ZERO));
    cube.create(&device).unwrap();
    assert_eq!(cube.vertex_count(), 24);
    assert_eq!(cube.index_count(), 36);
}

#[test]
fn missing_fragment_stage_fails_construction() {
    let Some((device, _queue)) = gpu() else { return };
    let [vert, _] = lambert_shaders();
    let err = ShaderProgram::new(&device, "Broken", &[vert], FORMAT, DEPTH_FORMAT)
        .err()
        .unwrap();
    assert!(matches!(err, ShaderError::MissingStage(ShaderStage::Fragment)));
}

#[test]
fn colorless_geometry_uses_fallback_attribute() {
    let Some((device, queue)) = gpu() else { return };
    let target = Offscreen::new(&device);
    let mut lambert = program(&device, &lambert_shaders());

    // 642 vertices: larger than the initial fallback buffer.
    let sphere = created(&device, Icosphere::new(Vec3::ZERO, 1.0, 3));
    let stats = frame(&device, &queue, &target, &mut lambert, &[&sphere]);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.triangles, 1280);

    let pixels = target.read(&device, &queue);
    let center = ((SIZE / 2 * SIZE + SIZE / 2) * 4) as usize;
    assert!(pixels[center] > 51 + 20, "sphere not lit: {:?}", &pixels[center..center + 4]);
}

#[test]
fn custom_program_draws_with_time() {
    let Some((device, queue)) = gpu() else { return };
    let target = Offscreen::new(&device);
    let mut custom = program(&device, &custom_shaders());
    custom.set_u_time(1234.0);
    assert_eq!(
        custom.staging().read_f32s(mesh_viewer::shader::Uniform::Time),
        Some(&[1234.0][..])
    );

    let sphere = created(&device, Icosphere::new(Vec3::ZERO, 1.0, 2));
    let stats = frame(&device, &queue, &target, &mut custom, &[&sphere]);
    assert_eq!(stats.draw_calls, 1);
}

#[test]
fn cube_covers_center_but_not_corner() {
    let Some((device, queue)) = gpu() else { return };
    let target = Offscreen::new(&device);
    let mut lambert = program(&device, &lambert_shaders());

    let cube = created(&device, Cube::new(Vec3::ZERO));
    frame(&device, &queue, &target, &mut lambert, &[&cube]);

    let pixels = target.read(&device, &queue);
    let center = ((SIZE / 2 * SIZE + SIZE / 2) * 4) as usize;
    assert_eq!(&pixels[0..4], &[51, 51, 51, 255]);
    assert!(pixels[center] > 51 + 20);
    assert!(pixels[center + 1] < 10, "green channel should be masked by color");
}

#[test]
fn scene_rebuilds_icosphere_on_level_change() {
    let Some((device, _queue)) = gpu() else { return };
    let mut scene = Scene::load(&device, 2).unwrap();
    assert_eq!(scene.subdivisions(), 2);
    assert_eq!(scene.icosphere.vertex_count(), 162);

    assert!(!scene.sync_subdivisions(&device, 2).unwrap());
    assert!(scene.sync_subdivisions(&device, 3).unwrap());
    assert_eq!(scene.icosphere.vertex_count(), 642);

    let all = Visibility {
        icosphere: true,
        square: true,
        cube: true,
    };
    assert_eq!(scene.drawables(all).len(), 3);
    assert_eq!(scene.drawables(Visibility::default()).len(), 1);
}

#[test]
fn renderer_tracks_size_and_clear_color() {
    let Some((device, _queue)) = gpu() else { return };
    let mut renderer = Renderer::new(&device, SIZE, SIZE);
    assert_eq!(renderer.size(), (SIZE, SIZE));

    renderer.set_size(&device, 100, 40);
    assert_eq!(renderer.size(), (100, 40));

    // Minimised windows report zero; the depth target stays valid.
    renderer.set_size(&device, 0, 0);
    assert_eq!(renderer.size(), (1, 1));

    renderer.set_clear_color(0.1, 0.2, 0.3, 1.0);
    let c = renderer.clear_color();
    assert_eq!((c.r, c.g, c.b, c.a), (0.1, 0.2, 0.3, 1.0));
}
