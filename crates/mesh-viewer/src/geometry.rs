//! GPU-resident geometry and the contract programs draw against.

use glam::Mat4;
use meshgen::{MeshError, MeshSource, Shape};
use wgpu::util::DeviceExt;

use crate::shader::Attribute;

/// What a shader program needs from something it draws.
///
/// Attributes a drawable does not provide return `None`; that is not an
/// error, the program substitutes a constant.
pub trait Drawable {
    fn attribute_buffer(&self, attribute: Attribute) -> Option<&wgpu::Buffer>;
    fn index_buffer(&self) -> Option<&wgpu::Buffer>;
    fn index_count(&self) -> u32;
    fn vertex_count(&self) -> u32;

    fn model_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }
}

struct GeometryBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    colors: Option<wgpu::Buffer>,
    indices: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
}

/// A shape plus the GPU buffers generated from it.
///
/// Buffers are allocated once by [`Geometry::create`] and released on drop.
/// Changing the shape means building a new `Geometry`.
pub struct Geometry {
    shape: Shape,
    buffers: Option<GeometryBuffers>,
}

impl Geometry {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            buffers: None,
        }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        self.buffers.is_some()
    }

    /// Generates the mesh and uploads it. Calling this again is a no-op.
    pub fn create(&mut self, device: &wgpu::Device) -> Result<(), MeshError> {
        if self.buffers.is_some() {
            log::debug!("{}: already created", self.shape.name());
            return Ok(());
        }

        let mesh = self.shape.generate();
        mesh.validate()?;

        let name = self.shape.name();
        let vertex_buffer = |suffix: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("{name} {suffix}").as_str()),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        let buffers = GeometryBuffers {
            positions: vertex_buffer("Positions", mesh.position_bytes()),
            normals: vertex_buffer("Normals", mesh.normal_bytes()),
            colors: mesh
                .has_colors()
                .then(|| vertex_buffer("Colors", mesh.color_bytes())),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("{name} Indices").as_str()),
                contents: mesh.index_bytes(),
                usage: wgpu::BufferUsages::INDEX,
            }),
            vertex_count: mesh.vertex_count() as u32,
            index_count: mesh.index_count() as u32,
        };

        log::debug!(
            "{}: uploaded {} vertices, {} faces{}",
            name,
            buffers.vertex_count,
            mesh.face_count(),
            if buffers.colors.is_some() { ", with colors" } else { "" }
        );

        self.buffers = Some(buffers);
        Ok(())
    }
}

impl Drawable for Geometry {
    fn attribute_buffer(&self, attribute: Attribute) -> Option<&wgpu::Buffer> {
        let buffers = self.buffers.as_ref()?;
        match attribute {
            Attribute::Position => Some(&buffers.positions),
            Attribute::Normal => Some(&buffers.normals),
            Attribute::Color => buffers.colors.as_ref(),
        }
    }

    fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffers.as_ref().map(|b| &b.indices)
    }

    fn index_count(&self) -> u32 {
        self.buffers.as_ref().map_or(0, |b| b.index_count)
    }

    fn vertex_count(&self) -> u32 {
        self.buffers.as_ref().map_or(0, |b| b.vertex_count)
    }
}
