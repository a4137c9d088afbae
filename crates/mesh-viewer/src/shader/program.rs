use std::num::NonZeroU64;

use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use super::layout::{ProgramLayout, Shader, Uniform};
use super::uniforms::{DrawSlots, UniformStaging};
use super::ShaderError;
use crate::geometry::Drawable;

const VERTEX_STRIDE: u64 = std::mem::size_of::<[f32; 4]>() as u64;
const MIN_FALLBACK_VERTICES: u32 = 64;
const MIN_UNIFORM_SLOTS: u32 = 8;

/// Uniform buffer + bind group sized for a number of per-draw slots.
struct UniformBinding {
    layout: wgpu::BindGroupLayout,
    block_size: NonZeroU64,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u32,
}

impl UniformBinding {
    fn new(device: &wgpu::Device, label: &str, block_size: NonZeroU64) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(block_size),
                },
                count: None,
            }],
        });

        let (buffer, bind_group) = Self::allocate(device, &layout, block_size, label, 0);
        Self {
            layout,
            block_size,
            buffer,
            bind_group,
            capacity: 0,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        block_size: NonZeroU64,
        label: &str,
        bytes: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: bytes.max(block_size.get()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: Some(block_size),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn ensure_slots(&mut self, device: &wgpu::Device, label: &str, slots: u32, stride: usize) {
        if slots <= self.capacity {
            return;
        }
        let capacity = slots.next_power_of_two().max(MIN_UNIFORM_SLOTS);
        let (buffer, bind_group) = Self::allocate(
            device,
            &self.layout,
            self.block_size,
            label,
            capacity as u64 * stride as u64,
        );
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }
}

/// Constant `(1, 1, 1, 1)` vertex data bound for attributes a geometry
/// does not provide.
struct FallbackAttribute {
    buffer: wgpu::Buffer,
    capacity: u32,
}

impl FallbackAttribute {
    fn new(device: &wgpu::Device, vertices: u32) -> Self {
        let capacity = vertices.next_power_of_two().max(MIN_FALLBACK_VERTICES);
        let ones = vec![Vec4::ONE; capacity as usize];
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fallback Attribute VB"),
            contents: bytemuck::cast_slice(&ones),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer, capacity }
    }

    fn ensure(&mut self, device: &wgpu::Device, vertices: u32) {
        if vertices > self.capacity {
            *self = Self::new(device, vertices);
        }
    }
}

/// A linked vertex + fragment program and the wgpu pipeline built from it.
///
/// Uniform setters write into a CPU staging block. [`commit_draw`] snapshots
/// that block into a per-draw slot, [`upload`] copies all slots of the frame
/// to the GPU, and [`draw`] selects a slot by dynamic offset.
///
/// [`commit_draw`]: ShaderProgram::commit_draw
/// [`upload`]: ShaderProgram::upload
/// [`draw`]: ShaderProgram::draw
pub struct ShaderProgram {
    label: String,
    layout: ProgramLayout,
    pipeline: wgpu::RenderPipeline,
    uniforms: Option<UniformBinding>,
    staging: UniformStaging,
    slots: DrawSlots,
    fallback: FallbackAttribute,
}

impl ShaderProgram {
    /// Compiles and links `shaders`, then builds the render pipeline.
    ///
    /// Any failure here is fatal for the caller: there is no partially
    /// usable program.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        shaders: &[Shader],
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let compiled = shaders
            .iter()
            .map(Shader::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let layout = ProgramLayout::link(compiled)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let uniforms = layout
            .uniform_block()
            .and_then(|b| NonZeroU64::new(b.size as u64))
            .map(|size| UniformBinding::new(device, &format!("{label} Uniforms"), size));

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(layout.vertex().shader.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(layout.vertex().shader.source.clone()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(layout.fragment().shader.label.as_str()),
            source: wgpu::ShaderSource::Wgsl(layout.fragment().shader.source.clone()),
        });

        // One tightly packed vec4 buffer per declared attribute, in slot order.
        let vertex_attributes: Vec<[wgpu::VertexAttribute; 1]> = layout
            .attributes()
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    shader_location: a.location,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x4,
                }]
            })
            .collect();
        let vbuf_layouts: Vec<wgpu::VertexBufferLayout> = vertex_attributes
            .iter()
            .map(|attributes| wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            uniforms.iter().map(|u| &u.layout).collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: layout.vertex().entry_point(),
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: layout.fragment().entry_point(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Link {
                label: label.to_owned(),
                message: err.to_string(),
            });
        }

        let staging = UniformStaging::new(layout.uniform_block().cloned());
        let slots = DrawSlots::new(
            staging.size(),
            device.limits().min_uniform_buffer_offset_alignment,
        );

        log::info!(
            "Linked program '{}': attributes [{}], uniforms [{}]",
            label,
            layout
                .attributes()
                .iter()
                .map(|a| a.attribute.shader_name())
                .collect::<Vec<_>>()
                .join(", "),
            layout
                .uniform_block()
                .map(|b| b.declared().map(Uniform::shader_name).collect::<Vec<_>>().join(", "))
                .unwrap_or_default(),
        );

        Ok(Self {
            label: label.to_owned(),
            layout,
            pipeline,
            uniforms,
            staging,
            slots,
            fallback: FallbackAttribute::new(device, MIN_FALLBACK_VERTICES),
        })
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    #[inline]
    pub fn staging(&self) -> &UniformStaging {
        &self.staging
    }

    pub fn set_model_matrix(&mut self, model: &Mat4) {
        self.staging.set_mat4(Uniform::Model, model);
    }

    pub fn set_view_proj_matrix(&mut self, view_proj: &Mat4) {
        self.staging.set_mat4(Uniform::ViewProj, view_proj);
    }

    /// Inverse-transpose of the model matrix, for transforming normals.
    pub fn set_normal_matrix(&mut self, model_inv_tr: &Mat4) {
        self.staging.set_mat4(Uniform::ModelInvTr, model_inv_tr);
    }

    pub fn set_u_time(&mut self, ms: f32) {
        self.staging.set_f32(Uniform::Time, ms);
    }

    pub fn set_geometry_color(&mut self, color: Vec4) {
        self.staging.set_vec4(Uniform::Color, color);
    }

    /// Starts a new frame; slots committed in earlier frames are discarded.
    pub fn begin_frame(&mut self) {
        self.slots.clear();
    }

    /// Snapshots the current uniform values for one draw.
    pub fn commit_draw(&mut self) -> u32 {
        self.slots.push(&self.staging)
    }

    /// Copies this frame's slots to the GPU and makes sure the fallback
    /// attribute buffer covers every geometry that will rely on it.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometries: &[&dyn Drawable],
    ) {
        if let Some(uniforms) = &mut self.uniforms {
            if !self.slots.is_empty() {
                uniforms.ensure_slots(
                    device,
                    &self.label,
                    self.slots.len(),
                    self.slots.stride(),
                );
                queue.write_buffer(&uniforms.buffer, 0, self.slots.bytes());
            }
        }

        let needed = geometries
            .iter()
            .filter(|g| {
                self.layout
                    .attributes()
                    .iter()
                    .any(|a| g.attribute_buffer(a.attribute).is_none())
            })
            .map(|g| g.vertex_count())
            .max()
            .unwrap_or(0);
        self.fallback.ensure(device, needed);
    }

    /// Selects this program's pipeline on `pass`.
    pub fn bind<'p>(&'p self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_pipeline(&self.pipeline);
    }

    /// Binds `geometry`'s buffers to the declared attribute slots and issues
    /// one indexed draw over all of its indices. Returns `false` when the
    /// geometry has nothing to draw.
    pub fn draw<'p>(
        &'p self,
        pass: &mut wgpu::RenderPass<'p>,
        geometry: &'p dyn Drawable,
        slot: u32,
    ) -> bool {
        let Some(index_buffer) = geometry.index_buffer() else {
            return false;
        };
        if geometry.index_count() == 0 {
            return false;
        }

        for attr in self.layout.attributes() {
            let buffer = match geometry.attribute_buffer(attr.attribute) {
                Some(buffer) => buffer,
                None if geometry.vertex_count() <= self.fallback.capacity => {
                    &self.fallback.buffer
                }
                None => {
                    log::warn!(
                        "'{}': no `{}` data for {} vertices, skipping draw",
                        self.label,
                        attr.attribute.shader_name(),
                        geometry.vertex_count()
                    );
                    return false;
                }
            };
            pass.set_vertex_buffer(attr.slot, buffer.slice(..));
        }

        if let Some(uniforms) = &self.uniforms {
            pass.set_bind_group(0, &uniforms.bind_group, &[self.slots.offset(slot)]);
        }

        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..geometry.index_count(), 0, 0..1);
        true
    }
}
