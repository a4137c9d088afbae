use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use naga::{AddressSpace, Binding, Handle, Module, Scalar, Type, TypeInner, VectorSize};

use super::ShaderError;

/// Per-vertex inputs a program may declare, by WGSL argument name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Position,
    Normal,
    Color,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Position, Attribute::Normal, Attribute::Color];

    pub fn shader_name(self) -> &'static str {
        match self {
            Attribute::Position => "vs_pos",
            Attribute::Normal => "vs_nor",
            Attribute::Color => "vs_col",
        }
    }

    pub fn from_shader_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.shader_name() == name)
    }
}

/// Members of the uniform block a program may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Uniform {
    Model,
    ModelInvTr,
    ViewProj,
    Color,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec4,
    F32,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec4 => 16,
            UniformKind::F32 => 4,
        }
    }

    fn wgsl(self) -> &'static str {
        match self {
            UniformKind::Mat4 => "mat4x4<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::F32 => "f32",
        }
    }
}

impl Uniform {
    pub const ALL: [Uniform; 5] = [
        Uniform::Model,
        Uniform::ModelInvTr,
        Uniform::ViewProj,
        Uniform::Color,
        Uniform::Time,
    ];

    pub fn shader_name(self) -> &'static str {
        match self {
            Uniform::Model => "u_model",
            Uniform::ModelInvTr => "u_model_inv_tr",
            Uniform::ViewProj => "u_view_proj",
            Uniform::Color => "u_color",
            Uniform::Time => "u_time",
        }
    }

    pub fn kind(self) -> UniformKind {
        match self {
            Uniform::Model | Uniform::ModelInvTr | Uniform::ViewProj => UniformKind::Mat4,
            Uniform::Color => UniformKind::Vec4,
            Uniform::Time => UniformKind::F32,
        }
    }

    pub fn from_shader_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.shader_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// One WGSL stage. The source is opaque to the program apart from the
/// attribute and uniform names it declares.
#[derive(Debug, Clone)]
pub struct Shader {
    pub stage: ShaderStage,
    pub label: String,
    pub source: Cow<'static, str>,
}

impl Shader {
    pub fn new(stage: ShaderStage, label: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage,
            label: label.into(),
            source: source.into(),
        }
    }

    pub fn vertex(label: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Vertex, label, source)
    }

    pub fn fragment(label: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Fragment, label, source)
    }

    /// Parses and validates the stage, and locates its entry point.
    pub fn compile(&self) -> Result<CompiledShader, ShaderError> {
        let module = naga::front::wgsl::parse_str(&self.source).map_err(|e| ShaderError::Compile {
            label: self.label.clone(),
            message: e.emit_to_string(&self.source),
        })?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            label: self.label.clone(),
            message: e.to_string(),
        })?;

        let entry_point = module
            .entry_points
            .iter()
            .position(|ep| ep.stage == self.stage.naga())
            .ok_or_else(|| ShaderError::MissingEntryPoint {
                label: self.label.clone(),
                stage: self.stage,
            })?;

        Ok(CompiledShader {
            shader: self.clone(),
            module,
            entry_point,
        })
    }
}

/// A stage that parsed and validated.
#[derive(Debug)]
pub struct CompiledShader {
    pub shader: Shader,
    module: Module,
    entry_point: usize,
}

impl CompiledShader {
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.shader.stage
    }

    pub fn entry_point(&self) -> &str {
        &self.module.entry_points[self.entry_point].name
    }

    fn function(&self) -> &naga::Function {
        &self.module.entry_points[self.entry_point].function
    }

    /// `@location` inputs of the entry point, flattening struct arguments.
    fn inputs(&self) -> Vec<Varying> {
        let mut out = Vec::new();
        for arg in &self.function().arguments {
            collect_varyings(&self.module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut out);
        }
        out
    }

    /// `@location` outputs of the entry point.
    fn outputs(&self) -> Vec<Varying> {
        let mut out = Vec::new();
        if let Some(result) = &self.function().result {
            collect_varyings(&self.module, None, result.ty, result.binding.as_ref(), &mut out);
        }
        out
    }

    /// Reflects the uniform block at `@group(0) @binding(0)`, if declared.
    fn uniform_block(&self) -> Result<Option<UniformBlockLayout>, ShaderError> {
        let Some(var) = self.module.global_variables.iter().map(|(_, v)| v).find(|v| {
            v.space == AddressSpace::Uniform
                && v.binding.as_ref().map_or(false, |b| b.group == 0 && b.binding == 0)
        }) else {
            return Ok(None);
        };

        let TypeInner::Struct { members, span } = &self.module.types[var.ty].inner else {
            return Err(ShaderError::UniformBlockType);
        };

        let mut offsets = BTreeMap::new();
        for member in members {
            let name = member.name.as_deref().unwrap_or_default();
            let Some(uniform) = Uniform::from_shader_name(name) else {
                log::debug!("{}: uniform member `{}` is not driven by the renderer", self.shader.label, name);
                continue;
            };

            if uniform_kind(&self.module.types[member.ty].inner) != Some(uniform.kind()) {
                return Err(ShaderError::UniformType {
                    name: uniform.shader_name(),
                    expected: uniform.kind().wgsl(),
                });
            }
            offsets.insert(uniform, member.offset);
        }

        Ok(Some(UniformBlockLayout { size: *span, offsets }))
    }
}

#[derive(Debug, Clone)]
struct Varying {
    name: Option<String>,
    location: u32,
    ty: Handle<Type>,
}

fn location_of(binding: Option<&Binding>) -> Option<u32> {
    match binding {
        Some(Binding::Location { location, .. }) => Some(*location),
        _ => None,
    }
}

fn collect_varyings(
    module: &Module,
    name: Option<&str>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    if let Some(location) = location_of(binding) {
        out.push(Varying {
            name: name.map(str::to_owned),
            location,
            ty,
        });
        return;
    }

    // Builtins are not varyings; unbound structs carry per-member bindings.
    if binding.is_some() {
        return;
    }
    if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
        for member in members {
            if let Some(location) = location_of(member.binding.as_ref()) {
                out.push(Varying {
                    name: member.name.clone(),
                    location,
                    ty: member.ty,
                });
            }
        }
    }
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar == Scalar::F32 => Some(UniformKind::Mat4),
        TypeInner::Vector {
            size: VectorSize::Quad,
            scalar,
        } if scalar == Scalar::F32 => Some(UniformKind::Vec4),
        TypeInner::Scalar(scalar) if scalar == Scalar::F32 => Some(UniformKind::F32),
        _ => None,
    }
}

/// Attribute declared by the vertex stage. The slot is the vertex buffer
/// index the attribute is bound to at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlot {
    pub attribute: Attribute,
    pub location: u32,
    pub slot: u32,
}

/// Byte layout of the uniform block, keyed by the uniforms it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockLayout {
    pub size: u32,
    offsets: BTreeMap<Uniform, u32>,
}

impl UniformBlockLayout {
    /// Byte offset of `uniform`, or `None` if the block does not declare it.
    #[inline]
    pub fn offset(&self, uniform: Uniform) -> Option<u32> {
        self.offsets.get(&uniform).copied()
    }

    pub fn declared(&self) -> impl Iterator<Item = Uniform> + '_ {
        self.offsets.keys().copied()
    }
}

/// Attribute and uniform contract of a linked vertex + fragment pair.
///
/// Resolved once by [`ProgramLayout::link`] and fixed afterwards.
#[derive(Debug)]
pub struct ProgramLayout {
    vertex: CompiledShader,
    fragment: CompiledShader,
    attributes: Vec<AttributeSlot>,
    uniforms: Option<UniformBlockLayout>,
}

impl ProgramLayout {
    /// Links compiled stages: exactly one vertex and one fragment stage,
    /// every fragment input fed by a vertex output, vertex inputs limited to
    /// known `vec4<f32>` attributes, and one uniform block layout shared by
    /// both stages.
    pub fn link(stages: Vec<CompiledShader>) -> Result<Self, ShaderError> {
        let mut vertex = None;
        let mut fragment = None;

        for stage in stages {
            let slot = match stage.stage() {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
            };
            if slot.is_some() {
                return Err(ShaderError::DuplicateStage(stage.stage()));
            }
            *slot = Some(stage);
        }

        let vertex: CompiledShader = vertex.ok_or(ShaderError::MissingStage(ShaderStage::Vertex))?;
        let fragment: CompiledShader =
            fragment.ok_or(ShaderError::MissingStage(ShaderStage::Fragment))?;

        let written: BTreeSet<u32> = vertex.outputs().iter().map(|v| v.location).collect();
        if let Some(missing) = fragment
            .inputs()
            .iter()
            .map(|v| v.location)
            .find(|l| !written.contains(l))
        {
            return Err(ShaderError::UnmatchedVarying(missing));
        }

        let mut inputs = vertex.inputs();
        inputs.sort_by_key(|v| v.location);

        let mut attributes = Vec::with_capacity(inputs.len());
        for (slot, input) in inputs.iter().enumerate() {
            let name = input.name.as_deref().unwrap_or_default();
            let attribute = Attribute::from_shader_name(name)
                .ok_or_else(|| ShaderError::UnknownAttribute(name.to_owned()))?;

            let is_vec4 = matches!(
                vertex.module.types[input.ty].inner,
                TypeInner::Vector { size: VectorSize::Quad, scalar } if scalar == Scalar::F32
            );
            if !is_vec4 {
                return Err(ShaderError::AttributeType(attribute.shader_name()));
            }

            attributes.push(AttributeSlot {
                attribute,
                location: input.location,
                slot: slot as u32,
            });
        }

        let uniforms = match (vertex.uniform_block()?, fragment.uniform_block()?) {
            (Some(v), Some(f)) if v != f => return Err(ShaderError::UniformMismatch),
            (v, f) => v.or(f),
        };

        Ok(Self {
            vertex,
            fragment,
            attributes,
            uniforms,
        })
    }

    pub fn vertex(&self) -> &CompiledShader {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledShader {
        &self.fragment
    }

    /// Declared attributes in slot order.
    pub fn attributes(&self) -> &[AttributeSlot] {
        &self.attributes
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<AttributeSlot> {
        self.attributes.iter().copied().find(|a| a.attribute == attribute)
    }

    pub fn uniform_block(&self) -> Option<&UniformBlockLayout> {
        self.uniforms.as_ref()
    }

    pub fn uniform_offset(&self, uniform: Uniform) -> Option<u32> {
        self.uniforms.as_ref().and_then(|b| b.offset(uniform))
    }
}
