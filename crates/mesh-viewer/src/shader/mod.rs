//! Shader programs: a vertex + fragment stage pair with a resolved attribute
//! and uniform contract.
//!
//! - `layout` compiles WGSL stages with naga and links them into a
//!   [`ProgramLayout`] (attribute slots, uniform offsets). Pure CPU work.
//! - `uniforms` holds the CPU-side uniform staging used by the setters.
//! - `program` builds the wgpu pipeline and issues draws.

mod layout;
mod program;
mod uniforms;

pub use layout::{
    Attribute, AttributeSlot, CompiledShader, ProgramLayout, Shader, ShaderStage, Uniform,
    UniformBlockLayout, UniformKind,
};
pub use program::ShaderProgram;
pub use uniforms::{DrawSlots, UniformStaging};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to compile `{label}`: {message}")]
    Compile { label: String, message: String },

    #[error("`{label}` has no {stage} entry point")]
    MissingEntryPoint { label: String, stage: ShaderStage },

    #[error("program has no {0} stage")]
    MissingStage(ShaderStage),

    #[error("program has more than one {0} stage")]
    DuplicateStage(ShaderStage),

    #[error("fragment input @location({0}) is not written by the vertex stage")]
    UnmatchedVarying(u32),

    #[error("vertex input `{0}` is not a known attribute")]
    UnknownAttribute(String),

    #[error("attribute `{0}` must be vec4<f32>")]
    AttributeType(&'static str),

    #[error("uniform `{name}` must be {expected}")]
    UniformType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("uniform block at @group(0) @binding(0) must be a struct")]
    UniformBlockType,

    #[error("vertex and fragment stages disagree on the uniform block layout")]
    UniformMismatch,

    #[error("pipeline link failed for `{label}`: {message}")]
    Link { label: String, message: String },
}
