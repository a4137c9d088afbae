use glam::{Mat4, Vec4};

use super::layout::{Uniform, UniformBlockLayout};

/// CPU copy of a program's uniform block, written at reflected offsets.
///
/// Writes to uniforms the block does not declare are dropped.
#[derive(Debug, Clone)]
pub struct UniformStaging {
    layout: Option<UniformBlockLayout>,
    block: Vec<u8>,
}

impl UniformStaging {
    pub fn new(layout: Option<UniformBlockLayout>) -> Self {
        let size = layout.as_ref().map_or(0, |l| l.size as usize);
        Self {
            layout,
            block: vec![0; size],
        }
    }

    pub fn set_mat4(&mut self, uniform: Uniform, value: &Mat4) -> bool {
        self.write(uniform, bytemuck::bytes_of(value))
    }

    pub fn set_vec4(&mut self, uniform: Uniform, value: Vec4) -> bool {
        self.write(uniform, bytemuck::bytes_of(&value))
    }

    pub fn set_f32(&mut self, uniform: Uniform, value: f32) -> bool {
        self.write(uniform, bytemuck::bytes_of(&value))
    }

    fn write(&mut self, uniform: Uniform, bytes: &[u8]) -> bool {
        let Some(offset) = self.layout.as_ref().and_then(|l| l.offset(uniform)) else {
            return false;
        };
        debug_assert_eq!(bytes.len(), uniform.kind().size());

        let start = offset as usize;
        self.block[start..start + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Components of a declared uniform, column-major for matrices.
    pub fn read_f32s(&self, uniform: Uniform) -> Option<&[f32]> {
        let offset = self.layout.as_ref()?.offset(uniform)? as usize;
        let bytes = &self.block[offset..offset + uniform.kind().size()];
        Some(bytemuck::cast_slice(bytes))
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.block
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.block.len()
    }
}

/// Per-draw snapshots of the uniform block, packed at a stride that
/// satisfies the device's dynamic offset alignment.
#[derive(Debug, Clone)]
pub struct DrawSlots {
    stride: usize,
    data: Vec<u8>,
    count: u32,
}

impl DrawSlots {
    pub fn new(block_size: usize, alignment: u32) -> Self {
        let alignment = (alignment as usize).max(1);
        Self {
            stride: block_size.div_ceil(alignment) * alignment,
            data: Vec::new(),
            count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.count = 0;
    }

    /// Snapshots `staging` into the next slot and returns its index.
    pub fn push(&mut self, staging: &UniformStaging) -> u32 {
        let start = self.data.len();
        self.data.resize(start + self.stride, 0);
        self.data[start..start + staging.size()].copy_from_slice(staging.bytes());

        self.count += 1;
        self.count - 1
    }

    /// Dynamic offset of `slot` in bytes.
    #[inline]
    pub fn offset(&self, slot: u32) -> u32 {
        (slot as usize * self.stride) as u32
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}
