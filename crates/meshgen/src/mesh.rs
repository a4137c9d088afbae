use std::collections::HashMap;

use glam::Vec4;
use thiserror::Error;

/// Undirected edge between two vertex indices, stored as `(min, max)`.
pub type EdgeKey = (u32, u32);

/// Returns the order-independent key for the edge `a`–`b`.
#[inline]
pub fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("attribute `{attribute}` has {actual} elements, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} at position {at} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        at: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
}

/// CPU-side vertex attribute buffers of a triangle list.
///
/// `positions`, `normals` and (when present) `colors` are parallel arrays.
/// An empty `colors` means the mesh does not provide a color attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec4>,
    pub normals: Vec<Vec4>,
    pub colors: Vec<Vec4>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Iterates the triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Checks the buffer invariants: parallel attribute lengths, whole
    /// triangles only, and every index in range.
    pub fn validate(&self) -> Result<(), MeshError> {
        let expected = self.positions.len();

        if self.normals.len() != expected {
            return Err(MeshError::AttributeLength {
                attribute: "normals",
                expected,
                actual: self.normals.len(),
            });
        }

        if self.has_colors() && self.colors.len() != expected {
            return Err(MeshError::AttributeLength {
                attribute: "colors",
                expected,
                actual: self.colors.len(),
            });
        }

        if self.indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(self.indices.len()));
        }

        if let Some((at, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= expected)
        {
            return Err(MeshError::IndexOutOfRange {
                at,
                index,
                vertex_count: expected,
            });
        }

        Ok(())
    }

    /// Counts how many triangles use each undirected edge.
    pub fn edge_use_counts(&self) -> HashMap<EdgeKey, u32> {
        let mut counts = HashMap::with_capacity(self.indices.len());
        for [a, b, c] in self.triangles() {
            for (p, q) in [(a, b), (b, c), (c, a)] {
                *counts.entry(edge_key(p, q)).or_insert(0) += 1;
            }
        }
        counts
    }

    /// True when every edge borders exactly two triangles (no holes or seams).
    pub fn is_closed_manifold(&self) -> bool {
        let counts = self.edge_use_counts();
        !counts.is_empty() && counts.values().all(|&n| n == 2)
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshBuffers {
        MeshBuffers {
            positions: vec![Vec4::W, Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 1.0)],
            normals: vec![Vec4::Z; 3],
            colors: Vec::new(),
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn edge_key_is_unordered() {
        assert_eq!(edge_key(7, 3), (3, 7));
        assert_eq!(edge_key(3, 7), (3, 7));
    }

    #[test]
    fn valid_triangle_passes() {
        assert_eq!(triangle().validate(), Ok(()));
    }

    #[test]
    fn normal_length_mismatch_is_reported() {
        let mut mesh = triangle();
        mesh.normals.pop();
        assert_eq!(
            mesh.validate(),
            Err(MeshError::AttributeLength {
                attribute: "normals",
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn color_length_mismatch_is_reported() {
        let mut mesh = triangle();
        mesh.colors = vec![Vec4::ONE; 2];
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::AttributeLength { attribute: "colors", .. })
        ));
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut mesh = triangle();
        mesh.indices[1] = 3;
        assert_eq!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange {
                at: 1,
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn partial_triangle_is_reported() {
        let mut mesh = triangle();
        mesh.indices.push(0);
        assert_eq!(mesh.validate(), Err(MeshError::PartialTriangle(4)));
    }

    #[test]
    fn single_triangle_is_not_closed() {
        let mesh = triangle();
        assert_eq!(mesh.edge_use_counts().len(), 3);
        assert!(!mesh.is_closed_manifold());
    }

    #[test]
    fn byte_views_cover_whole_buffers() {
        let mesh = triangle();
        assert_eq!(mesh.position_bytes().len(), 3 * 16);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
        assert!(mesh.color_bytes().is_empty());
    }
}
