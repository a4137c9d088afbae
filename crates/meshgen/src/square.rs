use glam::{Vec3, Vec4};

use crate::mesh::MeshBuffers;
use crate::shape::MeshSource;

/// 2×2 quad in the XY plane through `center`, facing +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Square {
    pub center: Vec3,
}

impl Square {
    pub fn new(center: Vec3) -> Self {
        Self { center }
    }
}

impl MeshSource for Square {
    fn generate(&self) -> MeshBuffers {
        let positions = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .into_iter()
            .map(|(x, y)| (self.center + Vec3::new(x, y, 0.0)).extend(1.0))
            .collect();

        MeshBuffers {
            positions,
            normals: vec![Vec4::Z; 4],
            colors: Vec::new(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_is_one_quad() {
        let mesh = Square::new(Vec3::new(0.0, 0.0, 2.0)).generate();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(!mesh.has_colors());
        assert!(mesh.positions.iter().all(|p| p.z == 2.0 && p.w == 1.0));
        assert!(mesh.normals.iter().all(|&n| n == Vec4::new(0.0, 0.0, 1.0, 0.0)));
    }
}
