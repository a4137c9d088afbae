use glam::{Vec3, Vec4};

use crate::mesh::MeshBuffers;
use crate::shape::MeshSource;

/// Outward normal, in-plane `u` and `v` axes for each face. `u × v == normal`
/// keeps every face counter-clockwise from outside.
#[rustfmt::skip]
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([ 1.0,  0.0,  0.0], [ 0.0,  0.0, -1.0], [0.0, 1.0,  0.0]), // +X
    ([-1.0,  0.0,  0.0], [ 0.0,  0.0,  1.0], [0.0, 1.0,  0.0]), // -X
    ([ 0.0,  1.0,  0.0], [ 1.0,  0.0,  0.0], [0.0, 0.0, -1.0]), // +Y
    ([ 0.0, -1.0,  0.0], [ 1.0,  0.0,  0.0], [0.0, 0.0,  1.0]), // -Y
    ([ 0.0,  0.0,  1.0], [ 1.0,  0.0,  0.0], [0.0, 1.0,  0.0]), // +Z
    ([ 0.0,  0.0, -1.0], [-1.0,  0.0,  0.0], [0.0, 1.0,  0.0]), // -Z
];

#[rustfmt::skip]
const FACE_TINTS: [[f32; 4]; 6] = [
    [1.0, 0.85, 0.85, 1.0],
    [0.85, 1.0, 0.85, 1.0],
    [0.85, 0.85, 1.0, 1.0],
    [1.0, 1.0, 0.85, 1.0],
    [1.0, 0.85, 1.0, 1.0],
    [0.85, 1.0, 1.0, 1.0],
];

/// Axis-aligned cube. Faces do not share vertices, so every face keeps its
/// own flat normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    pub center: Vec3,
    /// Edge length.
    pub size: f32,
}

impl Cube {
    /// Unit cube around `center`.
    pub fn new(center: Vec3) -> Self {
        Self::with_size(center, 1.0)
    }

    pub fn with_size(center: Vec3, size: f32) -> Self {
        Self { center, size }
    }
}

impl MeshSource for Cube {
    fn generate(&self) -> MeshBuffers {
        let half = self.size * 0.5;
        let mut mesh = MeshBuffers {
            positions: Vec::with_capacity(24),
            normals: Vec::with_capacity(24),
            colors: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (face, &(n, u, v)) in FACES.iter().enumerate() {
            let (n, u, v) = (Vec3::from(n), Vec3::from(u), Vec3::from(v));
            let base = mesh.positions.len() as u32;

            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = self.center + (n + u * su + v * sv) * half;
                mesh.positions.push(p.extend(1.0));
                mesh.normals.push(n.extend(0.0));
                mesh.colors.push(Vec4::from(FACE_TINTS[face]));
            }

            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cube_counts() {
        let mesh = Cube::new(Vec3::ZERO).generate();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.colors.len(), 24);
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn unit_cube_spans_half_extent() {
        let center = Vec3::new(2.0, 0.0, -1.0);
        let mesh = Cube::new(center).generate();
        for p in &mesh.positions {
            let d = (p.truncate() - center).abs();
            assert_abs_diff_eq!(d.max_element(), 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(d.x, 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(d.y, 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(d.z, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn face_normals_are_flat_and_outward() {
        let mesh = Cube::with_size(Vec3::ZERO, 2.0).generate();
        for [a, b, c] in mesh.triangles() {
            let pa = mesh.positions[a as usize].truncate();
            let pb = mesh.positions[b as usize].truncate();
            let pc = mesh.positions[c as usize].truncate();
            let n = mesh.normals[a as usize];

            assert_eq!(n, mesh.normals[b as usize]);
            assert_eq!(n, mesh.normals[c as usize]);

            let winding = (pb - pa).cross(pc - pa).normalize();
            assert_abs_diff_eq!(winding.dot(n.truncate()), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn faces_do_not_share_vertices() {
        let mesh = Cube::new(Vec3::ZERO).generate();
        let counts = mesh.edge_use_counts();
        // Each face is its own island: two triangles sharing one diagonal.
        assert_eq!(counts.values().filter(|&&n| n == 2).count(), 6);
        assert_eq!(counts.values().filter(|&&n| n == 1).count(), 24);
    }
}
