//! Icosphere generation by recursive midpoint subdivision.
//!
//! Level 0 is the regular icosahedron (12 vertices, 20 faces). Each pass splits
//! every triangle into four, pushing the three edge midpoints back onto the
//! sphere. Midpoints are shared between the two faces of an edge through a
//! per-pass edge cache, so the mesh stays closed and the vertex count follows
//! `10·4^L + 2` exactly.

use std::collections::HashMap;

use glam::Vec3;

use crate::mesh::{edge_key, EdgeKey, MeshBuffers};
use crate::shape::MeshSource;

/// Highest subdivision level accepted. Level 8 already yields 655 362 vertices.
pub const MAX_SUBDIVISIONS: u32 = 8;

/// Golden ratio, used for the icosahedron corner coordinates.
const PHI: f32 = 1.618_034;

#[rustfmt::skip]
const BASE_CORNERS: [[f32; 3]; 12] = [
    [-1.0,  PHI,  0.0], [ 1.0,  PHI,  0.0], [-1.0, -PHI,  0.0], [ 1.0, -PHI,  0.0],
    [ 0.0, -1.0,  PHI], [ 0.0,  1.0,  PHI], [ 0.0, -1.0, -PHI], [ 0.0,  1.0, -PHI],
    [ PHI,  0.0, -1.0], [ PHI,  0.0,  1.0], [-PHI,  0.0, -1.0], [-PHI,  0.0,  1.0],
];

// Counter-clockwise when seen from outside.
#[rustfmt::skip]
const BASE_FACES: [[u32; 3]; 20] = [
    [0, 11, 5], [0, 5, 1],  [0, 1, 7],   [0, 7, 10], [0, 10, 11],
    [1, 5, 9],  [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4],  [3, 4, 2],  [3, 2, 6],   [3, 6, 8],  [3, 8, 9],
    [4, 9, 5],  [2, 4, 11], [6, 2, 10],  [8, 6, 7],  [9, 8, 1],
];

/// Sphere approximated by a subdivided icosahedron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Icosphere {
    pub center: Vec3,
    pub radius: f32,
    subdivisions: u32,
}

impl Icosphere {
    /// Creates an icosphere description. `subdivisions` is clamped to
    /// `0..=MAX_SUBDIVISIONS`.
    pub fn new(center: Vec3, radius: f32, subdivisions: u32) -> Self {
        if subdivisions > MAX_SUBDIVISIONS {
            log::warn!(
                "icosphere subdivision level {} clamped to {}",
                subdivisions,
                MAX_SUBDIVISIONS
            );
        }

        Self {
            center,
            radius,
            subdivisions: subdivisions.min(MAX_SUBDIVISIONS),
        }
    }

    #[inline]
    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Vertex count produced at `level`: `10·4^L + 2`.
    pub fn expected_vertex_count(level: u32) -> usize {
        10 * 4usize.pow(level) + 2
    }

    /// Face count produced at `level`: `20·4^L`.
    pub fn expected_face_count(level: u32) -> usize {
        20 * 4usize.pow(level)
    }

    /// Unit directions and faces of the base icosahedron.
    pub fn base() -> (Vec<Vec3>, Vec<[u32; 3]>) {
        let directions = BASE_CORNERS
            .iter()
            .map(|&c| Vec3::from_array(c).normalize())
            .collect();
        (directions, BASE_FACES.to_vec())
    }

    /// Unit directions and faces after all subdivision passes.
    pub fn unit_topology(&self) -> (Vec<Vec3>, Vec<[u32; 3]>) {
        let (mut directions, mut faces) = Self::base();
        let vertex_total = Self::expected_vertex_count(self.subdivisions);
        directions.reserve(vertex_total - directions.len());

        for _ in 0..self.subdivisions {
            faces = subdivide(&mut directions, &faces);
        }
        (directions, faces)
    }
}

impl MeshSource for Icosphere {
    fn generate(&self) -> MeshBuffers {
        let (directions, faces) = self.unit_topology();

        let positions = directions
            .iter()
            .map(|&d| (self.center + d * self.radius).extend(1.0))
            .collect();
        let normals = directions.iter().map(|&d| d.extend(0.0)).collect();
        let indices = faces.iter().flatten().copied().collect();

        MeshBuffers {
            positions,
            normals,
            colors: Vec::new(),
            indices,
        }
    }
}

/// Runs one subdivision pass on unit-sphere `directions`.
///
/// Every face `(a, b, c)` becomes four faces built from its corners and the
/// midpoints `ab`, `bc`, `ca`. New midpoints are appended to `directions`; a
/// midpoint is created once per undirected edge, the second face of that edge
/// reuses it. Winding is preserved.
pub fn subdivide(directions: &mut Vec<Vec3>, faces: &[[u32; 3]]) -> Vec<[u32; 3]> {
    // Edge keys index into this pass's vertex list only.
    let mut midpoints: HashMap<EdgeKey, u32> = HashMap::with_capacity(faces.len() * 3 / 2);
    let mut out = Vec::with_capacity(faces.len() * 4);

    for &[a, b, c] in faces {
        let ab = midpoint(directions, &mut midpoints, a, b);
        let bc = midpoint(directions, &mut midpoints, b, c);
        let ca = midpoint(directions, &mut midpoints, c, a);

        out.push([a, ab, ca]);
        out.push([b, bc, ab]);
        out.push([c, ca, bc]);
        out.push([ab, bc, ca]);
    }
    out
}

fn midpoint(
    directions: &mut Vec<Vec3>,
    cache: &mut HashMap<EdgeKey, u32>,
    a: u32,
    b: u32,
) -> u32 {
    *cache.entry(edge_key(a, b)).or_insert_with(|| {
        let mid = (directions[a as usize] + directions[b as usize]).normalize();
        directions.push(mid);
        (directions.len() - 1) as u32
    })
}
