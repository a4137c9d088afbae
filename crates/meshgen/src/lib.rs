//! meshgen: procedural triangle meshes as parallel vertex attribute buffers.
//!
//! - Every shape produces a [`MeshBuffers`]: positions (vec4, w = 1), normals
//!   (vec4, w = 0), optional colors (vec4 RGBA) and `u32` triangle-list indices.
//! - Shapes form a closed set ([`Shape`]) and are pure functions of their
//!   construction parameters. Generating twice yields identical buffers.
//! - Nothing in this crate touches the GPU; uploading is the caller's job.
//!
//! Supported shapes:
//!   Icosphere : recursive midpoint subdivision of an icosahedron, levels 0..=8
//!   Cube      : 24 vertices (4 per face), flat normals, one tint per face
//!   Square    : single quad in the XY plane facing +Z

pub mod cube;
pub mod icosphere;
pub mod mesh;
pub mod shape;
pub mod square;

pub use cube::Cube;
pub use icosphere::{Icosphere, MAX_SUBDIVISIONS};
pub use mesh::{edge_key, EdgeKey, MeshBuffers, MeshError};
pub use shape::{MeshSource, Shape};
pub use square::Square;
