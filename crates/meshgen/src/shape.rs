use crate::{Cube, Icosphere, MeshBuffers, Square};

/// Anything that can produce a triangle mesh from its own parameters.
pub trait MeshSource {
    /// Builds fresh attribute buffers. Calling this twice yields equal meshes.
    fn generate(&self) -> MeshBuffers;
}

/// Closed set of the shapes this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Icosphere(Icosphere),
    Cube(Cube),
    Square(Square),
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Icosphere(_) => "icosphere",
            Shape::Cube(_) => "cube",
            Shape::Square(_) => "square",
        }
    }
}

impl MeshSource for Shape {
    fn generate(&self) -> MeshBuffers {
        match self {
            Shape::Icosphere(s) => s.generate(),
            Shape::Cube(s) => s.generate(),
            Shape::Square(s) => s.generate(),
        }
    }
}

impl From<Icosphere> for Shape {
    fn from(s: Icosphere) -> Self {
        Shape::Icosphere(s)
    }
}

impl From<Cube> for Shape {
    fn from(s: Cube) -> Self {
        Shape::Cube(s)
    }
}

impl From<Square> for Shape {
    fn from(s: Square) -> Self {
        Shape::Square(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn shape_delegates_to_variant() {
        let sphere = Icosphere::new(Vec3::ZERO, 1.0, 2);
        let shape = Shape::from(sphere);
        assert_eq!(shape.name(), "icosphere");
        assert_eq!(shape.generate(), sphere.generate());
    }

    #[test]
    fn every_variant_produces_a_valid_mesh() {
        let shapes: [Shape; 3] = [
            Icosphere::new(Vec3::ZERO, 1.0, 1).into(),
            Cube::new(Vec3::ZERO).into(),
            Square::new(Vec3::ZERO).into(),
        ];
        for shape in shapes {
            assert_eq!(shape.generate().validate(), Ok(()), "{}", shape.name());
        }
    }
}
