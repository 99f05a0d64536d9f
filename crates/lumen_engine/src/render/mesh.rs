//! Vertex data and geometry containers
//!
//! Geometry is stored as non-indexed, interleaved vertices ready for a
//! `draw_arrays` call. The standard scene vertex is 8 floats:
//! position (3), texture coordinate (2), normal (3).

use bytemuck::{Pod, Zeroable};

/// Interleaved scene vertex
///
/// `#[repr(C)]` keeps the field order identical to the float layout the
/// shading programs read, so a `&[Vertex]` can be reinterpreted as `&[f32]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
    /// Surface normal
    pub normal: [f32; 3],
}

impl Vertex {
    /// Number of floats per vertex
    pub const FLOATS: usize = 8;

    /// Create a new vertex
    pub fn new(position: [f32; 3], tex_coord: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }
}

/// One named attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute name as declared in the shading program
    pub name: &'static str,
    /// Number of float components
    pub components: u32,
    /// Offset from the start of the vertex, in floats
    pub offset: u32,
}

/// Description of an interleaved float vertex format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Floats per vertex
    pub stride: u32,
    /// Attributes in declaration order
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Position, texture coordinate and normal (the [`Vertex`] layout)
    pub const POSITION_TEX_NORMAL: Self = Self {
        stride: 8,
        attributes: &[
            VertexAttribute { name: "a_position", components: 3, offset: 0 },
            VertexAttribute { name: "a_texCoords", components: 2, offset: 3 },
            VertexAttribute { name: "a_normal", components: 3, offset: 5 },
        ],
    };

    /// Position and texture coordinate, used by full-screen quads
    pub const POSITION_TEX: Self = Self {
        stride: 5,
        attributes: &[
            VertexAttribute { name: "a_position", components: 3, offset: 0 },
            VertexAttribute { name: "a_texCoords", components: 2, offset: 3 },
        ],
    };

    /// Number of whole vertices in a float buffer of this layout
    pub fn vertex_count(&self, floats: usize) -> usize {
        floats / self.stride as usize
    }
}

/// Triangle list geometry loaded from a model file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex>,
}

impl Geometry {
    /// Wrap a triangle list
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Vertices in draw order
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The interleaved float buffer, 8 floats per vertex
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the geometry has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Full-screen quad drawn as a 4-vertex triangle strip
#[rustfmt::skip]
pub const FULLSCREEN_QUAD: [f32; 20] = [
    // x, y, z,          u, v
    -1.0,  1.0, 0.0,     0.0, 1.0,
    -1.0, -1.0, 0.0,     0.0, 0.0,
     1.0,  1.0, 0.0,     1.0, 1.0,
     1.0, -1.0, 0.0,     1.0, 0.0,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_eight_packed_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), Vertex::FLOATS * std::mem::size_of::<f32>());
        assert_eq!(VertexLayout::POSITION_TEX_NORMAL.stride as usize, Vertex::FLOATS);
    }

    #[test]
    fn test_geometry_flattens_in_field_order() {
        let geometry = Geometry::new(vec![
            Vertex::new([1.0, 2.0, 3.0], [0.25, 0.75], [0.0, 1.0, 0.0]),
            Vertex::new([4.0, 5.0, 6.0], [0.5, 0.5], [0.0, 0.0, 1.0]),
        ]);

        let floats = geometry.as_floats();
        assert_eq!(floats.len(), 16);
        assert_eq!(&floats[..8], &[1.0, 2.0, 3.0, 0.25, 0.75, 0.0, 1.0, 0.0]);
        assert_eq!(geometry.vertex_count(), 2);
    }

    #[test]
    fn test_layout_vertex_count() {
        assert_eq!(VertexLayout::POSITION_TEX.vertex_count(FULLSCREEN_QUAD.len()), 4);
        assert_eq!(VertexLayout::POSITION_TEX_NORMAL.vertex_count(17), 2);
    }
}
