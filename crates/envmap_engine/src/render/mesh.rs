//! Mesh representation
//!
//! Backend-agnostic geometry: interleaved vertices plus a triangle index list.
//! `Vertex` is `Pod` so backends can upload it with `bytemuck::cast_slice`.

use bytemuck::{Pod, Zeroable};

/// Interleaved vertex: position, normal, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],

    /// Unit normal
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Size of the vertex buffer in bytes
    pub fn vertex_bytes(&self) -> usize {
        bytemuck::cast_slice::<Vertex, u8>(&self.vertices).len()
    }

    /// Whether every index refers to an existing vertex and the list is made
    /// of whole triangles
    pub fn is_valid(&self) -> bool {
        let count = self.vertices.len();
        self.indices.len() % 3 == 0 && self.indices.iter().all(|&i| (i as usize) < count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1, 2]);
        assert_eq!(mesh.vertex_bytes(), 96);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_invalid() {
        let mesh = Mesh::new(vec![Vertex::default(); 2], vec![0, 1, 2]);
        assert!(!mesh.is_valid());
    }
}
