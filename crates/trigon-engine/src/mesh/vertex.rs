use bytemuck::{Pod, Zeroable};

use crate::coords::{Colour, Vec3};

use super::InputLayout;

/// Position + colour vertex, the only vertex format meshes accept.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 4],
}

impl Vertex {
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

    #[inline]
    pub const fn new(position: Vec3, colour: Colour) -> Self {
        Self {
            position: position.to_array(),
            colour: colour.to_array(),
        }
    }

    /// `POSITION` (location 0) followed by `COLOUR` (location 1).
    pub fn input_layout() -> InputLayout {
        InputLayout::append_aligned(&[
            ("POSITION", wgpu::VertexFormat::Float32x3),
            ("COLOUR", wgpu::VertexFormat::Float32x4),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stride_matches_struct_size() {
        assert_eq!(Vertex::input_layout().stride(), Vertex::STRIDE);
        assert_eq!(Vertex::STRIDE, 28);
    }

    #[test]
    fn bytes_are_position_then_colour() {
        let v = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Colour::new(0.1, 0.2, 0.3, 0.4));
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 0.4]);
    }
}
