/// One attribute of an input layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InputElement {
    /// Semantic name, for diagnostics (`POSITION`, `COLOUR`, ...).
    pub semantic: &'static str,
    pub format: wgpu::VertexFormat,
    /// Byte offset inside one vertex.
    pub offset: u64,
    /// Shader input location.
    pub location: u32,
}

/// Description of how raw vertex bytes map to shader inputs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InputLayout {
    elements: Vec<InputElement>,
    stride: u64,
}

impl InputLayout {
    /// Builds a per-vertex layout whose elements follow each other with no gaps.
    ///
    /// Locations are assigned in order starting at 0.
    pub fn append_aligned(elements: &[(&'static str, wgpu::VertexFormat)]) -> Self {
        let mut offset = 0;
        let elements = elements
            .iter()
            .zip(0u32..)
            .map(|(&(semantic, format), location)| {
                let element = InputElement {
                    semantic,
                    format,
                    offset,
                    location,
                };
                offset += format.size();
                element
            })
            .collect();

        Self {
            elements,
            stride: offset,
        }
    }

    pub fn elements(&self) -> &[InputElement] {
        &self.elements
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// wgpu attribute descriptions, one per element.
    pub fn attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.elements
            .iter()
            .map(|e| wgpu::VertexAttribute {
                format: e.format,
                offset: e.offset,
                shader_location: e.location,
            })
            .collect()
    }

    /// Buffer layout over `attributes`, which must come from [`Self::attributes`].
    pub fn buffer_layout<'a>(
        &self,
        attributes: &'a [wgpu::VertexAttribute],
    ) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_previous_element() {
        let layout = InputLayout::append_aligned(&[
            ("POSITION", wgpu::VertexFormat::Float32x3),
            ("COLOUR", wgpu::VertexFormat::Float32x4),
        ]);

        let e = layout.elements();
        assert_eq!((e[0].offset, e[0].location), (0, 0));
        assert_eq!((e[1].offset, e[1].location), (12, 1));
        assert_eq!(layout.stride(), 28);
    }

    #[test]
    fn attributes_mirror_elements() {
        let layout = InputLayout::append_aligned(&[
            ("UV", wgpu::VertexFormat::Float32x2),
            ("TINT", wgpu::VertexFormat::Unorm8x4),
        ]);
        let attrs = layout.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].offset, 8);
        assert_eq!(attrs[1].shader_location, 1);

        let buffer = layout.buffer_layout(&attrs);
        assert_eq!(buffer.array_stride, 12);
        assert_eq!(buffer.step_mode, wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        let layout = InputLayout::append_aligned(&[]);
        assert!(layout.elements().is_empty());
        assert_eq!(layout.stride(), 0);
    }
}
