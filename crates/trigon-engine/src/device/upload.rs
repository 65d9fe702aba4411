//! Staging-upload helpers.

/// Logical state a buffer is left in after an upload.
///
/// wgpu inserts the actual barriers itself; the state is checked against the
/// buffer's usage so that an upload never targets a buffer the later binding
/// cannot read.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceState {
    /// Bound as vertex input or uniform data.
    VertexAndConstantBuffer,
    /// Bound as index input.
    IndexBuffer,
    /// Read by shaders as storage.
    ShaderResource,
    /// Source of a later copy (read-back).
    CopySource,
}

impl ResourceState {
    /// Usages any one of which lets a buffer be used in this state.
    pub fn accepted_usages(self) -> wgpu::BufferUsages {
        match self {
            ResourceState::VertexAndConstantBuffer => {
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::UNIFORM
            }
            ResourceState::IndexBuffer => wgpu::BufferUsages::INDEX,
            ResourceState::ShaderResource => wgpu::BufferUsages::STORAGE,
            ResourceState::CopySource => wgpu::BufferUsages::COPY_SRC,
        }
    }

    pub fn accepts(self, usage: wgpu::BufferUsages) -> bool {
        usage.intersects(self.accepted_usages())
    }
}

/// Rounds `size` up to the buffer copy alignment.
#[inline]
pub const fn padded_size(size: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    (size + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_size_rounds_up_to_copy_alignment() {
        assert_eq!(padded_size(0), 0);
        assert_eq!(padded_size(1), 4);
        assert_eq!(padded_size(4), 4);
        assert_eq!(padded_size(84), 84);
        assert_eq!(padded_size(85), 88);
    }

    #[test]
    fn vertex_state_accepts_vertex_or_uniform_buffers() {
        let state = ResourceState::VertexAndConstantBuffer;
        assert!(state.accepts(wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST));
        assert!(state.accepts(wgpu::BufferUsages::UNIFORM));
        assert!(!state.accepts(wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST));
    }

    #[test]
    fn copy_source_requires_copy_src() {
        assert!(ResourceState::CopySource.accepts(wgpu::BufferUsages::COPY_SRC));
        assert!(!ResourceState::CopySource.accepts(wgpu::BufferUsages::COPY_DST));
    }
}
