use std::fmt;

use crate::command::CommandList;
use crate::device::{padded_size, Gpu, ResourceState, UploadError};

use super::{InputLayout, Vertex};

/// Binding description of a vertex buffer: which buffer, bytes per vertex, total size.
#[derive(Debug, Clone)]
pub struct VertexBufferView {
    buffer: wgpu::Buffer,
    stride: u64,
    size_in_bytes: u64,
}

impl VertexBufferView {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }
}

/// Rejected mesh construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Zero vertices.
    Empty,
    /// The stride does not match the input layout.
    StrideMismatch { expected: u64, actual: u64 },
    /// `vertex_data` is not exactly `stride * vertex_count` bytes.
    SizeMismatch { expected: u64, actual: u64 },
    Upload(UploadError),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::Empty => write!(f, "mesh has no vertices"),
            MeshError::StrideMismatch { expected, actual } => write!(
                f,
                "vertex stride {actual} does not match the input layout stride {expected}"
            ),
            MeshError::SizeMismatch { expected, actual } => write!(
                f,
                "vertex data is {actual} bytes, expected stride * count = {expected}"
            ),
            MeshError::Upload(err) => write!(f, "vertex upload failed: {err}"),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::Upload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UploadError> for MeshError {
    fn from(err: UploadError) -> Self {
        MeshError::Upload(err)
    }
}

/// Checks `vertex_data` against the layout before anything is allocated.
pub(crate) fn validate_vertex_data(
    layout: &InputLayout,
    vertex_data: &[u8],
    stride: u64,
    vertex_count: u32,
) -> Result<(), MeshError> {
    if vertex_count == 0 {
        return Err(MeshError::Empty);
    }
    if stride != layout.stride() {
        return Err(MeshError::StrideMismatch {
            expected: layout.stride(),
            actual: stride,
        });
    }
    let expected = stride * vertex_count as u64;
    if vertex_data.len() as u64 != expected {
        return Err(MeshError::SizeMismatch {
            expected,
            actual: vertex_data.len() as u64,
        });
    }
    Ok(())
}

/// One GPU-resident vertex buffer plus the layout needed to bind it.
///
/// Built once; the contents never change after the upload.
pub struct Mesh {
    view: VertexBufferView,
    layout: InputLayout,
    vertex_count: u32,
}

impl Mesh {
    /// Allocates a vertex buffer and stages `vertex_data` into it.
    ///
    /// `vertex_data` must hold exactly `vertex_count` vertices of `stride` bytes laid
    /// out as [`Vertex`]. The upload completes on the GPU before the next frame's
    /// commands execute.
    pub fn new(
        gpu: &mut Gpu<'_>,
        vertex_data: &[u8],
        stride: u64,
        vertex_count: u32,
    ) -> Result<Self, MeshError> {
        let layout = Vertex::input_layout();
        validate_vertex_data(&layout, vertex_data, stride, vertex_count)?;

        let size_in_bytes = vertex_data.len() as u64;
        let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("trigon mesh vbo"),
            size: padded_size(size_in_bytes),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        gpu.upload_resource(&buffer, vertex_data, ResourceState::VertexAndConstantBuffer)?;
        log::debug!("mesh: {vertex_count} vertices, {size_in_bytes} bytes");

        Ok(Self {
            view: VertexBufferView {
                buffer,
                stride,
                size_in_bytes,
            },
            layout,
            vertex_count,
        })
    }

    /// Typed convenience over [`Mesh::new`].
    pub fn from_vertices(gpu: &mut Gpu<'_>, vertices: &[Vertex]) -> Result<Self, MeshError> {
        // An oversized slice saturates the count and fails the size check.
        let count = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
        Self::new(gpu, bytemuck::cast_slice(vertices), Vertex::STRIDE, count)
    }

    pub fn view(&self) -> &VertexBufferView {
        &self.view
    }

    pub fn input_layout(&self) -> &InputLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Primitive topology pipelines drawing this mesh must use.
    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        wgpu::PrimitiveTopology::TriangleList
    }

    /// Binds the vertex buffer at slot 0 and draws every vertex, one instance.
    pub fn draw(&self, cmd: &mut dyn CommandList) {
        cmd.bind_vertex_buffer(0, &self.view);
        cmd.draw_instanced(0..self.vertex_count, 0..1);
    }
}
