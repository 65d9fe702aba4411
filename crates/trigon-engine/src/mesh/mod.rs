//! Vertex data and GPU-resident meshes.

mod buffer;
mod layout;
mod vertex;

pub use buffer::{Mesh, MeshError, VertexBufferView};
pub use layout::{InputElement, InputLayout};
pub use vertex::Vertex;
