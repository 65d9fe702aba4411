//! Drawables: a mesh paired with the pipeline state it is drawn with.

mod triangle;

pub use triangle::{
    Triangle, PIXEL_SHADER_FILE, TRIANGLE_CLEAR, TRIANGLE_PSO, TRIANGLE_VERTICES,
    VERTEX_SHADER_FILE,
};
