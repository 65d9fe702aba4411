//! Shader compilation.
//!
//! Sources are WGSL. Each stage is parsed and validated with naga before a wgpu
//! module is created, so compiler errors surface as [`ShaderError`] values instead
//! of device errors at pipeline creation.

mod compile;
mod error;

pub use compile::{compile_shader, load_shader, validate_wgsl, CompiledShader, ShaderStage};
pub use error::ShaderError;
