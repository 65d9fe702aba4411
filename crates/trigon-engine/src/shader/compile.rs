use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use wgpu::naga;

use super::ShaderError;

/// Capability set every shader is validated against.
///
/// Fixed and minimal so that shaders that pass here run on any adapter.
const SHADER_CAPABILITIES: naga::valid::Capabilities = naga::valid::Capabilities::empty();

/// Programmable stage a shader is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Entry point function the stage is compiled from.
    pub const fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VS",
            ShaderStage::Pixel => "PS",
        }
    }

    /// WGSL attribute marking the entry point.
    pub const fn attribute(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "fragment",
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Pixel => f.write_str("pixel"),
        }
    }
}

/// A compiled shader stage, ready to be combined into a pipeline state.
#[derive(Debug)]
pub struct CompiledShader {
    module: wgpu::ShaderModule,
    stage: ShaderStage,
}

impl CompiledShader {
    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn entry_point(&self) -> &'static str {
        self.stage.entry_point()
    }
}

/// Parses and validates WGSL `source` for `stage` without touching the GPU.
pub fn validate_wgsl(source: &str, stage: ShaderStage) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Parse {
        stage,
        diagnostic: err.emit_to_string(source),
    })?;

    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), SHADER_CAPABILITIES)
        .validate(&module)
        .map_err(|err| ShaderError::Validation {
            stage,
            diagnostic: err.to_string(),
        })?;

    let entry_point = stage.entry_point();
    let found = module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == stage.naga_stage());
    if !found {
        return Err(ShaderError::MissingEntryPoint { stage, entry_point });
    }

    Ok(module)
}

/// Compiles WGSL `source` into a shader module for `stage`.
///
/// Compiler diagnostics are logged and returned; a failed stage never yields a module.
pub fn compile_shader(
    device: &wgpu::Device,
    source: &str,
    stage: ShaderStage,
    label: &str,
) -> Result<CompiledShader, ShaderError> {
    if let Err(err) = validate_wgsl(source, stage) {
        log::error!("{label}: {err}");
        return Err(err);
    }

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    log::debug!("compiled {stage} shader `{label}`");

    Ok(CompiledShader { module, stage })
}

/// Reads a WGSL file and compiles it for `stage`.
pub fn load_shader(device: &wgpu::Device, path: &Path, stage: ShaderStage) -> Result<CompiledShader> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader at {}", path.display()))?;
    let label = path.display().to_string();
    compile_shader(device, &source, stage, &label)
        .with_context(|| format!("failed to compile {}", path.display()))
}
