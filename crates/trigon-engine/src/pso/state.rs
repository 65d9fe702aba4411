use crate::mesh::InputLayout;
use crate::shader::CompiledShader;

/// One registered pipeline configuration.
///
/// Topology and render target format are fixed when the pipeline is built.
#[derive(Debug)]
pub struct PipelineState {
    name: String,
    pipeline: wgpu::RenderPipeline,
    topology: wgpu::PrimitiveTopology,
    layout: InputLayout,
    vertex: CompiledShader,
    pixel: CompiledShader,
}

impl PipelineState {
    pub(super) fn new(
        name: String,
        pipeline: wgpu::RenderPipeline,
        topology: wgpu::PrimitiveTopology,
        layout: InputLayout,
        vertex: CompiledShader,
        pixel: CompiledShader,
    ) -> Self {
        Self {
            name,
            pipeline,
            topology,
            layout,
            vertex,
            pixel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        self.topology
    }

    pub fn input_layout(&self) -> &InputLayout {
        &self.layout
    }

    pub fn vertex_shader(&self) -> &CompiledShader {
        &self.vertex
    }

    pub fn pixel_shader(&self) -> &CompiledShader {
        &self.pixel
    }
}
