use crate::command::CommandList;
use crate::device::Gpu;
use crate::mesh::InputLayout;
use crate::shader::{CompiledShader, ShaderStage};

use super::registry::{DuplicatePolicy, StateRegistry};
use super::{PipelineState, PsoError};

/// Named pipeline states, created at load time and bound by name before draws.
#[derive(Debug, Default)]
pub struct PsoManager {
    states: StateRegistry<PipelineState>,
}

impl PsoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            states: StateRegistry::new(policy),
        }
    }

    /// Builds a render pipeline from two compiled stages and registers it as `name`.
    ///
    /// The pipeline targets the context's render target format. Validation
    /// failures from the device come back as [`PsoError::Pipeline`] and leave
    /// any state already registered under `name` in place.
    pub fn create_pso(
        &mut self,
        gpu: &Gpu<'_>,
        name: &str,
        vs: CompiledShader,
        ps: CompiledShader,
        layout: &InputLayout,
        topology: wgpu::PrimitiveTopology,
    ) -> Result<&PipelineState, PsoError> {
        check_stage(name, &vs, ShaderStage::Vertex)?;
        check_stage(name, &ps, ShaderStage::Pixel)?;
        self.states.check_insert(name)?;

        let device = gpu.device();
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(name),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let attributes = layout.attributes();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(name),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: vs.module(),
                entry_point: Some(vs.entry_point()),
                compilation_options: Default::default(),
                buffers: &[layout.buffer_layout(&attributes)],
            },
            fragment: Some(wgpu::FragmentState {
                module: ps.module(),
                entry_point: Some(ps.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            let diagnostic = err.to_string();
            log::error!("pipeline state `{name}` failed validation: {diagnostic}");
            return Err(PsoError::Pipeline {
                name: name.to_owned(),
                diagnostic,
            });
        }

        let state = PipelineState::new(name.to_owned(), pipeline, topology, layout.clone(), vs, ps);
        if self.states.insert(name, state)?.is_some() {
            log::debug!("pipeline state `{name}` replaced");
        } else {
            log::debug!("pipeline state `{name}` created");
        }
        self.states.get(name)
    }

    /// Records `name` as the active pipeline state on `cmd`.
    pub fn bind(&self, cmd: &mut dyn CommandList, name: &str) -> Result<(), PsoError> {
        let state = self.states.get(name)?;
        cmd.set_pipeline_state(state);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&PipelineState, PsoError> {
        self.states.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn check_stage(name: &str, shader: &CompiledShader, expected: ShaderStage) -> Result<(), PsoError> {
    if shader.stage() == expected {
        Ok(())
    } else {
        Err(PsoError::StageMismatch {
            name: name.to_owned(),
            expected,
            found: shader.stage(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandRecorder, RecordedCommand};
    use crate::device::testing::headless_gpu;
    use crate::mesh::Vertex;
    use crate::shader::compile_shader;

    const VS_RED: &str = r#"
@vertex
fn VS(@location(0) position: vec3<f32>, @location(1) colour: vec4<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

    const PS_RED: &str = r#"
@fragment
fn PS() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

    // Reads a varying the vertex stage never writes.
    const PS_UNLINKED: &str = r#"
@fragment
fn PS(@location(1) colour: vec4<f32>) -> @location(0) vec4<f32> {
    return colour;
}
"#;

    const VS_POSITION_ONLY: &str = r#"
@vertex
fn VS(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

    fn unlinked_stages(gpu: &Gpu<'_>) -> (CompiledShader, CompiledShader) {
        let vs = compile_shader(gpu.device(), VS_POSITION_ONLY, ShaderStage::Vertex, "vs").unwrap();
        let ps = compile_shader(gpu.device(), PS_UNLINKED, ShaderStage::Pixel, "ps").unwrap();
        (vs, ps)
    }

    fn stages(gpu: &Gpu<'_>) -> (CompiledShader, CompiledShader) {
        let vs = compile_shader(gpu.device(), VS_RED, ShaderStage::Vertex, "vs").unwrap();
        let ps = compile_shader(gpu.device(), PS_RED, ShaderStage::Pixel, "ps").unwrap();
        (vs, ps)
    }

    #[test]
    fn bind_records_named_state() {
        let Some(gpu) = headless_gpu() else { return };
        let mut psos = PsoManager::new();
        let (vs, ps) = stages(&gpu);
        psos.create_pso(&gpu, "Red", vs, ps, &Vertex::input_layout(), wgpu::PrimitiveTopology::TriangleList)
            .unwrap();

        let state = psos.get("Red").unwrap();
        assert_eq!(state.input_layout().stride(), Vertex::STRIDE);
        assert_eq!(state.vertex_shader().entry_point(), "VS");
        assert_eq!(state.pixel_shader().entry_point(), "PS");

        let mut recorder = CommandRecorder::new();
        psos.bind(&mut recorder, "Red").unwrap();
        assert_eq!(
            recorder.commands(),
            [RecordedCommand::SetPipelineState {
                name: "Red".into(),
                topology: wgpu::PrimitiveTopology::TriangleList,
            }]
        );
    }

    #[test]
    fn binding_unknown_name_records_nothing() {
        let psos = PsoManager::new();
        let mut recorder = CommandRecorder::new();

        assert_eq!(
            psos.bind(&mut recorder, "Triangle"),
            Err(PsoError::Missing("Triangle".into()))
        );
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn re_registering_activates_latest_state() {
        let Some(gpu) = headless_gpu() else { return };
        let mut psos = PsoManager::new();
        let layout = Vertex::input_layout();

        let (vs, ps) = stages(&gpu);
        psos.create_pso(&gpu, "Shape", vs, ps, &layout, wgpu::PrimitiveTopology::TriangleList)
            .unwrap();
        let (vs, ps) = stages(&gpu);
        psos.create_pso(&gpu, "Shape", vs, ps, &layout, wgpu::PrimitiveTopology::LineList)
            .unwrap();
        assert_eq!(psos.len(), 1);

        let mut recorder = CommandRecorder::new();
        psos.bind(&mut recorder, "Shape").unwrap();
        recorder.draw_instanced(0..2, 0..1);
        let draw = recorder.draw_calls().next().unwrap();
        assert_eq!(draw.topology, Some(wgpu::PrimitiveTopology::LineList));
    }

    #[test]
    fn reject_policy_keeps_first_state() {
        let Some(gpu) = headless_gpu() else { return };
        let mut psos = PsoManager::with_policy(DuplicatePolicy::Reject);
        let layout = Vertex::input_layout();

        let (vs, ps) = stages(&gpu);
        psos.create_pso(&gpu, "Shape", vs, ps, &layout, wgpu::PrimitiveTopology::TriangleList)
            .unwrap();
        let (vs, ps) = stages(&gpu);
        let err = psos
            .create_pso(&gpu, "Shape", vs, ps, &layout, wgpu::PrimitiveTopology::LineList)
            .unwrap_err();

        assert_eq!(err, PsoError::Duplicate("Shape".into()));
        assert_eq!(
            psos.get("Shape").unwrap().topology(),
            wgpu::PrimitiveTopology::TriangleList
        );
    }

    #[test]
    fn swapped_stages_are_rejected() {
        let Some(gpu) = headless_gpu() else { return };
        let mut psos = PsoManager::new();
        let (vs, ps) = stages(&gpu);

        let err = psos
            .create_pso(&gpu, "Swapped", ps, vs, &Vertex::input_layout(), wgpu::PrimitiveTopology::TriangleList)
            .unwrap_err();
        assert!(matches!(err, PsoError::StageMismatch { expected: ShaderStage::Vertex, .. }));
        assert!(!psos.contains("Swapped"));
    }

    #[test]
    fn unlinked_stages_report_pipeline_error() {
        let Some(gpu) = headless_gpu() else { return };
        let mut psos = PsoManager::new();
        let (vs, ps) = unlinked_stages(&gpu);

        let err = psos
            .create_pso(&gpu, "Unlinked", vs, ps, &Vertex::input_layout(), wgpu::PrimitiveTopology::TriangleList)
            .unwrap_err();
        assert!(matches!(&err, PsoError::Pipeline { name, .. } if name == "Unlinked"));
        assert!(!psos.contains("Unlinked"));
        assert!(psos.is_empty());
    }

    #[test]
    fn failed_rebuild_keeps_previous_state() {
        let Some(gpu) = headless_gpu() else { return };
        let mut psos = PsoManager::new();
        let layout = Vertex::input_layout();

        let (vs, ps) = stages(&gpu);
        psos.create_pso(&gpu, "Shape", vs, ps, &layout, wgpu::PrimitiveTopology::TriangleList)
            .unwrap();
        let (vs, ps) = unlinked_stages(&gpu);
        let err = psos
            .create_pso(&gpu, "Shape", vs, ps, &layout, wgpu::PrimitiveTopology::LineList)
            .unwrap_err();

        assert!(matches!(err, PsoError::Pipeline { .. }));
        assert_eq!(
            psos.get("Shape").unwrap().topology(),
            wgpu::PrimitiveTopology::TriangleList
        );
    }
}
