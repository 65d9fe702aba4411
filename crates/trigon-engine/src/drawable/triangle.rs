use std::path::Path;

use anyhow::{Context, Result};

use crate::command::CommandList;
use crate::coords::{Colour, Vec3};
use crate::device::Gpu;
use crate::mesh::{Mesh, Vertex};
use crate::pso::{PsoError, PsoManager};
use crate::shader::{load_shader, ShaderStage};

/// Name the triangle's pipeline state is registered under.
pub const TRIANGLE_PSO: &str = "Triangle";

pub const VERTEX_SHADER_FILE: &str = "vertex.wgsl";
pub const PIXEL_SHADER_FILE: &str = "pixel.wgsl";

/// Back buffer clear colour for [`Triangle::draw`].
pub const TRIANGLE_CLEAR: Colour = Colour::BLACK;

/// Screen-space triangle: green apex, red bottom-left, blue bottom-right.
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new(Vec3::new(0.0, 1.0, 0.0), Colour::GREEN),
    Vertex::new(Vec3::new(-1.0, -1.0, 0.0), Colour::RED),
    Vertex::new(Vec3::new(1.0, -1.0, 0.0), Colour::BLUE),
];

/// One triangle mesh and the pipeline state that draws it.
pub struct Triangle {
    mesh: Mesh,
    psos: PsoManager,
}

impl Triangle {
    /// Uploads the triangle and compiles its shaders from `shader_dir`.
    ///
    /// The upload completes on the GPU with the next submitted frame.
    pub fn new(gpu: &mut Gpu<'_>, shader_dir: &Path) -> Result<Self> {
        let mesh = Mesh::from_vertices(gpu, &TRIANGLE_VERTICES)
            .context("failed to create triangle mesh")?;

        let vs = load_shader(gpu.device(), &shader_dir.join(VERTEX_SHADER_FILE), ShaderStage::Vertex)?;
        let ps = load_shader(gpu.device(), &shader_dir.join(PIXEL_SHADER_FILE), ShaderStage::Pixel)?;

        let mut psos = PsoManager::new();
        psos.create_pso(gpu, TRIANGLE_PSO, vs, ps, mesh.input_layout(), mesh.topology())
            .context("failed to create triangle pipeline state")?;

        log::info!("triangle ready ({} vertices)", mesh.vertex_count());
        Ok(Self { mesh, psos })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn psos(&self) -> &PsoManager {
        &self.psos
    }

    /// Binds the triangle's pipeline state and records its draw into `cmd`.
    pub fn record(&self, cmd: &mut dyn CommandList) -> Result<(), PsoError> {
        self.psos.bind(cmd, TRIANGLE_PSO)?;
        self.mesh.draw(cmd);
        Ok(())
    }

    /// Records a render pass drawing the triangle into the current frame.
    pub fn draw(&self, gpu: &mut Gpu<'_>) -> Result<()> {
        gpu.begin_render_pass(TRIANGLE_CLEAR, |pass| Ok(self.record(pass)?))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::command::{CommandRecorder, RecordedCommand};
    use crate::device::testing::headless_gpu;

    const VERTEX_WGSL: &str = include_str!("../../../../shaders/vertex.wgsl");
    const PIXEL_WGSL: &str = include_str!("../../../../shaders/pixel.wgsl");

    fn shader_dir(test: &str, vertex: &str, pixel: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("trigon-{test}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(VERTEX_SHADER_FILE), vertex).unwrap();
        fs::write(dir.join(PIXEL_SHADER_FILE), pixel).unwrap();
        dir
    }

    #[test]
    fn bundled_shaders_validate() {
        crate::shader::validate_wgsl(VERTEX_WGSL, ShaderStage::Vertex).unwrap();
        crate::shader::validate_wgsl(PIXEL_WGSL, ShaderStage::Pixel).unwrap();
    }

    #[test]
    fn records_one_three_vertex_draw() {
        let Some(mut gpu) = headless_gpu() else { return };
        let dir = shader_dir("record", VERTEX_WGSL, PIXEL_WGSL);
        let triangle = Triangle::new(&mut gpu, &dir).unwrap();

        let mut recorder = CommandRecorder::new();
        triangle.record(&mut recorder).unwrap();

        assert!(matches!(
            &recorder.commands()[0],
            RecordedCommand::SetPipelineState { name, .. } if name == TRIANGLE_PSO
        ));
        let draws: Vec<_> = recorder.draw_calls().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices, 0..3);
        assert_eq!(draws[0].instances, 0..1);
        assert_eq!(draws[0].topology, Some(wgpu::PrimitiveTopology::TriangleList));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn draws_a_full_frame() {
        let Some(mut gpu) = headless_gpu() else { return };
        let dir = shader_dir("frame", VERTEX_WGSL, PIXEL_WGSL);
        let triangle = Triangle::new(&mut gpu, &dir).unwrap();

        gpu.reset_command_list().unwrap();
        gpu.begin_frame().unwrap();
        triangle.draw(&mut gpu).unwrap();
        gpu.finish_frame().unwrap();
        gpu.flush_graphics_queue().unwrap();

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn uploaded_vertices_match_fixed_geometry() {
        let Some(mut gpu) = headless_gpu() else { return };
        let dir = shader_dir("readback", VERTEX_WGSL, PIXEL_WGSL);
        let triangle = Triangle::new(&mut gpu, &dir).unwrap();

        let view = triangle.mesh().view();
        let bytes = gpu.read_buffer(view.buffer(), view.size_in_bytes()).unwrap();
        assert_eq!(bytes, bytemuck::cast_slice::<Vertex, u8>(&TRIANGLE_VERTICES));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn broken_pixel_shader_creates_no_state() {
        let Some(mut gpu) = headless_gpu() else { return };
        let dir = shader_dir("broken", VERTEX_WGSL, "@fragment fn PS( {");

        let err = Triangle::new(&mut gpu, &dir).err().unwrap();
        assert!(format!("{err:#}").contains(PIXEL_SHADER_FILE));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn broken_vertex_shader_creates_no_state() {
        let Some(mut gpu) = headless_gpu() else { return };
        let dir = shader_dir("broken-vs", "@vertex fn VS( {", PIXEL_WGSL);

        let err = Triangle::new(&mut gpu, &dir).err().unwrap();
        let message = format!("{err:#}");
        assert!(message.contains(VERTEX_SHADER_FILE));
        assert!(!message.contains(PIXEL_SHADER_FILE));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn unlinked_pixel_shader_registers_nothing() {
        let Some(mut gpu) = headless_gpu() else { return };
        let pixel = "@fragment fn PS(@location(3) tint: vec4<f32>) -> @location(0) vec4<f32> { return tint; }";
        let dir = shader_dir("unlinked", VERTEX_WGSL, pixel);

        let err = Triangle::new(&mut gpu, &dir).err().unwrap();
        assert!(format!("{err:#}").contains("failed to create triangle pipeline state"));

        let vs = load_shader(gpu.device(), &dir.join(VERTEX_SHADER_FILE), ShaderStage::Vertex).unwrap();
        let ps = load_shader(gpu.device(), &dir.join(PIXEL_SHADER_FILE), ShaderStage::Pixel).unwrap();
        let mut psos = PsoManager::new();
        let layout = Vertex::input_layout();
        let result = psos.create_pso(&gpu, TRIANGLE_PSO, vs, ps, &layout, wgpu::PrimitiveTopology::TriangleList);
        assert!(matches!(result, Err(PsoError::Pipeline { .. })));
        assert!(!psos.contains(TRIANGLE_PSO));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_shader_directory_fails() {
        let Some(mut gpu) = headless_gpu() else { return };
        let err = Triangle::new(&mut gpu, Path::new("no/such/dir")).err().unwrap();
        assert!(format!("{err:#}").contains("failed to read shader"));
    }
}
