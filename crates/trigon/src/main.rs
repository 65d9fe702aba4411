use std::path::PathBuf;

use anyhow::{Context, Result};

use trigon_engine::core::{App, AppControl, FrameCtx};
use trigon_engine::device::{Gpu, GpuInit};
use trigon_engine::drawable::Triangle;
use trigon_engine::logging::{init_logging, LoggingConfig};
use trigon_engine::window::{Runtime, RuntimeConfig};

/// Shader directory, relative to the working directory.
const SHADER_DIR: &str = "shaders";

/// Draws one triangle per frame.
struct TriangleApp {
    shader_dir: PathBuf,
    triangle: Option<Triangle>,
}

impl App for TriangleApp {
    fn init(&mut self, gpu: &mut Gpu<'_>) -> Result<()> {
        let info = gpu.adapter_info();
        log::info!("{} on {:?}, target {:?}", info.name, info.backend, gpu.surface_format());

        self.triangle = Some(Triangle::new(gpu, &self.shader_dir)?);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        let triangle = self
            .triangle
            .as_ref()
            .context("frame requested before initialization")?;
        triangle.draw(ctx.gpu)?;
        Ok(AppControl::Continue)
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let app = TriangleApp {
        shader_dir: PathBuf::from(SHADER_DIR),
        triangle: None,
    };

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), app)?;
    log::info!("exited cleanly");
    Ok(())
}
