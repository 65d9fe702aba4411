use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{frame_control, App, AppControl, FrameCtx};
use crate::device::{FrameError, Gpu, GpuInit, SurfaceErrorAction};
use crate::input::{translate_window_event, InputFrame, InputState, Key};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Initial client area in physical pixels.
    pub size: PhysicalSize<u32>,
    /// Key that ends the frame loop.
    pub exit_key: Key,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Trigon".to_string(),
            size: PhysicalSize::new(1024, 1024),
            exit_key: Key::Escape,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until the exit key or a close request.
    ///
    /// The graphics queue is flushed before the window and GPU context are dropped.
    /// Errors from initialization or from a frame end the loop and are returned.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            window: None,
            error: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let app = &mut self.app;
        entry
            .with_gpu_mut(|gpu| app.init(gpu))
            .context("application initialization failed")?;

        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
        Ok(())
    }

    /// Drives one frame: reset, begin, exit check, app draw, finish.
    fn render_frame(&mut self) -> Result<AppControl> {
        let Some(entry) = self.window.as_mut() else {
            return Ok(AppControl::Continue);
        };

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let app = &mut self.app;
        let exit_key = self.config.exit_key;

        entry.with_mut(|fields| {
            let result = drive_frame(
                app,
                fields.window,
                fields.gpu,
                fields.input_state,
                fields.input_frame,
                exit_key,
            );

            // Clear per-frame deltas after the frame is consumed.
            fields.input_frame.clear();
            result
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.shutdown(event_loop);
    }

    /// Flushes the graphics queue, releases the window and stops the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.window.take() {
            let flushed = entry.with_gpu_mut(|gpu| {
                gpu.abandon_frame();
                gpu.flush_graphics_queue()
            });
            if let Err(err) = flushed {
                log::error!("failed to flush graphics queue: {err}");
            }
            log::info!("shutting down");
        }
        event_loop.exit();
    }
}

fn drive_frame<A: App>(
    app: &mut A,
    window: &Window,
    gpu: &mut Gpu<'_>,
    input: &InputState,
    input_frame: &InputFrame,
    exit_key: Key,
) -> Result<AppControl> {
    gpu.reset_command_list()?;

    match gpu.begin_frame() {
        Ok(()) => {}
        Err(FrameError::Surface(err)) => {
            log::warn!("back buffer unavailable: {err}");
            gpu.abandon_frame();
            return match gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => Err(anyhow!("surface could not be recovered")),
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    window.request_redraw();
                    Ok(AppControl::Continue)
                }
            };
        }
        Err(err) => return Err(err.into()),
    }

    if frame_control(input, input_frame, exit_key) == AppControl::Exit {
        log::info!("{exit_key} pressed, leaving frame loop");
        gpu.abandon_frame();
        return Ok(AppControl::Exit);
    }

    let control = {
        let mut ctx = FrameCtx {
            window,
            gpu: &mut *gpu,
            input,
            input_frame,
        };
        app.on_frame(&mut ctx)
    };
    let control = match control {
        Ok(control) => control,
        Err(err) => {
            gpu.abandon_frame();
            return Err(err);
        }
    };

    window.pre_present_notify();
    gpu.finish_frame()?;
    Ok(control)
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.create_window_entry(event_loop) {
            self.fail(event_loop, err.context("failed to create initial window"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let app = &mut self.app;
        let Some(entry) = self.window.as_mut() else {
            return;
        };

        let mut control = AppControl::Continue;
        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(&event) {
                fields.input_state.apply_event(fields.input_frame, ev);
            }
            control = app.on_window_event(&event);
        });

        if control == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested => match self.render_frame() {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => self.shutdown(event_loop),
                Err(err) => self.fail(event_loop, err.context("frame failed")),
            },

            _ => {}
        }
    }
}
