use std::iter;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::command::CommandList;
use crate::coords::Colour;

use super::frame::{BackBuffer, FrameRing};
use super::upload::{self, ResourceState};
use super::{surface, FrameError, GpuInit, SurfaceErrorAction, UploadError};

/// Where frames are rendered.
enum RenderTarget<'w> {
    /// Swap chain bound to a window.
    ///
    /// Surface lifetime is tied to the window; the window must outlive the `Gpu`.
    Surface {
        surface: wgpu::Surface<'w>,
        config: wgpu::SurfaceConfiguration,
    },
    /// Single offscreen texture, used when no window exists.
    Offscreen { texture: wgpu::Texture },
}

/// Process-wide GPU context.
///
/// This type is the low-level rendering context:
/// - creates and stores Adapter/Device/Queue
/// - creates and configures the render target (swap chain or offscreen texture)
/// - stages CPU data into GPU-resident buffers
/// - drives the per-frame command list lifecycle
///
/// Frame order is `reset_command_list` → `begin_frame` → `begin_render_pass`* →
/// `finish_frame`. Calls out of order return [`FrameError`].
pub struct Gpu<'w> {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    target: RenderTarget<'w>,
    format: wgpu::TextureFormat,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    frames: FrameRing<wgpu::SubmissionIndex>,
    command_list: Option<wgpu::CommandEncoder>,
    back_buffer: Option<BackBuffer>,

    /// Copies recorded by `upload_resource`, submitted ahead of the next frame.
    uploads: Option<wgpu::CommandEncoder>,
    staging: Vec<wgpu::Buffer>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = create_instance();

        // Surface lifetime is tied to `window` via `'w`.
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = request_adapter(&instance, &init, Some(&surface)).await?;
        let (device, queue) = request_device(&adapter, &init).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&surface_caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);
        log::debug!("surface configured: {format:?} {}x{}", config.width, config.height);

        Ok(Self::from_parts(
            adapter,
            device,
            queue,
            RenderTarget::Surface { surface, config },
            format,
            size,
        ))
    }

    fn from_parts(
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        target: RenderTarget<'w>,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
    ) -> Self {
        Self {
            adapter,
            device,
            queue,
            target,
            format,
            size,
            frames: FrameRing::new(),
            command_list: None,
            back_buffer: None,
            uploads: None,
            staging: Vec::new(),
        }
    }

    /// Returns the render target format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Index of the active per-frame slot, in `0..FRAMES_IN_FLIGHT`.
    pub fn frame_index(&self) -> usize {
        self.frames.index()
    }

    /// True between `reset_command_list` and `finish_frame`/`abandon_frame`.
    pub fn is_recording(&self) -> bool {
        self.command_list.is_some()
    }

    /// Number of staging buffers whose copies have not been submitted yet.
    pub fn pending_uploads(&self) -> usize {
        self.staging.len()
    }

    /// Reconfigures the render target after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        match &mut self.target {
            RenderTarget::Surface { surface, config } => {
                surface::apply_resize(surface, &self.device, config, &mut self.size, new_size);
            }
            RenderTarget::Offscreen { texture } => {
                self.size = new_size;
                if new_size.width > 0 && new_size.height > 0 {
                    *texture = surface::create_offscreen_texture(&self.device, self.format, new_size);
                }
            }
        }
    }

    /// Copies `data` into the GPU-resident `target` buffer.
    ///
    /// The bytes are written into a CPU-visible staging buffer and a copy into
    /// `target` is recorded. The copy is submitted ahead of the next frame (or by
    /// `flush_graphics_queue`); it is not complete on the GPU before that flush.
    /// `final_state` must be a state `target`'s usage allows.
    pub fn upload_resource(
        &mut self,
        target: &wgpu::Buffer,
        data: &[u8],
        final_state: ResourceState,
    ) -> std::result::Result<(), UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }

        let usage = target.usage();
        if !usage.contains(wgpu::BufferUsages::COPY_DST) {
            return Err(UploadError::NotCopyDestination);
        }
        if !final_state.accepts(usage) {
            return Err(UploadError::IncompatibleState {
                state: final_state,
                usage,
            });
        }

        let copy_size = upload::padded_size(data.len() as u64);
        if copy_size > target.size() {
            return Err(UploadError::TargetTooSmall {
                required: copy_size,
                capacity: target.size(),
            });
        }

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trigon upload staging"),
            size: copy_size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        {
            let mut mapped = staging.slice(..).get_mapped_range_mut();
            mapped[..data.len()].copy_from_slice(data);
        }
        staging.unmap();

        let encoder = self.uploads.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("trigon upload encoder"),
                })
        });
        encoder.copy_buffer_to_buffer(&staging, 0, target, 0, copy_size);
        self.staging.push(staging);

        log::debug!("staged {copy_size} byte upload, final state {final_state:?}");
        Ok(())
    }

    /// Opens the command list for the active frame slot.
    ///
    /// Blocks until the GPU has finished the previous frame recorded into this slot.
    pub fn reset_command_list(&mut self) -> std::result::Result<(), FrameError> {
        if self.command_list.is_some() {
            return Err(FrameError::AlreadyRecording);
        }

        if let Some(previous) = self.frames.retire() {
            self.wait_for(previous)?;
        }

        self.command_list = Some(self.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("trigon frame command list"),
            },
        ));
        Ok(())
    }

    /// Acquires the back buffer for the current frame.
    pub fn begin_frame(&mut self) -> std::result::Result<(), FrameError> {
        if self.command_list.is_none() {
            return Err(FrameError::NotRecording);
        }
        if self.back_buffer.is_some() {
            return Err(FrameError::AlreadyRecording);
        }

        let back_buffer = match &self.target {
            RenderTarget::Surface { surface, .. } => {
                let surface_texture = surface
                    .get_current_texture()
                    .map_err(FrameError::Surface)?;
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                BackBuffer {
                    surface_texture: Some(surface_texture),
                    view,
                }
            }
            RenderTarget::Offscreen { texture } => BackBuffer {
                surface_texture: None,
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            },
        };

        self.back_buffer = Some(back_buffer);
        Ok(())
    }

    /// Records one render pass into the current frame.
    ///
    /// The pass clears the back buffer to `clear`; `record` receives the pass as a
    /// [`CommandList`]. The pass ends when `record` returns.
    pub fn begin_render_pass<F>(&mut self, clear: Colour, record: F) -> Result<()>
    where
        F: FnOnce(&mut dyn CommandList) -> Result<()>,
    {
        let encoder = self.command_list.as_mut().ok_or(FrameError::NotRecording)?;
        let back_buffer = self.back_buffer.as_ref().ok_or(FrameError::NoBackBuffer)?;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("trigon render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &back_buffer.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        record(&mut pass)
    }

    /// Submits pending uploads and the frame's command list, then presents.
    pub fn finish_frame(&mut self) -> std::result::Result<(), FrameError> {
        let command_list = self.command_list.take().ok_or(FrameError::NotRecording)?;
        let back_buffer = self.back_buffer.take();

        let uploads = self.take_uploads();
        let submission = self
            .queue
            .submit(uploads.into_iter().chain(iter::once(command_list.finish())));
        self.staging.clear();
        self.frames.complete(submission);

        if let Some(back_buffer) = back_buffer {
            back_buffer.present();
        }
        Ok(())
    }

    /// Drops the current frame's command list without submitting it.
    ///
    /// Used when the back buffer cannot be acquired. Pending uploads are kept.
    pub fn abandon_frame(&mut self) {
        self.command_list = None;
        self.back_buffer = None;
    }

    /// Submits pending uploads and blocks until all submitted GPU work completes.
    pub fn flush_graphics_queue(&mut self) -> std::result::Result<(), FrameError> {
        let uploads = self.take_uploads();
        let submission = self.queue.submit(uploads);
        self.wait_for(submission)?;

        self.staging.clear();
        self.frames.clear();
        log::debug!("graphics queue flushed");
        Ok(())
    }

    /// Reads the first `size` bytes of `source` back to the CPU.
    ///
    /// Flushes pending uploads first. `source` must have `COPY_SRC` usage.
    pub fn read_buffer(&mut self, source: &wgpu::Buffer, size: u64) -> Result<Vec<u8>> {
        anyhow::ensure!(size > 0, "read-back size is zero");
        anyhow::ensure!(
            source.usage().contains(wgpu::BufferUsages::COPY_SRC),
            "read-back source was not created with COPY_SRC usage"
        );
        let copy_size = upload::padded_size(size);
        anyhow::ensure!(
            copy_size <= source.size(),
            "read-back of {size} bytes exceeds the {} byte buffer",
            source.size()
        );

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trigon readback"),
            size: copy_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("trigon readback encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &readback, 0, copy_size);

        let uploads = self.take_uploads();
        let submission = self
            .queue
            .submit(uploads.into_iter().chain(iter::once(encoder.finish())));
        self.staging.clear();

        let slice = readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.wait_for(submission)?;
        receiver
            .recv()
            .context("read-back mapping callback was dropped")?
            .context("failed to map read-back buffer")?;

        let bytes = slice.get_mapped_range()[..size as usize].to_vec();
        readback.unmap();
        Ok(bytes)
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        match &self.target {
            RenderTarget::Surface { surface, config } => {
                surface::map_surface_error(surface, &self.device, config, self.size, err)
            }
            RenderTarget::Offscreen { .. } => SurfaceErrorAction::Fatal,
        }
    }

    fn take_uploads(&mut self) -> Option<wgpu::CommandBuffer> {
        self.uploads.take().map(|encoder| encoder.finish())
    }

    fn wait_for(&self, submission: wgpu::SubmissionIndex) -> std::result::Result<(), FrameError> {
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: None,
            })
            .map(|_| ())
            .map_err(FrameError::Wait)
    }
}

impl Gpu<'static> {
    /// Creates a GPU context that renders into an offscreen texture.
    pub async fn headless(init: GpuInit, width: u32, height: u32) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let instance = create_instance();
        let adapter = request_adapter(&instance, &init, None).await?;
        let (device, queue) = request_device(&adapter, &init).await?;

        let size = PhysicalSize::new(width, height);
        let format = surface::offscreen_format(init.prefer_srgb);
        let texture = surface::create_offscreen_texture(&device, format, size);

        Ok(Self::from_parts(
            adapter,
            device,
            queue,
            RenderTarget::Offscreen { texture },
            format,
            size,
        ))
    }
}

fn create_instance() -> wgpu::Instance {
    // Use all backends to allow wgpu to select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

async fn request_adapter(
    instance: &wgpu::Instance,
    init: &GpuInit,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let info = adapter.get_info();
    log::info!("using adapter {} ({:?})", info.name, info.backend);
    Ok(adapter)
}

async fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("trigon device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Offscreen context for tests, or `None` when the machine has no usable adapter.
    pub(crate) fn headless_gpu() -> Option<Gpu<'static>> {
        match pollster::block_on(Gpu::headless(GpuInit::portable(), 64, 64)) {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                eprintln!("skipping GPU test: {err:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::headless_gpu;
    use super::*;
    use crate::device::FRAMES_IN_FLIGHT;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn upload_target(gpu: &Gpu<'_>, size: u64) -> wgpu::Buffer {
        gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("test upload target"),
            size,
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    #[test]
    fn upload_then_read_back_is_byte_identical() {
        let Some(mut gpu) = headless_gpu() else { return };
        let data: Vec<u8> = (0..64u8).collect();
        let target = upload_target(&gpu, 64);

        gpu.upload_resource(&target, &data, ResourceState::VertexAndConstantBuffer)
            .unwrap();
        assert_eq!(gpu.pending_uploads(), 1);

        let read = gpu.read_buffer(&target, 64).unwrap();
        assert_eq!(read, data);
        assert_eq!(gpu.pending_uploads(), 0);
    }

    #[test]
    fn unaligned_upload_is_padded() {
        let Some(mut gpu) = headless_gpu() else { return };
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let target = upload_target(&gpu, 8);

        gpu.upload_resource(&target, &data, ResourceState::CopySource).unwrap();
        assert_eq!(gpu.read_buffer(&target, 7).unwrap(), data);
    }

    #[test]
    fn upload_rejects_oversized_and_empty_sources() {
        let Some(mut gpu) = headless_gpu() else { return };
        let target = upload_target(&gpu, 16);

        assert_eq!(
            gpu.upload_resource(&target, &[0u8; 20], ResourceState::VertexAndConstantBuffer),
            Err(UploadError::TargetTooSmall { required: 20, capacity: 16 })
        );
        assert_eq!(
            gpu.upload_resource(&target, &[], ResourceState::VertexAndConstantBuffer),
            Err(UploadError::Empty)
        );
        assert_eq!(gpu.pending_uploads(), 0);
    }

    #[test]
    fn upload_rejects_state_the_buffer_cannot_enter() {
        let Some(mut gpu) = headless_gpu() else { return };
        let target = upload_target(&gpu, 16);

        let err = gpu
            .upload_resource(&target, &[0u8; 16], ResourceState::IndexBuffer)
            .unwrap_err();
        assert!(matches!(err, UploadError::IncompatibleState { .. }));
    }

    #[test]
    fn frame_calls_out_of_order_are_reported() {
        let Some(mut gpu) = headless_gpu() else { return };

        assert!(matches!(gpu.begin_frame(), Err(FrameError::NotRecording)));
        assert!(matches!(gpu.finish_frame(), Err(FrameError::NotRecording)));

        gpu.reset_command_list().unwrap();
        assert!(matches!(gpu.reset_command_list(), Err(FrameError::AlreadyRecording)));

        let err = gpu.begin_render_pass(Colour::BLACK, |_| Ok(())).unwrap_err();
        assert!(matches!(err.downcast_ref::<FrameError>(), Some(FrameError::NoBackBuffer)));

        gpu.abandon_frame();
        assert!(!gpu.is_recording());
    }

    #[test]
    fn frame_index_rotates_and_flush_completes() {
        let Some(mut gpu) = headless_gpu() else { return };

        for n in 0..5 {
            assert_eq!(gpu.frame_index(), n % FRAMES_IN_FLIGHT);
            gpu.reset_command_list().unwrap();
            gpu.begin_frame().unwrap();
            gpu.begin_render_pass(Colour::BLACK, |_| Ok(())).unwrap();
            gpu.finish_frame().unwrap();
        }

        gpu.flush_graphics_queue().unwrap();
        assert!(!gpu.is_recording());
    }

    #[test]
    fn flush_waits_for_submitted_frame() {
        let Some(mut gpu) = headless_gpu() else { return };
        gpu.reset_command_list().unwrap();
        gpu.begin_frame().unwrap();
        gpu.begin_render_pass(Colour::BLACK, |_| Ok(())).unwrap();
        gpu.finish_frame().unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        gpu.queue()
            .on_submitted_work_done(move || flag.store(true, Ordering::SeqCst));

        gpu.flush_graphics_queue().unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn empty_read_back_is_rejected() {
        let Some(mut gpu) = headless_gpu() else { return };
        let target = upload_target(&gpu, 16);

        let err = gpu.read_buffer(&target, 0).unwrap_err();
        assert!(err.to_string().contains("zero"));
    }
}
