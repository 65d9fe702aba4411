//! GPU device + frame management.
//!
//! This module is responsible for:
//! - creating the wgpu Adapter/Device/Queue
//! - creating & configuring the render target (swap chain or offscreen texture)
//! - staging uploads into GPU-resident buffers
//! - the per-frame command list lifecycle and queue flushes

mod error;
mod frame;
mod gpu;
mod init;
mod surface;
mod upload;

pub use error::{FrameError, SurfaceErrorAction, UploadError};
pub use frame::FRAMES_IN_FLIGHT;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use upload::{padded_size, ResourceState};

#[cfg(test)]
pub(crate) use gpu::testing;
