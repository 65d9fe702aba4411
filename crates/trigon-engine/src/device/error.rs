use std::fmt;

use super::upload::ResourceState;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Frame lifecycle misuse or a failed wait on the GPU timeline.
#[derive(Debug)]
pub enum FrameError {
    /// `reset_command_list` or `begin_frame` called while the frame is already open.
    AlreadyRecording,
    /// A recording operation was called before `reset_command_list`.
    NotRecording,
    /// A render pass was requested before `begin_frame` acquired a back buffer.
    NoBackBuffer,
    /// The back buffer could not be acquired.
    Surface(wgpu::SurfaceError),
    /// Waiting for submitted work failed.
    Wait(wgpu::PollError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::AlreadyRecording => write!(f, "a frame is already being recorded"),
            FrameError::NotRecording => write!(f, "no command list is open; call reset_command_list first"),
            FrameError::NoBackBuffer => write!(f, "no back buffer acquired; call begin_frame first"),
            FrameError::Surface(err) => write!(f, "failed to acquire back buffer: {err}"),
            FrameError::Wait(err) => write!(f, "failed waiting for GPU work: {err}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Surface(err) => Some(err),
            FrameError::Wait(err) => Some(err),
            _ => None,
        }
    }
}

/// Rejected `upload_resource` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Nothing to upload.
    Empty,
    /// The (padded) copy does not fit in the destination buffer.
    TargetTooSmall { required: u64, capacity: u64 },
    /// The destination buffer was not created with `COPY_DST`.
    NotCopyDestination,
    /// The destination buffer cannot be used in the requested final state.
    IncompatibleState {
        state: ResourceState,
        usage: wgpu::BufferUsages,
    },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Empty => write!(f, "upload source is empty"),
            UploadError::TargetTooSmall { required, capacity } => write!(
                f,
                "upload of {required} bytes does not fit in a {capacity} byte buffer"
            ),
            UploadError::NotCopyDestination => {
                write!(f, "upload target was not created with COPY_DST usage")
            }
            UploadError::IncompatibleState { state, usage } => write!(
                f,
                "upload target with usage {usage:?} cannot enter state {state:?}"
            ),
        }
    }
}

impl std::error::Error for UploadError {}
