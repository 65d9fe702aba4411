//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the
//! application drawing into it.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{frame_control, FrameCtx};
