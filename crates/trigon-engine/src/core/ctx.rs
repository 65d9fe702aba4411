use winit::window::Window;

use crate::device::Gpu;
use crate::input::{InputFrame, InputState, Key};

use super::app::AppControl;

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
}

/// Decides whether the frame loop keeps running after this frame's input.
///
/// A press counts even if the key was released again before the frame.
pub fn frame_control(input: &InputState, frame: &InputFrame, exit_key: Key) -> AppControl {
    if input.key_down(exit_key) || frame.pressed(exit_key) {
        AppControl::Exit
    } else {
        AppControl::Continue
    }
}
