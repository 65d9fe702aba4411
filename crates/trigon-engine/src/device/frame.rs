/// Number of frames whose command lists may be in flight at once.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Rotating per-frame slots.
///
/// Each slot remembers the submission that last used it; the slot must not be
/// recorded into again until that submission has completed on the GPU.
pub(crate) struct FrameRing<T> {
    index: usize,
    in_flight: [Option<T>; FRAMES_IN_FLIGHT],
}

impl<T> FrameRing<T> {
    pub fn new() -> Self {
        Self {
            index: 0,
            in_flight: std::array::from_fn(|_| None),
        }
    }

    /// Index of the active slot, in `0..FRAMES_IN_FLIGHT`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Takes the submission still outstanding for the active slot.
    ///
    /// The caller waits on it before reusing the slot.
    pub fn retire(&mut self) -> Option<T> {
        self.in_flight[self.index].take()
    }

    /// Records `submission` against the active slot and advances to the next one.
    pub fn complete(&mut self, submission: T) {
        self.in_flight[self.index] = Some(submission);
        self.index = (self.index + 1) % FRAMES_IN_FLIGHT;
    }

    /// Forgets all outstanding submissions (after a full queue flush).
    pub fn clear(&mut self) {
        for slot in &mut self.in_flight {
            *slot = None;
        }
    }
}

/// Back buffer acquired for the current frame.
///
/// Holding the surface texture prevents acquisition of subsequent frames.
pub(crate) struct BackBuffer {
    pub surface_texture: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

impl BackBuffer {
    /// Presents the frame. Offscreen back buffers are simply released.
    pub fn present(self) {
        drop(self.view);
        if let Some(surface_texture) = self.surface_texture {
            surface_texture.present();
        }
    }
}
