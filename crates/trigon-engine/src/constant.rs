//! Per-draw constant (uniform) data.
//!
//! One buffer holds `max_draw_calls` slots. Each draw writes its constants into the
//! current slot and advances; the ring wraps once every slot has been used.

use std::fmt;

use crate::device::Gpu;

/// Slot alignment for constant data, matching the strictest dynamic offset rule.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

pub const DEFAULT_MAX_DRAW_CALLS: u32 = 1024;

/// Rounds `size` up to the next multiple of [`CONSTANT_BUFFER_ALIGNMENT`].
#[inline]
pub const fn aligned_slot_size(size: u64) -> u64 {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantBufferError {
    ZeroSize,
    ZeroDrawCalls,
    /// The ring exceeds the device's buffer size limit, or one slot exceeds
    /// its uniform binding size limit.
    TooLarge { requested: u64, max: u64 },
    /// More bytes than one slot holds.
    Overflow { len: u64, slot_size: u64 },
}

impl fmt::Display for ConstantBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantBufferError::ZeroSize => f.write_str("constant buffer slot size is zero"),
            ConstantBufferError::ZeroDrawCalls => {
                f.write_str("constant buffer must hold at least one draw call")
            }
            ConstantBufferError::TooLarge { requested, max } => write!(
                f,
                "constant buffer of {requested} bytes exceeds the device limit of {max} bytes"
            ),
            ConstantBufferError::Overflow { len, slot_size } => write!(
                f,
                "{len} bytes of constants do not fit a {slot_size} byte slot"
            ),
        }
    }
}

impl std::error::Error for ConstantBufferError {}

/// Slot bookkeeping, kept apart from the GPU buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct SlotRing {
    slot_size: u64,
    slots: u32,
    current: u32,
}

impl SlotRing {
    fn new(size_in_bytes: u64, slots: u32) -> Result<Self, ConstantBufferError> {
        if size_in_bytes == 0 {
            return Err(ConstantBufferError::ZeroSize);
        }
        if slots == 0 {
            return Err(ConstantBufferError::ZeroDrawCalls);
        }
        Ok(Self {
            slot_size: aligned_slot_size(size_in_bytes),
            slots,
            current: 0,
        })
    }

    fn total_size(&self) -> u64 {
        self.slot_size * u64::from(self.slots)
    }

    fn offset(&self) -> u64 {
        u64::from(self.current) * self.slot_size
    }

    fn next(&mut self) {
        self.current += 1;
        if self.current >= self.slots {
            self.current = 0;
        }
    }
}

/// Ring of 256-byte aligned constant slots in one uniform buffer.
pub struct ConstantBuffer {
    buffer: wgpu::Buffer,
    ring: SlotRing,
    staging: Vec<u8>,
}

impl ConstantBuffer {
    /// Allocates `max_draw_calls` slots of `size_in_bytes`, each rounded up to 256 bytes.
    pub fn new(
        gpu: &Gpu<'_>,
        size_in_bytes: u64,
        max_draw_calls: u32,
    ) -> Result<Self, ConstantBufferError> {
        let ring = SlotRing::new(size_in_bytes, max_draw_calls)?;

        let limits = gpu.device().limits();
        let max_binding = u64::from(limits.max_uniform_buffer_binding_size);
        if ring.slot_size > max_binding {
            return Err(ConstantBufferError::TooLarge {
                requested: ring.slot_size,
                max: max_binding,
            });
        }

        let max = limits.max_buffer_size;
        let requested = ring.total_size();
        if requested > max {
            return Err(ConstantBufferError::TooLarge { requested, max });
        }

        let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("trigon constant buffer"),
            size: requested,
            usage: wgpu::BufferUsages::UNIFORM
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        log::debug!(
            "constant buffer: {max_draw_calls} slots of {} bytes",
            ring.slot_size
        );

        Ok(Self {
            buffer,
            ring,
            staging: Vec::new(),
        })
    }

    /// Writes `data` at the start of the current slot.
    ///
    /// The write lands with the next queue submission.
    pub fn update(&mut self, gpu: &Gpu<'_>, data: &[u8]) -> Result<(), ConstantBufferError> {
        let len = data.len() as u64;
        if len > self.ring.slot_size {
            return Err(ConstantBufferError::Overflow {
                len,
                slot_size: self.ring.slot_size,
            });
        }
        if data.is_empty() {
            return Ok(());
        }

        // Queue writes must be a multiple of the copy alignment.
        let padded = len.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT) as usize;
        self.staging.clear();
        self.staging.extend_from_slice(data);
        self.staging.resize(padded, 0);

        gpu.queue()
            .write_buffer(&self.buffer, self.ring.offset(), &self.staging);
        Ok(())
    }

    /// Moves to the next slot, wrapping after the last one.
    pub fn next(&mut self) {
        self.ring.next();
    }

    /// Byte offset of the current slot, usable as a dynamic offset.
    pub fn gpu_offset(&self) -> u64 {
        self.ring.offset()
    }

    pub fn slot_index(&self) -> u32 {
        self.ring.current
    }

    pub fn slot_size(&self) -> u64 {
        self.ring.slot_size
    }

    pub fn max_draw_calls(&self) -> u32 {
        self.ring.slots
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Binding covering the current slot.
    pub fn binding(&self) -> wgpu::BufferBinding<'_> {
        wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: self.ring.offset(),
            size: wgpu::BufferSize::new(self.ring.slot_size),
        }
    }
}
