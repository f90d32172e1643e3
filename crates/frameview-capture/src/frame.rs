//! Frame types and the fixed-capacity frame ring.

use std::time::Instant;

use crate::cursor::CursorState;
use crate::error::{CaptureError, CaptureResult};

/// Pixel layout of a captured frame. The core pipeline is fixed to one
/// interleaved RGBA layout; the enum exists so slot reuse can detect a
/// format change and reallocate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit interleaved RGBA, 4 bytes per pixel.
    #[default]
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
        }
    }

    /// Required buffer length for the given dimensions, or an error when
    /// the multiplication overflows.
    pub fn buffer_len(self, width: u32, height: u32) -> CaptureResult<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(self.bytes_per_pixel()))
            .ok_or(CaptureError::FrameSizeMismatch {
                got: 0,
                expected: usize::MAX,
                width,
                height,
            })
    }
}

/// Metadata attached to each buffered frame.
#[derive(Debug, Clone)]
pub struct FrameMeta {
    /// Monotonic timestamp taken when the frame was accepted.
    pub timestamp: Instant,

    /// Monotonically increasing sequence number assigned by the engine.
    pub sequence: u64,

    /// Originating monitor index for single-monitor screen captures.
    pub monitor_index: Option<u32>,

    /// Cursor position/shape at capture time, when cursor capture is on.
    pub cursor: Option<CursorState>,

    /// Whether the cursor was drawn into the pixel data.
    pub cursor_composited: bool,
}

impl FrameMeta {
    pub fn new(timestamp: Instant, sequence: u64) -> Self {
        Self {
            timestamp,
            sequence,
            monitor_index: None,
            cursor: None,
            cursor_composited: false,
        }
    }
}

/// One complete captured frame, owned by the buffer slot it occupies.
/// Never mutated after becoming the latest slot; readers get `&Frame`.
#[derive(Debug)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    meta: FrameMeta,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn meta(&self) -> &FrameMeta {
        &self.meta
    }
}

/// Raw pixel data handed back by a driver, before it is copied into the
/// ring.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawFrame {
    /// Validate that the pixel data matches the reported dimensions.
    pub fn check(&self, format: PixelFormat) -> CaptureResult<()> {
        let expected = format.buffer_len(self.width, self.height)?;
        if self.pixels.len() != expected {
            return Err(CaptureError::FrameSizeMismatch {
                got: self.pixels.len(),
                expected,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Smallest ring the buffer will accept.
pub const MIN_BUFFER_CAPACITY: usize = 2;

/// Default ring depth.
pub const DEFAULT_BUFFER_CAPACITY: usize = 3;

/// Fixed-capacity ring of frame slots.
///
/// Writing advances `latest`; when the ring is full the oldest slot is
/// silently overwritten (drop accounting belongs to the engine). Slots
/// are reused in place for same-size frames, so sustained capture does
/// not allocate per frame. A dimension or format change reallocates only
/// the slot being written.
pub struct FrameBuffer {
    slots: Vec<Option<Frame>>,
    latest: Option<usize>,
}

impl FrameBuffer {
    /// Create a ring with `capacity` slots; clamped up to
    /// [`MIN_BUFFER_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_CAPACITY);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            latest: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Copy `raw` into the next slot and mark it latest. O(frame size),
    /// never blocks.
    pub fn write_frame(
        &mut self,
        raw: &RawFrame,
        format: PixelFormat,
        meta: FrameMeta,
    ) -> CaptureResult<()> {
        raw.check(format)?;

        let index = match self.latest {
            Some(i) => (i + 1) % self.slots.len(),
            None => 0,
        };

        match &mut self.slots[index] {
            // Same-size frame: reuse the slot allocation in place.
            Some(frame)
                if frame.width == raw.width
                    && frame.height == raw.height
                    && frame.format == format =>
            {
                frame.pixels.copy_from_slice(&raw.pixels);
                frame.meta = meta;
            }
            slot => {
                *slot = Some(Frame {
                    pixels: raw.pixels.clone(),
                    width: raw.width,
                    height: raw.height,
                    format,
                    meta,
                });
            }
        }

        self.latest = Some(index);
        Ok(())
    }

    /// The most recently written, fully valid frame.
    pub fn latest(&self) -> Option<&Frame> {
        self.latest.and_then(|i| self.slots[i].as_ref())
    }

    /// Release all slot memory and forget the latest frame.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.latest = None;
    }

    /// Sum of resident slot sizes in bytes.
    pub fn memory_usage(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|s| s.as_ref())
            .map(|f| f.pixels.len())
            .sum()
    }
}
