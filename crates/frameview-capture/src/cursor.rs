//! Cursor capture and compositing.
//!
//! Decorates a session's polled frames: after a successful poll the
//! compositor either draws the cursor shape into the pixels (`Overlay`),
//! attaches position metadata without drawing (`MetadataOnly`), or does
//! nothing (`Off`). Pointer state comes from a collaborator, not from the
//! capture backend.

use crate::frame::RawFrame;

/// Cursor position and shape at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    /// Position in virtual desktop coordinates.
    pub x: i32,
    pub y: i32,

    /// Whether the cursor is currently visible.
    pub visible: bool,

    /// Hotspot offset inside the shape image.
    pub hotspot_x: u32,
    pub hotspot_y: u32,

    /// Shape image size in pixels.
    pub shape_width: u32,
    pub shape_height: u32,

    /// RGBA8 pixel data for the shape. Empty when the shape is unknown,
    /// in which case only metadata attachment is possible.
    pub shape_rgba: Vec<u8>,
}

/// Collaborator that reports the live pointer state.
pub trait PointerQuery: Send {
    /// Current cursor state, or `None` when the pointer cannot be
    /// queried.
    fn cursor(&self) -> Option<CursorState>;
}

/// What the compositor does with the cursor on each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorMode {
    /// No cursor handling at all.
    #[default]
    Off,

    /// Draw the cursor shape into the captured pixels.
    Overlay,

    /// Attach position metadata without touching the pixels.
    MetadataOnly,
}

/// Applies the configured cursor mode to polled frames.
pub struct CursorCompositor {
    mode: CursorMode,
    pointer: Box<dyn PointerQuery>,
}

impl CursorCompositor {
    pub fn new(mode: CursorMode, pointer: Box<dyn PointerQuery>) -> Self {
        Self { mode, pointer }
    }

    pub fn mode(&self) -> CursorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CursorMode) {
        self.mode = mode;
    }

    /// Process one polled frame. `origin` is the capture rectangle's
    /// top-left in virtual desktop coordinates, used to translate the
    /// cursor position into frame space.
    ///
    /// Returns the cursor state to attach as metadata (if any) and
    /// whether the pixels were modified.
    pub fn apply(&self, frame: &mut RawFrame, origin: (i32, i32)) -> (Option<CursorState>, bool) {
        if self.mode == CursorMode::Off {
            return (None, false);
        }

        let Some(cursor) = self.pointer.cursor() else {
            return (None, false);
        };

        let composited = self.mode == CursorMode::Overlay
            && cursor.visible
            && blend_cursor(frame, &cursor, origin);

        (Some(cursor), composited)
    }
}

/// Alpha-blend the cursor shape into `frame`. Returns false when the
/// shape is empty or lies fully outside the frame.
fn blend_cursor(frame: &mut RawFrame, cursor: &CursorState, origin: (i32, i32)) -> bool {
    let shape_w = cursor.shape_width as usize;
    let shape_h = cursor.shape_height as usize;
    if shape_w == 0 || shape_h == 0 || cursor.shape_rgba.len() < shape_w * shape_h * 4 {
        return false;
    }

    // Shape top-left in frame coordinates.
    let dst_x = cursor.x - origin.0 - cursor.hotspot_x as i32;
    let dst_y = cursor.y - origin.1 - cursor.hotspot_y as i32;

    let frame_w = frame.width as i32;
    let frame_h = frame.height as i32;

    // Clip the shape against the frame.
    let x0 = dst_x.max(0);
    let y0 = dst_y.max(0);
    let x1 = (dst_x + shape_w as i32).min(frame_w);
    let y1 = (dst_y + shape_h as i32).min(frame_h);
    if x0 >= x1 || y0 >= y1 {
        return false;
    }

    let stride = frame.width as usize * 4;
    if frame.pixels.len() < frame.height as usize * stride {
        return false;
    }
    for fy in y0..y1 {
        let sy = (fy - dst_y) as usize;
        for fx in x0..x1 {
            let sx = (fx - dst_x) as usize;
            let src = &cursor.shape_rgba[(sy * shape_w + sx) * 4..(sy * shape_w + sx) * 4 + 4];
            let alpha = src[3] as u32;
            if alpha == 0 {
                continue;
            }
            let offset = fy as usize * stride + fx as usize * 4;
            let dst = &mut frame.pixels[offset..offset + 4];
            if alpha == 255 {
                dst.copy_from_slice(src);
            } else {
                let inv = 255 - alpha;
                for c in 0..3 {
                    dst[c] = ((src[c] as u32 * alpha + dst[c] as u32 * inv) / 255) as u8;
                }
                dst[3] = (alpha + dst[3] as u32 * inv / 255).min(255) as u8;
            }
        }
    }
    true
}
