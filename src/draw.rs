// Window + software drawing utilities.
//
// The window shows the two panes side by side (source | destination) and
// everything drawn on top is plain software rendering into the pixel
// buffer: corner markers, segment strokes, the selection rectangle and a
// tiny 5x7 bitmap HUD font.

use crate::error::Error;
use crate::types::FrameBuffer;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

/// Target tick rate for the main loop, one pipeline pass per frame.
const TICK_FPS: usize = 30;

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Create the window; the tick limiter drives the per-frame cadence.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(TICK_FPS);
        Ok(Self { window })
    }

    /// Push the pixels for this tick to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixel coordinates, clamped.
    pub fn mouse_pos(&self) -> Option<(usize, usize)> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0) as usize, y.max(0.0) as usize))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    /// Right click clears the selection.
    pub fn right_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Right)
    }

    // One method per action key, edge-triggered.

    /// Space starts/stops live capture.
    pub fn space_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Space, KeyRepeat::No)
    }

    /// C toggles corner detection (and retriggers it).
    pub fn c_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::C, KeyRepeat::No)
    }

    /// E toggles edge extraction.
    pub fn e_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::E, KeyRepeat::No)
    }

    /// L toggles line extraction.
    pub fn l_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::L, KeyRepeat::No)
    }

    /// V flips between the color and gray views.
    pub fn v_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::V, KeyRepeat::No)
    }

    /// O reloads the image given on the command line.
    pub fn o_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::O, KeyRepeat::No)
    }

    /// W writes the destination pane to disk.
    pub fn w_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::W, KeyRepeat::No)
    }

    /// Up/Down nudge the Harris threshold, Left/Right the Canny high
    /// threshold; each nudge retriggers detection.
    pub fn up_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Up, KeyRepeat::No)
    }

    pub fn down_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Down, KeyRepeat::No)
    }

    pub fn left_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Left, KeyRepeat::No)
    }

    pub fn right_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Right, KeyRepeat::No)
    }
}

/* ---------- Overlay primitives ---------- */

/// One drawing primitive for the display sink, in pane-local coordinates.
pub enum Overlay {
    /// Small circle outline marking a corner.
    Marker { x: i32, y: i32, radius: i32, color: u32 },
    /// Stroked line segment.
    Segment { x1: i32, y1: i32, x2: i32, y2: i32, width: i32, color: u32 },
    /// Rectangle outline.
    Rect { x: i32, y: i32, w: i32, h: i32, color: u32 },
}

/// Apply a list of overlays, shifted by the pane origin (ox, oy).
pub fn apply_overlays(fb: &mut FrameBuffer, overlays: &[Overlay], ox: i32, oy: i32) {
    for overlay in overlays {
        match *overlay {
            Overlay::Marker { x, y, radius, color } => {
                draw_marker(fb, x + ox, y + oy, radius, color);
            }
            Overlay::Segment { x1, y1, x2, y2, width, color } => {
                draw_segment(fb, x1 + ox, y1 + oy, x2 + ox, y2 + oy, width, color);
            }
            Overlay::Rect { x, y, w, h, color } => {
                draw_rect(fb, x + ox, y + oy, w, h, color);
            }
        }
    }
}

/// Place the two panes side by side in one display buffer.
pub fn compose_panes(left: &FrameBuffer, right: &FrameBuffer) -> FrameBuffer {
    let height = left.height.max(right.height);
    let mut out = FrameBuffer::new(left.width + right.width, height);
    for y in 0..left.height {
        let dst = y * out.width;
        let src = y * left.width;
        out.pixels[dst..dst + left.width].copy_from_slice(&left.pixels[src..src + left.width]);
    }
    for y in 0..right.height {
        let dst = y * out.width + left.width;
        let src = y * right.width;
        out.pixels[dst..dst + right.width].copy_from_slice(&right.pixels[src..src + right.width]);
    }
    out
}

/// Put a pixel if (x, y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color;
}

/// Bresenham walk from (x0, y0) to (x1, y1), calling `plot` per pixel.
/// Shared by the display stroke and the gray-buffer line stamp.
pub(crate) fn trace_line(x0: i32, y0: i32, x1: i32, y1: i32, plot: &mut impl FnMut(i32, i32)) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        plot(x0, y0);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Stroke a segment `width` pixels thick: a square brush stamped along the
/// Bresenham walk.
pub fn draw_segment(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, width: i32, color: u32) {
    let half = (width.max(1) - 1) / 2;
    let reach = width.max(1) - 1 - half;
    trace_line(x0, y0, x1, y1, &mut |x, y| {
        for oy in -half..=reach {
            for ox in -half..=reach {
                put_pixel(fb, x + ox, y + oy, color);
            }
        }
    });
}

/// Midpoint circle outline, the corner marker shape.
pub fn draw_marker(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: u32) {
    if radius <= 0 {
        put_pixel(fb, cx, cy, color);
        return;
    }
    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;
    while x >= y {
        put_pixel(fb, cx + x, cy + y, color);
        put_pixel(fb, cx + y, cy + x, color);
        put_pixel(fb, cx - y, cy + x, color);
        put_pixel(fb, cx - x, cy + y, color);
        put_pixel(fb, cx - x, cy - y, color);
        put_pixel(fb, cx - y, cy - x, color);
        put_pixel(fb, cx + y, cy - x, color);
        put_pixel(fb, cx + x, cy - y, color);
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Rectangle outline from its top-left corner.
pub fn draw_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    if w <= 0 || h <= 0 {
        return;
    }
    trace_line(x, y, x + w, y, &mut |px, py| put_pixel(fb, px, py, color));
    trace_line(x, y + h, x + w, y + h, &mut |px, py| put_pixel(fb, px, py, color));
    trace_line(x, y, x, y + h, &mut |px, py| put_pixel(fb, px, py, color));
    trace_line(x + w, y, x + w, y + h, &mut |px, py| put_pixel(fb, px, py, color));
}

/* ---------- 5x7 bitmap font for the HUD line ---------- */

/// Return a 5x7 glyph bitmap for the character set the HUD needs.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Letters for "LIVE", "FILE", "IDLE", "FPS" and the toggle tags
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b01010,0b01010,0b00100),

        // Punctuation: space, vertical bar, colon, dot
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x, y) with a 1-pixel shadow.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32 + 1, y + ry as i32 + 1, 0x0000_0000);
                }
            }
        }
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32, y + ry as i32, color);
                }
            }
        }
    }
}

/// Draw the HUD string; each glyph is 5x7 with 1-pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_places_panes_side_by_side() {
        let mut left = FrameBuffer::new(4, 2);
        let mut right = FrameBuffer::new(4, 2);
        left.pixels[0] = 0xAA;
        right.pixels[0] = 0xBB;
        let out = compose_panes(&left, &right);
        assert_eq!(out.width, 8);
        assert_eq!(out.pixels[0], 0xAA);
        assert_eq!(out.pixels[4], 0xBB);
    }

    #[test]
    fn segment_stroke_covers_width() {
        let mut fb = FrameBuffer::new(20, 20);
        draw_segment(&mut fb, 2, 10, 17, 10, 3, 0xFF);
        for x in 2..=17 {
            assert_eq!(fb.pixels[9 * 20 + x], 0xFF);
            assert_eq!(fb.pixels[10 * 20 + x], 0xFF);
            assert_eq!(fb.pixels[11 * 20 + x], 0xFF);
        }
        assert_eq!(fb.pixels[12 * 20 + 10], 0);
    }

    #[test]
    fn marker_outline_has_expected_radius() {
        let mut fb = FrameBuffer::new(11, 11);
        draw_marker(&mut fb, 5, 5, 2, 0xFF);
        assert_eq!(fb.pixels[5 * 11 + 7], 0xFF); // (7,5): 2 right of center
        assert_eq!(fb.pixels[3 * 11 + 5], 0xFF); // (5,3): 2 above
        assert_eq!(fb.pixels[5 * 11 + 5], 0); // center untouched
    }

    #[test]
    fn rect_outline_corners() {
        let mut fb = FrameBuffer::new(20, 20);
        draw_rect(&mut fb, 2, 3, 10, 8, 0xFF);
        assert_eq!(fb.pixels[3 * 20 + 2], 0xFF);
        assert_eq!(fb.pixels[3 * 20 + 12], 0xFF);
        assert_eq!(fb.pixels[11 * 20 + 2], 0xFF);
        assert_eq!(fb.pixels[11 * 20 + 12], 0xFF);
        assert_eq!(fb.pixels[7 * 20 + 7], 0); // interior untouched
    }

    #[test]
    fn drawing_clips_at_bounds() {
        let mut fb = FrameBuffer::new(8, 8);
        draw_marker(&mut fb, 0, 0, 2, 0xFF);
        draw_segment(&mut fb, -5, 4, 12, 4, 3, 0xFF);
        draw_rect(&mut fb, 6, 6, 10, 10, 0xFF);
        // Nothing panicked and in-bounds pixels were written.
        assert_eq!(fb.pixels[4 * 8 + 3], 0xFF);
    }
}
