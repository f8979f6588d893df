// FrameStore: the session's two live buffers.
//
// Source holds the last captured or loaded image; destination is the working
// buffer the edge and line stages read and rewrite and the overlay pane
// displays. Both exist in color and gray form at all times, pixel-for-pixel
// equivalent; every gray mutation goes through a method here that re-syncs
// the color twin. All four buffers share the fixed 320x240 dimensions.

use crate::types::{FRAME_HEIGHT, FRAME_WIDTH, FrameBuffer, GrayFrame};

pub struct FrameStore {
    source_color: FrameBuffer,
    source_gray: GrayFrame,
    dest_color: FrameBuffer,
    dest_gray: GrayFrame,
}

impl FrameStore {
    pub fn new() -> Self {
        Self {
            source_color: FrameBuffer::new(FRAME_WIDTH, FRAME_HEIGHT),
            source_gray: GrayFrame::new(FRAME_WIDTH, FRAME_HEIGHT),
            dest_color: FrameBuffer::new(FRAME_WIDTH, FRAME_HEIGHT),
            dest_gray: GrayFrame::new(FRAME_WIDTH, FRAME_HEIGHT),
        }
    }

    pub fn width(&self) -> usize {
        FRAME_WIDTH
    }

    pub fn height(&self) -> usize {
        FRAME_HEIGHT
    }

    /// Install a new source image. Frames of any size are accepted and
    /// brought to the session size by nearest-neighbor resampling; the gray
    /// twin is derived immediately.
    pub fn set_source(&mut self, frame: &FrameBuffer) {
        self.source_color = frame.resized_nearest(FRAME_WIDTH, FRAME_HEIGHT);
        self.source_gray = self.source_color.to_gray();
    }

    /// Reset the working buffer to a plain copy of the source.
    pub fn reset_dest(&mut self) {
        self.dest_color = self.source_color.clone();
        self.dest_gray = self.source_gray.clone();
    }

    /// Zero the destination, then copy source intensities through the mask:
    /// edges reappear at their true brightness, everything else goes black.
    pub fn recomposite_through(&mut self, mask: &GrayFrame) {
        for (dst, (&m, &src)) in self
            .dest_gray
            .data
            .iter_mut()
            .zip(mask.data.iter().zip(self.source_gray.data.iter()))
        {
            *dst = if m != 0 { src } else { 0 };
        }
        self.sync_dest_color();
    }

    /// Rebuild the destination color twin from its gray form. Call after
    /// any direct mutation of `dest_gray_mut`.
    pub fn sync_dest_color(&mut self) {
        self.dest_color = self.dest_gray.to_color();
    }

    pub fn source_color(&self) -> &FrameBuffer {
        &self.source_color
    }

    pub fn source_gray(&self) -> &GrayFrame {
        &self.source_gray
    }

    pub fn dest_color(&self) -> &FrameBuffer {
        &self.dest_color
    }

    pub fn dest_gray(&self) -> &GrayFrame {
        &self.dest_gray
    }

    pub fn dest_gray_mut(&mut self) -> &mut GrayFrame {
        &mut self.dest_gray
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}
