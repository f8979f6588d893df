// File collaborator: image load/save through the `image` crate.
//
// A failed load or save aborts only the triggering action; the session
// buffers are never half-written because conversion happens on an owned
// copy first.

use std::path::Path;

use crate::error::Error;
use crate::types::{FrameBuffer, GrayFrame, pack_rgb, unpack_rgb};

/// Decode an image file into a color frame at its native size. The caller
/// installs it into the frame store, which resamples to the session size.
pub fn load(path: &Path) -> Result<FrameBuffer, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let img = image::open(path)
        .map_err(|e| Error::DecodeFailed(format!("{}: {e}", path.display())))?;
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut fb = FrameBuffer::new(w as usize, h as usize);
    for (dst, px) in fb.pixels.iter_mut().zip(rgb.pixels()) {
        *dst = pack_rgb(px[0], px[1], px[2]);
    }
    Ok(fb)
}

/// Write a gray frame; the format follows the file extension. PNG is
/// lossless, so a save/load round trip preserves every pixel.
pub fn save_gray(path: &Path, frame: &GrayFrame) -> Result<(), Error> {
    let img = image::GrayImage::from_raw(
        frame.width as u32,
        frame.height as u32,
        frame.data.clone(),
    )
    .ok_or_else(|| Error::WriteFailed("gray buffer does not match its dimensions".into()))?;
    img.save(path)
        .map_err(|e| Error::WriteFailed(format!("{}: {e}", path.display())))
}

/// Write a color frame; the format follows the file extension.
pub fn save_color(path: &Path, frame: &FrameBuffer) -> Result<(), Error> {
    let mut raw = Vec::with_capacity(frame.width * frame.height * 3);
    for &px in &frame.pixels {
        let (r, g, b) = unpack_rgb(px);
        raw.extend_from_slice(&[r, g, b]);
    }
    let img = image::RgbImage::from_raw(frame.width as u32, frame.height as u32, raw)
        .ok_or_else(|| Error::WriteFailed("color buffer does not match its dimensions".into()))?;
    img.save(path)
        .map_err(|e| Error::WriteFailed(format!("{}: {e}", path.display())))
}
