// Edge extraction over the working buffer.
//
// Stages: 3x3 box blur to knock down noise, Sobel gradient magnitude,
// thinning along the gradient direction, then two-threshold hysteresis:
// magnitude strictly above the high threshold seeds a chain, strictly above
// the low threshold extends it (8-connected flood). The surviving pixels
// form a binary mask; the destination is zeroed and source intensities are
// copied back through the mask, so edges show at their true brightness.
//
// Reads dest_gray, writes dest_gray (and its color twin). The mask itself
// is transient: rebuilt per pass and returned for inspection only.

use crate::error::Error;
use crate::frame::FrameStore;
use crate::types::{EdgeParams, GrayFrame};

pub struct EdgeExtractor {
    params: EdgeParams,
}

impl EdgeExtractor {
    pub fn new(params: EdgeParams) -> Self {
        Self { params }
    }

    /// Full pass: mask the working buffer, then recomposite the source
    /// through it into the destination.
    pub fn run(&self, frames: &mut FrameStore) -> Result<GrayFrame, Error> {
        let mask = self.mask(frames.dest_gray())?;
        frames.recomposite_through(&mask);
        Ok(mask)
    }

    /// Compute the binary edge mask (0 or 255) without touching any buffer.
    pub fn mask(&self, working: &GrayFrame) -> Result<GrayFrame, Error> {
        self.params.validate()?;

        let w = working.width;
        let h = working.height;
        if w == 0 || h == 0 {
            return Ok(GrayFrame::new(w, h));
        }

        let blurred = box_blur3(working);
        let (gx, gy, mag) = sobel_gradients(&blurred);
        let thin = thin_along_gradient(&gx, &gy, &mag, w, h);
        Ok(hysteresis(
            &thin,
            w,
            h,
            self.params.low_threshold as f32,
            self.params.high_threshold as f32,
        ))
    }
}

/// 3x3 box blur with replicated borders, integer rounding like the usual
/// normalized box filter.
fn box_blur3(src: &GrayFrame) -> GrayFrame {
    let w = src.width;
    let h = src.height;
    let mut out = GrayFrame::new(w, h);
    for y in 0..h {
        let ym1 = y.saturating_sub(1);
        let yp1 = (y + 1).min(h - 1);
        for x in 0..w {
            let xm1 = x.saturating_sub(1);
            let xp1 = (x + 1).min(w - 1);
            let sum = src.data[ym1 * w + xm1] as u32
                + src.data[ym1 * w + x] as u32
                + src.data[ym1 * w + xp1] as u32
                + src.data[y * w + xm1] as u32
                + src.data[y * w + x] as u32
                + src.data[y * w + xp1] as u32
                + src.data[yp1 * w + xm1] as u32
                + src.data[yp1 * w + x] as u32
                + src.data[yp1 * w + xp1] as u32;
            out.data[y * w + x] = ((sum + 4) / 9) as u8;
        }
    }
    out
}

/// Sobel gradients and L2 magnitude, replicated borders.
fn sobel_gradients(src: &GrayFrame) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let w = src.width;
    let h = src.height;
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];
    let mut mag = vec![0.0f32; w * h];
    for y in 0..h {
        let ym1 = y.saturating_sub(1);
        let yp1 = (y + 1).min(h - 1);
        for x in 0..w {
            let xm1 = x.saturating_sub(1);
            let xp1 = (x + 1).min(w - 1);

            let p00 = src.data[ym1 * w + xm1] as f32;
            let p01 = src.data[ym1 * w + x] as f32;
            let p02 = src.data[ym1 * w + xp1] as f32;
            let p10 = src.data[y * w + xm1] as f32;
            let p12 = src.data[y * w + xp1] as f32;
            let p20 = src.data[yp1 * w + xm1] as f32;
            let p21 = src.data[yp1 * w + x] as f32;
            let p22 = src.data[yp1 * w + xp1] as f32;

            let gxx = (p02 + 2.0 * p12 + p22) - (p00 + 2.0 * p10 + p20);
            let gyy = (p20 + 2.0 * p21 + p22) - (p00 + 2.0 * p01 + p02);

            let idx = y * w + x;
            gx[idx] = gxx;
            gy[idx] = gyy;
            mag[idx] = (gxx * gxx + gyy * gyy).sqrt();
        }
    }
    (gx, gy, mag)
}

/// Keep only ridge pixels: a magnitude survives if it is not smaller than
/// both neighbors along its gradient direction (quantized to 4 directions).
fn thin_along_gradient(gx: &[f32], gy: &[f32], mag: &[f32], w: usize, h: usize) -> Vec<f32> {
    let mut thin = vec![0.0f32; w * h];
    if w < 3 || h < 3 {
        return thin;
    }

    const TAN22_5: f32 = 0.414_213_57;
    const TAN67_5: f32 = 2.414_213_7;

    for y in 1..(h - 1) {
        for x in 1..(w - 1) {
            let idx = y * w + x;
            let m = mag[idx];
            if m <= 0.0 {
                continue;
            }

            let ax = gx[idx].abs();
            let ay = gy[idx].abs();
            let (i1, i2) = if ay <= ax * TAN22_5 {
                (idx - 1, idx + 1)
            } else if ay >= ax * TAN67_5 {
                (idx - w, idx + w)
            } else if gx[idx] * gy[idx] > 0.0 {
                (idx - w - 1, idx + w + 1)
            } else {
                (idx - w + 1, idx + w - 1)
            };

            if m >= mag[i1] && m >= mag[i2] {
                thin[idx] = m;
            }
        }
    }
    thin
}

/// Two-threshold linking: seeds strictly above `high` flood into weak
/// pixels strictly above `low`, 8-connected.
fn hysteresis(thin: &[f32], w: usize, h: usize, low: f32, high: f32) -> GrayFrame {
    let mut mask = GrayFrame::new(w, h);
    let mut stack: Vec<usize> = Vec::new();

    for (idx, &v) in thin.iter().enumerate() {
        if v > high {
            mask.data[idx] = 255;
            stack.push(idx);
        }
    }

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(w - 1);
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let nidx = ny * w + nx;
                if mask.data[nidx] == 0 && thin[nidx] > low {
                    mask.data[nidx] = 255;
                    stack.push(nidx);
                }
            }
        }
    }

    mask
}
