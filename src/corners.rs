// Harris corner detection.
//
// The detector scores every pixel with the structure-tensor response
// R = det(M) - k * trace(M)^2, where M sums Sobel gradient products over a
// block_size window. Positive R marks a corner, negative R an edge, near
// zero a flat patch. Pixels strictly above the score threshold are sorted
// by descending score and thinned by spatial non-maximum suppression.
//
// Border handling is replicate (clamp to edge) for both the Sobel stencil
// and the block window, so border responses are fully deterministic.

use crate::error::Error;
use crate::types::{CornerParams, CornerPoint, GrayFrame};

pub struct CornerDetector {
    params: CornerParams,
}

impl CornerDetector {
    pub fn new(params: CornerParams) -> Self {
        Self { params }
    }

    /// Per-pixel Harris response over the full frame, row-major.
    ///
    /// Exposed so the response map can be inspected or visualized.
    pub fn response(&self, src: &GrayFrame) -> Vec<f32> {
        let w = src.width;
        let h = src.height;
        if w == 0 || h == 0 {
            return Vec::new();
        }

        // Sobel gradients with replicated borders.
        let mut gx = vec![0.0f32; w * h];
        let mut gy = vec![0.0f32; w * h];
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

                let idx = y * w + x;
                gx[idx] = (p02 + 2.0 * p12 + p22) - (p00 + 2.0 * p10 + p20);
                gy[idx] = (p20 + 2.0 * p21 + p22) - (p00 + 2.0 * p01 + p02);
            }
        }

        // Gradient products.
        let mut ixx = vec![0.0f32; w * h];
        let mut iyy = vec![0.0f32; w * h];
        let mut ixy = vec![0.0f32; w * h];
        for i in 0..w * h {
            ixx[i] = gx[i] * gx[i];
            iyy[i] = gy[i] * gy[i];
            ixy[i] = gx[i] * gy[i];
        }

        // Structure tensor: unnormalized box sum over the block window,
        // clamped at the borders, then the response.
        let half = self.params.block_size / 2;
        let k = self.params.k;
        let mut response = vec![0.0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut sxx = 0.0f32;
                let mut syy = 0.0f32;
                let mut sxy = 0.0f32;
                for wy in 0..self.params.block_size {
                    let sy = (y + wy).saturating_sub(half).min(h - 1);
                    let row = sy * w;
                    for wx in 0..self.params.block_size {
                        let sx = (x + wx).saturating_sub(half).min(w - 1);
                        sxx += ixx[row + sx];
                        syy += iyy[row + sx];
                        sxy += ixy[row + sx];
                    }
                }
                let det = sxx * syy - sxy * sxy;
                let trace = sxx + syy;
                response[y * w + x] = det - k * trace * trace;
            }
        }
        response
    }

    /// Detect corners: score, filter, sort, suppress.
    ///
    /// The returned list is rebuilt from scratch on every call, sorted by
    /// descending score with raster-order tie break, and thinned so no two
    /// survivors lie within the suppression radius in both axes. An empty
    /// frame yields an empty list. The source frame is not touched.
    pub fn detect(&self, src: &GrayFrame) -> Result<Vec<CornerPoint>, Error> {
        self.params.validate()?;

        let w = src.width;
        let response = self.response(src);
        if response.is_empty() {
            return Ok(Vec::new());
        }

        let mut corners: Vec<CornerPoint> = Vec::new();
        for y in 0..src.height {
            for x in 0..w {
                let score = response[y * w + x];
                if score > self.params.score_threshold {
                    corners.push(CornerPoint { x: x as u32, y: y as u32, score });
                }
            }
        }

        corners.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.y.cmp(&b.y))
                .then_with(|| a.x.cmp(&b.x))
        });

        suppress_in_place(&mut corners, self.params.suppression_radius);
        Ok(corners)
    }
}

/// Remove every point that sits within `radius` (strictly, per axis) of an
/// earlier-ranked survivor.
///
/// Removal happens in place while scanning: once a point is erased it is
/// never compared against anything later, so a lower-ranked point may be
/// judged against fewer candidates than a full pairwise pass would use.
/// That erase-and-continue behavior is kept deliberately for parity with
/// the reference output.
fn suppress_in_place(corners: &mut Vec<CornerPoint>, radius: f32) {
    let mut i = 0;
    while i < corners.len() {
        let cx = corners[i].x as f32;
        let cy = corners[i].y as f32;
        let mut j = i + 1;
        while j < corners.len() {
            let dx = (cx - corners[j].x as f32).abs();
            let dy = (cy - corners[j].y as f32).abs();
            if dx < radius && dy < radius {
                corners.remove(j);
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}
