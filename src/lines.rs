// Probabilistic segment extraction over the working buffer.
//
// Randomized Hough variant: edge pixels are visited in shuffled order and
// vote into a (distance, angle) accumulator. When a pixel's best bin
// collects strictly more votes than the vote threshold, the pipeline walks
// the image along that bin's direction in both ways, bridging gaps up to
// max_line_gap, and keeps the span if its dominant-axis extent reaches
// min_line_length. Pixels consumed by an accepted segment are retired from
// the accumulator so they cannot form a second line.
//
// The shuffle uses a fixed-seed xorshift32, so extraction is deterministic
// for a given buffer and parameter set.
//
// Side effect: accepted segments are stamped into the destination gray
// buffer as 3 px white strokes (color twin re-synced). With no segments
// the buffer is left byte-identical.

use crate::draw::trace_line;
use crate::error::Error;
use crate::frame::FrameStore;
use crate::types::{GrayFrame, LineParams, LineSegment};

use std::f32::consts::PI;

/// Fixed shuffle seed; any odd constant works, this one keeps reruns
/// reproducible.
const SAMPLE_SEED: u32 = 0x9E37_79B9;

/// Deterministic xorshift32, enough randomness for sampling order.
struct Rng32 {
    state: u32,
}

impl Rng32 {
    fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    #[inline]
    fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }
}

pub struct LineExtractor {
    params: LineParams,
}

impl LineExtractor {
    pub fn new(params: LineParams) -> Self {
        Self { params }
    }

    /// Full pass: extract segments from the working buffer, then stamp
    /// each one into it.
    pub fn run(&self, frames: &mut FrameStore) -> Result<Vec<LineSegment>, Error> {
        let segments = self.segments(frames.dest_gray())?;
        if !segments.is_empty() {
            for seg in &segments {
                stamp_segment(frames.dest_gray_mut(), seg);
            }
            frames.sync_dest_color();
        }
        Ok(segments)
    }

    /// Extract segments without touching any buffer.
    pub fn segments(&self, working: &GrayFrame) -> Result<Vec<LineSegment>, Error> {
        self.params.validate()?;
        Ok(hough_segments(working, &self.params, SAMPLE_SEED))
    }
}

/// Vote accumulator over (angle, distance) bins.
struct HoughAccum {
    numrho: i32,
    bins: Vec<i32>,
    /// Per angle bin: (cos, sin) pre-divided by the distance resolution.
    trig: Vec<(f32, f32)>,
}

impl HoughAccum {
    fn new(p: &LineParams, w: i32, h: i32) -> Self {
        let numangle = ((PI / p.angle_resolution).round() as usize).max(1);
        let numrho = (((2 * (w + h) + 1) as f32 / p.distance_resolution).round() as i32).max(1);
        let trig: Vec<(f32, f32)> = (0..numangle)
            .map(|a| {
                let ang = a as f32 * p.angle_resolution;
                (ang.cos() / p.distance_resolution, ang.sin() / p.distance_resolution)
            })
            .collect();
        Self { numrho, bins: vec![0i32; numangle * numrho as usize], trig }
    }

    #[inline]
    fn rho_index(&self, x: i32, y: i32, angle: usize) -> Option<usize> {
        let (c, s) = self.trig[angle];
        let r = (x as f32 * c + y as f32 * s).round() as i32 + (self.numrho - 1) / 2;
        (r >= 0 && r < self.numrho).then(|| angle * self.numrho as usize + r as usize)
    }

    /// Add one point's votes across all angle bins; returns the best bin
    /// (angle index, vote count) after the update.
    fn vote(&mut self, x: i32, y: i32) -> (usize, i32) {
        let mut best_angle = 0;
        let mut best_votes = 0;
        for angle in 0..self.trig.len() {
            if let Some(cell) = self.rho_index(x, y, angle) {
                self.bins[cell] += 1;
                if self.bins[cell] > best_votes {
                    best_votes = self.bins[cell];
                    best_angle = angle;
                }
            }
        }
        (best_angle, best_votes)
    }

    fn unvote(&mut self, x: i32, y: i32) {
        for angle in 0..self.trig.len() {
            if let Some(cell) = self.rho_index(x, y, angle) {
                self.bins[cell] -= 1;
            }
        }
    }

    /// Unit step along the line direction of an angle bin: the line with
    /// normal angle theta runs along (-sin, cos), rescaled so the dominant
    /// axis advances one pixel per step.
    fn step(&self, angle: usize, p: &LineParams) -> (f32, f32) {
        let ang = angle as f32 * p.angle_resolution;
        let (dx, dy) = (-ang.sin(), ang.cos());
        if dx.abs() >= dy.abs() {
            (dx.signum(), dy / dx.abs())
        } else {
            (dx / dy.abs(), dy.signum())
        }
    }
}

fn hough_segments(working: &GrayFrame, p: &LineParams, seed: u32) -> Vec<LineSegment> {
    let w = working.width as i32;
    let h = working.height as i32;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let mut on = vec![false; (w * h) as usize];
    let mut points: Vec<(i32, i32)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if working.data[(y * w + x) as usize] != 0 {
                on[(y * w + x) as usize] = true;
                points.push((x, y));
            }
        }
    }
    if points.is_empty() {
        return Vec::new();
    }

    let mut accum = HoughAccum::new(p, w, h);
    let mut voted = vec![false; (w * h) as usize];

    // Fisher-Yates with the fixed-seed generator.
    let mut rng = Rng32::from_seed(seed);
    for i in (1..points.len()).rev() {
        let j = rng.below(i as u32 + 1) as usize;
        points.swap(i, j);
    }

    let mut segments = Vec::new();
    for &(x0, y0) in &points {
        let pidx = (y0 * w + x0) as usize;
        // Consumed by an earlier segment.
        if !on[pidx] {
            continue;
        }

        voted[pidx] = true;
        let (best_angle, best_votes) = accum.vote(x0, y0);
        if best_votes <= p.vote_threshold as i32 {
            continue;
        }

        let (ix, iy) = accum.step(best_angle, p);
        let (e1x, e1y) = walk_dir(&on, w, h, x0, y0, ix, iy, p.max_line_gap);
        let (e2x, e2y) = walk_dir(&on, w, h, x0, y0, -ix, -iy, p.max_line_gap);

        let extent = (e1x - e2x).abs().max((e1y - e2y).abs());
        if extent < p.min_line_length {
            continue;
        }

        // Retire every pixel the segment covers so it cannot vote again.
        consume(&mut on, &mut voted, &mut accum, w, x0, y0, ix, iy, e1x, e1y);
        consume(&mut on, &mut voted, &mut accum, w, x0, y0, -ix, -iy, e2x, e2y);

        segments.push(LineSegment { x1: e1x, y1: e1y, x2: e2x, y2: e2y });
    }

    segments
}

/// Follow the line from (x0, y0) one pixel at a time, tolerating up to
/// max_gap consecutive misses; returns the last on-pixel reached.
fn walk_dir(on: &[bool], w: i32, h: i32, x0: i32, y0: i32, ix: f32, iy: f32, max_gap: i32) -> (i32, i32) {
    let (mut lx, mut ly) = (x0, y0);
    let (mut fx, mut fy) = (x0 as f32, y0 as f32);
    let mut gap = 0;
    loop {
        fx += ix;
        fy += iy;
        let x = fx.round() as i32;
        let y = fy.round() as i32;
        if x < 0 || y < 0 || x >= w || y >= h {
            break;
        }
        if on[(y * w + x) as usize] {
            lx = x;
            ly = y;
            gap = 0;
        } else {
            gap += 1;
            if gap > max_gap {
                break;
            }
        }
    }
    (lx, ly)
}

/// Walk the same trajectory again, clearing pixels and withdrawing their
/// votes, up to and including the endpoint.
fn consume(
    on: &mut [bool],
    voted: &mut [bool],
    accum: &mut HoughAccum,
    w: i32,
    x0: i32,
    y0: i32,
    ix: f32,
    iy: f32,
    ex: i32,
    ey: i32,
) {
    fn retire(
        x: i32,
        y: i32,
        w: i32,
        on: &mut [bool],
        voted: &mut [bool],
        accum: &mut HoughAccum,
    ) {
        let idx = (y * w + x) as usize;
        on[idx] = false;
        if voted[idx] {
            voted[idx] = false;
            accum.unvote(x, y);
        }
    }

    retire(x0, y0, w, on, voted, accum);
    let (mut fx, mut fy) = (x0 as f32, y0 as f32);
    let mut x = x0;
    let mut y = y0;
    while x != ex || y != ey {
        fx += ix;
        fy += iy;
        x = fx.round() as i32;
        y = fy.round() as i32;
        retire(x, y, w, on, voted, accum);
    }
}

/// Stamp a 3 px white stroke over the segment.
fn stamp_segment(gray: &mut GrayFrame, seg: &LineSegment) {
    let w = gray.width as i32;
    let h = gray.height as i32;
    trace_line(seg.x1, seg.y1, seg.x2, seg.y2, &mut |x, y| {
        for oy in -1..=1i32 {
            for ox in -1..=1i32 {
                let px = x + ox;
                let py = y + oy;
                if px >= 0 && py >= 0 && px < w && py < h {
                    gray.data[(py * w + px) as usize] = 255;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FRAME_HEIGHT, FRAME_WIDTH};

    fn frame_with<F: Fn(usize, usize) -> bool>(pred: F) -> GrayFrame {
        let mut img = GrayFrame::new(FRAME_WIDTH, FRAME_HEIGHT);
        for y in 0..FRAME_HEIGHT {
            for x in 0..FRAME_WIDTH {
                if pred(x, y) {
                    img.set(x, y, 255);
                }
            }
        }
        img
    }

    fn endpoints(seg: &LineSegment) -> [(i32, i32); 2] {
        let mut pts = [(seg.x1, seg.y1), (seg.x2, seg.y2)];
        pts.sort();
        pts
    }

    #[test]
    fn empty_buffer_yields_no_lines() {
        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.segments(&GrayFrame::new(FRAME_WIDTH, FRAME_HEIGHT)).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn no_lines_leaves_destination_untouched() {
        // A handful of scattered pixels never reaches the vote threshold,
        // so the working buffer must come back byte-identical.
        let mut store = FrameStore::new();
        for (x, y) in [(10usize, 10usize), (50, 90), (200, 30), (300, 200)] {
            store.dest_gray_mut().set(x, y, 255);
        }
        store.sync_dest_color();
        let before = store.dest_gray().clone();

        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.run(&mut store).unwrap();

        assert!(segments.is_empty());
        assert_eq!(*store.dest_gray(), before);
    }

    #[test]
    fn horizontal_line_found_exactly_once() {
        let img = frame_with(|x, y| y == 120 && (30..=290).contains(&x));
        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.segments(&img).unwrap();

        assert_eq!(segments.len(), 1);
        let [a, b] = endpoints(&segments[0]);
        assert!((a.0 - 30).abs() <= 3 && (a.1 - 120).abs() <= 3, "bad endpoint {a:?}");
        assert!((b.0 - 290).abs() <= 3 && (b.1 - 120).abs() <= 3, "bad endpoint {b:?}");
    }

    #[test]
    fn vertical_line_found_exactly_once() {
        let img = frame_with(|x, y| x == 160 && (40..=200).contains(&y));
        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.segments(&img).unwrap();

        assert_eq!(segments.len(), 1);
        let [a, b] = endpoints(&segments[0]);
        assert!((a.0 - 160).abs() <= 3 && (a.1 - 40).abs() <= 3, "bad endpoint {a:?}");
        assert!((b.0 - 160).abs() <= 3 && (b.1 - 200).abs() <= 3, "bad endpoint {b:?}");
    }

    #[test]
    fn diagonal_line_found() {
        let img = frame_with(|x, y| x == y && (40..=200).contains(&x));
        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.segments(&img).unwrap();

        assert_eq!(segments.len(), 1);
        let [a, b] = endpoints(&segments[0]);
        assert!((a.0 - 40).abs() <= 3 && (a.1 - 40).abs() <= 3, "bad endpoint {a:?}");
        assert!((b.0 - 200).abs() <= 3 && (b.1 - 200).abs() <= 3, "bad endpoint {b:?}");
    }

    #[test]
    fn small_gaps_are_bridged_into_one_segment() {
        let img = frame_with(|x, y| y == 80 && (30..=290).contains(&x) && x % 40 != 0);
        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.segments(&img).unwrap();
        assert_eq!(segments.len(), 1);
        let [a, b] = endpoints(&segments[0]);
        assert!(b.0 - a.0 >= 250, "gap bridging failed: {a:?} {b:?}");
    }

    #[test]
    fn short_segments_are_discarded() {
        // 21 px of line: enough votes with a low threshold, still below
        // the minimum length.
        let img = frame_with(|x, y| y == 60 && (100..=120).contains(&x));
        let params = LineParams { vote_threshold: 10, ..LineParams::default() };
        let extractor = LineExtractor::new(params);
        assert!(extractor.segments(&img).unwrap().is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = frame_with(|x, y| (y == 120 && x >= 30 && x <= 290) || (x == 60 && y >= 20 && y <= 220));
        let extractor = LineExtractor::new(LineParams::default());
        let first = extractor.segments(&img).unwrap();
        let second = extractor.segments(&img).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn accepted_segments_are_stamped_three_pixels_wide() {
        let mut store = FrameStore::new();
        for x in 30..=290 {
            store.dest_gray_mut().set(x, 120, 255);
        }
        store.sync_dest_color();

        let extractor = LineExtractor::new(LineParams::default());
        let segments = extractor.run(&mut store).unwrap();
        assert_eq!(segments.len(), 1);

        // The stroke covers the row above and below the original line.
        assert_eq!(store.dest_gray().get(100, 119), 255);
        assert_eq!(store.dest_gray().get(100, 120), 255);
        assert_eq!(store.dest_gray().get(100, 121), 255);
        // Color twin resynced.
        assert_eq!(store.dest_gray().to_color(), *store.dest_color());
    }
}
