// tests/test_pipeline.rs — End-to-end scenarios over the full session.

use feature_scope::corners::CornerDetector;
use feature_scope::lines::LineExtractor;
use feature_scope::pipeline::{DetectionToggles, Session};
use feature_scope::types::{
    CornerParams, FRAME_HEIGHT, FRAME_WIDTH, FrameBuffer, GrayFrame, LineParams, pack_rgb,
};

fn gray_source<F: Fn(usize, usize) -> u8>(f: F) -> FrameBuffer {
    let mut fb = FrameBuffer::new(FRAME_WIDTH, FRAME_HEIGHT);
    for y in 0..FRAME_HEIGHT {
        for x in 0..FRAME_WIDTH {
            let v = f(x, y);
            fb.pixels[y * FRAME_WIDTH + x] = pack_rgb(v, v, v);
        }
    }
    fb
}

// ===== Corner scenario: a single bright square corner at (100, 80) =====

#[test]
fn single_square_corner_at_100_80() {
    // Bright rectangle reaching the frame border: its only interior corner
    // sits at (100, 80); the border corners flatten into plain edges.
    let mut img = GrayFrame::new(FRAME_WIDTH, FRAME_HEIGHT);
    for y in 80..FRAME_HEIGHT {
        for x in 100..FRAME_WIDTH {
            img.set(x, y, 230);
        }
    }

    let det = CornerDetector::new(CornerParams::legacy_compat(0.04, 3, 1e5));
    let corners = det.detect(&img).unwrap();

    assert_eq!(corners.len(), 1, "expected exactly one surviving corner");
    let c = &corners[0];
    assert!(
        (c.x as i32 - 100).abs() <= 2 && (c.y as i32 - 80).abs() <= 2,
        "corner at ({}, {}) is more than 2 px from (100, 80)",
        c.x,
        c.y,
    );
}

// ===== Line scenario: one long straight white line =====

#[test]
fn single_straight_line_detected_once() {
    let extractor = LineExtractor::new(LineParams::default());
    let mut img = GrayFrame::new(FRAME_WIDTH, FRAME_HEIGHT);
    for x in 30..=290 {
        img.set(x, 120, 255);
    }

    let segments = extractor.segments(&img).unwrap();
    assert_eq!(segments.len(), 1);

    let seg = &segments[0];
    let (near_start, near_end) = (
        (seg.x1 - 30).abs() <= 3 && (seg.y1 - 120).abs() <= 3,
        (seg.x2 - 290).abs() <= 3 && (seg.y2 - 120).abs() <= 3,
    );
    let (swapped_start, swapped_end) = (
        (seg.x2 - 30).abs() <= 3 && (seg.y2 - 120).abs() <= 3,
        (seg.x1 - 290).abs() <= 3 && (seg.y1 - 120).abs() <= 3,
    );
    assert!(
        (near_start && near_end) || (swapped_start && swapped_end),
        "endpoints {seg:?} not within 3 px of the true line",
    );
}

// ===== Full session flow =====

#[test]
fn session_flow_detects_and_annotates() {
    // A bright block gives corners; its outline gives edges; the edge rows
    // and columns give lines.
    let mut session = Session::new();
    session.frames.set_source(&gray_source(|x, y| {
        if (60..260).contains(&x) && (60..180).contains(&y) { 220 } else { 10 }
    }));
    session.frames.reset_dest();

    session.toggles = DetectionToggles { corners: true, edges: true, lines: true };
    session.params.corner = CornerParams::new(0.04, 3, 1e5, 10.0);
    session.recompute_detections().unwrap();

    assert!(!session.corners().is_empty(), "block corners not found");
    assert!(!session.lines().is_empty(), "block outline lines not found");

    // All four block corners are within reach of a detection.
    for (bx, by) in [(60i32, 60i32), (259, 60), (60, 179), (259, 179)] {
        let hit = session
            .corners()
            .iter()
            .any(|c| (c.x as i32 - bx).abs() <= 3 && (c.y as i32 - by).abs() <= 3);
        assert!(hit, "no corner near ({bx}, {by})");
    }

    // With all three toggles on, the render pass must not reset the
    // destination: the annotated buffer survives the tick.
    let before = session.frames.dest_gray().clone();
    let plan = session.render_pass();
    assert_eq!(*session.frames.dest_gray(), before);
    assert!(!plan.dest.is_empty());
}

#[test]
fn toggling_everything_off_restores_source_next_tick() {
    let mut session = Session::new();
    session.frames.set_source(&gray_source(|x, _| if x > 160 { 200 } else { 20 }));
    session.frames.reset_dest();

    session.toggles = DetectionToggles { corners: false, edges: true, lines: false };
    session.recompute_detections().unwrap();
    session.render_pass();
    assert_ne!(session.frames.dest_gray(), session.frames.source_gray());

    session.toggles = DetectionToggles::default();
    session.render_pass();
    assert_eq!(session.frames.dest_gray(), session.frames.source_gray());
}
