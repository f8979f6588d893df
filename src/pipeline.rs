// Per-tick orchestration and session state.
//
// Two distinct operations, called from different triggers and never fused:
// - recompute_detections(): runs on explicit user action (toggle click or
//   parameter change). Synchronously reruns the enabled detectors in order
//   (corners from source, edges then lines over the destination) and stores
//   their results.
// - render_pass(): runs every tick. Applies the destination-reset rule and
//   builds the overlay primitives for the already-computed results; it
//   never recomputes anything.

use crate::corners::CornerDetector;
use crate::draw::Overlay;
use crate::edges::EdgeExtractor;
use crate::error::Error;
use crate::frame::FrameStore;
use crate::lines::LineExtractor;
use crate::types::{
    CornerParams, CornerPoint, EdgeParams, FRAME_HEIGHT, FRAME_WIDTH, LineParams, LineSegment,
};

const CORNER_COLOR: u32 = 0x00FF_0000;
const LINE_COLOR: u32 = 0x0000_FF00;
const SELECTION_COLOR: u32 = 0x0000_FF00;
const CORNER_MARK_RADIUS: i32 = 2;
const LINE_OVERLAY_WIDTH: i32 = 2;

/// Which detectors are enabled. Pure data; the controller reads it on
/// every trigger and tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionToggles {
    pub corners: bool,
    pub edges: bool,
    pub lines: bool,
}

/// Whether the destination buffer is reset to a plain copy of the source
/// before this tick's drawing.
///
/// The rule is `!edges && (!corners || !lines)`: with edges off, the view
/// returns to the plain source unless BOTH corner and line annotations are
/// active. Each combination is spelled out so the table can be read (and
/// tested) row by row.
pub fn reset_before_draw(t: DetectionToggles) -> bool {
    match (t.corners, t.edges, t.lines) {
        (false, false, false) => true,
        (false, false, true) => true,
        (false, true, false) => false,
        (false, true, true) => false,
        (true, false, false) => true,
        (true, false, true) => false,
        (true, true, false) => false,
        (true, true, true) => false,
    }
}

/// User-chosen rectangular region of interest. Display-only: nothing in
/// the detection path reads it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub active: bool,
}

impl SelectionRegion {
    /// Install a selection centered at (cx, cy) with the requested extent,
    /// clamped to the frame. Zero-sized requests are ignored.
    pub fn select(&mut self, cx: i32, cy: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x = (cx - w / 2).max(0);
        let y = (cy - h / 2).max(0);
        let end_x = (cx + w / 2).min(FRAME_WIDTH as i32 - 1);
        let end_y = (cy + h / 2).min(FRAME_HEIGHT as i32 - 1);
        self.x = x;
        self.y = y;
        self.width = end_x - x;
        self.height = end_y - y;
        self.active = true;
    }

    pub fn deselect(&mut self) {
        self.active = false;
    }
}

/// All numeric knobs, read fresh on each detection trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DetectionParams {
    pub corner: CornerParams,
    pub edge: EdgeParams,
    pub line: LineParams,
}

/// Overlay primitives for one tick, split by the pane they belong to.
#[derive(Default)]
pub struct RenderPlan {
    pub source: Vec<Overlay>,
    pub dest: Vec<Overlay>,
}

/// The live session: both frame buffers, the selection, the toggles and
/// parameters, and the most recent detection results. One instance exists;
/// there are no ambient globals.
pub struct Session {
    pub frames: FrameStore,
    pub toggles: DetectionToggles,
    pub params: DetectionParams,
    pub selection: SelectionRegion,
    corners: Vec<CornerPoint>,
    lines: Vec<LineSegment>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            frames: FrameStore::new(),
            toggles: DetectionToggles::default(),
            params: DetectionParams::default(),
            selection: SelectionRegion::default(),
            corners: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn corners(&self) -> &[CornerPoint] {
        &self.corners
    }

    pub fn lines(&self) -> &[LineSegment] {
        &self.lines
    }

    /// Rerun every enabled detector, replacing its previous results.
    ///
    /// Corner detection reads the source gray buffer; edge extraction
    /// reads and rewrites the destination; line extraction then reads the
    /// recomposited destination and stamps its segments into it. The edge
    /// mask is discarded after compositing. A failed stage leaves the
    /// stored results untouched.
    pub fn recompute_detections(&mut self) -> Result<(), Error> {
        if self.toggles.corners {
            let found = CornerDetector::new(self.params.corner).detect(self.frames.source_gray())?;
            tracing::info!("{} corners kept", found.len());
            self.corners = found;
        }
        if self.toggles.edges {
            let mask = EdgeExtractor::new(self.params.edge).run(&mut self.frames)?;
            let on = mask.data.iter().filter(|&&v| v != 0).count();
            tracing::info!("{} edge pixels masked", on);
        }
        if self.toggles.lines {
            let found = LineExtractor::new(self.params.line).run(&mut self.frames)?;
            tracing::info!("{} segments extracted", found.len());
            self.lines = found;
        }
        Ok(())
    }

    /// Per-tick drawing decisions. Applies the reset rule, then lists the
    /// overlay primitives for whatever results are enabled and present.
    pub fn render_pass(&mut self) -> RenderPlan {
        if reset_before_draw(self.toggles) {
            self.frames.reset_dest();
        }

        let mut plan = RenderPlan::default();
        if self.toggles.corners && !self.corners.is_empty() {
            for c in &self.corners {
                plan.dest.push(Overlay::Marker {
                    x: c.x as i32,
                    y: c.y as i32,
                    radius: CORNER_MARK_RADIUS,
                    color: CORNER_COLOR,
                });
            }
        }
        if self.toggles.lines && !self.lines.is_empty() {
            for l in &self.lines {
                plan.dest.push(Overlay::Segment {
                    x1: l.x1,
                    y1: l.y1,
                    x2: l.x2,
                    y2: l.y2,
                    width: LINE_OVERLAY_WIDTH,
                    color: LINE_COLOR,
                });
            }
        }
        if self.selection.active {
            plan.source.push(Overlay::Rect {
                x: self.selection.x,
                y: self.selection.y,
                w: self.selection.width,
                h: self.selection.height,
                color: SELECTION_COLOR,
            });
        }
        plan
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FrameBuffer, pack_rgb};

    fn toggles(corners: bool, edges: bool, lines: bool) -> DetectionToggles {
        DetectionToggles { corners, edges, lines }
    }

    #[test]
    fn reset_table_all_eight_rows() {
        // (corners, edges, lines) -> reset
        let expected = [
            (toggles(false, false, false), true),
            (toggles(false, false, true), true),
            (toggles(false, true, false), false),
            (toggles(false, true, true), false),
            (toggles(true, false, false), true),
            (toggles(true, false, true), false),
            (toggles(true, true, false), false),
            (toggles(true, true, true), false),
        ];
        for (t, want) in expected {
            assert_eq!(reset_before_draw(t), want, "toggles {t:?}");
        }
    }

    #[test]
    fn lines_only_resets_destination_before_drawing() {
        // The corners-off, edges-off, lines-on row: the working buffer is
        // restored to the plain source ahead of any line overlay.
        let mut session = Session::new();
        let mut fb = FrameBuffer::new(320, 240);
        fb.pixels[1000] = pack_rgb(200, 100, 50);
        session.frames.set_source(&fb);
        session.frames.dest_gray_mut().set(3, 3, 77);

        session.toggles = toggles(false, false, true);
        session.render_pass();

        assert_eq!(session.frames.dest_gray(), session.frames.source_gray());
    }

    #[test]
    fn disabled_results_are_not_drawn() {
        let mut session = Session::new();
        session.corners = vec![CornerPoint { x: 5, y: 5, score: 1.0 }];
        session.lines = vec![LineSegment { x1: 0, y1: 0, x2: 10, y2: 10 }];
        session.toggles = toggles(false, true, false);

        let plan = session.render_pass();
        assert!(plan.dest.is_empty());
        assert!(plan.source.is_empty());
    }

    #[test]
    fn enabled_results_are_drawn() {
        let mut session = Session::new();
        session.corners = vec![CornerPoint { x: 5, y: 5, score: 1.0 }];
        session.lines = vec![LineSegment { x1: 0, y1: 0, x2: 10, y2: 10 }];
        session.toggles = toggles(true, true, true);
        session.selection.select(100, 100, 40, 30);

        let plan = session.render_pass();
        assert_eq!(plan.dest.len(), 2);
        assert_eq!(plan.source.len(), 1);
    }

    #[test]
    fn selection_clamps_to_frame_bounds() {
        let mut sel = SelectionRegion::default();
        sel.select(5, 5, 40, 40);
        assert_eq!((sel.x, sel.y), (0, 0));
        assert_eq!((sel.width, sel.height), (25, 25));
        assert!(sel.active);

        sel.select(315, 235, 40, 40);
        assert_eq!((sel.x, sel.y), (295, 215));
        assert_eq!((sel.width, sel.height), (24, 24));

        sel.deselect();
        assert!(!sel.active);
    }

    #[test]
    fn zero_sized_selection_is_ignored() {
        let mut sel = SelectionRegion::default();
        sel.select(100, 100, 0, 10);
        assert!(!sel.active);
    }

    #[test]
    fn failed_recompute_keeps_previous_results() {
        let mut session = Session::new();
        session.corners = vec![CornerPoint { x: 1, y: 2, score: 3.0 }];
        session.toggles.corners = true;
        session.params.corner.k = -1.0;

        assert!(session.recompute_detections().is_err());
        assert_eq!(session.corners().len(), 1);
    }
}
