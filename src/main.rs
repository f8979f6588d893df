// Feature Scope — interactive feature detection.
// • Left pane: source image (live camera or loaded file), with the
//   selection rectangle. Right pane: working buffer with annotations.
// • Space starts/stops capture. V flips color/gray view.
// • C / E / L toggle corner, edge and line detection; every toggle (and
//   every parameter nudge) retriggers detection. Drawing happens every
//   tick either way.
// • Up/Down halve/double the Harris threshold, Left/Right step the Canny
//   high threshold.
// • Drag on the left pane to select a region, right-click to deselect.
// • O reloads the file given on the command line, W saves the working
//   buffer to feature-scope-out.png. ESC quits.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use feature_scope::camera::CameraCapture;
use feature_scope::draw::{self, Drawer};
use feature_scope::error::Error;
use feature_scope::files;
use feature_scope::pipeline::Session;
use feature_scope::types::{FRAME_HEIGHT, FRAME_WIDTH};

const SAVE_PATH: &str = "feature-scope-out.png";

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let image_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);

    let mut session = Session::new();

    // No camera is fine: the app still works on loaded files.
    let mut camera = match CameraCapture::new(0, FRAME_WIDTH as u32, FRAME_HEIGHT as u32) {
        Ok(cam) => Some(cam),
        Err(e) => {
            tracing::warn!("camera unavailable, file mode only: {e}");
            None
        }
    };
    let mut capture_on = camera.is_some() && image_path.is_none();

    if let Some(path) = &image_path {
        load_into(&mut session, path)?;
        tracing::info!("loaded {}", path.display());
    }

    let mut drawer = Drawer::new("Feature Scope", FRAME_WIDTH * 2, FRAME_HEIGHT)?;
    let mut color_view = false;
    let mut drag_anchor: Option<(i32, i32)> = None;

    // FPS bookkeeping, printed once per second.
    let mut last_fps_time = Instant::now();
    let mut frames_this_second = 0u32;
    let mut hud_fps = String::from("FPS: 0.0");

    while drawer.is_open() && !drawer.esc_pressed() {
        /* ---- input: toggles and parameter nudges retrigger detection ---- */
        let mut retrigger = false;

        if drawer.space_pressed_once() && camera.is_some() {
            capture_on = !capture_on;
        }
        if drawer.v_pressed_once() {
            color_view = !color_view;
        }
        if drawer.c_pressed_once() {
            session.toggles.corners = !session.toggles.corners;
            retrigger = true;
        }
        if drawer.e_pressed_once() {
            session.toggles.edges = !session.toggles.edges;
            retrigger = true;
        }
        if drawer.l_pressed_once() {
            session.toggles.lines = !session.toggles.lines;
            retrigger = true;
        }
        if drawer.up_pressed_once() {
            session.params.corner.score_threshold *= 2.0;
            session.params.corner.suppression_radius = session.params.corner.score_threshold;
            tracing::info!("harris threshold {}", session.params.corner.score_threshold);
            retrigger = true;
        }
        if drawer.down_pressed_once() {
            session.params.corner.score_threshold /= 2.0;
            session.params.corner.suppression_radius = session.params.corner.score_threshold;
            tracing::info!("harris threshold {}", session.params.corner.score_threshold);
            retrigger = true;
        }
        if drawer.right_pressed_once() {
            session.params.edge.high_threshold += 10;
            tracing::info!("canny high {}", session.params.edge.high_threshold);
            retrigger = true;
        }
        if drawer.left_pressed_once() {
            session.params.edge.high_threshold = (session.params.edge.high_threshold - 10).max(0);
            tracing::info!("canny high {}", session.params.edge.high_threshold);
            retrigger = true;
        }

        if drawer.o_pressed_once() {
            if let Some(path) = &image_path {
                // Loading stops capture so a tick never sees a half-loaded
                // buffer; a failed load leaves everything as it was.
                match load_into(&mut session, path) {
                    Ok(()) => {
                        capture_on = false;
                        retrigger = true;
                        tracing::info!("reloaded {}", path.display());
                    }
                    Err(e) => tracing::warn!("load failed: {e}"),
                }
            } else {
                tracing::warn!("no image path on the command line");
            }
        }
        if drawer.w_pressed_once() {
            let saved = if color_view {
                files::save_color(Path::new(SAVE_PATH), session.frames.dest_color())
            } else {
                files::save_gray(Path::new(SAVE_PATH), session.frames.dest_gray())
            };
            match saved {
                Ok(()) => tracing::info!("saved {SAVE_PATH}"),
                Err(e) => tracing::warn!("save failed: {e}"),
            }
        }

        /* ---- mouse: drag on the source pane selects a region ---- */
        if drawer.left_mouse_down() {
            if let Some((mx, my)) = drawer.mouse_pos() {
                let (mx, my) = (mx as i32, my as i32);
                if mx < FRAME_WIDTH as i32 || drag_anchor.is_some() {
                    let (ax, ay) = *drag_anchor.get_or_insert((mx, my));
                    let w = (mx - ax).abs();
                    let h = (my - ay).abs();
                    session.selection.select((mx + ax) / 2, (my + ay) / 2, w, h);
                }
            }
        } else {
            drag_anchor = None;
        }
        if drawer.right_mouse_down() {
            session.selection.deselect();
        }

        if retrigger {
            if let Err(e) = session.recompute_detections() {
                tracing::warn!("detection failed: {e}");
            }
        }

        /* ---- capture one frame, or skip ---- */
        if capture_on {
            if let Some(cam) = camera.as_mut() {
                match cam.next_frame() {
                    Ok(frame) => session.frames.set_source(&frame),
                    Err(e) => tracing::warn!("frame skipped: {e}"),
                }
            }
        }

        /* ---- render pass: draw already-computed results, never recompute ---- */
        let plan = session.render_pass();
        let left = if color_view {
            session.frames.source_color().clone()
        } else {
            session.frames.source_gray().to_color()
        };
        let right = if color_view {
            session.frames.dest_color().clone()
        } else {
            session.frames.dest_gray().to_color()
        };
        let mut display = draw::compose_panes(&left, &right);
        draw::apply_overlays(&mut display, &plan.source, 0, 0);
        draw::apply_overlays(&mut display, &plan.dest, FRAME_WIDTH as i32, 0);

        let status = if capture_on {
            "LIVE"
        } else if image_path.is_some() {
            "FILE"
        } else {
            "IDLE"
        };
        let hud = format!(
            "{status} | C:{} E:{} L:{} | {hud_fps}",
            session.toggles.corners as u8, session.toggles.edges as u8, session.toggles.lines as u8,
        );
        draw::draw_text_5x7(&mut display, 8, 8, &hud, 0x00FF_FFFF);

        drawer.present(&display)?;

        /* ---- FPS counter (terminal + HUD once per second) ---- */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            println!("FPS: {fps:.1}");
            hud_fps = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

/// Load a file into the session: new source, destination reset to match.
fn load_into(session: &mut Session, path: &Path) -> Result<(), Error> {
    let fb = files::load(path)?;
    session.frames.set_source(&fb);
    session.frames.reset_dest();
    Ok(())
}
