//! Software-rendered output window using `minifb`.
//!
//! The window is the frame loop's [`DrawingSurface`] and its display-refresh
//! clock: `present` pushes the buffer and `minifb` throttles to ~60 fps.
//!
//! All drawing goes through a [`Canvas`], which owns the pixel buffer and the
//! surface transform: video coordinates are scaled to window pixels and
//! mirrored horizontally, so the overlay lines up with a front-facing camera
//! image.  The canvas has no window and is what the tests exercise.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  mirrored video + skeleton overlay          │
//! │                                             │
//! ├─────────────────────────────────────────────┤
//! │  status bar: frame, hand, playback          │
//! └─────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use palm_gesture::{DrawingSurface, FingerName, FrameStatus, PlaybackCommand, VideoFrame};
use tracing::{debug, warn};

use crate::pose::SimInput;

pub const OVERLAY_COLOR: u32 = 0x00FF0000;
const BG_COLOR:          u32 = 0x001A1A2E;
const STATUS_BG:         u32 = 0x0016213E;
const STATUS_TEXT:       u32 = 0x00EEEEEE;
const STATUS_H:          usize = 15;

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub width:  usize,
    pub height: usize,
    pub buf:    Vec<u32>,
    mirror:     bool,
    /// Size of the video the overlay coordinates refer to.
    video_w:    usize,
    video_h:    usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize, mirror: bool) -> Self {
        Canvas {
            width,
            height,
            buf: vec![BG_COLOR; width * height],
            mirror,
            video_w: width,
            video_h: height,
        }
    }

    fn scale(&self) -> (f32, f32) {
        (
            self.width  as f32 / self.video_w.max(1) as f32,
            self.height as f32 / self.video_h.max(1) as f32,
        )
    }

    /// Video coordinates → window pixel coordinates.
    pub fn to_device(&self, x: f32, y: f32) -> (f32, f32) {
        let (sx, sy) = self.scale();
        let dx = x * sx;
        let dx = if self.mirror { self.width as f32 - 1.0 - dx } else { dx };
        (dx, y * sy)
    }

    pub fn blit(&mut self, frame: &VideoFrame) {
        self.video_w = frame.width;
        self.video_h = frame.height;
        if frame.width == 0 || frame.height == 0 {
            self.buf.fill(BG_COLOR);
            return;
        }
        for row in 0..self.height {
            let src_y = row * frame.height / self.height;
            for col in 0..self.width {
                let c = if self.mirror { self.width - 1 - col } else { col };
                let src_x = c * frame.width / self.width;
                self.buf[row * self.width + col] = frame.pixel(src_x, src_y);
            }
        }
    }

    pub fn disc(&mut self, x: f32, y: f32, radius: f32, color: u32) {
        let (cx, cy) = self.to_device(x, y);
        let (sx, _) = self.scale();
        let r = (radius * sx).max(1.0);
        if !(cx.is_finite() && cy.is_finite() && r.is_finite()) || self.buf.is_empty() {
            return;
        }
        let r2 = r * r;
        // Bounding box clamped to the canvas; empty when the disc misses it.
        let x0 = (cx - r).floor().max(0.0);
        let y0 = (cy - r).floor().max(0.0);
        let x1 = (cx + r).ceil().min(self.width as f32 - 1.0);
        let y1 = (cy + r).ceil().min(self.height as f32 - 1.0);
        if x0 > x1 || y0 > y1 {
            return;
        }
        for py in y0 as isize..=y1 as isize {
            for px in x0 as isize..=x1 as isize {
                let dx = px as f32 - cx;
                let dy = py as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(px, py, color);
                }
            }
        }
    }

    pub fn polyline(&mut self, points: &[(f32, f32)], color: u32) {
        for seg in points.windows(2) {
            let a = self.to_device(seg[0].0, seg[0].1);
            let b = self.to_device(seg[1].0, seg[1].1);
            if let Some((a, b)) = self.clip(a, b) {
                self.line(a, b, color);
            }
        }
    }

    /// Liang–Barsky clip of `a`–`b` to the canvas plus a one-pixel margin.
    /// `None` when the segment misses it or an endpoint is not finite.
    fn clip(&self, a: (f32, f32), b: (f32, f32)) -> Option<((f32, f32), (f32, f32))> {
        if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (ax, ay) = (a.0 as f64, a.1 as f64);
        let (dx, dy) = (b.0 as f64 - ax, b.1 as f64 - ay);
        let (xmin, ymin) = (-1.0, -1.0);
        let (xmax, ymax) = (self.width as f64, self.height as f64);

        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [(-dx, ax - xmin), (dx, xmax - ax), (-dy, ay - ymin), (dy, ymax - ay)] {
            if p == 0.0 {
                if q < 0.0 { return None; }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 { return None; }
                t0 = t0.max(r);
            } else {
                if r < t0 { return None; }
                t1 = t1.min(r);
            }
        }

        // Clamp again: with far-off endpoints the products lose precision.
        let at = |t: f64| {
            (
                (ax + t * dx).clamp(xmin, xmax) as f32,
                (ay + t * dy).clamp(ymin, ymax) as f32,
            )
        };
        let start = if t0 > 0.0 { at(t0) } else { a };
        let end   = if t1 < 1.0 { at(t1) } else { b };
        Some((start, end))
    }

    /// Bresenham line, one pixel wide.  Endpoints must already be clipped.
    fn line(&mut self, a: (f32, f32), b: (f32, f32), color: u32) {
        let (mut x, mut y) = (a.0.round() as isize, a.1.round() as isize);
        let (x1, y1) = (b.0.round() as isize, b.1.round() as isize);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    // ── Status bar ────────────────────────────────────────────────────────

    /// Paint the status strip along the bottom edge in device pixels.
    pub fn status_bar(&mut self, status: &FrameStatus) {
        let top = self.height.saturating_sub(STATUS_H);
        self.fill_rect(0, top, self.width, STATUS_H, STATUS_BG);
        self.draw_label(&status_line(status), 6, top + 5, STATUS_TEXT);
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// 3×5 bitmap text, one pixel per bit, 4 px per character.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 > self.width { break; }
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel((cx + col) as isize, (y + row) as isize, color);
                    }
                }
            }
            cx += 4;
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(
        title:  &str,
        width:  usize,
        height: usize,
        mirror: bool,
        sim_tx: Sender<SimInput>,
    ) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            canvas: Canvas::new(width, height, mirror),
            sim_tx,
        })
    }

    /// Translate key presses into [`SimInput`].  Returns false when the user
    /// asked to quit or the window closed.
    fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            debug!("quit requested");
            return false;
        }

        let fingers = [
            (Key::Key1, FingerName::Thumb),
            (Key::Key2, FingerName::IndexFinger),
            (Key::Key3, FingerName::MiddleFinger),
            (Key::Key4, FingerName::RingFinger),
            (Key::Key5, FingerName::Pinky),
        ];
        let mut inputs = Vec::new();
        for (key, finger) in fingers {
            if pressed(key) { inputs.push(SimInput::ToggleFinger(finger)); }
        }
        if pressed(Key::O) { inputs.push(SimInput::OpenHand); }
        if pressed(Key::C) { inputs.push(SimInput::CloseHand); }
        if pressed(Key::H) { inputs.push(SimInput::ToggleVisible); }
        if pressed(Key::F) { inputs.push(SimInput::FailNext); }

        // Nobody listens when predictions come from an external feed.
        for input in inputs {
            let _ = self.sim_tx.send(input);
        }
        true
    }
}

impl DrawingSurface for Visualizer {
    fn draw_frame(&mut self, frame: &VideoFrame) {
        self.canvas.blit(frame);
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
        self.canvas.disc(x, y, radius, OVERLAY_COLOR);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)]) {
        self.canvas.polyline(points, OVERLAY_COLOR);
    }

    fn show_status(&mut self, status: &FrameStatus) {
        self.canvas.status_bar(status);
    }

    fn present(&mut self) -> bool {
        if !self.poll_input() { return false; }
        let (w, h) = (self.canvas.width, self.canvas.height);
        if let Err(e) = self.window.update_with_buffer(&self.canvas.buf, w, h) {
            warn!(error = %e, "window update failed");
            return false;
        }
        self.window.is_open()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Status text and the 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// e.g. `FRAME 42  HAND IN VIEW  PLAYING`
pub fn status_line(status: &FrameStatus) -> String {
    let hand = if status.hand_present { "IN VIEW" } else { "NONE" };
    let playback = match status.command {
        Some(PlaybackCommand::Play)  => "PLAYING",
        Some(PlaybackCommand::Pause) => "PAUSED",
        None                         => "BAD FRAME",
    };
    format!("FRAME {}  HAND {}  {}", status.frame, hand, playback)
}

/// Rows top to bottom, 3 bits each, MSB on the left.
fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        ' ' => [0b000; 5],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn at(c: &Canvas, x: usize, y: usize) -> u32 {
        c.buf[y * c.width + x]
    }

    #[test]
    fn mirror_flips_x() {
        let c = Canvas::new(100, 50, true);
        assert_eq!(c.to_device(0.0, 10.0), (99.0, 10.0));
        assert_eq!(c.to_device(99.0, 10.0), (0.0, 10.0));
        let plain = Canvas::new(100, 50, false);
        assert_eq!(plain.to_device(20.0, 10.0), (20.0, 10.0));
    }

    #[test]
    fn blit_scales_and_mirrors() {
        let mut frame = VideoFrame::solid(2, 1, 0x000000);
        frame.pixels[0] = 0x111111; // left half
        frame.pixels[1] = 0x222222; // right half

        let mut c = Canvas::new(4, 2, true);
        c.blit(&frame);
        assert_eq!(at(&c, 0, 0), 0x222222);
        assert_eq!(at(&c, 3, 1), 0x111111);

        let mut plain = Canvas::new(4, 2, false);
        plain.blit(&frame);
        assert_eq!(at(&plain, 0, 0), 0x111111);
    }

    #[test]
    fn overlay_scales_with_video_size() {
        let mut c = Canvas::new(200, 100, false);
        c.blit(&VideoFrame::solid(100, 50, 0));
        assert_eq!(c.to_device(50.0, 25.0), (100.0, 50.0));
    }

    #[test]
    fn disc_covers_its_centre_only() {
        let mut c = Canvas::new(40, 40, false);
        c.disc(20.0, 20.0, 3.0, OVERLAY_COLOR);
        assert_eq!(at(&c, 20, 20), OVERLAY_COLOR);
        assert_eq!(at(&c, 22, 20), OVERLAY_COLOR);
        assert_eq!(at(&c, 30, 20), BG_COLOR);
    }

    #[test]
    fn polyline_connects_points_and_stays_open() {
        let mut c = Canvas::new(40, 40, false);
        c.polyline(&[(5.0, 5.0), (5.0, 30.0), (30.0, 30.0)], OVERLAY_COLOR);
        assert_eq!(at(&c, 5, 15), OVERLAY_COLOR);
        assert_eq!(at(&c, 20, 30), OVERLAY_COLOR);
        // No closing segment back to the first point.
        assert_eq!(at(&c, 18, 18), BG_COLOR);
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut c = Canvas::new(10, 10, false);
        c.disc(-50.0, -50.0, 3.0, OVERLAY_COLOR);
        c.polyline(&[(-20.0, 5.0), (40.0, 5.0)], OVERLAY_COLOR);
        assert_eq!(at(&c, 5, 5), OVERLAY_COLOR);
    }

    #[test]
    fn drawing_far_off_canvas_does_not_panic() {
        let mut c = Canvas::new(10, 10, false);
        c.polyline(&[(-1.0e30, 5.0), (5.0, 5.0)], OVERLAY_COLOR);
        assert_eq!(at(&c, 2, 5), OVERLAY_COLOR);
        assert_eq!(at(&c, 2, 4), BG_COLOR);

        c.polyline(&[(f32::NAN, 1.0), (3.0, f32::INFINITY), (1.0e30, -1.0e30)], OVERLAY_COLOR);
        c.disc(f32::NAN, 5.0, 3.0, OVERLAY_COLOR);
        c.disc(1.0e30, -1.0e30, 3.0, OVERLAY_COLOR);
        assert_eq!(c.buf.iter().filter(|&&p| p == OVERLAY_COLOR).count(), 6);

        // A huge radius fills the canvas without walking its bounding box.
        c.disc(5.0, 5.0, 1.0e30, OVERLAY_COLOR);
        assert!(c.buf.iter().all(|&p| p == OVERLAY_COLOR));
    }

    #[test]
    fn lines_are_one_pixel_wide() {
        let mut c = Canvas::new(20, 20, false);
        c.polyline(&[(5.0, 2.0), (5.0, 12.0)], OVERLAY_COLOR);
        assert_eq!(at(&c, 5, 7), OVERLAY_COLOR);
        assert_eq!(at(&c, 4, 7), BG_COLOR);
        assert_eq!(at(&c, 6, 7), BG_COLOR);
    }

    #[test]
    fn status_line_names_hand_and_playback() {
        let playing = FrameStatus { frame: 42, hand_present: true, command: Some(PlaybackCommand::Play) };
        assert_eq!(status_line(&playing), "FRAME 42  HAND IN VIEW  PLAYING");
        let gone = FrameStatus { frame: 7, hand_present: false, command: Some(PlaybackCommand::Pause) };
        assert_eq!(status_line(&gone), "FRAME 7  HAND NONE  PAUSED");
        let bad = FrameStatus { frame: 8, hand_present: true, command: None };
        assert!(status_line(&bad).ends_with("BAD FRAME"));
    }

    #[test]
    fn status_bar_paints_bottom_strip_only() {
        let mut c = Canvas::new(200, 40, true);
        let status = FrameStatus { frame: 1, hand_present: true, command: Some(PlaybackCommand::Play) };
        c.status_bar(&status);

        let top = 40 - STATUS_H;
        assert_eq!(at(&c, 0, top - 1), BG_COLOR);
        assert_eq!(at(&c, 199, top), STATUS_BG);
        let strip = &c.buf[top * 200..];
        assert!(strip.iter().any(|&p| p == STATUS_TEXT));
        // Text is not mirrored: "F" starts with a full top row at x = 6.
        assert_eq!(at(&c, 6, top + 5), STATUS_TEXT);
        assert_eq!(at(&c, 8, top + 5), STATUS_TEXT);
    }

    #[test]
    fn glyphs_cover_status_text() {
        let fallback = char_glyph('~');
        for ch in "FRAME HAND IN VIEW NONE PLAYING PAUSED BAD 0123456789".chars().filter(|c| *c != ' ') {
            assert_ne!(char_glyph(ch), fallback, "missing glyph for {:?}", ch);
        }
    }
}
