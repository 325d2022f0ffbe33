//! Synthetic video source.
//!
//! Camera capture is outside this program; the window still needs something
//! behind the overlay, so [`TestPatternVideo`] paints a slowly drifting
//! colour gradient at the configured size.

use palm_gesture::{VideoFrame, VideoSource};

pub struct TestPatternVideo {
    frame: VideoFrame,
    phase: f32,
}

impl TestPatternVideo {
    pub fn new(width: usize, height: usize) -> Self {
        let mut v = TestPatternVideo {
            frame: VideoFrame::solid(width, height, 0),
            phase: 0.0,
        };
        v.paint();
        v
    }

    fn paint(&mut self) {
        let w = self.frame.width.max(1) as f32;
        for y in 0..self.frame.height {
            for x in 0..self.frame.width {
                let hue = (self.phase + x as f32 / w * 90.0 + y as f32 * 0.05) % 360.0;
                self.frame.pixels[y * self.frame.width + x] = hsv_to_rgb(hue, 0.45, 0.30);
            }
        }
    }
}

impl VideoSource for TestPatternVideo {
    fn next_frame(&mut self) -> Option<&VideoFrame> {
        self.phase = (self.phase + 0.5) % 360.0;
        self.paint();
        Some(&self.frame)
    }
}

/// Convert HSV → packed `0x00RRGGBB`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ch = |c: f32| ((c * 255.0) as u32).min(255);
    (ch(r) << 16) | (ch(g) << 8) | ch(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(hsv_to_rgb(0.0,   1.0, 1.0), 0xFF0000);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), 0x00FF00);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), 0x0000FF);
    }

    #[test]
    fn zero_value_is_black() {
        assert_eq!(hsv_to_rgb(200.0, 0.7, 0.0), 0);
    }

    #[test]
    fn frames_have_configured_size_and_drift() {
        let mut v = TestPatternVideo::new(32, 16);
        let first = v.next_frame().unwrap().clone();
        assert_eq!((first.width, first.height), (32, 16));
        assert_eq!(first.pixels.len(), 32 * 16);
        let second = v.next_frame().unwrap();
        assert_ne!(&first, second);
    }
}
