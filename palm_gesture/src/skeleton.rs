//! Skeleton overlay: 21 dots and one polyline per finger.
//!
//! Dots are drawn at the landmark shifted by `point_offset` on both axes, so
//! with the default style a radius-3 dot sits on the joint.  Polylines start
//! at the wrist and are left open.

use serde::{Deserialize, Serialize};

use crate::error::GestureError;
use crate::host::DrawingSurface;
use crate::landmark::{FingerName, Landmark, LANDMARK_COUNT};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonStyle {
    pub point_radius: f32,
    pub point_offset: f32,
}

impl Default for SkeletonStyle {
    fn default() -> Self {
        SkeletonStyle { point_radius: 3.0, point_offset: 2.0 }
    }
}

/// Draw `landmarks` onto `surface`.  Rejects anything but 21 points before
/// touching the surface.
pub fn render<S: DrawingSurface + ?Sized>(
    surface:   &mut S,
    landmarks: &[Landmark],
    style:     &SkeletonStyle,
) -> Result<(), GestureError> {
    if landmarks.len() != LANDMARK_COUNT {
        return Err(GestureError::LandmarkCount {
            expected: LANDMARK_COUNT,
            found:    landmarks.len(),
        });
    }

    for lm in landmarks {
        surface.fill_circle(lm.x - style.point_offset, lm.y - style.point_offset, style.point_radius);
    }

    let mut points = Vec::with_capacity(5);
    for finger in FingerName::ALL {
        points.clear();
        points.extend(finger.lookup_indices().iter().map(|&i| (landmarks[i].x, landmarks[i].y)));
        surface.stroke_polyline(&points);
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// RecordingSurface — a headless surface that keeps every command
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
pub(crate) mod recording {
    use crate::host::{DrawingSurface, FrameStatus, VideoFrame};

    #[derive(Clone, Debug, PartialEq)]
    pub enum DrawCommand {
        Frame { width: usize, height: usize },
        Circle { x: f32, y: f32, radius: f32 },
        Polyline(Vec<(f32, f32)>),
    }

    /// Records draw commands instead of rasterising them.  `present` keeps
    /// returning `true` until `frames_left` reaches zero.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub commands:    Vec<DrawCommand>,
        pub statuses:    Vec<FrameStatus>,
        pub presented:   usize,
        pub frames_left: Option<usize>,
    }

    impl RecordingSurface {
        pub fn new() -> Self {
            Self::default()
        }

        /// A surface that closes itself after `frames` presents.
        pub fn closing_after(frames: usize) -> Self {
            RecordingSurface { frames_left: Some(frames), ..Self::default() }
        }

        pub fn circles(&self) -> usize {
            self.commands.iter().filter(|c| matches!(c, DrawCommand::Circle { .. })).count()
        }

        pub fn polylines(&self) -> Vec<&[(f32, f32)]> {
            self.commands
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Polyline(p) => Some(p.as_slice()),
                    _ => None,
                })
                .collect()
        }
    }

    impl DrawingSurface for RecordingSurface {
        fn draw_frame(&mut self, frame: &VideoFrame) {
            self.commands.push(DrawCommand::Frame { width: frame.width, height: frame.height });
        }

        fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
            self.commands.push(DrawCommand::Circle { x, y, radius });
        }

        fn stroke_polyline(&mut self, points: &[(f32, f32)]) {
            self.commands.push(DrawCommand::Polyline(points.to_vec()));
        }

        fn show_status(&mut self, status: &FrameStatus) {
            self.statuses.push(*status);
        }

        fn present(&mut self) -> bool {
            self.presented += 1;
            match self.frames_left.as_mut() {
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    *n > 0
                }
                None => true,
            }
        }
    }
}
