//! Narrow interfaces to the collaborators the frame loop drives.
//!
//! Camera acquisition, the pose model itself, audio output and the window
//! all live behind these traits.  Tests substitute recording fakes.

use crate::error::EstimateError;
use crate::landmark::HandPrediction;

// ════════════════════════════════════════════════════════════════════════════
// VideoFrame / VideoSource
// ════════════════════════════════════════════════════════════════════════════

/// One captured frame: row-major `0x00RRGGBB` pixels at native size.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl VideoFrame {
    /// A frame filled with one color.
    pub fn solid(width: usize, height: usize, color: u32) -> Self {
        VideoFrame { width, height, pixels: vec![color; width * height] }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}

pub trait VideoSource {
    /// The current frame, or `None` once the source has ended.
    fn next_frame(&mut self) -> Option<&VideoFrame>;
}

// ════════════════════════════════════════════════════════════════════════════
// PoseModel
// ════════════════════════════════════════════════════════════════════════════

/// The external hand-pose estimator.
///
/// Returns zero or more predictions for the frame.  The call may block; the
/// next frame is not captured until it returns.
pub trait PoseModel {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<Vec<HandPrediction>, EstimateError>;
}

impl<M: PoseModel + ?Sized> PoseModel for Box<M> {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<Vec<HandPrediction>, EstimateError> {
        (**self).estimate(frame)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlaybackDevice
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
}

/// A shared playback device.  Both operations must be idempotent: `play`
/// while playing and `pause` while paused are no-ops.
pub trait PlaybackDevice {
    fn play(&mut self);
    fn pause(&mut self);

    fn apply(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Play  => self.play(),
            PlaybackCommand::Pause => self.pause(),
        }
    }
}

impl<P: PlaybackDevice + ?Sized> PlaybackDevice for Box<P> {
    fn play(&mut self)  { (**self).play() }
    fn pause(&mut self) { (**self).pause() }
}

// ════════════════════════════════════════════════════════════════════════════
// DrawingSurface
// ════════════════════════════════════════════════════════════════════════════

/// What the loop made of the frame just drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStatus {
    pub frame:        u64,
    pub hand_present: bool,
    /// `None` when the prediction was malformed and nothing was issued.
    pub command:      Option<PlaybackCommand>,
}

/// Output surface in video-pixel coordinates.
///
/// The owner sets up any transform (mirroring for a front camera, scaling to
/// device pixels) before handing the surface to the loop; callers only issue
/// primitives.
pub trait DrawingSurface {
    /// Blit the whole frame, scaled to the surface.
    fn draw_frame(&mut self, frame: &VideoFrame);

    /// Filled circle centred on `(x, y)`.
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32);

    /// Open polyline through `points` in order.
    fn stroke_polyline(&mut self, points: &[(f32, f32)]);

    /// Called once per frame after the overlay, before `present`.
    fn show_status(&mut self, _status: &FrameStatus) {}

    /// Show what was drawn and wait for the next display refresh.
    /// Returns `false` once the surface has gone away.
    fn present(&mut self) -> bool;
}

impl<S: DrawingSurface + ?Sized> DrawingSurface for Box<S> {
    fn draw_frame(&mut self, frame: &VideoFrame)           { (**self).draw_frame(frame) }
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32) { (**self).fill_circle(x, y, radius) }
    fn stroke_polyline(&mut self, points: &[(f32, f32)])   { (**self).stroke_polyline(points) }
    fn show_status(&mut self, status: &FrameStatus)        { (**self).show_status(status) }
    fn present(&mut self) -> bool                          { (**self).present() }
}
