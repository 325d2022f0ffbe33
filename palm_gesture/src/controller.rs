//! Frame loop controller.
//!
//! [`FrameLoop`] owns every collaborator plus the loop's own state (the
//! debouncer, statistics, the last command issued).  One iteration:
//!
//! 1. take the current video frame and blit it to the surface;
//! 2. ask the pose model for predictions (the only blocking call);
//! 3. with a hand: draw its skeleton, classify it, `Play` if open else
//!    `Pause`; without a hand: `Pause`;
//! 4. report a [`FrameStatus`] to the surface, then present it and wait
//!    for the next display refresh.
//!
//! Iterations never overlap.  A slow model simply delays the next capture.
//! The loop checks its [`LoopHandle`] at the top of every iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::classifier::{self, Classification};
use crate::config::LoopConfig;
use crate::error::{EstimateError, GestureError, LoopError};
use crate::host::{
    DrawingSurface, FrameStatus, PlaybackCommand, PlaybackDevice, PoseModel, VideoSource,
};
use crate::landmark::HandPrediction;
use crate::skeleton;
use crate::smoothing::Debouncer;

// ════════════════════════════════════════════════════════════════════════════
// LoopHandle
// ════════════════════════════════════════════════════════════════════════════

/// Cancellation flag shared between the loop and whoever wants to stop it.
/// Cancelling more than once is harmless.
#[derive(Clone, Debug, Default)]
pub struct LoopHandle {
    cancelled: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameStats / Tick
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames:             u64,
    pub hands_seen:         u64,
    pub frame_errors:       u64,
    pub inference_failures: u64,
}

/// What one iteration did.
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    Issued(PlaybackCommand),
    /// The prediction was malformed; nothing was issued this frame.
    FrameError(GestureError),
    SourceEnded,
}

// ════════════════════════════════════════════════════════════════════════════
// FrameLoop
// ════════════════════════════════════════════════════════════════════════════

pub struct FrameLoop<V, S, M, P> {
    video:    V,
    surface:  S,
    model:    M,
    playback: P,

    config:    LoopConfig,
    debouncer: Debouncer,
    handle:    LoopHandle,

    stats:                FrameStats,
    consecutive_failures: u32,
    last_command:         Option<PlaybackCommand>,
}

impl<V, S, M, P> FrameLoop<V, S, M, P>
where
    V: VideoSource,
    S: DrawingSurface,
    M: PoseModel,
    P: PlaybackDevice,
{
    pub fn new(video: V, surface: S, model: M, playback: P, config: LoopConfig) -> Self {
        FrameLoop {
            video,
            surface,
            model,
            playback,
            debouncer: Debouncer::new(config.smoothing_frames),
            config,
            handle: LoopHandle::new(),
            stats: FrameStats::default(),
            consecutive_failures: 0,
            last_command: None,
        }
    }

    /// A handle that stops [`run`](Self::run) before its next iteration.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn stats(&self) -> FrameStats          { self.stats }
    pub fn last_command(&self) -> Option<PlaybackCommand> { self.last_command }
    pub fn config(&self) -> &LoopConfig        { &self.config }
    pub fn surface(&self) -> &S                { &self.surface }
    pub fn playback(&self) -> &P               { &self.playback }

    /// Run iterations until cancelled, the surface closes, or the video
    /// source or a finite prediction feed ends.  Per-frame errors are logged and skipped; only a failing
    /// or vanished pose model ends the loop with an error.
    pub fn run(&mut self) -> Result<FrameStats, LoopError> {
        info!(
            quorum    = self.config.classifier.closed_quorum,
            smoothing = self.config.smoothing_frames,
            "frame loop started"
        );

        loop {
            if self.handle.is_cancelled() {
                info!("frame loop cancelled");
                break;
            }

            match self.step() {
                Ok(Tick::SourceEnded) => {
                    info!("input ended");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, frames = self.stats.frames, "frame loop stopped");
                    return Err(e);
                }
            }

            if !self.surface.present() {
                info!("drawing surface closed");
                break;
            }
        }

        info!(
            frames             = self.stats.frames,
            hands_seen         = self.stats.hands_seen,
            frame_errors       = self.stats.frame_errors,
            inference_failures = self.stats.inference_failures,
            "frame loop finished"
        );
        Ok(self.stats)
    }

    /// One iteration without the final present.
    pub fn step(&mut self) -> Result<Tick, LoopError> {
        let Some(frame) = self.video.next_frame() else {
            return Ok(Tick::SourceEnded);
        };
        self.surface.draw_frame(frame);
        let estimate = self.model.estimate(frame);
        if matches!(estimate, Err(EstimateError::Exhausted)) {
            return Ok(Tick::SourceEnded);
        }
        self.stats.frames += 1;

        let predictions = match estimate {
            Ok(p) => {
                self.consecutive_failures = 0;
                p
            }
            Err(EstimateError::Disconnected) => return Err(LoopError::ModelDisconnected),
            Err(e) => {
                self.consecutive_failures += 1;
                self.stats.inference_failures += 1;
                warn!(
                    error = %e,
                    consecutive = self.consecutive_failures,
                    "pose estimation failed, treating frame as empty"
                );
                if self.consecutive_failures >= self.config.max_consecutive_failures {
                    return Err(LoopError::ModelFailing { consecutive: self.consecutive_failures });
                }
                Vec::new()
            }
        };

        let tick = match self.process(&predictions) {
            Ok(classification) => {
                let command = self.debouncer.update(classification).playback_command();
                self.issue(command);
                Tick::Issued(command)
            }
            Err(e) => {
                self.stats.frame_errors += 1;
                warn!(error = %e, frame = self.stats.frames, "skipping malformed prediction");
                Tick::FrameError(e)
            }
        };

        self.surface.show_status(&FrameStatus {
            frame:        self.stats.frames,
            hand_present: !predictions.is_empty(),
            command:      match tick {
                Tick::Issued(c) => Some(c),
                _ => None,
            },
        });
        Ok(tick)
    }

    fn process(&mut self, predictions: &[HandPrediction]) -> Result<Classification, GestureError> {
        let Some(hand) = predictions.first() else {
            trace!("no hand");
            return Ok(Classification::ABSENT);
        };
        if predictions.len() > 1 {
            trace!(ignored = predictions.len() - 1, "extra hands ignored");
        }
        self.stats.hands_seen += 1;

        hand.validate()?;
        skeleton::render(&mut self.surface, &hand.landmarks, &self.config.skeleton)?;
        classifier::classify(Some(hand), &self.config.classifier)
    }

    fn issue(&mut self, command: PlaybackCommand) {
        self.playback.apply(command);
        if self.last_command != Some(command) {
            info!(?command, frame = self.stats.frames, "playback transition");
            self.last_command = Some(command);
        } else {
            debug!(?command, "playback unchanged");
        }
    }
}

/// Build a [`FrameLoop`] and run it to completion.
pub fn run_loop<V, S, M, P>(
    video:    V,
    surface:  S,
    model:    M,
    playback: P,
    config:   LoopConfig,
) -> Result<FrameStats, LoopError>
where
    V: VideoSource,
    S: DrawingSurface,
    M: PoseModel,
    P: PlaybackDevice,
{
    FrameLoop::new(video, surface, model, playback, config).run()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
