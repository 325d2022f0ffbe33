//! # palm_gesture
//!
//! Turns a per-frame stream of hand-landmark predictions into a binary
//! "hand open" / "hand closed" signal, draws the hand skeleton, and drives a
//! playback device from the result.
//!
//! ## Pipeline
//!
//! ```text
//! video frame ──► PoseModel::estimate ──► [HandPrediction]
//!                                           │
//!                     ┌─────────────────────┴──────────────────┐
//!                     ▼                                        ▼
//!            classifier::classify                     skeleton::render
//!                     │                                        │
//!             smoothing::Debouncer                      DrawingSurface
//!                     │
//!          PlaybackCommand (Play / Pause) ──► PlaybackDevice
//! ```
//!
//! ## Gesture → Command mapping
//!
//! | Hand | Classification | Command |
//! |---|---|---|
//! | not visible | absent | `Pause` |
//! | visible, fewer than `closed_quorum` fingers curled | `Open` | `Play` |
//! | visible, at least `closed_quorum` fingers curled | `Closed` | `Pause` |
//!
//! The closure test is a single-axis heuristic: a finger is curled when its
//! tip sits lower on screen than its base.  It is coarse on purpose and the
//! quorum is a tunable, see [`ClassifierConfig`].

pub mod landmark;
pub mod error;
pub mod finger;
pub mod classifier;
pub mod smoothing;
pub mod host;
pub mod skeleton;
pub mod config;
pub mod controller;

pub use landmark::{AnnotationKey, FingerName, HandPrediction, Landmark};
pub use error::{ConfigError, EstimateError, GestureError, LoopError};
pub use classifier::{classify, Classification, ClassifierConfig, GestureState};
pub use smoothing::Debouncer;
pub use host::{DrawingSurface, FrameStatus, PlaybackCommand, PlaybackDevice, PoseModel, VideoFrame, VideoSource};
pub use skeleton::{render, SkeletonStyle};
pub use config::LoopConfig;
pub use controller::{run_loop, FrameLoop, FrameStats, LoopHandle, Tick};
