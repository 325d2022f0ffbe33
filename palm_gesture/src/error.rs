//! Error types.

use thiserror::Error;

use crate::landmark::AnnotationKey;

/// A prediction that breaks the shape contract.  Reported per frame; the
/// frame loop logs it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error("hand prediction carries {found} landmarks, expected {expected}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("finger chain `{key}` has {found} points, expected 4")]
    FingerChain { key: AnnotationKey, found: usize },

    #[error("annotation map has no `{0}` chain")]
    MissingFinger(AnnotationKey),
}

/// Failure of a single pose-estimation call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// The call failed for this frame only; the loop treats it as "no hand".
    #[error("inference failed: {0}")]
    Transient(String),

    /// The estimator is gone and will not produce further predictions.
    #[error("pose estimator disconnected")]
    Disconnected,

    /// A finite feed was read to its end.  The loop stops cleanly, as it
    /// does when the video ends.
    #[error("prediction feed exhausted")]
    Exhausted,
}

/// Reasons the frame loop stops with an error instead of running on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoopError {
    #[error("pose estimation failed {consecutive} frames in a row")]
    ModelFailing { consecutive: u32 },

    #[error("pose estimator disconnected")]
    ModelDisconnected,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
