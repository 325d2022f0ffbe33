//! Hand state classifier: one prediction → open / closed.
//!
//! Pure and stateless.  Each eligible finger is run through
//! [`finger::is_closed`](crate::finger::is_closed); the hand is `Closed` once
//! at least `closed_quorum` of them are curled.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GestureError;
use crate::finger;
use crate::host::PlaybackCommand;
use crate::landmark::{AnnotationKey, FingerName, HandPrediction, Landmark, CHAIN_LEN};

// ════════════════════════════════════════════════════════════════════════════
// GestureState / Classification
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureState {
    Open,
    Closed,
}

/// Result of classifying one frame.  `gesture` is meaningless when
/// `present` is false and is always `Open` in that case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub present: bool,
    pub gesture: GestureState,
}

impl Classification {
    /// No hand in the frame.
    pub const ABSENT: Classification = Classification {
        present: false,
        gesture: GestureState::Open,
    };

    pub fn hand(gesture: GestureState) -> Self {
        Classification { present: true, gesture }
    }

    /// Only a visible, open hand plays; absence and a closed hand pause.
    pub fn playback_command(&self) -> PlaybackCommand {
        match (self.present, self.gesture) {
            (true, GestureState::Open) => PlaybackCommand::Play,
            _                          => PlaybackCommand::Pause,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ClassifierConfig
// ════════════════════════════════════════════════════════════════════════════

/// Tunables of the quorum rule.
///
/// Both values are empirical: two curled fingers out of the four non-thumb
/// fingers worked well enough in practice.  The thumb is excluded because its
/// orientation defeats the vertical test; `palmBase` is not a finger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub closed_quorum: usize,
    pub excluded:      BTreeSet<AnnotationKey>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            closed_quorum: 2,
            excluded: [AnnotationKey::THUMB, AnnotationKey::PalmBase].into_iter().collect(),
        }
    }
}

impl ClassifierConfig {
    /// Fingers that take part in the vote, in topology order.
    pub fn eligible_fingers(&self) -> impl Iterator<Item = FingerName> + '_ {
        FingerName::ALL
            .into_iter()
            .filter(|&f| !self.excluded.contains(&AnnotationKey::Finger(f)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// classify
// ════════════════════════════════════════════════════════════════════════════

/// Count the eligible fingers that are curled.
///
/// Every eligible finger must have a 4-point chain in the annotation map.
pub fn closed_fingers(
    prediction: &HandPrediction,
    cfg:        &ClassifierConfig,
) -> Result<usize, GestureError> {
    let mut closed = 0;
    for finger in cfg.eligible_fingers() {
        let key = AnnotationKey::Finger(finger);
        let chain = prediction.finger(finger).ok_or(GestureError::MissingFinger(key))?;
        let chain: &[Landmark; CHAIN_LEN] = chain
            .try_into()
            .map_err(|_| GestureError::FingerChain { key, found: chain.len() })?;
        if finger::is_closed(chain) {
            closed += 1;
        }
    }
    Ok(closed)
}

/// Classify the hand in `prediction`, or report absence when there is none.
pub fn classify(
    prediction: Option<&HandPrediction>,
    cfg:        &ClassifierConfig,
) -> Result<Classification, GestureError> {
    let Some(hand) = prediction else {
        return Ok(Classification::ABSENT);
    };
    hand.validate()?;

    let closed = closed_fingers(hand, cfg)?;
    let gesture = if closed >= cfg.closed_quorum {
        GestureState::Closed
    } else {
        GestureState::Open
    };
    debug!(closed, quorum = cfg.closed_quorum, ?gesture, "classified hand");
    Ok(Classification::hand(gesture))
}

/// Classify the first hand of a model result; further hands are ignored.
pub fn classify_first(
    predictions: &[HandPrediction],
    cfg:         &ClassifierConfig,
) -> Result<Classification, GestureError> {
    classify(predictions.first(), cfg)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
