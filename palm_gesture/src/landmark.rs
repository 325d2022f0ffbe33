//! Data shapes for a single hand prediction.
//!
//! A [`HandPrediction`] carries the 21 raw landmarks *and* an annotation map
//! of per-finger chains derived from the same points.  The external model
//! produces both; [`HandPrediction::from_landmarks`] derives the map locally
//! when only the raw points are available.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GestureError;

/// Points in one hand prediction.
pub const LANDMARK_COUNT: usize = 21;
/// Points in one annotated finger chain (bottom → tip).
pub const CHAIN_LEN: usize = 4;
/// Index of the wrist in the raw landmark array.
pub const WRIST: usize = 0;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point in video-pixel space; `z` is relative depth.
///
/// On the wire a landmark is a bare `[x, y, z]` triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Landmark { x, y, z }
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(l: Landmark) -> Self {
        [l.x, l.y, l.z]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerName
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FingerName {
    Thumb,
    IndexFinger,
    MiddleFinger,
    RingFinger,
    Pinky,
}

impl FingerName {
    pub const ALL: [FingerName; 5] = [
        FingerName::Thumb,
        FingerName::IndexFinger,
        FingerName::MiddleFinger,
        FingerName::RingFinger,
        FingerName::Pinky,
    ];

    /// Name used by the pose model's annotation map.
    pub fn name(self) -> &'static str {
        match self {
            FingerName::Thumb        => "thumb",
            FingerName::IndexFinger  => "indexFinger",
            FingerName::MiddleFinger => "middleFinger",
            FingerName::RingFinger   => "ringFinger",
            FingerName::Pinky        => "pinky",
        }
    }

    /// Wrist followed by the four joints of this finger, proximal first.
    /// This is the order the skeleton polyline is drawn in.
    pub fn lookup_indices(self) -> [usize; CHAIN_LEN + 1] {
        let first = 1 + CHAIN_LEN * self as usize;
        [WRIST, first, first + 1, first + 2, first + 3]
    }

    /// The four joints of this finger without the wrist.
    pub fn chain_indices(self) -> [usize; CHAIN_LEN] {
        let [_, a, b, c, d] = self.lookup_indices();
        [a, b, c, d]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AnnotationKey
// ════════════════════════════════════════════════════════════════════════════

/// Key of the annotation map: one of the five fingers, or the one-point
/// `palmBase` entry the model also emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnnotationKey {
    Finger(FingerName),
    PalmBase,
}

impl AnnotationKey {
    pub const THUMB: AnnotationKey = AnnotationKey::Finger(FingerName::Thumb);

    pub fn name(self) -> &'static str {
        match self {
            AnnotationKey::Finger(f) => f.name(),
            AnnotationKey::PalmBase  => "palmBase",
        }
    }
}

impl From<FingerName> for AnnotationKey {
    fn from(f: FingerName) -> Self {
        AnnotationKey::Finger(f)
    }
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnotationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "palmBase" {
            return Ok(AnnotationKey::PalmBase);
        }
        FingerName::ALL
            .iter()
            .find(|f| f.name() == s)
            .map(|&f| AnnotationKey::Finger(f))
            .ok_or_else(|| format!("unknown annotation key `{}`", s))
    }
}

impl TryFrom<String> for AnnotationKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AnnotationKey> for String {
    fn from(k: AnnotationKey) -> Self {
        k.name().to_string()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPrediction
// ════════════════════════════════════════════════════════════════════════════

/// The model's full output for one detected hand in one frame.
///
/// Wire format:
///
/// ```json
/// { "handInViewConfidence": 0.99,
///   "landmarks":   [[x, y, z], ...21],
///   "annotations": { "indexFinger": [[x, y, z], ...4], ... } }
/// ```
///
/// `annotations` may be omitted, in which case it is derived from
/// `landmarks` (only when exactly 21 points are present; otherwise it stays
/// empty and [`validate`](Self::validate) reports the bad count).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WirePrediction")]
pub struct HandPrediction {
    pub hand_in_view_confidence: f32,
    pub landmarks:   Vec<Landmark>,
    pub annotations: BTreeMap<AnnotationKey, Vec<Landmark>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrediction {
    #[serde(default = "full_confidence")]
    hand_in_view_confidence: f32,
    landmarks: Vec<Landmark>,
    #[serde(default)]
    annotations: BTreeMap<AnnotationKey, Vec<Landmark>>,
}

fn full_confidence() -> f32 { 1.0 }

impl From<WirePrediction> for HandPrediction {
    fn from(w: WirePrediction) -> Self {
        let annotations = if w.annotations.is_empty() && w.landmarks.len() == LANDMARK_COUNT {
            derive_annotations(&w.landmarks)
        } else {
            w.annotations
        };
        HandPrediction {
            hand_in_view_confidence: w.hand_in_view_confidence,
            landmarks: w.landmarks,
            annotations,
        }
    }
}

impl HandPrediction {
    /// Build a prediction from 21 raw points, deriving the annotation map
    /// from the fixed hand topology.
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Result<Self, GestureError> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(GestureError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found:    landmarks.len(),
            });
        }
        Ok(HandPrediction {
            hand_in_view_confidence: 1.0,
            annotations: derive_annotations(&landmarks),
            landmarks,
        })
    }

    /// The annotated chain for `finger`, bottom → tip.
    pub fn finger(&self, finger: FingerName) -> Option<&[Landmark]> {
        self.annotations.get(&AnnotationKey::Finger(finger)).map(Vec::as_slice)
    }

    /// Check the shape invariants: 21 landmarks, and a 4-point chain for
    /// every finger present in the annotation map.
    pub fn validate(&self) -> Result<(), GestureError> {
        if self.landmarks.len() != LANDMARK_COUNT {
            return Err(GestureError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found:    self.landmarks.len(),
            });
        }
        for (&key, chain) in &self.annotations {
            if matches!(key, AnnotationKey::Finger(_)) && chain.len() != CHAIN_LEN {
                return Err(GestureError::FingerChain { key, found: chain.len() });
            }
        }
        Ok(())
    }
}

fn derive_annotations(landmarks: &[Landmark]) -> BTreeMap<AnnotationKey, Vec<Landmark>> {
    let mut map = BTreeMap::new();
    map.insert(AnnotationKey::PalmBase, vec![landmarks[WRIST]]);
    for finger in FingerName::ALL {
        let chain = finger.chain_indices().iter().map(|&i| landmarks[i]).collect();
        map.insert(AnnotationKey::Finger(finger), chain);
    }
    map
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_hand() -> Vec<Landmark> {
        (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f32, 100.0 + i as f32, 0.0))
            .collect()
    }

    #[test]
    fn lookup_indices_follow_hand_topology() {
        assert_eq!(FingerName::Thumb.lookup_indices(),        [0, 1, 2, 3, 4]);
        assert_eq!(FingerName::IndexFinger.lookup_indices(),  [0, 5, 6, 7, 8]);
        assert_eq!(FingerName::MiddleFinger.lookup_indices(), [0, 9, 10, 11, 12]);
        assert_eq!(FingerName::RingFinger.lookup_indices(),   [0, 13, 14, 15, 16]);
        assert_eq!(FingerName::Pinky.lookup_indices(),        [0, 17, 18, 19, 20]);
    }

    #[test]
    fn annotation_keys_parse_model_names() {
        assert_eq!("palmBase".parse::<AnnotationKey>(), Ok(AnnotationKey::PalmBase));
        assert_eq!(
            "ringFinger".parse::<AnnotationKey>(),
            Ok(AnnotationKey::Finger(FingerName::RingFinger))
        );
        assert!("wrist".parse::<AnnotationKey>().is_err());
    }

    #[test]
    fn from_landmarks_derives_chains() {
        let hand = HandPrediction::from_landmarks(numbered_hand()).unwrap();
        let middle = hand.finger(FingerName::MiddleFinger).unwrap();
        let xs: Vec<f32> = middle.iter().map(|l| l.x).collect();
        assert_eq!(xs, [9.0, 10.0, 11.0, 12.0]);
        assert_eq!(hand.annotations[&AnnotationKey::PalmBase].len(), 1);
        assert!(hand.validate().is_ok());
    }

    #[test]
    fn from_landmarks_rejects_short_hand() {
        let mut pts = numbered_hand();
        pts.truncate(20);
        assert_eq!(
            HandPrediction::from_landmarks(pts),
            Err(GestureError::LandmarkCount { expected: 21, found: 20 })
        );
    }

    #[test]
    fn validate_reports_short_chain() {
        let mut hand = HandPrediction::from_landmarks(numbered_hand()).unwrap();
        hand.annotations
            .get_mut(&AnnotationKey::Finger(FingerName::Pinky))
            .unwrap()
            .pop();
        assert_eq!(
            hand.validate(),
            Err(GestureError::FingerChain {
                key:   AnnotationKey::Finger(FingerName::Pinky),
                found: 3,
            })
        );
    }

    #[test]
    fn wire_format_without_annotations_is_derived() {
        let points: Vec<String> = (0..21).map(|i| format!("[{i}, {}, 0.5]", 200 - i)).collect();
        let json = format!(r#"{{"landmarks": [{}]}}"#, points.join(","));
        let hand: HandPrediction = serde_json::from_str(&json).unwrap();
        assert_eq!(hand.hand_in_view_confidence, 1.0);
        assert_eq!(hand.finger(FingerName::Thumb).unwrap()[3], Landmark::new(4.0, 196.0, 0.5));
    }

    #[test]
    fn wire_format_keeps_model_annotations() {
        let points: Vec<String> = (0..21).map(|_| "[0, 0, 0]".to_string()).collect();
        let json = format!(
            r#"{{"handInViewConfidence": 0.8,
                "landmarks": [{}],
                "annotations": {{"pinky": [[1,2,3],[1,2,3],[1,2,3],[9,9,9]],
                                 "palmBase": [[5,5,5]]}}}}"#,
            points.join(",")
        );
        let hand: HandPrediction = serde_json::from_str(&json).unwrap();
        assert_eq!(hand.annotations.len(), 2);
        assert_eq!(hand.finger(FingerName::Pinky).unwrap()[3], Landmark::new(9.0, 9.0, 9.0));
        assert!(hand.finger(FingerName::Thumb).is_none());
    }
}
