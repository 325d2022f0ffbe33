//! Loop configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "classifier": { "closed_quorum": 3 }, "smoothing_frames": 4 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierConfig;
use crate::error::ConfigError;
use crate::skeleton::SkeletonStyle;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub classifier: ClassifierConfig,

    /// Frames a new classification must hold before playback follows it.
    /// 1 disables smoothing.
    pub smoothing_frames: usize,

    /// Failed inference calls tolerated in a row before the loop gives up.
    pub max_consecutive_failures: u32,

    pub skeleton: SkeletonStyle,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            classifier:               ClassifierConfig::default(),
            smoothing_frames:         1,
            max_consecutive_failures: 30,
            skeleton:                 SkeletonStyle::default(),
        }
    }
}

impl LoopConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::AnnotationKey;

    #[test]
    fn defaults_match_the_heuristic() {
        let cfg = LoopConfig::default();
        assert_eq!(cfg.classifier.closed_quorum, 2);
        assert!(cfg.classifier.excluded.contains(&AnnotationKey::THUMB));
        assert!(cfg.classifier.excluded.contains(&AnnotationKey::PalmBase));
        assert_eq!(cfg.smoothing_frames, 1);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(LoopConfig::from_json_str("{}").unwrap(), LoopConfig::default());
    }

    #[test]
    fn partial_document_overrides_named_fields() {
        let cfg = LoopConfig::from_json_str(
            r#"{ "classifier": { "closed_quorum": 3, "excluded": ["palmBase", "pinky"] },
                 "smoothing_frames": 4 }"#,
        )
        .unwrap();
        assert_eq!(cfg.classifier.closed_quorum, 3);
        assert_eq!(cfg.classifier.excluded.len(), 2);
        assert!(!cfg.classifier.excluded.contains(&AnnotationKey::THUMB));
        assert_eq!(cfg.smoothing_frames, 4);
        assert_eq!(cfg.max_consecutive_failures, 30);
    }

    #[test]
    fn skeleton_geometry_is_nested() {
        let cfg = LoopConfig::from_json_str(r#"{ "skeleton": { "point_radius": 5.0 } }"#).unwrap();
        assert_eq!(cfg.skeleton, SkeletonStyle { point_radius: 5.0, point_offset: 2.0 });

        // Top-level geometry keys are not part of the format.
        let flat = LoopConfig::from_json_str(r#"{ "point_radius": 5.0 }"#).unwrap();
        assert_eq!(flat.skeleton, SkeletonStyle::default());
    }

    #[test]
    fn unknown_finger_is_rejected() {
        let err = LoopConfig::from_json_str(r#"{ "classifier": { "excluded": ["wrist"] } }"#);
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LoopConfig::from_json_file("/nonexistent/palm_gesture.json");
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
