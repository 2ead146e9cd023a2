//! Keypoints and landmark naming.
//!
//! The pose estimator reports landmarks by name (`"LEFT_ELBOW"`, ...).
//! The analysis only needs the twelve limb/torso landmarks below; any other
//! names the estimator emits are carried along untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single detected landmark in pixel space.
///
/// Deserializes from either `{"x", "y", "confidence"}` or a bare
/// `[x, y, confidence]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeypointRepr")]
pub struct Keypoint {
    /// Horizontal pixel coordinate.
    pub x: f64,
    /// Vertical pixel coordinate (grows downward).
    pub y: f64,
    /// Detection confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeypointRepr {
    Object {
        x: f64,
        y: f64,
        #[serde(alias = "conf", alias = "visibility")]
        confidence: f64,
    },
    Triple(f64, f64, f64),
}

impl From<KeypointRepr> for Keypoint {
    fn from(repr: KeypointRepr) -> Self {
        match repr {
            KeypointRepr::Object { x, y, confidence } => Keypoint { x, y, confidence },
            KeypointRepr::Triple(x, y, confidence) => Keypoint { x, y, confidence },
        }
    }
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// Position without confidence.
    pub fn point(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Whether the confidence reaches `threshold`.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }

    /// Component-wise mean of two keypoints (position and confidence).
    pub fn midpoint(&self, other: &Keypoint) -> Keypoint {
        Keypoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            confidence: (self.confidence + other.confidence) / 2.0,
        }
    }

    /// Midpoint when both are present, otherwise whichever one is.
    pub fn mid_or_either(a: Option<Keypoint>, b: Option<Keypoint>) -> Option<Keypoint> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.midpoint(&b)),
            (a, b) => a.or(b),
        }
    }
}

/// Body side of a lateral landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joint kind, independent of side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

/// Landmarks used by the analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Landmark {
    pub const ALL: [Landmark; 12] = [
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
    ];

    /// The landmark for `joint` on `side`.
    pub fn of(side: Side, joint: Joint) -> Self {
        match (side, joint) {
            (Side::Left, Joint::Shoulder) => Landmark::LeftShoulder,
            (Side::Right, Joint::Shoulder) => Landmark::RightShoulder,
            (Side::Left, Joint::Elbow) => Landmark::LeftElbow,
            (Side::Right, Joint::Elbow) => Landmark::RightElbow,
            (Side::Left, Joint::Wrist) => Landmark::LeftWrist,
            (Side::Right, Joint::Wrist) => Landmark::RightWrist,
            (Side::Left, Joint::Hip) => Landmark::LeftHip,
            (Side::Right, Joint::Hip) => Landmark::RightHip,
            (Side::Left, Joint::Knee) => Landmark::LeftKnee,
            (Side::Right, Joint::Knee) => Landmark::RightKnee,
            (Side::Left, Joint::Ankle) => Landmark::LeftAnkle,
            (Side::Right, Joint::Ankle) => Landmark::RightAnkle,
        }
    }

    /// Estimator-facing name, e.g. `"LEFT_ELBOW"`.
    pub fn name(&self) -> &'static str {
        match self {
            Landmark::LeftShoulder => "LEFT_SHOULDER",
            Landmark::RightShoulder => "RIGHT_SHOULDER",
            Landmark::LeftElbow => "LEFT_ELBOW",
            Landmark::RightElbow => "RIGHT_ELBOW",
            Landmark::LeftWrist => "LEFT_WRIST",
            Landmark::RightWrist => "RIGHT_WRIST",
            Landmark::LeftHip => "LEFT_HIP",
            Landmark::RightHip => "RIGHT_HIP",
            Landmark::LeftKnee => "LEFT_KNEE",
            Landmark::RightKnee => "RIGHT_KNEE",
            Landmark::LeftAnkle => "LEFT_ANKLE",
            Landmark::RightAnkle => "RIGHT_ANKLE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|lm| lm.name() == name)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_landmark_names_round_trip() {
        for lm in Landmark::ALL {
            assert_eq!(Landmark::from_name(lm.name()), Some(lm));
        }
        assert_eq!(Landmark::from_name("NOSE"), None);
    }

    #[test]
    fn test_landmark_of_side_and_joint() {
        assert_eq!(Landmark::of(Side::Left, Joint::Elbow).name(), "LEFT_ELBOW");
        assert_eq!(Landmark::of(Side::Right, Joint::Ankle).name(), "RIGHT_ANKLE");
    }

    #[test]
    fn test_mid_or_either() {
        let a = Keypoint::new(0.0, 10.0, 0.4);
        let b = Keypoint::new(10.0, 20.0, 0.8);
        let mid = Keypoint::mid_or_either(Some(a), Some(b)).unwrap();
        assert!((mid.x - 5.0).abs() < 1e-12);
        assert!((mid.y - 15.0).abs() < 1e-12);
        assert!((mid.confidence - 0.6).abs() < 1e-12);

        assert_eq!(Keypoint::mid_or_either(None, Some(b)), Some(b));
        assert_eq!(Keypoint::mid_or_either(None, None), None);
    }

    #[test]
    fn test_keypoint_deserializes_both_shapes() {
        let obj: Keypoint = serde_json::from_str(r#"{"x": 1.0, "y": 2.0, "confidence": 0.9}"#).unwrap();
        let triple: Keypoint = serde_json::from_str("[1.0, 2.0, 0.9]").unwrap();
        assert_eq!(obj, triple);
    }

    #[test]
    fn test_keypoint_confidence_threshold() {
        let kp = Keypoint::new(1.0, 2.0, 0.35);
        assert!(kp.is_confident(0.35));
        assert!(!kp.is_confident(0.36));
    }

    proptest! {
        #[test]
        fn prop_object_and_triple_forms_agree(
            x in -1.0e4f64..1.0e4,
            y in -1.0e4f64..1.0e4,
            c in 0.0f64..=1.0,
        ) {
            let obj: Keypoint =
                serde_json::from_str(&format!(r#"{{"x": {x}, "y": {y}, "confidence": {c}}}"#)).unwrap();
            let triple: Keypoint = serde_json::from_str(&format!("[{x}, {y}, {c}]")).unwrap();
            prop_assert_eq!(obj, triple);
            prop_assert!((obj.x - x).abs() <= 1e-9 * x.abs().max(1.0));
            prop_assert!((obj.y - y).abs() <= 1e-9 * y.abs().max(1.0));

            // Written back out in object form, it reads the same.
            let again: Keypoint = serde_json::from_str(&serde_json::to_string(&obj).unwrap()).unwrap();
            prop_assert!((again.confidence - obj.confidence).abs() <= 1e-12);
        }
    }
}
