//! Pose frames and per-clip pose sequences.
//!
//! A sequence is produced once per clip by the pose estimator and is not
//! mutated afterward; smoothing builds a new sequence.
//!
//! On disk a sequence is either a JSON document (`{"frames": [...]}` or a
//! bare array of frames) or JSONL with one frame object per line. Lines
//! starting with `#` are comments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keypoint::{Keypoint, Landmark};

/// Source frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Landmarks detected in one sampled video frame.
///
/// Landmarks the estimator did not find are absent from `keypoints`;
/// a frame with no person detected has an empty map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// 0-based position in the sampled sequence.
    #[serde(alias = "frame_idx")]
    pub frame_index: usize,

    /// Landmark name to keypoint.
    #[serde(default)]
    pub keypoints: BTreeMap<String, Keypoint>,

    /// Dimensions of the frame the keypoints were measured on.
    #[serde(default)]
    pub image_size: ImageSize,
}

impl PoseFrame {
    /// An empty frame (no detection).
    pub fn new(frame_index: usize, image_size: ImageSize) -> Self {
        Self {
            frame_index,
            keypoints: BTreeMap::new(),
            image_size,
        }
    }

    /// Builder-style insert of a known landmark.
    pub fn with(mut self, landmark: Landmark, keypoint: Keypoint) -> Self {
        self.keypoints.insert(landmark.name().to_string(), keypoint);
        self
    }

    pub fn get(&self, landmark: Landmark) -> Option<Keypoint> {
        self.keypoints.get(landmark.name()).copied()
    }

    /// Whether the estimator found anyone in this frame.
    pub fn has_detection(&self) -> bool {
        !self.keypoints.is_empty()
    }
}

/// Ordered pose frames for one clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSequence {
    pub frames: Vec<PoseFrame>,
}

impl PoseSequence {
    pub fn new(frames: Vec<PoseFrame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PoseFrame> {
        self.frames.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PoseFrame> {
        self.frames.get(index)
    }

    /// Number of frames in which `landmark` was detected.
    pub fn coverage(&self, landmark: Landmark) -> usize {
        self.frames
            .iter()
            .filter(|f| f.get(landmark).is_some())
            .count()
    }

    /// Number of frames with any detection at all.
    pub fn detected_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.has_detection()).count()
    }

    /// Bound a frame index into `[0, len - 1]` (0 for an empty sequence).
    pub fn clamp_index(&self, index: i64) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        index.clamp(0, self.frames.len() as i64 - 1) as usize
    }

    /// Check structural expectations, returning one message per problem.
    ///
    /// Problems are reported, not fixed: analysis still runs on a sequence
    /// with warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        for (pos, frame) in self.frames.iter().enumerate() {
            if frame.frame_index != pos {
                errors.push(format!(
                    "Frame at position {pos} has frame_index {} (expected contiguous indices)",
                    frame.frame_index
                ));
            }
            for (name, kp) in &frame.keypoints {
                if !(kp.x.is_finite() && kp.y.is_finite()) {
                    errors.push(format!("Frame {pos}: {name} has non-finite coordinates"));
                }
                if !(0.0..=1.0).contains(&kp.confidence) {
                    errors.push(format!(
                        "Frame {pos}: {name} confidence {} outside [0, 1]",
                        kp.confidence
                    ));
                }
            }
        }

        errors
    }

    /// Like [`PoseSequence::validate`], but fails on the first report.
    pub fn ensure_valid(&self) -> Result<(), PoseError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(PoseError::InvalidSequence {
                message: problems.join("; "),
            })
        }
    }

    /// Parse sequence content in any supported layout.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            return serde_json::from_str::<Vec<PoseFrame>>(trimmed).map(Self::new);
        }
        match serde_json::from_str::<PoseSequence>(trimmed) {
            Ok(seq) => Ok(seq),
            // A document spread over several lines: its own error is the useful one.
            Err(doc_err) if trimmed.starts_with('{') && !first_line_is_complete(trimmed) => {
                Err(doc_err)
            }
            Err(_) => parse_frames(content).map(Self::new),
        }
    }

    /// Load a sequence file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PoseError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PoseError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let sequence = Self::parse(&content).map_err(|e| PoseError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), frames = sequence.len(), "Loaded pose sequence");
        Ok(sequence)
    }
}

impl<'a> IntoIterator for &'a PoseSequence {
    type Item = &'a PoseFrame;
    type IntoIter = std::slice::Iter<'a, PoseFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Whether the first line holds a whole JSON value, as in JSONL.
fn first_line_is_complete(content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|line| serde_json::from_str::<serde_json::Value>(line).is_ok())
}

/// Parse frames from JSONL content (one JSON object per line).
pub fn parse_frames(jsonl: &str) -> Result<Vec<PoseFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Errors that can occur when loading pose data or knowledge bases.
#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid pose sequence: {message}")]
    InvalidSequence { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(i: usize) -> PoseFrame {
        PoseFrame::new(i, ImageSize::new(640, 480))
            .with(Landmark::LeftHip, Keypoint::new(100.0, 200.0 + i as f64, 0.9))
    }

    #[test]
    fn test_coverage_skips_absent_frames() {
        let seq = PoseSequence::new(vec![frame(0), PoseFrame::new(1, ImageSize::default()), frame(2)]);
        assert!(seq.get(1).is_some_and(|f| f.get(Landmark::LeftHip).is_none()));
        assert_eq!(seq.coverage(Landmark::LeftHip), 2);
        assert_eq!(seq.detected_frames(), 2);
    }

    #[test]
    fn test_clamp_index() {
        let seq = PoseSequence::new(vec![frame(0), frame(1), frame(2)]);
        assert_eq!(seq.clamp_index(-4), 0);
        assert_eq!(seq.clamp_index(1), 1);
        assert_eq!(seq.clamp_index(99), 2);
        assert_eq!(PoseSequence::default().clamp_index(5), 0);
    }

    #[test]
    fn test_validate_reports_gaps_and_bad_confidence() {
        let mut bad = frame(5);
        bad.keypoints
            .insert("NOSE".to_string(), Keypoint::new(1.0, 1.0, 1.5));
        let seq = PoseSequence::new(vec![frame(0), bad]);
        let errors = seq.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("frame_index 5"));
        assert!(errors[1].contains("NOSE"));

        let err = seq.ensure_valid().unwrap_err();
        assert!(matches!(err, PoseError::InvalidSequence { ref message } if message.contains("; ")));
        assert!(PoseSequence::new(vec![frame(0)]).ensure_valid().is_ok());
    }

    #[test]
    fn test_parse_jsonl_with_comments_and_aliases() {
        let content = r#"
# exported by estimator
{"frame_idx": 0, "keypoints": {"LEFT_HIP": [10.0, 20.0, 0.8]}, "image_size": {"width": 64, "height": 48}}
{"frame_index": 1, "keypoints": {}}
"#;
        let seq = PoseSequence::parse(content).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.frames[0].get(Landmark::LeftHip).unwrap().y, 20.0);
        assert!(!seq.frames[1].has_detection());
        assert_eq!(seq.frames[1].image_size, ImageSize::default());
    }

    #[test]
    fn test_parse_document_and_array_layouts() {
        let seq = PoseSequence::new(vec![frame(0), frame(1)]);
        let doc = serde_json::to_string_pretty(&seq).unwrap();
        assert_eq!(PoseSequence::parse(&doc).unwrap(), seq);

        let array = serde_json::to_string(&seq.frames).unwrap();
        assert_eq!(PoseSequence::parse(&array).unwrap(), seq);
    }

    #[test]
    fn test_malformed_document_reports_its_own_error() {
        let content = "{\n  \"frames\": [\n    {\"frame_index\": 0, \"keypoints\": {}},\n  ]\n}\n";
        let err = PoseSequence::parse(content).unwrap_err();
        assert_eq!(err.line(), 4, "{err}");

        let array = "[\n  {\"frame_index\": 0},\n]";
        assert!(PoseSequence::parse(array).unwrap_err().line() > 1);
    }

    #[test]
    fn test_malformed_jsonl_line_still_errors() {
        let content = "{\"frame_index\": 0, \"keypoints\": {}}\n{\"frame_index\": 1, \"keypoints\": \n";
        assert!(PoseSequence::parse(content).is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("formcheck_missing_pose.jsonl");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            PoseSequence::load(&path),
            Err(PoseError::IoError { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_clamp_index_stays_in_range(len in 0usize..40, index in any::<i64>()) {
            let seq = PoseSequence::new((0..len).map(frame).collect());
            let clamped = seq.clamp_index(index);
            if len == 0 {
                prop_assert_eq!(clamped, 0);
            } else {
                prop_assert!(clamped < len);
                if (0..len as i64).contains(&index) {
                    prop_assert_eq!(clamped as i64, index);
                }
            }
        }
    }
}
