//! Temporal smoothing of keypoint streams.
//!
//! Each landmark carries three independent exponential filters (x, y,
//! confidence). A filter starts on the first frame where its landmark is
//! seen and passes that raw value through unchanged.
//!
//! Gap policy: a landmark missing from frame `t` is missing from the output
//! at `t` as well, and its filter state is dropped. When the landmark comes
//! back it starts fresh from the raw value. Downstream thresholds are tuned
//! against this behaviour, so it must not be turned into a gap-tolerant
//! filter.

use std::collections::BTreeMap;

use formcheck_pose_model::{Keypoint, PoseFrame, PoseSequence};

/// Default smoothing factor; lower means more smoothing.
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Causal exponential smoother over pose sequences.
#[derive(Debug, Clone, Copy)]
pub struct PoseSmoother {
    alpha: f64,
}

impl PoseSmoother {
    /// Create a smoother; `alpha` is clamped to `[0.0, 1.0]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn default_ema() -> Self {
        Self::new(DEFAULT_ALPHA)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smooth a sequence into a new one of equal length and frame order.
    pub fn smooth(&self, sequence: &PoseSequence) -> PoseSequence {
        let mut prev: BTreeMap<String, Keypoint> = BTreeMap::new();
        let mut frames = Vec::with_capacity(sequence.len());

        for frame in sequence {
            let mut current = BTreeMap::new();
            for (name, raw) in &frame.keypoints {
                let value = match prev.get(name) {
                    Some(p) => self.step(p, raw),
                    None => *raw,
                };
                current.insert(name.clone(), value);
            }

            frames.push(PoseFrame {
                frame_index: frame.frame_index,
                keypoints: current.clone(),
                image_size: frame.image_size,
            });
            // Only landmarks present in this frame keep their state.
            prev = current;
        }

        PoseSequence::new(frames)
    }

    /// `alpha * raw + (1 - alpha) * prev`, written so that a constant input
    /// reproduces itself exactly.
    fn step(&self, prev: &Keypoint, raw: &Keypoint) -> Keypoint {
        let a = self.alpha;
        Keypoint {
            x: prev.x + a * (raw.x - prev.x),
            y: prev.y + a * (raw.y - prev.y),
            confidence: prev.confidence + a * (raw.confidence - prev.confidence),
        }
    }
}

impl Default for PoseSmoother {
    fn default() -> Self {
        Self::default_ema()
    }
}
