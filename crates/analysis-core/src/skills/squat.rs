//! Squat analyzer.
//!
//! The bottom of the squat is the frame with the lowest mid-hip (largest
//! pixel `y`). Depth and torso lean need a side view; knee tracking
//! (valgus) needs a front view.

use formcheck_pose_model::{
    EvaluationResult, FeatureSet, Issue, Keypoint, Landmark, PoseSequence, UploadSlot,
};

use crate::geometry::angle_from_vertical;
use crate::skill::{AttemptAux, Skill};

use super::{flag, frame_of_max, frame_of_min};

/// Threshold table for squat evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SquatThresholds {
    /// Hip must sink below the knees: `depth_px <= this` is shallow.
    pub min_depth_px: f64,
    pub max_torso_forward_deg: f64,
    /// Knee spacing over ankle spacing below this reads as valgus.
    pub min_valgus_ratio: f64,
    pub issue_weight: f64,
}

impl SquatThresholds {
    pub const DEFAULT: SquatThresholds = SquatThresholds {
        min_depth_px: 0.0,
        max_torso_forward_deg: 45.0,
        min_valgus_ratio: 0.9,
        issue_weight: 0.2,
    };
}

const VOCABULARY: &[Issue] = &[
    Issue::ShallowSquat,
    Issue::ExcessiveForwardLean,
    Issue::KneeValgus,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Squat;

impl Squat {
    const THRESHOLDS: SquatThresholds = SquatThresholds::DEFAULT;
}

fn mid(frame_kp: impl Fn(Landmark) -> Option<Keypoint>, a: Landmark, b: Landmark) -> Option<Keypoint> {
    Keypoint::mid_or_either(frame_kp(a), frame_kp(b))
}

impl Skill for Squat {
    fn name(&self) -> &'static str {
        "squat"
    }

    fn display_name(&self) -> &'static str {
        "Squat"
    }

    fn issue_vocabulary(&self) -> &'static [Issue] {
        VOCABULARY
    }

    fn issue_weight(&self) -> f64 {
        Self::THRESHOLDS.issue_weight
    }

    fn upload_spec(&self) -> Vec<UploadSlot> {
        vec![
            UploadSlot::new(
                "front",
                "Front/oblique clip (preferred)",
                "Front-on or ~30-45 deg oblique to assess knee valgus and stance.",
                false,
            ),
            UploadSlot::new(
                "side",
                "Side clip",
                "True side/sagittal view to assess torso angle and depth.",
                false,
            ),
        ]
    }

    fn extract_features(&self, sequence: &PoseSequence, aux: &AttemptAux) -> FeatureSet {
        let hip_mid_y: Vec<Option<f64>> = sequence
            .iter()
            .map(|f| mid(|lm| f.get(lm), Landmark::LeftHip, Landmark::RightHip).map(|kp| kp.y))
            .collect();
        if hip_mid_y.iter().all(Option::is_none) {
            tracing::debug!("Squat: no hip landmarks in any frame");
            return FeatureSet::new();
        }

        let bottom_idx = frame_of_max(&hip_mid_y);
        let top_idx = frame_of_min(&hip_mid_y);
        let frame = &sequence.frames[bottom_idx];
        let kp = |lm| frame.get(lm);

        let hip_mid = mid(kp, Landmark::LeftHip, Landmark::RightHip);
        let shoulder_mid = mid(kp, Landmark::LeftShoulder, Landmark::RightShoulder);
        let (l_knee, r_knee) = (kp(Landmark::LeftKnee), kp(Landmark::RightKnee));
        let (l_ankle, r_ankle) = (kp(Landmark::LeftAnkle), kp(Landmark::RightAnkle));

        let sagittal_reliable = aux.is_side();
        let valgus_reliable = aux.is_front();

        // Positive depth means the hip sits below the knees.
        let mut depth_px = 0.0;
        let mut torso_forward_deg = 0.0;
        if sagittal_reliable {
            if let Some(hip) = hip_mid {
                let knees_y: Vec<f64> = [l_knee, r_knee].iter().flatten().map(|k| k.y).collect();
                if !knees_y.is_empty() {
                    let knee_avg_y = knees_y.iter().sum::<f64>() / knees_y.len() as f64;
                    depth_px = hip.y - knee_avg_y;
                }
                if let Some(sh) = shoulder_mid {
                    torso_forward_deg = angle_from_vertical(hip.point(), sh.point());
                }
            }
        }

        let mut valgus_ratio = 1.0;
        if valgus_reliable {
            if let (Some(lk), Some(rk), Some(la), Some(ra)) = (l_knee, r_knee, l_ankle, r_ankle) {
                let knee_dist = (lk.x - rk.x).abs();
                let ankle_dist = (la.x - ra.x).abs();
                if ankle_dist > 1e-6 {
                    valgus_ratio = knee_dist / ankle_dist;
                }
            }
        }

        tracing::debug!(bottom_idx, top_idx, depth_px, torso_forward_deg, valgus_ratio, "Squat features");

        FeatureSet::new()
            .with("depth_px", depth_px)
            .with("torso_forward_deg", torso_forward_deg)
            .with("valgus_ratio", valgus_ratio)
            .with("valgus_reliable", flag(valgus_reliable))
            .with("sagittal_reliable", flag(sagittal_reliable))
            .with("bottom_frame_idx", bottom_idx as f64)
            .with("top_frame_idx", top_idx as f64)
    }

    fn evaluate(&self, features: &FeatureSet) -> EvaluationResult {
        let t = Self::THRESHOLDS;
        let depth = features.get_or("depth_px", 0.0);
        let torso = features.get_or("torso_forward_deg", 0.0);
        let valgus = features.get_or("valgus_ratio", 1.0);

        let mut issues = Vec::new();
        if features.flag("sagittal_reliable") {
            if depth <= t.min_depth_px {
                issues.push(Issue::ShallowSquat);
            }
            if torso > t.max_torso_forward_deg {
                issues.push(Issue::ExcessiveForwardLean);
            }
        }
        if features.flag("valgus_reliable") && valgus < t.min_valgus_ratio {
            issues.push(Issue::KneeValgus);
        }

        EvaluationResult::from_issues(issues, t.issue_weight)
    }

    fn select_key_frames(&self, features: &FeatureSet) -> Vec<usize> {
        vec![
            features.frame_index("bottom_frame_idx") as usize,
            features.frame_index("top_frame_idx") as usize,
        ]
    }

    fn overlay_labels(&self, features: &FeatureSet) -> Vec<String> {
        vec![
            format!("depth={:.1}px", features.get_or("depth_px", 0.0)),
            format!("torso={:.1} deg", features.get_or("torso_forward_deg", 0.0)),
        ]
    }

    fn summarize_for_prompt(&self, features: &FeatureSet) -> String {
        let depth = features.get_or("depth_px", 0.0);
        let torso = features.get_or("torso_forward_deg", 0.0);

        let valgus = if features.flag("valgus_reliable") {
            if features.get_or("valgus_ratio", 1.0) >= Self::THRESHOLDS.min_valgus_ratio {
                "knees track over feet"
            } else {
                "knees drift inward"
            }
        } else {
            "not assessed (side view)"
        };

        let depth_txt = if features.flag("sagittal_reliable") {
            let line = if depth > 0.0 { "below knee" } else { "above knee" };
            format!("depth {line}, torso angle {torso:.0} deg")
        } else {
            "depth/torso not assessed (front view)".to_string()
        };

        format!("{depth_txt}, {valgus}")
    }
}
