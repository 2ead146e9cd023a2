//! Deadlift setup analyzer.
//!
//! Everything is measured at the bottom position (lowest hip). Horizontal
//! offsets assume the lifter faces `+x` in the side clip. Angles whose
//! landmarks fall below the attempt's confidence floor read as `0.0`.

use formcheck_pose_model::{
    EvaluationResult, FeatureSet, Issue, Joint, Landmark, PoseSequence, UploadSlot,
};

use crate::geometry::{angle_at_vertex, angle_from_vertical, euclidean_distance};
use crate::skill::{AttemptAux, Skill};

use super::{all_confident, choose_side, frame_of_max, frame_of_min};

#[derive(Debug, Clone, Copy)]
pub struct DeadliftThresholds {
    pub max_torso_forward_deg: f64,
    pub min_torso_forward_deg: f64,
    pub max_shin_angle_deg: f64,
    /// Hip height relative to the knee, in shin lengths.
    pub max_hip_vs_knee_norm: f64,
    /// Shoulder ahead of the ankle, in shin lengths.
    pub max_shoulder_over_ankle_norm: f64,
    /// Shoulder-hip-knee angle below this suggests a rounded back.
    pub min_hip_hinge_deg: f64,
    /// Band used for the qualitative summary.
    pub summary_band_norm: f64,
    pub issue_weight: f64,
}

impl DeadliftThresholds {
    pub const DEFAULT: DeadliftThresholds = DeadliftThresholds {
        max_torso_forward_deg: 70.0,
        min_torso_forward_deg: 25.0,
        max_shin_angle_deg: 30.0,
        max_hip_vs_knee_norm: 0.35,
        max_shoulder_over_ankle_norm: 0.35,
        min_hip_hinge_deg: 140.0,
        summary_band_norm: 0.2,
        issue_weight: 0.15,
    };
}

const SIDE_JOINTS: &[Joint] = &[Joint::Shoulder, Joint::Hip, Joint::Knee, Joint::Ankle];

const VOCABULARY: &[Issue] = &[
    Issue::ExcessiveForwardLean,
    Issue::TooUpright,
    Issue::KneesForward,
    Issue::HipsTooLow,
    Issue::HipsTooHigh,
    Issue::ShouldersForward,
    Issue::RoundedBackRisk,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Deadlift;

impl Deadlift {
    const THRESHOLDS: DeadliftThresholds = DeadliftThresholds::DEFAULT;
}

impl Skill for Deadlift {
    fn name(&self) -> &'static str {
        "deadlift"
    }

    fn display_name(&self) -> &'static str {
        "Deadlift"
    }

    fn issue_vocabulary(&self) -> &'static [Issue] {
        VOCABULARY
    }

    fn issue_weight(&self) -> f64 {
        Self::THRESHOLDS.issue_weight
    }

    fn upload_spec(&self) -> Vec<UploadSlot> {
        vec![UploadSlot::new(
            "side",
            "Side clip",
            "True side view to assess hip/shoulder positions and back angle.",
            true,
        )]
    }

    fn extract_features(&self, sequence: &PoseSequence, aux: &AttemptAux) -> FeatureSet {
        let side = choose_side(sequence, SIDE_JOINTS);
        let hip = Landmark::of(side, Joint::Hip);
        let hip_y: Vec<Option<f64>> = sequence.iter().map(|f| f.get(hip).map(|h| h.y)).collect();
        if hip_y.iter().all(Option::is_none) {
            tracing::debug!(%side, "Deadlift: hip never detected");
            return FeatureSet::new();
        }

        let bottom_idx = frame_of_max(&hip_y);
        let top_idx = frame_of_min(&hip_y);

        let frame = &sequence.frames[bottom_idx];
        let kp = |joint| frame.get(Landmark::of(side, joint));
        let (s, h, k, a) = (
            kp(Joint::Shoulder),
            kp(Joint::Hip),
            kp(Joint::Knee),
            kp(Joint::Ankle),
        );
        let floor = aux.min_confidence;

        let mut torso_forward_deg = 0.0;
        if let (Some(s), Some(h)) = (s, h) {
            if all_confident(&[s, h], floor) {
                torso_forward_deg = angle_from_vertical(h.point(), s.point());
            }
        }

        let mut shin_angle_deg = 0.0;
        if let (Some(k), Some(a)) = (k, a) {
            if all_confident(&[k, a], floor) {
                shin_angle_deg = angle_from_vertical(a.point(), k.point());
            }
        }

        let mut hip_hinge_deg = 0.0;
        if let (Some(s), Some(h), Some(k)) = (s, h, k) {
            if all_confident(&[s, h, k], floor) {
                hip_hinge_deg = angle_at_vertex(s.point(), h.point(), k.point());
            }
        }

        let mut hip_vs_knee_px = 0.0;
        let mut hip_vs_knee_norm = 0.0;
        let mut shoulder_over_ankle_x = 0.0;
        let mut shoulder_over_ankle_norm = 0.0;
        if let (Some(h), Some(k), Some(a)) = (h, k, a) {
            // Positive: hip below the knee.
            hip_vs_knee_px = h.y - k.y;
            let leg_len = euclidean_distance(k.point(), a.point());
            if leg_len > 1.0 {
                hip_vs_knee_norm = hip_vs_knee_px / leg_len;
                if let Some(s) = s {
                    shoulder_over_ankle_x = s.x - a.x;
                    shoulder_over_ankle_norm = shoulder_over_ankle_x / leg_len;
                }
            }
        }

        tracing::debug!(
            %side,
            bottom_idx,
            torso_forward_deg,
            shin_angle_deg,
            hip_hinge_deg,
            "Deadlift features"
        );

        FeatureSet::new()
            .with("torso_forward_deg", torso_forward_deg)
            .with("shin_angle_deg", shin_angle_deg)
            .with("hip_hinge_deg", hip_hinge_deg)
            .with("hip_vs_knee_px", hip_vs_knee_px)
            .with("hip_vs_knee_norm", hip_vs_knee_norm)
            .with("shoulder_over_ankle_x", shoulder_over_ankle_x)
            .with("shoulder_over_ankle_norm", shoulder_over_ankle_norm)
            .with("bottom_frame_idx", bottom_idx as f64)
            .with("top_frame_idx", top_idx as f64)
    }

    fn evaluate(&self, features: &FeatureSet) -> EvaluationResult {
        let t = Self::THRESHOLDS;
        let torso = features.get_or("torso_forward_deg", 0.0);
        let shin = features.get_or("shin_angle_deg", 0.0);
        let hip_norm = features.get_or("hip_vs_knee_norm", 0.0);
        let shoulder_norm = features.get_or("shoulder_over_ankle_norm", 0.0);
        let hinge = features.get_or("hip_hinge_deg", 0.0);

        let mut issues = Vec::new();
        if torso > t.max_torso_forward_deg {
            issues.push(Issue::ExcessiveForwardLean);
        }
        if torso < t.min_torso_forward_deg {
            issues.push(Issue::TooUpright);
        }
        if shin > t.max_shin_angle_deg {
            issues.push(Issue::KneesForward);
        }
        if hip_norm > t.max_hip_vs_knee_norm {
            issues.push(Issue::HipsTooLow);
        }
        if hip_norm < -t.max_hip_vs_knee_norm {
            issues.push(Issue::HipsTooHigh);
        }
        if shoulder_norm > t.max_shoulder_over_ankle_norm {
            issues.push(Issue::ShouldersForward);
        }
        // 0.0 means the hinge was not measured.
        if hinge != 0.0 && hinge < t.min_hip_hinge_deg {
            issues.push(Issue::RoundedBackRisk);
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
            format!("torso={:.1} deg", features.get_or("torso_forward_deg", 0.0)),
            format!("shin={:.1} deg", features.get_or("shin_angle_deg", 0.0)),
        ]
    }

    fn summarize_for_prompt(&self, features: &FeatureSet) -> String {
        let band = Self::THRESHOLDS.summary_band_norm;
        let hip_norm = features.get_or("hip_vs_knee_norm", 0.0);
        let shoulder_norm = features.get_or("shoulder_over_ankle_norm", 0.0);

        let hips = if hip_norm > band {
            "hips below knees"
        } else if hip_norm < -band {
            "hips above knees"
        } else {
            "hips around knee height"
        };
        let shoulders = if shoulder_norm > band {
            "shoulders in front of midfoot"
        } else if shoulder_norm < -band {
            "shoulders behind midfoot"
        } else {
            "shoulders near midfoot"
        };

        format!(
            "torso angle {:.0} deg, shin angle {:.0} deg, {}, {}, hip hinge {:.0} deg",
            features.get_or("torso_forward_deg", 0.0),
            features.get_or("shin_angle_deg", 0.0),
            hips,
            shoulders,
            features.get_or("hip_hinge_deg", 0.0)
        )
    }
}
