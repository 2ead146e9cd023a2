//! Push-up analyzer.

use formcheck_pose_model::{
    EvaluationResult, FeatureSet, Issue, Joint, Landmark, PoseSequence, UploadSlot,
};

use crate::geometry::{angle_from_vertical, euclidean_distance, line_y_at_x};
use crate::skill::{AttemptAux, Skill};

use super::{choose_side, gated_elbow_angles, min_max_by_value};

#[derive(Debug, Clone, Copy)]
pub struct PushUpThresholds {
    pub max_bottom_elbow_deg: f64,
    pub min_lockout_elbow_deg: f64,
    /// Hip offset from the shoulder-ankle line, as a fraction of body length.
    pub max_hip_offset_norm: f64,
    pub issue_weight: f64,
}

impl PushUpThresholds {
    pub const DEFAULT: PushUpThresholds = PushUpThresholds {
        max_bottom_elbow_deg: 95.0,
        min_lockout_elbow_deg: 160.0,
        max_hip_offset_norm: 0.08,
        issue_weight: 0.2,
    };
}

const SIDE_JOINTS: &[Joint] = &[
    Joint::Shoulder,
    Joint::Elbow,
    Joint::Wrist,
    Joint::Hip,
    Joint::Knee,
    Joint::Ankle,
];

const VOCABULARY: &[Issue] = &[
    Issue::ShallowDepth,
    Issue::NoLockout,
    Issue::HipSag,
    Issue::HipsPiking,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PushUp;

impl PushUp {
    const THRESHOLDS: PushUpThresholds = PushUpThresholds::DEFAULT;
}

impl Skill for PushUp {
    fn name(&self) -> &'static str {
        "push_up"
    }

    fn display_name(&self) -> &'static str {
        "Push-up"
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
            "True side view to judge elbow depth and body line.",
            true,
        )]
    }

    fn extract_features(&self, sequence: &PoseSequence, aux: &AttemptAux) -> FeatureSet {
        let side = choose_side(sequence, SIDE_JOINTS);
        let angles = gated_elbow_angles(sequence, side, aux.min_confidence);
        let Some(((min_idx, min_ang), (max_idx, max_ang))) = min_max_by_value(&angles) else {
            tracing::debug!(%side, "Push-up: no confident elbow angles");
            return FeatureSet::new();
        };

        let frame = &sequence.frames[min_idx];
        let kp = |joint| frame.get(Landmark::of(side, joint));

        let mut depth_px = 0.0;
        if let (Some(s), Some(e)) = (kp(Joint::Shoulder), kp(Joint::Elbow)) {
            depth_px = s.y - e.y;
        }

        let mut body_line_deg = 0.0;
        let mut hip_offset_px = 0.0;
        let mut hip_offset_norm = 0.0;
        if let (Some(s), Some(h), Some(a)) = (kp(Joint::Shoulder), kp(Joint::Hip), kp(Joint::Ankle)) {
            body_line_deg = angle_from_vertical(s.point(), a.point());
            // Positive offset: hip below the shoulder-ankle line.
            hip_offset_px = h.y - line_y_at_x(s.point(), a.point(), h.x);
            let body_len = euclidean_distance(s.point(), a.point());
            if body_len > 1.0 {
                hip_offset_norm = hip_offset_px / body_len;
            }
        }

        FeatureSet::new()
            .with("elbow_min_deg", min_ang)
            .with("elbow_max_deg", max_ang)
            .with("depth_px", depth_px)
            .with("body_line_deg", body_line_deg)
            .with("hip_offset_px", hip_offset_px)
            .with("hip_offset_norm", hip_offset_norm)
            .with("bottom_frame_idx", min_idx as f64)
            .with("top_frame_idx", max_idx as f64)
    }

    fn evaluate(&self, features: &FeatureSet) -> EvaluationResult {
        let t = Self::THRESHOLDS;
        let elbow_min = features.get_or("elbow_min_deg", 0.0);
        let elbow_max = features.get_or("elbow_max_deg", 0.0);
        let hip_offset = features.get_or("hip_offset_norm", 0.0);

        let mut issues = Vec::new();
        if elbow_min > t.max_bottom_elbow_deg {
            issues.push(Issue::ShallowDepth);
        }
        if elbow_max < t.min_lockout_elbow_deg {
            issues.push(Issue::NoLockout);
        }
        if hip_offset > t.max_hip_offset_norm {
            issues.push(Issue::HipSag);
        }
        if hip_offset < -t.max_hip_offset_norm {
            issues.push(Issue::HipsPiking);
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
            format!("elbow_min={:.1} deg", features.get_or("elbow_min_deg", 0.0)),
            format!("hip_offset={:.2}", features.get_or("hip_offset_norm", 0.0)),
        ]
    }

    fn summarize_for_prompt(&self, features: &FeatureSet) -> String {
        let limit = Self::THRESHOLDS.max_hip_offset_norm;
        let hip_offset = features.get_or("hip_offset_norm", 0.0);
        let hips = if hip_offset > limit {
            "sagging"
        } else if hip_offset < -limit {
            "piked"
        } else {
            "level"
        };
        format!(
            "elbow range about {:.0}-{:.0} deg, body line angle {:.0} deg, hips {}",
            features.get_or("elbow_min_deg", 0.0),
            features.get_or("elbow_max_deg", 0.0),
            features.get_or("body_line_deg", 0.0),
            hips
        )
    }
}
