//! Vertical pulling analyzer shared by pull-ups and chin-ups.
//!
//! Both grips are judged on the same geometry: elbow range over the clip,
//! plus torso swing and left/right symmetry measured at the frame where
//! the hands are highest. The variant only changes the registry name and
//! display strings.

use formcheck_pose_model::{
    EvaluationResult, FeatureSet, Issue, Joint, Keypoint, Landmark, PoseSequence, UploadSlot,
};

use crate::geometry::angle_from_vertical;
use crate::skill::{AttemptAux, Skill};

use super::{choose_side, flag, frame_of_min, gated_elbow_angles, min_max_by_value};

#[derive(Debug, Clone, Copy)]
pub struct PullingThresholds {
    /// Elbow must close past this at the top.
    pub max_top_elbow_deg: f64,
    /// Elbow must open past this at the bottom.
    pub min_hang_elbow_deg: f64,
    pub max_torso_swing_deg: f64,
    pub max_pulling_angle_deg: f64,
    /// Height difference over shoulder width.
    pub max_symmetry_norm: f64,
    pub issue_weight: f64,
}

impl PullingThresholds {
    pub const DEFAULT: PullingThresholds = PullingThresholds {
        max_top_elbow_deg: 85.0,
        min_hang_elbow_deg: 160.0,
        max_torso_swing_deg: 35.0,
        max_pulling_angle_deg: 55.0,
        max_symmetry_norm: 0.15,
        issue_weight: 0.2,
    };
}

/// Grip variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullVariant {
    /// Overhand grip.
    PullUp,
    /// Underhand grip.
    ChinUp,
}

impl PullVariant {
    pub const fn name(&self) -> &'static str {
        match self {
            PullVariant::PullUp => "pull_up",
            PullVariant::ChinUp => "chin_up",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            PullVariant::PullUp => "Pull-up",
            PullVariant::ChinUp => "Chin-up",
        }
    }
}

const SIDE_JOINTS: &[Joint] = &[Joint::Shoulder, Joint::Elbow, Joint::Wrist, Joint::Hip];

const VOCABULARY: &[Issue] = &[
    Issue::LimitedTopRange,
    Issue::NoDeadHang,
    Issue::Swinging,
    Issue::Asymmetry,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulling {
    variant: PullVariant,
}

impl Pulling {
    const THRESHOLDS: PullingThresholds = PullingThresholds::DEFAULT;

    pub const fn new(variant: PullVariant) -> Self {
        Self { variant }
    }
}

/// The higher of the two wrists (smaller `y`), or whichever was detected.
fn highest_wrist(left: Option<Keypoint>, right: Option<Keypoint>) -> Option<Keypoint> {
    match (left, right) {
        (Some(l), Some(r)) => Some(if l.y < r.y { l } else { r }),
        (l, r) => l.or(r),
    }
}

impl Skill for Pulling {
    fn name(&self) -> &'static str {
        self.variant.name()
    }

    fn display_name(&self) -> &'static str {
        self.variant.display_name()
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
                "side",
                "Side clip",
                "Side view to judge swing, torso angle, and pulling path.",
                false,
            ),
            UploadSlot::new(
                "front",
                "Front clip",
                "Front view to judge symmetry; upload at least one angle.",
                false,
            ),
        ]
    }

    fn extract_features(&self, sequence: &PoseSequence, aux: &AttemptAux) -> FeatureSet {
        let wrist_y: Vec<Option<f64>> = sequence
            .iter()
            .map(|f| highest_wrist(f.get(Landmark::LeftWrist), f.get(Landmark::RightWrist)).map(|w| w.y))
            .collect();
        let peak_idx = frame_of_min(&wrist_y);

        let side = choose_side(sequence, SIDE_JOINTS);
        let angles = gated_elbow_angles(sequence, side, aux.min_confidence);
        let Some(((min_idx, min_ang), (max_idx, max_ang))) = min_max_by_value(&angles) else {
            tracing::debug!(skill = self.name(), %side, "No confident elbow angles");
            return FeatureSet::new();
        };

        let frame = &sequence.frames[peak_idx];
        let kp = |lm| frame.get(lm);
        let (l_sh, r_sh) = (kp(Landmark::LeftShoulder), kp(Landmark::RightShoulder));
        let (l_hip, r_hip) = (kp(Landmark::LeftHip), kp(Landmark::RightHip));

        let shoulder_width_px = match (l_sh, r_sh) {
            (Some(l), Some(r)) => (l.x - r.x).abs(),
            _ => 0.0,
        };

        let symmetry_reliable = aux.is_front();
        let swing_reliable = aux.is_side();

        let sym = |left: Landmark, right: Landmark| match (kp(left), kp(right)) {
            (Some(l), Some(r)) if symmetry_reliable && shoulder_width_px > 1.0 => {
                (l.y - r.y).abs() / shoulder_width_px
            }
            _ => 0.0,
        };
        let elbow_sym_norm = sym(Landmark::LeftElbow, Landmark::RightElbow);
        let wrist_sym_norm = sym(Landmark::LeftWrist, Landmark::RightWrist);

        let side_sh = kp(Landmark::of(side, Joint::Shoulder));
        let torso = match (l_sh, r_sh, l_hip, r_hip) {
            (Some(ls), Some(rs), Some(lh), Some(rh)) => Some((ls.midpoint(&rs), lh.midpoint(&rh))),
            _ => side_sh.zip(kp(Landmark::of(side, Joint::Hip))),
        };
        let torso_forward_deg = torso
            .map(|(sh, hip)| angle_from_vertical(hip.point(), sh.point()))
            .unwrap_or(0.0);

        let pulling_angle_deg = side_sh
            .zip(kp(Landmark::of(side, Joint::Wrist)))
            .map(|(s, w)| angle_from_vertical(s.point(), w.point()))
            .unwrap_or(0.0);

        tracing::debug!(
            skill = self.name(),
            peak_idx,
            min_ang,
            max_ang,
            torso_forward_deg,
            "Pulling features"
        );

        FeatureSet::new()
            .with("elbow_min_deg", min_ang)
            .with("elbow_max_deg", max_ang)
            .with("pulling_angle_deg", pulling_angle_deg)
            .with("torso_forward_deg", torso_forward_deg)
            .with("elbow_sym_norm", elbow_sym_norm)
            .with("wrist_sym_norm", wrist_sym_norm)
            .with("symmetry_reliable", flag(symmetry_reliable))
            .with("swing_reliable", flag(swing_reliable))
            .with("shoulder_width_px", shoulder_width_px)
            .with("peak_wrist_frame", peak_idx as f64)
            .with("top_frame_idx", min_idx as f64)
            .with("bottom_frame_idx", max_idx as f64)
    }

    fn evaluate(&self, features: &FeatureSet) -> EvaluationResult {
        let t = Self::THRESHOLDS;
        let elbow_min = features.get_or("elbow_min_deg", 0.0);
        let elbow_max = features.get_or("elbow_max_deg", 0.0);
        let torso = features.get_or("torso_forward_deg", 0.0);
        let pull = features.get_or("pulling_angle_deg", 0.0);
        let elbow_sym = features.get_or("elbow_sym_norm", 0.0);
        let wrist_sym = features.get_or("wrist_sym_norm", 0.0);

        let mut issues = Vec::new();
        if elbow_min > t.max_top_elbow_deg {
            issues.push(Issue::LimitedTopRange);
        }
        if elbow_max < t.min_hang_elbow_deg {
            issues.push(Issue::NoDeadHang);
        }
        if features.flag("swing_reliable")
            && (torso > t.max_torso_swing_deg || pull > t.max_pulling_angle_deg)
        {
            issues.push(Issue::Swinging);
        }
        if features.flag("symmetry_reliable")
            && (elbow_sym > t.max_symmetry_norm || wrist_sym > t.max_symmetry_norm)
        {
            issues.push(Issue::Asymmetry);
        }

        EvaluationResult::from_issues(issues, t.issue_weight)
    }

    fn select_key_frames(&self, features: &FeatureSet) -> Vec<usize> {
        vec![
            features.frame_index("top_frame_idx") as usize,
            features.frame_index("bottom_frame_idx") as usize,
        ]
    }

    fn select_key_frame(&self, features: &FeatureSet) -> usize {
        features.frame_index("peak_wrist_frame") as usize
    }

    fn overlay_labels(&self, features: &FeatureSet) -> Vec<String> {
        vec![
            format!("elbow_min={:.1} deg", features.get_or("elbow_min_deg", 0.0)),
            format!("torso={:.1} deg", features.get_or("torso_forward_deg", 0.0)),
        ]
    }

    fn summarize_for_prompt(&self, features: &FeatureSet) -> String {
        let symmetry = if features.flag("symmetry_reliable") {
            let worst = features
                .get_or("elbow_sym_norm", 0.0)
                .max(features.get_or("wrist_sym_norm", 0.0));
            if worst <= Self::THRESHOLDS.max_symmetry_norm {
                "even left/right"
            } else {
                "uneven left/right"
            }
        } else {
            "not assessed (side view)"
        };
        format!(
            "elbow range about {:.0}-{:.0} deg, torso angle {:.0} deg, pull angle {:.0} deg, symmetry {}",
            features.get_or("elbow_min_deg", 0.0),
            features.get_or("elbow_max_deg", 0.0),
            features.get_or("torso_forward_deg", 0.0),
            features.get_or("pulling_angle_deg", 0.0),
            symmetry
        )
    }
}
